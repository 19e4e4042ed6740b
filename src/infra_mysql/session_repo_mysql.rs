use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

// Row alias instead of VALUES(), which MySQL 8.0.20+ deprecates.
const UPSERT_SESSION: &str = r#"
INSERT INTO sessions (user_id, hash_token)
VALUES (?, ?) AS new
ON DUPLICATE KEY UPDATE hash_token = new.hash_token
"#;

pub struct MySqlSessionRepo {
    pool: MySqlPool,
}

impl MySqlSessionRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlSessionRepo { pool }
    }

    #[inline]
    fn store_err(e: sqlx::Error) -> AuthError {
        AuthError::StoreUnavailable(e.to_string())
    }

    fn row_to_session(row: MySqlRow) -> Result<Session, AuthError> {
        let user_id_bytes: Vec<u8> = row.try_get("user_id").map_err(Self::store_err)?;
        let user_id = UserId::from_bytes(&user_id_bytes)
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        let hash_token: String = row.try_get("hash_token").map_err(Self::store_err)?;

        Ok(Session::new(user_id, Fingerprint(hash_token)))
    }
}

#[async_trait::async_trait]
impl SessionRepo for MySqlSessionRepo {
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Session>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT user_id, hash_token
FROM sessions
WHERE user_id = ?
"#,
        )
        .bind(user_id.as_bytes())
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::store_err)?;

        row_opt.map(Self::row_to_session).transpose()
    }

    async fn upsert(&self, session: &Session) -> Result<(), AuthError> {
        sqlx::query(UPSERT_SESSION)
        .bind(session.user_id.as_bytes())
        .bind(session.fingerprint.as_str())
        .execute(&self.pool)
        .await
        .map_err(Self::store_err)?;

        Ok(())
    }

    async fn compare_and_swap(
        &self,
        user_id: UserId,
        current: &Fingerprint,
        next: &Fingerprint,
    ) -> Result<bool, AuthError> {
        let result = sqlx::query(
            r#"
UPDATE sessions
SET hash_token = ?
WHERE user_id = ? AND hash_token = ?
"#,
        )
        .bind(next.as_str())
        .bind(user_id.as_bytes())
        .bind(current.as_str())
        .execute(&self.pool)
        .await
        .map_err(Self::store_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, user_id: UserId) -> Result<(), AuthError> {
        sqlx::query(
            r#"
DELETE FROM sessions
WHERE user_id = ?
"#,
        )
        .bind(user_id.as_bytes())
        .execute(&self.pool)
        .await
        .map_err(Self::store_err)?;

        Ok(())
    }
}
