use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};

const SESSION_SWAP: &str = include_str!("session_swap.lua");

/// Sessions as plain string keys: `{prefix}:{user_id}` -> fingerprint.
pub struct RedisSessionRepo {
    conn: ConnectionManager,
    prefix: String,
    swap: Script,
}

impl RedisSessionRepo {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisSessionRepo {
            conn,
            prefix: prefix.into(),
            swap: Script::new(SESSION_SWAP),
        }
    }

    fn key(&self, user_id: UserId) -> String {
        format!("{}:{}", self.prefix, user_id)
    }
}

#[async_trait::async_trait]
impl SessionRepo for RedisSessionRepo {
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Session>, AuthError> {
        let key = self.key(user_id);
        let mut conn = self.conn.clone();
        let val: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        Ok(val.map(|hash| Session::new(user_id, Fingerprint(hash))))
    }

    async fn upsert(&self, session: &Session) -> Result<(), AuthError> {
        let key = self.key(session.user_id);
        let mut conn = self.conn.clone();
        let _: () = conn
            .set(&key, session.fingerprint.as_str())
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        user_id: UserId,
        current: &Fingerprint,
        next: &Fingerprint,
    ) -> Result<bool, AuthError> {
        let key = self.key(user_id);
        let mut conn = self.conn.clone();
        let swapped: i64 = self
            .swap
            .key(&key)
            .arg(current.as_str())
            .arg(next.as_str())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        Ok(swapped == 1)
    }

    async fn delete(&self, user_id: UserId) -> Result<(), AuthError> {
        let key = self.key(user_id);
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(&key)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        Ok(())
    }
}
