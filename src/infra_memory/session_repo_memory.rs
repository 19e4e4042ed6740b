use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;

/// Process-local sessions. Each shard lock makes the compare-and-swap atomic per user.
#[derive(Default)]
pub struct MemorySessionRepo {
    sessions: DashMap<UserId, Fingerprint>,
}

impl MemorySessionRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait::async_trait]
impl SessionRepo for MemorySessionRepo {
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Session>, AuthError> {
        Ok(self
            .sessions
            .get(&user_id)
            .map(|fingerprint| Session::new(user_id, fingerprint.clone())))
    }

    async fn upsert(&self, session: &Session) -> Result<(), AuthError> {
        self.sessions
            .insert(session.user_id, session.fingerprint.clone());
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        user_id: UserId,
        current: &Fingerprint,
        next: &Fingerprint,
    ) -> Result<bool, AuthError> {
        match self.sessions.get_mut(&user_id) {
            Some(mut stored) if *stored == *current => {
                *stored = next.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, user_id: UserId) -> Result<(), AuthError> {
        self.sessions.remove(&user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(s: &str) -> Fingerprint {
        Fingerprint(s.to_string())
    }

    #[tokio::test]
    async fn upsert_keeps_one_row_per_user() {
        let repo = MemorySessionRepo::new();
        let user = UserId(uuid::Uuid::new_v4());

        repo.upsert(&Session::new(user, fp("a"))).await.unwrap();
        repo.upsert(&Session::new(user, fp("b"))).await.unwrap();

        assert_eq!(repo.len(), 1);
        let stored = repo.find_by_user(user).await.unwrap().unwrap();
        assert_eq!(stored.fingerprint, fp("b"));
    }

    #[tokio::test]
    async fn swap_only_from_expected_fingerprint() {
        let repo = MemorySessionRepo::new();
        let user = UserId(uuid::Uuid::new_v4());
        repo.upsert(&Session::new(user, fp("a"))).await.unwrap();

        assert!(!repo.compare_and_swap(user, &fp("stale"), &fp("c")).await.unwrap());
        assert!(repo.compare_and_swap(user, &fp("a"), &fp("b")).await.unwrap());
        assert!(!repo.compare_and_swap(user, &fp("a"), &fp("c")).await.unwrap());

        let stored = repo.find_by_user(user).await.unwrap().unwrap();
        assert_eq!(stored.fingerprint, fp("b"));
    }

    #[tokio::test]
    async fn swap_on_missing_session_fails() {
        let repo = MemorySessionRepo::new();
        let user = UserId(uuid::Uuid::new_v4());
        assert!(!repo.compare_and_swap(user, &fp("a"), &fp("b")).await.unwrap());
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn delete_removes_session() {
        let repo = MemorySessionRepo::new();
        let user = UserId(uuid::Uuid::new_v4());
        repo.upsert(&Session::new(user, fp("a"))).await.unwrap();

        repo.delete(user).await.unwrap();
        assert!(repo.find_by_user(user).await.unwrap().is_none());
        // deleting twice is fine
        repo.delete(user).await.unwrap();
    }
}
