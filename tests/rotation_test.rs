use chrono::Utc;
use rotator::application_impl::*;
use rotator::application_port::*;
use rotator::domain_model::*;
use rotator::domain_port::SessionRepo;
use rotator::infra_memory::MemorySessionRepo;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const KEY: &[u8] = b"integration-signing-key-for-rotation-tests";

struct RecordingNotifier {
    tx: mpsc::UnboundedSender<OriginChange>,
}

#[async_trait::async_trait]
impl AnomalyNotifier for RecordingNotifier {
    async fn notify(&self, change: &OriginChange) -> anyhow::Result<()> {
        self.tx.send(change.clone())?;
        Ok(())
    }
}

struct BrokenRepo;

#[async_trait::async_trait]
impl SessionRepo for BrokenRepo {
    async fn find_by_user(&self, _user_id: UserId) -> Result<Option<Session>, AuthError> {
        Err(AuthError::StoreUnavailable("connection refused".to_string()))
    }
    async fn upsert(&self, _session: &Session) -> Result<(), AuthError> {
        Err(AuthError::StoreUnavailable("connection refused".to_string()))
    }
    async fn compare_and_swap(
        &self,
        _user_id: UserId,
        _current: &Fingerprint,
        _next: &Fingerprint,
    ) -> Result<bool, AuthError> {
        Err(AuthError::StoreUnavailable("connection refused".to_string()))
    }
    async fn delete(&self, _user_id: UserId) -> Result<(), AuthError> {
        Err(AuthError::StoreUnavailable("connection refused".to_string()))
    }
}

struct Harness {
    service: Arc<RealAuthService>,
    codec: Arc<JwtHs512Codec>,
    changes: mpsc::UnboundedReceiver<OriginChange>,
}

fn codec() -> Arc<JwtHs512Codec> {
    Arc::new(
        JwtHs512Codec::try_new(JwtConfig {
            signing_key: KEY.to_vec(),
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(24 * 60 * 60),
        })
        .unwrap(),
    )
}

fn harness_with(repo: Arc<dyn SessionRepo>) -> Harness {
    let fingerprinter: Arc<dyn TokenFingerprinter> = Arc::new(
        Argon2Fingerprinter::try_new(FingerprintConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap(),
    );
    let store = Arc::new(RealSessionStore::new(
        repo,
        fingerprinter.clone(),
        Duration::from_secs(2),
    ));
    let (tx, changes) = mpsc::unbounded_channel();
    let codec = codec();

    let service = RealAuthService::new(
        codec.clone(),
        store,
        fingerprinter,
        Arc::new(RecordingNotifier { tx }),
    );
    Harness {
        service: Arc::new(service),
        codec,
        changes,
    }
}

fn harness() -> Harness {
    harness_with(Arc::new(MemorySessionRepo::new()))
}

fn alice() -> UserId {
    "11111111-1111-1111-1111-111111111111".parse().unwrap()
}

#[tokio::test]
async fn refresh_rotates_and_retires_the_presented_token() {
    let h = harness();

    let first = h.service.authenticate(alice(), "10.0.0.1").await.unwrap();
    let second = h
        .service
        .refresh(&first.refresh_token, "10.0.0.1")
        .await
        .unwrap();
    assert_ne!(first.refresh_token, second.refresh_token);

    let replay = h.service.refresh(&first.refresh_token, "10.0.0.1").await;
    assert!(matches!(replay, Err(AuthError::InappropriateRefreshToken)));

    // the rotated token keeps working
    let third = h
        .service
        .refresh(&second.refresh_token, "10.0.0.1")
        .await
        .unwrap();
    assert_ne!(second.refresh_token, third.refresh_token);
}

#[tokio::test]
async fn issued_tokens_carry_identity_and_origin() {
    let h = harness();
    let pair = h.service.authenticate(alice(), "10.0.0.1").await.unwrap();

    let access = h.codec.validate_jwt(&pair.access_token.0).unwrap();
    let refresh = h.codec.validate_jwt(&pair.refresh_token.0).unwrap();
    assert_eq!(access.user_id, alice());
    assert_eq!(refresh.user_id, alice());
    assert_eq!(refresh.origin, "10.0.0.1");
    assert!(pair.refresh_token_expires_at > Utc::now());
}

#[tokio::test]
async fn second_login_replaces_the_first_session() {
    let h = harness();
    let first = h.service.authenticate(alice(), "10.0.0.1").await.unwrap();
    let second = h.service.authenticate(alice(), "10.0.0.1").await.unwrap();

    assert!(matches!(
        h.service.refresh(&first.refresh_token, "10.0.0.1").await,
        Err(AuthError::InappropriateRefreshToken)
    ));
    assert!(h.service.refresh(&second.refresh_token, "10.0.0.1").await.is_ok());
}

#[tokio::test]
async fn new_origin_still_rotates_and_notifies_once() {
    let mut h = harness();
    let first = h.service.authenticate(alice(), "10.0.0.1").await.unwrap();

    let second = h
        .service
        .refresh(&first.refresh_token, "10.0.0.2")
        .await
        .unwrap();
    let embedded = h.codec.validate_jwt(&second.refresh_token.0).unwrap();
    assert_eq!(embedded.origin, "10.0.0.2");

    let change = tokio::time::timeout(Duration::from_secs(2), h.changes.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(change.user_id, alice());
    assert_eq!(change.previous_origin, "10.0.0.1");
    assert_eq!(change.current_origin, "10.0.0.2");

    // same origin as the new token: no further notification
    h.service
        .refresh(&second.refresh_token, "10.0.0.2")
        .await
        .unwrap();
    let tracker = h.service.background();
    tracker.close();
    tracker.wait().await;
    assert!(h.changes.try_recv().is_err());
}

#[tokio::test]
async fn same_origin_never_notifies() {
    let mut h = harness();
    let first = h.service.authenticate(alice(), "10.0.0.1").await.unwrap();
    h.service
        .refresh(&first.refresh_token, "10.0.0.1")
        .await
        .unwrap();

    let tracker = h.service.background();
    tracker.close();
    tracker.wait().await;
    assert!(h.changes.try_recv().is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_refresh_has_exactly_one_winner() {
    let h = harness();
    let first = h.service.authenticate(alice(), "10.0.0.1").await.unwrap();

    let a = {
        let service = h.service.clone();
        let token = first.refresh_token.clone();
        tokio::spawn(async move { service.refresh(&token, "10.0.0.1").await })
    };
    let b = {
        let service = h.service.clone();
        let token = first.refresh_token.clone();
        tokio::spawn(async move { service.refresh(&token, "10.0.0.1").await })
    };
    let results = [a.await.unwrap(), b.await.unwrap()];

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(AuthError::InappropriateRefreshToken)))
    );
}

#[tokio::test]
async fn invalidate_ends_the_session() {
    let h = harness();
    let pair = h.service.authenticate(alice(), "10.0.0.1").await.unwrap();

    h.service.invalidate(&pair.refresh_token).await.unwrap();
    assert!(matches!(
        h.service.refresh(&pair.refresh_token, "10.0.0.1").await,
        Err(AuthError::InappropriateRefreshToken)
    ));
    assert!(matches!(
        h.service.invalidate(&pair.refresh_token).await,
        Err(AuthError::InappropriateRefreshToken)
    ));
}

#[tokio::test]
async fn forged_and_expired_tokens_are_rejected_before_the_store() {
    let h = harness_with(Arc::new(BrokenRepo));

    let forged = RefreshToken("eyJhbGciOiJIUzUxMiJ9.e30.c2ln".to_string());
    assert!(matches!(
        h.service.refresh(&forged, "10.0.0.1").await,
        Err(AuthError::TokenInvalid)
    ));

    let mut stale = TokenPayload::new(alice(), "10.0.0.1");
    stale.expires_at = Utc::now() - chrono::Duration::minutes(1);
    let expired = RefreshToken(h.codec.generate_jwt(&stale).unwrap());
    assert!(matches!(
        h.service.refresh(&expired, "10.0.0.1").await,
        Err(AuthError::TokenExpired)
    ));
}

#[tokio::test]
async fn store_failures_surface_unchanged() {
    let h = harness_with(Arc::new(BrokenRepo));

    assert!(matches!(
        h.service.authenticate(alice(), "10.0.0.1").await,
        Err(AuthError::StoreUnavailable(_))
    ));

    let pair = h.codec.generate_pair(&TokenPayload::new(alice(), "10.0.0.1")).unwrap();
    assert!(matches!(
        h.service.refresh(&pair.refresh_token, "10.0.0.1").await,
        Err(AuthError::StoreUnavailable(_))
    ));
}
