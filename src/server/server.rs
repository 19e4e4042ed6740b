use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::task::TaskTracker;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub request_timeout: Duration,
    background: TaskTracker,
    pool: Option<MySqlPool>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let op_timeout = Duration::from_secs(settings.session.op_timeout_secs);
        let request_timeout = Duration::from_secs(settings.http.request_timeout_secs);

        let mut pool = None;
        let session_repo: Arc<dyn SessionRepo> = match settings.session.backend.as_str() {
            "mysql" => {
                let dsn = settings
                    .session
                    .mysql_dsn
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("session.mysql_dsn is required"))?;
                let mysql = MySqlPoolOptions::new()
                    .max_connections(settings.session.max_connections)
                    .acquire_timeout(op_timeout)
                    .connect(&dsn.0)
                    .await?;
                if settings.session.run_migrations {
                    sqlx::migrate!("./migrations").run(&mysql).await?;
                    info!("migrations applied");
                }
                pool = Some(mysql.clone());
                Arc::new(MySqlSessionRepo::new(mysql))
            }
            "redis" => {
                let dsn = settings
                    .session
                    .redis_dsn
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("session.redis_dsn is required"))?;
                let redis_client = redis::Client::open(dsn.0.as_str())?;
                let redis_manager = redis_client.get_connection_manager().await?;
                Arc::new(RedisSessionRepo::new(
                    redis_manager,
                    settings.session.redis_prefix.clone(),
                ))
            }
            "memory" => {
                warn!("sessions are kept in memory and lost on restart");
                Arc::new(MemorySessionRepo::new())
            }
            other => return Err(anyhow::anyhow!("Unknown session backend: {}", other)),
        };

        let fingerprinter: Arc<dyn TokenFingerprinter> =
            Arc::new(Argon2Fingerprinter::try_new(FingerprintConfig {
                memory_kib: settings.fingerprint.memory_kib,
                iterations: settings.fingerprint.iterations,
                parallelism: settings.fingerprint.parallelism,
            })?);

        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs512Codec::try_new(JwtConfig {
            signing_key: settings.auth.signing_key.0.clone().into_bytes(),
            access_ttl: Duration::from_secs(settings.auth.access_ttl_secs),
            refresh_ttl: Duration::from_secs(settings.auth.refresh_ttl_secs),
        })?);

        let session_store: Arc<dyn SessionStore> = Arc::new(RealSessionStore::new(
            session_repo,
            fingerprinter.clone(),
            op_timeout,
        ));

        let notifier: Arc<dyn AnomalyNotifier> = match settings.notifier.backend.as_str() {
            "email" => Arc::new(EmailAnomalyNotifier::try_new(EmailNotifierConfig {
                base_url: settings.notifier.base_url.clone(),
                sender: settings.notifier.sender.clone(),
                recipient: settings.notifier.recipient.clone(),
                timeout: Duration::from_secs(settings.notifier.timeout_secs),
            })?),
            "log" => Arc::new(LogAnomalyNotifier::new()),
            other => return Err(anyhow::anyhow!("Unknown notifier backend: {}", other)),
        };

        let auth_service = RealAuthService::new(token_codec, session_store, fingerprinter, notifier);
        let background = auth_service.background();

        info!("server started");

        Ok(Self {
            auth_service: Arc::new(auth_service),
            request_timeout,
            background,
            pool,
        })
    }

    /// A server around an already-built auth service, with nothing else to tear down.
    pub fn with_auth_service(auth_service: Arc<dyn AuthService>, request_timeout: Duration) -> Self {
        Self {
            auth_service,
            request_timeout,
            background: TaskTracker::new(),
            pool: None,
        }
    }

    /// Waits for in-flight anomaly notifications, then closes the pool.
    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.background.close();
        self.background.wait().await;
        info!("background tasks drained");

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
