use anyhow::{Result, anyhow, bail};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub auth: Auth,
    pub fingerprint: Fingerprint,
    pub http: Http,
    pub log: Log,
    pub notifier: Notifier,
    pub session: Session,
}

/// A string that never shows up in `Debug` output.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct Secret(pub String);

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Auth {
    pub signing_key: Secret,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Fingerprint {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct Notifier {
    pub backend: String, // "email" or "log"
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub recipient: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Session {
    pub backend: String, // "mysql", "redis" or "memory"
    #[serde(default)]
    pub mysql_dsn: Option<Secret>,
    #[serde(default)]
    pub redis_dsn: Option<Secret>,
    #[serde(default = "default_redis_prefix")]
    pub redis_prefix: String,
    pub max_connections: u32,
    pub op_timeout_secs: u64,
    #[serde(default)]
    pub run_migrations: bool,
}

const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

fn default_redis_prefix() -> String {
    "session".to_string()
}

impl Settings {
    /// Reject settings that would only fail later, mid-request.
    pub fn validate(&self) -> Result<()> {
        if self.auth.signing_key.0.is_empty() {
            bail!("auth.signing_key must not be empty");
        }
        if self.auth.access_ttl_secs == 0 || self.auth.refresh_ttl_secs == 0 {
            bail!("auth token TTLs must be positive");
        }
        if self.auth.access_ttl_secs > MAX_TTL_SECS || self.auth.refresh_ttl_secs > MAX_TTL_SECS {
            bail!("auth token TTLs must not exceed {} seconds", MAX_TTL_SECS);
        }
        if self.http.request_timeout_secs == 0 || self.session.op_timeout_secs == 0 {
            bail!("timeouts must be positive");
        }

        match self.session.backend.as_str() {
            "mysql" if self.session.mysql_dsn.is_none() => bail!("session.mysql_dsn is required"),
            "redis" if self.session.redis_dsn.is_none() => bail!("session.redis_dsn is required"),
            "mysql" | "redis" | "memory" => {}
            other => bail!("Unknown session backend: {}", other),
        }
        match self.notifier.backend.as_str() {
            "email" if self.notifier.base_url.is_empty() || self.notifier.recipient.is_empty() => {
                bail!("notifier.base_url and notifier.recipient are required for e-mail")
            }
            "email" | "log" => {}
            other => bail!("Unknown notifier backend: {}", other),
        }

        Ok(())
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

/// File first, then `ROTATOR__SECTION__KEY` environment overrides.
pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(
            Environment::with_prefix("ROTATOR")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    settings.validate()?;
    Ok(settings)
}
