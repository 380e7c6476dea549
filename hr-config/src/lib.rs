//! Environment-driven configuration for the HR integration backend.
//!
//! Grounded on `r2e-core::config`'s philosophy but trimmed to what this
//! service actually needs: a single pass over environment
//! variables at startup, validated eagerly so a misconfigured deployment
//! fails before accepting its first request rather than on the first
//! request that happens to touch the missing value.

use std::fmt;
use std::time::Duration;

/// Error produced while assembling [`HrConfig`] from the process environment.
#[derive(Debug)]
pub enum ConfigError {
    /// A required environment variable was not set.
    MissingVar(&'static str),
    /// A variable was set but could not be parsed into the expected type.
    InvalidValue { var: &'static str, value: String },
    /// None of a mutually-exclusive group of variables were set.
    MissingAny(&'static [&'static str]),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingVar(name) => write!(f, "missing required environment variable {name}"),
            ConfigError::InvalidValue { var, value } => {
                write!(f, "invalid value for {var}: {value:?}")
            }
            ConfigError::MissingAny(names) => {
                write!(f, "one of {names:?} must be set")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Bootstrap source for the Google service-account identity, in resolution order.
#[derive(Debug, Clone)]
pub enum GoogleIdentitySource {
    /// `GOOGLE_SERVICE_ACCOUNT_JSON_B64` — base64-encoded inline service-account JSON.
    InlineBase64(String),
    /// `GOOGLE_SERVICE_ACCOUNT_JSON` — inline service-account JSON.
    Inline(String),
    /// Neither inline variant was set; fall back to ambient credentials, then
    /// the `GOOGLE_SERVICE_ACCOUNT_SECRET` bootstrap secret name.
    Ambient { bootstrap_secret: Option<String> },
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub tls: bool,
    pub db: u8,
}

impl RedisConfig {
    pub fn connection_url(&self) -> String {
        let scheme = if self.tls { "rediss" } else { "redis" };
        match &self.password {
            Some(pw) => format!("{scheme}://:{pw}@{}:{}/{}", self.host, self.port, self.db),
            None => format!("{scheme}://{}:{}/{}", self.host, self.port, self.db),
        }
    }
}

#[derive(Debug, Clone)]
pub enum PgSource {
    /// `NEON_DATABASE_URL` — used directly, preferred over the secret.
    DirectUrl(String),
    /// `NEON_SECRET_NAME` — resolved through `hr-secrets` at pool construction time.
    Secret(String),
}

#[derive(Debug, Clone)]
pub struct JobberConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct HrConfig {
    pub bind_addr: String,
    pub listeners_url: String,
    pub callback_key: String,
    pub jobber: JobberConfig,
    pub pg: PgSource,
    pub redis: RedisConfig,
    pub google_identity: GoogleIdentitySource,
    pub google_project_id: Option<String>,
    pub aws_secret_name: Option<String>,
}

impl HrConfig {
    /// Load configuration from the process environment, loading a `.env` file
    /// first if one is present (mirrors `r2e-core`'s `.env` precedence: never
    /// overwrites an already-set variable).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let bind_addr = env_or("HR_BIND_ADDR", "0.0.0.0:8080");
        let listeners_url = require_var("LISTENERS_URL")?;
        let callback_key = require_var("HR_CALLBACK_KEY")?;

        let jobber = JobberConfig {
            base_url: require_var("HR_JOBBER_URL")?,
            api_key: require_var("HR_JOBBER_API_KEY")?,
            timeout: Duration::from_secs(parse_env_or("HR_JOBBER_TIMEOUT", 30)?),
        };

        let pg = match std::env::var("NEON_DATABASE_URL") {
            Ok(url) if !url.is_empty() => PgSource::DirectUrl(url),
            _ => match std::env::var("NEON_SECRET_NAME") {
                Ok(name) if !name.is_empty() => PgSource::Secret(name),
                _ => return Err(ConfigError::MissingAny(&["NEON_DATABASE_URL", "NEON_SECRET_NAME"])),
            },
        };

        let use_local = parse_env_or::<bool>("USE_LOCAL_REDIS", false)?;
        let redis = if use_local {
            RedisConfig {
                host: "127.0.0.1".to_string(),
                port: 6379,
                password: None,
                tls: false,
                db: 0,
            }
        } else {
            RedisConfig {
                host: require_var("LISTENERS_REDIS_HOST")?,
                port: parse_env_or("LISTENERS_REDIS_PORT", 6379)?,
                password: std::env::var("LISTENERS_REDIS_PASSWORD").ok().filter(|s| !s.is_empty()),
                tls: parse_env_or("LISTENERS_REDIS_TLS", false)?,
                db: parse_env_or("LISTENERS_REDIS_DB", 0)?,
            }
        };

        let google_identity = resolve_google_identity();

        Ok(Self {
            bind_addr,
            listeners_url,
            callback_key,
            jobber,
            pg,
            redis,
            google_identity,
            google_project_id: std::env::var("GOOGLE_PROJECT_ID").ok().filter(|s| !s.is_empty()),
            aws_secret_name: std::env::var("AWS_SECRET_NAME").ok().filter(|s| !s.is_empty()),
        })
    }

    pub fn callback_url(&self) -> String {
        format!("{}/hr/callback", self.listeners_url.trim_end_matches('/'))
    }
}

fn resolve_google_identity() -> GoogleIdentitySource {
    if let Ok(b64) = std::env::var("GOOGLE_SERVICE_ACCOUNT_JSON_B64") {
        if !b64.is_empty() {
            return GoogleIdentitySource::InlineBase64(b64);
        }
    }
    if let Ok(json) = std::env::var("GOOGLE_SERVICE_ACCOUNT_JSON") {
        if !json.is_empty() {
            return GoogleIdentitySource::Inline(json);
        }
    }
    GoogleIdentitySource::Ambient {
        bootstrap_secret: std::env::var("GOOGLE_SERVICE_ACCOUNT_SECRET").ok().filter(|s| !s.is_empty()),
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn require_var(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

fn parse_env_or<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => v.parse::<T>().map_err(|_| ConfigError::InvalidValue { var: name, value: v }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redis_connection_url_without_password() {
        let cfg = RedisConfig {
            host: "127.0.0.1".into(),
            port: 6379,
            password: None,
            tls: false,
            db: 0,
        };
        assert_eq!(cfg.connection_url(), "redis://127.0.0.1:6379/0");
    }

    #[test]
    fn redis_connection_url_with_tls_and_password() {
        let cfg = RedisConfig {
            host: "cache.example.com".into(),
            port: 6380,
            password: Some("secret".into()),
            tls: true,
            db: 2,
        };
        assert_eq!(cfg.connection_url(), "rediss://:secret@cache.example.com:6380/2");
    }

    #[test]
    fn callback_url_strips_trailing_slash() {
        let cfg = HrConfig {
            bind_addr: "0.0.0.0:8080".into(),
            listeners_url: "https://listeners.example.com/".into(),
            callback_key: "k".into(),
            jobber: JobberConfig {
                base_url: "https://jobber.example.com".into(),
                api_key: "key".into(),
                timeout: Duration::from_secs(30),
            },
            pg: PgSource::DirectUrl("postgres://localhost/hr".into()),
            redis: RedisConfig {
                host: "127.0.0.1".into(),
                port: 6379,
                password: None,
                tls: false,
                db: 0,
            },
            google_identity: GoogleIdentitySource::Ambient { bootstrap_secret: None },
            google_project_id: None,
            aws_secret_name: None,
        };
        assert_eq!(cfg.callback_url(), "https://listeners.example.com/hr/callback");
    }
}
