use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Distinguishes runtime behavior for different deployments of the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the pipeline client and the sandbox backend.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub environment: AppEnvironment,
    pub api: ApiConfig,
    pub sandbox: ServerConfig,
    pub telemetry: TelemetryConfig,
}

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000/hr/api";

impl PipelineConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("PIPELINE_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let base_url =
            env::var("PIPELINE_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidApiBase { value: base_url });
        }

        let trailing_slash = match env::var("PIPELINE_API_TRAILING_SLASH") {
            Ok(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidFlag {
                name: "PIPELINE_API_TRAILING_SLASH",
                value: raw,
            })?,
            Err(_) => true,
        };

        let cookie = env::var("PIPELINE_COOKIE")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let actor = env::var("PIPELINE_ACTOR")
            .ok()
            .filter(|value| !value.trim().is_empty());

        let host = env::var("PIPELINE_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PIPELINE_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("PIPELINE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            api: ApiConfig {
                base_url,
                trailing_slash,
                cookie,
                actor,
            },
            sandbox: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Where the backend lives and which session it should be called with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    /// The production backend routes every endpoint with a trailing slash.
    pub trailing_slash: bool,
    /// Raw `Cookie` header value; the anti-forgery token is read from its `csrftoken` entry.
    pub cookie: Option<String>,
    pub actor: Option<String>,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            trailing_slash: true,
            cookie: None,
            actor: None,
        }
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }
}

/// Settings controlling the sandbox HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidApiBase { value: String },
    InvalidFlag { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "PIPELINE_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "PIPELINE_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidApiBase { value } => {
                write!(f, "PIPELINE_API_BASE must be an http(s) URL, got '{value}'")
            }
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{name} must be a boolean flag, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidApiBase { .. }
            | ConfigError::InvalidFlag { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "PIPELINE_ENV",
            "PIPELINE_API_BASE",
            "PIPELINE_API_TRAILING_SLASH",
            "PIPELINE_COOKIE",
            "PIPELINE_ACTOR",
            "PIPELINE_HOST",
            "PIPELINE_PORT",
            "PIPELINE_LOG_LEVEL",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = PipelineConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.api.base_url, DEFAULT_API_BASE);
        assert!(config.api.trailing_slash);
        assert_eq!(config.api.cookie, None);
        assert_eq!(config.sandbox.host, "127.0.0.1");
        assert_eq!(config.sandbox.port, 8000);
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn reads_session_and_routing_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PIPELINE_API_BASE", "https://hr.example.com/hr/api");
        env::set_var("PIPELINE_API_TRAILING_SLASH", "off");
        env::set_var("PIPELINE_COOKIE", "csrftoken=abc; sessionid=xyz");
        env::set_var("PIPELINE_ENV", "prod");
        let config = PipelineConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Production);
        assert_eq!(config.api.base_url, "https://hr.example.com/hr/api");
        assert!(!config.api.trailing_slash);
        assert_eq!(
            config.api.cookie.as_deref(),
            Some("csrftoken=abc; sessionid=xyz")
        );
        reset_env();
    }

    #[test]
    fn rejects_non_http_api_base() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PIPELINE_API_BASE", "ftp://hr.example.com");
        let err = PipelineConfig::load().expect_err("ftp base is refused");
        assert!(matches!(err, ConfigError::InvalidApiBase { .. }));
        reset_env();
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PIPELINE_HOST", "localhost");
        let config = PipelineConfig::load().expect("config loads");
        let addr = config.sandbox.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 8000));
        reset_env();
    }
}
