//! Application configuration module
//!
//! Both binaries read their settings from the process environment (after
//! `.env` has been loaded by `main`). [`AppConfig::from_env`] parses and
//! validates everything up front so handlers never touch `std::env`.
//! Tests build configurations with [`AppConfig::builder`].

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

const DEFAULT_API_PORT: u16 = 8080;
const DEFAULT_GATEWAY_PORT: u16 = 8081;
const DEFAULT_TOPIC_PREFIX: &str = "justjio";
const DEV_JWT_SECRET: &str = "justjio-dev-secret-change-me";

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Dev,
    Staging,
    Prod,
}

impl Environment {
    /// Name used in topic and consumer-group names
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Staging => "staging",
            Environment::Prod => "prod",
        }
    }

    /// Whether broker names carry the environment segment
    pub fn is_scoped(&self) -> bool {
        matches!(self, Environment::Dev | Environment::Staging)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "dev" | "development" => Ok(Environment::Dev),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Prod),
            other => Err(ConfigError::InvalidValue {
                key: "ENV",
                message: format!("unknown environment '{}'", other),
            }),
        }
    }
}

/// Google OAuth client settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// API listen port
    pub api_port: u16,
    /// Gateway listen port
    pub gateway_port: u16,
    pub environment: Environment,
    pub jwt_secret: String,
    /// Origins accepted by the gateway and the API CORS layer
    pub allowed_origins: Vec<String>,
    pub database_url: Option<String>,
    /// Broker address, `None` selects the in-process broker
    pub broker_url: Option<String>,
    pub topic_prefix: String,
    pub google_oauth: Option<GoogleOAuthConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_port: DEFAULT_API_PORT,
            gateway_port: DEFAULT_GATEWAY_PORT,
            environment: Environment::Dev,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            allowed_origins: Vec::new(),
            database_url: None,
            broker_url: None,
            topic_prefix: DEFAULT_TOPIC_PREFIX.to_string(),
            google_oauth: None,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let environment = match get("ENV") {
            Some(value) => value.parse()?,
            None => Environment::Dev,
        };

        let api_port = match get("PORT") {
            Some(value) => parse_port("PORT", &value)?,
            None => DEFAULT_API_PORT,
        };
        let gateway_port = match get("GATEWAY_PORT").or_else(|| get("PORT")) {
            Some(value) => parse_port("GATEWAY_PORT", &value)?,
            None => DEFAULT_GATEWAY_PORT,
        };

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None if environment == Environment::Prod => {
                return Err(ConfigError::MissingValue("JWT_SECRET"));
            }
            None => {
                tracing::warn!("[Config] JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let allowed_origins = get("ALLOWED_ORIGINS")
            .map(|value| parse_origins(&value))
            .unwrap_or_default();

        let database_url = get("DSN").or_else(|| get("DATABASE_URL"));

        let broker_url = match get("KAFKA_URL") {
            Some(url) => Some(url),
            None => match (get("KAFKA_HOST"), get("KAFKA_PORT")) {
                (Some(host), Some(port)) => Some(format!("{}:{}", host, port)),
                (Some(host), None) => Some(host),
                _ => None,
            },
        };

        let topic_prefix = get("KAFKA_TOPIC_PREFIX").unwrap_or_else(|| DEFAULT_TOPIC_PREFIX.to_string());

        let google_oauth = match (
            get("GOOGLE_CLIENT_ID"),
            get("GOOGLE_CLIENT_SECRET"),
            get("GOOGLE_REDIRECT_URL"),
        ) {
            (Some(client_id), Some(client_secret), Some(redirect_url)) => Some(GoogleOAuthConfig {
                client_id,
                client_secret,
                redirect_url,
            }),
            _ => None,
        };

        let config = Self {
            api_port,
            gateway_port,
            environment,
            jwt_secret,
            allowed_origins,
            database_url,
            broker_url,
            topic_prefix,
            google_oauth,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_topic_prefix(&self.topic_prefix)?;
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingValue("JWT_SECRET"));
        }
        Ok(())
    }

    /// Whether `origin` is on the allow-list
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|allowed| allowed == origin)
    }
}

fn parse_port(key: &'static str, value: &str) -> Result<u16, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        message: format!("'{}' is not a valid port", value),
    })
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| origin.trim_end_matches('/').to_string())
        .collect()
}

/// A topic prefix becomes part of a broker subject, so it must be one token
pub fn validate_topic_prefix(prefix: &str) -> Result<(), ConfigError> {
    let bad = prefix.is_empty()
        || prefix
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '.' | '*' | '>'));
    if bad {
        return Err(ConfigError::InvalidValue {
            key: "KAFKA_TOPIC_PREFIX",
            message: format!("'{}' is not a single broker token", prefix),
        });
    }
    Ok(())
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub fn api_port(mut self, port: u16) -> Self {
        self.config.api_port = port;
        self
    }

    pub fn gateway_port(mut self, port: u16) -> Self {
        self.config.gateway_port = port;
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.config.environment = environment;
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.jwt_secret = secret.into();
        self
    }

    /// Add one allowed origin
    pub fn allowed_origin(mut self, origin: impl Into<String>) -> Self {
        self.config.allowed_origins.push(origin.into());
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = Some(url.into());
        self
    }

    pub fn broker_url(mut self, url: impl Into<String>) -> Self {
        self.config.broker_url = Some(url.into());
        self
    }

    pub fn topic_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.topic_prefix = prefix.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
    #[error("missing value: {0}")]
    MissingValue(&'static str),
}
