use std::path::PathBuf;

use serde::Deserialize;

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

const DEFAULT_URL_AUTH: &str = "https://localhost:8006";
const DEFAULT_DIRECTORY_URL: &str = "http://localhost:8004";
const DEFAULT_TOKEN_EXPIRY_MINUTES: i64 = 10;
const DEFAULT_SCOPE: &str = "read";
const DEFAULT_PORT: u16 = 8006;
const DEFAULT_DIRECTORY_TIMEOUT_SECS: u64 = 10;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file `{0}`: {1}")]
    ReadConfigFile(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file `{0}`: {1}")]
    ParseConfigFile(PathBuf, #[source] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Public URL of this service; its host and path become the issuer and
    /// audience of every token.
    pub url_auth: String,
    /// Base URL of the service directory.
    pub directory_url: String,
    /// PEM-encoded RSA private key for signing. Falls back to the bundled
    /// localhost key when unset.
    pub ssl_key: Option<PathBuf>,
    /// PEM-encoded X.509 certificate carrying the verification key. Falls
    /// back to the bundled localhost certificate when unset.
    pub ssl_cert: Option<PathBuf>,
    /// Token lifetime in minutes.
    pub token_expiry: i64,
    /// Scope applied when a token request names none.
    pub default_scope: String,
    pub port: u16,
    /// Worker threads for the runtime; defaults to one per core.
    pub workers: Option<usize>,
    /// Timeout applied to every directory call.
    pub directory_timeout_secs: u64,
}

impl AuthConfig {
    pub fn from_toml_file(path: &PathBuf) -> ConfigResult<Self> {
        let file_contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadConfigFile(path.clone(), e))?;
        let parsed: RawAuthConfig = toml::from_str(&file_contents)
            .map_err(|e| ConfigError::ParseConfigFile(path.clone(), e))?;
        parsed.resolve()
    }

    /// Build the configuration from `FEDAUTH_*` environment variables, or
    /// from the TOML file named by `FEDAUTH_CONFIG` when set.
    pub fn from_env() -> ConfigResult<Self> {
        if let Ok(path) = std::env::var("FEDAUTH_CONFIG") {
            return Self::from_toml_file(&PathBuf::from(path));
        }

        let raw = RawAuthConfig {
            url_auth: env_var("FEDAUTH_URL_AUTH"),
            directory_url: env_var("FEDAUTH_DIRECTORY_URL"),
            ssl_key: env_var("FEDAUTH_SSL_KEY").map(PathBuf::from),
            ssl_cert: env_var("FEDAUTH_SSL_CERT").map(PathBuf::from),
            token_expiry: parse_env("FEDAUTH_TOKEN_EXPIRY")?,
            default_scope: env_var("FEDAUTH_DEFAULT_SCOPE"),
            port: parse_env("FEDAUTH_PORT")?,
            workers: parse_env("FEDAUTH_WORKERS")?,
            directory_timeout_secs: parse_env("FEDAUTH_DIRECTORY_TIMEOUT")?,
        };
        raw.resolve()
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn parse_env<T: std::str::FromStr>(name: &str) -> ConfigResult<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env_var(name) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::Invalid(format!("{name}={value}: {e}"))),
    }
}

#[derive(Deserialize, Debug, Default)]
struct RawAuthConfig {
    url_auth: Option<String>,
    directory_url: Option<String>,
    ssl_key: Option<PathBuf>,
    ssl_cert: Option<PathBuf>,
    token_expiry: Option<i64>,
    default_scope: Option<String>,
    port: Option<u16>,
    workers: Option<usize>,
    directory_timeout_secs: Option<u64>,
}

impl RawAuthConfig {
    fn resolve(self) -> ConfigResult<AuthConfig> {
        let url_auth = self
            .url_auth
            .unwrap_or_else(|| DEFAULT_URL_AUTH.to_string());
        let parsed = url::Url::parse(&url_auth)
            .map_err(|e| ConfigError::Invalid(format!("url_auth `{url_auth}`: {e}")))?;
        if parsed.host_str().is_none() {
            return Err(ConfigError::Invalid(format!(
                "url_auth `{url_auth}` has no host"
            )));
        }

        let token_expiry = self.token_expiry.unwrap_or(DEFAULT_TOKEN_EXPIRY_MINUTES);
        if token_expiry <= 0 {
            return Err(ConfigError::Invalid(format!(
                "token_expiry must be positive, got {token_expiry}"
            )));
        }

        Ok(AuthConfig {
            url_auth,
            directory_url: self
                .directory_url
                .unwrap_or_else(|| DEFAULT_DIRECTORY_URL.to_string()),
            ssl_key: self.ssl_key,
            ssl_cert: self.ssl_cert,
            token_expiry,
            default_scope: self.default_scope.unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            port: self.port.unwrap_or(DEFAULT_PORT),
            workers: self.workers,
            directory_timeout_secs: self
                .directory_timeout_secs
                .unwrap_or(DEFAULT_DIRECTORY_TIMEOUT_SECS),
        })
    }
}
