//! Configuration management.
//!
//! Settings are resolved in layers: defaults, then a TOML file, then
//! environment variables (after `.env` has been loaded by the binary), then
//! command-line flags applied by the caller.

use crate::gc::{DEFAULT_RETENTION_DAYS, RETENTION_DAYS_ENV, parse_retention_days};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "SLIPCHECK_CONFIG_PATH";

/// Environment variable overriding the database path.
pub const DB_PATH_ENV: &str = "SLIPCHECK_DB_PATH";

/// Database used when nothing else is configured.
pub const DEFAULT_DB_PATH: &str = "data/slipcheck.db";

/// Browser-like user agent; coupon pages reject obvious bots.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0 Safari/537.36";

/// Seconds before a coupon page request is abandoned.
pub const DEFAULT_COUPON_TIMEOUT_SECS: u64 = 10;

/// Main configuration for slipcheck.
#[derive(Debug, Clone)]
pub struct SlipcheckConfig {
    /// Path to the `SQLite` database.
    pub db_path: PathBuf,
    /// Days a match stays active. Zero disables expiry.
    pub retention_days: u32,
    /// User id recorded when the caller does not supply one.
    pub default_user_id: i64,
    /// Logging settings.
    pub logging: LoggingSettings,
    /// Metrics settings.
    pub metrics: MetricsSettings,
    /// Coupon decoder settings.
    pub coupon: CouponConfig,
}

/// Logging section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSettings {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Optional log file (appended to).
    pub file: Option<PathBuf>,
    /// `EnvFilter` directive, e.g. `slipcheck=debug`.
    pub filter: Option<String>,
}

/// Metrics section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsSettings {
    /// Whether the Prometheus exporter is installed.
    pub enabled: Option<bool>,
    /// Exporter listen port.
    pub port: Option<u16>,
}

/// Coupon decoder settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponConfig {
    /// URL templates containing a `{code}` placeholder. Empty means built-in defaults.
    pub urls: Vec<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for CouponConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            timeout_secs: DEFAULT_COUPON_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Database path.
    pub db_path: Option<String>,
    /// Retention window in days; negative values clamp to zero.
    pub retention_days: Option<i64>,
    /// Default user id.
    pub default_user_id: Option<i64>,
    /// Logging section.
    pub logging: Option<LoggingSettings>,
    /// Metrics section.
    pub metrics: Option<MetricsSettings>,
    /// Coupon section.
    pub coupon: Option<ConfigFileCoupon>,
}

/// Coupon section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileCoupon {
    /// URL templates.
    pub urls: Option<Vec<String>>,
    /// Timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// User agent.
    pub user_agent: Option<String>,
}

impl Default for SlipcheckConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            retention_days: DEFAULT_RETENTION_DAYS,
            default_user_id: 0,
            logging: LoggingSettings::default(),
            metrics: MetricsSettings::default(),
            coupon: CouponConfig::default(),
        }
    }
}

impl SlipcheckConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the file layer and applies environment overrides.
    ///
    /// An explicit path (from `--config`) wins over `SLIPCHECK_CONFIG_PATH`,
    /// which wins over the platform config directory. A missing default file
    /// is not an error; a missing explicit file is.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file cannot be read or parsed, or if
    /// an environment override holds an invalid value.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let config = match explicit.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::load_default(),
        };

        config.with_env_overrides()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for [`ConfigFile`].
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Looks for `slipcheck/config.toml` under the platform config dir.
    /// Returns default configuration if no readable file is found.
    #[must_use]
    pub fn load_default() -> Self {
        Self::default_path()
            .filter(|path| path.exists())
            .and_then(|path| match Self::load_from_file(&path) {
                Ok(config) => Some(config),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                    None
                },
            })
            .unwrap_or_default()
    }

    /// Platform config file location, if a home directory is known.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("slipcheck").join("config.toml"))
    }

    /// Applies `SLIPCHECK_*` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `SLIPCHECK_EXPIRE_DAYS` is not an
    /// integer or `SLIPCHECK_METRICS_PORT` is not a port number.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(path) = env_string(DB_PATH_ENV) {
            self.db_path = PathBuf::from(path);
        }
        if let Some(days) = env_string(RETENTION_DAYS_ENV) {
            self.retention_days = parse_retention_days(&days)?;
        }
        if let Some(format) = env_string("SLIPCHECK_LOG_FORMAT") {
            self.logging.format = Some(format);
        }
        if let Some(file) = env_string("SLIPCHECK_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(file));
        }
        if let Some(enabled) = env_string("SLIPCHECK_METRICS_ENABLED") {
            self.metrics.enabled = Some(parse_bool(&enabled));
        }
        if let Some(port) = env_string("SLIPCHECK_METRICS_PORT") {
            let port = port.parse::<u16>().map_err(|_| {
                Error::InvalidInput(format!("SLIPCHECK_METRICS_PORT must be a port number, got '{port}'"))
            })?;
            self.metrics.port = Some(port);
        }
        Ok(self)
    }

    /// Converts a `ConfigFile` to `SlipcheckConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(db_path) = file.db_path {
            config.db_path = PathBuf::from(db_path);
        }
        if let Some(days) = file.retention_days {
            config.retention_days = u32::try_from(days.max(0)).unwrap_or(u32::MAX);
        }
        if let Some(user_id) = file.default_user_id {
            config.default_user_id = user_id;
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }
        if let Some(metrics) = file.metrics {
            config.metrics = metrics;
        }
        if let Some(coupon) = file.coupon {
            if let Some(urls) = coupon.urls {
                config.coupon.urls = urls;
            }
            if let Some(timeout) = coupon.timeout_secs {
                config.coupon.timeout_secs = timeout;
            }
            if let Some(agent) = coupon.user_agent {
                config.coupon.user_agent = agent;
            }
        }

        config
    }

    /// Sets the database path.
    #[must_use]
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    /// Sets the retention window.
    #[must_use]
    pub const fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
