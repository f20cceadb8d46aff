//! Migration configuration.
//!
//! Built once from the command line and passed by reference to every stage
//! that needs it. Nothing here changes during a run.

use thiserror::Error;

use crate::repository::cyclope::DEFAULT_BATCH_SIZE;
use crate::utils::mysql_url;

/// Site domain the migrated Cyclope instance is served from.
pub const PRODUCTION_SITE_DOMAIN: &str = "www.redecom.com.ar";

/// Site domain used with `--devel`.
pub const DEVEL_SITE_DOMAIN: &str = "localhost:8000";

/// Default MySQL port.
pub const DEFAULT_MYSQL_PORT: u16 = 3306;

/// Invalid configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required option: {0}")]
    Missing(&'static str),

    #[error("Invalid table prefix '{0}': only letters, digits and underscores are allowed")]
    InvalidPrefix(String),

    #[error("Batch size must be at least 1")]
    InvalidBatchSize,
}

/// Settings for a single migration run.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Joomla MySQL host.
    pub server: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: Option<String>,
    /// Prefix of every Joomla table (`jos_`, `wiphala_`, ...).
    pub prefix: String,
    /// Password given to every migrated user. Defaults to the username.
    pub default_password: Option<String>,
    pub devel: bool,
    /// Overrides the production/development site domain.
    pub site_domain: Option<String>,
    /// Cyclope database: SQLite path or `postgres://` URL.
    pub target_url: String,
    pub batch_size: usize,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            server: "localhost".to_string(),
            port: DEFAULT_MYSQL_PORT,
            database: String::new(),
            user: String::new(),
            password: None,
            prefix: String::new(),
            default_password: None,
            devel: false,
            site_domain: None,
            target_url: String::new(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl MigrationConfig {
    /// Check values that would otherwise fail deep inside a run.
    ///
    /// The prefix ends up inside SQL table names, so it is restricted to
    /// identifier characters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.is_empty() {
            return Err(ConfigError::Missing("server"));
        }
        if self.database.is_empty() {
            return Err(ConfigError::Missing("database"));
        }
        if self.user.is_empty() {
            return Err(ConfigError::Missing("user"));
        }
        if self.target_url.is_empty() {
            return Err(ConfigError::Missing("target"));
        }
        if !self
            .prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ConfigError::InvalidPrefix(self.prefix.clone()));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        Ok(())
    }

    /// Domain written into the Cyclope site settings.
    pub fn site_domain(&self) -> &str {
        match &self.site_domain {
            Some(domain) => domain,
            None if self.devel => DEVEL_SITE_DOMAIN,
            None => PRODUCTION_SITE_DOMAIN,
        }
    }

    /// Connection URL of the Joomla database.
    pub fn source_url(&self) -> String {
        mysql_url(
            &self.server,
            self.port,
            &self.database,
            &self.user,
            self.password.as_deref(),
        )
    }
}
