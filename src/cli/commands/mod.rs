//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to the migrate command.

mod migrate;

use clap::Parser;

use crate::config::{MigrationConfig, DEFAULT_MYSQL_PORT};
use crate::repository::DEFAULT_BATCH_SIZE;

#[derive(Parser)]
#[command(name = "joomla2cyclope")]
#[command(about = "Migrate a Joomla site into a Cyclope database")]
#[command(version)]
pub struct Cli {
    /// Joomla MySQL server
    #[arg(long, default_value = "localhost")]
    server: String,

    /// Joomla MySQL port
    #[arg(long, default_value_t = DEFAULT_MYSQL_PORT)]
    port: u16,

    /// Joomla database name
    #[arg(long)]
    database: String,

    /// Joomla database user
    #[arg(long)]
    user: String,

    /// Joomla database password
    #[arg(long, env = "JOOMLA_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Joomla table prefix (e.g. jos_)
    #[arg(long, default_value = "")]
    prefix: String,

    /// Password for every migrated user (defaults to each username)
    #[arg(long = "default_password")]
    default_password: Option<String>,

    /// Point the site at the development server instead of production
    #[arg(long)]
    devel: bool,

    /// Override the site domain
    #[arg(long)]
    site_domain: Option<String>,

    /// Cyclope database (SQLite path or postgres:// URL)
    #[arg(long, env = "DATABASE_URL")]
    target: String,

    /// Rows per INSERT statement
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    fn into_config(self) -> MigrationConfig {
        MigrationConfig {
            server: self.server,
            port: self.port,
            database: self.database,
            user: self.user,
            password: self.password,
            prefix: self.prefix,
            default_password: self.default_password,
            devel: self.devel,
            site_domain: self.site_domain,
            target_url: self.target,
            batch_size: self.batch_size,
        }
    }
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let config = Cli::parse().into_config();
    config.validate()?;
    migrate::cmd_migrate(&config).await
}
