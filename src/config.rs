use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    /// Full connection URL; wins over the host/user/password/name parts
    /// when set.
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

fn default_db_port() -> u16 {
    5432
}

impl DatabaseSettings {
    /// The URL the pool connects with.
    pub fn connection_url(&self) -> String {
        self.url.clone().unwrap_or_else(|| {
            format!(
                "postgres://{}:{}@{}:{}/{}",
                self.user, self.password, self.host, self.port, self.name
            )
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Configuration file (config/default.toml)
    /// 2. Local overrides (config/local.toml)
    /// 3. Environment variables (prefixed with SWIPESTORE_)
    pub fn load() -> Result<Self, ConfigError> {
        // Pick up a .env file if the embedding process uses one
        dotenv::dotenv().ok();

        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            // Local config file (for development overrides)
            .add_source(File::with_name("config/local").required(false))
            // e.g., SWIPESTORE_DATABASE__HOST -> database.host
            .add_source(
                Environment::with_prefix("SWIPESTORE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("SWIPESTORE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Promote well-known plain environment variables into the config tree.
/// `DATABASE_URL` is checked first, then the prefixed form.
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let database_url = env::var("DATABASE_URL")
        .or_else(|_| env::var("SWIPESTORE_DATABASE__URL"))
        .ok();

    let mut builder = Config::builder().add_source(settings);

    if let Some(url) = database_url {
        builder = builder.set_override("database.url", url)?;
    }

    builder.build()
}
