use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::query::DEFAULT_PAGE_SIZE;

pub static CONFIG: OnceCell<Config> = OnceCell::new();

const ENV_PREFIX: &str = "RESQ_";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub resq: String,
}

impl LoggingConfig {
    const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
    const RESQ_LEVEL: &str = "info";

    fn default() -> Self {
        LoggingConfig {
            resq: Self::RESQ_LEVEL.to_string(),
        }
    }

    /// flexi_logger spec: other crates at warn, ours at the configured level
    pub fn log_spec(&self) -> String {
        format!("warn, resq={}", self.resq)
    }

    fn ensure_valid(&mut self) {
        let str_original = self.resq.clone();
        self.resq = self.resq.trim().to_ascii_lowercase();
        if !Self::LOG_LEVELS.contains(&self.resq.as_str()) {
            eprintln!(
                "Config error: resq log level of '{}' is invalid - using default of '{}'",
                str_original,
                Self::RESQ_LEVEL
            );
            self.resq = Self::RESQ_LEVEL.to_owned();
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Directory holding resq.db; the local data directory when unset
    dir: Option<String>,
    pool_size: u32,
    connection_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            dir: None,
            pool_size: Self::POOL_SIZE,
            connection_timeout_secs: Self::CONNECTION_TIMEOUT_SECS,
        }
    }
}

impl DatabaseConfig {
    const POOL_SIZE: u32 = 4;
    const CONNECTION_TIMEOUT_SECS: u64 = 5;

    pub fn dir(&self) -> Option<PathBuf> {
        self.dir.as_ref().map(PathBuf::from)
    }

    pub fn pool_size(&self) -> u32 {
        self.pool_size
    }

    pub fn connection_timeout_secs(&self) -> u64 {
        self.connection_timeout_secs
    }

    fn ensure_valid(&mut self) {
        if self.pool_size == 0 {
            eprintln!(
                "Config error: pool_size must be at least 1 - using default of {}",
                Self::POOL_SIZE
            );
            self.pool_size = Self::POOL_SIZE;
        }

        if self.connection_timeout_secs == 0 {
            eprintln!(
                "Config error: connection_timeout_secs must be at least 1 - using default of {}",
                Self::CONNECTION_TIMEOUT_SECS
            );
            self.connection_timeout_secs = Self::CONNECTION_TIMEOUT_SECS;
        }

        if matches!(self.dir.as_deref(), Some(d) if d.trim().is_empty()) {
            self.dir = None;
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ListingConfig {
    default_page_size: i64,
}

impl ListingConfig {
    fn default() -> Self {
        ListingConfig {
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn default_page_size(&self) -> i64 {
        self.default_page_size
    }

    fn ensure_valid(&mut self) {
        if self.default_page_size < 1 {
            eprintln!(
                "Config error: default_page_size of {} is invalid - using default of {}",
                self.default_page_size, DEFAULT_PAGE_SIZE
            );
            self.default_page_size = DEFAULT_PAGE_SIZE;
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    pub listing: ListingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            logging: LoggingConfig::default(),
            database: DatabaseConfig::default(),
            listing: ListingConfig::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file located in your app's data directory.
    /// If the file is missing or fails to parse, defaults are used.
    /// Additionally, writes the default config to disk if no file exists.
    pub fn load_config(project_dirs: &ProjectDirs) -> Self {
        let config_path = project_dirs.data_local_dir().join("config.toml");
        Self::load_from(&config_path)
    }

    /// Defaults, then the TOML file, then `RESQ_`-prefixed environment
    /// variables (`RESQ_LISTING__DEFAULT_PAGE_SIZE=25`).
    pub fn load_from(config_path: &Path) -> Self {
        let default_config = Config::default();

        // If the config file doesn't exist, write the default configuration to disk.
        if !config_path.exists() {
            Self::write_default(config_path, &default_config);
        }

        let figment = Figment::from(Serialized::defaults(default_config.clone()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        // Attempt to extract the configuration; on error, log a message and fall back to defaults.
        let mut config: Config = figment.extract().unwrap_or_else(|err| {
            eprintln!(
                "Could not load config file {}: {}. Using default configuration.",
                config_path.display(),
                err
            );
            default_config
        });

        config.ensure_valid();

        config
    }

    fn write_default(config_path: &Path, default_config: &Config) {
        if let Some(parent) = config_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!(
                    "Failed to create configuration directory {}: {}",
                    parent.display(),
                    e
                );
            }
        }
        match toml::to_string_pretty(default_config) {
            Ok(toml_string) => {
                if let Err(e) = fs::write(config_path, toml_string) {
                    eprintln!(
                        "Failed to write default config to {}: {}",
                        config_path.display(),
                        e
                    );
                }
            }
            Err(_) => eprintln!("Failed to serialize default config."),
        }
    }

    fn ensure_valid(&mut self) {
        self.logging.ensure_valid();
        self.database.ensure_valid();
        self.listing.ensure_valid();
    }
}
