//! Application configuration

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const CONFIG_FILE: &str = "markbook.json";

/// Default data directory (`~/.local/share/markbook` on Linux).
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("markbook"))
        .ok_or_else(|| anyhow!("Unable to determine a data directory for this platform"))
}

/// Main application configuration, persisted as JSON in the data directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Config schema version
    pub version: u32,

    /// Data directory path
    pub data_dir: PathBuf,

    /// Host the public image URLs are built against
    pub host: String,

    /// Port the server listens on
    pub port: u16,

    /// Name (or path) of the external book-builder binary
    pub gitbook_bin: String,

    /// Upper bound for a single external tool invocation, in seconds
    pub build_timeout_secs: u64,

    /// Logging level
    pub log_level: String,
}

impl Config {
    /// Load configuration from a data directory, creating the default
    /// document when none exists yet.
    pub fn load_or_create(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(CONFIG_FILE);

        if config_path.exists() {
            info!("Loading config from {:?}", config_path);
            let json = fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&json)?;
            Ok(config)
        } else {
            warn!("No config found, creating default at {:?}", config_path);
            let config = Self::default_with_dir(data_dir.to_path_buf());
            config.save()?;
            Ok(config)
        }
    }

    /// Create default configuration with a specific data directory
    pub fn default_with_dir(data_dir: PathBuf) -> Self {
        Self {
            version: 1,
            data_dir,
            host: "127.0.0.1".to_string(),
            port: 8080,
            gitbook_bin: "gitbook".to_string(),
            build_timeout_secs: 300,
            log_level: "info".to_string(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;

        let config_path = self.data_dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, json)?;
        info!("Saved config to {:?}", config_path);
        Ok(())
    }

    /// Folder holding one project folder per website
    pub fn websites_dir(&self) -> PathBuf {
        self.data_dir.join("websites")
    }

    /// Folder holding per-session state (build output lands here)
    pub fn userdb_dir(&self) -> PathBuf {
        self.data_dir.join("userdb")
    }

    /// Folder holding uploaded images
    pub fn pic_dir(&self) -> PathBuf {
        self.data_dir.join("pic")
    }

    /// Template folder seeding new projects (`book.json` is copied from here)
    pub fn template_dir(&self) -> PathBuf {
        self.data_dir.join("template")
    }

    /// Path of the SQLite database file
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("markbook.db")
    }

    /// Base URL the image routes are reachable under
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        fs::create_dir_all(self.websites_dir())?;
        fs::create_dir_all(self.userdb_dir())?;
        fs::create_dir_all(self.pic_dir())?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = default_data_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::default_with_dir(data_dir)
    }
}
