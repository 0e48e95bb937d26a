//! Markbook Core
//!
//! Backend library for the Markbook browser-based book editor: tracks
//! project sessions, mirrors Markdown trees between disk and the mapping
//! table, and drives the external `gitbook` tool for HTML/PDF output.

pub mod build;
pub mod config;
pub mod images;
pub mod infrastructure;
pub mod mapping;
pub mod session;
pub mod shared;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::build::BookBuilder;
use crate::config::Config;
use crate::images::ImageStore;
use crate::infrastructure::database::Database;
use crate::mapping::MappingStore;
use crate::session::SessionManager;

/// Top-level context shared by every request handler.
pub struct Core {
    pub config: Config,
    pub db: Database,
    pub mapping: MappingStore,
    pub sessions: SessionManager,
    pub images: ImageStore,
}

impl Core {
    /// Boot the core against a data directory: load (or create) the config,
    /// open the database, run migrations and wire up the managers.
    pub async fn new(data_dir: PathBuf) -> Result<Arc<Self>> {
        let config = Config::load_or_create(&data_dir)?;
        config.ensure_directories()?;

        let db = Database::create(&config.db_path()).await?;
        db.migrate().await?;

        let mapping = MappingStore::new(db.conn().clone());
        let builder = BookBuilder::new(
            config.gitbook_bin.clone(),
            std::time::Duration::from_secs(config.build_timeout_secs),
        );
        let sessions = SessionManager::new(db.conn().clone(), mapping.clone(), builder, &config);
        let images = ImageStore::new(config.pic_dir());

        info!("Markbook core ready at {}", config.data_dir.display());

        Ok(Arc::new(Self {
            config,
            db,
            mapping,
            sessions,
            images,
        }))
    }
}
