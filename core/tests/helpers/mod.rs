#![allow(dead_code)]

//! Shared fixtures for integration tests

use std::time::Duration;

use mb_core::build::BookBuilder;
use mb_core::config::Config;
use mb_core::infrastructure::database::Database;
use mb_core::mapping::MappingStore;
use mb_core::session::SessionManager;
use tempfile::TempDir;

/// Fresh migrated store over a database file in a temp dir.
pub async fn test_store() -> (TempDir, MappingStore) {
    let dir = TempDir::new().unwrap();
    let db = Database::create(&dir.path().join("test.db")).await.unwrap();
    db.migrate().await.unwrap();
    (dir, MappingStore::new(db.conn().clone()))
}

pub struct TestCore {
    pub config: Config,
    pub mapping: MappingStore,
    pub sessions: SessionManager,
}

/// Full session stack with a substitute book-builder binary (`true` for a
/// tool that always succeeds, `false` for one that always fails).
pub async fn test_core_with_builder(dir: &TempDir, program: &str) -> TestCore {
    let config = Config::default_with_dir(dir.path().to_path_buf());
    config.ensure_directories().unwrap();

    let db = Database::create(&config.db_path()).await.unwrap();
    db.migrate().await.unwrap();

    let mapping = MappingStore::new(db.conn().clone());
    let builder = BookBuilder::new(program.to_string(), Duration::from_secs(10));
    let sessions = SessionManager::new(db.conn().clone(), mapping.clone(), builder, &config);

    TestCore {
        config,
        mapping,
        sessions,
    }
}
