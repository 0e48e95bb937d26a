//! Project/session lifecycle
//!
//! A session is a short token bound to a project folder under the
//! websites directory. Creation is idempotent by folder path; deleting a
//! session never deletes the user's content folder.

pub mod error;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

use crate::build::{summary, BookBuilder, BuildError};
use crate::config::Config;
use crate::infrastructure::database::entities::session;
use crate::mapping::{store, EntryNode, MappingStore};
use crate::shared::{ids, paths};

pub use error::{Result, SessionError};

/// Session row shaped for the editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: String,
    pub folder_name: String,
    pub folder_path: PathBuf,
    pub created_at: DateTime<Utc>,
}

impl From<session::Model> for SessionInfo {
    fn from(row: session::Model) -> Self {
        Self {
            session_id: row.sid,
            folder_name: row.name,
            folder_path: PathBuf::from(row.path),
            created_at: row.created_at,
        }
    }
}

/// A session plus the current structure of its project folder.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub folder_path: PathBuf,
    pub structure: Vec<EntryNode>,
}

/// Result of a successful HTML build.
#[derive(Debug, Clone)]
pub struct BookExport {
    pub output: String,
    pub book_path: PathBuf,
}

/// Result of a successful PDF build.
#[derive(Debug, Clone)]
pub struct PdfExport {
    pub path: PathBuf,
    pub file_name: String,
}

/// Manages the `sessions` table and the project folders it points at.
pub struct SessionManager {
    db: DatabaseConnection,
    mapping: MappingStore,
    builder: BookBuilder,
    websites_dir: PathBuf,
    userdb_dir: PathBuf,
    template_dir: PathBuf,
}

impl SessionManager {
    pub fn new(
        db: DatabaseConnection,
        mapping: MappingStore,
        builder: BookBuilder,
        config: &Config,
    ) -> Self {
        Self {
            db,
            mapping,
            builder,
            websites_dir: paths::normalize(&config.websites_dir()),
            userdb_dir: paths::normalize(&config.userdb_dir()),
            template_dir: paths::normalize(&config.template_dir()),
        }
    }

    /// Create (or re-attach to) the session for a project folder.
    ///
    /// A new folder is seeded with the template `book.json` and run through
    /// `gitbook init` + `gitbook install`; a failed init removes the
    /// half-created folder again. Requesting a folder that is already
    /// tracked returns the existing token.
    pub async fn create(&self, folder_name: &str) -> Result<String> {
        let folder_name = folder_name.trim();
        if folder_name.is_empty() || folder_name.contains(['/', '\\']) || folder_name == ".." {
            return Err(SessionError::InvalidName(folder_name.to_string()));
        }

        let folder = self.websites_dir.join(folder_name);
        if !fs::try_exists(&folder).await? {
            self.initialize_project(&folder).await?;
        }

        // Idempotent by folder path
        let folder_str = paths::path_str(&folder);
        if let Some(existing) = session::Entity::find()
            .filter(session::Column::Path.eq(folder_str.clone()))
            .one(&self.db)
            .await?
        {
            if self.mapping.tracked_count(&folder).await? == 0 {
                self.mapping.import_tree(&folder).await?;
            }
            return Ok(existing.sid);
        }

        let sid = ids::short_token();
        fs::create_dir_all(self.userdb_dir.join(&sid)).await?;
        self.mapping.import_tree(&folder).await?;

        session::ActiveModel {
            sid: Set(sid.clone()),
            name: Set(folder_name.to_string()),
            path: Set(folder_str),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!("Created session {} for {}", sid, folder.display());
        Ok(sid)
    }

    async fn initialize_project(&self, folder: &Path) -> Result<()> {
        fs::create_dir_all(folder).await?;

        let template_book = self.template_dir.join("book.json");
        if fs::try_exists(&template_book).await? {
            if let Err(e) = fs::copy(&template_book, folder.join("book.json")).await {
                warn!("Failed to copy template book.json: {}", e);
            }
        } else {
            warn!("Template folder missing: {}", self.template_dir.display());
        }

        if let Err(e) = self.builder.init(folder).await {
            // Best-effort cleanup of the half-initialized folder
            if let Err(cleanup) = fs::remove_dir_all(folder).await {
                warn!(
                    "Failed to remove folder after init failure {}: {}",
                    folder.display(),
                    cleanup
                );
            }
            return Err(e.into());
        }

        self.builder.install(folder).await?;
        Ok(())
    }

    /// Folder path and current structure for a session token.
    pub async fn get(&self, sid: &str) -> Result<SessionView> {
        let row = self.session_by_sid(sid).await?;
        let folder = PathBuf::from(&row.path);
        if !fs::try_exists(&folder).await? {
            return Err(SessionError::FolderMissing(folder));
        }

        let structure = self.mapping.read_tree(&folder).await?;
        Ok(SessionView {
            folder_path: folder,
            structure,
        })
    }

    /// All tracked sessions.
    pub async fn list(&self) -> Result<Vec<SessionInfo>> {
        let rows = session::Entity::find().all(&self.db).await?;
        Ok(rows.into_iter().map(SessionInfo::from).collect())
    }

    /// Rename the project folder behind a session and rewrite every
    /// mapping path prefix under it, all in one transaction.
    pub async fn rename(&self, sid: &str, new_name: &str) -> Result<PathBuf> {
        let new_name = new_name.trim();
        if new_name.is_empty() || new_name.contains(['/', '\\']) || new_name == ".." {
            return Err(SessionError::InvalidName(new_name.to_string()));
        }

        let row = self.session_by_sid(sid).await?;
        let old_path = PathBuf::from(&row.path);
        if !fs::try_exists(&old_path).await? {
            return Err(SessionError::FolderMissing(old_path));
        }

        let parent = old_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.websites_dir.clone());
        let new_path = parent.join(new_name);
        if fs::try_exists(&new_path).await? {
            return Err(SessionError::NameTaken(new_name.to_string()));
        }

        fs::rename(&old_path, &new_path)
            .await
            .map_err(|e| SessionError::from_io(e, &old_path))?;

        let txn = self.db.begin().await?;
        let mut active: session::ActiveModel = row.into();
        active.name = Set(new_name.to_string());
        active.path = Set(paths::path_str(&new_path));
        active.update(&txn).await?;
        store::rewrite_path_prefix(&txn, &old_path, &new_path).await?;
        txn.commit().await?;

        info!("Session {} renamed to {}", sid, new_path.display());
        Ok(new_path)
    }

    /// Drop a session: rename tracked files back to their display names,
    /// forget the mapping rows and remove the per-session output folder.
    /// The content folder itself is preserved.
    pub async fn delete(&self, sid: &str) -> Result<()> {
        let row = self.session_by_sid(sid).await?;
        let folder = PathBuf::from(&row.path);

        // De-obfuscate so the folder stays usable without the mapping
        for file in self.mapping.files_under(&folder).await? {
            if !file.display_name.ends_with(".md") || file.real_name == file.display_name {
                continue;
            }
            let old = PathBuf::from(&file.file_path);
            let Some(dir) = old.parent() else { continue };
            let restored = dir.join(&file.display_name);
            if old != restored && fs::try_exists(&old).await.unwrap_or(false) {
                if let Err(e) = fs::rename(&old, &restored).await {
                    warn!(
                        "Failed to restore {} -> {}: {}",
                        old.display(),
                        file.display_name,
                        e
                    );
                }
            }
        }

        let txn = self.db.begin().await?;
        self.mapping.forget_tree(&txn, &folder).await?;
        let sid_owned = row.sid.clone();
        row.delete(&txn).await?;
        txn.commit().await?;

        let session_folder = self.userdb_dir.join(&sid_owned);
        if fs::try_exists(&session_folder).await? {
            fs::remove_dir_all(&session_folder)
                .await
                .map_err(|e| SessionError::from_io(e, &session_folder))?;
        }

        info!("Deleted session {}", sid_owned);
        Ok(())
    }

    /// Build the book and relocate `_book` into the per-session folder.
    pub async fn export_book(&self, sid: &str) -> Result<BookExport> {
        let row = self.session_by_sid(sid).await?;
        let folder = PathBuf::from(&row.path);
        if !fs::try_exists(&folder).await? {
            return Err(SessionError::FolderMissing(folder));
        }

        let output = self.builder.build(&folder).await?;
        let target = self.userdb_dir.join(&row.sid);
        let book_path = self.builder.relocate_book(&folder, &target).await?;

        Ok(BookExport {
            output: output.stdout,
            book_path,
        })
    }

    /// Build a PDF named after the project inside its folder.
    pub async fn export_pdf(&self, sid: &str) -> Result<PdfExport> {
        let row = self.session_by_sid(sid).await?;
        let folder = PathBuf::from(&row.path);
        if !fs::try_exists(&folder).await? {
            return Err(SessionError::FolderMissing(folder));
        }

        let file_name = format!("{}.pdf", row.name);
        let pdf_path = folder.join(&file_name);
        self.builder.pdf(&folder, &pdf_path).await?;
        if !fs::try_exists(&pdf_path).await? {
            return Err(SessionError::Tool(BuildError::MissingOutput(pdf_path)));
        }

        Ok(PdfExport {
            path: pdf_path,
            file_name,
        })
    }

    /// Regenerate `SUMMARY.md` from the mapping table.
    pub async fn export_summary(&self, sid: &str) -> Result<PathBuf> {
        let row = self.session_by_sid(sid).await?;
        let folder = PathBuf::from(&row.path);
        if !fs::try_exists(&folder).await? {
            return Err(SessionError::FolderMissing(folder));
        }

        let tree = self.mapping.read_tree(&folder).await?;
        let content = summary::generate_summary(&folder, &tree);
        let summary_path = folder.join("SUMMARY.md");
        fs::write(&summary_path, content)
            .await
            .map_err(|e| SessionError::from_io(e, &summary_path))?;

        Ok(summary_path)
    }

    async fn session_by_sid(&self, sid: &str) -> Result<session::Model> {
        session::Entity::find()
            .filter(session::Column::Sid.eq(sid))
            .one(&self.db)
            .await?
            .ok_or_else(|| SessionError::NotFound(sid.to_string()))
    }
}
