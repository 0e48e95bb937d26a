//! Mapping store error types

use std::path::PathBuf;

use sea_orm::DbErr;
use thiserror::Error;

/// Mapping store operation errors
#[derive(Error, Debug)]
pub enum MappingError {
    /// Parent folder missing on disk
    #[error("Folder not found: {0}")]
    ParentNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a folder: {0}")]
    NotAFolder(PathBuf),

    /// File or folder missing on disk
    #[error("File or folder not found: {0}")]
    NotFound(PathBuf),

    /// Path has no row in the mapping table
    #[error("No tracked entry for path: {0}")]
    Untracked(PathBuf),

    /// Display name already used by a sibling
    #[error("An item named \"{0}\" already exists in this folder")]
    DuplicateName(String),

    /// Upload was not a Markdown file
    #[error("\"{0}\" is not a Markdown file")]
    NotMarkdown(String),

    /// Reorder referenced an id that is not a child of the parent
    #[error("Dragged or target item does not exist in this folder")]
    NotInParent,

    /// Reorder target index outside 0..sibling-count
    #[error("Target position {0} is out of range")]
    InvalidPosition(i32),

    /// OS denied a filesystem mutation
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for mapping operations
pub type Result<T> = std::result::Result<T, MappingError>;

impl MappingError {
    /// Attach a path to an IO error, promoting the interesting kinds to
    /// their dedicated variants.
    pub(crate) fn from_io(err: std::io::Error, path: &std::path::Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => MappingError::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => {
                MappingError::PermissionDenied(path.to_path_buf())
            }
            _ => MappingError::Io(err),
        }
    }
}
