//! Session-specific error types

use std::path::PathBuf;

use sea_orm::DbErr;
use thiserror::Error;

use crate::build::BuildError;
use crate::mapping::MappingError;

/// Session operation errors
#[derive(Error, Debug)]
pub enum SessionError {
    /// Unknown session token
    #[error("Session not found: {0}")]
    NotFound(String),

    /// Tracked project folder no longer exists on disk
    #[error("Project folder not found: {0}")]
    FolderMissing(PathBuf),

    /// Target name already used by another folder
    #[error("A folder named \"{0}\" already exists")]
    NameTaken(String),

    /// Empty or path-escaping project name
    #[error("Invalid project name: \"{0}\"")]
    InvalidName(String),

    /// OS denied a filesystem mutation
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// External book-builder failure
    #[error(transparent)]
    Tool(#[from] BuildError),

    /// Mapping store failure
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

impl SessionError {
    pub(crate) fn from_io(err: std::io::Error, path: &std::path::Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                SessionError::PermissionDenied(path.to_path_buf())
            }
            _ => SessionError::Io(err),
        }
    }
}
