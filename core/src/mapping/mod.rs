//! Path-and-display-name mapping store
//!
//! Decouples the name the editor shows from the name used on disk and
//! keeps a stable manual ordering for display. The `file_mapping` table
//! is the source of truth for structure; the filesystem is a
//! write-through mirror of it.

pub mod error;
pub mod store;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use error::MappingError;
pub use store::MappingStore;

use crate::infrastructure::database::entities::mapping_entry::EntryKind;

/// One node of the display-name tree handed to the editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryNode {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub file_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<EntryNode>>,
}

impl EntryNode {
    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }
}
