//! File mapping entity
//!
//! One row per tracked file or folder. `real_name` is the on-disk name,
//! `display_name` the one the editor shows; `position` is a dense 0..n-1
//! ordering among the siblings of `parent_path`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "file_mapping")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub uuid: Uuid,
    pub real_name: String,
    pub display_name: String,
    pub file_path: String,
    pub parent_path: String,
    pub position: i32,
    pub child_count: i32,
    pub kind: String, // "file" or "folder"
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Entry kind stored in the `kind` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Folder,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Folder => "folder",
        }
    }
}

impl Model {
    pub fn entry_kind(&self) -> EntryKind {
        if self.kind == "folder" {
            EntryKind::Folder
        } else {
            EntryKind::File
        }
    }
}
