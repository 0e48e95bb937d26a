//! Mapping store operations
//!
//! Every mutation is one transaction: sibling positions, child counts and
//! the mutated rows move together or not at all.

use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbBackend, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Statement, TransactionTrait,
};
use sea_orm::sea_query::{Expr, LikeExpr};
use tokio::fs;
use tracing::info;
use uuid::Uuid;

use crate::infrastructure::database::entities::mapping_entry::{self, EntryKind};
use crate::shared::{ids, paths};

use super::error::{MappingError, Result};
use super::EntryNode;

/// Store managing the `file_mapping` table and its filesystem mirror.
#[derive(Clone)]
pub struct MappingStore {
    db: DatabaseConnection,
}

impl MappingStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create an empty Markdown file under `parent` with an obfuscated
    /// on-disk name, appended at the end of the sibling ordering.
    pub async fn create_file(&self, parent: &Path, display_name: &str) -> Result<EntryNode> {
        let parent = paths::normalize(parent);
        ensure_directory(&parent).await?;

        let display_name = ensure_md_suffix(display_name);
        let real_name = ids::obfuscated_md_name();
        let file_path = parent.join(&real_name);

        let txn = self.db.begin().await?;
        ensure_display_name_free(&txn, &parent, &display_name).await?;

        fs::write(&file_path, "")
            .await
            .map_err(|e| MappingError::from_io(e, &file_path))?;

        let position = sibling_count(&txn, &parent).await?;
        let row = insert_entry(
            &txn,
            NewEntry {
                real_name,
                display_name,
                file_path: &file_path,
                parent_path: &parent,
                position,
                child_count: 0,
                kind: EntryKind::File,
            },
        )
        .await?;
        bump_child_count(&txn, &parent, 1).await?;
        txn.commit().await?;

        Ok(file_node(&row))
    }

    /// Create a folder under `parent`. Folders keep their display name on
    /// disk; an empty `README.md` is seeded inside at position 0.
    pub async fn create_folder(&self, parent: &Path, folder_name: &str) -> Result<EntryNode> {
        let parent = paths::normalize(parent);
        ensure_directory(&parent).await?;

        let folder_path = parent.join(folder_name);
        if fs::try_exists(&folder_path).await? {
            return Err(MappingError::DuplicateName(folder_name.to_string()));
        }

        let txn = self.db.begin().await?;
        ensure_display_name_free(&txn, &parent, folder_name).await?;

        fs::create_dir_all(&folder_path)
            .await
            .map_err(|e| MappingError::from_io(e, &folder_path))?;
        let readme_path = folder_path.join("README.md");
        fs::write(&readme_path, "")
            .await
            .map_err(|e| MappingError::from_io(e, &readme_path))?;

        let position = sibling_count(&txn, &parent).await?;
        let folder_row = insert_entry(
            &txn,
            NewEntry {
                real_name: folder_name.to_string(),
                display_name: folder_name.to_string(),
                file_path: &folder_path,
                parent_path: &parent,
                position,
                child_count: 1,
                kind: EntryKind::Folder,
            },
        )
        .await?;
        let readme_row = insert_entry(
            &txn,
            NewEntry {
                real_name: "README.md".to_string(),
                display_name: "README.md".to_string(),
                file_path: &readme_path,
                parent_path: &folder_path,
                position: 0,
                child_count: 0,
                kind: EntryKind::File,
            },
        )
        .await?;
        bump_child_count(&txn, &parent, 1).await?;
        txn.commit().await?;

        let mut node = folder_node(&folder_row);
        node.children = Some(vec![file_node(&readme_row)]);
        Ok(node)
    }

    /// Store uploaded Markdown bytes under `parent`, keeping the original
    /// name as the display name and an obfuscated name on disk.
    pub async fn upload_file(
        &self,
        parent: &Path,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<EntryNode> {
        if !original_name.ends_with(".md") {
            return Err(MappingError::NotMarkdown(original_name.to_string()));
        }

        let parent = paths::normalize(parent);
        ensure_directory(&parent).await?;

        let real_name = ids::obfuscated_md_name();
        let file_path = parent.join(&real_name);

        let txn = self.db.begin().await?;
        ensure_display_name_free(&txn, &parent, original_name).await?;

        fs::write(&file_path, bytes)
            .await
            .map_err(|e| MappingError::from_io(e, &file_path))?;

        let position = sibling_count(&txn, &parent).await?;
        let row = insert_entry(
            &txn,
            NewEntry {
                real_name,
                display_name: original_name.to_string(),
                file_path: &file_path,
                parent_path: &parent,
                position,
                child_count: 0,
                kind: EntryKind::File,
            },
        )
        .await?;
        bump_child_count(&txn, &parent, 1).await?;
        txn.commit().await?;

        Ok(file_node(&row))
    }

    /// Rename an entry. Files change display name only; folders are
    /// renamed on disk and every descendant row has its path prefix
    /// rewritten in the same transaction.
    pub async fn rename(&self, path: &Path, new_name: &str, is_folder: bool) -> Result<String> {
        let path = paths::normalize(path);
        if !fs::try_exists(&path).await? {
            return Err(MappingError::NotFound(path));
        }

        if is_folder {
            self.rename_folder(&path, new_name).await
        } else {
            self.rename_file(&path, new_name).await
        }
    }

    async fn rename_file(&self, path: &Path, new_name: &str) -> Result<String> {
        let new_display = ensure_md_suffix(new_name);

        let txn = self.db.begin().await?;
        let row = entry_by_path(&txn, path)
            .await?
            .ok_or_else(|| MappingError::Untracked(path.to_path_buf()))?;

        let taken = mapping_entry::Entity::find()
            .filter(mapping_entry::Column::ParentPath.eq(row.parent_path.clone()))
            .filter(mapping_entry::Column::DisplayName.eq(new_display.clone()))
            .filter(mapping_entry::Column::Uuid.ne(row.uuid))
            .count(&txn)
            .await?;
        if taken > 0 {
            return Err(MappingError::DuplicateName(new_display));
        }

        let mut active: mapping_entry::ActiveModel = row.into();
        active.display_name = Set(new_display.clone());
        active.update(&txn).await?;
        txn.commit().await?;

        Ok(new_display)
    }

    async fn rename_folder(&self, path: &Path, new_name: &str) -> Result<String> {
        let parent = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));
        let new_path = parent.join(new_name);
        if fs::try_exists(&new_path).await? {
            return Err(MappingError::DuplicateName(new_name.to_string()));
        }

        let txn = self.db.begin().await?;
        let row = entry_by_path(&txn, path)
            .await?
            .ok_or_else(|| MappingError::Untracked(path.to_path_buf()))?;

        fs::rename(path, &new_path)
            .await
            .map_err(|e| MappingError::from_io(e, path))?;

        let mut active: mapping_entry::ActiveModel = row.into();
        active.real_name = Set(new_name.to_string());
        active.display_name = Set(new_name.to_string());
        active.file_path = Set(paths::path_str(&new_path));
        active.update(&txn).await?;

        rewrite_path_prefix(&txn, path, &new_path).await?;
        txn.commit().await?;

        info!("Renamed folder {} -> {}", path.display(), new_path.display());
        Ok(new_name.to_string())
    }

    /// Move `dragged_id` to `target_index` among the children of `parent`,
    /// shifting every entry strictly between the old and new position by
    /// one toward the vacated slot. A no-op when dragged equals target.
    pub async fn reorder(
        &self,
        parent: &Path,
        dragged_id: Uuid,
        target_id: Uuid,
        target_index: i32,
    ) -> Result<()> {
        let parent = paths::normalize(parent);

        let txn = self.db.begin().await?;
        let siblings = mapping_entry::Entity::find()
            .filter(mapping_entry::Column::ParentPath.eq(paths::path_str(&parent)))
            .order_by_asc(mapping_entry::Column::Position)
            .all(&txn)
            .await?;

        let dragged = siblings.iter().find(|row| row.uuid == dragged_id);
        let target = siblings.iter().find(|row| row.uuid == target_id);
        let (dragged, _target) = match (dragged, target) {
            (Some(d), Some(t)) => (d, t),
            _ => return Err(MappingError::NotInParent),
        };

        if dragged_id == target_id {
            return Ok(());
        }
        if target_index < 0 || target_index >= siblings.len() as i32 {
            return Err(MappingError::InvalidPosition(target_index));
        }

        let old_position = dragged.position;
        let new_position = target_index;
        if old_position == new_position {
            return Ok(());
        }

        let parent_str = paths::path_str(&parent);
        if old_position < new_position {
            // Moving down: everything in between slides up by one
            mapping_entry::Entity::update_many()
                .col_expr(
                    mapping_entry::Column::Position,
                    Expr::col(mapping_entry::Column::Position).sub(1),
                )
                .filter(mapping_entry::Column::ParentPath.eq(parent_str.clone()))
                .filter(mapping_entry::Column::Position.gt(old_position))
                .filter(mapping_entry::Column::Position.lte(new_position))
                .filter(mapping_entry::Column::Uuid.ne(dragged_id))
                .exec(&txn)
                .await?;
        } else {
            // Moving up: everything in between slides down by one
            mapping_entry::Entity::update_many()
                .col_expr(
                    mapping_entry::Column::Position,
                    Expr::col(mapping_entry::Column::Position).add(1),
                )
                .filter(mapping_entry::Column::ParentPath.eq(parent_str.clone()))
                .filter(mapping_entry::Column::Position.gte(new_position))
                .filter(mapping_entry::Column::Position.lt(old_position))
                .filter(mapping_entry::Column::Uuid.ne(dragged_id))
                .exec(&txn)
                .await?;
        }

        mapping_entry::Entity::update_many()
            .col_expr(mapping_entry::Column::Position, Expr::value(new_position))
            .filter(mapping_entry::Column::Uuid.eq(dragged_id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        Ok(())
    }

    /// Delete an entry from disk and the mapping table, compacting the
    /// sibling positions above it and the parent's child count.
    pub async fn delete(&self, path: &Path, is_folder: bool) -> Result<String> {
        let path = paths::normalize(path);
        if !fs::try_exists(&path).await? {
            return Err(MappingError::NotFound(path));
        }

        let txn = self.db.begin().await?;
        let row = entry_by_path(&txn, &path)
            .await?
            .ok_or_else(|| MappingError::Untracked(path.clone()))?;
        let parent = PathBuf::from(&row.parent_path);
        let removed_position = row.position;
        let display_name = row.display_name.clone();

        if is_folder {
            fs::remove_dir_all(&path)
                .await
                .map_err(|e| MappingError::from_io(e, &path))?;

            // The folder row plus every descendant row under its path
            mapping_entry::Entity::delete_many()
                .filter(
                    Expr::col(mapping_entry::Column::FilePath)
                        .like(LikeExpr::new(paths::subtree_pattern(&path)).escape('\\')),
                )
                .exec(&txn)
                .await?;
        } else {
            fs::remove_file(&path)
                .await
                .map_err(|e| MappingError::from_io(e, &path))?;

            mapping_entry::Entity::delete_many()
                .filter(mapping_entry::Column::Uuid.eq(row.uuid))
                .exec(&txn)
                .await?;
        }

        bump_child_count(&txn, &parent, -1).await?;
        mapping_entry::Entity::update_many()
            .col_expr(
                mapping_entry::Column::Position,
                Expr::col(mapping_entry::Column::Position).sub(1),
            )
            .filter(mapping_entry::Column::ParentPath.eq(paths::path_str(&parent)))
            .filter(mapping_entry::Column::Position.gt(removed_position))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        Ok(display_name)
    }

    /// Import an existing folder tree: wipe any prior rows under `root`,
    /// then walk it depth-first (folders before files, directory-listing
    /// order), obfuscating every file except the structural ones.
    pub async fn import_tree(&self, root: &Path) -> Result<()> {
        let root = paths::normalize(root);
        ensure_directory(&root).await?;

        let txn = self.db.begin().await?;
        mapping_entry::Entity::delete_many()
            .filter(
                Expr::col(mapping_entry::Column::FilePath)
                    .like(LikeExpr::new(paths::subtree_pattern(&root)).escape('\\')),
            )
            .exec(&txn)
            .await?;

        import_dir(&txn, root.clone()).await?;
        txn.commit().await?;

        info!("Imported folder tree at {}", root.display());
        Ok(())
    }

    /// Nested display-name view of a folder, ordered by position.
    pub async fn read_tree(&self, root: &Path) -> Result<Vec<EntryNode>> {
        let root = paths::normalize(root);
        collect_children(&self.db, root).await
    }

    /// Look up a single tracked entry by its absolute path.
    pub async fn entry_at(&self, path: &Path) -> Result<Option<mapping_entry::Model>> {
        let path = paths::normalize(path);
        entry_by_path(&self.db, &path).await
    }

    /// All tracked files below `root` (used for de-obfuscation on session
    /// delete).
    pub async fn files_under(&self, root: &Path) -> Result<Vec<mapping_entry::Model>> {
        let root = paths::normalize(root);
        Ok(mapping_entry::Entity::find()
            .filter(
                Expr::col(mapping_entry::Column::FilePath)
                    .like(LikeExpr::new(paths::subtree_pattern(&root)).escape('\\')),
            )
            .filter(mapping_entry::Column::Kind.eq(EntryKind::File.as_str()))
            .all(&self.db)
            .await?)
    }

    /// Remove every row at or below `root` (the filesystem is untouched).
    pub async fn forget_tree<C: ConnectionTrait>(&self, conn: &C, root: &Path) -> Result<u64> {
        let root = paths::normalize(root);
        let res = mapping_entry::Entity::delete_many()
            .filter(
                Expr::col(mapping_entry::Column::FilePath)
                    .like(LikeExpr::new(paths::subtree_pattern(&root)).escape('\\')),
            )
            .exec(conn)
            .await?;
        Ok(res.rows_affected)
    }

    /// Number of rows tracked directly or transitively under `root`.
    pub async fn tracked_count(&self, root: &Path) -> Result<u64> {
        let root = paths::normalize(root);
        Ok(mapping_entry::Entity::find()
            .filter(
                Expr::col(mapping_entry::Column::FilePath)
                    .like(LikeExpr::new(paths::subtree_pattern(&root)).escape('\\')),
            )
            .count(&self.db)
            .await?)
    }
}

/// Rewrite the `file_path` / `parent_path` prefix of every row under
/// `old_root` to point below `new_root`. Shared with the session rename
/// path.
pub(crate) async fn rewrite_path_prefix(
    txn: &DatabaseTransaction,
    old_root: &Path,
    new_root: &Path,
) -> std::result::Result<(), sea_orm::DbErr> {
    let old = paths::path_str(old_root);
    let new = paths::path_str(new_root);
    let pattern = paths::subtree_pattern(old_root);

    txn.execute(Statement::from_sql_and_values(
        DbBackend::Sqlite,
        r"UPDATE file_mapping SET file_path = REPLACE(file_path, ?, ?) WHERE file_path LIKE ? ESCAPE '\'",
        [old.clone().into(), new.clone().into(), pattern.clone().into()],
    ))
    .await?;
    txn.execute(Statement::from_sql_and_values(
        DbBackend::Sqlite,
        r"UPDATE file_mapping SET parent_path = REPLACE(parent_path, ?, ?) WHERE parent_path LIKE ? ESCAPE '\'",
        [old.into(), new.into(), pattern.into()],
    ))
    .await?;
    Ok(())
}

struct NewEntry<'a> {
    real_name: String,
    display_name: String,
    file_path: &'a Path,
    parent_path: &'a Path,
    position: i32,
    child_count: i32,
    kind: EntryKind,
}

async fn insert_entry<C: ConnectionTrait>(
    conn: &C,
    entry: NewEntry<'_>,
) -> Result<mapping_entry::Model> {
    let row = mapping_entry::ActiveModel {
        uuid: Set(Uuid::new_v4()),
        real_name: Set(entry.real_name),
        display_name: Set(entry.display_name),
        file_path: Set(paths::path_str(entry.file_path)),
        parent_path: Set(paths::path_str(entry.parent_path)),
        position: Set(entry.position),
        child_count: Set(entry.child_count),
        kind: Set(entry.kind.as_str().to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(row)
}

async fn entry_by_path<C: ConnectionTrait>(
    conn: &C,
    path: &Path,
) -> Result<Option<mapping_entry::Model>> {
    Ok(mapping_entry::Entity::find()
        .filter(mapping_entry::Column::FilePath.eq(paths::path_str(path)))
        .one(conn)
        .await?)
}

async fn sibling_count<C: ConnectionTrait>(conn: &C, parent: &Path) -> Result<i32> {
    let count = mapping_entry::Entity::find()
        .filter(mapping_entry::Column::ParentPath.eq(paths::path_str(parent)))
        .count(conn)
        .await?;
    Ok(count as i32)
}

async fn ensure_display_name_free<C: ConnectionTrait>(
    conn: &C,
    parent: &Path,
    display_name: &str,
) -> Result<()> {
    let count = mapping_entry::Entity::find()
        .filter(mapping_entry::Column::ParentPath.eq(paths::path_str(parent)))
        .filter(mapping_entry::Column::DisplayName.eq(display_name))
        .count(conn)
        .await?;
    if count > 0 {
        return Err(MappingError::DuplicateName(display_name.to_string()));
    }
    Ok(())
}

/// Bump the `child_count` of the folder row at `folder`, if one exists
/// (the project root is not tracked, so this is a no-op there).
async fn bump_child_count<C: ConnectionTrait>(conn: &C, folder: &Path, delta: i32) -> Result<()> {
    mapping_entry::Entity::update_many()
        .col_expr(
            mapping_entry::Column::ChildCount,
            Expr::col(mapping_entry::Column::ChildCount).add(delta),
        )
        .filter(mapping_entry::Column::FilePath.eq(paths::path_str(folder)))
        .exec(conn)
        .await?;
    Ok(())
}

async fn ensure_directory(path: &Path) -> Result<()> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(MappingError::NotAFolder(path.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(MappingError::ParentNotFound(path.to_path_buf()))
        }
        Err(e) => Err(MappingError::from_io(e, path)),
    }
}

fn ensure_md_suffix(name: &str) -> String {
    if name.ends_with(".md") {
        name.to_string()
    } else {
        format!("{name}.md")
    }
}

fn file_node(row: &mapping_entry::Model) -> EntryNode {
    EntryNode {
        id: row.uuid,
        name: row.display_name.clone(),
        kind: EntryKind::File,
        file_path: PathBuf::from(&row.file_path),
        children: None,
    }
}

fn folder_node(row: &mapping_entry::Model) -> EntryNode {
    EntryNode {
        id: row.uuid,
        name: row.display_name.clone(),
        kind: EntryKind::Folder,
        file_path: PathBuf::from(&row.file_path),
        children: Some(Vec::new()),
    }
}

fn collect_children<C: ConnectionTrait>(
    conn: &C,
    parent: PathBuf,
) -> BoxFuture<'_, Result<Vec<EntryNode>>> {
    Box::pin(async move {
        let rows = mapping_entry::Entity::find()
            .filter(mapping_entry::Column::ParentPath.eq(paths::path_str(&parent)))
            .order_by_asc(mapping_entry::Column::Position)
            .all(conn)
            .await?;

        let mut nodes = Vec::with_capacity(rows.len());
        for row in rows {
            let path = PathBuf::from(&row.file_path);
            let node = match row.entry_kind() {
                EntryKind::Folder => {
                    let mut node = folder_node(&row);
                    node.children = Some(collect_children(conn, path).await?);
                    node
                }
                EntryKind::File => file_node(&row),
            };
            nodes.push(node);
        }
        Ok(nodes)
    })
}

/// Recursive import worker: inserts folder rows before file rows, both in
/// directory-listing order, assigning one dense position sequence per
/// directory.
fn import_dir(txn: &DatabaseTransaction, dir: PathBuf) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let mut folders = Vec::new();
        let mut files = Vec::new();

        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| MappingError::from_io(e, &dir))?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == "_book" || name == "node_modules" {
                continue;
            }
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                folders.push(name);
            } else if file_type.is_file() && name.ends_with(".md") {
                files.push(name);
            }
        }

        let mut position = 0;
        for name in folders {
            let folder_path = dir.join(&name);
            insert_entry(
                txn,
                NewEntry {
                    real_name: name.clone(),
                    display_name: name,
                    file_path: &folder_path,
                    parent_path: &dir,
                    position,
                    child_count: 0,
                    kind: EntryKind::Folder,
                },
            )
            .await?;
            position += 1;
            import_dir(txn, folder_path).await?;
        }

        for name in files {
            let (real_name, display_name) = if ids::is_structural(&name) {
                (name.clone(), name.clone())
            } else {
                (ids::obfuscated_md_name(), name.clone())
            };

            let mut file_path = dir.join(&name);
            if real_name != name {
                let obfuscated = dir.join(&real_name);
                fs::rename(&file_path, &obfuscated)
                    .await
                    .map_err(|e| MappingError::from_io(e, &file_path))?;
                file_path = obfuscated;
            }

            insert_entry(
                txn,
                NewEntry {
                    real_name,
                    display_name,
                    file_path: &file_path,
                    parent_path: &dir,
                    position,
                    child_count: 0,
                    kind: EntryKind::File,
                },
            )
            .await?;
            position += 1;
        }

        // Record this directory's child count on its own row; the project
        // root has no row, so the update is a no-op there.
        mapping_entry::Entity::update_many()
            .col_expr(mapping_entry::Column::ChildCount, Expr::value(position))
            .filter(mapping_entry::Column::FilePath.eq(paths::path_str(&dir)))
            .exec(txn)
            .await?;

        Ok(())
    })
}
