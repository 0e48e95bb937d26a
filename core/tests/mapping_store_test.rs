//! Mapping store invariants: dense positions, sibling-unique display
//! names, reorder shifts and prefix deletes.

mod helpers;

use std::path::Path;

use mb_core::mapping::{EntryNode, MappingError, MappingStore};
use pretty_assertions::assert_eq;
use tokio::fs;
use uuid::Uuid;

use helpers::test_store;

async fn project_root(dir: &Path) -> std::path::PathBuf {
    let root = dir.join("site");
    fs::create_dir_all(&root).await.unwrap();
    root
}

/// Display name plus stored position for every child, in tree order.
async fn layout(store: &MappingStore, parent: &Path) -> Vec<(String, i32)> {
    let mut out = Vec::new();
    for node in store.read_tree(parent).await.unwrap() {
        let row = store.entry_at(&node.file_path).await.unwrap().unwrap();
        out.push((node.name, row.position));
    }
    out
}

fn node_named<'a>(nodes: &'a [EntryNode], name: &str) -> &'a EntryNode {
    nodes
        .iter()
        .find(|node| node.name == name)
        .unwrap_or_else(|| panic!("no node named {name}"))
}

#[tokio::test]
async fn scenario_create_then_reorder_keeps_positions_dense() {
    let (dir, store) = test_store().await;
    let root = project_root(dir.path()).await;

    // docs/ arrives with its auto-created README.md at position 0
    let docs = store.create_folder(&root, "docs").await.unwrap();
    store.create_file(&docs.file_path, "a.md").await.unwrap();
    store.create_file(&docs.file_path, "b.md").await.unwrap();

    assert_eq!(
        layout(&store, &docs.file_path).await,
        vec![
            ("README.md".to_string(), 0),
            ("a.md".to_string(), 1),
            ("b.md".to_string(), 2),
        ]
    );

    // Drag b.md to the top
    let children = store.read_tree(&docs.file_path).await.unwrap();
    let b = node_named(&children, "b.md");
    let readme = node_named(&children, "README.md");
    store
        .reorder(&docs.file_path, b.id, readme.id, 0)
        .await
        .unwrap();

    assert_eq!(
        layout(&store, &docs.file_path).await,
        vec![
            ("b.md".to_string(), 0),
            ("README.md".to_string(), 1),
            ("a.md".to_string(), 2),
        ]
    );
}

#[tokio::test]
async fn duplicate_display_name_is_rejected_and_store_unchanged() {
    let (dir, store) = test_store().await;
    let root = project_root(dir.path()).await;

    store.create_file(&root, "Intro.md").await.unwrap();
    let err = store.create_file(&root, "Intro.md").await.unwrap_err();
    assert!(matches!(err, MappingError::DuplicateName(_)));

    let tree = store.read_tree(&root).await.unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].name, "Intro.md");
}

#[tokio::test]
async fn created_files_get_md_suffix_and_obfuscated_real_names() {
    let (dir, store) = test_store().await;
    let root = project_root(dir.path()).await;

    let node = store.create_file(&root, "notes").await.unwrap();
    assert_eq!(node.name, "notes.md");

    let row = store.entry_at(&node.file_path).await.unwrap().unwrap();
    assert_ne!(row.real_name, row.display_name);
    assert!(row.real_name.ends_with(".md"));
    assert!(fs::try_exists(&node.file_path).await.unwrap());
}

#[tokio::test]
async fn reorder_onto_itself_is_a_noop() {
    let (dir, store) = test_store().await;
    let root = project_root(dir.path()).await;

    store.create_file(&root, "a.md").await.unwrap();
    store.create_file(&root, "b.md").await.unwrap();
    let before = layout(&store, &root).await;

    let a = store.read_tree(&root).await.unwrap()[0].clone();
    store.reorder(&root, a.id, a.id, 1).await.unwrap();

    assert_eq!(layout(&store, &root).await, before);
}

#[tokio::test]
async fn reorder_with_unknown_id_fails() {
    let (dir, store) = test_store().await;
    let root = project_root(dir.path()).await;

    store.create_file(&root, "a.md").await.unwrap();
    let a = store.read_tree(&root).await.unwrap()[0].clone();

    let err = store
        .reorder(&root, a.id, Uuid::new_v4(), 0)
        .await
        .unwrap_err();
    assert!(matches!(err, MappingError::NotInParent));
}

#[tokio::test]
async fn deleting_a_file_compacts_positions_and_child_count() {
    let (dir, store) = test_store().await;
    let root = project_root(dir.path()).await;

    let docs = store.create_folder(&root, "docs").await.unwrap();
    let a = store.create_file(&docs.file_path, "a.md").await.unwrap();
    store.create_file(&docs.file_path, "b.md").await.unwrap();

    let folder_row = store.entry_at(&docs.file_path).await.unwrap().unwrap();
    assert_eq!(folder_row.child_count, 3);

    store.delete(&a.file_path, false).await.unwrap();

    assert_eq!(
        layout(&store, &docs.file_path).await,
        vec![("README.md".to_string(), 0), ("b.md".to_string(), 1)]
    );
    let folder_row = store.entry_at(&docs.file_path).await.unwrap().unwrap();
    assert_eq!(folder_row.child_count, 2);
    assert!(!fs::try_exists(&a.file_path).await.unwrap());
}

#[tokio::test]
async fn deleting_a_folder_removes_every_descendant_row() {
    let (dir, store) = test_store().await;
    let root = project_root(dir.path()).await;

    let docs = store.create_folder(&root, "docs").await.unwrap();
    let nested = store.create_folder(&docs.file_path, "nested").await.unwrap();
    store.create_file(&nested.file_path, "deep.md").await.unwrap();
    store.create_file(&root, "keep.md").await.unwrap();

    store.delete(&docs.file_path, true).await.unwrap();

    assert_eq!(store.tracked_count(&docs.file_path).await.unwrap(), 0);
    assert!(!fs::try_exists(&docs.file_path).await.unwrap());

    // Sibling after the folder slid down to position 0
    assert_eq!(
        layout(&store, &root).await,
        vec![("keep.md".to_string(), 0)]
    );
}

#[tokio::test]
async fn renaming_a_file_changes_only_the_display_name() {
    let (dir, store) = test_store().await;
    let root = project_root(dir.path()).await;

    let node = store.create_file(&root, "Draft.md").await.unwrap();
    let before = store.entry_at(&node.file_path).await.unwrap().unwrap();

    let renamed = store.rename(&node.file_path, "Final", false).await.unwrap();
    assert_eq!(renamed, "Final.md");

    let after = store.entry_at(&node.file_path).await.unwrap().unwrap();
    assert_eq!(after.display_name, "Final.md");
    assert_eq!(after.real_name, before.real_name);
    assert_eq!(after.file_path, before.file_path);
    assert!(fs::try_exists(&node.file_path).await.unwrap());
}

#[tokio::test]
async fn renaming_a_file_to_a_taken_name_conflicts() {
    let (dir, store) = test_store().await;
    let root = project_root(dir.path()).await;

    store.create_file(&root, "One.md").await.unwrap();
    let two = store.create_file(&root, "Two.md").await.unwrap();

    let err = store
        .rename(&two.file_path, "One.md", false)
        .await
        .unwrap_err();
    assert!(matches!(err, MappingError::DuplicateName(_)));
}

#[tokio::test]
async fn renaming_a_folder_rewrites_descendant_paths() {
    let (dir, store) = test_store().await;
    let root = project_root(dir.path()).await;

    let docs = store.create_folder(&root, "docs").await.unwrap();
    let file = store.create_file(&docs.file_path, "page.md").await.unwrap();

    store.rename(&docs.file_path, "guide", true).await.unwrap();

    let new_folder = root.join("guide");
    assert!(fs::try_exists(&new_folder).await.unwrap());
    assert!(!fs::try_exists(&docs.file_path).await.unwrap());

    // Descendant rows now live under the new prefix
    let file_name = file.file_path.file_name().unwrap();
    let moved = new_folder.join(file_name);
    let row = store.entry_at(&moved).await.unwrap().unwrap();
    assert_eq!(row.display_name, "page.md");
    assert_eq!(store.tracked_count(&docs.file_path).await.unwrap(), 0);
}

#[tokio::test]
async fn import_obfuscates_everything_but_structural_files() {
    let (dir, store) = test_store().await;
    let root = project_root(dir.path()).await;

    fs::write(root.join("README.md"), "# readme").await.unwrap();
    fs::write(root.join("SUMMARY.md"), "# Summary").await.unwrap();
    fs::write(root.join("chapter.md"), "# one").await.unwrap();
    fs::create_dir_all(root.join("part")).await.unwrap();
    fs::write(root.join("part/README.md"), "").await.unwrap();
    fs::write(root.join("part/two.md"), "# two").await.unwrap();
    fs::create_dir_all(root.join("_book")).await.unwrap();
    fs::write(root.join("_book/index.html"), "").await.unwrap();
    fs::write(root.join("notes.txt"), "skip me").await.unwrap();

    store.import_tree(&root).await.unwrap();

    let tree = store.read_tree(&root).await.unwrap();
    let names: Vec<&str> = tree.iter().map(|node| node.name.as_str()).collect();
    assert_eq!(names.len(), 4);
    assert!(!names.contains(&"_book"));
    assert!(!names.contains(&"notes.txt"));

    // Folders come first, then files, one dense sequence
    assert_eq!(tree[0].name, "part");
    let positions: Vec<i32> = {
        let mut out = Vec::new();
        for node in &tree {
            out.push(store.entry_at(&node.file_path).await.unwrap().unwrap().position);
        }
        out
    };
    assert_eq!(positions, vec![0, 1, 2, 3]);

    // Structural files keep their on-disk names
    assert!(fs::try_exists(root.join("README.md")).await.unwrap());
    assert!(fs::try_exists(root.join("SUMMARY.md")).await.unwrap());

    // chapter.md was renamed on disk but keeps its display name
    assert!(!fs::try_exists(root.join("chapter.md")).await.unwrap());
    let chapter = node_named(&tree, "chapter.md");
    assert!(fs::try_exists(&chapter.file_path).await.unwrap());

    // Folder child counts follow the import
    let part = store.entry_at(&root.join("part")).await.unwrap().unwrap();
    assert_eq!(part.child_count, 2);
}

#[tokio::test]
async fn upload_rejects_non_markdown() {
    let (dir, store) = test_store().await;
    let root = project_root(dir.path()).await;

    let err = store
        .upload_file(&root, "image.png", b"bytes")
        .await
        .unwrap_err();
    assert!(matches!(err, MappingError::NotMarkdown(_)));
}

#[tokio::test]
async fn uploaded_markdown_keeps_display_name() {
    let (dir, store) = test_store().await;
    let root = project_root(dir.path()).await;

    let node = store
        .upload_file(&root, "Guide.md", b"# guide")
        .await
        .unwrap();
    assert_eq!(node.name, "Guide.md");

    let row = store.entry_at(&node.file_path).await.unwrap().unwrap();
    assert_ne!(row.real_name, "Guide.md");
    let content = fs::read_to_string(&node.file_path).await.unwrap();
    assert_eq!(content, "# guide");
}

#[tokio::test]
async fn create_file_in_missing_folder_fails() {
    let (dir, store) = test_store().await;
    let missing = dir.path().join("nope");

    let err = store.create_file(&missing, "a.md").await.unwrap_err();
    assert!(matches!(err, MappingError::ParentNotFound(_)));
}
