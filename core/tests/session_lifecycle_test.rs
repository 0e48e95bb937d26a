//! Session lifecycle: idempotent creation, rename prefix rewrite,
//! de-obfuscating delete and the export paths.

mod helpers;

use mb_core::build::BuildError;
use mb_core::session::SessionError;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio::fs;

use helpers::test_core_with_builder;

#[tokio::test]
async fn create_is_idempotent_by_folder_path() {
    let dir = TempDir::new().unwrap();
    let core = test_core_with_builder(&dir, "true").await;

    let first = core.sessions.create("site").await.unwrap();
    let second = core.sessions.create("site").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(core.sessions.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn create_imports_an_existing_tree() {
    let dir = TempDir::new().unwrap();
    let core = test_core_with_builder(&dir, "true").await;

    let folder = core.config.websites_dir().join("book");
    fs::create_dir_all(&folder).await.unwrap();
    fs::write(folder.join("README.md"), "# hello").await.unwrap();
    fs::write(folder.join("Intro.md"), "# intro").await.unwrap();

    let sid = core.sessions.create("book").await.unwrap();
    let view = core.sessions.get(&sid).await.unwrap();
    assert_eq!(view.structure.len(), 2);

    // Intro.md was obfuscated on disk but keeps its display name
    assert!(!fs::try_exists(folder.join("Intro.md")).await.unwrap());
    let intro = view
        .structure
        .iter()
        .find(|node| node.name == "Intro.md")
        .unwrap();
    assert!(fs::try_exists(&intro.file_path).await.unwrap());
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let dir = TempDir::new().unwrap();
    let core = test_core_with_builder(&dir, "true").await;

    let err = core.sessions.get("deadbeef").await.unwrap_err();
    assert!(matches!(err, SessionError::NotFound(_)));
}

#[tokio::test]
async fn invalid_project_names_are_rejected() {
    let dir = TempDir::new().unwrap();
    let core = test_core_with_builder(&dir, "true").await;

    for name in ["", "  ", "a/b", "..\\up", ".."] {
        let err = core.sessions.create(name).await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidName(_)), "{name:?}");
    }
}

#[tokio::test]
async fn failed_init_cleans_up_the_new_folder() {
    let dir = TempDir::new().unwrap();
    let core = test_core_with_builder(&dir, "false").await;

    let err = core.sessions.create("doomed").await.unwrap_err();
    assert!(matches!(err, SessionError::Tool(BuildError::Failed { .. })));

    let folder = core.config.websites_dir().join("doomed");
    assert!(!fs::try_exists(&folder).await.unwrap());
    assert!(core.sessions.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn rename_moves_the_folder_and_the_mapping() {
    let dir = TempDir::new().unwrap();
    let core = test_core_with_builder(&dir, "true").await;

    let folder = core.config.websites_dir().join("old-name");
    fs::create_dir_all(&folder).await.unwrap();
    fs::write(folder.join("README.md"), "").await.unwrap();

    let sid = core.sessions.create("old-name").await.unwrap();
    let new_path = core.sessions.rename(&sid, "new-name").await.unwrap();

    assert_eq!(new_path, core.config.websites_dir().join("new-name"));
    assert!(fs::try_exists(&new_path).await.unwrap());
    assert!(!fs::try_exists(&folder).await.unwrap());

    let view = core.sessions.get(&sid).await.unwrap();
    assert_eq!(view.folder_path, new_path);
    for node in &view.structure {
        assert!(node.file_path.starts_with(&new_path));
    }
}

#[tokio::test]
async fn rename_to_an_existing_folder_conflicts() {
    let dir = TempDir::new().unwrap();
    let core = test_core_with_builder(&dir, "true").await;

    let sid = core.sessions.create("one").await.unwrap();
    core.sessions.create("two").await.unwrap();

    let err = core.sessions.rename(&sid, "two").await.unwrap_err();
    assert!(matches!(err, SessionError::NameTaken(_)));
}

#[tokio::test]
async fn delete_restores_display_names_and_keeps_content() {
    let dir = TempDir::new().unwrap();
    let core = test_core_with_builder(&dir, "true").await;

    let folder = core.config.websites_dir().join("book");
    fs::create_dir_all(&folder).await.unwrap();
    fs::write(folder.join("Intro.md"), "# intro").await.unwrap();

    let sid = core.sessions.create("book").await.unwrap();
    assert!(!fs::try_exists(folder.join("Intro.md")).await.unwrap());

    core.sessions.delete(&sid).await.unwrap();

    // The content folder survives with human-readable names again
    assert!(fs::try_exists(&folder).await.unwrap());
    assert!(fs::try_exists(folder.join("Intro.md")).await.unwrap());
    assert_eq!(core.mapping.tracked_count(&folder).await.unwrap(), 0);
    assert!(matches!(
        core.sessions.get(&sid).await.unwrap_err(),
        SessionError::NotFound(_)
    ));
}

#[tokio::test]
async fn export_book_relocates_build_output() {
    let dir = TempDir::new().unwrap();
    let core = test_core_with_builder(&dir, "true").await;

    let sid = core.sessions.create("site").await.unwrap();
    let folder = core.config.websites_dir().join("site");

    // The stand-in builder exits 0 without producing output; stage it
    fs::create_dir_all(folder.join("_book")).await.unwrap();
    fs::write(folder.join("_book/index.html"), "<html></html>")
        .await
        .unwrap();

    let export = core.sessions.export_book(&sid).await.unwrap();
    assert_eq!(
        export.book_path,
        core.config.userdb_dir().join(&sid).join("_book")
    );
    assert!(fs::try_exists(export.book_path.join("index.html"))
        .await
        .unwrap());
    assert!(!fs::try_exists(folder.join("_book")).await.unwrap());
}

#[tokio::test]
async fn export_book_without_output_fails() {
    let dir = TempDir::new().unwrap();
    let core = test_core_with_builder(&dir, "true").await;

    let sid = core.sessions.create("site").await.unwrap();
    let err = core.sessions.export_book(&sid).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Tool(BuildError::MissingOutput(_))
    ));
}

#[tokio::test]
async fn export_summary_links_real_paths_under_display_labels() {
    let dir = TempDir::new().unwrap();
    let core = test_core_with_builder(&dir, "true").await;

    let folder = core.config.websites_dir().join("site");
    fs::create_dir_all(&folder).await.unwrap();
    fs::write(folder.join("README.md"), "").await.unwrap();
    fs::write(folder.join("Chapter One.md"), "").await.unwrap();

    let sid = core.sessions.create("site").await.unwrap();
    let summary_path = core.sessions.export_summary(&sid).await.unwrap();
    assert_eq!(summary_path, folder.join("SUMMARY.md"));

    let content = fs::read_to_string(&summary_path).await.unwrap();
    assert!(content.starts_with("# Summary"));
    assert!(content.contains("* [README](README.md)"));

    // The chapter line shows the display label but links the real name
    let view = core.sessions.get(&sid).await.unwrap();
    let chapter = view
        .structure
        .iter()
        .find(|node| node.name == "Chapter One.md")
        .unwrap();
    let real_name = chapter.file_path.file_name().unwrap().to_string_lossy();
    assert!(content.contains(&format!("* [Chapter One]({real_name})")));
}
