//! SUMMARY.md generation from the mapping tree
//!
//! The table of contents links real on-disk paths (which may be
//! obfuscated) under display-name labels. The root `README.md` leads,
//! folders link through their own `README.md` when they have one, and
//! `README.md` / `SUMMARY.md` entries never appear as plain items.

use std::path::Path;

use crate::mapping::EntryNode;

/// Render the SUMMARY.md content for a project tree rooted at `root`.
pub fn generate_summary(root: &Path, tree: &[EntryNode]) -> String {
    let mut lines = vec!["# Summary".to_string()];

    if let Some(readme) = tree
        .iter()
        .find(|node| !node.is_folder() && node.name == "README.md")
    {
        if let Some(link) = relative_link(root, &readme.file_path) {
            lines.push(format!("* [{}]({})", label(&readme.name), link));
        }
    }

    traverse(root, tree, 0, &mut lines);
    lines.join("\n")
}

fn traverse(root: &Path, items: &[EntryNode], level: usize, lines: &mut Vec<String>) {
    for item in items {
        if item.is_folder() {
            if item.name == "_book" || item.name == "node_modules" {
                continue;
            }

            let indent = " ".repeat(2 * level);
            let children = item.children.as_deref().unwrap_or(&[]);
            let readme_link = children
                .iter()
                .find(|child| !child.is_folder() && child.name == "README.md")
                .and_then(|readme| relative_link(root, &readme.file_path));

            match readme_link {
                Some(link) => lines.push(format!("{indent}* [{}]({})", item.name, link)),
                None => lines.push(format!("{indent}* {}", item.name)),
            }

            traverse(root, children, level + 1, lines);
        } else {
            // README.md entries only surface as their folder's link
            if item.name == "README.md" || item.name == "SUMMARY.md" || !item.name.ends_with(".md")
            {
                continue;
            }

            let indent = " ".repeat(2 * level);
            if let Some(link) = relative_link(root, &item.file_path) {
                lines.push(format!("{indent}* [{}]({})", label(&item.name), link));
            }
        }
    }
}

/// Display label: the file name without its `.md` suffix.
fn label(name: &str) -> &str {
    name.strip_suffix(".md").unwrap_or(name)
}

/// Forward-slash relative path from the project root to a real file.
fn relative_link(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    Some(
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::entities::mapping_entry::EntryKind;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn file(root: &str, name: &str, real: &str) -> EntryNode {
        EntryNode {
            id: Uuid::new_v4(),
            name: name.to_string(),
            kind: EntryKind::File,
            file_path: PathBuf::from(root).join(real),
            children: None,
        }
    }

    fn folder(root: &str, name: &str, children: Vec<EntryNode>) -> EntryNode {
        EntryNode {
            id: Uuid::new_v4(),
            name: name.to_string(),
            kind: EntryKind::Folder,
            file_path: PathBuf::from(root).join(name),
            children: Some(children),
        }
    }

    #[test]
    fn root_readme_leads_and_obfuscated_links_are_real() {
        let root = "/data/websites/site";
        let tree = vec![
            file(root, "README.md", "README.md"),
            file(root, "Intro.md", "0a1b2c3d4e5f60718293a4b5c6d7e8f9.md"),
        ];

        let summary = generate_summary(Path::new(root), &tree);
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines[0], "# Summary");
        assert_eq!(lines[1], "* [README](README.md)");
        assert_eq!(lines[2], "* [Intro](0a1b2c3d4e5f60718293a4b5c6d7e8f9.md)");
    }

    #[test]
    fn folders_link_through_their_readme() {
        let root = "/site";
        let chapter = folder(
            root,
            "chapter",
            vec![
                file("/site/chapter", "README.md", "README.md"),
                file("/site/chapter", "First.md", "aa.md"),
            ],
        );
        let tree = vec![chapter];

        let summary = generate_summary(Path::new(root), &tree);
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines[1], "* [chapter](chapter/README.md)");
        assert_eq!(lines[2], "  * [First](chapter/aa.md)");
    }

    #[test]
    fn folders_without_readme_render_as_plain_items() {
        let root = "/site";
        let tree = vec![folder(root, "notes", vec![file("/site/notes", "A.md", "bb.md")])];

        let summary = generate_summary(Path::new(root), &tree);
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines[1], "* notes");
        assert_eq!(lines[2], "  * [A](notes/bb.md)");
    }

    #[test]
    fn summary_and_build_output_are_skipped() {
        let root = "/site";
        let tree = vec![
            file(root, "SUMMARY.md", "SUMMARY.md"),
            folder(root, "_book", vec![]),
        ];

        let summary = generate_summary(Path::new(root), &tree);
        assert_eq!(summary, "# Summary");
    }
}
