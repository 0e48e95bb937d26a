//! Identifier generation

use uuid::Uuid;

/// Files whose on-disk name is structurally significant to the book
/// builder and therefore never obfuscated.
pub const STRUCTURAL_FILES: [&str; 2] = ["README.md", "SUMMARY.md"];

/// Short token used as a session identifier (8 hex chars of a v4 UUID).
pub fn short_token() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Collision-free obfuscated on-disk name for a Markdown file.
pub fn obfuscated_md_name() -> String {
    format!("{}.md", Uuid::new_v4().simple())
}

/// Whether a file name must keep its real name on disk.
pub fn is_structural(name: &str) -> bool {
    STRUCTURAL_FILES.contains(&name)
}
