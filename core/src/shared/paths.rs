//! Path normalization helpers shared by the mapping store and sessions.

use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

/// Lexically normalize a path: make it absolute against the current
/// directory and fold away `.` / `..` components without touching the
/// filesystem (the target may not exist yet).
pub fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// String form of a path as stored in the database.
pub fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Escape `%`, `_` and `\` in a string destined for a `LIKE .. ESCAPE '\'`
/// pattern, so literal underscores in folder names (`_book`) never act as
/// wildcards.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `LIKE` pattern matching every path strictly below `root`.
pub fn descendants_pattern(root: &Path) -> String {
    format!("{}{}%", escape_like(&path_str(root)), MAIN_SEPARATOR)
}

/// `LIKE` pattern matching `root` itself and every path below it.
pub fn subtree_pattern(root: &Path) -> String {
    format!("{}%", escape_like(&path_str(root)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_dot_components() {
        let normalized = normalize(Path::new("/data/websites/./site/../site"));
        assert_eq!(normalized, PathBuf::from("/data/websites/site"));
    }

    #[test]
    fn like_escaping_covers_wildcards() {
        assert_eq!(escape_like("my_site/100%"), "my\\_site/100\\%");
    }

    #[test]
    fn descendant_pattern_anchors_on_separator() {
        let pattern = descendants_pattern(Path::new("/data/my_site"));
        assert_eq!(pattern, "/data/my\\_site/%");
    }
}
