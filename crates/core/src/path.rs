//! Path parsing and resolution
//!
//! Browse paths have the format: container[/object/path]. Object paths are
//! relative to their container, use `/` as the only separator, and name
//! directories without a trailing separator.

use crate::error::{Error, Result};

/// Path separator used by every backend
pub const SEP: char = '/';

/// The container root directory
pub const ROOT: &str = "";

/// Special characters allowed in object basenames besides ASCII alphanumerics
pub const SAFE_SPECIAL_CHARACTERS: &str = "!-_.*'() ";

/// A parsed browse path pointing at a container location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowsePath {
    /// Container name
    pub container: String,
    /// Object path within the container (empty for the container root)
    pub path: String,
}

impl BrowsePath {
    /// Create a new BrowsePath, stripping surrounding separators from the object path
    pub fn new(container: impl Into<String>, path: impl AsRef<str>) -> Self {
        Self {
            container: container.into(),
            path: path.as_ref().trim_matches(SEP).to_string(),
        }
    }

    /// Whether this path addresses the container root
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Get the full path as a string (container/path)
    pub fn to_full_path(&self) -> String {
        path_join(&self.container, &self.path)
    }

    /// Get the parent path (one level up)
    pub fn parent(&self) -> Option<Self> {
        if self.path.is_empty() {
            return None;
        }
        let parent = match self.path.rfind(SEP) {
            Some(pos) => &self.path[..pos],
            None => ROOT,
        };
        Some(Self::new(self.container.clone(), parent))
    }
}

impl std::fmt::Display for BrowsePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_full_path())
    }
}

/// Parse a path string of the form container[/object/path]
pub fn parse_path(path: &str) -> Result<BrowsePath> {
    let trimmed = path.trim_matches(SEP);
    if trimmed.is_empty() {
        return Err(Error::InvalidName("Path cannot be empty".into()));
    }

    match trimmed.split_once(SEP) {
        Some((container, rest)) => Ok(BrowsePath::new(container, rest)),
        None => Ok(BrowsePath::new(trimmed, ROOT)),
    }
}

/// Join path parts with the separator, skipping empty parts
pub fn path_join(base: &str, child: &str) -> String {
    let base = base.trim_end_matches(SEP);
    let child = child.trim_matches(SEP);
    match (base.is_empty(), child.is_empty()) {
        (true, _) => child.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{base}{SEP}{child}"),
    }
}

/// Base name from the rightmost separator
pub fn basename(path: &str) -> &str {
    let path = path.trim_end_matches(SEP);
    match path.rfind(SEP) {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// Directory prefix for a path: empty for the root, otherwise `path/`
pub fn dir_prefix(path: &str) -> String {
    let path = path.trim_end_matches(SEP);
    if path.is_empty() {
        String::new()
    } else {
        format!("{path}{SEP}")
    }
}

/// Check that a basename only contains safe characters
///
/// Safe characters are ASCII alphanumerics and [`SAFE_SPECIAL_CHARACTERS`].
/// Empty names are rejected.
pub fn is_safe_basename(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || SAFE_SPECIAL_CHARACTERS.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_container_and_path() {
        let path = parse_path("docs/a/b.txt").unwrap();
        assert_eq!(path.container, "docs");
        assert_eq!(path.path, "a/b.txt");
        assert!(!path.is_root());
    }

    #[test]
    fn test_parse_container_only() {
        let path = parse_path("docs/").unwrap();
        assert_eq!(path.container, "docs");
        assert_eq!(path.path, "");
        assert!(path.is_root());
    }

    #[test]
    fn test_parse_strips_directory_separator() {
        let path = parse_path("/docs/a/b/").unwrap();
        assert_eq!(path.container, "docs");
        assert_eq!(path.path, "a/b");
    }

    #[test]
    fn test_parse_empty_path() {
        assert!(matches!(parse_path(""), Err(Error::InvalidName(_))));
        assert!(matches!(parse_path("//"), Err(Error::InvalidName(_))));
    }

    #[test]
    fn test_browse_path_parent() {
        let path = BrowsePath::new("docs", "a/b/c.txt");
        let parent = path.parent().unwrap();
        assert_eq!(parent.path, "a/b");

        let parent = parent.parent().unwrap().parent().unwrap();
        assert!(parent.is_root());
        assert!(parent.parent().is_none());
    }

    #[test]
    fn test_browse_path_display() {
        let path = BrowsePath::new("docs", "/a/b.txt");
        assert_eq!(path.path, "a/b.txt");
        assert_eq!(path.to_string(), "docs/a/b.txt");
    }

    #[test]
    fn test_path_join() {
        assert_eq!(path_join("", "a"), "a");
        assert_eq!(path_join("a/", "/b/"), "a/b");
        assert_eq!(path_join("a", ""), "a");
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("a/b/c.txt"), "c.txt");
        assert_eq!(basename("a/b/"), "b");
        assert_eq!(basename("top"), "top");
        assert_eq!(basename(""), "");
    }

    #[test]
    fn test_dir_prefix() {
        assert_eq!(dir_prefix(""), "");
        assert_eq!(dir_prefix("a"), "a/");
        assert_eq!(dir_prefix("a/b/"), "a/b/");
    }

    #[test]
    fn test_safe_basename_accepts_allowed_set() {
        assert!(is_safe_basename("report 2024 (final).txt"));
        assert!(is_safe_basename("a-b_c.d*e!f'g"));
        assert!(is_safe_basename("ABCxyz019"));
    }

    #[test]
    fn test_safe_basename_rejects_other_characters() {
        assert!(!is_safe_basename(""));
        assert!(!is_safe_basename("a/b"));
        assert!(!is_safe_basename("what?"));
        assert!(!is_safe_basename("tab\there"));
        assert!(!is_safe_basename("caf\u{e9}"));
        assert!(!is_safe_basename("50%"));
    }
}
