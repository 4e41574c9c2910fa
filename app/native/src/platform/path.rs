//! Shell-like path expansion for paths typed by the user
//! (entry backgrounds, `dataDir`, `renderCacheDir`).

use std::path::{Path, PathBuf};

/// Expands a leading `~` to the home directory.
///
/// Absolute and relative paths are returned unchanged; blank input yields an
/// empty path.
#[must_use]
pub fn expand(path: &str) -> PathBuf {
    let path = path.trim();
    if path.is_empty() {
        return PathBuf::new();
    }

    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Like [`expand`], then resolves relative results against `base_dir`.
#[must_use]
pub fn expand_and_resolve(path: &str, base_dir: &Path) -> PathBuf {
    let expanded = expand(path);
    if expanded.as_os_str().is_empty() || expanded.is_absolute() {
        return expanded;
    }

    base_dir.join(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_blank() {
        assert_eq!(expand(""), PathBuf::new());
        assert_eq!(expand("   "), PathBuf::new());
    }

    #[test]
    fn test_expand_leaves_absolute_and_relative_paths() {
        assert_eq!(expand("/srv/backgrounds/sea.jpg"), PathBuf::from("/srv/backgrounds/sea.jpg"));
        assert_eq!(expand("backgrounds/sea.jpg"), PathBuf::from("backgrounds/sea.jpg"));
    }

    #[test]
    fn test_expand_tilde() {
        let result = expand("~/Pictures/sea.jpg");
        assert!(!result.to_string_lossy().starts_with('~'));
        assert!(result.to_string_lossy().ends_with("Pictures/sea.jpg"));
    }

    #[test]
    fn test_expand_and_resolve() {
        let base = Path::new("/home/user/.config/quotewall");
        assert_eq!(expand_and_resolve("data", base), base.join("data"));
        assert_eq!(expand_and_resolve("/var/lib/qw", base), PathBuf::from("/var/lib/qw"));
        assert_eq!(expand_and_resolve("", base), PathBuf::new());
        assert!(!expand_and_resolve("~/qw", base).starts_with(base));
    }
}
