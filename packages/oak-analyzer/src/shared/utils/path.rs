//! Path normalization
//!
//! Every map in the crate is keyed by normalized absolute paths and lookups
//! rely on byte equality, so all paths entering the crate go through
//! [`normalize_path`].

use std::path::{Path, PathBuf};

/// Normalize a path: absolute, `.`/`..` folded, forward slashes, lower-case
/// drive letter.
pub fn normalize_path(path: impl AsRef<Path>) -> PathBuf {
    let raw = path.as_ref().to_string_lossy().replace('\\', "/");

    let (prefix, rest) = split_root(&raw);
    let (prefix, rest) = match prefix {
        Some(prefix) => (prefix, rest.to_string()),
        None => {
            // Relative input: anchor at the current directory
            let cwd = std::env::current_dir()
                .map(|d| d.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            let (cwd_prefix, cwd_rest) = split_root(&cwd);
            (
                cwd_prefix.unwrap_or_else(|| "/".to_string()),
                format!("{}/{}", cwd_rest, rest),
            )
        }
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let mut normalized = prefix;
    normalized.push_str(&segments.join("/"));
    PathBuf::from(normalized)
}

/// Split `raw` into a root prefix (`/` or `c:/`) and the remainder.
fn split_root(raw: &str) -> (Option<String>, &str) {
    let bytes = raw.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        let drive = (bytes[0] as char).to_ascii_lowercase();
        return (Some(format!("{}:/", drive)), &raw[2..]);
    }
    if raw.starts_with('/') {
        return (Some("/".to_string()), raw);
    }
    (None, raw)
}

/// Component-wise prefix test on normalized paths
pub fn path_starts_with(path: &Path, prefix: &Path) -> bool {
    normalize_path(path).starts_with(normalize_path(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folds_dot_segments() {
        assert_eq!(
            normalize_path("/a/b/./c/../d.ts"),
            PathBuf::from("/a/b/d.ts")
        );
    }

    #[test]
    fn test_windows_drive_and_separators() {
        assert_eq!(
            normalize_path("C:\\work\\proj\\src\\..\\index.ts"),
            PathBuf::from("c:/work/proj/index.ts")
        );
    }

    #[test]
    fn test_relative_is_anchored() {
        assert!(normalize_path("x/y.ts").is_absolute() || cfg!(windows));
    }

    #[test]
    fn test_prefix_is_component_wise() {
        assert!(path_starts_with(Path::new("/p/src/a/b.ts"), Path::new("/p/src/a")));
        assert!(!path_starts_with(Path::new("/p/src/ab/b.ts"), Path::new("/p/src/a")));
    }
}
