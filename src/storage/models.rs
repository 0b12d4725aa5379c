//! Model file management
//!
//! Scanning a directory tree for GGUF model files, deleting them, and
//! producing display names for the picker.

use crate::storage::StorageError;
use glob::{glob_with, MatchOptions};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

/// `.gguf` extension, any casing.
static GGUF_EXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.gguf$").unwrap());

/// Recursively scan a directory for `.gguf` files.
///
/// Unreadable subtrees are skipped rather than failing the whole scan.
pub fn scan_models(dir: &str) -> Result<Vec<PathBuf>, StorageError> {
    let dir = if dir.trim().is_empty() { "." } else { dir.trim() };
    let pattern = format!("{}/**/*.gguf", dir.trim_end_matches(['/', '\\']));
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::default()
    };

    let paths = glob_with(&pattern, options)
        .map_err(|e| StorageError::Pattern(e.to_string()))?;

    let mut models: Vec<PathBuf> = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) if path.is_file() => models.push(path),
            Ok(_) => {}
            Err(e) => tracing::debug!("skipping unreadable entry during scan: {}", e),
        }
    }
    models.sort();

    tracing::info!("found {} model file(s) under {}", models.len(), dir);
    Ok(models)
}

/// Delete a model file. A missing file is an error the caller surfaces;
/// nothing else is touched.
pub fn delete_model(path: &Path) -> Result<(), StorageError> {
    if !path.exists() {
        return Err(StorageError::NotFound(path.display().to_string()));
    }
    std::fs::remove_file(path)?;
    tracing::info!("deleted model: {}", path.display());
    Ok(())
}

/// Display name for a model path: file name without the `.gguf` extension
/// (case-insensitive), middle-truncated when unreasonably long.
pub fn display_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let clean = GGUF_EXT.replace(&file_name, "").to_string();
    truncate_name(&clean, 50)
}

/// Keep the head and tail of a long name around an ellipsis.
fn truncate_name(name: &str, max_len: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_len {
        return name.to_string();
    }
    let head: String = chars[..20].iter().collect();
    let tail: String = chars[chars.len() - 20..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_scan_finds_nested_gguf_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested/deeper")).unwrap();
        fs::write(dir.path().join("a.gguf"), b"x").unwrap();
        fs::write(dir.path().join("nested/deeper/b.GGUF"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let models = scan_models(&dir.path().to_string_lossy()).unwrap();
        assert_eq!(models.len(), 2);
        assert!(models.iter().all(|p| {
            p.extension()
                .map(|e| e.to_string_lossy().eq_ignore_ascii_case("gguf"))
                .unwrap_or(false)
        }));
    }

    #[test]
    fn test_scan_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let models = scan_models(&dir.path().to_string_lossy()).unwrap();
        assert!(models.is_empty());
    }

    #[test]
    fn test_delete_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.gguf");
        fs::write(&path, b"x").unwrap();

        delete_model(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_delete_missing_model_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.gguf");
        assert!(matches!(
            delete_model(&missing),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_display_name_strips_extension_any_case() {
        assert_eq!(
            display_name(Path::new("/models/llama-2-7b.Q4_K_M.gguf")),
            "llama-2-7b.Q4_K_M"
        );
        assert_eq!(display_name(Path::new("mistral.GGUF")), "mistral");
    }

    #[test]
    fn test_display_name_truncates_middle() {
        let long = format!("/models/{}.gguf", "a".repeat(80));
        let name = display_name(Path::new(&long));
        assert_eq!(name.len(), 43); // 20 + 3 + 20
        assert!(name.contains("..."));
    }
}
