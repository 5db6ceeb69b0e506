//! Load a project directory into a [`FileSet`].

use glimpse_core::{FileSet, VirtualFile};
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

use crate::error::{CliError, Result, ResultExt};

/// Directories never worth reading into a preview.
const SKIPPED_DIRS: &[&str] = &["node_modules", "dist", "build", "target", ".git"];

/// Files above this size are recorded as binary placeholders.
const MAX_TEXT_SIZE: u64 = 2 * 1024 * 1024;

fn is_skipped(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || (entry.file_type().is_dir() && SKIPPED_DIRS.contains(&name.as_ref()))
}

/// Read every text file under `root`, keyed by its `/`-rooted relative path.
///
/// Hidden entries and dependency/output directories are skipped. Files that
/// are not valid UTF-8 or are very large become empty binary entries.
pub fn load_dir(root: &Path) -> Result<FileSet> {
    if !root.is_dir() {
        return Err(match root.exists() {
            true => CliError::NotADirectory(root.to_path_buf()),
            false => CliError::FileNotFound(root.to_path_buf()),
        });
    }

    let mut files = FileSet::new();
    for entry in WalkDir::new(root).follow_links(false).into_iter().filter_entry(|e| !is_skipped(e)) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let path = relative.to_string_lossy();

        let size = entry.metadata()?.len();
        let file = if size > MAX_TEXT_SIZE {
            VirtualFile::binary(&path, "")
        } else {
            let bytes = std::fs::read(entry.path()).with_path(entry.path())?;
            match String::from_utf8(bytes) {
                Ok(text) => VirtualFile::new(&path, text),
                Err(_) => VirtualFile::binary(&path, ""),
            }
        };
        files.insert(file);
    }

    tracing::debug!(root = %root.display(), files = files.len(), "project loaded");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_dir_skips_dependencies_and_hidden() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules/react")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("src/main.tsx"), "main").unwrap();
        fs::write(root.join("index.html"), "<html></html>").unwrap();
        fs::write(root.join("node_modules/react/index.js"), "").unwrap();
        fs::write(root.join(".git/HEAD"), "ref").unwrap();
        fs::write(root.join(".env"), "SECRET=1").unwrap();
        fs::write(root.join("logo.png"), [0x89, 0x50, 0x4e, 0x47, 0xff, 0xfe]).unwrap();

        let files = load_dir(root).unwrap();
        let paths: Vec<_> = files.paths().collect();
        assert_eq!(paths, ["/index.html", "/logo.png", "/src/main.tsx"]);
        assert_eq!(files.content("/src/main.tsx"), Some("main"));
        assert!(files.get("/logo.png").unwrap().is_binary);
    }

    #[test]
    fn test_load_missing_dir() {
        let err = load_dir(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, CliError::FileNotFound(_)));
    }

    #[test]
    fn test_load_file_is_not_a_dir() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.txt");
        fs::write(&file, "").unwrap();
        assert!(matches!(load_dir(&file).unwrap_err(), CliError::NotADirectory(_)));
    }
}
