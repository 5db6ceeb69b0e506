//! In-memory project files.
//!
//! The file store belongs to the host; the core only reads it. Paths are
//! normalized to absolute, forward-slash form so that `src/App.tsx`,
//! `./src/App.tsx` and `/src/App.tsx` name the same file.

use path_clean::PathClean;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A single file supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualFile {
    pub path: String,
    pub content: String,
    #[serde(default)]
    pub is_binary: bool,
}

impl VirtualFile {
    pub fn new(path: impl AsRef<str>, content: impl Into<String>) -> Self {
        Self {
            path: normalize_path(path.as_ref()),
            content: content.into(),
            is_binary: false,
        }
    }

    pub fn binary(path: impl AsRef<str>, content: impl Into<String>) -> Self {
        Self {
            is_binary: true,
            ..Self::new(path, content)
        }
    }

    pub fn extension(&self) -> Option<&str> {
        extension(&self.path)
    }
}

/// Normalize a project path to `/a/b/c` form.
///
/// Backslashes become slashes, `.` and `..` are resolved, and a leading
/// slash is added. `..` never climbs above the root.
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let rooted = if unified.starts_with('/') {
        unified
    } else {
        format!("/{unified}")
    };
    let cleaned = Path::new(&rooted).to_path_buf().clean();
    let s = cleaned.to_string_lossy().replace('\\', "/");
    if s.is_empty() { "/".to_string() } else { s }
}

/// Lowercased-insensitive extension lookup on a normalized path.
pub fn extension(path: &str) -> Option<&str> {
    let name = file_name(path);
    let idx = name.rfind('.')?;
    if idx == 0 {
        return None;
    }
    Some(&name[idx + 1..])
}

pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Final name without its extension, e.g. `page` for `/app/page.tsx`.
pub fn file_stem(path: &str) -> &str {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

pub const SCRIPT_EXTENSIONS: &[&str] = &["tsx", "jsx", "ts", "js", "mjs"];

pub fn is_script(path: &str) -> bool {
    if path.ends_with(".d.ts") {
        return false;
    }
    extension(path).is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext))
}

/// The project as a path-ordered map.
///
/// Iteration is lexicographic by normalized path, which makes every
/// "first matching file" rule in the detectors deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSet {
    files: BTreeMap<String, VirtualFile>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a path → content map, the shape the file store hands over.
    pub fn from_map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut set = Self::new();
        for (path, content) in entries {
            set.insert(VirtualFile::new(path, content));
        }
        set
    }

    pub fn insert(&mut self, file: VirtualFile) -> Option<VirtualFile> {
        self.files.insert(file.path.clone(), file)
    }

    pub fn upsert(&mut self, path: &str, content: impl Into<String>) {
        self.insert(VirtualFile::new(path, content));
    }

    pub fn remove(&mut self, path: &str) -> Option<VirtualFile> {
        self.files.remove(&normalize_path(path))
    }

    pub fn get(&self, path: &str) -> Option<&VirtualFile> {
        self.files.get(&normalize_path(path))
    }

    pub fn content(&self, path: &str) -> Option<&str> {
        self.get(path).map(|f| f.content.as_str())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(&normalize_path(path))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VirtualFile> {
        self.files.values()
    }

    /// Text files only; binary assets never carry source.
    pub fn sources(&self) -> impl Iterator<Item = &VirtualFile> {
        self.files.values().filter(|f| !f.is_binary)
    }

    /// The `package.json` under `prefix` (or at the root), parsed.
    pub fn manifest(&self, prefix: Option<&str>) -> Option<serde_json::Value> {
        let candidates = [
            prefix.map(|p| format!("{p}/package.json")),
            Some("/package.json".to_string()),
        ];
        candidates
            .into_iter()
            .flatten()
            .find_map(|path| self.content(&path))
            .and_then(|content| serde_json::from_str(content).ok())
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.files
            .iter()
            .map(|(path, file)| (path.clone(), file.content.clone()))
            .collect()
    }
}

impl FromIterator<VirtualFile> for FileSet {
    fn from_iter<T: IntoIterator<Item = VirtualFile>>(iter: T) -> Self {
        let mut set = Self::new();
        for file in iter {
            set.insert(file);
        }
        set
    }
}
