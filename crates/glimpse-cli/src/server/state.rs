//! Shared state for the preview server.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Why a write was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteRejection {
    /// The same session already stored an equal or newer build.
    Stale { current: u64 },
    Empty,
}

#[derive(Debug, Default)]
struct Snapshot {
    build_id: u64,
    files: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct StoreState {
    current: Snapshot,
    /// Latest accepted build per session token.
    sessions: HashMap<String, u64>,
}

/// The files of the latest accepted write.
///
/// Build ids only move forward within a session, so a slow, superseded
/// write can never replace a newer preview from the same session. Each
/// session counts its own builds; the last accepted write from any session
/// is what gets served.
#[derive(Debug, Default)]
pub struct PreviewStore {
    state: RwLock<StoreState>,
}

pub type SharedStore = Arc<PreviewStore>;

impl PreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_files(
        &self,
        session: &str,
        files: BTreeMap<String, String>,
        build_id: u64,
    ) -> Result<usize, WriteRejection> {
        if files.is_empty() {
            return Err(WriteRejection::Empty);
        }
        let mut state = self.state.write();
        let latest = state.sessions.entry(session.to_string()).or_default();
        if build_id <= *latest {
            return Err(WriteRejection::Stale { current: *latest });
        }
        *latest = build_id;
        let count = files.len();
        state.current = Snapshot {
            build_id,
            files: files
                .into_iter()
                .map(|(path, content)| (glimpse_core::normalize_path(&path), content))
                .collect(),
        };
        Ok(count)
    }

    pub fn get(&self, path: &str) -> Option<String> {
        self.state.read().current.files.get(path).cloned()
    }

    /// Build id of the files currently served.
    pub fn build_id(&self) -> u64 {
        self.state.read().current.build_id
    }

    pub fn file_count(&self) -> usize {
        self.state.read().current.files.len()
    }

    pub fn session_count(&self) -> usize {
        self.state.read().sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(html: &str) -> BTreeMap<String, String> {
        BTreeMap::from([("index.html".to_string(), html.to_string())])
    }

    #[test]
    fn test_newer_build_replaces() {
        let store = PreviewStore::new();
        assert_eq!(store.set_files("a", files("one"), 1), Ok(1));
        assert_eq!(store.set_files("a", files("two"), 2), Ok(1));
        assert_eq!(store.get("/index.html").as_deref(), Some("two"));
        assert_eq!(store.build_id(), 2);
    }

    #[test]
    fn test_stale_build_rejected() {
        let store = PreviewStore::new();
        store.set_files("a", files("five"), 5).unwrap();
        assert_eq!(
            store.set_files("a", files("three"), 3),
            Err(WriteRejection::Stale { current: 5 })
        );
        assert_eq!(store.get("/index.html").as_deref(), Some("five"));
    }

    #[test]
    fn test_empty_write_rejected() {
        let store = PreviewStore::new();
        assert_eq!(store.set_files("a", BTreeMap::new(), 1), Err(WriteRejection::Empty));
        assert_eq!(store.file_count(), 0);
        assert_eq!(store.session_count(), 0);
    }

    #[test]
    fn test_sessions_count_builds_independently() {
        let store = PreviewStore::new();
        for build in 1..=5 {
            store.set_files("first", files("first"), build).unwrap();
        }
        assert_eq!(store.set_files("second", files("second"), 1), Ok(1));
        assert_eq!(store.get("/index.html").as_deref(), Some("second"));
        assert_eq!(store.build_id(), 1);

        assert_eq!(
            store.set_files("first", files("late"), 5),
            Err(WriteRejection::Stale { current: 5 })
        );
        assert_eq!(store.session_count(), 2);
    }
}
