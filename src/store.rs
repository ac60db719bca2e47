//! ==============================================================================
//! store.rs - persisted history document
//! ==============================================================================
//!
//! purpose:
//!     reads the history json at the start of a run and writes it back at
//!     the end.
//!
//! failure policy:
//!     - load: never fails. a missing, unreadable or malformed file yields an
//!       empty history so the merge always has something to start from.
//!     - save: strict. the write is the point of the run, so errors propagate.
//!
//! ==============================================================================

use crate::domain::HistoryState;
use crate::error::{LoadError, PersistError};

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// file-backed history document
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the history, falling back to an empty state on any failure.
    pub fn load(&self) -> HistoryState {
        match self.try_load() {
            Ok(state) => {
                debug!(path = %self.path.display(), records = state.records.len(), "history loaded");
                state
            }
            Err(e @ LoadError::Missing { .. }) => {
                info!("{}, starting from empty history", e);
                HistoryState::default()
            }
            Err(e) => {
                warn!("{}, starting from empty history", e);
                HistoryState::default()
            }
        }
    }

    /// Load the history, reporting why it could not be read.
    pub fn try_load(&self) -> Result<HistoryState, LoadError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                LoadError::Missing { path: self.path.clone() }
            } else {
                LoadError::Io { path: self.path.clone(), source }
            }
        })?;

        serde_json::from_str(&content).map_err(|source| LoadError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    /// Overwrite the history file with `state`, pretty-printed.
    pub fn save(&self, state: &HistoryState) -> Result<(), PersistError> {
        let json = serde_json::to_string_pretty(state)?;

        std::fs::write(&self.path, json).map_err(|source| PersistError::Write {
            path: self.path.clone(),
            source,
        })?;

        info!(path = %self.path.display(), records = state.records.len(), "history saved");
        Ok(())
    }
}

// ==============================================================================
// tests
// ==============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Record;
    use serde_json::json;

    fn sample_state() -> HistoryState {
        HistoryState {
            records: vec![Record {
                humidity: json!(88),
                dew: json!(19),
                temp: json!(21),
                time: Some("2026-02-18 10:00:00".to_string()),
                is_nanhui: json!(true),
                level: json!("moderate"),
                source: Some("ecs".to_string()),
                ..Default::default()
            }],
            last_alert: Some(json!("2026-02-18 08:00:00")),
            alert_active: true,
            alert_level: Some("moderate".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));

        assert!(matches!(store.try_load(), Err(LoadError::Missing { .. })));
        assert_eq!(store.load(), HistoryState::default());
    }

    #[test]
    fn test_corrupt_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = HistoryStore::new(&path);

        assert!(matches!(store.try_load(), Err(LoadError::Malformed { .. })));
        assert_eq!(store.load(), HistoryState::default());
    }

    #[test]
    fn test_non_object_document_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let store = HistoryStore::new(&path);
        assert!(matches!(store.try_load(), Err(LoadError::Malformed { .. })));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));
        let state = sample_state();

        store.save(&state).unwrap();
        assert_eq!(store.try_load().unwrap(), state);
    }

    #[test]
    fn test_save_is_indented() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));
        store.save(&HistoryState::default()).unwrap();

        let written = std::fs::read_to_string(store.path()).unwrap();
        assert!(written.starts_with("{\n  \"records\": []"));
    }

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let original = json!({
            "records": [
                {"humidity": 91, "dew": 20, "temp": 21, "time": "2026-02-18T08:00:00",
                 "isNanhui": true, "level": "severe", "note": "collector"}
            ],
            "lastAlert": "2026-02-18T08:00:00",
            "alertActive": true,
            "alertLevel": "severe",
            "lastCheck": "2026-02-18T08:00:00"
        });
        std::fs::write(&path, original.to_string()).unwrap();

        let store = HistoryStore::new(&path);
        let state = store.try_load().unwrap();
        store.save(&state).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["lastCheck"], original["lastCheck"]);
        assert_eq!(written["records"][0]["note"], json!("collector"));
        assert_eq!(written["lastAlert"], original["lastAlert"]);
    }

    #[test]
    fn test_null_measurements_keep_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let original = json!({
            "records": [
                {"humidity": null, "dew": 20, "temp": 21.5, "time": "2026-02-18 08:00:00",
                 "isNanhui": false, "level": null}
            ],
            "lastAlert": "2026-02-18 07:00:00",
            "alertActive": true,
            "alertLevel": "severe"
        });
        std::fs::write(&path, original.to_string()).unwrap();

        let store = HistoryStore::new(&path);
        let state = store.try_load().unwrap();
        assert_eq!(state.records.len(), 1);
        assert!(state.alert_active);

        store.save(&state).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["records"][0], original["records"][0]);
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("absent").join("history.json"));

        let result = store.save(&sample_state());
        assert!(matches!(result, Err(PersistError::Write { .. })));
    }
}
