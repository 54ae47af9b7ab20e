use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::warn;

/// State that belongs to this control surface only, never to the worker's
/// configuration document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiState {
    #[serde(default)]
    pub last_synced: Option<String>,
}

#[derive(Clone, Debug)]
pub struct UiStateStore {
    path: PathBuf,
}

impl UiStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> UiState {
        if !self.path.exists() {
            return UiState::default();
        }
        let parsed = fs::read_to_string(&self.path)
            .context("read ui state")
            .and_then(|data| serde_json::from_str(&data).context("parse ui state"));
        match parsed {
            Ok(state) => state,
            Err(err) => {
                warn!(path = %self.path.display(), error = %format!("{err:#}"), "Ignoring unreadable UI state");
                UiState::default()
            }
        }
    }

    pub fn save(&self, state: &UiState) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("create ui state directory")?;
        }
        let data = serde_json::to_string_pretty(state).context("serialize ui state")?;
        fs::write(&self.path, data).context("write ui state")?;
        Ok(())
    }

    pub fn record_sync(&self, timestamp: &str) -> anyhow::Result<()> {
        let mut state = self.load();
        state.last_synced = Some(timestamp.to_string());
        self.save(&state)
    }
}

pub fn now_rfc3339() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_state_is_default() {
        let tmp = TempDir::new().unwrap();
        let store = UiStateStore::new(tmp.path().join("ui_state.json"));
        assert_eq!(store.load(), UiState::default());
    }

    #[test]
    fn record_sync_persists_timestamp() {
        let tmp = TempDir::new().unwrap();
        let store = UiStateStore::new(tmp.path().join("nested").join("ui_state.json"));
        store.record_sync("2026-10-19T08:00:00Z").unwrap();
        assert_eq!(
            store.load().last_synced.as_deref(),
            Some("2026-10-19T08:00:00Z")
        );
    }

    #[test]
    fn corrupt_state_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ui_state.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(UiStateStore::new(path).load(), UiState::default());
    }

    #[test]
    fn timestamps_are_rfc3339() {
        let stamp = now_rfc3339();
        assert!(OffsetDateTime::parse(&stamp, &Rfc3339).is_ok());
    }
}
