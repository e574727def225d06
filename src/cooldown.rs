use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Persisted suppression state. Field names match the JSON document the
/// web dashboard reads next to this scanner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CooldownState {
    /// `chainId:pairAddress` -> last alert epoch millis.
    #[serde(default, rename = "sentPairs")]
    pub sent_pairs: HashMap<String, i64>,

    #[serde(default, rename = "lastRunMs")]
    pub last_run_ms: i64,
}

/// Suppression key. Pair addresses are not unique across chains, so the
/// chain id is part of the identity.
pub fn pair_key(chain_id: &str, pair_address: &str) -> String {
    format!("{chain_id}:{pair_address}")
}

pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    /// Missing or unreadable state degrades to an empty default. Losing
    /// the map only risks a duplicate alert, never a failed run.
    pub fn load(&self) -> CooldownState {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return CooldownState::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(state) => state,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "corrupt cooldown state, starting fresh");
                CooldownState::default()
            }
        }
    }

    /// Single write per run: temp file in the same directory, then rename
    /// into place so readers never observe a partial document.
    pub fn save(&self, state: &CooldownState) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("creating state dir {}", dir.display()))?;
            }
        }
        let raw = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw + "\n")
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("renaming into {}", self.path.display()))?;
        Ok(())
    }
}

/// In-memory cooldown map shared by the workers. Check-and-reserve runs
/// under one lock, so two workers can never both claim the same pair key.
/// Never held across an await.
pub struct CooldownMap {
    inner: Mutex<HashMap<String, i64>>,
    cooldown_ms: i64,
}

impl CooldownMap {
    pub fn new(state: &CooldownState, cooldown_ms: i64) -> Self {
        Self {
            inner: Mutex::new(state.sent_pairs.clone()),
            cooldown_ms,
        }
    }

    /// Read-only peek so workers can skip scoring work early.
    pub fn is_cooling(&self, key: &str, now_ms: i64) -> bool {
        let map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.get(key).is_some_and(|last| now_ms - last < self.cooldown_ms)
    }

    /// Atomically claim `key` at `now_ms`. False when the key is still in
    /// its cooldown window, including one a sibling worker claimed a
    /// moment ago.
    pub fn try_reserve(&self, key: &str, now_ms: i64) -> bool {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        match map.get(key) {
            Some(last) if now_ms - last < self.cooldown_ms => false,
            _ => {
                map.insert(key.to_string(), now_ms);
                true
            }
        }
    }

    /// Snapshot merged back into the persisted state at end of run.
    pub fn snapshot(&self) -> HashMap<String, i64> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}
