//! State Store - the single persisted scalar
//!
//! The index carries exactly one value between invocations. Loading never
//! fails outward: a missing, unreadable or corrupt file means "no prior state"
//! and yields the baseline. Saving is atomic (temp-write then rename).

use crate::atomic_file;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Value used when no usable prior state exists
pub const DEFAULT_STATE_VALUE: f64 = 50.0;

/// The persisted entity: `{ "value": float }`, always within [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexState {
    pub value: f64,
}

impl Default for IndexState {
    fn default() -> Self {
        Self {
            value: DEFAULT_STATE_VALUE,
        }
    }
}

impl IndexState {
    /// Whether this state satisfies the bounded-score invariant
    pub fn is_valid(&self) -> bool {
        self.value.is_finite() && (0.0..=100.0).contains(&self.value)
    }

    /// State for `value`, refusing anything outside [0, 100]
    pub fn checked(value: f64) -> Result<Self> {
        let state = Self { value };
        if state.is_valid() {
            Ok(state)
        } else {
            Err(Error::InvalidState(format!("value {} outside [0, 100]", value)))
        }
    }
}

/// Persistence for the index value across invocations
pub trait StateStore {
    /// Previously persisted value, or [`DEFAULT_STATE_VALUE`]
    fn load(&self) -> f64;

    /// Persist `value` for the next invocation
    fn save(&mut self, value: f64) -> Result<()>;
}

/// JSON file store (`<key>_state.json`)
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store for `index_key` under `dir`
    pub fn for_key(dir: impl AsRef<Path>, index_key: &str) -> Self {
        Self::new(dir.as_ref().join(format!("{}_state.json", index_key)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_state(&self) -> std::result::Result<Option<IndexState>, String> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.to_string()),
        };

        let state: IndexState = serde_json::from_str(&json).map_err(|e| e.to_string())?;
        if !state.is_valid() {
            return Err(format!("value {} outside [0, 100]", state.value));
        }

        Ok(Some(state))
    }
}

impl StateStore for JsonStateStore {
    fn load(&self) -> f64 {
        match self.read_state() {
            Ok(Some(state)) => state.value,
            Ok(None) => {
                debug!(path = %self.path.display(), "no prior state, starting from baseline");
                DEFAULT_STATE_VALUE
            }
            Err(reason) => {
                warn!(path = %self.path.display(), %reason, "unreadable state, falling back to baseline");
                DEFAULT_STATE_VALUE
            }
        }
    }

    fn save(&mut self, value: f64) -> Result<()> {
        let state = IndexState::checked(value)?;
        let json = serde_json::to_string_pretty(&state)?;
        atomic_file::write_atomic(&self.path, json.as_bytes())?;
        debug!(path = %self.path.display(), value, "state saved");
        Ok(())
    }
}

/// In-process store, for embedding and benchmarks
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    state: Option<IndexState>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: f64) -> Self {
        Self {
            state: Some(IndexState { value }),
        }
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> f64 {
        self.state
            .filter(IndexState::is_valid)
            .map(|s| s.value)
            .unwrap_or(DEFAULT_STATE_VALUE)
    }

    fn save(&mut self, value: f64) -> Result<()> {
        self.state = Some(IndexState::checked(value)?);
        Ok(())
    }
}

impl<S: StateStore + ?Sized> StateStore for Box<S> {
    fn load(&self) -> f64 {
        (**self).load()
    }

    fn save(&mut self, value: f64) -> Result<()> {
        (**self).save(value)
    }
}
