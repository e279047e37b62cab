use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::OnboardingError;
use crate::utils::persistence::{read_json, write_json_atomic};

use super::{Result, WizardPersistence};

const ENTRY_EXTENSION: &str = "json";
pub const WIZARD_STATE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    schema_version: u32,
    saved_at: DateTime<Utc>,
    value: Value,
}

/// File-backed store writing one JSON document per key.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", canonical_key(key), ENTRY_EXTENSION))
    }

    /// Time the value under `key` was written, if present.
    pub fn saved_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.read_entry(key)?.map(|entry| entry.saved_at))
    }

    /// Reads the envelope under `key`. An unreadable file is removed and
    /// reported as absent.
    fn read_entry(&self, key: &str) -> Result<Option<StoredEntry>> {
        let path = self.entry_path(key);
        match read_json::<StoredEntry>(&path) {
            Err(OnboardingError::Serde(err)) => {
                tracing::warn!(
                    key,
                    path = %path.display(),
                    error = %err,
                    "discarding unreadable wizard state"
                );
                self.clear(key)?;
                Ok(None)
            }
            other => other,
        }
    }
}

impl WizardPersistence for JsonFileStore {
    fn save(&self, key: &str, value: &Value) -> Result<()> {
        let entry = StoredEntry {
            schema_version: WIZARD_STATE_SCHEMA_VERSION,
            saved_at: Utc::now(),
            value: value.clone(),
        };
        write_json_atomic(&self.entry_path(key), &entry)?;
        tracing::debug!(key, path = %self.entry_path(key).display(), "persisted wizard state");
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Value>> {
        match self.read_entry(key)? {
            Some(entry) if entry.schema_version > WIZARD_STATE_SCHEMA_VERSION => {
                tracing::warn!(
                    key,
                    version = entry.schema_version,
                    "ignoring wizard state from a newer schema version"
                );
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value)),
            None => Ok(None),
        }
    }

    fn load_and_clear(&self, key: &str) -> Result<Option<Value>> {
        let Some(entry) = self.read_entry(key)? else {
            return Ok(None);
        };
        self.clear(key)?;
        if entry.schema_version > WIZARD_STATE_SCHEMA_VERSION {
            tracing::warn!(
                key,
                version = entry.schema_version,
                "dropping consumed wizard state from a newer schema version"
            );
            return Ok(None);
        }
        Ok(Some(entry.value))
    }

    fn clear(&self, key: &str) -> Result<()> {
        let path = self.entry_path(key);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

fn canonical_key(key: &str) -> String {
    let mut sanitized: String = key
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
                ch.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() {
        sanitized.push_str("entry");
    }
    sanitized
}
