use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const LOANS_KEY: &str = "loans";
pub const EXPENSES_KEY: &str = "expenses";
pub const INCOME_KEY: &str = "totalIncome";

/// Collections are re-saved with this expiry on every write.
pub const COLLECTION_EXPIRY_DAYS: i64 = 7;

pub fn collection_expiry() -> Option<Duration> {
    Some(Duration::days(COLLECTION_EXPIRY_DAYS))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
}

impl StoredEntry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// Key-value persistence over a single JSON file.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value under `key`, or `None` when missing or expired.
    pub fn load(&self, key: &str) -> Result<Option<Value>, Box<dyn std::error::Error>> {
        let entries = self.read_all()?;
        let now = Utc::now();
        Ok(entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }

    pub fn load_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, Box<dyn std::error::Error>> {
        match self.load(key)? {
            Some(value) => {
                let typed = serde_json::from_value(value)
                    .map_err(|e| format!("Stored '{}' in '{}' is malformed: {}", key, self.path.display(), e))?;
                Ok(Some(typed))
            }
            None => Ok(None),
        }
    }

    pub fn save<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        expiry: Option<Duration>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut entries = self.read_all()?;
        entries.insert(
            key.to_string(),
            StoredEntry {
                value: serde_json::to_value(value)?,
                expires_at: expiry.map(|d| Utc::now() + d),
            },
        );
        self.write_all(&entries)?;
        debug!(key, path = %self.path.display(), "saved store entry");
        Ok(())
    }

    /// Returns whether the key was present.
    pub fn remove(&self, key: &str) -> Result<bool, Box<dyn std::error::Error>> {
        let mut entries = self.read_all()?;
        let existed = entries.remove(key).is_some();
        if existed {
            self.write_all(&entries)?;
        }
        Ok(existed)
    }

    fn read_all(&self) -> Result<BTreeMap<String, StoredEntry>, Box<dyn std::error::Error>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path)
            .map_err(|e| format!("Failed to read store '{}': {}", self.path.display(), e))?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        let entries = serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse store '{}': {}", self.path.display(), e))?;
        Ok(entries)
    }

    /// Write to a sibling temp file, then rename over the store.
    fn write_all(&self, entries: &BTreeMap<String, StoredEntry>) -> Result<(), Box<dyn std::error::Error>> {
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        fs::write(&tmp, serde_json::to_string_pretty(entries)?)
            .map_err(|e| format!("Failed to write '{}': {}", tmp.display(), e))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| format!("Failed to replace store '{}': {}", self.path.display(), e))?;
        Ok(())
    }
}
