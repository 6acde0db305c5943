//! In-memory settings cache.
//!
//! Settings are read from the store once at startup. After that the cache is
//! the source of truth, and a value is written back only when an observed
//! value differs from the cached one.

use crate::model::SectorId;
use std::collections::HashMap;

pub const STARDOCK_KEY: &str = "stardock";
pub const MAX_SECTOR_KEY: &str = "max_sector";
pub const AUTO_HAGGLE_KEY: &str = "auto_haggle";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    persisted: HashMap<String, String>,
    /// Sector the current screen refers to (runtime only)
    pub working_sector: Option<SectorId>,
    /// Suppress echoing server output (runtime only)
    pub mute: bool,
}

impl Settings {
    pub fn from_persisted(persisted: HashMap<String, String>) -> Self {
        Self {
            persisted,
            ..Default::default()
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.persisted.get(key).map(String::as_str)
    }

    fn get_number(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    pub fn stardock(&self) -> Option<SectorId> {
        self.get_number(STARDOCK_KEY)
    }

    pub fn max_sector(&self) -> Option<u32> {
        self.get_number(MAX_SECTOR_KEY)
    }

    /// Stored as text by older tools, so accept "0"/"1" and "true"/"false".
    pub fn auto_haggle(&self) -> Option<bool> {
        self.get(AUTO_HAGGLE_KEY)
            .and_then(|v| match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Some(true),
                "0" | "false" | "no" => Some(false),
                other => other.parse::<i64>().ok().map(|n| n != 0),
            })
    }

    /// Record an observed value. Returns true when it differs from the cache
    /// and therefore needs persisting.
    pub fn observe(&mut self, key: &str, value: impl ToString) -> bool {
        let value = value.to_string();
        if self.persisted.get(key) == Some(&value) {
            return false;
        }
        self.persisted.insert(key.to_string(), value);
        true
    }

    /// Persisted entries, sorted by key.
    pub fn entries(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<_> = self
            .persisted
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        entries.sort();
        entries
    }
}
