use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use log::{debug, warn};

use crate::error::StoreError;
use crate::geometry::Position;

/// Serialized layout: `[[node_id, {"x": .., "y": ..}], ...]`.
pub type PositionList = Vec<(String, Position)>;

/// String key-value persistence, the equivalent of browser web storage.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits the total size of all stored values to `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            items: HashMap::new(),
            quota: Some(bytes),
        }
    }

    fn used_without(&self, key: &str) -> usize {
        self.items
            .iter()
            .filter(|(existing, _)| existing.as_str() != key)
            .map(|(_, value)| value.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(limit) = self.quota {
            let needed = self.used_without(key) + value.len();
            if needed > limit {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_owned(),
                    needed,
                    limit,
                });
            }
        }

        self.items.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// One JSON file per key inside a directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        if !fs::metadata(&dir)?.is_dir() {
            return Err(StoreError::Unavailable);
        }
        Ok(Self { dir })
    }

    /// Escapes everything but ASCII alphanumerics and `-` as `_` plus six hex
    /// digits, so distinct keys never share a file.
    fn path_for(&self, key: &str) -> PathBuf {
        let mut file_name = String::with_capacity(key.len());
        for ch in key.chars() {
            if ch.is_ascii_alphanumeric() || ch == '-' {
                file_name.push(ch);
            } else {
                file_name.push_str(&format!("_{:06x}", u32::from(ch)));
            }
        }
        self.dir.join(format!("{file_name}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value)?;
        fs::rename(&staging, &path)?;
        Ok(())
    }
}

/// Layout persistence on top of an optional [`KeyValueStore`].
///
/// A missing backend is reported once, when the store is created; afterwards
/// every load is a miss and every save fails with [`StoreError::Unavailable`].
pub struct PositionStore {
    backend: Option<Box<dyn KeyValueStore>>,
}

impl PositionStore {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Some(Box::new(backend)),
        }
    }

    pub fn unavailable() -> Self {
        warn!("Persistent storage not available, layouts will not be cached.");
        Self { backend: None }
    }

    pub fn detect<B: KeyValueStore + 'static>(backend: Result<B, StoreError>) -> Self {
        match backend {
            Ok(backend) => Self::new(backend),
            Err(error) => {
                warn!("Could not open layout cache: {error}");
                Self::unavailable()
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    pub fn load(&self, key: &str) -> Option<PositionList> {
        let backend = self.backend.as_ref()?;
        let raw = match backend.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(error) => {
                warn!("Could not read layout cache entry {key}: {error}");
                return None;
            }
        };

        match serde_json::from_str::<PositionList>(&raw) {
            Ok(positions) => {
                debug!("Read {} cached positions for {key}.", positions.len());
                Some(positions)
            }
            Err(error) => {
                warn!("Corrupt layout cache entry {key}: {error}");
                None
            }
        }
    }

    pub fn save(&mut self, key: &str, positions: &[(String, Position)]) -> Result<(), StoreError> {
        let backend = self.backend.as_mut().ok_or(StoreError::Unavailable)?;
        let raw = serde_json::to_string(positions)?;
        backend.set_item(key, &raw)
    }

    /// Writes a raw value, bypassing serialization.
    pub fn save_raw(&mut self, key: &str, raw: &str) -> Result<(), StoreError> {
        let backend = self.backend.as_mut().ok_or(StoreError::Unavailable)?;
        backend.set_item(key, raw)
    }
}
