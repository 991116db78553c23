//! JSON-file property store.
//!
//! A single JSON document holding every scope's properties:
//!
//! ```json
//! { "freenode": { "karma.terms.pizza": "{\"term\":\"pizza\",...}" } }
//! ```
//!
//! The image lives in memory behind a lock and is rewritten on every
//! write. Plenty for a chat bot's karma ledger; anything bigger belongs in
//! a real property service behind the same trait.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::store::{PropertyStore, Scope, StoreError};

type Image = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    image: RwLock<Image>,
}

impl FileStore {
    /// Open an existing store file, or start with an empty image if the
    /// file does not exist yet.
    pub fn open(path: &Path) -> Result<FileStore, StoreError> {
        let image = if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(|err| StoreError::Read {
                key: path.display().to_string(),
                reason: err.to_string(),
            })?;
            serde_json::from_str(&contents).map_err(|err| StoreError::Corrupt {
                key: path.display().to_string(),
                source: err,
            })?
        } else {
            Image::new()
        };
        Ok(FileStore {
            path: path.to_path_buf(),
            image: RwLock::new(image),
        })
    }

    fn persist(&self, image: &Image) -> Result<(), StoreError> {
        let contents =
            serde_json::to_string_pretty(image).map_err(|err| StoreError::Write {
                key: self.path.display().to_string(),
                reason: err.to_string(),
            })?;
        std::fs::write(&self.path, contents).map_err(|err| StoreError::Write {
            key: self.path.display().to_string(),
            reason: err.to_string(),
        })
    }
}

#[async_trait]
impl PropertyStore for FileStore {
    async fn get_property(&self, key: &str, scope: &Scope) -> Result<Option<String>, StoreError> {
        let image = self.image.read();
        Ok(image
            .get(scope.network_name())
            .and_then(|bucket| bucket.get(key))
            .cloned())
    }

    async fn set_property(&self, key: &str, value: &str, scope: &Scope) -> Result<(), StoreError> {
        let mut image = self.image.write();
        image
            .entry(scope.network_name().to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self.persist(&image)
    }

    async fn property_keys(&self, prefix: &str, scope: &Scope) -> Result<Vec<String>, StoreError> {
        let namespace = format!("{prefix}.");
        let image = self.image.read();
        Ok(image
            .get(scope.network_name())
            .map(|bucket| {
                bucket
                    .keys()
                    .filter_map(|key| key.strip_prefix(&namespace))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }
}
