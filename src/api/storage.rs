//! Local resource store
//!
//! Keeps a JSON copy of every fetched resource on disk, one file per
//! resource id, so repeated lookups of the same ancestor skip the network.
//! Only files written by this store instance can be evicted: copies that
//! were already on disk when the run started are left alone.

use crate::resource::ResourceId;
use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct ResourceStore {
    dir: PathBuf,
    created: Mutex<HashSet<ResourceId>>,
}

impl ResourceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            created: Mutex::new(HashSet::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &ResourceId) -> PathBuf {
        self.dir.join(id.storage_key())
    }

    /// Read a stored copy; unreadable or corrupt files count as misses
    pub fn load(&self, id: &ResourceId) -> Option<Value> {
        let path = self.path_for(id);
        let content = std::fs::read_to_string(&path).ok()?;

        match serde_json::from_str(&content) {
            Ok(value) => {
                tracing::debug!("Loaded {} from {:?}", id, path);
                Some(value)
            }
            Err(e) => {
                tracing::warn!("Ignoring corrupt stored copy {:?}: {}", path, e);
                None
            }
        }
    }

    /// Write a copy of `resource`
    pub fn save(&self, id: &ResourceId, resource: &Value) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create storage directory {:?}", self.dir))?;

        let path = self.path_for(id);
        let existed = path.exists();
        let content = serde_json::to_string_pretty(resource)?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to store {} in {:?}", id, path))?;

        if !existed {
            if let Ok(mut created) = self.created.lock() {
                created.insert(id.clone());
            }
        }

        Ok(())
    }

    /// Remove a copy written by this store. Failures are ignored.
    pub fn evict(&self, id: &ResourceId) {
        let owned = match self.created.lock() {
            Ok(mut created) => created.remove(id),
            Err(_) => false,
        };
        if !owned {
            return;
        }

        let path = self.path_for(id);
        if let Err(e) = std::fs::remove_file(&path) {
            tracing::debug!("Could not evict {:?}: {}", path, e);
        }
    }

    /// Number of files this store wrote and has not evicted yet
    pub fn pending(&self) -> usize {
        self.created.lock().map(|created| created.len()).unwrap_or(0)
    }
}
