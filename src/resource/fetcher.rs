//! Resource Fetcher
//!
//! Interface through which the lineage walker reads resource snapshots,
//! plus small JSON lookup helpers shared by the extractors.

use super::id::ResourceId;
use serde_json::Value;
use std::collections::HashMap;

/// Why a resource snapshot could not be read
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("resource {0} not found")]
    NotFound(ResourceId),
    #[error("failed to fetch {id}: {message}")]
    Failed { id: ResourceId, message: String },
}

impl FetchError {
    pub fn failed(id: &ResourceId, error: &anyhow::Error) -> Self {
        Self::Failed {
            id: id.clone(),
            message: format!("{:#}", error),
        }
    }
}

/// Source of full JSON snapshots, keyed by resource id
#[allow(async_fn_in_trait)]
pub trait ResourceFetcher {
    /// Read a resource. Implementations ask for the full field structure
    /// but leave out heavy derived artifacts (model trees).
    async fn fetch(&self, id: &ResourceId) -> Result<Value, FetchError>;

    /// Drop a locally stored copy of `id` written during this run.
    /// Best effort: failures are swallowed.
    fn evict(&self, _id: &ResourceId) {}
}

/// Fetcher over a fixed set of snapshots, for offline replays and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    resources: HashMap<ResourceId, Value>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a snapshot under the id stored in its `resource` attribute
    pub fn insert(&mut self, resource: Value) -> Option<ResourceId> {
        let id = lookup_str(&resource, &["resource"]).and_then(|raw| ResourceId::parse(raw).ok())?;
        self.resources.insert(id.clone(), resource);
        Some(id)
    }

    pub fn with(mut self, resource: Value) -> Self {
        self.insert(resource);
        self
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl ResourceFetcher for MemoryFetcher {
    async fn fetch(&self, id: &ResourceId) -> Result<Value, FetchError> {
        self.resources
            .get(id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(id.clone()))
    }
}

/// Walk a JSON value along `path` (object keys or array indexes)
pub fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;

    for part in path {
        // Handle array index
        current = if let Ok(idx) = part.parse::<usize>() {
            current.get(idx)?
        } else {
            current.get(*part)?
        };
    }

    Some(current)
}

pub fn lookup_str<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    lookup(value, path).and_then(|v| v.as_str())
}

/// Display name of a resource, empty when unnamed
pub fn resource_name(resource: &Value) -> &str {
    lookup_str(resource, &["name"]).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_nested_and_indexed() {
        let value = json!({"source_parser": {"missing_tokens": ["NA", "N/A"]}});
        assert_eq!(
            lookup(&value, &["source_parser", "missing_tokens", "1"]),
            Some(&json!("N/A"))
        );
        assert_eq!(lookup(&value, &["source_parser", "header"]), None);
    }

    #[test]
    fn test_memory_fetcher_not_found() {
        let fetcher = MemoryFetcher::new().with(json!({
            "resource": "source/5143a51a37203f2cf7000001",
            "name": "iris.csv"
        }));
        assert_eq!(fetcher.len(), 1);

        let missing = ResourceId::parse("source/5143a51a37203f2cf7000002").unwrap();
        let result = tokio_test::block_on(fetcher.fetch(&missing));
        assert!(matches!(result, Err(FetchError::NotFound(_))));
    }
}
