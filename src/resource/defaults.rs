//! Default Tables - Load per-type defaults and lineage keys from JSON
//!
//! The service fills in a default for every creation argument a user leaves
//! out. Reifying a resource means bringing over only the arguments that
//! differ from those defaults, so each resource type carries a table of
//! attribute → accepted default values, split by the phase (create or
//! update) in which the argument is sent.
//!
//! Tables are versioned per type. They mirror the service's defaults at
//! that version and have to be kept in step with it: a stale entry makes
//! a default look like user intent.

use super::id::ResourceKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::OnceLock;

/// Embedded table files (compiled into the binary)
const DEFAULT_FILES: &[&str] = &[
    include_str!("../resources/common.json"),
    include_str!("../resources/models.json"),
    include_str!("../resources/predictions.json"),
];

/// API operation an argument belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default definition for a single attribute
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultSetting {
    /// Any of these values means the user did not set the attribute
    #[serde(rename = "default")]
    pub values: Vec<Value>,
    /// Location of the attribute inside the resource, for compound
    /// attributes such as `source_parser.header`
    #[serde(default)]
    pub path: Option<Vec<String>>,
}

impl DefaultSetting {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values, path: None }
    }

    /// Lookup path for `attribute`, which is also where a non-default value
    /// is written back in the options
    pub fn lookup_path<'a>(&'a self, attribute: &'a str) -> Vec<&'a str> {
        match &self.path {
            Some(path) => path.iter().map(String::as_str).collect(),
            None => vec![attribute],
        }
    }
}

pub type DefaultTable = BTreeMap<String, DefaultSetting>;

/// Tables for one resource type
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDefaults {
    pub version: String,
    /// Keys holding the origin resource ids, tried in order. A group with
    /// two keys names the two origins of a two-origin resource.
    #[serde(default)]
    pub origins: Vec<Vec<String>>,
    #[serde(default)]
    pub create: DefaultTable,
    #[serde(default)]
    pub update: DefaultTable,
}

impl ResourceDefaults {
    pub fn table(&self, action: Action) -> &DefaultTable {
        match action {
            Action::Create => &self.create,
            Action::Update => &self.update,
        }
    }
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub common: Option<ResourceDefaults>,
    #[serde(default)]
    pub resources: HashMap<ResourceKind, ResourceDefaults>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<DefaultsConfig> = OnceLock::new();

/// Get the defaults registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static DefaultsConfig {
    REGISTRY.get_or_init(|| {
        let mut final_config = DefaultsConfig {
            common: None,
            resources: HashMap::new(),
        };

        for content in DEFAULT_FILES {
            let partial: DefaultsConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded defaults JSON: {}", e));
            if partial.common.is_some() {
                final_config.common = partial.common;
            }
            final_config.resources.extend(partial.resources);
        }

        final_config
    })
}

/// Tables for a resource type
pub fn resource_defaults(kind: ResourceKind) -> Option<&'static ResourceDefaults> {
    get_registry().resources.get(&kind)
}

static EMPTY_TABLE: OnceLock<DefaultTable> = OnceLock::new();

fn empty_table() -> &'static DefaultTable {
    EMPTY_TABLE.get_or_init(BTreeMap::new)
}

/// Type-specific defaults for one phase (empty when the type has none)
pub fn defaults_for(kind: ResourceKind, action: Action) -> &'static DefaultTable {
    resource_defaults(kind)
        .map(|defaults| defaults.table(action))
        .unwrap_or_else(empty_table)
}

/// Defaults shared by every resource type (category, tags, ...)
pub fn common_defaults(action: Action) -> &'static DefaultTable {
    get_registry()
        .common
        .as_ref()
        .map(|defaults| defaults.table(action))
        .unwrap_or_else(empty_table)
}

/// Origin key groups for a resource type
pub fn origin_keys(kind: ResourceKind) -> &'static [Vec<String>] {
    resource_defaults(kind)
        .map(|defaults| defaults.origins.as_slice())
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_loads_successfully() {
        let registry = get_registry();
        assert!(registry.common.is_some(), "Common defaults should exist");
        assert!(
            !registry.resources.is_empty(),
            "Registry should have resource tables"
        );
    }

    #[test]
    fn test_every_kind_has_a_versioned_table() {
        for kind in ResourceKind::ALL {
            let defaults = resource_defaults(kind);
            assert!(defaults.is_some(), "{} should have defaults", kind);
            assert!(
                !defaults.unwrap().version.is_empty(),
                "{} defaults should carry a version",
                kind
            );
        }
    }

    #[test]
    fn test_only_sources_have_no_origins() {
        for kind in ResourceKind::ALL {
            let keys = origin_keys(kind);
            if kind == ResourceKind::Source {
                assert!(keys.is_empty());
            } else {
                assert!(!keys.is_empty(), "{} should declare origin keys", kind);
            }
        }
    }

    #[test]
    fn test_two_origin_types_declare_pairs() {
        for kind in [
            ResourceKind::Evaluation,
            ResourceKind::BatchPrediction,
            ResourceKind::BatchCentroid,
            ResourceKind::BatchAnomalyScore,
        ] {
            assert!(origin_keys(kind).iter().all(|group| group.len() == 2));
        }
    }

    #[test]
    fn test_ensemble_replacement_default_is_opposite_of_model() {
        let model = &defaults_for(ResourceKind::Model, Action::Create)["replacement"];
        let ensemble = &defaults_for(ResourceKind::Ensemble, Action::Create)["replacement"];
        assert_eq!(model.values[0], Value::Bool(false));
        assert_eq!(ensemble.values[0], Value::Bool(true));
    }

    #[test]
    fn test_compound_lookup_path() {
        let header = &defaults_for(ResourceKind::Source, Action::Update)["header"];
        assert_eq!(header.lookup_path("header"), vec!["source_parser", "header"]);
        let tags = &common_defaults(Action::Create)["tags"];
        assert_eq!(tags.lookup_path("tags"), vec!["tags"]);
    }
}
