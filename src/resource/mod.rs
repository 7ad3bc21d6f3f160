//! Resource abstraction layer
//!
//! Typed resource ids, the per-type default tables the diff utilities work
//! against, field metadata, and the fetch interface the lineage walker reads
//! snapshots through.
//!
//! # Architecture
//!
//! - [`id`] - `<type>/<token>` ids and the closed set of resource types
//! - [`defaults`] - Loads versioned default and origin-key tables from embedded JSON
//! - [`fields`] - Field id → column metadata
//! - [`fetcher`] - Fetch interface and JSON lookup helpers
//!
//! # Default Tables
//!
//! Tables are defined in JSON files under `src/resources/`:
//! - `common.json` - Attributes every resource type shares (category, tags, ...)
//! - `models.json` - Sources, datasets and model-family resources
//! - `predictions.json` - Predictions, scores, evaluations and batch resources

pub mod defaults;
pub mod fetcher;
pub mod fields;
pub mod id;

pub use defaults::{Action, DefaultSetting, DefaultTable};
pub use fetcher::{lookup, lookup_str, resource_name, FetchError, MemoryFetcher, ResourceFetcher};
pub use fields::{FieldInfo, Fields};
pub use id::{IdError, ResourceId, ResourceKind};
