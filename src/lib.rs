//! Rebuild the chain of API calls that created a machine-learning resource.
//!
//! [`chain::Resolver`] walks a resource's lineage through a
//! [`resource::ResourceFetcher`], [`extract`] recovers the non-default
//! arguments of every ancestor, and [`render`] writes the calls out as a
//! replayable script.

pub mod api;
pub mod call;
pub mod chain;
pub mod config;
pub mod diff;
pub mod error;
pub mod extract;
pub mod render;
pub mod resource;

pub use chain::{CacheMode, Chain, ResolveOptions, Resolver};
pub use error::ReifyError;
