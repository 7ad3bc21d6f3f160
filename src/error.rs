use crate::resource::{FetchError, ResourceId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReifyError {
    /// A resource in the lineage no longer exists. Lineage breakage is not
    /// transient, so this ends the run.
    #[error(
        "We could not reify the resource. Failed to find information for {0} in the creation chain."
    )]
    MissingResource(ResourceId),

    #[error(transparent)]
    Fetch(FetchError),

    #[error("{id} cannot be reified: {reason}")]
    MalformedResource { id: String, reason: String },

    #[error("Unsupported resource type '{0}'")]
    UnsupportedType(String),

    #[error("Unknown output language '{0}'")]
    UnknownLanguage(String),
}

impl ReifyError {
    pub fn malformed(id: &ResourceId, reason: impl Into<String>) -> Self {
        Self::MalformedResource {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<FetchError> for ReifyError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NotFound(id) => ReifyError::MissingResource(id),
            other => ReifyError::Fetch(other),
        }
    }
}
