//! Resource identifiers
//!
//! Every resource held by the service is addressed as `<type>/<token>`, where
//! the token is a 24 character lowercase hexadecimal string. The type prefix
//! determines which lineage rules apply to the resource.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of the opaque token that follows the type prefix
const TOKEN_LENGTH: usize = 24;

/// Resource types the lineage walker knows how to reify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Source,
    Dataset,
    Model,
    Ensemble,
    Cluster,
    Anomaly,
    Prediction,
    Centroid,
    AnomalyScore,
    Evaluation,
    BatchPrediction,
    BatchCentroid,
    BatchAnomalyScore,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 13] = [
        Self::Source,
        Self::Dataset,
        Self::Model,
        Self::Ensemble,
        Self::Cluster,
        Self::Anomaly,
        Self::Prediction,
        Self::Centroid,
        Self::AnomalyScore,
        Self::Evaluation,
        Self::BatchPrediction,
        Self::BatchCentroid,
        Self::BatchAnomalyScore,
    ];

    /// Prefix used in resource ids and API method names
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Dataset => "dataset",
            Self::Model => "model",
            Self::Ensemble => "ensemble",
            Self::Cluster => "cluster",
            Self::Anomaly => "anomaly",
            Self::Prediction => "prediction",
            Self::Centroid => "centroid",
            Self::AnomalyScore => "anomalyscore",
            Self::Evaluation => "evaluation",
            Self::BatchPrediction => "batchprediction",
            Self::BatchCentroid => "batchcentroid",
            Self::BatchAnomalyScore => "batchanomalyscore",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == prefix)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a string could not be read as a resource id
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("'{0}' is not a resource id")]
    Malformed(String),
    #[error("unsupported resource type '{0}'")]
    UnknownKind(String),
}

/// A validated `<type>/<token>` resource reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    kind: ResourceKind,
    token: String,
}

impl ResourceId {
    pub fn new(kind: ResourceKind, token: &str) -> Result<Self, IdError> {
        if !is_valid_token(token) {
            return Err(IdError::Malformed(format!("{}/{}", kind, token)));
        }
        Ok(Self {
            kind,
            token: token.to_string(),
        })
    }

    /// Parse a resource id. Anything that is not `<word>/<24 hex chars>` is
    /// malformed; a well-formed id with an unsupported prefix is reported
    /// separately so callers can tell garbage from unknown types.
    pub fn parse(raw: &str) -> Result<Self, IdError> {
        let raw = raw.trim();
        let Some((prefix, token)) = raw.split_once('/') else {
            return Err(IdError::Malformed(raw.to_string()));
        };

        if prefix.is_empty()
            || !prefix.chars().all(|c| c.is_ascii_lowercase())
            || !is_valid_token(token)
        {
            return Err(IdError::Malformed(raw.to_string()));
        }

        let kind =
            ResourceKind::from_prefix(prefix).ok_or_else(|| IdError::UnknownKind(prefix.to_string()))?;

        Ok(Self {
            kind,
            token: token.to_string(),
        })
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// File-system friendly key, e.g. `dataset_5143a51a37203f2cf7000972`
    pub fn storage_key(&self) -> String {
        format!("{}_{}", self.kind, self.token)
    }
}

fn is_valid_token(token: &str) -> bool {
    token.len() == TOKEN_LENGTH && token.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.token)
    }
}

impl FromStr for ResourceId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ResourceId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_id() {
        let id = ResourceId::parse("dataset/5143a51a37203f2cf7000972").unwrap();
        assert_eq!(id.kind(), ResourceKind::Dataset);
        assert_eq!(id.token(), "5143a51a37203f2cf7000972");
        assert_eq!(id.to_string(), "dataset/5143a51a37203f2cf7000972");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(ResourceId::parse("iris.csv"), Err(IdError::Malformed(_))));
        assert!(matches!(
            ResourceId::parse("dataset/xyz"),
            Err(IdError::Malformed(_))
        ));
        assert!(matches!(
            ResourceId::parse("dataset/5143A51A37203F2CF7000972"),
            Err(IdError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_unknown_kind() {
        assert_eq!(
            ResourceId::parse("project/5143a51a37203f2cf7000972"),
            Err(IdError::UnknownKind("project".to_string()))
        );
    }

    #[test]
    fn test_storage_key() {
        let id = ResourceId::parse("batchcentroid/5143a51a37203f2cf7000972").unwrap();
        assert_eq!(id.storage_key(), "batchcentroid_5143a51a37203f2cf7000972");
    }

    #[test]
    fn test_every_kind_round_trips_through_prefix() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_prefix(kind.as_str()), Some(kind));
        }
    }
}
