//! Reconstructed API calls

use crate::diff::Options;
use crate::resource::{Action, ResourceId};
use serde::Serialize;

/// Positional argument of a create call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Argument {
    /// Another resource, e.g. the dataset a model is built from
    Resource(ResourceId),
    /// Several resources passed as a list, e.g. a model built on many datasets
    Resources(Vec<ResourceId>),
    /// Raw data location (URL or file name) a source is uploaded from
    Data(String),
}

impl Argument {
    /// Resource ids this argument refers to (none for data locations)
    pub fn resource_ids(&self) -> &[ResourceId] {
        match self {
            Self::Resource(id) => std::slice::from_ref(id),
            Self::Resources(ids) => ids,
            Self::Data(_) => &[],
        }
    }
}

/// One create or update operation with its non-default arguments
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Call {
    pub resource_id: ResourceId,
    pub action: Action,
    pub arguments: Vec<Argument>,
    pub options: Options,
}

impl Call {
    pub fn create(resource_id: &ResourceId, arguments: Vec<Argument>, options: Options) -> Self {
        Self {
            resource_id: resource_id.clone(),
            action: Action::Create,
            arguments,
            options,
        }
    }

    /// Update calls never restate creation lineage
    pub fn update(resource_id: &ResourceId, options: Options) -> Self {
        Self {
            resource_id: resource_id.clone(),
            action: Action::Update,
            arguments: Vec::new(),
            options,
        }
    }

    /// Resources this call was derived from, in argument order
    pub fn origins(&self) -> impl Iterator<Item = &ResourceId> {
        self.arguments.iter().flat_map(Argument::resource_ids)
    }
}

/// What an extractor recovered from a resource snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub arguments: Vec<Argument>,
    pub create: Options,
    pub update: Options,
}

/// A create call, followed by an update call when anything was changed
/// after creation
pub fn build_calls(resource_id: &ResourceId, extraction: Extraction) -> Vec<Call> {
    let Extraction {
        arguments,
        create,
        update,
    } = extraction;

    let mut calls = vec![Call::create(resource_id, arguments, create)];
    if !update.is_empty() {
        calls.push(Call::update(resource_id, update));
    }
    calls
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id(raw: &str) -> ResourceId {
        ResourceId::parse(raw).unwrap()
    }

    #[test]
    fn test_update_call_only_when_needed() {
        let dataset = id("dataset/5143a51a37203f2cf7000002");
        let extraction = Extraction {
            arguments: vec![Argument::Resource(id("source/5143a51a37203f2cf7000001"))],
            ..Extraction::default()
        };
        let calls = build_calls(&dataset, extraction.clone());
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].action, Action::Create);

        let mut with_update = extraction;
        with_update
            .update
            .insert("shared".to_string(), json!(true));
        let calls = build_calls(&dataset, with_update);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].action, Action::Update);
        assert_eq!(calls[1].origins().count(), 0);
    }

    #[test]
    fn test_origins_flatten_lists_and_skip_data() {
        let model = id("model/5143a51a37203f2cf7000003");
        let first = id("dataset/5143a51a37203f2cf7000001");
        let second = id("dataset/5143a51a37203f2cf7000002");
        let call = Call::create(
            &model,
            vec![
                Argument::Resources(vec![first.clone(), second.clone()]),
                Argument::Data("iris.csv".to_string()),
            ],
            Options::new(),
        );
        assert_eq!(call.origins().collect::<Vec<_>>(), vec![&first, &second]);
    }
}
