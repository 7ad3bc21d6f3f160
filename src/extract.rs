//! Per-type extractors
//!
//! Each resource type records its lineage and its creation arguments in its
//! own way. An extractor reads one snapshot, plus the snapshots of the
//! resources it is compared against, and recovers the positional arguments
//! and the non-default create and update options of the calls that built it.

use crate::call::{Argument, Extraction};
use crate::diff::{
    default_setting, merge_options, non_automatic_name, non_default_opts, non_inherited_opts,
    values_equal, Options,
};
use crate::error::ReifyError;
use crate::resource::defaults::{common_defaults, defaults_for, origin_keys};
use crate::resource::{
    lookup, lookup_str, resource_name, Action, DefaultSetting, Fields, ResourceFetcher,
    ResourceId, ResourceKind,
};
use serde_json::{json, Value};
use std::cell::RefCell;

/// Positional data for sources uploaded inline, which keep no location
const INLINE_DATA: &str = "UNKNOWN-INLINE-DATA";

/// Suffixes the service appends to the origin's name when naming a dataset
const DATASET_NAME_SUFFIXES: &[&str] = &[
    "filtered",
    "sampled",
    "dataset",
    "extended",
    "- batchprediction",
    "- batchanomalyscore",
    "- batchcentroid",
    "- merged",
];

/// Output column names a batch resource may rename
const PREDICTION_COLUMNS: &[&str] = &["prediction_name", "centroid_name"];
const CENTROID_COLUMNS: &[&str] = &["distance_name"];
const NO_COLUMNS: &[&str] = &[];

/// Lineage reference of a single-origin resource
#[derive(Debug, Clone, PartialEq)]
pub struct Origin {
    /// Attribute the reference was read from
    pub key: &'static str,
    /// Reference as it is passed to the create call
    pub argument: Argument,
    /// First referenced resource, the one options are compared against
    pub parent: ResourceId,
}

/// Read the origin of `resource` using the first origin key it stores
pub fn origin(id: &ResourceId, resource: &Value) -> Result<Origin, ReifyError> {
    for group in origin_keys(id.kind()) {
        let [key] = group.as_slice() else {
            continue;
        };
        let Some(value) = resource.get(key.as_str()) else {
            continue;
        };
        match parse_reference(id, value)? {
            Some(Argument::Resource(parent)) => {
                return Ok(Origin {
                    key: key.as_str(),
                    argument: Argument::Resource(parent.clone()),
                    parent,
                })
            }
            Some(Argument::Resources(ids)) => {
                if let Some(parent) = ids.first().cloned() {
                    return Ok(Origin {
                        key: key.as_str(),
                        argument: Argument::Resources(ids),
                        parent,
                    });
                }
            }
            _ => {}
        }
    }

    Err(ReifyError::malformed(id, "no origin resource recorded"))
}

/// Read the two origins (model-like resource, dataset) of an evaluation or
/// batch resource
pub fn origin_pair(id: &ResourceId, resource: &Value) -> Result<(ResourceId, ResourceId), ReifyError> {
    for group in origin_keys(id.kind()) {
        let [first, second] = group.as_slice() else {
            continue;
        };
        let first = single_reference(id, resource.get(first.as_str()))?;
        let second = single_reference(id, resource.get(second.as_str()))?;
        if let (Some(first), Some(second)) = (first, second) {
            return Ok((first, second));
        }
    }

    Err(ReifyError::malformed(id, "no origin resources recorded"))
}

/// Dataset a resource was computed from. Two-origin resources name it as
/// their second origin.
pub fn referred_dataset(id: &ResourceId, resource: &Value) -> Result<ResourceId, ReifyError> {
    if origin_keys(id.kind()).iter().any(|group| group.len() == 2) {
        origin_pair(id, resource).map(|(_, dataset)| dataset)
    } else {
        origin(id, resource).map(|origin| origin.parent)
    }
}

/// An id string, or a list of them; a one-element list is a single id
fn parse_reference(owner: &ResourceId, value: &Value) -> Result<Option<Argument>, ReifyError> {
    match value {
        Value::Null => Ok(None),
        Value::String(raw) if raw.is_empty() => Ok(None),
        Value::String(raw) => parse_id(owner, raw).map(|id| Some(Argument::Resource(id))),
        Value::Array(items) => {
            let mut ids = items
                .iter()
                .map(|item| {
                    item.as_str()
                        .ok_or_else(|| ReifyError::malformed(owner, "lineage list holds a non-string id"))
                        .and_then(|raw| parse_id(owner, raw))
                })
                .collect::<Result<Vec<_>, _>>()?;

            Ok(match ids.len() {
                0 => None,
                1 => ids.pop().map(Argument::Resource),
                _ => Some(Argument::Resources(ids)),
            })
        }
        other => Err(ReifyError::malformed(
            owner,
            format!("unexpected lineage value {}", other),
        )),
    }
}

fn single_reference(owner: &ResourceId, value: Option<&Value>) -> Result<Option<ResourceId>, ReifyError> {
    let Some(value) = value else {
        return Ok(None);
    };
    Ok(match parse_reference(owner, value)? {
        Some(Argument::Resource(id)) => Some(id),
        Some(Argument::Resources(ids)) => ids.into_iter().next(),
        _ => None,
    })
}

fn parse_id(owner: &ResourceId, raw: &str) -> Result<ResourceId, ReifyError> {
    ResourceId::parse(raw).map_err(|e| ReifyError::malformed(owner, e.to_string()))
}

/// Copy a stored attribute into the options unless it is null
fn copy_option(resource: &Value, key: &str, options: &mut Options) {
    if let Some(value) = lookup(resource, &[key]).filter(|value| !value.is_null()) {
        options.insert(key.to_string(), value.clone());
    }
}

/// Name without its last extension: `iris.csv` → `iris`, `iris` → ``
fn name_stem(name: &str) -> &str {
    name.rsplit_once('.').map_or("", |(stem, _)| stem)
}

/// Centroid number as shown in generated names (ids are hexadecimal)
fn centroid_index(resource: &Value) -> u64 {
    lookup_str(resource, &["centroid"])
        .and_then(|centroid| u64::from_str_radix(centroid, 16).ok())
        .unwrap_or(0)
}

/// Field metadata of a resource; models keep theirs under `model`
fn resource_fields(resource: &Value) -> Fields {
    let fields = Fields::from_resource(resource);
    if fields.is_empty() {
        if let Some(model) = resource.get("model") {
            return Fields::from_resource(model);
        }
    }
    fields
}

/// Generated field descriptors are created with `field`, stored as `generator`
fn rename_generator(descriptor: &Value) -> Value {
    let mut descriptor = descriptor.clone();
    if let Some(map) = descriptor.as_object_mut() {
        if let Some(generator) = map.remove("generator") {
            map.insert("field".to_string(), generator);
        }
    }
    descriptor
}

fn update_opts(child: &Value, kind: ResourceKind) -> Options {
    let mut update = non_default_opts(child, defaults_for(kind, Action::Update));
    merge_options(&mut update, non_default_opts(child, common_defaults(Action::Update)));
    update
}

/// Row range, unless it covers every row of the referrer
pub fn range_opts(child: &Value, referrer: &Value) -> Options {
    let mut options = Options::new();
    let Some(range) = lookup(child, &["range"]) else {
        return options;
    };

    match range {
        Value::Null => return options,
        Value::Array(bounds) if bounds.is_empty() => return options,
        _ => {}
    }

    if let Some(rows) = lookup(referrer, &["rows"]) {
        if values_equal(range, &Value::Array(vec![json!(1), rows.clone()])) {
            return options;
        }
    }

    options.insert("range".to_string(), range.clone());
    options
}

/// Non-inherited common options and non-default dataset options
pub fn common_dataset_opts(child: &Value, referrer: &Value) -> Options {
    let mut create = non_inherited_opts(child, referrer, common_defaults(Action::Create));
    merge_options(
        &mut create,
        non_default_opts(child, defaults_for(ResourceKind::Dataset, Action::Create)),
    );
    create
}

/// Create and update options shared by models, ensembles, clusters and
/// anomaly detectors
pub fn common_model_opts(child: &Value, referrer: &Value, kind: ResourceKind) -> (Options, Options) {
    let mut create = non_inherited_opts(child, referrer, common_defaults(Action::Create));
    merge_options(&mut create, non_default_opts(child, defaults_for(kind, Action::Create)));

    let stored: Option<Vec<&str>> = lookup(child, &["input_fields"])
        .and_then(Value::as_array)
        .map(|fields| fields.iter().filter_map(Value::as_str).collect());
    let referrer_fields = Fields::from_resource(referrer);

    if let Some(stored) = stored.filter(|_| !referrer_fields.is_empty()) {
        let objective = lookup_str(child, &["objective_field"]);
        let mut default: Vec<&str> = referrer_fields
            .preferred()
            .map(|(field_id, _)| field_id)
            .filter(|field_id| Some(*field_id) != objective)
            .collect();
        default.sort_unstable();

        let mut sorted = stored.clone();
        sorted.sort_unstable();
        if sorted != default {
            create.insert("input_fields".to_string(), json!(stored));
        }
    }

    merge_options(&mut create, range_opts(child, referrer));
    (create, update_opts(child, kind))
}

/// `fields_map`, unless it maps every dataset field to itself
fn fields_map_opts(child: &Value, dataset: &Value) -> Options {
    let identity = Fields::from_resource(dataset).identity_map();
    let setting = DefaultSetting::new(vec![identity, json!({}), Value::Null]);
    default_setting(child, "fields_map", &setting)
}

/// Options shared by batch predictions, centroids and anomaly scores
pub fn common_batch_opts(child: &Value, model: &Value, dataset: &Value, kind: ResourceKind) -> Options {
    let mut create = non_inherited_opts(child, model, common_defaults(Action::Create));
    merge_options(&mut create, non_default_opts(child, defaults_for(kind, Action::Create)));
    merge_options(&mut create, fields_map_opts(child, dataset));
    create
}

fn input_data(child: &Value) -> Value {
    lookup(child, &["input_data"])
        .filter(|value| !value.is_null())
        .cloned()
        .unwrap_or_else(|| json!({}))
}

/// Options a model contributes, shared with the ensembles built from it
struct ModelInspection {
    create: Options,
    update: Options,
}

/// Reads resource snapshots through a fetcher and extracts their calls
pub struct Extractor<'a, F> {
    fetcher: &'a F,
    add_fields: bool,
    /// Every id read so far, in first-read order
    fetched: RefCell<Vec<ResourceId>>,
}

impl<'a, F: ResourceFetcher> Extractor<'a, F> {
    /// `add_fields` carries field name/optype/label edits of sources over
    /// as update options
    pub fn new(fetcher: &'a F, add_fields: bool) -> Self {
        Self {
            fetcher,
            add_fields,
            fetched: RefCell::new(Vec::new()),
        }
    }

    /// Ids read through the fetcher, including the ones that were only
    /// compared against (ensemble members, inspected models)
    pub fn fetched(&self) -> Vec<ResourceId> {
        self.fetched.borrow().clone()
    }

    pub async fn extract(&self, id: &ResourceId) -> Result<Extraction, ReifyError> {
        match id.kind() {
            ResourceKind::Source => self.source(id).await,
            ResourceKind::Dataset => self.dataset(id).await,
            ResourceKind::Model => self.model(id).await,
            ResourceKind::Ensemble => self.ensemble(id).await,
            ResourceKind::Cluster => self.cluster(id).await,
            ResourceKind::Anomaly => self.anomaly(id).await,
            ResourceKind::Prediction => self.prediction(id).await,
            ResourceKind::Centroid => self.centroid(id).await,
            ResourceKind::AnomalyScore => self.anomaly_score(id).await,
            ResourceKind::Evaluation => self.evaluation(id).await,
            ResourceKind::BatchPrediction
            | ResourceKind::BatchCentroid
            | ResourceKind::BatchAnomalyScore => self.batch(id).await,
        }
    }

    async fn get(&self, id: &ResourceId) -> Result<Value, ReifyError> {
        {
            let mut fetched = self.fetched.borrow_mut();
            if !fetched.contains(id) {
                fetched.push(id.clone());
            }
        }
        Ok(self.fetcher.fetch(id).await?)
    }

    async fn source(&self, id: &ResourceId) -> Result<Extraction, ReifyError> {
        let child = self.get(id).await?;
        let file_name = lookup_str(&child, &["file_name"]).filter(|name| !name.is_empty());

        let mut create = non_default_opts(&child, common_defaults(Action::Create));
        for (attribute, setting) in defaults_for(ResourceKind::Source, Action::Create) {
            let mut setting = setting.clone();
            // Uploads are named after the uploaded file
            if attribute == "name" {
                if let Some(file_name) = file_name {
                    setting.values.push(json!(file_name));
                }
            }
            merge_options(&mut create, default_setting(&child, attribute, &setting));
        }

        let data = lookup_str(&child, &["remote"])
            .filter(|remote| !remote.is_empty())
            .or(file_name)
            .unwrap_or(INLINE_DATA);

        let mut update = update_opts(&child, ResourceKind::Source);
        if self.add_fields {
            let changes = Fields::from_resource(&child).changes();
            if !changes.is_empty() {
                update.insert("fields".to_string(), Value::Object(changes));
            }
        }

        Ok(Extraction {
            arguments: vec![Argument::Data(data.to_string())],
            create,
            update,
        })
    }

    async fn dataset(&self, id: &ResourceId) -> Result<Extraction, ReifyError> {
        let child = self.get(id).await?;
        let origin = origin(id, &child)?;
        let parent = self.get(&origin.parent).await?;
        let mut create = Options::new();

        // Datasets built from clusters or batch resources are compared with
        // the dataset those were computed from
        let grandparent = match origin.key {
            "cluster" | "origin_batch_resource" => {
                if origin.key == "cluster" {
                    copy_option(&child, "centroid", &mut create);
                }
                let dataset = referred_dataset(&origin.parent, &parent)?;
                self.get(&dataset).await?
            }
            _ => parent.clone(),
        };

        merge_options(&mut create, common_dataset_opts(&child, &grandparent));

        let grandparent_name = resource_name(&grandparent);
        let parent_name = resource_name(&parent);
        let stem = name_stem(parent_name);
        let mut templates = vec![String::new()];
        templates.extend(
            DATASET_NAME_SUFFIXES
                .iter()
                .map(|suffix| format!("{} {}", grandparent_name, suffix)),
        );
        templates.push(format!("{}'s dataset", stem));
        templates.push(format!("{}' dataset", stem));
        templates.push(format!("Cluster {} - {}", centroid_index(&child), parent_name));
        templates.push(format!("Dataset from {} model - segment", parent_name));
        merge_options(&mut create, non_automatic_name(&child, &templates));

        // The service picks the last preferred column as objective
        let fields = Fields::from_resource(&child);
        if let Some(objective) = lookup_str(&child, &["objective_field", "id"]) {
            let column = fields.get(objective).map(|field| field.column_number);
            if column.is_some() && column != fields.last_preferred_column() {
                create.insert("objective_field".to_string(), json!({ "id": objective }));
            }
        }

        if origin.parent.kind() == ResourceKind::Source {
            if let Some(size) = lookup(&child, &["size"]).filter(|size| !size.is_null()) {
                let inherited = lookup(&grandparent, &["size"]);
                if !inherited.is_some_and(|inherited| values_equal(size, inherited)) {
                    create.insert("size".to_string(), size.clone());
                }
            }
        }

        if let Some(Value::Array(new_fields)) = lookup(&child, &["new_fields"]) {
            if !new_fields.is_empty() {
                create.insert(
                    "new_fields".to_string(),
                    Value::Array(new_fields.iter().map(rename_generator).collect()),
                );
            }
        }

        merge_options(&mut create, range_opts(&child, &grandparent));

        Ok(Extraction {
            arguments: vec![origin.argument],
            create,
            update: update_opts(&child, ResourceKind::Dataset),
        })
    }

    async fn inspect_model(&self, id: &ResourceId) -> Result<(Origin, ModelInspection), ReifyError> {
        let child = self.get(id).await?;
        let origin = origin(id, &child)?;
        let parent = self.get(&origin.parent).await?;
        let mut create = Options::new();

        let grandparent = if origin.key == "cluster" {
            copy_option(&child, "centroid", &mut create);
            let dataset = referred_dataset(&origin.parent, &parent)?;
            self.get(&dataset).await?
        } else {
            if let Some(objective) = lookup_str(&child, &["objective_field"]) {
                if lookup_str(&parent, &["objective_field", "id"]) != Some(objective) {
                    create.insert("objective_field".to_string(), json!(objective));
                }
            }
            parent.clone()
        };

        // The service tags models with their objective field name
        let mut tagged = child.clone();
        let objective_name = lookup_str(&child, &["objective_field_name"])
            .map(str::to_string)
            .or_else(|| {
                lookup_str(&child, &["objective_field"]).and_then(|objective| {
                    resource_fields(&child).get(objective).map(|field| field.name.clone())
                })
            });
        if let (Some(name), Some(Value::Array(tags))) = (objective_name, tagged.get_mut("tags")) {
            tags.retain(|tag| tag.as_str() != Some(name.as_str()));
        }

        let (common_create, update) = common_model_opts(&tagged, &grandparent, id.kind());
        merge_options(&mut create, common_create);

        let templates = [
            String::new(),
            format!("{} model", resource_name(&grandparent)),
            format!("Cluster {} - {}", centroid_index(&child), resource_name(&parent)),
        ];
        merge_options(&mut create, non_automatic_name(&child, &templates));

        if lookup(&child, &["randomize"]).and_then(Value::as_bool) == Some(true) {
            let input_count = lookup(&child, &["input_fields"])
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            let candidates = (input_count as f64).sqrt().floor() as u64;
            let setting = DefaultSetting::new(vec![json!(candidates)]);
            merge_options(&mut create, default_setting(&child, "random_candidates", &setting));
        }

        Ok((origin, ModelInspection { create, update }))
    }

    async fn model(&self, id: &ResourceId) -> Result<Extraction, ReifyError> {
        let (origin, inspection) = self.inspect_model(id).await?;
        Ok(Extraction {
            arguments: vec![origin.argument],
            create: inspection.create,
            update: inspection.update,
        })
    }

    async fn ensemble(&self, id: &ResourceId) -> Result<Extraction, ReifyError> {
        let child = self.get(id).await?;
        let origin = origin(id, &child)?;

        // Model arguments are read from the first member model
        let first_model = lookup_str(&child, &["models", "0"])
            .ok_or_else(|| ReifyError::malformed(id, "ensemble lists no models"))?;
        let model_id = parse_id(id, first_model)?;
        let (_, inspection) = self.inspect_model(&model_id).await?;

        let mut create = inspection.create;
        create.remove("replacement");
        create.remove("name");
        merge_options(
            &mut create,
            non_default_opts(&child, defaults_for(ResourceKind::Ensemble, Action::Create)),
        );

        let dataset = self.get(&origin.parent).await?;
        let dataset_name = resource_name(&dataset);
        let templates = [
            String::new(),
            format!("{} ensemble", dataset_name),
            format!("{} model", dataset_name),
        ];
        merge_options(&mut create, non_automatic_name(&child, &templates));

        Ok(Extraction {
            arguments: vec![origin.argument],
            create,
            update: update_opts(&child, ResourceKind::Ensemble),
        })
    }

    async fn cluster(&self, id: &ResourceId) -> Result<Extraction, ReifyError> {
        let child = self.get(id).await?;
        let origin = origin(id, &child)?;
        let parent = self.get(&origin.parent).await?;

        let (mut create, update) = common_model_opts(&child, &parent, ResourceKind::Cluster);
        // k is computed by the service when a critical value is given
        if lookup(&child, &["critical_value"]).map_or(true, Value::is_null) {
            copy_option(&child, "k", &mut create);
        }

        let templates = [String::new(), format!("{} cluster", resource_name(&parent))];
        merge_options(&mut create, non_automatic_name(&child, &templates));

        Ok(Extraction {
            arguments: vec![origin.argument],
            create,
            update,
        })
    }

    async fn anomaly(&self, id: &ResourceId) -> Result<Extraction, ReifyError> {
        let child = self.get(id).await?;
        let origin = origin(id, &child)?;
        let parent = self.get(&origin.parent).await?;

        let (mut create, update) = common_model_opts(&child, &parent, ResourceKind::Anomaly);
        let templates = [
            String::new(),
            format!("{} anomaly detector", resource_name(&parent)),
        ];
        merge_options(&mut create, non_automatic_name(&child, &templates));

        Ok(Extraction {
            arguments: vec![origin.argument],
            create,
            update,
        })
    }

    async fn prediction(&self, id: &ResourceId) -> Result<Extraction, ReifyError> {
        let child = self.get(id).await?;
        let origin = origin(id, &child)?;

        // Predictions from ensemble members are replayed against the ensemble
        let (parent_id, parent) = if origin.key == "models" {
            let model = self.get(&origin.parent).await?;
            match ensemble_of(&origin.parent, &model)? {
                Some(ensemble_id) => {
                    let ensemble = self.get(&ensemble_id).await?;
                    (ensemble_id, ensemble)
                }
                None => (origin.parent, model),
            }
        } else {
            let parent = self.get(&origin.parent).await?;
            (origin.parent, parent)
        };

        let mut create = non_inherited_opts(&child, &parent, common_defaults(Action::Create));
        merge_options(
            &mut create,
            non_default_opts(&child, defaults_for(ResourceKind::Prediction, Action::Create)),
        );
        create.insert("input_data".to_string(), input_data(&child));

        let objective = lookup_str(&child, &["objective_field_name"]).unwrap_or("");
        let templates = [String::new(), format!("Prediction for {}", objective)];
        merge_options(&mut create, non_automatic_name(&child, &templates));

        Ok(Extraction {
            arguments: vec![Argument::Resource(parent_id)],
            create,
            update: Options::new(),
        })
    }

    async fn centroid(&self, id: &ResourceId) -> Result<Extraction, ReifyError> {
        let child = self.get(id).await?;
        let origin = origin(id, &child)?;
        let parent = self.get(&origin.parent).await?;

        let mut create = non_inherited_opts(&child, &parent, common_defaults(Action::Create));
        merge_options(
            &mut create,
            non_default_opts(&child, defaults_for(ResourceKind::Centroid, Action::Create)),
        );
        create.insert("input_data".to_string(), input_data(&child));

        let templates = [String::new(), format!("Centroid for {}", resource_name(&parent))];
        merge_options(&mut create, non_automatic_name(&child, &templates));

        Ok(Extraction {
            arguments: vec![origin.argument],
            create,
            update: non_default_opts(&child, defaults_for(ResourceKind::Centroid, Action::Update)),
        })
    }

    async fn anomaly_score(&self, id: &ResourceId) -> Result<Extraction, ReifyError> {
        let child = self.get(id).await?;
        let origin = origin(id, &child)?;
        let parent = self.get(&origin.parent).await?;

        let mut create = non_inherited_opts(&child, &parent, common_defaults(Action::Create));
        create.insert("input_data".to_string(), input_data(&child));

        let templates = [String::new(), format!("Score for {}", resource_name(&parent))];
        merge_options(&mut create, non_automatic_name(&child, &templates));

        Ok(Extraction {
            arguments: vec![origin.argument],
            create,
            update: Options::new(),
        })
    }

    async fn evaluation(&self, id: &ResourceId) -> Result<Extraction, ReifyError> {
        let child = self.get(id).await?;
        let (model_id, dataset_id) = origin_pair(id, &child)?;
        let model = self.get(&model_id).await?;
        let dataset = self.get(&dataset_id).await?;

        let mut create = non_inherited_opts(&child, &model, common_defaults(Action::Create));
        merge_options(
            &mut create,
            non_default_opts(&child, defaults_for(ResourceKind::Evaluation, Action::Create)),
        );
        merge_options(&mut create, fields_map_opts(&child, &dataset));

        let templates = [
            String::new(),
            format!(
                "Evaluation of {} with {}",
                resource_name(&model),
                resource_name(&dataset)
            ),
        ];
        merge_options(&mut create, non_automatic_name(&child, &templates));
        merge_options(&mut create, range_opts(&child, &dataset));

        Ok(Extraction {
            arguments: vec![Argument::Resource(model_id), Argument::Resource(dataset_id)],
            create,
            update: Options::new(),
        })
    }

    async fn batch(&self, id: &ResourceId) -> Result<Extraction, ReifyError> {
        let child = self.get(id).await?;
        let (model_id, dataset_id) = origin_pair(id, &child)?;
        let model = self.get(&model_id).await?;
        let dataset = self.get(&dataset_id).await?;

        let mut create = common_batch_opts(&child, &model, &dataset, id.kind());

        let (label, header_names) = match id.kind() {
            ResourceKind::BatchPrediction => ("Batch Prediction", PREDICTION_COLUMNS),
            ResourceKind::BatchCentroid => ("Batch Centroid", CENTROID_COLUMNS),
            _ => ("Batch Anomaly Score", NO_COLUMNS),
        };

        // Column names only matter when the output has a header row
        let header = lookup(&child, &["header"]).and_then(Value::as_bool).unwrap_or(true);
        if header {
            let unset = DefaultSetting::new(vec![Value::Null, json!("")]);
            for name in header_names {
                merge_options(&mut create, default_setting(&child, name, &unset));
            }
        }

        let templates = [
            String::new(),
            format!(
                "{} of {} with {}",
                label,
                resource_name(&model),
                resource_name(&dataset)
            ),
        ];
        merge_options(&mut create, non_automatic_name(&child, &templates));

        Ok(Extraction {
            arguments: vec![Argument::Resource(model_id), Argument::Resource(dataset_id)],
            create,
            update: Options::new(),
        })
    }
}

/// Ensemble a model belongs to, if any. `ensemble_id` is stored either as
/// a bare token or as a full id.
fn ensemble_of(model_id: &ResourceId, model: &Value) -> Result<Option<ResourceId>, ReifyError> {
    let Some(raw) = lookup_str(model, &["ensemble_id"]).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };

    let parsed = if raw.contains('/') {
        ResourceId::parse(raw)
    } else {
        ResourceId::new(ResourceKind::Ensemble, raw)
    };
    parsed
        .map(Some)
        .map_err(|e| ReifyError::malformed(model_id, e.to_string()))
}
