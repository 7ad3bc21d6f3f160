//! Script rendering
//!
//! Turns a resolved chain into text. Each output language is a
//! [`ScriptTarget`]; resources are referred to by aliases (`dataset_1`,
//! `model_2`, ...) assigned in replay order.

use crate::call::{Argument, Call};
use crate::chain::Chain;
use crate::error::ReifyError;
use crate::resource::{Action, ResourceId, ResourceKind};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Names accepted by [`target`]
pub const LANGUAGES: &[&str] = &["python", "json"];

/// Per-run map from resource id to script variable name
#[derive(Debug, Default)]
pub struct AliasTable {
    counters: HashMap<ResourceKind, usize>,
    aliases: HashMap<ResourceId, String>,
}

impl AliasTable {
    /// Alias of `id`, assigning `<type>_<n>` on first use
    pub fn assign(&mut self, id: &ResourceId) -> &str {
        if !self.aliases.contains_key(id) {
            let counter = self.counters.entry(id.kind()).or_insert(0);
            *counter += 1;
            self.aliases
                .insert(id.clone(), format!("{}_{}", id.kind(), counter));
        }
        self.aliases.get(id).map(String::as_str).unwrap_or_default()
    }

    pub fn get(&self, id: &ResourceId) -> Option<&str> {
        self.aliases.get(id).map(String::as_str)
    }

    /// Alias for a string that holds an aliased resource id
    fn for_str(&self, raw: &str) -> Option<&str> {
        ResourceId::parse(raw).ok().and_then(|id| self.get(&id))
    }
}

/// An output language
pub trait ScriptTarget {
    fn name(&self) -> &'static str;

    /// Text emitted before the first statement
    fn prologue(&self, _root: &ResourceId) -> Option<String> {
        None
    }

    /// Text for one call; every resource the call mentions already has an
    /// alias
    fn statement(&self, call: &Call, aliases: &AliasTable) -> String;
}

/// Script against the Python bindings
pub struct PythonTarget;

/// One JSON document per call and line
pub struct JsonTarget;

/// Look up an output language by name
pub fn target(name: &str) -> Result<&'static dyn ScriptTarget, ReifyError> {
    match name {
        "python" => Ok(&PythonTarget),
        "json" => Ok(&JsonTarget),
        other => Err(ReifyError::UnknownLanguage(other.to_string())),
    }
}

/// Render the chain in the named language
pub fn render(chain: &Chain, language: &str) -> Result<String, ReifyError> {
    let target = target(language)?;
    let mut output = String::new();

    if let Some(prologue) = chain.root().and_then(|root| target.prologue(root)) {
        output.push_str(&prologue);
    }

    let mut aliases = AliasTable::default();
    for id in &chain.objects {
        for call in chain.calls_for(id) {
            aliases.assign(id);
            output.push_str(&target.statement(call, &aliases));
        }
    }

    tracing::debug!(
        "Rendered {} resources as {}",
        chain.objects.len(),
        target.name()
    );
    Ok(output)
}

fn alias_or_id(id: &ResourceId, aliases: &AliasTable) -> String {
    aliases
        .get(id)
        .map(str::to_string)
        .unwrap_or_else(|| id.to_string())
}

impl PythonTarget {
    /// Binding method suffix for a resource type
    fn method(kind: ResourceKind) -> &'static str {
        match kind {
            ResourceKind::AnomalyScore => "anomaly_score",
            ResourceKind::BatchPrediction => "batch_prediction",
            ResourceKind::BatchCentroid => "batch_centroid",
            ResourceKind::BatchAnomalyScore => "batch_anomaly_score",
            other => other.as_str(),
        }
    }

    /// Types whose create method takes the input data positionally
    fn takes_input_data(kind: ResourceKind) -> bool {
        matches!(
            kind,
            ResourceKind::Prediction | ResourceKind::Centroid | ResourceKind::AnomalyScore
        )
    }

    fn argument(argument: &Argument, aliases: &AliasTable) -> String {
        match argument {
            Argument::Resource(id) => Self::reference(id, aliases),
            Argument::Resources(ids) => {
                let items: Vec<String> = ids.iter().map(|id| Self::reference(id, aliases)).collect();
                format!("[{}]", items.join(", "))
            }
            Argument::Data(location) => python_literal(&json!(location), aliases),
        }
    }

    fn reference(id: &ResourceId, aliases: &AliasTable) -> String {
        match aliases.get(id) {
            Some(alias) => alias.to_string(),
            None => python_literal(&json!(id.to_string()), aliases),
        }
    }
}

impl ScriptTarget for PythonTarget {
    fn name(&self) -> &'static str {
        "python"
    }

    fn prologue(&self, root: &ResourceId) -> Option<String> {
        Some(format!(
            "\"\"\"Python code to reify {}\n\n\"\"\"\n\nfrom bigml.api import BigML\napi = BigML()\n\n",
            root
        ))
    }

    fn statement(&self, call: &Call, aliases: &AliasTable) -> String {
        let kind = call.resource_id.kind();
        let alias = alias_or_id(&call.resource_id, aliases);

        match call.action {
            Action::Create => {
                let mut arguments: Vec<String> = call
                    .arguments
                    .iter()
                    .map(|argument| Self::argument(argument, aliases))
                    .collect();

                let mut options = call.options.clone();
                if Self::takes_input_data(kind) {
                    let input_data = options.remove("input_data").unwrap_or_else(|| json!({}));
                    arguments.push(python_literal(&input_data, aliases));
                }
                if !options.is_empty() {
                    arguments.push(python_literal(&Value::Object(options), aliases));
                }

                format!(
                    "{alias} = api.create_{}({})\napi.ok({alias})\n\n",
                    Self::method(kind),
                    arguments.join(", ")
                )
            }
            Action::Update => format!(
                "api.update_{}({alias}, {})\napi.ok({alias})\n\n",
                Self::method(kind),
                python_literal(&Value::Object(call.options.clone()), aliases)
            ),
        }
    }
}

/// Python literal for a JSON value. Strings holding aliased resource ids
/// become the alias.
pub fn python_literal(value: &Value, aliases: &AliasTable) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => match aliases.for_str(text) {
            Some(alias) => alias.to_string(),
            None => quote(text),
        },
        Value::Array(items) => {
            let items: Vec<String> = items
                .iter()
                .map(|item| python_literal(item, aliases))
                .collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let entries: Vec<String> = keys
                .into_iter()
                .map(|key| format!("{}: {}", quote(key), python_literal(&map[key.as_str()], aliases)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

/// Double-quoted string; JSON escapes are valid Python escapes
fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

impl ScriptTarget for JsonTarget {
    fn name(&self) -> &'static str {
        "json"
    }

    fn statement(&self, call: &Call, aliases: &AliasTable) -> String {
        let origins: Vec<String> = call
            .origins()
            .map(|origin| alias_or_id(origin, aliases))
            .collect();
        let data: Option<&str> = call.arguments.iter().find_map(|argument| match argument {
            Argument::Data(location) => Some(location.as_str()),
            _ => None,
        });

        let mut document = json!({
            "alias": alias_or_id(&call.resource_id, aliases),
            "resource": call.resource_id,
            "action": call.action,
            "origins": origins,
            "options": Value::Object(call.options.clone()),
        });
        if let (Some(data), Some(map)) = (data, document.as_object_mut()) {
            map.insert("data".to_string(), json!(data));
        }

        let mut line = document.to_string();
        line.push('\n');
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::Options;

    const SOURCE: &str = "source/5143a51a37203f2cf7000001";
    const DATASET: &str = "dataset/5143a51a37203f2cf7000002";
    const OTHER_DATASET: &str = "dataset/5143a51a37203f2cf7000012";

    fn id(raw: &str) -> ResourceId {
        ResourceId::parse(raw).unwrap()
    }

    fn chain() -> Chain {
        let mut chain = Chain::default();
        let mut options = Options::new();
        options.insert("name".to_string(), json!("Iris"));

        chain.objects = vec![id(SOURCE), id(DATASET)];
        chain.calls.insert(
            id(SOURCE),
            vec![Call::create(
                &id(SOURCE),
                vec![Argument::Data("https://static.bigml.com/csv/iris.csv".to_string())],
                Options::new(),
            )],
        );
        chain.calls.insert(
            id(DATASET),
            vec![
                Call::create(&id(DATASET), vec![Argument::Resource(id(SOURCE))], Options::new()),
                Call::update(&id(DATASET), options),
            ],
        );
        chain
    }

    #[test]
    fn test_aliases_count_per_type() {
        let mut aliases = AliasTable::default();
        assert_eq!(aliases.assign(&id(DATASET)), "dataset_1");
        assert_eq!(aliases.assign(&id(SOURCE)), "source_1");
        assert_eq!(aliases.assign(&id(OTHER_DATASET)), "dataset_2");
        assert_eq!(aliases.assign(&id(DATASET)), "dataset_1");
    }

    #[test]
    fn test_python_script() {
        let script = render(&chain(), "python").unwrap();
        let expected = format!(
            "\"\"\"Python code to reify {DATASET}\n\n\"\"\"\n\n\
             from bigml.api import BigML\napi = BigML()\n\n\
             source_1 = api.create_source(\"https://static.bigml.com/csv/iris.csv\")\n\
             api.ok(source_1)\n\n\
             dataset_1 = api.create_dataset(source_1)\n\
             api.ok(dataset_1)\n\n\
             api.update_dataset(dataset_1, {{\"name\": \"Iris\"}})\n\
             api.ok(dataset_1)\n\n"
        );
        assert_eq!(script, expected);
    }

    #[test]
    fn test_python_literals() {
        let mut aliases = AliasTable::default();
        aliases.assign(&id(DATASET));
        let value = json!({"b": [true, null, 1.5], "a": DATASET, "c": "say \"hi\""});
        assert_eq!(
            python_literal(&value, &aliases),
            r#"{"a": dataset_1, "b": [True, None, 1.5], "c": "say \"hi\""}"#
        );
    }

    #[test]
    fn test_json_lines() {
        let output = render(&chain(), "json").unwrap();
        let lines: Vec<Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["alias"], "source_1");
        assert_eq!(lines[0]["data"], "https://static.bigml.com/csv/iris.csv");
        assert_eq!(lines[1]["origins"], json!(["source_1"]));
        assert_eq!(lines[2]["action"], "update");
        assert_eq!(lines[2]["options"], json!({"name": "Iris"}));
    }

    #[test]
    fn test_every_language_resolves() {
        for language in LANGUAGES {
            assert_eq!(target(language).unwrap().name(), *language);
        }
    }

    #[test]
    fn test_unknown_language() {
        assert!(matches!(
            render(&chain(), "cobol"),
            Err(ReifyError::UnknownLanguage(name)) if name == "cobol"
        ));
    }

    #[test]
    fn test_empty_chain_renders_nothing() {
        assert_eq!(render(&Chain::default(), "python").unwrap(), "");
    }
}
