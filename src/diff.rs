//! Attribute diff utilities
//!
//! Compare a resource snapshot against the default tables, or against the
//! resource it was derived from, and keep only the arguments a user must
//! have passed explicitly.

use crate::resource::defaults::{DefaultSetting, DefaultTable};
use crate::resource::fetcher::{lookup, resource_name};
use serde_json::{Map, Value};

/// Arguments of a single call, keyed by attribute name
pub type Options = Map<String, Value>;

/// JSON equality that treats numbers by value, so `1` and `1.0` match
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

/// Whether `value` is one of the accepted default values
pub fn is_default(value: &Value, defaults: &[Value]) -> bool {
    defaults.iter().any(|default| values_equal(value, default))
}

/// Write `value` into `options` at `path`, creating intermediate objects
pub fn set_option(options: &mut Options, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut current = options;
    for key in parents {
        let entry = current
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        current = match entry.as_object_mut() {
            Some(map) => map,
            None => return,
        };
    }
    current.insert(last.to_string(), value);
}

/// Deep-merge `extra` into `options`; nested objects are merged key by key
pub fn merge_options(options: &mut Options, extra: Options) {
    for (key, value) in extra {
        match value {
            Value::Object(nested) => match options.get_mut(&key) {
                Some(Value::Object(existing)) => merge_options(existing, nested),
                _ => {
                    options.insert(key, Value::Object(nested));
                }
            },
            value => {
                options.insert(key, value);
            }
        }
    }
}

/// Option for one attribute when its stored value is not a default.
/// An attribute missing from the resource contributes nothing.
pub fn default_setting(resource: &Value, attribute: &str, setting: &DefaultSetting) -> Options {
    let path = setting.lookup_path(attribute);
    let mut options = Options::new();

    if let Some(value) = lookup(resource, &path) {
        if !is_default(value, &setting.values) {
            set_option(&mut options, &path, value.clone());
        }
    }
    options
}

/// Non-default options for every attribute of `table`
pub fn non_default_opts(resource: &Value, table: &DefaultTable) -> Options {
    let mut options = Options::new();
    for (attribute, setting) in table {
        merge_options(&mut options, default_setting(resource, attribute, setting));
    }
    options
}

/// Options the child does not inherit from its parent.
///
/// When the parent stores the attribute, the child's value is kept only if
/// it is set and different. Otherwise the child is compared with the table
/// default.
pub fn non_inherited_opts(child: &Value, parent: &Value, table: &DefaultTable) -> Options {
    let mut options = Options::new();

    for (attribute, setting) in table {
        let path = setting.lookup_path(attribute);
        match lookup(parent, &path) {
            Some(inherited) => {
                if let Some(value) = lookup(child, &path) {
                    if !value.is_null() && !values_equal(value, inherited) {
                        set_option(&mut options, &path, value.clone());
                    }
                }
            }
            None => merge_options(&mut options, default_setting(child, attribute, setting)),
        }
    }
    options
}

/// The child's `name` unless it is one the service would have generated
pub fn non_automatic_name<S: AsRef<str>>(child: &Value, templates: &[S]) -> Options {
    let mut options = Options::new();
    let name = resource_name(child);

    if !name.is_empty() && !templates.iter().any(|template| template.as_ref() == name) {
        options.insert("name".to_string(), Value::String(name.to_string()));
    }
    options
}
