//! Grouping of resources by their declared type names
//!
//! Each resource is flattened once and the resulting record is shared
//! (read-only) by every group named in its `types` field.

use crate::flatten::Flattener;
use crate::types::{ConvertConfig, FlatRecord};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, error, warn};

/// All flattened records declaring one type name, in input order
#[derive(Debug, Clone)]
pub struct TypeGroup {
    pub name: String,
    pub records: Vec<Rc<FlatRecord>>,
}

/// Type groups in the order their names were first seen
#[derive(Debug, Default)]
pub struct TypeGroups {
    groups: Vec<TypeGroup>,
    index: HashMap<String, usize>,
}

impl TypeGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// File a record under a type name, creating the group on first use
    pub fn push(&mut self, type_name: &str, record: Rc<FlatRecord>) {
        let slot = match self.index.get(type_name) {
            Some(&slot) => slot,
            None => {
                self.groups.push(TypeGroup {
                    name: type_name.to_string(),
                    records: Vec::new(),
                });
                self.index.insert(type_name.to_string(), self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        self.groups[slot].records.push(record);
    }

    pub fn get(&self, type_name: &str) -> Option<&TypeGroup> {
        self.index.get(type_name).map(|&slot| &self.groups[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Groups only exist once a record is filed, so empty means no members at all
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Counters gathered while classifying
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyStats {
    pub resources_seen: usize,
    pub records_filed: usize,
    pub records_skipped: usize,
    pub type_entries_skipped: usize,
}

#[derive(Debug, Default)]
pub struct Classification {
    pub groups: TypeGroups,
    pub stats: ClassifyStats,
}

/// Name of a JSON value's kind, for diagnostics
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// How a resource declares its types
enum TypeDecl<'a> {
    Absent,
    Single(&'a Value),
    List(&'a [Value]),
    Invalid(&'static str),
}

impl<'a> TypeDecl<'a> {
    fn of(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => TypeDecl::Absent,
            Some(single @ Value::String(_)) => TypeDecl::Single(single),
            Some(Value::Array(arr)) => TypeDecl::List(arr),
            Some(other) => TypeDecl::Invalid(json_kind(other)),
        }
    }
}

/// Identify a resource for diagnostics by its id field, or "N/A"
fn resource_label(resource: &Map<String, Value>, id_field: &str) -> String {
    match resource.get(id_field) {
        None => String::from("N/A"),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Flatten and group every resource, skipping (and warning about) bad ones
pub fn classify(resources: &[Value], config: &ConvertConfig) -> Classification {
    let flattener = Flattener::new(config.max_depth);
    let types_field = config.types_field.as_str();
    let mut out = Classification::default();
    out.stats.resources_seen = resources.len();

    for (idx, resource) in resources.iter().enumerate() {
        let Value::Object(obj) = resource else {
            warn!(
                "Skipping item at index {} in '{}' as it is not an object: {}",
                idx, config.resources_field, resource
            );
            out.stats.records_skipped += 1;
            continue;
        };

        let label = resource_label(obj, &config.id_field);
        let declared: Vec<&Value> = match TypeDecl::of(obj.get(types_field)) {
            TypeDecl::Absent => {
                warn!(
                    "Resource (ID: {}) at index {} has no '{}' key. Skipping.",
                    label, idx, types_field
                );
                out.stats.records_skipped += 1;
                continue;
            }
            TypeDecl::List([]) => {
                warn!(
                    "Resource (ID: {}) at index {} has an empty '{}' list. Skipping.",
                    label, idx, types_field
                );
                out.stats.records_skipped += 1;
                continue;
            }
            TypeDecl::Invalid(kind) => {
                warn!(
                    "Resource (ID: {}) at index {} has '{}' value that is neither a string nor a list ({}). Skipping.",
                    label, idx, types_field, kind
                );
                out.stats.records_skipped += 1;
                continue;
            }
            TypeDecl::Single(single) => vec![single],
            TypeDecl::List(items) => items.iter().collect(),
        };

        let record = match flattener.flatten_record(resource) {
            Ok(flat) => Rc::new(flat),
            Err(err) => {
                error!(
                    "Error flattening resource (ID: {}) at index {}: {}",
                    label, idx, err
                );
                out.stats.records_skipped += 1;
                continue;
            }
        };

        let mut filed = false;
        for entry in declared {
            match entry {
                Value::String(type_name) => {
                    out.groups.push(type_name, Rc::clone(&record));
                    filed = true;
                }
                other => {
                    warn!(
                        "Skipping non-string type '{}' found in resource (ID: {}) at index {}.",
                        other, label, idx
                    );
                    out.stats.type_entries_skipped += 1;
                }
            }
        }

        if filed {
            debug!(
                "Filed resource (ID: {}) at index {} with {} columns",
                label,
                idx,
                record.len()
            );
            out.stats.records_filed += 1;
        } else {
            out.stats.records_skipped += 1;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resources(value: Value) -> Vec<Value> {
        match value {
            Value::Array(arr) => arr,
            other => panic!("expected array, got {}", other),
        }
    }

    #[test]
    fn test_multiple_types_share_one_record() {
        let input = resources(json!([
            {"id": 1, "types": ["x", "y"], "spec": {"replicas": 2}}
        ]));

        let result = classify(&input, &ConvertConfig::default());

        assert_eq!(result.groups.len(), 2);
        let x = result.groups.get("x").unwrap();
        let y = result.groups.get("y").unwrap();
        assert_eq!(x.records.len(), 1);
        assert_eq!(x.records[0], y.records[0]);
        assert!(Rc::ptr_eq(&x.records[0], &y.records[0]));
        assert_eq!(x.records[0]["spec.replicas"], json!(2));
        assert_eq!(result.stats.records_filed, 1);
    }

    #[test]
    fn test_string_types_same_as_single_element_list() {
        let config = ConvertConfig::default();
        let single = classify(&resources(json!([{"id": 1, "types": "x"}])), &config);
        let listed = classify(&resources(json!([{"id": 1, "types": ["x"]}])), &config);

        let a = single.groups.get("x").unwrap();
        let b = listed.groups.get("x").unwrap();
        assert_eq!(a.records.len(), 1);
        assert_eq!(a.records[0]["id"], b.records[0]["id"]);
        assert!(a.records[0].contains_key("types"));
        assert!(b.records[0].contains_key("types[0]"));
        assert_eq!(a.records[0].len(), b.records[0].len());
    }

    #[test]
    fn test_bad_records_are_skipped() {
        let input = resources(json!([
            "not an object",
            {"id": 2},
            {"id": 3, "types": null},
            {"id": 4, "types": []},
            {"id": 5, "types": 17},
            {"id": 6, "types": {"kind": "x"}},
            {"id": 7, "types": "ok"}
        ]));

        let result = classify(&input, &ConvertConfig::default());

        assert_eq!(result.stats.resources_seen, 7);
        assert_eq!(result.stats.records_skipped, 6);
        assert_eq!(result.stats.records_filed, 1);
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups.get("ok").unwrap().records[0]["id"], json!(7));
    }

    #[test]
    fn test_mixed_types_list_keeps_strings() {
        let input = resources(json!([
            {"id": 1, "types": ["a", 2, null, "b"]},
            {"id": 2, "types": [1, false]}
        ]));

        let result = classify(&input, &ConvertConfig::default());

        assert_eq!(result.stats.type_entries_skipped, 4);
        assert_eq!(result.stats.records_filed, 1);
        assert_eq!(result.stats.records_skipped, 1);
        let names: Vec<&str> = result.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_groups_keep_first_seen_and_input_order() {
        let input = resources(json!([
            {"id": 1, "types": "b"},
            {"id": 2, "types": ["a", "b"]},
            {"id": 3, "types": "a"}
        ]));

        let result = classify(&input, &ConvertConfig::default());

        let names: Vec<&str> = result.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        let group_a = result.groups.get("a").unwrap();
        let ids: Vec<&Value> = group_a.records.iter().map(|r| &r["id"]).collect();
        assert_eq!(ids, vec![&json!(2), &json!(3)]);
    }

    #[test]
    fn test_too_deep_record_is_skipped() {
        let input = resources(json!([
            {"id": 1, "types": "x", "a": {"b": {"c": 1}}},
            {"id": 2, "types": "x"}
        ]));
        let config = ConvertConfig {
            max_depth: Some(2),
            ..ConvertConfig::default()
        };

        let result = classify(&input, &config);

        assert_eq!(result.stats.records_skipped, 1);
        assert_eq!(result.groups.get("x").unwrap().records.len(), 1);
    }

    #[test]
    fn test_custom_field_names() {
        let input = resources(json!([{"name": "a", "kind": "Pod"}]));
        let config = ConvertConfig {
            types_field: String::from("kind"),
            id_field: String::from("name"),
            ..ConvertConfig::default()
        };

        let result = classify(&input, &config);

        assert!(result.groups.get("Pod").is_some());
    }

    #[test]
    fn test_resource_label() {
        let obj = json!({"id": "abc", "n": 3});
        let obj = obj.as_object().unwrap();
        assert_eq!(resource_label(obj, "id"), "abc");
        assert_eq!(resource_label(obj, "n"), "3");
        assert_eq!(resource_label(obj, "missing"), "N/A");
    }
}
