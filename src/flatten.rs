use crate::error::FlattenError;
use crate::types::FlatRecord;
use serde_json::Value;

/// Flatten a JSON value into path -> scalar pairs.
///
/// Object members extend the path with `.key` (or just `key` at the root),
/// array elements with `[index]`. Empty objects and arrays contribute no keys,
/// and a bare scalar with an empty prefix is dropped.
pub fn flatten(value: &Value, prefix: &str) -> FlatRecord {
    let mut flat = FlatRecord::new();
    flatten_into(value, prefix, &mut flat);
    flat
}

fn flatten_into(value: &Value, prefix: &str, flat: &mut FlatRecord) {
    match value {
        Value::Object(obj) => {
            for (key, child) in obj {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(child, &path, flat);
            }
        }
        Value::Array(arr) => {
            for (idx, child) in arr.iter().enumerate() {
                flatten_into(child, &format!("{}[{}]", prefix, idx), flat);
            }
        }
        scalar => {
            if !prefix.is_empty() {
                flat.insert(prefix.to_string(), scalar.clone());
            }
        }
    }
}

/// Number of container levels in a value (scalars are 0, `{}` and `[]` are 1).
///
/// Walks with an explicit stack so arbitrarily deep values cannot overflow.
pub fn nesting_depth(value: &Value) -> usize {
    let mut deepest = 0;
    let mut pending = vec![(value, 0usize)];

    while let Some((value, depth)) = pending.pop() {
        match value {
            Value::Object(obj) => {
                deepest = deepest.max(depth + 1);
                pending.extend(obj.values().map(|child| (child, depth + 1)));
            }
            Value::Array(arr) => {
                deepest = deepest.max(depth + 1);
                pending.extend(arr.iter().map(|child| (child, depth + 1)));
            }
            _ => {}
        }
    }

    deepest
}

/// Flattens whole records, refusing ones nested beyond a depth limit
#[derive(Debug, Clone, Copy, Default)]
pub struct Flattener {
    max_depth: Option<usize>,
}

impl Flattener {
    pub fn new(max_depth: Option<usize>) -> Self {
        Flattener { max_depth }
    }

    pub fn flatten_record(&self, record: &Value) -> Result<FlatRecord, FlattenError> {
        if let Some(limit) = self.max_depth {
            let depth = nesting_depth(record);
            if depth > limit {
                return Err(FlattenError::TooDeep { depth, limit });
            }
        }
        Ok(flatten(record, ""))
    }
}
