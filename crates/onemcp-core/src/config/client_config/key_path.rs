//! Navigation of dotted key paths inside a JSON object tree.

use serde_json::{Map, Value};

/// Borrow the object at `path`. Missing or non-object segments yield `None`.
pub fn get_map_at_path<'a>(
    root: &'a Map<String, Value>,
    path: &[&str],
) -> Option<&'a Map<String, Value>> {
    let (first, rest) = path.split_first()?;
    let mut current = root.get(*first)?.as_object()?;
    for segment in rest {
        current = current.get(*segment)?.as_object()?;
    }
    Some(current)
}

/// Replace the value at `path` with `map`, replacing missing or non-object
/// intermediates with `{}`. Key order of every level is kept. An empty path
/// is a no-op.
pub fn set_map_at_path(root: &mut Map<String, Value>, path: &[&str], map: Map<String, Value>) {
    let Some((first, rest)) = path.split_first() else {
        return;
    };
    let slot = root.entry(first.to_string()).or_insert(Value::Null);
    if rest.is_empty() {
        *slot = Value::Object(map);
        return;
    }
    let mut child = match std::mem::take(slot) {
        Value::Object(existing) => existing,
        _ => Map::new(),
    };
    set_map_at_path(&mut child, rest, map);
    *slot = Value::Object(child);
}
