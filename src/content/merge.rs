//! Merge rules for keyed documents (phases, closings, vignettes)

use serde_json::{Map, Value};

/// Copy every incoming field over the existing object. No recursion.
pub fn shallow_merge(existing: &mut Map<String, Value>, incoming: &Map<String, Value>) {
    for (key, value) in incoming {
        existing.insert(key.clone(), value.clone());
    }
}

/// Merge a payload into a keyed document, two levels deep.
///
/// For each top-level key: object into object is a shallow field merge,
/// anything else replaces the stored value. Stored keys missing from the
/// payload are kept.
pub fn merge_keyed(document: &mut Map<String, Value>, payload: &Map<String, Value>) {
    for (key, incoming) in payload {
        if let (Some(Value::Object(stored)), Value::Object(fields)) =
            (document.get_mut(key), incoming)
        {
            shallow_merge(stored, fields);
            continue;
        }
        document.insert(key.clone(), incoming.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_shallow_merge_overwrites_whole_fields() {
        let mut existing = obj(json!({"advice": {"nutrition": ["iron"], "avoid": ["coffee"]}, "color": "red"}));
        shallow_merge(&mut existing, &obj(json!({"advice": {"nutrition": ["magnesium"]}})));

        assert_eq!(existing["advice"], json!({"nutrition": ["magnesium"]}));
        assert_eq!(existing["color"], "red");
    }

    #[test]
    fn test_merge_keyed_keeps_untouched_keys() {
        let mut doc = obj(json!({
            "menstrual": {"duration": "3-7 days", "color": "#E53E3E"},
            "luteal": {"duration": "10-14 days"}
        }));
        merge_keyed(&mut doc, &obj(json!({"menstrual": {"duration": "X"}})));

        assert_eq!(doc["menstrual"]["duration"], "X");
        assert_eq!(doc["menstrual"]["color"], "#E53E3E");
        assert_eq!(doc["luteal"]["duration"], "10-14 days");
    }

    #[test]
    fn test_merge_keyed_replaces_non_objects() {
        let mut doc = obj(json!({"emma": "legacy string", "clara": {"a": 1}}));
        merge_keyed(
            &mut doc,
            &obj(json!({"emma": {"encouragement": "go"}, "clara": ["list"], "laure": {"b": 2}})),
        );

        assert_eq!(doc["emma"], json!({"encouragement": "go"}));
        assert_eq!(doc["clara"], json!(["list"]));
        assert_eq!(doc["laure"], json!({"b": 2}));
    }
}
