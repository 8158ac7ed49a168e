use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Types that can be requested from Gemini as a JSON response.
///
/// Automatically implemented for any type that implements `JsonSchema + DeserializeOwned`.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Generate a `responseSchema` Gemini will accept.
    ///
    /// Gemini takes an OpenAPI subset, so the schemars output is reshaped:
    /// 1. `$ref`s are inlined and `definitions` dropped
    /// 2. keywords outside the subset (`$schema`, `title`, `format`,
    ///    `additionalProperties`) are removed
    /// 3. `"type": ["x", "null"]` becomes `"type": "x", "nullable": true`
    /// 4. every property is listed in `required`
    fn gemini_schema() -> Value {
        let schema = schema_for!(Self);
        let mut value = serde_json::to_value(schema).unwrap_or_default();

        inline_refs(&mut value);
        if let Value::Object(map) = &mut value {
            map.remove("definitions");
        }
        reshape(&mut value);

        value
    }

    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

const UNSUPPORTED_KEYWORDS: &[&str] = &["$schema", "title", "format", "additionalProperties"];

fn reshape(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for key in UNSUPPORTED_KEYWORDS {
                map.remove(*key);
            }
            collapse_nullable_type(map);

            if map.get("type").and_then(Value::as_str) == Some("object") {
                if let Some(Value::Object(props)) = map.get("properties") {
                    let all_keys: Vec<Value> =
                        props.keys().map(|k| Value::String(k.clone())).collect();
                    map.insert("required".to_string(), Value::Array(all_keys));
                }
            }

            for (key, v) in map.iter_mut() {
                // Property names are data, not schema keywords.
                if key == "properties" {
                    if let Value::Object(props) = v {
                        for (_, prop) in props.iter_mut() {
                            reshape(prop);
                        }
                    }
                } else {
                    reshape(v);
                }
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                reshape(item);
            }
        }
        _ => {}
    }
}

fn collapse_nullable_type(map: &mut Map<String, Value>) {
    let Some(Value::Array(types)) = map.get("type") else {
        return;
    };
    let non_null: Vec<Value> = types
        .iter()
        .filter(|t| t.as_str() != Some("null"))
        .cloned()
        .collect();
    let nullable = non_null.len() < types.len();

    if let [single] = non_null.as_slice() {
        map.insert("type".to_string(), single.clone());
        if nullable {
            map.insert("nullable".to_string(), Value::Bool(true));
        }
    }
}

fn inline_refs(value: &mut Value) {
    let definitions = if let Value::Object(map) = value {
        map.get("definitions").cloned()
    } else {
        None
    };

    if let Some(defs) = definitions {
        inline_refs_recursive(value, &defs);
    }
}

fn inline_refs_recursive(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(ref_path)) = map.get("$ref").cloned() {
                if let Some(type_name) = ref_path.strip_prefix("#/definitions/") {
                    if let Some(def) = definitions.get(type_name) {
                        *value = def.clone();
                        inline_refs_recursive(value, definitions);
                        return;
                    }
                }
            }

            if let Some(Value::Array(all_of)) = map.get("allOf").cloned() {
                if let [only] = all_of.as_slice() {
                    *value = only.clone();
                    inline_refs_recursive(value, definitions);
                    return;
                }
            }

            for (_, v) in map.iter_mut() {
                inline_refs_recursive(v, definitions);
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                inline_refs_recursive(item, definitions);
            }
        }
        _ => {}
    }
}
