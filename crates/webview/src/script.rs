//! Script evaluation results.
//!
//! Scripts cross the engine boundary as strings, so the bridge wraps every
//! expression in a `JSON.stringify` and decodes on the way back: objects
//! come back structured, anything else falls back to a best-effort string.

use serde_json::{Map, Value};

/// Decoded result of a script evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptResult {
    /// The evaluated value decoded as a JSON object.
    Object(Map<String, Value>),
    /// Raw string fallback, with one layer of quoting stripped when the
    /// raw result looked like a quoted literal.
    Text(String),
}

/// Wrap `script` so the evaluated value survives string transport.
pub(crate) fn wrap_for_transport(script: &str) -> String {
    format!("var result = {}; JSON.stringify(result)", script)
}

/// Decode a raw evaluation result.
pub(crate) fn decode(raw: Option<String>) -> Option<ScriptResult> {
    let raw = raw?;
    if raw.is_empty() {
        return None;
    }
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&raw) {
        return Some(ScriptResult::Object(map));
    }
    Some(ScriptResult::Text(unquote(&raw)))
}

fn unquote(raw: &str) -> String {
    if raw.len() > 2 && raw.starts_with('"') && raw.ends_with('"') {
        raw[1..raw.len() - 1].to_owned()
    } else {
        raw.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn objects_decode_structurally() {
        let decoded = decode(Some(r#"{"href":"https://example.com/","depth":2}"#.to_string()));
        let Some(ScriptResult::Object(map)) = decoded else {
            panic!("expected an object result");
        };
        assert_eq!(map.get("href"), Some(&json!("https://example.com/")));
        assert_eq!(map.get("depth"), Some(&json!(2)));
    }

    #[test]
    fn quoted_literals_lose_one_layer_of_quoting() {
        assert_eq!(
            decode(Some("\"interactive\"".to_string())),
            Some(ScriptResult::Text("interactive".to_string()))
        );
    }

    #[test]
    fn unquoted_text_passes_through() {
        assert_eq!(
            decode(Some("42".to_string())),
            Some(ScriptResult::Text("42".to_string()))
        );
        // Too short to hold a quoted payload.
        assert_eq!(
            decode(Some("\"\"".to_string())),
            Some(ScriptResult::Text("\"\"".to_string()))
        );
    }

    #[test]
    fn empty_results_decode_to_nothing() {
        assert_eq!(decode(None), None);
        assert_eq!(decode(Some(String::new())), None);
    }

    #[test]
    fn wrapping_stringifies_the_expression() {
        assert_eq!(
            wrap_for_transport("document.title"),
            "var result = document.title; JSON.stringify(result)"
        );
    }
}
