use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::ParseError;

static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\n(.*?)\n```").expect("valid regex"));

/// Recover the JSON document from a free-form answer reply.
///
/// Accepts either a bare JSON reply or one wrapped in a ```` ```json ```` fence
/// (the first fence wins).
pub fn extract_json_reply(content: &str) -> Result<Value, ParseError> {
    if let Ok(value) = serde_json::from_str(content) {
        return Ok(value);
    }
    let body = FENCED_JSON
        .captures(content)
        .and_then(|caps| caps.get(1))
        .ok_or(ParseError::NoJson)?;
    serde_json::from_str(body.as_str()).map_err(|_| ParseError::NoJson)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_json() {
        let value = extract_json_reply(r#"  {"answer": "air", "confidence": 0.9}  "#).unwrap();
        assert_eq!(value["answer"], "air");
    }

    #[test]
    fn fenced_json_with_chatter() {
        let content = "Berikut jawabannya:\n```json\n{\n  \"answer\": \"air\",\n  \"tags\": [\"kimia\"]\n}\n```\nSemoga membantu.";
        let value = extract_json_reply(content).unwrap();
        assert_eq!(value["tags"][0], "kimia");
    }

    #[test]
    fn no_json_is_an_error() {
        assert!(matches!(
            extract_json_reply("maaf, saya tidak tahu"),
            Err(ParseError::NoJson)
        ));
        assert!(matches!(
            extract_json_reply("```json\n{not json}\n```"),
            Err(ParseError::NoJson)
        ));
    }
}
