use log::{ debug, error, warn };
use serde_json::{ Map, Value };

use crate::error::NodeError;
use crate::models::chat::{ ChatMessage, MessageContent, Role };

/// Parses the host's `chat_history` string.
///
/// Blank input is an empty conversation. Anything else must be a JSON array of
/// objects, each with a recognized `role` and a `content` that is a string or
/// an array of content parts.
pub fn parse_history(raw: &str) -> Result<Vec<ChatMessage>, NodeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(trimmed).map_err(|e| {
        let msg = format!("Invalid JSON in chat_history: {}", e);
        error!("{}", msg);
        NodeError::validation(msg)
    })?;

    let entries = value
        .as_array()
        .ok_or_else(|| NodeError::validation("chat_history must be a JSON array"))?;

    let messages = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| parse_entry(index, entry))
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Parsed chat history with {} messages", messages.len());
    Ok(messages)
}

fn parse_entry(index: usize, entry: &Value) -> Result<ChatMessage, NodeError> {
    let fields: &Map<String, Value> = entry
        .as_object()
        .ok_or_else(|| NodeError::validation(format!("Message {} must be an object", index)))?;

    let (role, content) = match (fields.get("role"), fields.get("content")) {
        (Some(role), Some(content)) => (role, content),
        _ => {
            return Err(
                NodeError::validation(
                    format!("Message {} must have 'role' and 'content' fields", index)
                )
            );
        }
    };

    let role: Role = role
        .as_str()
        .ok_or_else(|| NodeError::validation(format!("Message {} has a non-string role", index)))?
        .parse()
        .map_err(|e| NodeError::validation(format!("Message {} has {}", index, e)))?;

    let content: MessageContent = serde_json::from_value(content.clone()).map_err(|_|
        NodeError::validation(
            format!(
                "Message {} has invalid content: expected a string or an array of content parts",
                index
            )
        )
    )?;

    let dropped = dropped_keys(fields);
    if !dropped.is_empty() {
        warn!("Message {} fields not kept in chat_history: {}", index, dropped.join(", "));
    }

    Ok(ChatMessage { role, content })
}

/// Keys of a history entry other than `role` and `content`.
fn dropped_keys(fields: &Map<String, Value>) -> Vec<&str> {
    fields
        .keys()
        .map(String::as_str)
        .filter(|key| !matches!(*key, "role" | "content"))
        .collect()
}

/// Serializes history for the host: a pretty-printed JSON array, non-ASCII kept as is.
pub fn format_history(messages: &[ChatMessage]) -> Result<String, NodeError> {
    serde_json::to_string_pretty(messages)
        .map_err(|e| NodeError::internal(format!("Failed to serialize chat history: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_input_is_empty_history() {
        assert!(parse_history("").unwrap().is_empty());
        assert!(parse_history("  \n ").unwrap().is_empty());
        assert!(parse_history("[]").unwrap().is_empty());
    }

    #[test]
    fn parses_well_formed_history_in_order() {
        let raw = json!([
            {"role": "system", "content": "You are helpful"},
            {"role": "user", "content": "Hello"},
            {"role": "assistant", "content": "Hi there!"}
        ]).to_string();
        let messages = parse_history(&raw).unwrap();
        assert_eq!(
            messages,
            vec![
                ChatMessage::system("You are helpful"),
                ChatMessage::user("Hello"),
                ChatMessage::assistant("Hi there!")
            ]
        );
    }

    #[test]
    fn extra_fields_are_dropped() {
        let raw = r#"[{"role":"user","content":"Hi","name":"sam","id":7}]"#;
        let messages = parse_history(raw).unwrap();
        assert_eq!(messages, vec![ChatMessage::user("Hi")]);
        assert!(!format_history(&messages).unwrap().contains("sam"));

        let entry: Value = serde_json::from_str(raw).unwrap();
        let mut dropped = dropped_keys(entry[0].as_object().unwrap());
        dropped.sort();
        assert_eq!(dropped, ["id", "name"]);
    }

    #[test]
    fn invalid_json_is_rejected() {
        let err = parse_history("{not valid json").unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("Invalid JSON in chat_history"));
    }

    #[test]
    fn non_array_is_rejected() {
        let err = parse_history(r#"{"role":"user","content":"Hi"}"#).unwrap_err();
        assert!(err.to_string().contains("must be a JSON array"));
    }

    #[test]
    fn errors_name_the_offending_entry() {
        let err = parse_history(r#"[{"role":"user","content":"ok"}, "text"]"#).unwrap_err();
        assert!(err.to_string().contains("Message 1 must be an object"));

        let err = parse_history(r#"[{"role":"user"}]"#).unwrap_err();
        assert!(err.to_string().contains("Message 0 must have 'role' and 'content' fields"));

        let err = parse_history(
            r#"[{"role":"user","content":"a"},{"role":"bogus","content":"b"}]"#
        ).unwrap_err();
        assert!(err.to_string().contains("Message 1 has invalid role: bogus"));

        let err = parse_history(r#"[{"role":7,"content":"b"}]"#).unwrap_err();
        assert!(err.to_string().contains("non-string role"));

        let err = parse_history(r#"[{"role":"assistant","content":null}]"#).unwrap_err();
        assert!(err.to_string().contains("Message 0 has invalid content"));
    }

    #[test]
    fn format_is_pretty_and_keeps_unicode() {
        let formatted = format_history(&[ChatMessage::user("héllo 世界")]).unwrap();
        assert_eq!(
            formatted,
            "[\n  {\n    \"role\": \"user\",\n    \"content\": \"héllo 世界\"\n  }\n]"
        );
        assert_eq!(format_history(&[]).unwrap(), "[]");
    }

    #[test]
    fn history_round_trips() {
        let raw = r#"[{"role":"user","content":"Hi"},{"role":"assistant","content":"Hello"}]"#;
        let formatted = format_history(&parse_history(raw).unwrap()).unwrap();
        let reparsed: Value = serde_json::from_str(&formatted).unwrap();
        assert_eq!(reparsed, serde_json::from_str::<Value>(raw).unwrap());
    }
}
