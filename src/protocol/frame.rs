use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::tool_result::ToolResultRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Text {
        text: String,
    },
    ToolUse {
        name: String,
        id: Option<String>,
    },
    ToolResult {
        result: ToolResultRecord,
        tool_use_id: String,
    },
    Error {
        message: String,
    },
    Complete {
        message: Option<String>,
    },
    Unknown {
        kind: String,
        raw: String,
    },
    Malformed {
        raw: String,
    },
}

#[derive(Deserialize)]
struct TextFrame {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ToolUseFrame {
    name: String,
    #[serde(default)]
    id: Option<String>,
}

#[derive(Deserialize)]
struct ToolResultFrame {
    result: ToolResultRecord,
    tool_use_id: String,
}

#[derive(Deserialize)]
struct ErrorFrame {
    message: String,
}

#[derive(Deserialize)]
struct CompleteFrame {
    #[serde(default)]
    message: Option<String>,
}

/// Decodes one raw frame.
///
/// Returns `None` only for a `text` frame with no text, which is a no-op.
/// Every other input yields an event, including `Unknown` and `Malformed`.
pub fn decode_frame(raw: &str) -> Option<StreamEvent> {
    let malformed = || StreamEvent::Malformed {
        raw: raw.to_string(),
    };

    let Ok(value) = serde_json::from_str::<Value>(raw) else {
        return Some(malformed());
    };
    let Some(kind) = value
        .as_object()
        .and_then(|object| object.get("type"))
        .and_then(Value::as_str)
        .map(str::to_string)
    else {
        return Some(malformed());
    };

    let event = match kind.as_str() {
        "text" => match shape::<TextFrame>(value) {
            Some(frame) => StreamEvent::Text {
                text: frame.text.filter(|text| !text.is_empty())?,
            },
            None => malformed(),
        },
        "tool_use" => match shape::<ToolUseFrame>(value) {
            Some(frame) => StreamEvent::ToolUse {
                name: frame.name,
                id: frame.id,
            },
            None => malformed(),
        },
        "tool_result" => match shape::<ToolResultFrame>(value) {
            Some(frame) => StreamEvent::ToolResult {
                result: frame.result.normalized(),
                tool_use_id: frame.tool_use_id,
            },
            None => malformed(),
        },
        "error" => match shape::<ErrorFrame>(value) {
            Some(frame) => StreamEvent::Error {
                message: frame.message,
            },
            None => malformed(),
        },
        "complete" => StreamEvent::Complete {
            message: shape::<CompleteFrame>(value)
                .and_then(|frame| frame.message)
                .filter(|message| !message.is_empty()),
        },
        _ => StreamEvent::Unknown {
            kind,
            raw: raw.to_string(),
        },
    };
    Some(event)
}

fn shape<T: DeserializeOwned>(value: Value) -> Option<T> {
    serde_json::from_value(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_text() {
        assert_eq!(
            decode_frame(r#"{"type":"text","text":"Opening Firefox"}"#),
            Some(StreamEvent::Text {
                text: "Opening Firefox".to_string()
            })
        );
    }

    #[test]
    fn empty_text_is_a_noop() {
        assert_eq!(decode_frame(r#"{"type":"text","text":""}"#), None);
        assert_eq!(decode_frame(r#"{"type":"text"}"#), None);
    }

    #[test]
    fn tool_use_id_is_optional() {
        assert_eq!(
            decode_frame(r#"{"type":"tool_use","name":"computer","input":{"action":"screenshot"}}"#),
            Some(StreamEvent::ToolUse {
                name: "computer".to_string(),
                id: None
            })
        );
        assert_eq!(
            decode_frame(r#"{"type":"tool_use","name":"bash","id":"toolu_1"}"#),
            Some(StreamEvent::ToolUse {
                name: "bash".to_string(),
                id: Some("toolu_1".to_string())
            })
        );
    }

    #[test]
    fn tool_use_without_name_is_malformed() {
        let raw = r#"{"type":"tool_use","id":"toolu_1"}"#;
        assert_eq!(
            decode_frame(raw),
            Some(StreamEvent::Malformed {
                raw: raw.to_string()
            })
        );
    }

    #[test]
    fn decodes_tool_result() {
        let raw = r#"{"type":"tool_result","tool_use_id":"toolu_9","result":{"output":"done","error":"","base64_image":"QQ=="}}"#;
        assert_eq!(
            decode_frame(raw),
            Some(StreamEvent::ToolResult {
                result: ToolResultRecord {
                    output: Some("done".to_string()),
                    error: None,
                    base64_image: Some("QQ==".to_string()),
                },
                tool_use_id: "toolu_9".to_string(),
            })
        );
    }

    #[test]
    fn tool_result_requires_nested_result() {
        let raw = r#"{"type":"tool_result","tool_use_id":"toolu_9"}"#;
        assert!(matches!(
            decode_frame(raw),
            Some(StreamEvent::Malformed { .. })
        ));
    }

    #[test]
    fn decodes_error_and_complete() {
        assert_eq!(
            decode_frame(r#"{"type":"error","message":"agent crashed"}"#),
            Some(StreamEvent::Error {
                message: "agent crashed".to_string()
            })
        );
        assert_eq!(
            decode_frame(r#"{"type":"complete","message":"Agent task completed"}"#),
            Some(StreamEvent::Complete {
                message: Some("Agent task completed".to_string())
            })
        );
        assert_eq!(
            decode_frame(r#"{"type":"complete"}"#),
            Some(StreamEvent::Complete { message: None })
        );
    }

    #[test]
    fn unknown_type_is_kept_for_diagnostics() {
        assert_eq!(
            decode_frame(r#"{"type":"ping"}"#),
            Some(StreamEvent::Unknown {
                kind: "ping".to_string(),
                raw: r#"{"type":"ping"}"#.to_string(),
            })
        );
    }

    #[test]
    fn non_json_and_untyped_frames_are_malformed() {
        for raw in ["not json", "[1,2]", r#"{"error":"Session not found"}"#, r#"{"type":7}"#] {
            assert_eq!(
                decode_frame(raw),
                Some(StreamEvent::Malformed {
                    raw: raw.to_string()
                }),
                "{raw} should decode as malformed"
            );
        }
    }
}
