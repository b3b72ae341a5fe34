use serde::{Deserialize, Serialize};

use super::grammar::{ERROR_PREFIX, IMAGE_PREFIX, OUTPUT_PREFIX};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResultRecord {
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, alias = "base64Image")]
    pub base64_image: Option<String>,
}

impl ToolResultRecord {
    pub fn normalized(self) -> Self {
        Self {
            output: self.output.filter(|value| !value.is_empty()),
            error: self.error.filter(|value| !value.is_empty()),
            base64_image: self.base64_image.filter(|value| !value.is_empty()),
        }
    }
}

// A repeated field overwrites the earlier one.
pub fn parse_tool_result(section: &str) -> ToolResultRecord {
    let mut record = ToolResultRecord::default();

    for line in section.lines() {
        if let Some(value) = line.strip_prefix(OUTPUT_PREFIX) {
            record.output = Some(value.to_string());
        } else if let Some(value) = line.strip_prefix(ERROR_PREFIX) {
            record.error = Some(value.to_string());
        } else if let Some(value) = line.strip_prefix(IMAGE_PREFIX) {
            record.base64_image = Some(value.to_string());
        }
    }

    record.normalized()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_all_three_fields() {
        let record =
            parse_tool_result("Output: 42\nError: none\nImage: data:image/png;base64,QQ==\n");
        assert_eq!(
            record,
            ToolResultRecord {
                output: Some("42".to_string()),
                error: Some("none".to_string()),
                base64_image: Some("QQ==".to_string()),
            }
        );
    }

    #[test]
    fn empty_value_reads_as_absent() {
        let record = parse_tool_result("Output: \nError: boom");
        assert_eq!(record.output, None);
        assert_eq!(record.error.as_deref(), Some("boom"));
    }

    #[test]
    fn repeated_field_keeps_the_last_line() {
        let record = parse_tool_result("Output: first\nOutput: second");
        assert_eq!(record.output.as_deref(), Some("second"));
    }

    #[test]
    fn continuation_lines_are_not_part_of_the_value() {
        let record = parse_tool_result("Output: line one\nline two\n");
        assert_eq!(record.output.as_deref(), Some("line one"));
    }

    #[test]
    fn prefix_without_trailing_space_is_ignored() {
        let record = parse_tool_result("Output:tight\nImage: data:image/jpeg;base64,AAAA");
        assert_eq!(record, ToolResultRecord::default());
    }

    #[test]
    fn camel_case_image_key_deserializes() {
        let record: ToolResultRecord =
            serde_json::from_str(r#"{"output":"ok","base64Image":"QQ=="}"#)
                .expect("camelCase image key should deserialize");
        assert_eq!(record.base64_image.as_deref(), Some("QQ=="));
        assert_eq!(record.error, None);
    }
}
