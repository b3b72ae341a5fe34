//! Literal tokens of the flattened history format written by the backend.
//!
//! The backend serialises an agent turn into one string; these are the only
//! markers the parsers recognise. They are case- and spacing-sensitive.

pub const TOOL_RESULT_OPEN: &str = "[TOOL_RESULT_";
pub const TOOL_RESULT_CLOSE: char = ']';

pub const TOOL_USE_LINE: &str = "[TOOL USE]";

pub const OUTPUT_PREFIX: &str = "Output: ";
pub const ERROR_PREFIX: &str = "Error: ";
pub const IMAGE_PREFIX: &str = "Image: data:image/png;base64,";

/// Looser prefixes that keep a line inside a tool-result data region.
pub const DATA_LINE_PREFIXES: [&str; 3] = ["Output:", "Error:", "Image:"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultMarker<'a> {
    pub start: usize,
    pub end: usize,
    pub tool_id: &'a str,
}

/// Finds the next result marker at or after `from`.
///
/// `<id>` is a non-empty run of characters other than `]`. An opener with an
/// empty id is skipped and scanning continues after it.
pub fn find_result_marker(content: &str, from: usize) -> Option<ResultMarker<'_>> {
    let mut cursor = from;
    while cursor <= content.len() {
        let start = cursor + content.get(cursor..)?.find(TOOL_RESULT_OPEN)?;
        let id_start = start + TOOL_RESULT_OPEN.len();
        let id_len = content[id_start..].find(TOOL_RESULT_CLOSE)?;
        if id_len == 0 {
            cursor = id_start;
            continue;
        }

        let id_end = id_start + id_len;
        return Some(ResultMarker {
            start,
            end: id_end + TOOL_RESULT_CLOSE.len_utf8(),
            tool_id: &content[id_start..id_end],
        });
    }
    None
}

pub fn is_result_data_line(line: &str) -> bool {
    line.trim().is_empty()
        || DATA_LINE_PREFIXES
            .iter()
            .any(|prefix| line.starts_with(prefix))
}
