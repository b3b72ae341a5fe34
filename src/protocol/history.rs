use super::grammar::{find_result_marker, is_result_data_line, TOOL_USE_LINE};
use super::tool_result::{parse_tool_result, ToolResultRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    PlainText(String),
    ToolUseIndicator(String),
    ToolResult {
        record: ToolResultRecord,
        tool_id: String,
    },
}

impl Segment {
    pub fn tool_use_name(line: &str) -> Option<&str> {
        let rest = line.strip_prefix(TOOL_USE_LINE)?.trim_start();
        let (name, _) = rest.split_once(':')?;
        let name = name.trim();
        (!name.is_empty()).then_some(name)
    }
}

pub fn parse_history(content: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    while let Some(marker) = find_result_marker(content, cursor) {
        let before = &content[cursor..marker.start];
        if !before.trim().is_empty() {
            segment_plain(before, &mut segments);
        }

        // The data region can never run into the following marker.
        let region_end = find_result_marker(content, marker.end)
            .map(|next| next.start)
            .unwrap_or(content.len());
        let data_end = data_region_end(content, marker.end, region_end);

        segments.push(Segment::ToolResult {
            record: parse_tool_result(&content[marker.end..data_end]),
            tool_id: marker.tool_id.to_string(),
        });
        cursor = data_end;
    }

    let tail = &content[cursor..];
    if !tail.trim().is_empty() {
        segment_plain(tail, &mut segments);
    }
    segments
}

fn data_region_end(content: &str, start: usize, limit: usize) -> usize {
    let mut offset = start;
    for line in content[start..limit].split_inclusive('\n') {
        let bare = line.trim_end_matches(['\n', '\r']);
        if !is_result_data_line(bare) {
            return offset;
        }
        offset += line.len();
    }
    limit
}

fn segment_plain(text: &str, segments: &mut Vec<Segment>) {
    let mut buffer: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.starts_with(TOOL_USE_LINE) {
            flush_plain(&mut buffer, segments);
            segments.push(Segment::ToolUseIndicator(line.to_string()));
        } else {
            buffer.push(line);
        }
    }
    flush_plain(&mut buffer, segments);
}

fn flush_plain(buffer: &mut Vec<&str>, segments: &mut Vec<Segment>) {
    let joined = buffer.join("\n");
    buffer.clear();
    if joined.trim().is_empty() {
        return;
    }
    segments.push(Segment::PlainText(
        joined.trim_matches(['\n', '\r']).to_string(),
    ));
}
