use crate::protocol::{parse_history, Segment, StreamEvent, ToolResultRecord};
use crate::session::{Message, Role};

pub mod view;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Agent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolUseEntry {
    pub name: Option<String>,
    pub tool_use_id: Option<String>,
    pub raw: Option<String>,
}

impl ToolUseEntry {
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("Running tool: {name}"),
            None => "Running tool".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResultEntry {
    pub tool_use_id: String,
    pub output: Option<String>,
    pub error: Option<String>,
    pub image_base64: Option<String>,
}

impl ToolResultEntry {
    pub fn from_record(record: ToolResultRecord, tool_use_id: impl Into<String>) -> Self {
        let not_blank = |value: &String| !value.trim().is_empty();
        Self {
            tool_use_id: tool_use_id.into(),
            output: record.output.filter(not_blank),
            error: record.error.filter(not_blank),
            image_base64: record.base64_image.filter(not_blank),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_none() && self.error.is_none() && self.image_base64.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEntry {
    Text { speaker: Speaker, text: String },
    ToolUse(ToolUseEntry),
    ToolResult(ToolResultEntry),
    Error(String),
    Diagnostic(String),
    Completed(Option<String>),
}

impl TranscriptEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self::Text {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self::Text {
            speaker: Speaker::Agent,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Continue,
    Finished,
}

#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    scroll_pending: bool,
    bulk: bool,
    generation: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.generation += 1;
        self.scroll_pending = true;
    }

    pub fn push(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
        if !self.bulk {
            self.scroll_pending = true;
        }
    }

    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_pending)
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.push(TranscriptEntry::Error(message.into()));
    }

    pub fn apply_segment(&mut self, segment: Segment) {
        let entry = match segment {
            Segment::PlainText(text) => TranscriptEntry::agent(text),
            Segment::ToolUseIndicator(line) => TranscriptEntry::ToolUse(ToolUseEntry {
                name: Segment::tool_use_name(&line).map(str::to_string),
                tool_use_id: None,
                raw: Some(line),
            }),
            Segment::ToolResult { record, tool_id } => {
                TranscriptEntry::ToolResult(ToolResultEntry::from_record(record, tool_id))
            }
        };
        self.push(entry);
    }

    pub fn apply_event(&mut self, event: StreamEvent) -> Turn {
        let entry = match event {
            StreamEvent::Text { text } => TranscriptEntry::agent(text),
            StreamEvent::ToolUse { name, id } => TranscriptEntry::ToolUse(ToolUseEntry {
                name: Some(name),
                tool_use_id: id,
                raw: None,
            }),
            StreamEvent::ToolResult {
                result,
                tool_use_id,
            } => TranscriptEntry::ToolResult(ToolResultEntry::from_record(result, tool_use_id)),
            StreamEvent::Error { message } => TranscriptEntry::Error(message),
            StreamEvent::Complete { message } => {
                self.push(TranscriptEntry::Completed(message));
                return Turn::Finished;
            }
            StreamEvent::Unknown { raw, .. } | StreamEvent::Malformed { raw } => {
                TranscriptEntry::Diagnostic(format!("[progress] {raw}"))
            }
        };
        self.push(entry);
        Turn::Continue
    }

    pub fn apply_message(&mut self, message: &Message) {
        match message.role {
            Role::User => self.push(TranscriptEntry::user(message.content.clone())),
            Role::Agent => {
                for segment in parse_history(&message.content) {
                    self.apply_segment(segment);
                }
            }
        }
    }

    /// Puts a session history ahead of the entries appended since the last
    /// clear, so live entries that arrived first are kept after it.
    ///
    /// Individual appends do not scroll; one request is left pending at the
    /// end so the newest entry is revealed once the replay settles.
    pub fn replay(&mut self, messages: &[Message]) {
        let live = std::mem::take(&mut self.entries);
        self.generation += 1;
        self.bulk = true;
        for message in messages {
            self.apply_message(message);
        }
        self.entries.extend(live);
        self.bulk = false;
        self.scroll_pending = true;
    }
}
