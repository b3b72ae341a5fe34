pub mod frame;
pub mod grammar;
pub mod history;
pub mod tool_result;

pub use frame::{decode_frame, StreamEvent};
pub use history::{parse_history, Segment};
pub use tool_result::ToolResultRecord;
