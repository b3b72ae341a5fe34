use std::fmt;

use crate::session::{MessageAck, SessionDetail, SessionId, SessionSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    SessionsListed(Vec<SessionSummary>),
    SessionCreated(SessionSummary),
    SessionLoaded(SessionDetail),
    MessageAccepted {
        session_id: SessionId,
        ack: MessageAck,
    },
    SubmissionRejected {
        session_id: SessionId,
        text: String,
        reason: String,
    },
    StreamOpened {
        connection: ConnectionId,
    },
    StreamFrame {
        connection: ConnectionId,
        frame: String,
    },
    StreamClosed {
        connection: ConnectionId,
    },
    StreamFailed {
        connection: ConnectionId,
        message: String,
    },
    FileUploaded {
        filename: String,
    },
    RequestFailed {
        operation: &'static str,
        message: String,
    },
}
