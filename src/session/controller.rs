use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use super::{SessionId, SessionSummary};
use crate::backend::{AgentApi, StreamHandle};
use crate::error::ClientError;
use crate::event::{AppEvent, ConnectionId};
use crate::protocol::{decode_frame, StreamEvent};
use crate::transcript::{Transcript, TranscriptEntry, Turn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    NoSession,
    SessionSelected(SessionId),
    Streaming(SessionId),
}

enum State {
    NoSession,
    Selected(SessionId),
    Streaming(StreamHandle),
}

pub struct SessionController<A: AgentApi> {
    api: A,
    state: State,
    sessions: Vec<SessionSummary>,
    transcript: Transcript,
    next_connection: u64,
    awaiting_history: Option<SessionId>,
    pending_submission: Option<SessionId>,
    unlisted_created: Option<SessionId>,
    retry_text: Option<String>,
    notice: Option<String>,
    diagnostics: Vec<String>,
}

impl<A: AgentApi> SessionController<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: State::NoSession,
            sessions: Vec::new(),
            transcript: Transcript::new(),
            next_connection: 1,
            awaiting_history: None,
            pending_submission: None,
            unlisted_created: None,
            retry_text: None,
            notice: None,
            diagnostics: Vec::new(),
        }
    }

    fn timestamp() -> String {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(duration) => duration.as_secs().to_string(),
            Err(_) => "0".to_string(),
        }
    }

    fn log_diagnostic(&mut self, message: impl Into<String>) {
        self.diagnostics
            .push(format!("[{}] {}", Self::timestamp(), message.into()));
    }

    pub fn start(&mut self) {
        self.api.list_sessions();
    }

    pub fn phase(&self) -> Phase {
        match &self.state {
            State::NoSession => Phase::NoSession,
            State::Selected(session_id) => Phase::SessionSelected(session_id.clone()),
            State::Streaming(handle) => Phase::Streaming(handle.session_id().clone()),
        }
    }

    pub fn active_session(&self) -> Option<&SessionId> {
        match &self.state {
            State::NoSession => None,
            State::Selected(session_id) => Some(session_id),
            State::Streaming(handle) => Some(handle.session_id()),
        }
    }

    pub fn active_connection(&self) -> Option<ConnectionId> {
        match &self.state {
            State::Streaming(handle) => Some(handle.connection()),
            _ => None,
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self.state, State::Streaming(_))
    }

    pub fn sessions(&self) -> &[SessionSummary] {
        &self.sessions
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }

    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn take_retry_text(&mut self) -> Option<String> {
        self.retry_text.take()
    }

    pub fn refresh_sessions(&mut self) {
        self.api.list_sessions();
    }

    pub fn create_session(&mut self) {
        self.notice = None;
        self.api.create_session();
    }

    /// Makes `session_id` active and replays its history.
    ///
    /// Any open connection is closed first, so frames from the previous
    /// session can no longer reach the transcript.
    pub fn select_session(&mut self, session_id: SessionId) {
        self.close_stream("session switched");
        info!(%session_id, "session selected");

        self.state = State::Selected(session_id.clone());
        self.transcript.clear();
        self.pending_submission = None;
        self.notice = None;
        self.awaiting_history = Some(session_id.clone());
        self.api.fetch_session(&session_id);
    }

    pub fn submit(&mut self, text: &str) -> Result<(), ClientError> {
        let Some(session_id) = self.active_session().cloned() else {
            let err = ClientError::NoActiveSession;
            self.notice = Some(err.to_string());
            return Err(err);
        };

        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        self.notice = None;
        self.transcript.push(TranscriptEntry::user(text));
        self.pending_submission = Some(session_id.clone());
        debug!(%session_id, "submitting message");
        self.api.post_message(&session_id, text);
        Ok(())
    }

    pub fn upload_file(&mut self, path: &Path) {
        self.log_diagnostic(format!("uploading {}", path.display()));
        self.api.upload_file(path);
    }

    pub fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::SessionsListed(sessions) => self.on_sessions_listed(sessions),
            AppEvent::SessionCreated(summary) => {
                if !self
                    .sessions
                    .iter()
                    .any(|session| session.session_id == summary.session_id)
                {
                    self.sessions.push(summary.clone());
                }
                self.unlisted_created = Some(summary.session_id.clone());
                self.select_session(summary.session_id);
                self.api.list_sessions();
            }
            AppEvent::SessionLoaded(detail) => {
                if self.awaiting_history.as_ref() != Some(&detail.session_id) {
                    debug!(session_id = %detail.session_id, "ignoring history for inactive session");
                    return;
                }
                self.awaiting_history = None;
                self.transcript.replay(&detail.messages);
                debug!(
                    session_id = %detail.session_id,
                    entries = self.transcript.len(),
                    "history replayed"
                );
            }
            AppEvent::MessageAccepted { session_id, ack } => {
                if self.pending_submission.as_ref() != Some(&session_id)
                    || self.active_session() != Some(&session_id)
                {
                    debug!(%session_id, "ignoring acknowledgement for inactive session");
                    return;
                }
                self.pending_submission = None;
                self.log_diagnostic(format!("message accepted: {}", ack.content));
                self.open_stream(session_id);
            }
            AppEvent::SubmissionRejected {
                session_id,
                text,
                reason,
            } => {
                if self.active_session() != Some(&session_id) {
                    self.log_diagnostic(format!(
                        "submission to session {session_id} failed: {reason}"
                    ));
                    return;
                }
                self.pending_submission = None;
                self.transcript
                    .push_error(ClientError::SubmissionRejected { reason }.to_string());
                self.retry_text = Some(text);
            }
            AppEvent::StreamOpened { connection } => {
                if self.is_active_connection(connection) {
                    self.log_diagnostic(format!("stream {connection} opened"));
                }
            }
            AppEvent::StreamFrame { connection, frame } => {
                if !self.is_active_connection(connection) {
                    debug!(%connection, "dropping frame from closed connection");
                    return;
                }
                self.on_frame(&frame);
            }
            AppEvent::StreamClosed { connection } => {
                if self.is_active_connection(connection) {
                    self.close_stream("closed by server");
                }
            }
            AppEvent::StreamFailed {
                connection,
                message,
            } => {
                if self.is_active_connection(connection) {
                    self.transcript
                        .push_error(ClientError::Transport(message).to_string());
                    self.close_stream("connection error");
                }
            }
            AppEvent::FileUploaded { filename } => {
                self.transcript
                    .push(TranscriptEntry::user(format!("File uploaded: {filename}")));
            }
            AppEvent::RequestFailed { operation, message } => {
                self.log_diagnostic(format!("{operation} failed: {message}"));
                self.transcript
                    .push_error(format!("Failed to {operation}: {message}"));
            }
        }
    }

    fn on_sessions_listed(&mut self, sessions: Vec<SessionSummary>) {
        self.sessions = sessions;
        let listed = |id: &SessionId| self.sessions.iter().any(|s| &s.session_id == id);

        if self.unlisted_created.as_ref().is_some_and(|id| listed(id)) {
            self.unlisted_created = None;
        }
        let keep_active = match self.active_session() {
            Some(active) => listed(active) || self.unlisted_created.as_ref() == Some(active),
            None => false,
        };
        if keep_active {
            return;
        }

        if let Some(active) = self.active_session().cloned() {
            info!(session_id = %active, "selected session no longer listed");
            self.log_diagnostic(format!("session {active} is no longer listed"));
        }
        if let Some(newest) = self.sessions.last().map(|s| s.session_id.clone()) {
            self.select_session(newest);
        }
    }

    fn on_frame(&mut self, frame: &str) {
        let Some(event) = decode_frame(frame) else {
            return;
        };
        match &event {
            StreamEvent::Unknown { kind, .. } => {
                warn!(kind = kind.as_str(), "unknown stream event type");
                self.log_diagnostic(format!("unknown stream event type: {kind}"));
            }
            StreamEvent::Malformed { raw } => {
                warn!("malformed stream frame");
                self.log_diagnostic(format!("malformed stream frame: {raw}"));
            }
            _ => {}
        }

        if self.transcript.apply_event(event) == Turn::Finished {
            self.close_stream("turn completed");
        }
    }

    fn open_stream(&mut self, session_id: SessionId) {
        self.close_stream("resubmitted");
        let connection = ConnectionId(self.next_connection);
        self.next_connection += 1;

        info!(%session_id, %connection, "opening stream");
        let handle = self.api.open_stream(&session_id, connection);
        self.state = State::Streaming(handle);
    }

    fn close_stream(&mut self, reason: &str) {
        let state = std::mem::replace(&mut self.state, State::NoSession);
        self.state = match state {
            State::Streaming(handle) => {
                let session_id = handle.session_id().clone();
                info!(connection = %handle.connection(), reason, "closing stream");
                self.log_diagnostic(format!("stream {} closed: {reason}", handle.connection()));
                handle.close();
                State::Selected(session_id)
            }
            other => other,
        };
    }

    fn is_active_connection(&self, connection: ConnectionId) -> bool {
        self.active_connection() == Some(connection)
    }

    #[cfg(test)]
    fn api(&self) -> &A {
        &self.api
    }
}
