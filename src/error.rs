use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Start or select a session first.")]
    NoActiveSession,
    #[error("message was not accepted: {reason}")]
    SubmissionRejected { reason: String },
    #[error("connection error: {0}")]
    Transport(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{endpoint} returned status {status}")]
    Status { endpoint: String, status: u16 },
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
