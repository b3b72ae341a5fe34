use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Config;
use crate::error::{ClientError, ClientResult};
use crate::event::{AppEvent, ConnectionId};
use crate::session::{MessageAck, SessionDetail, SessionId, SessionSummary};

/// Operations the session controller drives. Results come back as
/// [`AppEvent`]s, never as return values.
pub trait AgentApi {
    fn list_sessions(&self);
    fn create_session(&self);
    fn fetch_session(&self, session_id: &SessionId);
    fn post_message(&self, session_id: &SessionId, text: &str);
    fn open_stream(&self, session_id: &SessionId, connection: ConnectionId) -> StreamHandle;
    fn upload_file(&self, path: &Path);
}

/// Owner of one live connection. Closing or dropping it stops the socket task.
#[derive(Debug)]
pub struct StreamHandle {
    connection: ConnectionId,
    session_id: SessionId,
    shutdown: Option<oneshot::Sender<()>>,
}

impl StreamHandle {
    pub fn new(
        connection: ConnectionId,
        session_id: SessionId,
        shutdown: oneshot::Sender<()>,
    ) -> Self {
        Self {
            connection,
            session_id,
            shutdown: Some(shutdown),
        }
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::Sender<AppEvent>,
    repaint: Option<egui::Context>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<AppEvent>, repaint: Option<egui::Context>) -> Self {
        Self { tx, repaint }
    }

    pub fn send(&self, event: AppEvent) {
        if self.tx.send(event).is_err() {
            debug!("ui event channel closed; dropping event");
            return;
        }
        if let Some(ctx) = &self.repaint {
            ctx.request_repaint();
        }
    }
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    pub fn new(mut base: Url) -> Self {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self { base }
    }

    pub fn sessions(&self) -> ClientResult<Url> {
        Ok(self.base.join("sessions/")?)
    }

    // The id is pushed as one segment so it is percent-encoded.
    fn session_path(&self, session_id: &SessionId, tail: Option<&str>) -> ClientResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::Url(::url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push("sessions")
            .push(session_id.as_str())
            .extend(tail);
        Ok(url)
    }

    pub fn session(&self, session_id: &SessionId) -> ClientResult<Url> {
        self.session_path(session_id, None)
    }

    pub fn messages(&self, session_id: &SessionId, text: &str) -> ClientResult<Url> {
        let mut url = self.session_path(session_id, Some("messages"))?;
        url.query_pairs_mut().append_pair("text", text);
        Ok(url)
    }

    pub fn stream(&self, session_id: &SessionId) -> ClientResult<Url> {
        let mut url = self.session_path(session_id, Some("stream"))?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| ClientError::Transport(format!("cannot derive websocket url from {url}")))?;
        Ok(url)
    }

    pub fn upload(&self) -> ClientResult<Url> {
        Ok(self.base.join("api/upload")?)
    }
}

#[derive(Clone)]
pub struct HttpAgentApi {
    endpoints: Endpoints,
    client: reqwest::Client,
    sink: EventSink,
    runtime_handle: Handle,
}

impl HttpAgentApi {
    pub fn new(config: &Config, sink: EventSink, runtime_handle: Handle) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            endpoints: Endpoints::new(config.base_url.clone()),
            client,
            sink,
            runtime_handle,
        })
    }

    fn spawn_request<F>(&self, operation: &'static str, request: F)
    where
        F: Future<Output = ClientResult<AppEvent>> + Send + 'static,
    {
        let sink = self.sink.clone();
        self.runtime_handle.spawn(async move {
            match request.await {
                Ok(event) => sink.send(event),
                Err(err) => {
                    warn!(operation, "request failed: {err}");
                    sink.send(AppEvent::RequestFailed {
                        operation,
                        message: err.to_string(),
                    });
                }
            }
        });
    }
}

impl AgentApi for HttpAgentApi {
    fn list_sessions(&self) {
        let client = self.client.clone();
        let url = self.endpoints.sessions();
        self.spawn_request("list sessions", async move {
            let sessions: Vec<SessionSummary> = get_json(&client, url?).await?;
            debug!(count = sessions.len(), "sessions listed");
            Ok::<_, ClientError>(AppEvent::SessionsListed(sessions))
        });
    }

    fn create_session(&self) {
        let client = self.client.clone();
        let url = self.endpoints.sessions();
        self.spawn_request("create session", async move {
            let response = check_status(client.post(url?).send().await?)?;
            let session: SessionSummary = response.json().await?;
            info!(session_id = %session.session_id, "session created");
            Ok::<_, ClientError>(AppEvent::SessionCreated(session))
        });
    }

    fn fetch_session(&self, session_id: &SessionId) {
        let client = self.client.clone();
        let url = self.endpoints.session(session_id);
        self.spawn_request("load session", async move {
            let detail: SessionDetail = get_json(&client, url?).await?;
            debug!(
                session_id = %detail.session_id,
                messages = detail.messages.len(),
                "session history loaded"
            );
            Ok::<_, ClientError>(AppEvent::SessionLoaded(detail))
        });
    }

    fn post_message(&self, session_id: &SessionId, text: &str) {
        let client = self.client.clone();
        let sink = self.sink.clone();
        let url = self.endpoints.messages(session_id, text);
        let session_id = session_id.clone();
        let text = text.to_string();

        self.runtime_handle.spawn(async move {
            let event = match submit(&client, url).await {
                Ok(ack) => {
                    debug!(%session_id, status = ?ack.status, "message accepted");
                    AppEvent::MessageAccepted { session_id, ack }
                }
                Err(err) => {
                    warn!(%session_id, "message submission failed: {err}");
                    let reason = match err {
                        ClientError::SubmissionRejected { reason } => reason,
                        other => other.to_string(),
                    };
                    AppEvent::SubmissionRejected {
                        session_id,
                        text,
                        reason,
                    }
                }
            };
            sink.send(event);
        });
    }

    fn open_stream(&self, session_id: &SessionId, connection: ConnectionId) -> StreamHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let sink = self.sink.clone();
        let url = self.endpoints.stream(session_id);

        self.runtime_handle.spawn(async move {
            match url {
                Ok(url) => run_stream(url, connection, sink, shutdown_rx).await,
                Err(err) => sink.send(AppEvent::StreamFailed {
                    connection,
                    message: err.to_string(),
                }),
            }
        });

        StreamHandle::new(connection, session_id.clone(), shutdown_tx)
    }

    fn upload_file(&self, path: &Path) {
        let client = self.client.clone();
        let url = self.endpoints.upload();
        let path = path.to_path_buf();
        self.spawn_request("upload file", async move { upload(&client, url?, path).await });
    }
}

async fn get_json<T: DeserializeOwned>(client: &reqwest::Client, url: Url) -> ClientResult<T> {
    let response = check_status(client.get(url).send().await?)?;
    Ok(response.json().await?)
}

fn check_status(response: reqwest::Response) -> ClientResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(ClientError::Status {
        endpoint: response.url().path().to_string(),
        status: status.as_u16(),
    })
}

async fn submit(client: &reqwest::Client, url: ClientResult<Url>) -> ClientResult<MessageAck> {
    let response = client.post(url?).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let reason = if body.trim().is_empty() {
            format!("status {status}")
        } else {
            format!("status {status}: {}", body.trim())
        };
        return Err(ClientError::SubmissionRejected { reason });
    }
    Ok(response.json().await?)
}

async fn upload(client: &reqwest::Client, url: Url, path: PathBuf) -> ClientResult<AppEvent> {
    let bytes = tokio::fs::read(&path).await?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string());

    let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.clone());
    let form = reqwest::multipart::Form::new().part("file", part);
    check_status(client.post(url).multipart(form).send().await?)?;
    info!(%filename, "file uploaded");
    Ok(AppEvent::FileUploaded { filename })
}

async fn run_stream(
    url: Url,
    connection: ConnectionId,
    sink: EventSink,
    mut shutdown: oneshot::Receiver<()>,
) {
    let (mut socket, _) = tokio::select! {
        _ = &mut shutdown => {
            debug!(%connection, "stream closed before connecting");
            return;
        }
        connected = connect_async(url.as_str()) => match connected {
            Ok(connected) => connected,
            Err(err) => {
                warn!(%connection, %url, "stream connect failed: {err}");
                sink.send(AppEvent::StreamFailed {
                    connection,
                    message: ClientError::from(err).to_string(),
                });
                return;
            }
        },
    };

    info!(%connection, %url, "stream opened");
    sink.send(AppEvent::StreamOpened { connection });

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                debug!(%connection, "stream closed by client");
                let _ = socket.close(None).await;
                return;
            }
            message = socket.next() => match message {
                Some(Ok(WsMessage::Text(frame))) => {
                    sink.send(AppEvent::StreamFrame { connection, frame });
                }
                Some(Ok(WsMessage::Binary(bytes))) => {
                    let frame = String::from_utf8_lossy(&bytes).into_owned();
                    sink.send(AppEvent::StreamFrame { connection, frame });
                }
                Some(Ok(WsMessage::Close(_))) | None => {
                    info!(%connection, "stream closed by server");
                    sink.send(AppEvent::StreamClosed { connection });
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    warn!(%connection, "stream error: {err}");
                    sink.send(AppEvent::StreamFailed {
                        connection,
                        message: ClientError::from(err).to_string(),
                    });
                    return;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints(base: &str) -> Endpoints {
        Endpoints::new(Url::parse(base).expect("fixture url should parse"))
    }

    #[test]
    fn builds_session_urls() {
        let endpoints = endpoints("http://localhost:8000");
        let id = SessionId::new("7");
        assert_eq!(
            endpoints.sessions().expect("sessions url").as_str(),
            "http://localhost:8000/sessions/"
        );
        assert_eq!(
            endpoints.session(&id).expect("session url").as_str(),
            "http://localhost:8000/sessions/7"
        );
        assert_eq!(
            endpoints.upload().expect("upload url").as_str(),
            "http://localhost:8000/api/upload"
        );
    }

    #[test]
    fn message_text_goes_in_the_query() {
        let url = endpoints("http://localhost:8000/")
            .messages(&SessionId::new("7"), "open a & b")
            .expect("messages url");
        assert_eq!(url.path(), "/sessions/7/messages");
        assert_eq!(url.query(), Some("text=open+a+%26+b"));
    }

    #[test]
    fn stream_url_switches_scheme_and_keeps_base_path() {
        assert_eq!(
            endpoints("http://localhost:8000")
                .stream(&SessionId::new("7"))
                .expect("stream url")
                .as_str(),
            "ws://localhost:8000/sessions/7/stream"
        );
        assert_eq!(
            endpoints("https://agents.example.com/desk")
                .stream(&SessionId::new("abc"))
                .expect("stream url")
                .as_str(),
            "wss://agents.example.com/desk/sessions/abc/stream"
        );
    }

    #[test]
    fn closing_a_handle_signals_the_socket_task() {
        let (tx, mut rx) = oneshot::channel();
        let handle = StreamHandle::new(ConnectionId(1), SessionId::new("1"), tx);
        assert_eq!(handle.connection(), ConnectionId(1));
        handle.close();
        assert_eq!(rx.try_recv(), Ok(()));
    }

    #[test]
    fn session_id_is_a_single_encoded_segment() {
        let endpoints = endpoints("http://localhost:8000/");
        let id = SessionId::new("a/b?x=1#f");

        let url = endpoints.messages(&id, "hi").expect("messages url");
        assert_eq!(url.path(), "/sessions/a%2Fb%3Fx=1%23f/messages");
        assert_eq!(url.query(), Some("text=hi"));
        assert_eq!(url.fragment(), None);

        assert_eq!(
            endpoints.session(&id).expect("session url").path(),
            "/sessions/a%2Fb%3Fx=1%23f"
        );
        assert_eq!(
            endpoints.stream(&id).expect("stream url").path(),
            "/sessions/a%2Fb%3Fx=1%23f/stream"
        );
    }
}
