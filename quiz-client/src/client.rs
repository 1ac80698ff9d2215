//! Live quiz client
//!
//! Drives a [`ClientSession`] over the server's WebSocket channel:
//!
//! ```text
//! run()
//!     ├─ 1. Connecting: open /ws?clientId=.., wait for `ready`
//!     ├─ 2. Connected: GET /reconcile from the contiguous watermark, merge, ack each item
//!     ├─ 3. Loop: pushed question → on_push → ack (a gap triggers step 2 again)
//!     ├─ 4. Connection lost → Disconnected (view kept)
//!     └─ 5. Back off and go to 1, until attempts run out or shutdown
//! ```
//!
//! Reconciling only after `ready` closes the window between the backlog
//! snapshot and the server registering the session. Acks are
//! fire-and-forget; a lost ack is repaired by the next reconciliation.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use shared::{ClientMessage, Question, ReadyPayload, ServerMessage};
use tokio::net::TcpStream;
use tokio::sync::{Notify, broadcast};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;

use crate::session::{ClientSession, ConnectionState, Gap, PushOutcome};
use crate::{ClientConfig, ClientError, ClientResult, HttpClient};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Event channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Events published for UI layers
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    StateChanged(ConnectionState),
    /// Accepted push
    Question(Question),
    Gap(Gap),
    /// Backlog merged after (re)connect or on request
    Reconciled { merged: usize, last_seq: u64 },
    /// Non-fatal error (server error frame, failed reconcile, transport error)
    Error(String),
}

/// Quiz client with automatic reconnect
#[derive(Debug, Clone)]
pub struct QuizClient {
    config: ClientConfig,
    http: HttpClient,
    session: Arc<Mutex<ClientSession>>,
    events: broadcast::Sender<ClientEvent>,
    reconcile_requested: Arc<Notify>,
    cancel: CancellationToken,
}

impl QuizClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = HttpClient::new(&config)?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            session: Arc::new(Mutex::new(ClientSession::new(config.client_id.clone()))),
            config,
            http,
            events,
            reconcile_requested: Arc::new(Notify::new()),
            cancel: CancellationToken::new(),
        })
    }

    /// Subscribe to client events
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn client_id(&self) -> &str {
        &self.config.client_id
    }

    pub fn state(&self) -> ConnectionState {
        self.session.lock().state()
    }

    pub fn last_seq(&self) -> u64 {
        self.session.lock().last_seq()
    }

    /// Highest `seq` with every earlier `seq` held
    pub fn contiguous_seq(&self) -> u64 {
        self.session.lock().contiguous_seq()
    }

    pub fn gap_warning(&self) -> Option<Gap> {
        self.session.lock().gap_warning()
    }

    /// Copy of the local view, ascending by `seq`
    pub fn questions(&self) -> Vec<Question> {
        self.session.lock().questions().cloned().collect()
    }

    /// Ask the running client to reconcile now
    pub fn request_reconcile(&self) {
        self.reconcile_requested.notify_one();
    }

    /// Stop `run` and close the connection
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    fn emit(&self, event: ClientEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    fn set_disconnected(&self) {
        let changed = {
            let mut session = self.session.lock();
            let was = session.state();
            session.on_disconnected();
            was != ConnectionState::Disconnected
        };
        if changed {
            self.emit(ClientEvent::StateChanged(ConnectionState::Disconnected));
        }
    }

    /// Connect and keep reconnecting until shutdown
    ///
    /// Returns `Ok(())` after [`QuizClient::shutdown`], or
    /// [`ClientError::ReconnectExhausted`] once the reconnect policy gives up.
    pub async fn run(&self) -> ClientResult<()> {
        let ws_url = self.config.ws_url()?;
        let policy = self.config.reconnect.clone();
        let mut attempt: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Ok(());
            }

            if self.session.lock().begin_connect() {
                self.emit(ClientEvent::StateChanged(ConnectionState::Connecting));
            }

            let connect = tokio::select! {
                _ = self.cancel.cancelled() => {
                    self.set_disconnected();
                    return Ok(());
                }
                result = connect_async(ws_url.as_str()) => result,
            };

            match connect {
                Ok((socket, _)) => {
                    attempt = 0;
                    if let Err(e) = self.run_connected(socket).await {
                        tracing::warn!(client_id = %self.config.client_id, error = %e, "Live connection lost");
                        self.emit(ClientEvent::Error(e.to_string()));
                    }
                }
                Err(e) => {
                    tracing::warn!(client_id = %self.config.client_id, error = %e, "Connect failed");
                    self.emit(ClientEvent::Error(e.to_string()));
                }
            }

            self.set_disconnected();
            if self.cancel.is_cancelled() {
                return Ok(());
            }

            attempt += 1;
            if !policy.allows(attempt) {
                tracing::error!(client_id = %self.config.client_id, attempts = attempt - 1, "Giving up reconnecting");
                return Err(ClientError::ReconnectExhausted(attempt - 1));
            }

            let delay = policy.delay_for(attempt);
            tracing::info!(attempt, delay_ms = delay.as_millis() as u64, "Reconnecting");
            tokio::select! {
                _ = self.cancel.cancelled() => return Ok(()),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Serve one established connection until it drops or shutdown
    async fn run_connected(&self, socket: WsStream) -> ClientResult<()> {
        let (mut sink, mut stream) = socket.split();

        let ready_timeout = Duration::from_secs(self.config.timeout.max(1));
        let ready = tokio::select! {
            _ = self.cancel.cancelled() => return Ok(()),
            ready = tokio::time::timeout(ready_timeout, self.wait_ready(&mut stream)) => {
                ready.map_err(|_| ClientError::ReadyTimeout)??
            }
        };
        let Some(ready) = ready else {
            return Ok(());
        };

        let Some(from) = self.session.lock().on_connected() else {
            return Ok(());
        };
        self.emit(ClientEvent::StateChanged(ConnectionState::Connected));
        tracing::info!(
            client_id = %self.config.client_id,
            session_id = ready.session_id,
            server_seq = ready.current_seq,
            from,
            "Connected"
        );

        self.reconcile(&mut sink, from).await?;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    let _ = sink.send(Message::Close(None)).await;
                    return Ok(());
                }

                _ = self.reconcile_requested.notified() => {
                    let from = self.session.lock().reconcile_from();
                    self.reconcile(&mut sink, from).await?;
                }

                frame = stream.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_server_message(&mut sink, text.as_str()).await?;
                        }
                        Some(Ok(Message::Close(_))) | None => return Ok(()),
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(e.into()),
                    }
                }
            }
        }
    }

    async fn handle_server_message(&self, sink: &mut WsSink, text: &str) -> ClientResult<()> {
        let message = match serde_json::from_str::<ServerMessage>(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unknown frame");
                return Ok(());
            }
        };

        match message {
            ServerMessage::Question(question) => {
                let seq = question.seq;
                let outcome = self.session.lock().on_push(question.clone());
                match outcome {
                    PushOutcome::Accepted { gap } => {
                        self.emit(ClientEvent::Question(question));
                        send_ack(sink, seq).await?;
                        if let Some(gap) = gap {
                            tracing::warn!(expected = gap.expected, received = gap.received, "{}", gap);
                            self.emit(ClientEvent::Gap(gap));
                            // Picked up by the run loop once this frame is done
                            self.request_reconcile();
                        }
                    }
                    PushOutcome::Duplicate => {
                        tracing::debug!(seq, "Duplicate push discarded");
                    }
                    PushOutcome::Ignored => {}
                }
            }
            ServerMessage::Error(payload) => {
                tracing::warn!(message = %payload.message, "Server reported error");
                self.emit(ClientEvent::Error(payload.message));
            }
            ServerMessage::Ready(_) => {
                tracing::debug!("Duplicate ready frame ignored");
            }
        }
        Ok(())
    }

    /// Read frames until the server confirms the session
    ///
    /// `None` when the server closes first (e.g. a rejected session).
    async fn wait_ready(&self, stream: &mut WsSource) -> ClientResult<Option<ReadyPayload>> {
        while let Some(frame) = stream.next().await {
            let text = match frame? {
                Message::Text(text) => text,
                Message::Close(_) => return Ok(None),
                _ => continue,
            };
            match serde_json::from_str::<ServerMessage>(text.as_str()) {
                Ok(ServerMessage::Ready(ready)) => return Ok(Some(ready)),
                Ok(ServerMessage::Error(payload)) => {
                    tracing::warn!(message = %payload.message, "Server rejected session");
                    self.emit(ClientEvent::Error(payload.message));
                }
                Ok(ServerMessage::Question(question)) => {
                    tracing::debug!(seq = question.seq, "Push before ready ignored");
                }
                Err(e) => tracing::debug!(error = %e, "Ignoring unknown frame"),
            }
        }
        Ok(None)
    }

    /// Fetch the backlog, merge it and ack every item
    ///
    /// An HTTP failure is reported but keeps the connection; only a failed
    /// ack send is returned as an error.
    async fn reconcile(&self, sink: &mut WsSink, from: u64) -> ClientResult<()> {
        let backlog = match self.http.reconcile(from).await {
            Ok(response) => response.questions,
            Err(e) => {
                tracing::warn!(client_id = %self.config.client_id, error = %e, "Reconcile failed");
                self.emit(ClientEvent::Error(format!("Reconcile failed: {}", e)));
                return Ok(());
            }
        };

        let (to_ack, last_seq) = {
            let mut session = self.session.lock();
            let to_ack = session.merge_backlog(backlog);
            (to_ack, session.last_seq())
        };

        for seq in &to_ack {
            send_ack(sink, *seq).await?;
        }

        tracing::info!(merged = to_ack.len(), last_seq, "Reconciled");
        self.emit(ClientEvent::Reconciled {
            merged: to_ack.len(),
            last_seq,
        });
        Ok(())
    }
}

async fn send_ack(sink: &mut WsSink, seq: u64) -> ClientResult<()> {
    let json = ClientMessage::ack(seq).to_json()?;
    sink.send(Message::Text(json.into())).await?;
    Ok(())
}
