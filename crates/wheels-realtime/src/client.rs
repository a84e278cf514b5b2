//! Reconnecting WebSocket client
//!
//! One background task owns the socket. Outgoing frames reach it over an
//! `mpsc` channel, shutdown over a `watch` channel, and decoded events
//! leave through a `broadcast` channel.

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use crate::error::RealtimeError;
use crate::event::RealtimeEvent;
use crate::policy::ReconnectPolicy;

const EVENT_CAPACITY: usize = 128;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// `connect()` not called yet
    Idle,
    Connecting,
    Open,
    /// Waiting out the backoff before reconnect `attempt`
    Reconnecting { attempt: u32 },
    /// Stopped by `disconnect()`
    Closed,
    /// Reconnect attempts exhausted
    GaveUp,
}

pub struct RealtimeClient {
    url: String,
    policy: ReconnectPolicy,
    events: broadcast::Sender<RealtimeEvent>,
    state: Arc<watch::Sender<ConnectionState>>,
    shutdown: watch::Sender<bool>,
    commands: mpsc::UnboundedSender<Message>,
    pending: Mutex<Option<mpsc::UnboundedReceiver<Message>>>,
}

impl RealtimeClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_policy(url, ReconnectPolicy::default())
    }

    pub fn with_policy(url: impl Into<String>, policy: ReconnectPolicy) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (state, _) = watch::channel(ConnectionState::Idle);
        let (shutdown, _) = watch::channel(false);
        let (commands, pending) = mpsc::unbounded_channel();

        Self {
            url: url.into(),
            policy,
            events,
            state: Arc::new(state),
            shutdown,
            commands,
            pending: Mutex::new(Some(pending)),
        }
    }

    /// Spawn the connection task; must run inside a Tokio runtime
    pub fn connect(&self) -> Result<(), RealtimeError> {
        if *self.shutdown.borrow() {
            return Err(RealtimeError::Stopped);
        }

        let commands = self
            .pending
            .lock()
            .ok()
            .and_then(|mut pending| pending.take())
            .ok_or(RealtimeError::AlreadyStarted)?;

        let worker = Worker {
            url: self.url.clone(),
            policy: self.policy,
            events: self.events.clone(),
            state: Arc::clone(&self.state),
            shutdown: self.shutdown.subscribe(),
            commands,
        };
        tokio::spawn(worker.run());

        Ok(())
    }

    /// Events received from now on
    pub fn subscribe(&self) -> broadcast::Receiver<RealtimeEvent> {
        self.events.subscribe()
    }

    /// Queue a JSON frame; fails unless the socket is open
    pub fn send(&self, value: &Value) -> Result<(), RealtimeError> {
        if self.state() != ConnectionState::Open {
            return Err(RealtimeError::NotConnected);
        }

        let text = serde_json::to_string(value)?;
        self.commands
            .send(Message::Text(text))
            .map_err(|_| RealtimeError::Stopped)
    }

    /// Close the socket and cancel any pending reconnect
    pub fn disconnect(&self) {
        self.shutdown.send_replace(true);

        // Never started, so no task will report the close
        let idle = self
            .pending
            .lock()
            .map(|pending| pending.is_some())
            .unwrap_or(false);
        if idle {
            self.state.send_replace(ConnectionState::Closed);
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }
}

impl Drop for RealtimeClient {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
    }
}

enum SessionEnd {
    Dropped,
    Shutdown,
}

struct Worker {
    url: String,
    policy: ReconnectPolicy,
    events: broadcast::Sender<RealtimeEvent>,
    state: Arc<watch::Sender<ConnectionState>>,
    shutdown: watch::Receiver<bool>,
    commands: mpsc::UnboundedReceiver<Message>,
}

/// Resolves once a stop is requested or the client is gone
async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

impl Worker {
    async fn run(mut self) {
        let mut attempt: u32 = 0;

        loop {
            self.state.send_replace(ConnectionState::Connecting);

            let connected = tokio::select! {
                result = connect_async(self.url.as_str()) => Some(result),
                _ = stop_requested(&mut self.shutdown) => None,
            };

            match connected {
                None => break,
                Some(Ok((socket, _response))) => {
                    attempt = 0;
                    tracing::info!(url = %self.url, "🔌 Realtime connected");
                    self.state.send_replace(ConnectionState::Open);

                    if let SessionEnd::Shutdown = self.session(socket).await {
                        break;
                    }
                    tracing::info!("Realtime connection lost");
                }
                Some(Err(e)) => {
                    tracing::warn!(url = %self.url, error = %e, "Realtime connection failed");
                }
            }

            attempt += 1;
            if !self.policy.allows(attempt) {
                tracing::error!(
                    max_attempts = self.policy.max_attempts,
                    "Max reconnection attempts reached"
                );
                self.state.send_replace(ConnectionState::GaveUp);
                return;
            }

            let delay = self.policy.delay_for(attempt);
            tracing::info!(
                attempt,
                max_attempts = self.policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "Attempting to reconnect..."
            );
            self.state
                .send_replace(ConnectionState::Reconnecting { attempt });

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = stop_requested(&mut self.shutdown) => break,
            }
        }

        self.state.send_replace(ConnectionState::Closed);
        tracing::info!("🔚 Realtime client closed");
    }

    async fn session(&mut self, socket: Socket) -> SessionEnd {
        let (mut sink, mut stream) = socket.split();

        loop {
            tokio::select! {
                // Queued frames go out before a requested close
                biased;

                command = self.commands.recv() => match command {
                    Some(message) => {
                        if let Err(e) = sink.send(message).await {
                            tracing::warn!(error = %e, "Realtime send failed");
                            return SessionEnd::Dropped;
                        }
                    }
                    None => {
                        let _ = sink.send(Message::Close(None)).await;
                        return SessionEnd::Shutdown;
                    }
                },
                _ = stop_requested(&mut self.shutdown) => {
                    let _ = sink.send(Message::Close(None)).await;
                    return SessionEnd::Shutdown;
                }
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.dispatch(&text),
                    Some(Ok(Message::Close(_))) | None => return SessionEnd::Dropped,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Realtime socket error");
                        return SessionEnd::Dropped;
                    }
                },
            }
        }
    }

    fn dispatch(&self, text: &str) {
        match RealtimeEvent::from_text(text) {
            Ok(event) => {
                // No subscribers is fine
                let _ = self.events.send(event);
            }
            Err(e) => tracing::warn!(error = %e, "Error parsing realtime message"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;
    use tokio::time::timeout;
    use tokio_tungstenite::accept_async;

    fn fast_policy(max_attempts: u32) -> ReconnectPolicy {
        ReconnectPolicy::new(Duration::from_millis(5), max_attempts)
    }

    async fn wait_for_state(
        client: &RealtimeClient,
        predicate: impl Fn(ConnectionState) -> bool,
    ) -> ConnectionState {
        let mut states = client.watch_state();
        let state = *timeout(Duration::from_secs(5), states.wait_for(|s| predicate(*s)))
            .await
            .expect("timed out waiting for state")
            .expect("state channel closed");
        state
    }

    /// Accepts TCP connections and drops them before the handshake
    async fn refusing_server() -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&accepted);

        tokio::spawn(async move {
            while let Ok((tcp, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                drop(tcp);
            }
        });

        (url, accepted)
    }

    #[tokio::test]
    async fn test_events_and_send() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(tcp).await.unwrap();
            for frame in [
                r#"{"type":"chat_message","chatId":"c1","text":"hi"}"#,
                "not json",
                r#"{"type":"notification","kind":"payment_succeeded"}"#,
            ] {
                ws.send(Message::Text(frame.into())).await.unwrap();
            }

            let mut received = Vec::new();
            while let Some(Ok(message)) = ws.next().await {
                match message {
                    Message::Text(text) => received.push(text),
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            received
        });

        let client = RealtimeClient::with_policy(url, fast_policy(3));
        let mut events = client.subscribe();
        assert!(matches!(
            client.send(&json!({"type": "ping"})),
            Err(RealtimeError::NotConnected)
        ));

        client.connect().unwrap();

        let first = timeout(Duration::from_secs(5), events.recv()).await.unwrap().unwrap();
        assert!(matches!(&first, RealtimeEvent::ChatMessage(v) if v["text"] == "hi"));
        let second = timeout(Duration::from_secs(5), events.recv()).await.unwrap().unwrap();
        assert!(matches!(second, RealtimeEvent::Notification(_)));

        client.send(&json!({"type": "typing", "chatId": "c1"})).unwrap();
        client.disconnect();

        let received = timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
        assert_eq!(received.len(), 1);
        assert!(received[0].contains("typing"));
        assert_eq!(
            wait_for_state(&client, |s| s == ConnectionState::Closed).await,
            ConnectionState::Closed
        );
    }

    #[tokio::test]
    async fn test_successful_open_resets_attempts() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let (third_tx, third_rx) = oneshot::channel();

        tokio::spawn(async move {
            // Two sessions that drop right after opening
            for _ in 0..2 {
                let (tcp, _) = listener.accept().await.unwrap();
                let ws = accept_async(tcp).await.unwrap();
                drop(ws);
            }
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(tcp).await.unwrap();
            let _ = third_tx.send(());
            while let Some(Ok(message)) = ws.next().await {
                if message.is_close() {
                    break;
                }
            }
        });

        // One reconnect allowed: only a reset counter survives two drops
        let client = RealtimeClient::with_policy(url, fast_policy(1));
        client.connect().unwrap();

        timeout(Duration::from_secs(5), third_rx).await.unwrap().unwrap();
        wait_for_state(&client, |s| s == ConnectionState::Open).await;

        client.disconnect();
        wait_for_state(&client, |s| s == ConnectionState::Closed).await;
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let (url, accepted) = refusing_server().await;

        let client = RealtimeClient::with_policy(url, fast_policy(3));
        client.connect().unwrap();

        wait_for_state(&client, |s| s == ConnectionState::GaveUp).await;
        // The first connect plus three reconnects
        assert_eq!(accepted.load(Ordering::SeqCst), 4);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(accepted.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_disconnect_cancels_pending_reconnect() {
        let (url, accepted) = refusing_server().await;

        let policy = ReconnectPolicy::new(Duration::from_secs(10), 5);
        let client = RealtimeClient::with_policy(url, policy);
        client.connect().unwrap();

        wait_for_state(&client, |s| s == ConnectionState::Reconnecting { attempt: 1 }).await;
        client.disconnect();

        let state = timeout(
            Duration::from_secs(1),
            wait_for_state(&client, |s| s == ConnectionState::Closed),
        )
        .await
        .expect("reconnect timer was not cancelled");
        assert_eq!(state, ConnectionState::Closed);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_connect_twice_and_after_disconnect() {
        let (url, _) = refusing_server().await;

        let client = RealtimeClient::with_policy(url.clone(), fast_policy(1));
        client.connect().unwrap();
        assert!(matches!(client.connect(), Err(RealtimeError::AlreadyStarted)));

        let stopped = RealtimeClient::new(url);
        stopped.disconnect();
        assert_eq!(stopped.state(), ConnectionState::Closed);
        assert!(matches!(stopped.connect(), Err(RealtimeError::Stopped)));
    }
}
