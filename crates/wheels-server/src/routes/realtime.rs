//! Realtime WebSocket Route
//!
//! Streams hub events to connected clients as JSON text frames. The upgrade
//! needs the API key, as a bearer header or `?key=` since browsers cannot
//! set headers on WebSocket requests. `?userId=` selects which chat messages
//! and addressed notifications the socket receives; without it only
//! broadcasts arrive.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{header, HeaderMap},
    response::Response,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeQuery {
    user_id: Option<String>,
    key: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    Query(query): Query<RealtimeQuery>,
    State(state): State<AppState>,
) -> ApiResult<Response> {
    if let Some(expected) = state.api_key.as_deref().filter(|k| !k.is_empty()) {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "));
        let presented = bearer.or(query.key.as_deref());
        if presented != Some(expected) {
            tracing::warn!("Realtime upgrade without a valid API key");
            return Err(ApiError::Unauthorized("Invalid or missing API key".into()));
        }
    }

    let user_id = query.user_id.filter(|u| !u.trim().is_empty());
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user_id)))
}

async fn handle_socket(socket: WebSocket, state: AppState, user_id: Option<String>) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = state.hub.subscribe();

    tracing::info!(
        user_id = ?user_id,
        subscribers = state.hub.subscriber_count(),
        "🔌 Realtime client connected"
    );

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if !event.is_visible_to(user_id.as_deref()) {
                        continue;
                    }
                    let json = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(e) => {
                            tracing::error!("Failed to encode realtime event: {}", e);
                            continue;
                        }
                    };
                    if let Err(e) = sender.send(Message::Text(json)).await {
                        tracing::debug!("Realtime send failed, closing: {}", e);
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Realtime client lagging, events skipped");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    tracing::debug!("Realtime socket error: {}", e);
                    break;
                }
                // Clients only listen; pings are answered by axum
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::info!(user_id = ?user_id, "🔚 Realtime client disconnected");
}

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(websocket_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_state, TestDeps};
    use chrono::Utc;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::sync::broadcast;
    use wheels::{ChatMessageEvent, RealtimeEnvelope};
    use wheels_realtime::{ConnectionState, RealtimeClient, RealtimeEvent};

    const KEY: &str = "test-key";

    async fn serve(state: AppState) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router().with_state(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn keyed_state() -> AppState {
        let mut state = test_state(&TestDeps::default());
        state.api_key = Some(KEY.into());
        state
    }

    async fn wait_until(mut ready: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !ready() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    async fn open_client(
        addr: SocketAddr,
        query: &str,
    ) -> (RealtimeClient, broadcast::Receiver<RealtimeEvent>) {
        let client = RealtimeClient::new(format!("ws://{addr}/ws?{query}"));
        let events = client.subscribe();
        client.connect().unwrap();
        let mut states = client.watch_state();
        tokio::time::timeout(
            Duration::from_secs(5),
            states.wait_for(|s| *s == ConnectionState::Open),
        )
        .await
        .unwrap()
        .unwrap();
        (client, events)
    }

    async fn next_event(events: &mut broadcast::Receiver<RealtimeEvent>) -> RealtimeEvent {
        tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("no event in time")
            .unwrap()
    }

    fn chat(sender: &str, recipient: &str, text: &str) -> RealtimeEnvelope {
        ChatMessageEvent {
            chat_id: "chat-1".into(),
            message_id: format!("msg-{text}"),
            sender_id: sender.into(),
            sender_name: None,
            recipient_id: recipient.into(),
            text: text.into(),
        }
        .envelope(Utc::now())
    }

    fn notification(kind: &str, recipient_id: Option<&str>) -> RealtimeEnvelope {
        RealtimeEnvelope::Notification {
            kind: kind.into(),
            title: "Payment successful".into(),
            body: "Payment of 500 processed".into(),
            data: serde_json::json!({"paymentIntentId": "pi_1"}),
            recipient_id: recipient_id.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_socket_receives_only_visible_events() {
        let state = keyed_state();
        let addr = serve(state.clone()).await;

        let (bob, mut bob_events) = open_client(addr, &format!("userId=bob&key={KEY}")).await;
        let (anon, mut anon_events) = open_client(addr, &format!("key={KEY}")).await;
        let hub = state.hub.clone();
        wait_until(|| hub.subscriber_count() == 2).await;

        state.hub.publish(chat("alice", "carol", "private"));
        state.hub.publish(notification("payment_succeeded", Some("dave")));
        state.hub.publish(chat("alice", "bob", "for-bob"));
        state.hub.publish(notification("payment_succeeded", Some("bob")));
        state.hub.publish(notification("maintenance", None));

        match next_event(&mut bob_events).await {
            RealtimeEvent::ChatMessage(value) => {
                assert_eq!(value["type"], "chat_message");
                assert_eq!(value["text"], "for-bob");
                assert_eq!(value["recipientId"], "bob");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        match next_event(&mut bob_events).await {
            RealtimeEvent::Notification(value) => assert_eq!(value["recipientId"], "bob"),
            other => panic!("unexpected event: {other:?}"),
        }
        match next_event(&mut bob_events).await {
            RealtimeEvent::Notification(value) => assert_eq!(value["kind"], "maintenance"),
            other => panic!("unexpected event: {other:?}"),
        }

        // Anonymous sockets skip every chat and addressed notification
        match next_event(&mut anon_events).await {
            RealtimeEvent::Notification(value) => {
                assert_eq!(value["kind"], "maintenance");
                assert!(value.get("recipientId").is_none());
            }
            other => panic!("unexpected event: {other:?}"),
        }

        bob.disconnect();
        anon.disconnect();
    }

    #[tokio::test]
    async fn test_socket_loop_ends_on_close() {
        let state = keyed_state();
        let addr = serve(state.clone()).await;

        let (client, _events) = open_client(addr, &format!("userId=bob&key={KEY}")).await;
        let hub = state.hub.clone();
        wait_until(|| hub.subscriber_count() == 1).await;

        client.disconnect();
        wait_until(|| hub.subscriber_count() == 0).await;
    }

    #[tokio::test]
    async fn test_upgrade_requires_api_key() {
        let state = keyed_state();
        let addr = serve(state.clone()).await;

        for query in ["userId=bob", "userId=bob&key=wrong"] {
            let err = tokio_tungstenite::connect_async(format!("ws://{addr}/ws?{query}"))
                .await
                .err()
                .unwrap_or_else(|| panic!("upgrade without a valid key succeeded: {query}"));
            match err {
                tokio_tungstenite::tungstenite::Error::Http(response) => {
                    assert_eq!(response.status(), 401);
                }
                other => panic!("expected 401 for {query}, got {other}"),
            }
        }
        assert_eq!(state.hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_upgrade_accepts_bearer_header() {
        use tokio_tungstenite::tungstenite::client::IntoClientRequest;

        let addr = serve(keyed_state()).await;
        let mut request = format!("ws://{addr}/ws?userId=bob")
            .into_client_request()
            .unwrap();
        request.headers_mut().insert(
            header::AUTHORIZATION,
            format!("Bearer {KEY}").parse().unwrap(),
        );

        assert!(tokio_tungstenite::connect_async(request).await.is_ok());
    }
}
