//! Wheels Realtime Client
//!
//! A WebSocket client for the `/ws` event stream that reconnects with
//! exponential backoff.
//!
//! # Usage
//!
//! ```rust,ignore
//! use wheels_realtime::{RealtimeClient, RealtimeEvent};
//!
//! let client = RealtimeClient::new("wss://api.wheels.example/ws?userId=u1");
//! let mut events = client.subscribe();
//! client.connect()?;
//!
//! while let Ok(event) = events.recv().await {
//!     if let RealtimeEvent::ChatMessage(message) = event {
//!         println!("{}", message["text"]);
//!     }
//! }
//! ```

mod client;
mod error;
mod event;
mod policy;

pub use client::{ConnectionState, RealtimeClient};
pub use error::RealtimeError;
pub use event::RealtimeEvent;
pub use policy::ReconnectPolicy;
