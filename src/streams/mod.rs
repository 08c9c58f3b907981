//! Named event streams.
//!
//! # Data Flow
//! ```text
//! business logic
//!     → StreamManager::publish(name, event)
//!     → per-stream broadcast channel (+ optional replay buffer)
//!     → Subscription (one per connected client)
//!     → http::stream relay renders SSE frames
//! ```
//!
//! # Design Decisions
//! - One broadcast channel per stream: publish order is delivery order
//! - Lagging subscribers skip what overflowed and keep receiving
//! - Removing a stream drops its sender, which ends every subscription
//! - Replay is opt-in; by default a subscriber only sees later events

pub mod event;
pub mod manager;

pub use event::StreamEvent;
pub use manager::{StreamManager, Subscription};
