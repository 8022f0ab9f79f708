//! Wire formats for Parley.
//!
//! Everything that crosses a process boundary is defined here so the session
//! state machine and the concrete transports agree on one representation:
//!
//! - [`Frame`]: STOMP 1.2 text frames carried over WebSocket messages
//! - [`Topic`]: destination paths for the private queue, broadcast and send
//! - [`payloads`]: JSON bodies for chat messages and directory records
//!
//! This crate performs no I/O.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
pub mod frame;
pub mod payloads;
pub mod topic;

pub use errors::{FrameError, PayloadError};
pub use frame::{Command, Frame};
pub use payloads::{ChatPayload, UserRecord};
pub use topic::Topic;

/// Stable numeric identifier the directory assigns to every user.
pub type UserId = u64;
