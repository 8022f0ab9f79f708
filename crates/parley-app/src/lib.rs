//! Application layer for Parley
//!
//! Pure state machines and a generic runtime for the chat session, so the
//! same orchestration code runs against a real terminal and network or
//! against a deterministic simulation.
//!
//! # Components
//!
//! - [`Session`]: session synchronization controller (identity bootstrap,
//!   channel lifecycle, inbound routing, unread tracking)
//! - [`Roster`]: ordered peer list with unread and selection flags
//! - [`Conversation`]: transcript of the selected conversation
//! - [`Driver`]: trait for platform-specific I/O
//! - [`Runtime`]: generic event loop wiring a [`Session`] to a [`Driver`]

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod config;
mod conversation;
mod driver;
mod error;
mod event;
mod roster;
mod runtime;
mod session;
mod state;

pub use action::{DirectoryRequest, RenderCommand, SessionAction};
pub use config::{DEFAULT_CHANNEL_ENDPOINT, SessionConfig};
pub use conversation::{Conversation, Placement, TranscriptEntry};
pub use driver::{ChannelHandle, Driver, Subscription, SubscriptionHandle};
pub use error::{ConnectError, FetchError, FetchKind};
pub use event::SessionEvent;
pub use parley_proto::{Topic, UserId, UserRecord};
pub use roster::{Peer, Roster};
pub use runtime::Runtime;
pub use session::Session;
pub use state::{ChannelStatus, ChatMessage, Identity, SessionState, StatusLevel, StatusLine};
