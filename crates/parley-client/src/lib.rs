//! Client
//!
//! Concrete I/O capabilities for the Parley session: the real-time channel
//! and the user directory. Both are thin layers that move bytes; session
//! logic stays in the Sans-IO `parley-app` crate.
//!
//! # Components
//!
//! - [`StompChannel`]: STOMP 1.2 over WebSocket, run by a background task
//!   and driven through a command queue
//! - [`DirectoryClient`]: HTTP lookups for users and conversation history

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod channel;
mod directory;
mod error;

pub use channel::{ChannelConfig, ChannelEvent, StompChannel};
pub use directory::{DirectoryClient, DirectoryConfig};
pub use error::{ChannelError, DirectoryError};
