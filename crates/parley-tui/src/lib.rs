//! Terminal UI for Parley
//!
//! A thin shell over [`parley_app::Driver`] that provides terminal-specific
//! I/O. All orchestration logic lives in the generic [`parley_app::Runtime`].
//!
//! This crate only handles terminal rendering, key input and wiring the
//! network clients to session events.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod input;
pub mod lookup;
pub mod terminal;
pub mod ui;
pub mod view;

pub use input::{Focus, InputState, KeyInput};
pub use parley_app::{Driver, Runtime, Session, SessionConfig, SessionEvent};
pub use terminal::{TerminalDriver, TerminalError};
pub use view::{RosterRow, View};
