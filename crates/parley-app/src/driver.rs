//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the session runtime from specific I/O
//! implementations. Each frontend implements the trait to provide the
//! directory, the channel and a render surface, while the generic
//! [`crate::Runtime`] handles all orchestration.

use std::future::Future;

use parley_proto::{Topic, UserId};

use crate::{DirectoryRequest, RenderCommand, Session, SessionEvent};

/// Abstracts I/O operations for the session runtime.
///
/// # Implementations
///
/// - **TUI**: crossterm for terminal events, reqwest for the directory,
///   tokio-tungstenite for the STOMP channel
/// - **Simulation**: scripted directory and channel with a recorded render
///   surface
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next input event.
    ///
    /// Returns `None` when the event source is exhausted.
    fn poll_event(
        &mut self,
        session: &Session,
    ) -> impl Future<Output = Result<Option<SessionEvent>, Self::Error>> + Send;

    /// Start a directory request without waiting for it.
    ///
    /// The answer must come back from [`poll_event`](Driver::poll_event) as
    /// the response event echoing the request token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be dispatched.
    fn lookup(&mut self, request: DirectoryRequest) -> Result<(), Self::Error>;

    /// Start opening the channel without waiting for it.
    ///
    /// The outcome comes back as [`SessionEvent::ChannelConnected`] or
    /// [`SessionEvent::ChannelError`].
    ///
    /// # Errors
    ///
    /// Returns an error if the attempt could not be started.
    fn connect(&mut self, endpoint: &str) -> Result<(), Self::Error>;

    /// Subscribe to `topic`.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is closed.
    fn subscribe(
        &mut self,
        topic: &Topic,
    ) -> impl Future<Output = Result<SubscriptionHandle, Self::Error>> + Send;

    /// Publish a JSON body on `topic`.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is closed or the send fails.
    fn publish(
        &mut self,
        topic: &Topic,
        body: String,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Apply a render command.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be drawn.
    fn render(&mut self, session: &Session, command: &RenderCommand) -> Result<(), Self::Error>;

    /// Tell the backend the user is leaving. Best effort, never fails.
    fn notify_disconnect(&mut self);

    /// Stop the channel and clean up resources.
    ///
    /// May wait briefly for a pending disconnect notice to go out.
    fn stop(&mut self) -> impl Future<Output = ()> + Send;
}

/// Identifies a channel subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub String);

/// An active subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Subscribed topic.
    pub topic: Topic,
    /// Handle returned by the channel.
    pub handle: SubscriptionHandle,
}

/// A connected channel, as returned by a successful bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHandle {
    /// Id the directory assigned to the logged-in user.
    pub assigned_id: UserId,
    /// Private queue and broadcast subscriptions.
    pub subscriptions: Vec<Subscription>,
}
