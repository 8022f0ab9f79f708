//! STOMP-over-WebSocket channel.
//!
//! Provides [`StompChannel`], a handle to a background task that owns the
//! WebSocket. Commands go in through a bounded queue; connection state and
//! inbound messages come out as [`ChannelEvent`]s. Opening the channel never
//! blocks the caller: the handshake outcome arrives as the first event.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parley_proto::{Command, Frame, Topic};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::ChannelError;

/// Receipt id attached to the DISCONNECT frame.
const DISCONNECT_RECEIPT: &str = "parley-disconnect";

/// Channel configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// WebSocket URL of the broker.
    pub endpoint: String,
    /// Virtual host sent in the CONNECT frame.
    pub host: String,
    /// Capacity of the command queue.
    pub command_buffer: usize,
    /// How long [`StompChannel::shutdown`] waits for DISCONNECT to go out.
    pub shutdown_grace: Duration,
}

impl ChannelConfig {
    /// Configuration for `endpoint`, using its host name as virtual host.
    pub fn new(endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        let host = host_of(&endpoint).unwrap_or("localhost").to_string();
        Self { endpoint, host, command_buffer: 32, shutdown_grace: Duration::from_millis(500) }
    }
}

/// Notifications from the channel task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The broker accepted the CONNECT frame.
    Connected,
    /// A MESSAGE frame arrived.
    Message {
        /// Topic the message was delivered on.
        destination: String,
        /// Raw body.
        body: String,
    },
    /// The channel failed. No further events follow.
    Error {
        /// Rendered cause.
        reason: String,
    },
    /// The channel closed cleanly. No further events follow.
    Closed,
}

#[derive(Debug)]
enum ChannelCommand {
    Subscribe { id: String, destination: String },
    Send { destination: String, body: String },
    Disconnect,
}

/// Handle to a STOMP channel task.
#[derive(Debug)]
pub struct StompChannel {
    commands: mpsc::Sender<ChannelCommand>,
    next_subscription: u64,
    shutdown_grace: Duration,
    task: tokio::task::JoinHandle<()>,
}

impl StompChannel {
    /// Start connecting to `config.endpoint` in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: ChannelConfig, events: mpsc::UnboundedSender<ChannelEvent>) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(config.command_buffer.max(1));
        let shutdown_grace = config.shutdown_grace;
        let task = tokio::spawn(run_channel(config, commands_rx, events));
        Self { commands: commands_tx, next_subscription: 0, shutdown_grace, task }
    }

    /// Subscribe to `topic`. Returns the subscription id.
    ///
    /// Commands queued before the handshake completes are sent right after
    /// it.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] if the channel task has stopped.
    pub async fn subscribe(&mut self, topic: &Topic) -> Result<String, ChannelError> {
        let id = format!("sub-{}", self.next_subscription);
        self.next_subscription += 1;
        self.commands
            .send(ChannelCommand::Subscribe { id: id.clone(), destination: topic.to_string() })
            .await
            .map_err(|_| ChannelError::Closed)?;
        Ok(id)
    }

    /// Send a JSON body to `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] if the channel task has stopped.
    pub async fn publish(&self, topic: &Topic, body: String) -> Result<(), ChannelError> {
        self.commands
            .send(ChannelCommand::Send { destination: topic.to_string(), body })
            .await
            .map_err(|_| ChannelError::Closed)
    }

    /// Ask the broker to close the session. Best effort.
    pub fn disconnect(&self) {
        if self.commands.try_send(ChannelCommand::Disconnect).is_err() {
            tracing::debug!("channel already closed or busy, skipping DISCONNECT");
        }
    }

    /// Close the session and stop the task.
    ///
    /// Queues a DISCONNECT unless one is already queued, then gives the
    /// task up to `shutdown_grace` to flush it before aborting.
    pub async fn shutdown(mut self) {
        if !self.task.is_finished() {
            self.disconnect();
        }
        match tokio::time::timeout(self.shutdown_grace, &mut self.task).await {
            Ok(_) => tracing::debug!("channel closed"),
            Err(_) => tracing::debug!(grace = ?self.shutdown_grace, "channel did not close in time, aborting"),
        }
    }

    /// Stop the channel task immediately.
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for StompChannel {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_channel(
    config: ChannelConfig,
    mut commands: mpsc::Receiver<ChannelCommand>,
    events: mpsc::UnboundedSender<ChannelEvent>,
) {
    let event = match serve(&config, &mut commands, &events).await {
        Ok(()) => ChannelEvent::Closed,
        Err(e) => {
            tracing::warn!(endpoint = %config.endpoint, error = %e, "channel failed");
            ChannelEvent::Error { reason: e.to_string() }
        },
    };
    let _ = events.send(event);
}

/// Connect, then bridge commands and inbound frames until either side ends.
async fn serve(
    config: &ChannelConfig,
    commands: &mut mpsc::Receiver<ChannelCommand>,
    events: &mpsc::UnboundedSender<ChannelEvent>,
) -> Result<(), ChannelError> {
    let (socket, _response) = connect_async(config.endpoint.as_str()).await?;
    let (mut sink, mut stream) = socket.split();

    sink.send(Message::text(Frame::connect(&config.host).encode())).await?;

    loop {
        let Some(message) = stream.next().await else {
            return Err(ChannelError::Transport("closed during handshake".to_string()));
        };
        match message? {
            Message::Text(text) => match Frame::decode(text.as_str())? {
                Some(frame) if frame.command == Command::Connected => break,
                Some(frame) if frame.command == Command::Error => return Err(broker_error(&frame)),
                Some(frame) => tracing::debug!(command = ?frame.command, "ignoring frame before CONNECTED"),
                None => {},
            },
            Message::Close(_) => {
                return Err(ChannelError::Transport("closed during handshake".to_string()));
            },
            _ => {},
        }
    }

    tracing::info!(endpoint = %config.endpoint, "channel connected");
    let _ = events.send(ChannelEvent::Connected);

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(ChannelCommand::Subscribe { id, destination }) => {
                    tracing::debug!(%id, %destination, "subscribing");
                    sink.send(Message::text(Frame::subscribe(&id, &destination).encode())).await?;
                },
                Some(ChannelCommand::Send { destination, body }) => {
                    sink.send(Message::text(Frame::send(&destination, body).encode())).await?;
                },
                Some(ChannelCommand::Disconnect) | None => {
                    tracing::debug!("disconnecting");
                    let _ = sink.send(Message::text(Frame::disconnect(DISCONNECT_RECEIPT).encode())).await;
                    let _ = sink.close().await;
                    return Ok(());
                },
            },
            message = stream.next() => match message {
                Some(Ok(Message::Text(text))) => on_text(text.as_str(), events)?,
                Some(Ok(Message::Close(_))) | None => return Ok(()),
                Some(Ok(_)) => {},
                Some(Err(e)) => return Err(e.into()),
            },
        }
    }
}

/// Handle one inbound text message after the handshake.
fn on_text(text: &str, events: &mpsc::UnboundedSender<ChannelEvent>) -> Result<(), ChannelError> {
    let frame = match Frame::decode(text) {
        Ok(Some(frame)) => frame,
        Ok(None) => return Ok(()),
        Err(e) => {
            tracing::warn!(error = %e, "dropping undecodable frame");
            return Ok(());
        },
    };

    match frame.command {
        Command::Message => {
            let destination = frame.destination().unwrap_or_default().to_string();
            let _ = events.send(ChannelEvent::Message { destination, body: frame.body });
            Ok(())
        },
        Command::Error => Err(broker_error(&frame)),
        other => {
            tracing::debug!(command = ?other, "ignoring frame");
            Ok(())
        },
    }
}

fn broker_error(frame: &Frame) -> ChannelError {
    let message = frame.header(parley_proto::frame::MESSAGE).unwrap_or(frame.body.as_str());
    ChannelError::Broker(message.to_string())
}

/// Host part of a `ws://host:port/path` URL.
fn host_of(endpoint: &str) -> Option<&str> {
    let rest = endpoint.split_once("://").map_or(endpoint, |(_, rest)| rest);
    let authority = rest.split('/').next()?;
    let host = authority.rsplit_once(':').map_or(authority, |(host, _)| host);
    (!host.is_empty()).then_some(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_from_endpoint() {
        assert_eq!(host_of("ws://localhost:8080/ws/websocket"), Some("localhost"));
        assert_eq!(host_of("wss://chat.example.org/ws"), Some("chat.example.org"));
        assert_eq!(host_of("ws:///ws"), None);
    }

    #[test]
    fn config_defaults_host() {
        let config = ChannelConfig::new("ws://broker:61613/ws");
        assert_eq!(config.host, "broker");
        assert_eq!(config.command_buffer, 32);
    }

    #[test]
    fn message_frames_become_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let frame = Frame::new(Command::Message)
            .with_header("destination", "/user/public")
            .with_body(r#"{"senderId":1}"#);

        on_text(&frame.encode(), &tx).unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            ChannelEvent::Message { destination: "/user/public".into(), body: r#"{"senderId":1}"#.into() }
        );
    }

    #[test]
    fn error_frames_end_the_channel() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let frame = Frame::new(Command::Error).with_header("message", "bad destination");

        let error = on_text(&frame.encode(), &tx).unwrap_err();

        assert!(matches!(error, ChannelError::Broker(reason) if reason == "bad destination"));
    }

    #[test]
    fn garbage_frames_are_dropped() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        assert!(on_text("NOT-A-COMMAND\n\n\0", &tx).is_ok());
        assert!(rx.try_recv().is_err());
    }
}
