//! Terminal driver for the TUI.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm for
//! keyboard events and ratatui for rendering. Directory requests run as
//! spawned reqwest tasks, the channel is a STOMP-over-WebSocket task.

use std::io::{self, Stdout, stdout};

use chrono::Utc;
use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use parley_app::{DirectoryRequest, Driver, RenderCommand, Session, SessionEvent, SubscriptionHandle, Topic};
use parley_client::{ChannelConfig, ChannelError, ChannelEvent, DirectoryClient, StompChannel};
use ratatui::{Terminal, backend::CrosstermBackend};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::{InputState, KeyInput, View, lookup, ui};

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Channel error.
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Subscribe or publish before the channel was opened.
    #[error("channel not connected")]
    NotConnected,
}

/// Terminal driver implementing the [`Driver`] trait.
///
/// Owns the view model and input state; the session only reaches them
/// through render commands.
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_stream: EventStream,
    directory: DirectoryClient,
    answers_tx: mpsc::UnboundedSender<SessionEvent>,
    answers: mpsc::UnboundedReceiver<SessionEvent>,
    channel: Option<StompChannel>,
    channel_tx: mpsc::UnboundedSender<ChannelEvent>,
    channel_events: mpsc::UnboundedReceiver<ChannelEvent>,
    view: View,
    input: InputState,
}

impl TerminalDriver {
    /// Take over the terminal.
    pub fn new(directory: DirectoryClient) -> Result<Self, TerminalError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
        let (answers_tx, answers) = mpsc::unbounded_channel();
        let (channel_tx, channel_events) = mpsc::unbounded_channel();

        let mut driver = Self {
            terminal,
            event_stream: EventStream::new(),
            directory,
            answers_tx,
            answers,
            channel: None,
            channel_tx,
            channel_events,
            view: View::new(),
            input: InputState::new(),
        };
        draw(&mut driver.terminal, &driver.view, &driver.input)?;
        Ok(driver)
    }

    /// Convert crossterm `KeyCode` to `KeyInput`.
    fn convert_key(code: KeyCode) -> Option<KeyInput> {
        match code {
            KeyCode::Char(c) => Some(KeyInput::Char(c)),
            KeyCode::Enter => Some(KeyInput::Enter),
            KeyCode::Backspace => Some(KeyInput::Backspace),
            KeyCode::Delete => Some(KeyInput::Delete),
            KeyCode::Tab => Some(KeyInput::Tab),
            KeyCode::Esc => Some(KeyInput::Esc),
            KeyCode::Left => Some(KeyInput::Left),
            KeyCode::Right => Some(KeyInput::Right),
            KeyCode::Up => Some(KeyInput::Up),
            KeyCode::Down => Some(KeyInput::Down),
            KeyCode::Home => Some(KeyInput::Home),
            KeyCode::End => Some(KeyInput::End),
            KeyCode::PageUp => Some(KeyInput::PageUp),
            KeyCode::PageDown => Some(KeyInput::PageDown),
            _ => None,
        }
    }
}

fn draw(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    view: &View,
    input: &InputState,
) -> Result<(), TerminalError> {
    terminal.draw(|frame| ui::render(frame, view, input))?;
    Ok(())
}

impl Driver for TerminalDriver {
    type Error = TerminalError;

    async fn poll_event(&mut self, _session: &Session) -> Result<Option<SessionEvent>, Self::Error> {
        loop {
            tokio::select! {
                biased;

                Some(event) = self.answers.recv() => return Ok(Some(event)),

                Some(event) = self.channel_events.recv() => return Ok(Some(lookup::channel_event(event))),

                maybe_event = self.event_stream.next() => match maybe_event {
                    Some(Ok(Event::Key(key_event))) if key_event.kind == KeyEventKind::Press => {
                        if let Some(key) = Self::convert_key(key_event.code) {
                            if let Some(event) = self.input.handle_key(key, &mut self.view, Utc::now()) {
                                return Ok(Some(event));
                            }
                            draw(&mut self.terminal, &self.view, &self.input)?;
                        }
                    },
                    Some(Ok(Event::Resize(..))) => draw(&mut self.terminal, &self.view, &self.input)?,
                    Some(Ok(_)) => {},
                    Some(Err(e)) => return Err(TerminalError::Io(e)),
                    None => return Ok(None),
                },
            }
        }
    }

    fn lookup(&mut self, request: DirectoryRequest) -> Result<(), Self::Error> {
        let directory = self.directory.clone();
        let answers = self.answers_tx.clone();
        tokio::spawn(async move {
            let event = lookup::answer(&directory, request).await;
            if answers.send(event).is_err() {
                tracing::debug!("driver gone, dropping directory answer");
            }
        });
        Ok(())
    }

    fn connect(&mut self, endpoint: &str) -> Result<(), Self::Error> {
        if let Some(previous) = self.channel.take() {
            previous.stop();
        }
        tracing::info!(%endpoint, "opening channel");
        self.channel = Some(StompChannel::spawn(ChannelConfig::new(endpoint), self.channel_tx.clone()));
        Ok(())
    }

    async fn subscribe(&mut self, topic: &Topic) -> Result<SubscriptionHandle, Self::Error> {
        let channel = self.channel.as_mut().ok_or(TerminalError::NotConnected)?;
        Ok(SubscriptionHandle(channel.subscribe(topic).await?))
    }

    async fn publish(&mut self, topic: &Topic, body: String) -> Result<(), Self::Error> {
        let channel = self.channel.as_ref().ok_or(TerminalError::NotConnected)?;
        Ok(channel.publish(topic, body).await?)
    }

    fn render(&mut self, _session: &Session, command: &RenderCommand) -> Result<(), Self::Error> {
        self.view.apply(command);
        draw(&mut self.terminal, &self.view, &self.input)
    }

    fn notify_disconnect(&mut self) {
        if let Some(channel) = &self.channel {
            channel.disconnect();
        }
    }

    async fn stop(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.shutdown().await;
        }
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.stop();
        }
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}
