//! Generic runtime for session orchestration.
//!
//! The Runtime drives the session event loop, coordinating between:
//! - [`Session`]: session state machine
//! - [`Driver`]: platform-specific I/O

use std::collections::VecDeque;

use crate::{
    ChannelHandle, ChannelStatus, ConnectError, Driver, Session, SessionAction, SessionConfig,
    SessionEvent, Subscription,
};

/// Generic runtime that orchestrates a Session and a Driver.
pub struct Runtime<D: Driver> {
    driver: D,
    session: Session,
    subscriptions: Vec<Subscription>,
}

impl<D: Driver> Runtime<D> {
    /// Create a new runtime with the given driver and configuration.
    pub fn new(driver: D, config: SessionConfig) -> Self {
        Self { driver, session: Session::new(config), subscriptions: Vec::new() }
    }

    /// Resolve the identity, open the channel and subscribe.
    ///
    /// Pumps events until both subscriptions are confirmed or bootstrap
    /// failed. A subscribe error fails bootstrap like a refused channel.
    ///
    /// # Errors
    ///
    /// - [`ConnectError::IdentityNotFound`] if the directory has no such user
    /// - [`ConnectError::Directory`] if the lookup could not be completed
    /// - [`ConnectError::Channel`] if the channel could not be opened or
    ///   subscribed, or the driver failed or ran out of events first
    pub async fn bootstrap(&mut self, name: &str, surname: &str) -> Result<ChannelHandle, ConnectError> {
        let actions = self.session.bootstrap(name, surname);
        if self.process_actions(actions).await.map_err(driver_failure)? {
            return Err(ConnectError::Channel("session closed during bootstrap".to_string()));
        }

        loop {
            if let Some(outcome) = self.session.bootstrap_outcome() {
                return outcome.map(|assigned_id| ChannelHandle {
                    assigned_id,
                    subscriptions: self.subscriptions.clone(),
                });
            }

            let Some(event) = self.driver.poll_event(&self.session).await.map_err(driver_failure)? else {
                return Err(ConnectError::Channel("event source closed before the channel connected".to_string()));
            };
            let actions = self.session.handle(event);
            if self.process_actions(actions).await.map_err(driver_failure)? {
                return Err(ConnectError::Channel("session closed during bootstrap".to_string()));
            }
        }
    }

    /// Run the main event loop until the session quits or the driver runs
    /// out of events, then stop the driver.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<(), D::Error> {
        self.pump().await?;
        self.driver.stop().await;
        Ok(())
    }

    /// Process events until the driver has none left or the session quits.
    ///
    /// Returns `true` if the session quit.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn pump(&mut self) -> Result<bool, D::Error> {
        while let Some(event) = self.driver.poll_event(&self.session).await? {
            if self.dispatch(event).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Feed one event to the session and execute the resulting actions.
    ///
    /// Returns `true` if the session quit.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn dispatch(&mut self, event: SessionEvent) -> Result<bool, D::Error> {
        let actions = self.session.handle(event);
        self.process_actions(actions).await
    }

    /// Execute actions, feeding failures back to the session as events.
    ///
    /// Returns `true` if should quit.
    async fn process_actions(&mut self, actions: Vec<SessionAction>) -> Result<bool, D::Error> {
        let mut pending: VecDeque<SessionAction> = actions.into();

        while let Some(action) = pending.pop_front() {
            match action {
                SessionAction::Render(command) => self.driver.render(&self.session, &command)?,
                SessionAction::Quit => return Ok(true),
                SessionAction::Lookup(request) => {
                    if let Err(e) = self.driver.lookup(request.clone()) {
                        tracing::warn!(?request, error = %e, "directory request not dispatched");
                        let event = SessionEvent::lookup_failed(&request, e.to_string());
                        pending.extend(self.session.handle(event));
                    }
                },
                SessionAction::Connect { endpoint } => {
                    if let Err(e) = self.driver.connect(&endpoint) {
                        tracing::warn!(%endpoint, error = %e, "channel connect not started");
                        pending.extend(self.session.handle(SessionEvent::ChannelError { reason: e.to_string() }));
                    }
                },
                SessionAction::Subscribe { topic } if self.session.channel_status() == ChannelStatus::Failed => {
                    tracing::debug!(%topic, "channel failed, skipping subscription");
                },
                SessionAction::Subscribe { topic } => match self.driver.subscribe(&topic).await {
                    Ok(handle) => {
                        tracing::debug!(%topic, ?handle, "subscribed");
                        self.subscriptions.push(Subscription { topic: topic.clone(), handle });
                        pending.extend(self.session.handle(SessionEvent::Subscribed { topic }));
                    },
                    Err(e) => {
                        tracing::warn!(%topic, error = %e, "subscribe failed");
                        pending.extend(self.session.handle(SessionEvent::ChannelError { reason: e.to_string() }));
                    },
                },
                SessionAction::Publish { topic, body } => {
                    if let Err(e) = self.driver.publish(&topic, body).await {
                        tracing::warn!(%topic, error = %e, "publish failed");
                    }
                },
                SessionAction::NotifyDisconnect => self.driver.notify_disconnect(),
            }
        }
        Ok(false)
    }

    /// Active subscriptions.
    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    /// Get a reference to the Session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Get a reference to the Driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get a mutable reference to the Driver
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}

fn driver_failure<E: std::error::Error>(error: E) -> ConnectError {
    ConnectError::Channel(error.to_string())
}
