//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the terminal driver but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`parley_app::Runtime`] orchestration code runs in both production and
//! simulation.
//!
//! Directory requests are answered from a scripted [`SimDirectory`]. By
//! default answers are queued as soon as the request is issued; with
//! [`SimDriver::hold_directory`] they are kept until the test releases them,
//! in any order, to reproduce racing responses.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Duration, TimeZone, Utc};
use parley_app::{
    ChatMessage, DirectoryRequest, Driver, RenderCommand, Session, SessionEvent, SubscriptionHandle,
    Topic, UserId, UserRecord,
};

use crate::{InvariantRegistry, SessionSnapshot, SimSurface};

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// Scripted directory contents and failure switches.
#[derive(Debug, Clone, Default)]
pub struct SimDirectory {
    /// Users in directory order.
    pub users: Vec<UserRecord>,
    /// Conversations keyed by the unordered user pair, oldest first.
    pub conversations: HashMap<(UserId, UserId), Vec<ChatMessage>>,
    /// Answer identity lookups with a failure.
    pub fail_identity: bool,
    /// Answer roster fetches with a failure.
    pub fail_roster: bool,
    /// Answer history fetches with a failure.
    pub fail_history: bool,
}

impl SimDirectory {
    /// Directory listing `users`.
    pub fn with_users(users: impl IntoIterator<Item = UserRecord>) -> Self {
        Self { users: users.into_iter().collect(), ..Self::default() }
    }

    /// Record a message in its conversation.
    pub fn add_message(&mut self, message: ChatMessage) {
        let key = pair(message.sender_id(), message.recipient_id());
        self.conversations.entry(key).or_default().push(message);
    }

    /// Answer `request` from the current contents.
    pub fn answer(&self, request: &DirectoryRequest) -> SessionEvent {
        match request {
            DirectoryRequest::FindUser { name, surname } => {
                if self.fail_identity {
                    return SessionEvent::lookup_failed(request, "directory unavailable");
                }
                match self.users.iter().find(|u| &u.name == name && &u.surname == surname) {
                    Some(user) => SessionEvent::IdentityResolved { user: user.clone() },
                    None => SessionEvent::IdentityNotFound,
                }
            },
            DirectoryRequest::ListUsers { request: number } => {
                if self.fail_roster {
                    return SessionEvent::lookup_failed(request, "roster unavailable");
                }
                SessionEvent::RosterLoaded { request: *number, users: self.users.clone() }
            },
            DirectoryRequest::Conversation { own_id, peer_id, generation } => {
                if self.fail_history {
                    return SessionEvent::lookup_failed(request, "history unavailable");
                }
                SessionEvent::HistoryLoaded {
                    generation: *generation,
                    peer_id: *peer_id,
                    messages: self.conversations.get(&pair(*own_id, *peer_id)).cloned().unwrap_or_default(),
                }
            },
        }
    }
}

fn pair(a: UserId, b: UserId) -> (UserId, UserId) {
    (a.min(b), a.max(b))
}

/// Shared state for event injection.
///
/// This allows injection and inspection while the runtime owns the driver.
#[derive(Default)]
struct SharedState {
    pending_events: VecDeque<SessionEvent>,
    directory: SimDirectory,
    hold_directory: bool,
    held: Vec<DirectoryRequest>,
    lookups: Vec<DirectoryRequest>,
    refuse_channel: bool,
    refused_topics: Vec<Topic>,
    fail_publish: bool,
    connects: Vec<String>,
    subscriptions: Vec<Topic>,
    published: Vec<(Topic, String)>,
    surface: SimSurface,
    disconnect_notified: bool,
    stopped: bool,
    clock: i64,
}

/// Simulation driver for deterministic testing.
///
/// Cloning yields another handle to the same simulated world.
#[derive(Clone)]
pub struct SimDriver {
    state: Arc<Mutex<SharedState>>,
    invariants: Option<Arc<InvariantRegistry>>,
}

impl Default for SimDriver {
    fn default() -> Self {
        Self::new(SimDirectory::default())
    }
}

impl SimDriver {
    /// Create a driver answering from `directory`.
    pub fn new(directory: SimDirectory) -> Self {
        let state = SharedState { directory, ..SharedState::default() };
        Self { state: Arc::new(Mutex::new(state)), invariants: None }
    }

    /// Enable invariant checking before every event.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(Arc::new(registry));
        self
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inject a `SessionEvent` for processing.
    pub fn inject_event(&self, event: SessionEvent) {
        self.lock().pending_events.push_back(event);
    }

    /// Deliver a chat message on the private queue of `recipient_id`.
    pub fn deliver(&self, sender_id: UserId, recipient_id: UserId, content: &str) {
        let payload = ChatMessage::new(sender_id, recipient_id, content, None).to_payload();
        let body = payload.to_json().unwrap_or_default();
        self.deliver_raw(&Topic::private_queue(recipient_id), body);
    }

    /// Deliver a raw body on `topic`.
    pub fn deliver_raw(&self, topic: &Topic, body: impl Into<String>) {
        self.inject_event(SessionEvent::Inbound { destination: topic.to_string(), body: body.into() });
    }

    /// The user picks `peer_id`.
    pub fn select(&self, peer_id: UserId) {
        self.inject_event(SessionEvent::PeerSelected { peer_id });
    }

    /// The user submits `content` from the composer.
    pub fn submit(&self, content: &str) {
        let at = self.tick();
        self.inject_event(SessionEvent::ComposerSubmitted { content: content.to_string(), at });
    }

    /// The user leaves.
    pub fn request_teardown(&self) {
        self.inject_event(SessionEvent::TeardownRequested);
    }

    /// Advance the virtual clock by one second and return the new time.
    pub fn tick(&self) -> DateTime<Utc> {
        let mut state = self.lock();
        state.clock += 1;
        let base = Utc.timestamp_opt(1_714_559_400, 0).single().unwrap_or_default();
        base + Duration::seconds(state.clock)
    }

    /// Modify the scripted directory.
    pub fn update_directory(&self, update: impl FnOnce(&mut SimDirectory)) {
        update(&mut self.lock().directory);
    }

    /// Hold directory answers until released.
    pub fn hold_directory(&self, hold: bool) {
        self.lock().hold_directory = hold;
    }

    /// Requests waiting to be released, oldest first.
    pub fn held_requests(&self) -> Vec<DirectoryRequest> {
        self.lock().held.clone()
    }

    /// Answer the held request at `index` from the current directory.
    ///
    /// Returns `false` if there is no such request.
    pub fn release(&self, index: usize) -> bool {
        let mut state = self.lock();
        if index >= state.held.len() {
            return false;
        }
        let request = state.held.remove(index);
        tracing::trace!(?request, still_held = state.held.len(), "releasing held directory request");
        let answer = state.directory.answer(&request);
        state.pending_events.push_back(answer);
        true
    }

    /// Answer every held request, newest first.
    pub fn release_newest_first(&self) {
        loop {
            let Some(last) = self.lock().held.len().checked_sub(1) else {
                break;
            };
            self.release(last);
        }
    }

    /// Answer every held request, oldest first.
    pub fn release_all(&self) {
        while self.release(0) {}
    }

    /// Fail channel connection attempts.
    pub fn refuse_channel(&self, refuse: bool) {
        self.lock().refuse_channel = refuse;
    }

    /// Reject subscriptions to `topic`.
    pub fn refuse_subscription(&self, topic: Topic) {
        self.lock().refused_topics.push(topic);
    }

    /// Fail publishes.
    pub fn fail_publish(&self, fail: bool) {
        self.lock().fail_publish = fail;
    }

    /// Every directory request issued, in order.
    pub fn lookups(&self) -> Vec<DirectoryRequest> {
        self.lock().lookups.clone()
    }

    /// Endpoints connected to.
    pub fn connects(&self) -> Vec<String> {
        self.lock().connects.clone()
    }

    /// Subscribed topics in order.
    pub fn subscriptions(&self) -> Vec<Topic> {
        self.lock().subscriptions.clone()
    }

    /// Published `(topic, body)` pairs in order.
    pub fn published(&self) -> Vec<(Topic, String)> {
        self.lock().published.clone()
    }

    /// Copy of the render surface.
    pub fn surface(&self) -> SimSurface {
        self.lock().surface.clone()
    }

    /// Whether the backend was told the user left.
    pub fn disconnect_notified(&self) -> bool {
        self.lock().disconnect_notified
    }

    /// Whether the driver was stopped.
    pub fn stopped(&self) -> bool {
        self.lock().stopped
    }

    /// Check if there are pending events to process.
    pub fn has_pending(&self) -> bool {
        !self.lock().pending_events.is_empty()
    }

    /// Check invariants against the session and the surface.
    pub fn check_invariants(&self, session: &Session, context: &str) {
        if let Some(registry) = &self.invariants {
            let snapshot = SessionSnapshot::from_session(session).with_surface(&self.lock().surface);
            registry.assert_all(&snapshot, context);
        }
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn poll_event(&mut self, session: &Session) -> Result<Option<SessionEvent>, Self::Error> {
        self.check_invariants(session, "between events");
        Ok(self.lock().pending_events.pop_front())
    }

    fn lookup(&mut self, request: DirectoryRequest) -> Result<(), Self::Error> {
        let mut state = self.lock();
        state.lookups.push(request.clone());
        if state.hold_directory {
            tracing::trace!(?request, "holding directory request");
            state.held.push(request);
        } else {
            let answer = state.directory.answer(&request);
            state.pending_events.push_back(answer);
        }
        Ok(())
    }

    fn connect(&mut self, endpoint: &str) -> Result<(), Self::Error> {
        let mut state = self.lock();
        state.connects.push(endpoint.to_string());
        let outcome = if state.refuse_channel {
            tracing::trace!(%endpoint, "refusing channel");
            SessionEvent::ChannelError { reason: "connection refused".to_string() }
        } else {
            SessionEvent::ChannelConnected
        };
        state.pending_events.push_back(outcome);
        Ok(())
    }

    async fn subscribe(&mut self, topic: &Topic) -> Result<SubscriptionHandle, Self::Error> {
        let mut state = self.lock();
        if state.refused_topics.contains(topic) {
            tracing::trace!(%topic, "refusing subscription");
            return Err(SimDriverError(format!("subscription to {topic} rejected")));
        }
        let handle = SubscriptionHandle(format!("sub-{}", state.subscriptions.len()));
        state.subscriptions.push(topic.clone());
        Ok(handle)
    }

    async fn publish(&mut self, topic: &Topic, body: String) -> Result<(), Self::Error> {
        let mut state = self.lock();
        if state.fail_publish {
            tracing::trace!(%topic, "failing publish");
            return Err(SimDriverError("publish failed".to_string()));
        }
        state.published.push((topic.clone(), body));
        Ok(())
    }

    fn render(&mut self, _session: &Session, command: &RenderCommand) -> Result<(), Self::Error> {
        self.lock().surface.apply(command);
        Ok(())
    }

    fn notify_disconnect(&mut self) {
        self.lock().disconnect_notified = true;
    }

    async fn stop(&mut self) {
        self.lock().stopped = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_answers_from_script() {
        let mut directory = SimDirectory::with_users([UserRecord::new(7, "Alice", "Smith")]);
        directory.add_message(ChatMessage::new(3, 7, "hi", None));

        assert_eq!(
            directory.answer(&DirectoryRequest::FindUser { name: "Alice".into(), surname: "Smith".into() }),
            SessionEvent::IdentityResolved { user: UserRecord::new(7, "Alice", "Smith") }
        );
        assert_eq!(
            directory.answer(&DirectoryRequest::FindUser { name: "Bob".into(), surname: "Jones".into() }),
            SessionEvent::IdentityNotFound
        );
        assert!(matches!(
            directory.answer(&DirectoryRequest::Conversation { own_id: 7, peer_id: 3, generation: 2 }),
            SessionEvent::HistoryLoaded { generation: 2, peer_id: 3, messages } if messages.len() == 1
        ));
    }

    #[test]
    fn held_requests_release_in_chosen_order() {
        let mut driver = SimDriver::default();
        driver.hold_directory(true);
        driver.lookup(DirectoryRequest::ListUsers { request: 1 }).unwrap();
        driver.lookup(DirectoryRequest::ListUsers { request: 2 }).unwrap();
        assert!(!driver.has_pending());

        driver.release_newest_first();

        let state = driver.lock();
        let order: Vec<_> = state
            .pending_events
            .iter()
            .filter_map(|event| match event {
                SessionEvent::RosterLoaded { request, .. } => Some(*request),
                _ => None,
            })
            .collect();
        assert_eq!(order, vec![2, 1]);
    }

    #[test]
    fn clock_advances() {
        let driver = SimDriver::default();
        let first = driver.tick();
        assert!(driver.tick() > first);
    }
}
