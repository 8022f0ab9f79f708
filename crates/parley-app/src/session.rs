//! Session synchronization controller.
//!
//! This module defines the [`Session`] state machine. It owns the identity,
//! the channel lifecycle, the roster, the active-conversation pointer and the
//! unread flags, and keeps them consistent while directory responses and
//! channel messages arrive asynchronously.
//!
//! This is a pure state machine: it consumes [`SessionEvent`] inputs and
//! produces [`SessionAction`] instructions for the runtime to execute.
//!
//! # Inbound routing
//!
//! Every inbound message triggers a roster refresh and is routed only after
//! that refresh (or a later one) has been applied. Until then it is parked.
//! Parked messages are routed in arrival order, so a first-contact sender is
//! already listed when its unread flag is set, and messages from the selected
//! peer keep their arrival order even when refresh responses interleave.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parley_proto::{ChatPayload, Topic, UserId, UserRecord};

use crate::{
    ChannelStatus, ChatMessage, ConnectError, Conversation, DirectoryRequest, Identity, RenderCommand,
    Roster, SessionAction, SessionConfig, SessionEvent, SessionState, StatusLine,
};

/// Credentials awaiting directory resolution.
#[derive(Debug, Clone)]
struct Credentials {
    name: String,
    surname: String,
}

/// Inbound message waiting for its roster refresh.
#[derive(Debug, Clone)]
struct Parked {
    request: u64,
    message: ChatMessage,
}

/// Session synchronization controller.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable in simulation.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    state: SessionState,
    /// Set between `bootstrap` and the directory answer.
    pending: Option<Credentials>,
    roster: Roster,
    conversation: Conversation,
    parked: VecDeque<Parked>,
    /// Subscriptions requested on connect and not yet confirmed.
    awaiting_subscriptions: Vec<Topic>,
    composer_visible: bool,
    status: Option<StatusLine>,
    connect_error: Option<ConnectError>,
}

impl Session {
    /// Create a session that has not bootstrapped yet.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: SessionState::default(),
            pending: None,
            roster: Roster::new(),
            conversation: Conversation::new(),
            parked: VecDeque::new(),
            awaiting_subscriptions: Vec::new(),
            composer_visible: false,
            status: None,
            connect_error: None,
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<SessionAction> {
        match event {
            SessionEvent::PeerSelected { peer_id } => self.select_peer(peer_id),
            SessionEvent::ComposerSubmitted { content, at } => self.send_outbound(&content, at),
            SessionEvent::TeardownRequested => self.teardown(),
            SessionEvent::IdentityResolved { user } => self.identity_resolved(&user),
            SessionEvent::IdentityNotFound => {
                let Some(credentials) = self.pending.take() else {
                    tracing::warn!("identity lookup answered without a pending bootstrap");
                    return vec![];
                };
                tracing::info!(name = %credentials.name, surname = %credentials.surname, "no such user");
                self.fail_bootstrap(ConnectError::IdentityNotFound {
                    name: credentials.name,
                    surname: credentials.surname,
                })
            },
            SessionEvent::IdentityLookupFailed { reason } => {
                if self.pending.take().is_none() {
                    tracing::warn!("identity lookup failed without a pending bootstrap");
                    return vec![];
                }
                tracing::warn!(%reason, "identity lookup failed");
                self.fail_bootstrap(ConnectError::Directory(reason))
            },
            SessionEvent::ChannelConnected => self.channel_connected(),
            SessionEvent::Subscribed { topic } => self.subscribed(&topic),
            SessionEvent::ChannelError { reason } => self.channel_lost(&reason),
            SessionEvent::ChannelClosed => self.channel_lost("connection closed"),
            SessionEvent::Inbound { destination, body } => {
                let topic = Topic::new(destination.as_str());
                let private = self.own_id().is_some_and(|own_id| topic.is_private_queue_of(own_id));
                tracing::debug!(%destination, private, "inbound message");
                self.on_inbound_message(&body)
            },
            SessionEvent::RosterLoaded { request, users } => self.apply_roster(request, &users),
            SessionEvent::RosterFailed { request, error } => {
                tracing::warn!(request, %error, "roster refresh failed, showing an empty roster");
                self.apply_roster(request, &[])
            },
            SessionEvent::HistoryLoaded { generation, peer_id, messages } => {
                self.apply_history(generation, peer_id, &messages)
            },
            SessionEvent::HistoryFailed { generation, error } => {
                tracing::warn!(generation, %error, "history load failed, showing an empty transcript");
                let peer_id = self.conversation.peer_id().unwrap_or_default();
                self.apply_history(generation, peer_id, &[])
            },
        }
    }

    /// Resolve `name`/`surname` through the directory and connect.
    ///
    /// Produces the lookup; the rest of bootstrap happens as the answer and
    /// the channel events come back. Blank credentials fail immediately
    /// without touching the directory. Ignored once bootstrap has started.
    pub fn bootstrap(&mut self, name: &str, surname: &str) -> Vec<SessionAction> {
        if self.pending.is_some() || self.state.identity.is_some() {
            tracing::warn!("bootstrap already started");
            return vec![];
        }

        let name = name.trim();
        let surname = surname.trim();
        if name.is_empty() || surname.is_empty() {
            return self.fail_bootstrap(ConnectError::IdentityNotFound {
                name: name.to_string(),
                surname: surname.to_string(),
            });
        }

        self.connect_error = None;
        self.pending = Some(Credentials { name: name.to_string(), surname: surname.to_string() });
        tracing::info!(%name, %surname, "looking up identity");

        let mut actions = vec![SessionAction::Lookup(DirectoryRequest::FindUser {
            name: name.to_string(),
            surname: surname.to_string(),
        })];
        actions.extend(self.set_status(StatusLine::info(format!("Looking up {name} {surname}..."))));
        actions
    }

    /// Handle a raw payload from a subscribed topic.
    ///
    /// Malformed payloads are dropped. A well-formed message triggers a
    /// roster refresh and waits for it before being routed.
    pub fn on_inbound_message(&mut self, raw: &str) -> Vec<SessionAction> {
        let message = match ChatPayload::from_json(raw) {
            Ok(payload) => ChatMessage::from(payload),
            Err(error) => {
                tracing::warn!(%error, "dropping malformed inbound payload");
                return vec![];
            },
        };

        let (request, lookup) = self.roster.request_refresh();
        tracing::debug!(sender_id = message.sender_id(), request, "parking inbound message until roster refresh");
        self.parked.push_back(Parked { request, message });
        vec![SessionAction::Lookup(lookup)]
    }

    /// Publish `content` to the selected peer and show it right away.
    ///
    /// Does nothing for blank content, without a selection or without a
    /// connected channel.
    pub fn send_outbound(&mut self, content: &str, now: DateTime<Utc>) -> Vec<SessionAction> {
        let content = content.trim();
        if content.is_empty() {
            tracing::debug!("ignoring blank outbound message");
            return vec![];
        }
        let Some(peer_id) = self.state.selected_peer else {
            tracing::debug!("ignoring outbound message without a selected peer");
            return vec![];
        };
        if self.state.channel != ChannelStatus::Connected {
            tracing::debug!(channel = ?self.state.channel, "ignoring outbound message without a channel");
            return vec![];
        }
        let Some(own_id) = self.own_id() else {
            return vec![];
        };

        let message = ChatMessage::new(own_id, peer_id, content, Some(now));
        let body = match message.to_payload().to_json() {
            Ok(body) => body,
            Err(error) => {
                tracing::warn!(%error, "could not encode outbound message");
                return vec![];
            },
        };

        let mut actions = vec![SessionAction::Publish { topic: Topic::send(), body }];
        actions.extend(render(self.conversation.append_message(&message, Some(peer_id))));
        actions
    }

    /// Display the conversation with `peer_id`.
    ///
    /// Clears the peer's unread flag and reloads its history. Unknown peers
    /// and selection before bootstrap completes are ignored.
    pub fn select_peer(&mut self, peer_id: UserId) -> Vec<SessionAction> {
        let Some(own_id) = self.own_id() else {
            tracing::warn!(peer_id, "cannot select a peer before identity is resolved");
            return vec![];
        };
        if !self.roster.contains(peer_id) {
            tracing::warn!(peer_id, "cannot select a peer that is not in the roster");
            return vec![];
        }

        let mut actions = Vec::new();
        if let Some(previous) = self.state.selected_peer.filter(|previous| *previous != peer_id) {
            actions.push(SessionAction::Render(RenderCommand::SetSelected {
                peer_id: previous,
                selected: false,
            }));
        }

        self.state.selected_peer = Some(peer_id);
        self.state.unread.remove(&peer_id);
        self.roster.select(Some(peer_id));
        self.roster.set_unread(peer_id, false);
        self.composer_visible = true;

        actions.extend(render(vec![
            RenderCommand::SetSelected { peer_id, selected: true },
            RenderCommand::SetUnread { peer_id, unread: false },
            RenderCommand::ShowComposer,
        ]));
        actions.push(SessionAction::Lookup(self.conversation.load_history(own_id, peer_id)));
        actions
    }

    /// Leave the session. Never fails.
    pub fn teardown(&mut self) -> Vec<SessionAction> {
        tracing::info!(user_id = ?self.own_id(), "tearing down session");
        vec![SessionAction::NotifyDisconnect, SessionAction::Quit]
    }

    /// Outcome of bootstrap, once known.
    ///
    /// `Some(Ok(id))` when the channel is connected, `Some(Err(_))` when
    /// bootstrap failed, `None` while it is still in progress.
    pub fn bootstrap_outcome(&self) -> Option<Result<UserId, ConnectError>> {
        if let Some(error) = &self.connect_error {
            return Some(Err(error.clone()));
        }
        match self.state.channel {
            ChannelStatus::Connected => self.own_id().map(Ok),
            _ => None,
        }
    }

    /// Session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Resolved identity.
    pub fn identity(&self) -> Option<&Identity> {
        self.state.identity.as_ref()
    }

    /// Channel status.
    pub fn channel_status(&self) -> ChannelStatus {
        self.state.channel
    }

    /// Selected peer.
    pub fn selected_peer(&self) -> Option<UserId> {
        self.state.selected_peer
    }

    /// Roster.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Conversation with the selected peer.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Whether the composer is available.
    pub fn composer_visible(&self) -> bool {
        self.composer_visible
    }

    /// Current status line.
    pub fn status(&self) -> Option<&StatusLine> {
        self.status.as_ref()
    }

    /// Why bootstrap failed, if it did.
    pub fn connect_error(&self) -> Option<&ConnectError> {
        self.connect_error.as_ref()
    }

    /// Inbound messages waiting for a roster refresh.
    pub fn parked_messages(&self) -> usize {
        self.parked.len()
    }

    fn own_id(&self) -> Option<UserId> {
        self.state.identity.as_ref().map(Identity::assigned_id)
    }

    fn identity_resolved(&mut self, user: &UserRecord) -> Vec<SessionAction> {
        let Some(credentials) = self.pending.take() else {
            tracing::warn!(user_id = user.id, "identity resolved without a pending bootstrap");
            return vec![];
        };

        tracing::info!(user_id = user.id, "identity resolved");
        self.state.identity = Some(Identity::new(credentials.name, credentials.surname, user.id));

        if !self.advance_channel(ChannelStatus::Connecting) {
            return vec![];
        }
        let mut actions =
            vec![SessionAction::Connect { endpoint: self.config.channel_endpoint.clone() }];
        actions.extend(self.set_status(StatusLine::info("Connecting...")));
        actions
    }

    fn channel_connected(&mut self) -> Vec<SessionAction> {
        let Some(own_id) = self.own_id() else {
            tracing::warn!("channel connected without an identity");
            return vec![];
        };
        if self.state.channel != ChannelStatus::Connecting || !self.awaiting_subscriptions.is_empty() {
            tracing::warn!(channel = ?self.state.channel, "ignoring channel handshake");
            return vec![];
        }

        tracing::info!(user_id = own_id, "channel handshake complete, subscribing");
        self.awaiting_subscriptions = vec![Topic::private_queue(own_id), Topic::broadcast()];
        self.awaiting_subscriptions
            .iter()
            .map(|topic| SessionAction::Subscribe { topic: topic.clone() })
            .collect()
    }

    /// Bootstrap completes once both subscriptions are in place.
    fn subscribed(&mut self, topic: &Topic) -> Vec<SessionAction> {
        let Some(position) = self.awaiting_subscriptions.iter().position(|awaited| awaited == topic) else {
            tracing::debug!(%topic, "ignoring unexpected subscription");
            return vec![];
        };
        self.awaiting_subscriptions.remove(position);
        if !self.awaiting_subscriptions.is_empty() {
            return vec![];
        }
        if !self.advance_channel(ChannelStatus::Connected) {
            return vec![];
        }

        let display_name = self.identity().map(Identity::display_name).unwrap_or_default();
        tracing::info!(%display_name, "channel connected");
        let (_, refresh) = self.roster.request_refresh();

        let mut actions = vec![SessionAction::Lookup(refresh)];
        actions.extend(self.set_status(StatusLine::info(format!("Connected as {display_name}"))));
        actions.extend(self.hide_composer_unless_selected());
        actions
    }

    fn channel_lost(&mut self, reason: &str) -> Vec<SessionAction> {
        match self.state.channel {
            ChannelStatus::Connecting => {
                tracing::warn!(%reason, pending = self.awaiting_subscriptions.len(), "channel connect failed");
                self.awaiting_subscriptions.clear();
                self.advance_channel(ChannelStatus::Failed);
                self.fail_bootstrap(ConnectError::Channel(reason.to_string()))
            },
            ChannelStatus::Connected => {
                tracing::warn!(%reason, "channel lost");
                self.set_status(StatusLine::error(format!("Connection lost: {reason}")))
            },
            ChannelStatus::Disconnected | ChannelStatus::Failed => {
                tracing::debug!(%reason, channel = ?self.state.channel, "ignoring channel loss");
                vec![]
            },
        }
    }

    fn apply_roster(&mut self, request: u64, users: &[UserRecord]) -> Vec<SessionAction> {
        let own_name = match (&self.state.identity, &self.pending) {
            (Some(identity), _) => identity.name().to_string(),
            (None, Some(credentials)) => credentials.name.clone(),
            (None, None) => String::new(),
        };

        self.roster.refresh(&own_name, users);
        self.roster.reapply(self.state.selected_peer, &self.state.unread);

        let mut actions = render(self.roster.render_commands());
        while self.parked.front().is_some_and(|parked| parked.request <= request) {
            if let Some(parked) = self.parked.pop_front() {
                actions.extend(self.route(&parked.message));
            }
        }
        actions
    }

    /// Route one inbound message after its roster refresh.
    fn route(&mut self, message: &ChatMessage) -> Vec<SessionAction> {
        let sender_id = message.sender_id();
        let mut actions = Vec::new();

        match self.state.selected_peer {
            Some(selected) if selected == sender_id => {
                tracing::debug!(sender_id, "rendering message from selected peer");
                actions.extend(render(self.conversation.append_message(message, Some(selected))));
            },
            _ => {
                if self.roster.set_unread(sender_id, true) {
                    tracing::debug!(sender_id, "flagging unread");
                    self.state.unread.insert(sender_id);
                    actions.push(SessionAction::Render(RenderCommand::SetUnread {
                        peer_id: sender_id,
                        unread: true,
                    }));
                } else {
                    tracing::debug!(sender_id, "message from a sender outside the roster");
                }
            },
        }

        actions.extend(self.hide_composer_unless_selected());
        actions
    }

    fn apply_history(
        &mut self,
        generation: u64,
        peer_id: UserId,
        messages: &[ChatMessage],
    ) -> Vec<SessionAction> {
        if self.conversation.peer_id() != Some(peer_id) {
            tracing::debug!(peer_id, generation, "dropping history for a conversation that is not open");
            return vec![];
        }
        match self.conversation.apply_history(generation, messages, self.state.selected_peer) {
            Some(commands) => render(commands),
            None => vec![],
        }
    }

    fn fail_bootstrap(&mut self, error: ConnectError) -> Vec<SessionAction> {
        let status = match &error {
            ConnectError::IdentityNotFound { .. } => {
                StatusLine::error(format!("{error}. Check the name and try again."))
            },
            ConnectError::Directory(_) | ConnectError::Channel(_) => {
                StatusLine::error(format!("{error}. Restart to try again."))
            },
        };
        self.connect_error = Some(error);
        self.set_status(status)
    }

    fn hide_composer_unless_selected(&mut self) -> Vec<SessionAction> {
        if self.state.selected_peer.is_some() {
            return vec![];
        }
        self.composer_visible = false;
        vec![SessionAction::Render(RenderCommand::HideComposer)]
    }

    fn advance_channel(&mut self, next: ChannelStatus) -> bool {
        if !self.state.channel.can_transition_to(next) {
            tracing::warn!(from = ?self.state.channel, to = ?next, "ignoring channel transition");
            return false;
        }
        self.state.channel = next;
        true
    }

    fn set_status(&mut self, status: StatusLine) -> Vec<SessionAction> {
        self.status = Some(status.clone());
        vec![SessionAction::Render(RenderCommand::ShowStatus(status))]
    }
}

fn render(commands: Vec<RenderCommand>) -> Vec<SessionAction> {
    commands.into_iter().map(SessionAction::Render).collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::{FetchError, Placement};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap()
    }

    fn inbound(sender: UserId, content: &str) -> SessionEvent {
        SessionEvent::Inbound {
            destination: "/user/7/queue/messages".into(),
            body: format!(r#"{{"senderId":{sender},"recipientId":7,"content":"{content}"}}"#),
        }
    }

    fn roster_of(request: u64, users: &[(UserId, &str)]) -> SessionEvent {
        SessionEvent::RosterLoaded {
            request,
            users: users.iter().map(|(id, name)| UserRecord::new(*id, *name, "")).collect(),
        }
    }

    fn lookups(actions: &[SessionAction]) -> Vec<DirectoryRequest> {
        actions
            .iter()
            .filter_map(|action| match action {
                SessionAction::Lookup(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    /// Session bootstrapped as Alice Smith (7), connected, roster [Bob (3)].
    fn connected() -> Session {
        let mut session = Session::new(SessionConfig::default());
        session.bootstrap("Alice", "Smith");
        session.handle(SessionEvent::IdentityResolved { user: UserRecord::new(7, "Alice", "Smith") });
        session.handle(SessionEvent::ChannelConnected);
        session.handle(SessionEvent::Subscribed { topic: Topic::private_queue(7) });
        session.handle(SessionEvent::Subscribed { topic: Topic::broadcast() });
        session.handle(roster_of(1, &[(3, "Bob"), (7, "Alice")]));
        session
    }

    #[test]
    fn bootstrap_looks_up_identity() {
        let mut session = Session::new(SessionConfig::default());

        let actions = session.bootstrap(" Alice ", "Smith");

        assert_eq!(
            lookups(&actions),
            vec![DirectoryRequest::FindUser { name: "Alice".into(), surname: "Smith".into() }]
        );
        assert_eq!(session.bootstrap_outcome(), None);
    }

    #[test]
    fn bootstrap_connects_and_subscribes() {
        let mut session = Session::new(SessionConfig::default());
        session.bootstrap("Alice", "Smith");

        let actions =
            session.handle(SessionEvent::IdentityResolved { user: UserRecord::new(7, "Alice", "Smith") });
        assert_eq!(actions[0], SessionAction::Connect { endpoint: crate::DEFAULT_CHANNEL_ENDPOINT.into() });
        assert_eq!(session.channel_status(), ChannelStatus::Connecting);

        let actions = session.handle(SessionEvent::ChannelConnected);
        assert_eq!(actions, vec![
            SessionAction::Subscribe { topic: Topic::private_queue(7) },
            SessionAction::Subscribe { topic: Topic::broadcast() },
        ]);
        assert_eq!(session.bootstrap_outcome(), None);

        assert!(session.handle(SessionEvent::Subscribed { topic: Topic::broadcast() }).is_empty());
        let actions = session.handle(SessionEvent::Subscribed { topic: Topic::private_queue(7) });
        assert_eq!(lookups(&actions), vec![DirectoryRequest::ListUsers { request: 1 }]);
        assert_eq!(session.channel_status(), ChannelStatus::Connected);
        assert_eq!(session.bootstrap_outcome(), Some(Ok(7)));
    }

    #[test]
    fn channel_error_before_subscriptions_fails_bootstrap() {
        let mut session = Session::new(SessionConfig::default());
        session.bootstrap("Alice", "Smith");
        session.handle(SessionEvent::IdentityResolved { user: UserRecord::new(7, "Alice", "Smith") });
        session.handle(SessionEvent::ChannelConnected);
        session.handle(SessionEvent::Subscribed { topic: Topic::private_queue(7) });

        session.handle(SessionEvent::ChannelError { reason: "subscribe rejected".into() });

        assert_eq!(session.channel_status(), ChannelStatus::Failed);
        assert_eq!(
            session.bootstrap_outcome(),
            Some(Err(ConnectError::Channel("subscribe rejected".into())))
        );
        assert!(session.handle(SessionEvent::Subscribed { topic: Topic::broadcast() }).is_empty());
        assert_eq!(session.channel_status(), ChannelStatus::Failed);
    }

    #[test]
    fn repeated_handshake_does_not_resubscribe() {
        let mut session = Session::new(SessionConfig::default());
        session.bootstrap("Alice", "Smith");
        session.handle(SessionEvent::IdentityResolved { user: UserRecord::new(7, "Alice", "Smith") });
        session.handle(SessionEvent::ChannelConnected);

        assert!(session.handle(SessionEvent::ChannelConnected).is_empty());
    }

    #[test]
    fn unknown_identity_refuses_to_connect() {
        let mut session = Session::new(SessionConfig::default());
        session.bootstrap("Nobody", "Here");

        let actions = session.handle(SessionEvent::IdentityNotFound);

        assert!(!actions.iter().any(|action| matches!(action, SessionAction::Connect { .. })));
        assert_eq!(session.channel_status(), ChannelStatus::Disconnected);
        assert!(session.bootstrap_outcome().is_some_and(|outcome| {
            outcome.is_err_and(|error| error.is_identity_not_found())
        }));
    }

    #[test]
    fn blank_credentials_fail_without_lookup() {
        let mut session = Session::new(SessionConfig::default());

        let actions = session.bootstrap("  ", "Smith");

        assert!(lookups(&actions).is_empty());
        assert!(session.connect_error().is_some_and(ConnectError::is_identity_not_found));
    }

    #[test]
    fn channel_failure_is_terminal() {
        let mut session = Session::new(SessionConfig::default());
        session.bootstrap("Alice", "Smith");
        session.handle(SessionEvent::IdentityResolved { user: UserRecord::new(7, "Alice", "Smith") });

        session.handle(SessionEvent::ChannelError { reason: "refused".into() });

        assert_eq!(session.channel_status(), ChannelStatus::Failed);
        assert_eq!(session.bootstrap_outcome(), Some(Err(ConnectError::Channel("refused".into()))));
        assert!(session.handle(SessionEvent::ChannelConnected).is_empty());
        assert_eq!(session.channel_status(), ChannelStatus::Failed);
    }

    #[test]
    fn channel_loss_after_connect_keeps_status() {
        let mut session = connected();

        let actions = session.handle(SessionEvent::ChannelClosed);

        assert_eq!(session.channel_status(), ChannelStatus::Connected);
        assert!(matches!(
            actions.as_slice(),
            [SessionAction::Render(RenderCommand::ShowStatus(StatusLine { level: crate::StatusLevel::Error, .. }))]
        ));
    }

    #[test]
    fn select_peer_clears_unread_and_loads_history() {
        let mut session = connected();
        session.handle(inbound(3, "hi"));
        session.handle(roster_of(2, &[(3, "Bob")]));
        assert!(session.roster().get(3).is_some_and(|peer| peer.unread));

        let actions = session.select_peer(3);

        assert_eq!(session.selected_peer(), Some(3));
        assert!(session.roster().get(3).is_some_and(|peer| peer.selected && !peer.unread));
        assert!(session.state().unread().is_empty());
        assert!(session.composer_visible());
        assert_eq!(
            lookups(&actions),
            vec![DirectoryRequest::Conversation { own_id: 7, peer_id: 3, generation: 1 }]
        );
    }

    #[test]
    fn select_unknown_peer_is_ignored() {
        let mut session = connected();
        assert!(session.select_peer(99).is_empty());
        assert_eq!(session.selected_peer(), None);
    }

    #[test]
    fn inbound_waits_for_roster_refresh() {
        let mut session = connected();

        let actions = session.handle(inbound(9, "hi"));

        assert_eq!(lookups(&actions), vec![DirectoryRequest::ListUsers { request: 2 }]);
        assert_eq!(session.parked_messages(), 1);

        let actions = session.handle(roster_of(2, &[(3, "Bob"), (9, "Carol")]));

        assert_eq!(session.parked_messages(), 0);
        assert!(session.roster().get(9).is_some_and(|peer| peer.unread));
        assert!(actions.contains(&SessionAction::Render(RenderCommand::SetUnread { peer_id: 9, unread: true })));
        assert!(actions.contains(&SessionAction::Render(RenderCommand::HideComposer)));
    }

    #[test]
    fn older_roster_response_does_not_release_newer_messages() {
        let mut session = connected();
        session.handle(inbound(3, "one"));
        session.handle(inbound(3, "two"));

        session.handle(roster_of(2, &[(3, "Bob")]));
        assert_eq!(session.parked_messages(), 1);

        session.handle(roster_of(3, &[(3, "Bob")]));
        assert_eq!(session.parked_messages(), 0);
    }

    #[test]
    fn message_from_selected_peer_is_rendered() {
        let mut session = connected();
        session.select_peer(3);

        session.handle(inbound(3, "yo"));
        let actions = session.handle(roster_of(2, &[(3, "Bob")]));

        let entries = session.conversation().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "yo");
        assert_eq!(entries[0].placement, Placement::Outgoing);
        assert!(!actions.iter().any(|action| matches!(
            action,
            SessionAction::Render(RenderCommand::SetUnread { unread: true, .. })
        )));
    }

    #[test]
    fn unread_survives_roster_refresh() {
        let mut session = connected();
        session.handle(inbound(3, "hi"));
        session.handle(roster_of(2, &[(3, "Bob")]));

        session.handle(roster_of(2, &[(3, "Bob"), (9, "Carol")]));

        assert!(session.roster().get(3).is_some_and(|peer| peer.unread));
        assert!(session.roster().get(9).is_some_and(|peer| !peer.unread));
    }

    #[test]
    fn malformed_inbound_is_dropped() {
        let mut session = connected();

        let actions =
            session.handle(SessionEvent::Inbound { destination: "/user/public".into(), body: "{not json".into() });

        assert!(actions.is_empty());
        assert_eq!(session.parked_messages(), 0);
    }

    #[test]
    fn send_outbound_publishes_and_renders() {
        let mut session = connected();
        session.select_peer(3);

        let actions = session.send_outbound("  hello  ", now());

        let SessionAction::Publish { topic, body } = &actions[0] else {
            panic!("expected publish, got {actions:?}");
        };
        assert_eq!(topic, &Topic::send());
        let payload = ChatPayload::from_json(body).unwrap();
        assert_eq!((payload.sender_id, payload.recipient_id), (7, 3));
        assert_eq!(payload.content, "hello");
        assert_eq!(session.conversation().entries().len(), 1);
    }

    #[test]
    fn send_outbound_guards() {
        let mut session = connected();
        assert!(session.send_outbound("hello", now()).is_empty());

        session.select_peer(3);
        assert!(session.send_outbound("   ", now()).is_empty());
        assert!(session.conversation().entries().is_empty());

        let mut unconnected = Session::new(SessionConfig::default());
        assert!(unconnected.send_outbound("hello", now()).is_empty());
    }

    #[test]
    fn stale_history_is_ignored() {
        let mut session = connected();
        session.handle(roster_of(1, &[(3, "Bob"), (9, "Carol")]));
        session.select_peer(3);
        session.select_peer(9);

        let stale = session.handle(SessionEvent::HistoryLoaded {
            generation: 1,
            peer_id: 3,
            messages: vec![ChatMessage::new(3, 7, "old", None)],
        });

        assert!(stale.is_empty());
        assert!(session.conversation().entries().is_empty());
    }

    #[test]
    fn failed_history_clears_transcript() {
        let mut session = connected();
        session.select_peer(3);
        session.handle(SessionEvent::HistoryLoaded {
            generation: 1,
            peer_id: 3,
            messages: vec![ChatMessage::new(3, 7, "hey", None)],
        });
        session.select_peer(3);

        session.handle(SessionEvent::HistoryFailed { generation: 2, error: FetchError::history("timeout") });

        assert!(session.conversation().entries().is_empty());
    }

    #[test]
    fn failed_roster_empties_but_keeps_selection() {
        let mut session = connected();
        session.select_peer(3);

        let actions = session.handle(SessionEvent::RosterFailed { request: 1, error: FetchError::roster("down") });

        assert!(session.roster().is_empty());
        assert_eq!(session.selected_peer(), Some(3));
        assert_eq!(actions, vec![SessionAction::Render(RenderCommand::ClearRoster)]);
    }

    #[test]
    fn teardown_notifies_then_quits() {
        let mut session = connected();
        assert_eq!(session.teardown(), vec![SessionAction::NotifyDisconnect, SessionAction::Quit]);
    }
}
