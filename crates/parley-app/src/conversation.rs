//! Transcript of the selected conversation.

use chrono::{DateTime, Utc};
use parley_proto::UserId;

use crate::{ChatMessage, DirectoryRequest, RenderCommand};

/// Which side of the transcript an entry is drawn on.
///
/// Classification compares the sender with the selected peer: a message
/// authored by the selected peer is `Outgoing`, anything else is `Incoming`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Sender is the selected peer.
    Outgoing,
    /// Any other sender.
    Incoming,
}

impl Placement {
    /// Classify a message by sender.
    pub fn classify(sender_id: UserId, selected: Option<UserId>) -> Self {
        if selected == Some(sender_id) { Self::Outgoing } else { Self::Incoming }
    }
}

/// A displayed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    /// Author.
    pub sender_id: UserId,
    /// Text.
    pub content: String,
    /// Send time, if known.
    pub timestamp: Option<DateTime<Utc>>,
    /// Side of the transcript.
    pub placement: Placement,
}

impl TranscriptEntry {
    fn new(message: &ChatMessage, selected: Option<UserId>) -> Self {
        Self {
            sender_id: message.sender_id(),
            content: message.content().to_string(),
            timestamp: message.timestamp(),
            placement: Placement::classify(message.sender_id(), selected),
        }
    }
}

/// Transcript plus the bookkeeping that rejects superseded history loads.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    peer_id: Option<UserId>,
    entries: Vec<TranscriptEntry>,
    generation: u64,
}

impl Conversation {
    /// Create an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start loading the history between `own_id` and `peer_id`.
    ///
    /// Any load still in flight becomes stale.
    pub fn load_history(&mut self, own_id: UserId, peer_id: UserId) -> DirectoryRequest {
        self.generation += 1;
        self.peer_id = Some(peer_id);
        DirectoryRequest::Conversation { own_id, peer_id, generation: self.generation }
    }

    /// Whether `generation` is the load currently awaited.
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Replace the transcript with a completed load.
    ///
    /// Returns `None` and changes nothing when the load is stale.
    pub fn apply_history(
        &mut self,
        generation: u64,
        messages: &[ChatMessage],
        selected: Option<UserId>,
    ) -> Option<Vec<RenderCommand>> {
        if !self.is_current(generation) {
            tracing::debug!(generation, current = self.generation, "dropping stale history load");
            return None;
        }

        self.entries = messages.iter().map(|message| TranscriptEntry::new(message, selected)).collect();

        let mut commands = Vec::with_capacity(self.entries.len() + 2);
        commands.push(RenderCommand::ClearTranscript);
        commands.extend(self.entries.iter().cloned().map(RenderCommand::AppendTranscriptEntry));
        commands.push(RenderCommand::ScrollToNewest);
        Some(commands)
    }

    /// Append one message and pin the view to it.
    pub fn append_message(&mut self, message: &ChatMessage, selected: Option<UserId>) -> Vec<RenderCommand> {
        let entry = TranscriptEntry::new(message, selected);
        self.entries.push(entry.clone());
        vec![RenderCommand::AppendTranscriptEntry(entry), RenderCommand::ScrollToNewest]
    }

    /// Peer whose history was last requested.
    pub fn peer_id(&self) -> Option<UserId> {
        self.peer_id
    }

    /// Displayed entries, oldest first.
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(sender: UserId, recipient: UserId, content: &str) -> ChatMessage {
        ChatMessage::new(sender, recipient, content, None)
    }

    #[test]
    fn load_history_bumps_generation() {
        let mut conversation = Conversation::new();

        assert_eq!(
            conversation.load_history(7, 3),
            DirectoryRequest::Conversation { own_id: 7, peer_id: 3, generation: 1 }
        );
        assert_eq!(
            conversation.load_history(7, 9),
            DirectoryRequest::Conversation { own_id: 7, peer_id: 9, generation: 2 }
        );
        assert_eq!(conversation.peer_id(), Some(9));
    }

    #[test]
    fn stale_history_is_dropped() {
        let mut conversation = Conversation::new();
        conversation.load_history(7, 3);
        conversation.load_history(7, 9);

        assert_eq!(conversation.apply_history(1, &[msg(3, 7, "old")], Some(9)), None);
        assert!(conversation.entries().is_empty());
    }

    #[test]
    fn history_replaces_transcript_in_order() {
        let mut conversation = Conversation::new();
        conversation.load_history(7, 3);
        conversation.append_message(&msg(3, 7, "earlier"), Some(3));

        let commands = conversation
            .apply_history(1, &[msg(7, 3, "hi"), msg(3, 7, "hey")], Some(3))
            .unwrap_or_default();

        let contents: Vec<_> = conversation.entries().iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["hi", "hey"]);
        assert_eq!(commands.first(), Some(&RenderCommand::ClearTranscript));
        assert_eq!(commands.last(), Some(&RenderCommand::ScrollToNewest));
        assert_eq!(commands.len(), 4);
    }

    #[test]
    fn placement_follows_selected_peer() {
        assert_eq!(Placement::classify(3, Some(3)), Placement::Outgoing);
        assert_eq!(Placement::classify(7, Some(3)), Placement::Incoming);
        assert_eq!(Placement::classify(7, None), Placement::Incoming);
    }

    #[test]
    fn append_scrolls_to_newest() {
        let mut conversation = Conversation::new();
        let commands = conversation.append_message(&msg(3, 7, "yo"), Some(3));

        assert_eq!(commands.len(), 2);
        assert_eq!(commands[1], RenderCommand::ScrollToNewest);
        assert_eq!(conversation.entries()[0].placement, Placement::Outgoing);
    }
}
