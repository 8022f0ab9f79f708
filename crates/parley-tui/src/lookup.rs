//! Bridges between the network clients and session events.

use parley_app::{ChatMessage, DirectoryRequest, SessionEvent};
use parley_client::{ChannelEvent, DirectoryClient};

/// Perform `request` against the directory and report the outcome.
///
/// Failures become the matching failure event, so the session always hears
/// back about every request it issued.
pub async fn answer(directory: &DirectoryClient, request: DirectoryRequest) -> SessionEvent {
    let outcome = match &request {
        DirectoryRequest::FindUser { name, surname } => {
            directory.find_user(name, surname).await.map(|found| match found {
                Some(user) => SessionEvent::IdentityResolved { user },
                None => SessionEvent::IdentityNotFound,
            })
        },
        DirectoryRequest::ListUsers { request: number } => {
            directory.list_users().await.map(|users| SessionEvent::RosterLoaded { request: *number, users })
        },
        DirectoryRequest::Conversation { own_id, peer_id, generation } => {
            directory.conversation(*own_id, *peer_id).await.map(|payloads| SessionEvent::HistoryLoaded {
                generation: *generation,
                peer_id: *peer_id,
                messages: payloads.into_iter().map(ChatMessage::from).collect(),
            })
        },
    };

    outcome.unwrap_or_else(|error| {
        tracing::warn!(?request, %error, "directory request failed");
        SessionEvent::lookup_failed(&request, error.to_string())
    })
}

/// Translate a channel notification.
pub fn channel_event(event: ChannelEvent) -> SessionEvent {
    match event {
        ChannelEvent::Connected => SessionEvent::ChannelConnected,
        ChannelEvent::Message { destination, body } => SessionEvent::Inbound { destination, body },
        ChannelEvent::Error { reason } => SessionEvent::ChannelError { reason },
        ChannelEvent::Closed => SessionEvent::ChannelClosed,
    }
}
