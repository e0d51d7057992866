//! Text rendering for deliveries, notifications, users and history.

use devnet_shared::time::display_timestamp;

use crate::{
    channel::Notification,
    domain::{ChatMessage, Delivery, HistoryEntry, IncomingEnvelope, User, UserId},
};

pub(crate) fn message_line(message: &ChatMessage, me: Option<UserId>) -> String {
    let sender = match me {
        Some(me) if message.is_from(me) => "you".to_string(),
        _ => message.sender_name(),
    };
    format!(
        "[{}] {}: {}",
        display_timestamp(&message.timestamp),
        sender,
        message.content
    )
}

/// `None` for envelopes that have nothing to show.
pub(crate) fn delivery_line(delivery: &Delivery, me: Option<UserId>) -> Option<String> {
    match delivery {
        Ok(IncomingEnvelope::Message(message)) => Some(message_line(message, me)),
        Ok(IncomingEnvelope::Error { message }) => Some(format!("! server error: {message}")),
        Ok(IncomingEnvelope::ChatDeleted) => Some("* this chat was deleted".to_string()),
        Ok(IncomingEnvelope::MessageSent { id, .. }) => {
            tracing::debug!(?id, "Message acknowledged");
            None
        }
        Ok(IncomingEnvelope::AuthSuccess) => None,
        Ok(IncomingEnvelope::Unknown { kind, .. }) => {
            tracing::debug!(?kind, "Ignoring unknown envelope");
            None
        }
        Err(e) => Some(format!("! unreadable frame: {e}")),
    }
}

pub(crate) fn notification_line(notification: &Notification) -> Option<String> {
    match notification {
        Notification::Connecting { .. } => Some("* connecting...".to_string()),
        Notification::Ready => Some("* connected".to_string()),
        Notification::Failed(error) => Some(format!("! {error}")),
        Notification::ReconnectScheduled { delay } => Some(format!(
            "* reconnecting in {:.1}s",
            delay.as_secs_f64()
        )),
        Notification::Closed => None,
    }
}

pub(crate) fn user_line(user: &User) -> String {
    let status = if user.is_online { "online" } else { "offline" };
    if user.name() == user.username {
        format!("  #{:<4} {} ({status})", user.id.value(), user.username)
    } else {
        format!(
            "  #{:<4} {} @{} ({status})",
            user.id.value(),
            user.name(),
            user.username
        )
    }
}

pub(crate) fn history_line(entry: &HistoryEntry, me: Option<UserId>) -> String {
    let sender = match (entry.from, me) {
        (Some(from), Some(me)) if from == me.value() => "you".to_string(),
        _ => entry
            .sender_name
            .clone()
            .or_else(|| entry.from.map(|id| format!("user #{id}")))
            .unwrap_or_else(|| "unknown".to_string()),
    };
    let at = entry
        .sent_at
        .as_deref()
        .map(display_timestamp)
        .unwrap_or_else(|| "--:--:--".to_string());
    format!("[{at}] {sender}: {}", entry.content)
}
