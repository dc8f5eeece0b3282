//! Server-initiated notifications for a running session.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::registry::EntryKind;
use crate::types::notification;
use crate::types::{JsonRpcMessage, JsonRpcNotification};

use super::state::Session;

/// Items queued for the session's single writer.
#[derive(Debug)]
pub(crate) enum Outbound {
    Message(JsonRpcMessage),
    Close,
}

/// Handle for emitting notifications into a session's output stream.
#[derive(Debug, Clone)]
pub struct Notifier {
    session: Arc<Mutex<Session>>,
    tx: mpsc::Sender<Outbound>,
}

impl Notifier {
    pub(crate) fn new(session: Arc<Mutex<Session>>, tx: mpsc::Sender<Outbound>) -> Self {
        Self { session, tx }
    }

    /// Emit `notifications/{kind}/list_changed`.
    ///
    /// A no-op unless the session is Ready and advertised `listChanged` for
    /// that kind. Returns whether the notification was queued; waits while
    /// the writer queue is full.
    pub async fn list_changed(&self, kind: EntryKind) -> bool {
        let session = self.session.lock().await;
        if !session.is_ready() {
            tracing::debug!("Not sending {kind} list_changed: session is {}", session.state());
            return false;
        }

        let caps = session.server_capabilities();
        let (enabled, method) = match kind {
            EntryKind::Tool => (
                caps.tools.as_ref().is_some_and(|c| c.list_changed),
                notification::TOOLS_LIST_CHANGED,
            ),
            EntryKind::Prompt => (
                caps.prompts.as_ref().is_some_and(|c| c.list_changed),
                notification::PROMPTS_LIST_CHANGED,
            ),
            EntryKind::Resource => (
                caps.resources.as_ref().is_some_and(|c| c.list_changed),
                notification::RESOURCES_LIST_CHANGED,
            ),
        };
        if !enabled {
            tracing::debug!("Not sending {method}: listChanged not advertised");
            return false;
        }
        drop(session);

        let msg = JsonRpcMessage::Notification(JsonRpcNotification::new(method, None));
        self.tx.send(Outbound::Message(msg)).await.is_ok()
    }
}
