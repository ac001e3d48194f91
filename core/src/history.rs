use tracing::warn;
use vchat_backend_client::Role;
use vchat_backend_client::Turn;

/// Transcript of role/content turns sent to the backend as model context.
///
/// `committed` only ever grows by a completed user/assistant exchange. The
/// snapshot handed to the backend is held in `pending` until the reply is
/// committed or the turn fails and the snapshot is discarded.
#[derive(Debug, Clone, Default)]
pub struct ChatHistoryTracker {
    /// The oldest turns are at the beginning of the vector.
    committed: Vec<Turn>,
    pending: Option<Vec<Turn>>,
}

impl ChatHistoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the transcript for a new user turn: the committed turns
    /// followed by `user_text`. A run of assistant turns at the tail is
    /// collapsed to its first turn, the reply to the preceding user turn.
    pub fn snapshot_for_send(&mut self, user_text: &str) -> Vec<Turn> {
        let mut snapshot = self.committed.clone();
        while matches!(
            snapshot.as_slice(),
            [.., prev, last] if prev.role == Role::Assistant && last.role == Role::Assistant
        ) {
            snapshot.pop();
        }
        snapshot.push(Turn::user(user_text));
        self.pending = Some(snapshot.clone());
        snapshot
    }

    /// Append the assistant reply to the most recent snapshot and make it
    /// the committed transcript.
    pub fn commit_assistant_reply(&mut self, text: &str) {
        match self.pending.take() {
            Some(mut snapshot) => {
                snapshot.push(Turn::assistant(text));
                self.committed = snapshot;
            }
            None => {
                warn!("assistant reply committed without a pending snapshot");
                self.committed.push(Turn::assistant(text));
            }
        }
    }

    /// Forget the snapshot of a failed turn. The committed transcript is
    /// left exactly as it was before the send.
    pub fn discard_pending(&mut self) {
        self.pending = None;
    }

    pub fn reset(&mut self) {
        self.committed.clear();
        self.pending = None;
    }

    pub fn turns(&self) -> &[Turn] {
        &self.committed
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    /// Whether a snapshot was handed out and is waiting for its reply.
    pub fn is_awaiting_reply(&self) -> bool {
        self.pending.is_some()
    }
}
