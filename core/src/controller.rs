//! Single-flight lifecycle of one chat submission.
//!
//! A submission moves the controller from `Idle` to `Sending` in
//! [`ChatRequestController::begin`], which also performs every synchronous
//! side effect of dispatch. The transport call happens elsewhere. Its result
//! is handed back to [`ChatRequestController::complete`], which always
//! returns the controller to `Idle`.

use tracing::debug;
use tracing::info;
use tracing::warn;
use vchat_backend_client::ChatReply;
use vchat_backend_client::ChatRequest;
use vchat_backend_client::Mode;

use crate::attachments::Attachment;
use crate::attachments::ImageAttachmentManager;
use crate::error::SendError;
use crate::error::SubmitError;
use crate::history::ChatHistoryTracker;
use crate::timeline::MessageId;
use crate::timeline::MessageTimeline;

/// Generation token for a dispatched request. A completion carrying a token
/// other than the one currently in flight is stale and ignored.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TurnId(u64);

impl TurnId {
    pub const fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Sending {
        turn: TurnId,
    },
}

/// What `begin` produced: the payload to hand to the transport, tagged with
/// the turn it belongs to.
#[derive(Clone, Debug)]
pub struct DispatchedTurn {
    pub turn: TurnId,
    pub request: ChatRequest,
    pub user_message: MessageId,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TurnOutcome {
    Replied {
        message_id: MessageId,
        model_used: Option<String>,
    },
    Failed {
        message_id: MessageId,
        error: SendError,
    },
}

impl TurnOutcome {
    pub fn message_id(&self) -> MessageId {
        match self {
            TurnOutcome::Replied { message_id, .. } | TurnOutcome::Failed { message_id, .. } => {
                *message_id
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct ChatRequestController {
    state: RequestState,
    next_turn: u64,
}

impl ChatRequestController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn is_sending(&self) -> bool {
        matches!(self.state, RequestState::Sending { .. })
    }

    /// Idle → Sending.
    ///
    /// Refuses with no side effects when the trimmed input is empty and no
    /// attachment is pending, or when a request is already in flight.
    pub fn begin(
        &mut self,
        input: &mut String,
        mode: Mode,
        attachments: &mut ImageAttachmentManager,
        history: &mut ChatHistoryTracker,
        timeline: &mut MessageTimeline,
    ) -> Result<DispatchedTurn, SubmitError> {
        let text = input.trim().to_string();
        if text.is_empty() && !attachments.has_pending() {
            return Err(SubmitError::Empty);
        }
        if self.is_sending() {
            return Err(SubmitError::Busy);
        }

        self.next_turn += 1;
        let turn = TurnId(self.next_turn);
        self.state = RequestState::Sending { turn };

        let images = attachments.consume_pending();
        let chat_history = history.snapshot_for_send(&text);
        input.clear();

        let request = ChatRequest {
            message: (!text.is_empty()).then(|| text.clone()),
            images: images.iter().map(Attachment::to_image_part).collect(),
            mode,
            chat_history,
        };
        let user_message = timeline.push_user(&text, images);

        info!(
            turn = turn.raw(),
            %mode,
            images = request.images.len(),
            history_len = request.chat_history.len(),
            "dispatching chat turn"
        );
        Ok(DispatchedTurn {
            turn,
            request,
            user_message,
        })
    }

    /// Sending → Idle.
    ///
    /// A success appends the assistant message and commits the reply to the
    /// transcript. A failure appends an error message and leaves the
    /// transcript as it was before `begin`. Returns `None` for a completion
    /// that does not belong to the turn in flight.
    pub fn complete(
        &mut self,
        turn: TurnId,
        result: Result<ChatReply, SendError>,
        history: &mut ChatHistoryTracker,
        timeline: &mut MessageTimeline,
    ) -> Option<TurnOutcome> {
        match self.state {
            RequestState::Sending { turn: current } if current == turn => {}
            RequestState::Sending { turn: current } => {
                warn!(
                    turn = turn.raw(),
                    current = current.raw(),
                    "ignoring completion for a stale turn"
                );
                return None;
            }
            RequestState::Idle => {
                warn!(turn = turn.raw(), "ignoring completion while idle");
                return None;
            }
        }
        self.state = RequestState::Idle;

        let outcome = match result {
            Ok(reply) => {
                debug!(
                    turn = turn.raw(),
                    model_used = ?reply.model_used,
                    images_processed = ?reply.images_processed,
                    "chat turn succeeded"
                );
                let message_id = timeline.push_assistant(reply.response.clone());
                history.commit_assistant_reply(&reply.response);
                TurnOutcome::Replied {
                    message_id,
                    model_used: reply.model_used,
                }
            }
            Err(error) => {
                warn!(turn = turn.raw(), "chat turn failed: {error}");
                let message_id = timeline.push_error(error_message(&error));
                history.discard_pending();
                TurnOutcome::Failed { message_id, error }
            }
        };
        Some(outcome)
    }

    /// Forget the request in flight. Its completion will be ignored.
    pub fn reset(&mut self) {
        self.state = RequestState::Idle;
    }
}

/// Timeline text for a failed turn.
pub fn error_message(error: &SendError) -> String {
    format!(
        "Sorry, I encountered an error: {error}. Please make sure your local model is running."
    )
}
