use tracing::info;
use vchat_backend_client::ChatReply;
use vchat_backend_client::Mode;
use vchat_backend_client::ModelCheck;

use crate::attachments::ImageAttachmentManager;
use crate::backend::ChatBackend;
use crate::config::Config;
use crate::controller::ChatRequestController;
use crate::controller::DispatchedTurn;
use crate::controller::RequestState;
use crate::controller::TurnId;
use crate::controller::TurnOutcome;
use crate::error::SendError;
use crate::error::SubmitError;
use crate::history::ChatHistoryTracker;
use crate::status::ModelAvailabilityMonitor;
use crate::status::ModelStatus;
use crate::timeline::MessageTimeline;

/// All mutable state of one chat session. Owned by a single event loop;
/// background work reports back through the methods below.
pub struct Session {
    input: String,
    mode: Mode,
    default_mode: Mode,
    greeting: String,
    attachments: ImageAttachmentManager,
    history: ChatHistoryTracker,
    timeline: MessageTimeline,
    monitor: ModelAvailabilityMonitor,
    controller: ChatRequestController,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        Self {
            input: String::new(),
            mode: config.mode,
            default_mode: config.mode,
            greeting: config.greeting.clone(),
            attachments: ImageAttachmentManager::new(),
            history: ChatHistoryTracker::new(),
            timeline: MessageTimeline::new(config.greeting.clone()),
            monitor: ModelAvailabilityMonitor::new(),
            controller: ChatRequestController::new(),
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn attachments(&self) -> &ImageAttachmentManager {
        &self.attachments
    }

    pub fn attachments_mut(&mut self) -> &mut ImageAttachmentManager {
        &mut self.attachments
    }

    pub fn history(&self) -> &ChatHistoryTracker {
        &self.history
    }

    pub fn timeline(&self) -> &MessageTimeline {
        &self.timeline
    }

    pub fn status(&self) -> &ModelStatus {
        self.monitor.status()
    }

    pub fn request_state(&self) -> RequestState {
        self.controller.state()
    }

    pub fn is_sending(&self) -> bool {
        self.controller.is_sending()
    }

    /// Validate the current input and pending attachments and move to
    /// `Sending`. The returned request is for the caller to dispatch.
    pub fn begin_submit(&mut self) -> Result<DispatchedTurn, SubmitError> {
        self.controller.begin(
            &mut self.input,
            self.mode,
            &mut self.attachments,
            &mut self.history,
            &mut self.timeline,
        )
    }

    pub fn complete_turn(
        &mut self,
        turn: TurnId,
        result: Result<ChatReply, SendError>,
    ) -> Option<TurnOutcome> {
        self.controller
            .complete(turn, result, &mut self.history, &mut self.timeline)
    }

    /// Submit and wait for the reply in one step.
    pub async fn send(&mut self, backend: &dyn ChatBackend) -> Result<TurnOutcome, SubmitError> {
        let dispatched = self.begin_submit()?;
        let result = backend.chat(&dispatched.request).await;
        // Only a stale turn yields `None`, and nothing can reset the session
        // while `&mut self` is held here.
        match self.complete_turn(dispatched.turn, result) {
            Some(outcome) => Ok(outcome),
            None => Err(SubmitError::Busy),
        }
    }

    pub fn begin_status_check(&mut self) {
        self.monitor.begin_check();
    }

    pub fn apply_status(&mut self, result: anyhow::Result<ModelCheck>) -> &ModelStatus {
        self.monitor.apply_result(result)
    }

    pub async fn refresh_status(&mut self, backend: &dyn ChatBackend) -> &ModelStatus {
        self.monitor.check_status(backend).await
    }

    /// Start over: fresh timeline with the greeting, empty transcript, no
    /// attachments, the configured mode. A request still in flight is
    /// forgotten and its completion ignored. The availability status is
    /// kept; callers re-check it.
    pub fn reset(&mut self) {
        info!("resetting session");
        self.input.clear();
        self.mode = self.default_mode;
        self.attachments.clear();
        self.history.reset();
        self.timeline = MessageTimeline::new(self.greeting.clone());
        self.controller.reset();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
