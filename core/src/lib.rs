//! Session state machine for chatting with a locally hosted vision model.
//!
//! A [`Session`] owns the canonical transcript, the rendered timeline, the
//! pending image attachments and the single in-flight request. Front ends
//! mutate it from one event loop and hand transport work to a
//! [`ChatBackend`].

pub mod attachments;
mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod history;
mod session;
pub mod status;
pub mod timeline;

pub use attachments::Attachment;
pub use attachments::AttachmentId;
pub use attachments::AttachmentUpdate;
pub use attachments::ImageAttachmentManager;
pub use backend::ChatBackend;
pub use config::Config;
pub use config::ConfigOverrides;
pub use controller::ChatRequestController;
pub use controller::DispatchedTurn;
pub use controller::RequestState;
pub use controller::TurnId;
pub use controller::TurnOutcome;
pub use error::ConfigError;
pub use error::SendError;
pub use error::SubmitError;
pub use history::ChatHistoryTracker;
pub use session::Session;
pub use status::ModelAvailabilityMonitor;
pub use status::ModelDetails;
pub use status::ModelStatus;
pub use status::SessionStatus;
pub use timeline::Message;
pub use timeline::MessageId;
pub use timeline::MessageKind;
pub use timeline::MessageTimeline;

pub use vchat_backend_client::ChatReply;
pub use vchat_backend_client::ChatRequest;
pub use vchat_backend_client::Mode;
pub use vchat_backend_client::Role;
pub use vchat_backend_client::Turn;
