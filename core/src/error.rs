use std::path::PathBuf;

use vchat_backend_client::ChatError;

/// Why a submission was refused before anything was dispatched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("nothing to send: type a message or attach an image")]
    Empty,
    #[error("a request is already in flight")]
    Busy,
}

/// Failure of a dispatched chat turn. `Display` yields the reason embedded
/// in the timeline's error message.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("invalid request: {0}")]
    Request(String),
    #[error("{0}")]
    Transport(String),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("{0}")]
    Decode(String),
    /// The task driving the request panicked or was cancelled.
    #[error("request aborted: {0}")]
    Aborted(String),
}

impl From<ChatError> for SendError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Request(msg) => SendError::Request(msg),
            ChatError::Transport(msg) => SendError::Transport(msg),
            ChatError::Status {
                status, message, ..
            } => SendError::Status { status, message },
            ChatError::Decode(msg) => SendError::Decode(msg),
        }
    }
}

impl From<tokio::task::JoinError> for SendError {
    fn from(err: tokio::task::JoinError) -> Self {
        SendError::Aborted(err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid mode `{0}`: expected one of best, text, image")]
    InvalidMode(String),
    #[error("could not determine the vchat home directory")]
    NoHome,
}
