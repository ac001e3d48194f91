//! Wire types exchanged with the chat backend.

use bytes::Bytes;
use serde::Deserialize;
use serde::Serialize;

/// Inference routing hint forwarded verbatim to the backend.
///
/// The backend picks the text model for `text`, the vision model for
/// `image`, and decides based on the presence of images for `best`.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Mode {
    #[default]
    #[serde(rename = "best", alias = "auto")]
    #[strum(to_string = "best", serialize = "auto")]
    Auto,
    #[serde(rename = "text")]
    #[strum(to_string = "text")]
    Text,
    #[serde(rename = "image")]
    #[strum(to_string = "image")]
    Image,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Mode::Auto => "Best (auto)",
            Mode::Text => "Text only",
            Mode::Image => "Image (vision)",
        }
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One role-tagged utterance of the transcript sent as model context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Binary image payload uploaded as one `images` form part.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImagePart {
    pub filename: String,
    pub mime: String,
    pub bytes: Bytes,
}

/// Everything a single `POST /api/chat` carries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChatRequest {
    /// Only sent when non-empty.
    pub message: Option<String>,
    pub images: Vec<ImagePart>,
    pub mode: Mode,
    pub chat_history: Vec<Turn>,
}

/// Successful `POST /api/chat` body.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub images_processed: Option<u32>,
    #[serde(default)]
    pub model_used: Option<String>,
}

/// `GET /api/check-model` body. Every field but `available` is optional
/// because the backend omits them on its failure paths.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ModelCheck {
    pub available: bool,
    #[serde(default)]
    pub ollama_running: Option<bool>,
    #[serde(default)]
    pub available_models: Vec<String>,
    #[serde(default)]
    pub target_model: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

/// `GET /api/models` body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ModelList {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub(crate) error: Option<String>,
}
