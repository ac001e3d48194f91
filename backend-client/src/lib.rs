mod client;
pub mod types;

pub use client::ChatError;
pub use client::Client;
pub use types::ChatReply;
pub use types::ChatRequest;
pub use types::ImagePart;
pub use types::Mode;
pub use types::ModelCheck;
pub use types::ModelInfo;
pub use types::ModelList;
pub use types::Role;
pub use types::Turn;
