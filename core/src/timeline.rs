use chrono::DateTime;
use chrono::Local;

use crate::attachments::Attachment;

pub const DEFAULT_GREETING: &str = "Hello! I'm your local vision model. You can send me text messages or attach images for me to analyze. What would you like to chat about?";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u64);

impl MessageId {
    pub const fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum MessageKind {
    User,
    Assistant,
    Error,
}

/// One rendered entry. Never modified after it is appended.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub kind: MessageKind,
    pub text: Option<String>,
    pub images: Vec<Attachment>,
    pub created_at: DateTime<Local>,
}

/// Append-only list of everything shown to the user, including errors and
/// image previews that the transcript never carries.
#[derive(Clone, Debug)]
pub struct MessageTimeline {
    messages: Vec<Message>,
    next_id: u64,
}

impl MessageTimeline {
    /// A timeline seeded with a single assistant greeting.
    pub fn new(greeting: impl Into<String>) -> Self {
        let mut timeline = Self {
            messages: Vec::new(),
            next_id: 1,
        };
        timeline.push(MessageKind::Assistant, Some(greeting.into()), Vec::new());
        timeline
    }

    /// An empty string is stored as "no text" so image-only turns render
    /// without a text body.
    pub fn push_user(&mut self, text: &str, images: Vec<Attachment>) -> MessageId {
        let text = (!text.is_empty()).then(|| text.to_string());
        self.push(MessageKind::User, text, images)
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) -> MessageId {
        self.push(MessageKind::Assistant, Some(text.into()), Vec::new())
    }

    pub fn push_error(&mut self, text: impl Into<String>) -> MessageId {
        self.push(MessageKind::Error, Some(text.into()), Vec::new())
    }

    fn push(
        &mut self,
        kind: MessageKind,
        text: Option<String>,
        images: Vec<Attachment>,
    ) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.messages.push(Message {
            id,
            kind,
            text,
            images,
            created_at: Local::now(),
        });
        id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages appended after `id`, oldest first.
    pub fn since(&self, id: MessageId) -> &[Message] {
        let start = self.messages.partition_point(|m| m.id <= id);
        &self.messages[start..]
    }
}

impl Default for MessageTimeline {
    fn default() -> Self {
        Self::new(DEFAULT_GREETING)
    }
}
