//! Pending image attachments for the next submission.
//!
//! Each selected file is read on its own tokio task. Completions are
//! delivered over a channel and only touch the pending set when the owner
//! of the manager drains them (`poll`, `next_update`, `settle`), so the set
//! is never mutated from a background task.

use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;
use std::path::PathBuf;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use bytes::Bytes;
use image::ImageReader;
use mime_guess::MimeGuess;
use tokio::sync::mpsc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;
use tracing::warn;
use vchat_backend_client::ImagePart;

/// Session-unique identifier assigned when a file is selected.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct AttachmentId(pub u64);

impl AttachmentId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A loaded image waiting to be sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub id: AttachmentId,
    pub filename: String,
    pub path: PathBuf,
    pub mime: String,
    pub bytes: Bytes,
    /// `data:<mime>;base64,...` rendering of `bytes`.
    pub preview: String,
    /// Pixel size, when the header could be decoded.
    pub dimensions: Option<(u32, u32)>,
}

impl Attachment {
    pub fn to_image_part(&self) -> ImagePart {
        ImagePart {
            filename: self.filename.clone(),
            mime: self.mime.clone(),
            bytes: self.bytes.clone(),
        }
    }
}

/// Completion of one background load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttachmentUpdate {
    Loaded(Attachment),
    Failed {
        id: AttachmentId,
        path: PathBuf,
        error: String,
    },
    /// The attachment was removed (or the session reset) before its load
    /// finished; the result was dropped.
    Discarded { id: AttachmentId },
}

impl AttachmentUpdate {
    pub fn id(&self) -> AttachmentId {
        match self {
            AttachmentUpdate::Loaded(attachment) => attachment.id,
            AttachmentUpdate::Failed { id, .. } | AttachmentUpdate::Discarded { id } => *id,
        }
    }
}

/// Result of handing a batch of paths to [`ImageAttachmentManager::add_files`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddedFiles {
    /// Identifiers of the loads that were started, in selection order.
    pub accepted: Vec<AttachmentId>,
    /// Paths dropped because they do not look like images.
    pub skipped: Vec<PathBuf>,
}

pub struct ImageAttachmentManager {
    next_id: u64,
    pending: Vec<Attachment>,
    inflight: HashSet<AttachmentId>,
    discarded: HashSet<AttachmentId>,
    update_tx: UnboundedSender<(AttachmentId, Result<Attachment, LoadFailure>)>,
    update_rx: UnboundedReceiver<(AttachmentId, Result<Attachment, LoadFailure>)>,
}

#[derive(Debug)]
struct LoadFailure {
    path: PathBuf,
    error: String,
}

impl ImageAttachmentManager {
    pub fn new() -> Self {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        Self {
            next_id: 1,
            pending: Vec::new(),
            inflight: HashSet::new(),
            discarded: HashSet::new(),
            update_tx,
            update_rx,
        }
    }

    /// Start loading every image-typed path. Non-image paths are dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn add_files<I, P>(&mut self, paths: I) -> AddedFiles
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut added = AddedFiles::default();
        for path in paths {
            let path = path.into();
            let Some(mime) = infer_image_mime(&path) else {
                debug!(path = %path.display(), "skipping non-image file");
                added.skipped.push(path);
                continue;
            };

            let id = AttachmentId::new(self.next_id);
            self.next_id += 1;
            self.inflight.insert(id);
            added.accepted.push(id);

            let tx = self.update_tx.clone();
            tokio::spawn(async move {
                let result = load_attachment(id, path, mime).await;
                let _ = tx.send((id, result));
            });
        }
        added
    }

    /// Remove one attachment by identity. Removing an id that is still
    /// loading drops its result on arrival. Absent ids are a no-op.
    pub fn remove_attachment(&mut self, id: AttachmentId) -> bool {
        if let Some(index) = self.pending.iter().position(|a| a.id == id) {
            self.pending.remove(index);
            return true;
        }
        if self.inflight.contains(&id) {
            return self.discarded.insert(id);
        }
        false
    }

    /// Take the whole pending set, leaving it empty.
    pub fn consume_pending(&mut self) -> Vec<Attachment> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> &[Attachment] {
        &self.pending
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Number of loads that have not been applied yet.
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }

    /// Apply every completion that is ready without waiting.
    pub fn poll(&mut self) -> Vec<AttachmentUpdate> {
        let mut out = Vec::new();
        while let Ok((id, result)) = self.update_rx.try_recv() {
            out.push(self.apply(id, result));
        }
        out
    }

    /// Wait for the next completion and apply it. Returns `None` right away
    /// when nothing is loading.
    pub async fn next_update(&mut self) -> Option<AttachmentUpdate> {
        if self.inflight.is_empty() {
            return None;
        }
        let (id, result) = self.update_rx.recv().await?;
        Some(self.apply(id, result))
    }

    /// Wait until every started load has been applied.
    pub async fn settle(&mut self) -> Vec<AttachmentUpdate> {
        let mut out = Vec::new();
        while let Some(update) = self.next_update().await {
            out.push(update);
        }
        out
    }

    /// Drop the pending set and every load that has not finished yet.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.discarded.extend(self.inflight.iter().copied());
    }

    fn apply(
        &mut self,
        id: AttachmentId,
        result: Result<Attachment, LoadFailure>,
    ) -> AttachmentUpdate {
        self.inflight.remove(&id);
        if self.discarded.remove(&id) {
            debug!(attachment_id = id.raw(), "dropping load for removed attachment");
            return AttachmentUpdate::Discarded { id };
        }
        match result {
            Ok(attachment) => {
                debug!(
                    attachment_id = id.raw(),
                    filename = %attachment.filename,
                    bytes = attachment.bytes.len(),
                    "attachment loaded"
                );
                self.pending.push(attachment.clone());
                AttachmentUpdate::Loaded(attachment)
            }
            Err(LoadFailure { path, error }) => {
                warn!(attachment_id = id.raw(), "attachment load failed: {error}");
                AttachmentUpdate::Failed { id, path, error }
            }
        }
    }
}

impl Default for ImageAttachmentManager {
    fn default() -> Self {
        Self::new()
    }
}

async fn load_attachment(
    id: AttachmentId,
    path: PathBuf,
    mime: String,
) -> Result<Attachment, LoadFailure> {
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let error = format!("failed to read {}: {e}", path.display());
            return Err(LoadFailure { path, error });
        }
    };
    let bytes = Bytes::from(bytes);
    let filename = path
        .file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| "image".to_string());
    let preview = format!("data:{mime};base64,{}", BASE64_STANDARD.encode(&bytes));
    let dimensions = probe_dimensions(&bytes);
    Ok(Attachment {
        id,
        filename,
        path,
        mime,
        bytes,
        preview,
        dimensions,
    })
}

fn probe_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

/// MIME type for `path` when it names an image, `None` otherwise.
pub fn infer_image_mime(path: &Path) -> Option<String> {
    if let Some(mime) = MimeGuess::from_path(path).first_raw()
        && mime.starts_with("image/")
    {
        return Some(mime.to_string());
    }

    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.trim().to_ascii_lowercase())?;
    let mime = match ext.as_str() {
        "heic" => "image/heic",
        "heif" => "image/heif",
        "avif" => "image/avif",
        _ => return None,
    };
    Some(mime.to_string())
}
