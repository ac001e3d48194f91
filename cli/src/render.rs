use owo_colors::OwoColorize;
use owo_colors::Style;
use strum::IntoEnumIterator;
use supports_color::Stream;
use vchat_core::Attachment;
use vchat_core::AttachmentUpdate;
use vchat_core::Message;
use vchat_core::MessageKind;
use vchat_core::Mode;
use vchat_core::ModelStatus;
use vchat_core::Role;
use vchat_core::Turn;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Styles {
    bold: Style,
    dimmed: Style,
    red: Style,
    green: Style,
    cyan: Style,
    yellow: Style,
}

impl Styles {
    /// Colored when stdout supports it.
    pub(crate) fn detect() -> Self {
        if supports_color::on_cached(Stream::Stdout).is_some() {
            Self::colored()
        } else {
            Self::plain()
        }
    }

    pub(crate) fn colored() -> Self {
        Self {
            bold: Style::new().bold(),
            dimmed: Style::new().dimmed(),
            red: Style::new().red(),
            green: Style::new().green(),
            cyan: Style::new().cyan().bold(),
            yellow: Style::new().yellow(),
        }
    }

    pub(crate) fn plain() -> Self {
        Self {
            bold: Style::new(),
            dimmed: Style::new(),
            red: Style::new(),
            green: Style::new(),
            cyan: Style::new(),
            yellow: Style::new(),
        }
    }
}

pub(crate) fn format_message(message: &Message, styles: &Styles) -> String {
    let time = message.created_at.format("%H:%M");
    let (label, style) = match message.kind {
        MessageKind::User => ("you", styles.bold),
        MessageKind::Assistant => ("assistant", styles.cyan),
        MessageKind::Error => ("error", styles.red),
    };
    let mut out = format!("{} {}", time.style(styles.dimmed), label.style(style));
    if let Some(text) = &message.text {
        out.push_str(": ");
        match message.kind {
            MessageKind::Error => out.push_str(&text.style(styles.red).to_string()),
            _ => out.push_str(text),
        }
    }
    if !message.images.is_empty() {
        let names: Vec<&str> = message.images.iter().map(|a| a.filename.as_str()).collect();
        let note = format!("[{} image(s): {}]", names.len(), names.join(", "));
        out.push(' ');
        out.push_str(&note.style(styles.dimmed).to_string());
    }
    out
}

pub(crate) fn format_status(status: &ModelStatus, base_url: &str, styles: &Styles) -> String {
    match status {
        ModelStatus::Checking => format!("{} {base_url}", "checking".style(styles.yellow)),
        ModelStatus::Available(details) => {
            let model = details.target_model.as_deref().unwrap_or("model");
            format!(
                "{} {model} at {base_url}",
                "available".style(styles.green)
            )
        }
        ModelStatus::Unavailable { reason, .. } => format!(
            "{} {reason}\n{}",
            "unavailable".style(styles.red),
            "Start your local model and run /status to check again.".style(styles.dimmed)
        ),
    }
}

pub(crate) fn format_attachment(attachment: &Attachment) -> String {
    let size = human_size(attachment.bytes.len() as u64);
    match attachment.dimensions {
        Some((w, h)) => format!(
            "{} {} ({w}x{h}, {size})",
            attachment.id, attachment.filename
        ),
        None => format!("{} {} ({size})", attachment.id, attachment.filename),
    }
}

pub(crate) fn format_update(update: &AttachmentUpdate, styles: &Styles) -> Option<String> {
    match update {
        AttachmentUpdate::Loaded(attachment) => Some(format!(
            "{} {}",
            "attached".style(styles.green),
            format_attachment(attachment)
        )),
        AttachmentUpdate::Failed { id, error, .. } => Some(format!(
            "{} {id}: {error}",
            "could not attach".style(styles.red)
        )),
        AttachmentUpdate::Discarded { .. } => None,
    }
}

pub(crate) fn format_turn(turn: &Turn, styles: &Styles) -> String {
    let label = match turn.role {
        Role::User => "user".style(styles.bold).to_string(),
        Role::Assistant => "assistant".style(styles.cyan).to_string(),
    };
    format!("{label}: {}", turn.content)
}

pub(crate) fn format_mode(current: Mode, styles: &Styles) -> String {
    let options: Vec<String> = Mode::iter().map(|mode| mode.to_string()).collect();
    format!(
        "mode: {} ({})  options: {}",
        current.style(styles.bold),
        current.label(),
        options.join(", ")
    )
}

pub(crate) fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
