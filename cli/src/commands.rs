use std::path::PathBuf;
use std::str::FromStr;

use vchat_core::AttachmentId;
use vchat_core::Mode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    /// Plain text to submit.
    Send(String),
    Attach(Vec<PathBuf>),
    Detach(AttachmentId),
    Pending,
    /// Show the mode, or switch to the given one.
    Mode(Option<Mode>),
    Status,
    Models,
    History,
    Reset,
    Help,
    Quit,
    /// A slash command that could not be understood, with a hint.
    Invalid(String),
}

pub(crate) const HELP: &str = "\
Type a message and press Enter to send it.

  /attach <paths...>   queue images for the next message
  /detach <id>         drop a queued image
  /pending             list queued images
  /mode [best|text|image]
                       show or change the inference mode
  /status              re-check whether the model is available
  /models              list models installed on the backend
  /history             show the transcript sent as context
  /reset               start a new conversation
  /help                show this help
  /quit                exit";

pub(crate) fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Command::Send(line.to_string());
    };
    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    match name {
        "attach" | "a" => {
            if args.is_empty() {
                return Command::Invalid("usage: /attach <paths...>".to_string());
            }
            Command::Attach(args.split_whitespace().map(PathBuf::from).collect())
        }
        "detach" | "d" => match parse_attachment_id(args) {
            Some(id) => Command::Detach(id),
            None => Command::Invalid("usage: /detach <id>".to_string()),
        },
        "pending" => Command::Pending,
        "mode" => {
            if args.is_empty() {
                return Command::Mode(None);
            }
            match Mode::from_str(args) {
                Ok(mode) => Command::Mode(Some(mode)),
                Err(_) => Command::Invalid(format!(
                    "unknown mode `{args}`: expected best, text or image"
                )),
            }
        }
        "status" => Command::Status,
        "models" => Command::Models,
        "history" => Command::History,
        "reset" | "new" => Command::Reset,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => Command::Invalid(format!("unknown command `/{name}`; try /help")),
    }
}

fn parse_attachment_id(arg: &str) -> Option<AttachmentId> {
    let raw = arg.strip_prefix('#').unwrap_or(arg);
    raw.parse::<u64>().ok().map(AttachmentId::new)
}
