use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::warn;
use vchat_backend_client::Client;
use vchat_core::ChatBackend;
use vchat_core::ChatReply;
use vchat_core::Config;
use vchat_core::SendError;
use vchat_core::Session;
use vchat_core::SubmitError;
use vchat_core::TurnId;
use vchat_core::TurnOutcome;

use crate::commands::Command;
use crate::commands::HELP;
use crate::commands::parse_command;
use crate::render::Styles;
use crate::render::format_attachment;
use crate::render::format_message;
use crate::render::format_mode;
use crate::render::format_status;
use crate::render::format_turn;
use crate::render::format_update;
use crate::render::human_size;

struct InFlight {
    turn: TurnId,
    handle: JoinHandle<Result<ChatReply, SendError>>,
}

enum Flow {
    Continue,
    Quit,
}

pub(crate) struct App {
    session: Session,
    client: Arc<Client>,
    base_url: String,
    styles: Styles,
    inflight: Option<InFlight>,
}

impl App {
    pub(crate) fn new(config: &Config, client: Client, styles: Styles) -> Self {
        Self {
            session: Session::new(config),
            client: Arc::new(client),
            base_url: config.base_url.clone(),
            styles,
            inflight: None,
        }
    }

    pub(crate) async fn run(mut self, initial_images: Vec<PathBuf>) -> anyhow::Result<()> {
        self.print_timeline_from_start();
        self.refresh_status().await;
        if !initial_images.is_empty() {
            self.attach(initial_images);
            self.settle_attachments().await;
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;
        loop {
            if !stdin_open
                && self.inflight.is_none()
                && self.session.attachments().in_flight() == 0
            {
                break;
            }

            tokio::select! {
                line = lines.next_line(), if stdin_open => {
                    match line? {
                        Some(line) => {
                            if let Flow::Quit = self.handle_line(&line).await {
                                break;
                            }
                        }
                        None => {
                            debug!("stdin closed");
                            stdin_open = false;
                        }
                    }
                }
                Some(update) = self.session.attachments_mut().next_update(),
                    if self.session.attachments().in_flight() > 0 =>
                {
                    if let Some(line) = format_update(&update, &self.styles) {
                        println!("{line}");
                    }
                }
                joined = async {
                    match self.inflight.as_mut() {
                        Some(inflight) => (&mut inflight.handle).await,
                        None => std::future::pending().await,
                    }
                }, if self.inflight.is_some() => {
                    if let Some(InFlight { turn, .. }) = self.inflight.take() {
                        let result = joined.unwrap_or_else(|err| Err(SendError::from(err)));
                        self.finish_turn(turn, result);
                    }
                }
                else => break,
            }
        }

        if let Some(inflight) = self.inflight.take() {
            inflight.handle.abort();
        }
        Ok(())
    }

    async fn handle_line(&mut self, line: &str) -> Flow {
        match parse_command(line) {
            Command::Send(text) => self.submit(text).await,
            Command::Attach(paths) => self.attach(paths),
            Command::Detach(id) => {
                if self.session.attachments_mut().remove_attachment(id) {
                    println!("removed {id}");
                } else {
                    println!("no attachment {id}");
                }
            }
            Command::Pending => self.print_pending(),
            Command::Mode(None) => {
                println!("{}", format_mode(self.session.mode(), &self.styles));
            }
            Command::Mode(Some(mode)) => {
                self.session.set_mode(mode);
                println!("{}", format_mode(mode, &self.styles));
            }
            Command::Status => self.refresh_status().await,
            Command::Models => self.print_models().await,
            Command::History => self.print_history(),
            Command::Reset => {
                if let Some(inflight) = self.inflight.take() {
                    inflight.handle.abort();
                }
                self.session.reset();
                self.print_timeline_from_start();
                self.refresh_status().await;
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => return Flow::Quit,
            Command::Invalid(hint) => println!("{hint}"),
        }
        Flow::Continue
    }

    async fn submit(&mut self, text: String) {
        // Loads that finished but were not applied yet belong to this message.
        self.settle_attachments().await;
        if text.trim().is_empty() && !self.session.attachments().has_pending() {
            return;
        }
        if !self.session.status().is_available() {
            println!(
                "The model is not available. Run /status to check again once it is running."
            );
            return;
        }

        self.session.set_input(text);
        let dispatched = match self.session.begin_submit() {
            Ok(dispatched) => dispatched,
            Err(SubmitError::Empty) => return,
            Err(err @ SubmitError::Busy) => {
                println!("{err}; wait for the reply");
                return;
            }
        };

        if let Some(message) = self.session.timeline().get(dispatched.user_message)
            && !message.images.is_empty()
        {
            println!("{}", format_message(message, &self.styles));
        }
        println!("thinking...");

        let client = Arc::clone(&self.client);
        let request = dispatched.request;
        let handle = tokio::spawn(async move {
            ChatBackend::chat(client.as_ref(), &request).await
        });
        self.inflight = Some(InFlight {
            turn: dispatched.turn,
            handle,
        });
    }

    fn finish_turn(&mut self, turn: TurnId, result: Result<ChatReply, SendError>) {
        let Some(outcome) = self.session.complete_turn(turn, result) else {
            warn!(turn = turn.raw(), "dropping completion for a stale turn");
            return;
        };
        if let Some(message) = self.session.timeline().get(outcome.message_id()) {
            println!("{}", format_message(message, &self.styles));
        }
        if let TurnOutcome::Replied {
            model_used: Some(model),
            ..
        } = &outcome
        {
            debug!(model = %model, "reply received");
        }
    }

    fn attach(&mut self, paths: Vec<PathBuf>) {
        let added = self.session.attachments_mut().add_files(paths);
        for path in &added.skipped {
            println!("skipping {}: not an image", path.display());
        }
        if !added.accepted.is_empty() {
            println!("loading {} image(s)...", added.accepted.len());
        }
    }

    async fn settle_attachments(&mut self) {
        if self.session.attachments().in_flight() == 0 {
            return;
        }
        for update in self.session.attachments_mut().settle().await {
            if let Some(line) = format_update(&update, &self.styles) {
                println!("{line}");
            }
        }
    }

    fn print_pending(&self) {
        let pending = self.session.attachments().pending();
        if pending.is_empty() {
            println!("no images queued");
            return;
        }
        for attachment in pending {
            println!("{}", format_attachment(attachment));
        }
    }

    fn print_history(&self) {
        let turns = self.session.history().turns();
        if turns.is_empty() {
            println!("the transcript is empty");
            return;
        }
        for turn in turns {
            println!("{}", format_turn(turn, &self.styles));
        }
    }

    async fn print_models(&self) {
        match self.client.list_models().await {
            Ok(list) if list.models.is_empty() => println!("no models installed"),
            Ok(list) => {
                for model in list.models {
                    println!("{} ({})", model.name, human_size(model.size));
                }
            }
            Err(err) => println!("could not list models: {err}"),
        }
    }

    async fn refresh_status(&mut self) {
        self.session.begin_status_check();
        println!(
            "{}",
            format_status(self.session.status(), &self.base_url, &self.styles)
        );
        let result = self.client.check_model().await;
        let status = self.session.apply_status(result);
        println!("{}", format_status(status, &self.base_url, &self.styles));
    }

    fn print_timeline_from_start(&self) {
        for message in self.session.timeline().messages() {
            println!("{}", format_message(message, &self.styles));
        }
    }
}
