//! Maps page commands to effects.
//!
//! Commands return immediately. Run and Save spawn tokio tasks whose completions
//! come back as [`Event`]s on the receiver handed out by
//! [`CommandDispatcher::new`]. The owner of the [`EditorSurface`] feeds them to
//! [`CommandDispatcher::handle_event`] one at a time.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use strum::{Display, EnumString};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::editor::{EditorSurface, Notice, NoticeLevel};
use crate::errors::{EditorError, Result};
use crate::executors::{ExecutionChannel, ExecutionResult};
use crate::navigation::{Navigator, ENTRY_PATH};
use crate::persistence::{DocumentStore, SaveRequest};
use crate::session::SessionProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Run,
    Save,
    Logout { discard_unsaved: bool },
    ClearConsole,
}

#[derive(Debug)]
pub enum Event {
    RunFinished { seq: u64, result: ExecutionResult },
    SaveFinished { version: u64, outcome: Result<()> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Run submitted under this sequence number.
    RunStarted(u64),
    /// Save queued for this document version.
    SaveQueued(u64),
    LoggedOut,
    /// Logout refused: there are unsaved changes and the caller did not agree to drop them.
    ConfirmationRequired,
    ConsoleCleared,
    /// The dispatcher was torn down; nothing happened.
    Ignored,
}

/// What Logout does with unsaved changes.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum LogoutPolicy {
    #[default]
    Confirm,
    DiscardWithWarning,
}

#[derive(Clone)]
pub struct Collaborators {
    pub channel: ExecutionChannel,
    pub store: Arc<dyn DocumentStore>,
    pub sessions: Arc<dyn SessionProvider>,
    pub navigator: Arc<dyn Navigator>,
}

struct SaveJob {
    version: u64,
    request: SaveRequest,
}

pub struct CommandDispatcher {
    collaborators: Collaborators,
    policy: LogoutPolicy,
    event_tx: mpsc::UnboundedSender<Event>,
    cancel: CancellationToken,
    runs: Vec<JoinHandle<()>>,
    save_tx: Option<mpsc::UnboundedSender<SaveJob>>,
    save_worker: Option<JoinHandle<()>>,
    torn_down: bool,
}

impl CommandDispatcher {
    pub fn new(
        collaborators: Collaborators,
        policy: LogoutPolicy,
    ) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let dispatcher = Self {
            collaborators,
            policy,
            event_tx,
            cancel: CancellationToken::new(),
            runs: Vec::new(),
            save_tx: None,
            save_worker: None,
            torn_down: false,
        };
        (dispatcher, event_rx)
    }

    pub fn policy(&self) -> LogoutPolicy {
        self.policy
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    pub fn is_active(&self) -> bool {
        !self.torn_down
    }

    pub fn dispatch(
        &mut self,
        surface: &mut EditorSurface,
        command: Command,
    ) -> Result<CommandOutcome> {
        if self.torn_down {
            log::debug!("Ignoring {:?} after teardown", command);
            return Ok(CommandOutcome::Ignored);
        }
        match command {
            Command::Run => Ok(self.run(surface)),
            Command::Save => self.save(surface),
            Command::Logout { discard_unsaved } => Ok(self.logout(surface, discard_unsaved)),
            Command::ClearConsole => {
                surface.clear_console();
                Ok(CommandOutcome::ConsoleCleared)
            }
        }
    }

    /// Applies a completion to the surface. Returns whether it changed what is displayed.
    pub fn handle_event(&mut self, surface: &mut EditorSurface, event: Event) -> bool {
        if self.torn_down {
            log::debug!("Dropping {:?} received after teardown", event);
            return false;
        }
        match event {
            Event::RunFinished { seq, result } => surface.apply_run_result(seq, result),
            Event::SaveFinished { version, outcome } => {
                surface.complete_save(version, &outcome);
                true
            }
        }
    }

    /// Cancels every in-flight Run and Save. Later events are ignored.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.cancel.cancel();
        for run in self.runs.drain(..) {
            run.abort();
        }
        self.save_tx = None;
        if let Some(worker) = self.save_worker.take() {
            worker.abort();
        }
        log::info!("Editor session torn down");
    }

    fn run(&mut self, surface: &mut EditorSurface) -> CommandOutcome {
        let ticket = surface.begin_run();
        let seq = ticket.seq;
        log::info!("Run #{} submitted ({})", seq, ticket.request.language);

        let channel = self.collaborators.channel.clone();
        let event_tx = self.event_tx.clone();
        let token = self.cancel.child_token();

        self.runs.retain(|run| !run.is_finished());
        self.runs.push(tokio::spawn(async move {
            let started = Instant::now();
            let result = tokio::select! {
                _ = token.cancelled() => {
                    log::debug!("Run #{} cancelled", seq);
                    return;
                }
                outcome = channel.execute(&ticket.request) => match outcome {
                    Ok(result) => result,
                    Err(err) => ExecutionResult::from_failure(
                        &EditorError::from(err),
                        started.elapsed().as_millis() as u64,
                    ),
                },
            };
            if event_tx.send(Event::RunFinished { seq, result }).is_err() {
                log::debug!("Run #{} finished after the event loop closed", seq);
            }
        }));
        CommandOutcome::RunStarted(seq)
    }

    fn save(&mut self, surface: &mut EditorSurface) -> Result<CommandOutcome> {
        let session = self
            .collaborators
            .sessions
            .get_session()
            .ok_or(EditorError::NotAuthenticated)?;

        let ticket = surface.begin_save();
        let job = SaveJob {
            version: ticket.version,
            request: SaveRequest {
                content: ticket.content,
                language: ticket.language,
                session_id: session.id,
            },
        };

        let save_tx = self.save_queue();
        save_tx
            .send(job)
            .map_err(|_| EditorError::SaveFailed("save queue closed".to_string()))?;
        log::info!("Save of version {} queued", ticket.version);
        Ok(CommandOutcome::SaveQueued(ticket.version))
    }

    /// Saves go through a single worker so they reach the store in issue order.
    fn save_queue(&mut self) -> mpsc::UnboundedSender<SaveJob> {
        if let Some(save_tx) = &self.save_tx {
            return save_tx.clone();
        }
        let (save_tx, save_rx) = mpsc::unbounded_channel();
        self.save_worker = Some(tokio::spawn(save_worker(
            self.collaborators.store.clone(),
            save_rx,
            self.event_tx.clone(),
            self.cancel.child_token(),
        )));
        self.save_tx = Some(save_tx.clone());
        save_tx
    }

    fn logout(&mut self, surface: &mut EditorSurface, discard_unsaved: bool) -> CommandOutcome {
        if surface.is_dirty() {
            match self.policy {
                LogoutPolicy::Confirm if !discard_unsaved => {
                    return CommandOutcome::ConfirmationRequired;
                }
                LogoutPolicy::Confirm => {}
                LogoutPolicy::DiscardWithWarning => {
                    log::warn!("Logging out with unsaved changes");
                    surface.post_notice(Notice::new(
                        NoticeLevel::Warning,
                        "Logged out with unsaved changes. They were discarded.",
                    ));
                }
            }
        }

        self.collaborators.sessions.invalidate();
        self.teardown();
        self.collaborators.navigator.navigate(ENTRY_PATH);
        CommandOutcome::LoggedOut
    }
}

impl Drop for CommandDispatcher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn save_worker(
    store: Arc<dyn DocumentStore>,
    mut save_rx: mpsc::UnboundedReceiver<SaveJob>,
    event_tx: mpsc::UnboundedSender<Event>,
    token: CancellationToken,
) {
    loop {
        let job = tokio::select! {
            _ = token.cancelled() => break,
            job = save_rx.recv() => match job {
                Some(job) => job,
                None => break,
            },
        };
        let outcome = tokio::select! {
            _ = token.cancelled() => break,
            outcome = store.save(&job.request) => outcome,
        };
        if let Err(err) = &outcome {
            log::warn!("Save of version {} via '{}' failed: {}", job.version, store.name(), err);
        }
        let event = Event::SaveFinished {
            version: job.version,
            outcome,
        };
        if event_tx.send(event).is_err() {
            break;
        }
    }
    log::debug!("Save worker stopped");
}
