//! Interactive console: the terminal rendering of a session. Generation and
//! key selection run as background tasks so the console keeps taking input
//! while they are outstanding.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;

use crate::commands::history::{format_entry, recent};
use crate::commands::{build_session, persist_generated};
use crate::config::AppConfig;
use crate::credentials::{ConsoleKeyPrompt, KeyDialogRequest, KeyFileCredentials};
use crate::library::{list_generation_logs, load_reference_images};
use crate::models::{AspectRatio, GenerationSettings, ImageSize};
use crate::revalidate::{spawn_revalidation, watch_key_file, RevalidationSignal};
use crate::session::{GenerateOutcome, GenerationSession, GenerationState};
use crate::view::ViewModel;

const HELP: &str = "\
Commands:
  prompt <text>      set the prompt
  add <path>...      add reference images
  remove <id>        remove a reference image
  aspect <ratio>     1:1, 3:4, 4:3, 16:9 or 9:16
  size <size>        1K or 2K
  generate           generate an image
  key                select an API key
  refresh            re-check the API key
  status             show the current state
  history            show recent generations
  help               show this help
  quit               exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Prompt(String),
    Add(Vec<PathBuf>),
    Remove(String),
    Aspect(AspectRatio),
    Size(ImageSize),
    Generate,
    Key,
    Refresh,
    Status,
    History,
    Help,
    Quit,
    Empty,
}

pub fn parse_command(line: &str) -> Result<ConsoleCommand, String> {
    let trimmed = line.trim();
    let (name, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (trimmed, ""),
    };

    let command = match name.to_lowercase().as_str() {
        "" => ConsoleCommand::Empty,
        "prompt" | "p" => ConsoleCommand::Prompt(rest.to_string()),
        "add" | "a" => {
            if rest.is_empty() {
                return Err("Usage: add <path>...".into());
            }
            ConsoleCommand::Add(rest.split_whitespace().map(PathBuf::from).collect())
        }
        "remove" | "rm" => {
            if rest.is_empty() {
                return Err("Usage: remove <id>".into());
            }
            ConsoleCommand::Remove(rest.to_string())
        }
        "aspect" => ConsoleCommand::Aspect(rest.parse()?),
        "size" => ConsoleCommand::Size(rest.parse()?),
        "generate" | "g" => ConsoleCommand::Generate,
        "key" => ConsoleCommand::Key,
        "refresh" => ConsoleCommand::Refresh,
        "status" | "s" => ConsoleCommand::Status,
        "history" => ConsoleCommand::History,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" | "q" => ConsoleCommand::Quit,
        other => return Err(format!("Unknown command '{other}'. Type `help`.")),
    };
    Ok(command)
}

const KEY_DIALOG_PROMPT: &str = "\nPaste your Gemini API key (empty line cancels):";

/// Key dialogs waiting for console input, answered in arrival order.
#[derive(Debug, Default)]
struct KeyDialogQueue {
    pending: VecDeque<oneshot::Sender<Option<String>>>,
}

impl KeyDialogQueue {
    /// Queues a dialog; returns whether it is now the one being shown.
    fn push(&mut self, request: KeyDialogRequest) -> bool {
        self.pending.push_back(request.reply);
        self.pending.len() == 1
    }

    /// Answers the oldest dialog with `line`, if any is waiting. Returns
    /// whether another dialog is still waiting.
    fn answer(&mut self, line: &str) -> Option<bool> {
        let reply = self.pending.pop_front()?;
        let key = line.trim().to_string();
        let _ = reply.send((!key.is_empty()).then_some(key));
        Some(!self.pending.is_empty())
    }
}

enum TaskResult {
    Generated {
        outcome: GenerateOutcome,
        request: GenerationState,
    },
    KeySelected(bool),
}

pub async fn run(config: &AppConfig) -> Result<()> {
    let (dialog_tx, mut dialogs) = mpsc::channel::<KeyDialogRequest>(1);
    let credentials = Arc::new(KeyFileCredentials::new(
        config.key_file(),
        config.api_key.clone(),
        Arc::new(ConsoleKeyPrompt::new(dialog_tx)),
    ));
    let session = build_session(config, credentials.clone());
    session.start().await;

    let (signal_tx, signal_rx) = mpsc::channel(8);
    let revalidation = spawn_revalidation(session.checker().clone(), signal_rx);
    let key_watcher = match watch_key_file(credentials.key_file(), signal_tx.clone()) {
        Ok(watcher) => Some(watcher),
        Err(err) => {
            tracing::warn!("not watching key file: {err}");
            None
        }
    };

    let mut validity = session.checker().subscribe();
    let mut lines = spawn_stdin_reader();
    let mut tasks: JoinSet<TaskResult> = JoinSet::new();
    let mut dialogs_waiting = KeyDialogQueue::default();

    println!("{}\n", ViewModel::from_snapshot(&session.snapshot()));
    println!("Type `help` for commands.");
    prompt_marker();

    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else { break };

                if let Some(more) = dialogs_waiting.answer(&line) {
                    if more {
                        println!("{KEY_DIALOG_PROMPT}");
                    }
                    continue;
                }

                match parse_command(&line) {
                    Ok(ConsoleCommand::Quit) => break,
                    Ok(command) => {
                        handle_command(command, &session, config, &signal_tx, &mut tasks).await;
                    }
                    Err(message) => println!("{message}"),
                }
                prompt_marker();
            }
            Some(request) = dialogs.recv() => {
                if dialogs_waiting.push(request) {
                    println!("{KEY_DIALOG_PROMPT}");
                }
            }
            Some(joined) = tasks.join_next() => {
                match joined {
                    Ok(result) => report_task(result, &session, config).await,
                    Err(err) => tracing::error!("background task failed: {err}"),
                }
                prompt_marker();
            }
            Ok(()) = validity.changed() => {
                let valid = *validity.borrow_and_update();
                tracing::debug!(valid, "API key validity changed");
            }
        }
    }

    // Unblock any key prompt still waiting on the console.
    drop(dialogs_waiting);
    tasks.shutdown().await;
    drop(signal_tx);
    drop(key_watcher);
    revalidation.abort();
    Ok(())
}

async fn handle_command(
    command: ConsoleCommand,
    session: &Arc<GenerationSession>,
    config: &AppConfig,
    signals: &mpsc::Sender<RevalidationSignal>,
    tasks: &mut JoinSet<TaskResult>,
) {
    match command {
        ConsoleCommand::Prompt(text) => session.set_prompt(text),
        ConsoleCommand::Add(paths) => match load_reference_images(&paths).await {
            Ok(images) => {
                println!("Added {} reference image(s).", images.len());
                session.add_images(images);
            }
            Err(message) => println!("{message}"),
        },
        ConsoleCommand::Remove(id) => {
            if !session.remove_image(&id) {
                println!("No reference image with id {id}.");
            }
        }
        ConsoleCommand::Aspect(aspect_ratio) => {
            let settings = session.snapshot().state.settings;
            session.set_settings(GenerationSettings {
                aspect_ratio,
                ..settings
            });
        }
        ConsoleCommand::Size(image_size) => {
            let settings = session.snapshot().state.settings;
            session.set_settings(GenerationSettings {
                image_size,
                ..settings
            });
        }
        ConsoleCommand::Generate => {
            let snapshot = session.snapshot();
            if snapshot.state.is_generating {
                println!("A generation is already running.");
                return;
            }
            let request = snapshot.state;
            let session = session.clone();
            tasks.spawn(async move {
                let outcome = session.generate().await;
                TaskResult::Generated { outcome, request }
            });
            println!("Generating...");
        }
        ConsoleCommand::Key => {
            let session = session.clone();
            tasks.spawn(async move { TaskResult::KeySelected(session.request_key().await) });
        }
        ConsoleCommand::Refresh => {
            if signals.send(RevalidationSignal::Requested).await.is_err() {
                println!("Key revalidation is not running.");
            }
        }
        ConsoleCommand::Status => {
            println!("{}", ViewModel::from_snapshot(&session.snapshot()));
        }
        ConsoleCommand::History => match list_generation_logs(&config.output_dir()).await {
            Ok(entries) if entries.is_empty() => println!("No generations yet."),
            Ok(entries) => {
                for entry in recent(&entries, 10) {
                    println!("{}", format_entry(entry));
                }
            }
            Err(message) => println!("{message}"),
        },
        ConsoleCommand::Help => println!("{HELP}"),
        ConsoleCommand::Quit | ConsoleCommand::Empty => {}
    }
}

async fn report_task(result: TaskResult, session: &GenerationSession, config: &AppConfig) {
    match result {
        TaskResult::Generated {
            outcome: GenerateOutcome::Succeeded(url),
            request,
        } => match persist_generated(&config.output_dir(), &url, &request).await {
            Ok(path) => println!("\nSaved {}", path.display()),
            Err(message) => println!("\n{message}"),
        },
        TaskResult::Generated {
            outcome: GenerateOutcome::Superseded,
            ..
        } => return,
        TaskResult::KeySelected(true) => println!("\nAPI key stored."),
        TaskResult::KeySelected(false) => println!("\nNo key selected."),
        TaskResult::Generated { .. } => {}
    }
    println!("\n{}", ViewModel::from_snapshot(&session.snapshot()));
}

fn prompt_marker() {
    print!("> ");
    let _ = io::stdout().flush();
}

/// Reads stdin on a plain thread; a blocked read must not hold up runtime
/// shutdown.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}
