//! Typed commands.
//!
//! One command per line. Blank lines are ignored; `help` is answered
//! locally and never reaches the engine.

use std::io::BufRead;

use openanimal_client::{Command, FeedSort};
use openanimal_types::AnimalId;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::WatchError;

/// Shown for `help`.
pub const HELP: &str = "\
commands:
  refresh | r            poll now
  select <id> | s <id>   show an animal's detail and timeline
  clear                  deselect
  sort new|top|shuffle   reorder the feed
  birth | b              birth a new animal
  signin                 show the sign-in prompt
  signin <credential>    sign in with a provider credential
  signout                sign out
  quit | q               exit";

/// What a typed line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Forward to the engine.
    Engine(Command),
    /// Print [`HELP`].
    Help,
}

/// Parse one line. `Ok(None)` for a blank line.
pub fn parse_line(line: &str) -> Result<Option<Input>, WatchError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();

    let command = match (verb.to_ascii_lowercase().as_str(), arg) {
        ("help" | "?", _) => return Ok(Some(Input::Help)),
        ("refresh" | "r", _) => Command::Refresh,
        ("select" | "s", Some(id)) => Command::Select(AnimalId::from(id)),
        ("select" | "s", None) => return Err(WatchError::Usage("select <animal id>")),
        ("clear", _) => Command::ClearSelection,
        ("sort", Some(mode)) => Command::SetSort(
            FeedSort::parse(mode).ok_or(WatchError::Usage("sort new|top|shuffle"))?,
        ),
        ("sort", None) => return Err(WatchError::Usage("sort new|top|shuffle")),
        ("birth" | "b", _) => Command::Birth,
        ("signin", None) => Command::OpenSignIn,
        ("signin", Some(credential)) => Command::SignIn(credential.to_owned()),
        ("signout", _) => Command::SignOut,
        ("quit" | "q" | "exit", _) => Command::Shutdown,
        _ => return Err(WatchError::UnknownCommand(verb.to_owned())),
    };
    Ok(Some(Input::Engine(command)))
}

/// Forward typed commands from `input` until it ends, a shutdown is sent,
/// or the engine goes away.
///
/// Blocking: call it on a dedicated thread, never on the runtime. A stdin
/// read cannot be cancelled, and a runtime worker stuck in one holds up
/// shutdown until the next line arrives.
pub fn forward_lines<R: BufRead>(input: R, tx: &mpsc::Sender<Command>) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "failed to read stdin");
                return;
            }
        };
        match parse_line(&line) {
            Ok(Some(Input::Engine(command))) => {
                let shutdown = command == Command::Shutdown;
                if tx.blocking_send(command).is_err() || shutdown {
                    return;
                }
            }
            Ok(Some(Input::Help)) => println!("{HELP}"),
            Ok(None) => {}
            Err(e) => eprintln!("{e}"),
        }
    }
    debug!("stdin closed, polling continues until interrupted");
}
