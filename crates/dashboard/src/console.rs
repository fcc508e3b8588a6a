use std::{fmt, str::FromStr, sync::Arc};

use common::models::Direction;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::{
    errors::MutationError, runtime::DashboardRuntime, services::MutationCoordinator, view,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Show,
    Select(String),
    Create,
    /// Trader-scoped commands; `None` means the selected trader.
    Delete(Option<String>),
    Start(Option<String>),
    Stop(Option<String>),
    Trade(Direction, Option<String>),
    Rebalance(Option<String>),
    Refresh,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCommandError(String);

impl fmt::Display for ParseCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ParseCommandError {}

const NO_ARGUMENTS: &[&str] = &[
    "list", "ls", "show", "create", "new", "refresh", "help", "?", "quit", "exit", "q",
];

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(ParseCommandError("empty command".to_string()));
        };
        let target = words.next().map(str::to_string);
        if words.next().is_some() {
            return Err(ParseCommandError(format!("too many arguments for `{}`", verb)));
        }

        let command = match (verb.to_ascii_lowercase().as_str(), target) {
            ("list" | "ls", None) => Self::List,
            ("show", None) => Self::Show,
            ("select", Some(id)) => Self::Select(id),
            ("select", None) => {
                return Err(ParseCommandError("usage: select <trader_id>".to_string()));
            }
            ("create" | "new", None) => Self::Create,
            ("delete" | "rm", target) => Self::Delete(target),
            ("start", target) => Self::Start(target),
            ("stop", target) => Self::Stop(target),
            ("long", target) => Self::Trade(Direction::Long, target),
            ("short", target) => Self::Trade(Direction::Short, target),
            ("rebalance", target) => Self::Rebalance(target),
            ("refresh", None) => Self::Refresh,
            ("help" | "?", None) => Self::Help,
            ("quit" | "exit" | "q", None) => Self::Quit,
            (other, Some(_)) if NO_ARGUMENTS.contains(&other) => {
                return Err(ParseCommandError(format!("`{}` takes no arguments", verb)));
            }
            _ => return Err(ParseCommandError(format!("unknown command `{}`", verb))),
        };
        Ok(command)
    }
}

const HELP: &str = "\
commands:
  list                 overview of all traders
  show                 detail and analytics for the selected trader
  select <id>          focus a trader
  create               create a new trader and select it
  delete [id]          delete a trader
  start [id]           start a trader
  stop [id]            stop a trader
  long [id]            open a manual LONG trade
  short [id]           open a manual SHORT trade
  rebalance [id]       force a signal rebalance
  refresh              refresh the trader list now
  quit                 exit";

/// Reads commands from stdin until `quit` or end of input.
pub async fn run(runtime: DashboardRuntime) -> anyhow::Result<()> {
    let mut lines = BufReader::new(io::stdin()).lines();
    println!("{}", HELP);

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{} (type `help`)", e);
                continue;
            }
        };
        debug!("Console command {:?}", command);

        if command == Command::Quit {
            break;
        }
        execute(&runtime, command).await;
    }
    Ok(())
}

fn resolve(runtime: &DashboardRuntime, target: Option<String>) -> Option<String> {
    let resolved = target.or_else(|| runtime.state().selection.current());
    if resolved.is_none() {
        println!("No trader selected.");
    }
    resolved
}

/// Mutations run in the background so the prompt stays responsive while they are in flight.
fn spawn_mutation<F, Fut>(mutations: &Arc<MutationCoordinator>, action: F)
where
    F: FnOnce(Arc<MutationCoordinator>) -> Fut,
    Fut: Future<Output = Result<String, MutationError>> + Send + 'static,
{
    let task = action(mutations.clone());
    tokio::spawn(async move {
        match task.await {
            Ok(done) => println!("{}", done),
            Err(e) => {
                warn!("Console {} action failed: {}", e.operation(), e);
                println!("{}", e.user_message());
            }
        }
    });
}

pub async fn execute(runtime: &DashboardRuntime, command: Command) {
    let mutations = runtime.mutations();

    match command {
        Command::List => print!("{}", view::render_overview(&runtime.state().snapshot().await)),
        Command::Show => print!("{}", view::render_detail(&runtime.state().snapshot().await)),
        Command::Select(id) => match runtime.state().select(&id).await {
            Ok(()) => println!("Selected {}", id),
            Err(e) => println!("{}", e),
        },
        Command::Create => spawn_mutation(mutations, |m| async move {
            m.create().await.map(|id| format!("Created trader {}", id))
        }),
        Command::Delete(target) => {
            if let Some(id) = resolve(runtime, target) {
                spawn_mutation(mutations, |m| async move {
                    m.delete(&id).await.map(|_| format!("Deleted trader {}", id))
                });
            }
        }
        Command::Start(target) => {
            if let Some(id) = resolve(runtime, target) {
                spawn_mutation(mutations, |m| async move {
                    m.start(&id).await.map(|_| format!("Started trader {}", id))
                });
            }
        }
        Command::Stop(target) => {
            if let Some(id) = resolve(runtime, target) {
                spawn_mutation(mutations, |m| async move {
                    m.stop(&id).await.map(|_| format!("Stopped trader {}", id))
                });
            }
        }
        Command::Trade(direction, target) => {
            if let Some(id) = resolve(runtime, target) {
                spawn_mutation(mutations, move |m| async move {
                    m.manual_trade(&id, direction).await.map(|ack| {
                        format!(
                            "{} trade opened for {} at {}",
                            direction,
                            id,
                            ack.entry_price
                                .map(|p| format!("{:.6}", p))
                                .unwrap_or_else(|| "market".to_string())
                        )
                    })
                });
            }
        }
        Command::Rebalance(target) => {
            if let Some(id) = resolve(runtime, target) {
                spawn_mutation(mutations, |m| async move {
                    m.rebalance(&id)
                        .await
                        .map(|ack| format!("Signals for {} rebalanced: {}", id, ack.balance))
                });
            }
        }
        Command::Refresh => {
            let sync = runtime.sync().clone();
            tokio::spawn(async move {
                sync.run_cycle().await;
            });
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
}
