//! Operator console: one command per stdin line, quoted arguments allowed.
//!
//! ```text
//! add "Garage Pi" 192.168.1.50 10000
//! edit 192.168.1.50
//! save "Garage Pi" 192.168.1.51 10000
//! view 192.168.1.51 history
//! ```

use crate::dashboard::Command;
use crate::view::SubView;
use std::io::{self, BufRead, BufReader};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub const HELP: &str = "commands: add <name> <ip> <port> | edit <ip> | save <name> <ip> <port> | cancel | \
rm <ip> | view <ip> overview|history | layout | refresh | list | dismiss | quit";

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("unbalanced quotes: {0}")]
    Parse(#[from] shell_words::ParseError),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("unknown command {0:?}")]
    Unknown(String),
}

/// Ligne vide -> Ok(None)
pub fn parse_command(line: &str) -> Result<Option<Command>, ConsoleError> {
    let words = shell_words::split(line)?;
    let Some((verb, args)) = words.split_first() else {
        return Ok(None);
    };

    let command = match (verb.as_str(), args) {
        ("add", [name, address, port]) => Command::Add {
            name: name.clone(),
            address: address.clone(),
            port: port.clone(),
        },
        ("add", _) => return Err(ConsoleError::Usage("add <name> <ip> <port>")),
        ("edit", [address]) => Command::Edit { address: address.clone() },
        ("edit", _) => return Err(ConsoleError::Usage("edit <ip>")),
        ("save", [name, address, port]) => Command::Save {
            name: name.clone(),
            address: address.clone(),
            port: port.clone(),
        },
        ("save", _) => return Err(ConsoleError::Usage("save <name> <ip> <port>")),
        ("cancel", []) => Command::Cancel,
        ("rm" | "delete", [address]) => Command::Remove { address: address.clone() },
        ("rm" | "delete", _) => return Err(ConsoleError::Usage("rm <ip>")),
        ("view", [address, subview]) => match SubView::parse(subview) {
            Some(subview) => Command::View { address: address.clone(), subview },
            None => return Err(ConsoleError::Usage("view <ip> overview|history")),
        },
        ("view", _) => return Err(ConsoleError::Usage("view <ip> overview|history")),
        ("layout", []) => Command::Layout,
        ("refresh", []) => Command::Refresh,
        ("list", []) => Command::List,
        ("dismiss", []) => Command::Dismiss,
        ("quit" | "exit", []) => Command::Quit,
        (other, _) => return Err(ConsoleError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

/// Lit stdin ligne par ligne sur un thread dédié et pousse les commandes vers le
/// tableau de bord. EOF ferme le canal, ce qui arrête la boucle principale.
/// Le thread n'appartient pas au runtime : son arrêt n'attend pas la prochaine ligne.
pub fn spawn_stdin_reader(commands: mpsc::Sender<Command>) -> io::Result<JoinHandle<()>> {
    spawn_line_reader(BufReader::new(io::stdin()), commands)
}

pub fn spawn_line_reader<R>(input: R, commands: mpsc::Sender<Command>) -> io::Result<JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("pifan-console".to_string())
        .spawn(move || read_commands(input, &commands))
}

fn read_commands<R: BufRead>(input: R, commands: &mpsc::Sender<Command>) {
    for line in input.lines() {
        match line {
            Ok(line) => match parse_command(&line) {
                Ok(Some(command)) => {
                    if commands.blocking_send(command).is_err() {
                        debug!("Dashboard gone, console reader stopping");
                        return;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("{} ({})", e, HELP),
            },
            Err(e) => {
                warn!("Failed to read stdin: {}", e);
                return;
            }
        }
    }
    debug!("stdin closed");
}
