//! `fleetctl`: a thin client over `fleetd`'s control socket (spec §4.8).

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod color;
mod commands;
mod exit_error;
mod output;

use clap::{Parser, Subcommand};
use commands::agents::AgentsCommand;
use commands::exec::ExecCommand;
use commands::workflows::WorkflowsCommand;
use exit_error::ExitError;
use output::OutputFormat;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "fleetctl", version, about = "Query and drive the fleet controller", styles = color::styles())]
struct Cli {
    /// Control socket path. Defaults to `$FLEET_CONTROL_SOCKET`, then
    /// `<state dir>/control.sock` (same resolution `fleetd` uses).
    #[arg(long, global = true)]
    socket: Option<PathBuf>,

    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Inspect registered agents.
    Agents {
        #[command(subcommand)]
        cmd: AgentsCommand,
    },
    /// Inspect and manage accepted workflows.
    Workflows {
        #[command(subcommand)]
        cmd: WorkflowsCommand,
    },
    /// Run a module on an agent.
    Exec(ExecCommand),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let socket = match cli.socket.or_else(client::default_socket_path) {
        Some(socket) => socket,
        None => {
            eprintln!("error: could not determine a control socket path; pass --socket or set FLEET_CONTROL_SOCKET");
            return ExitCode::from(2);
        }
    };

    let result = match cli.command {
        Command::Agents { cmd } => commands::agents::run(cmd, &socket, cli.format).await,
        Command::Workflows { cmd } => commands::workflows::run(cmd, &socket, cli.format).await,
        Command::Exec(cmd) => commands::exec::run(cmd, &socket).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(ExitError { code, message }) => {
            eprintln!("error: {message}");
            ExitCode::from(code as u8)
        }
    }
}
