//! Thin client over the daemon's control socket (spec §4.8's Public API
//! Port, exposed over the wire). Grounded on `fleet-wire`'s framing
//! functions and `fleet-daemon::listener`'s read-one/write-one cycle, run
//! here from the opposite end of the same Unix domain socket.

use fleet_wire::{ProtocolError, Request, Response};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::net::UnixStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not connect to the control socket at {path}: {source}")]
    Connect { path: String, source: std::io::Error },
    #[error("control socket protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("the daemon closed the connection without replying")]
    NoResponse,
}

/// Resolves the default control socket path the same way
/// `fleet-daemon::config::DaemonConfig` does, so `fleetctl` talks to the
/// socket a locally-started `fleetd` actually binds without extra flags.
pub fn default_socket_path() -> Option<PathBuf> {
    if let Ok(socket) = std::env::var("FLEET_CONTROL_SOCKET") {
        return Some(PathBuf::from(socket));
    }
    let state_dir = if let Ok(dir) = std::env::var("FLEET_STATE_DIR") {
        PathBuf::from(dir)
    } else if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        PathBuf::from(xdg).join("fleet")
    } else {
        dirs::home_dir()?.join(".local/state/fleet")
    };
    Some(state_dir.join("control.sock"))
}

pub async fn roundtrip(socket: &Path, request: Request) -> Result<Response, ClientError> {
    let mut stream = UnixStream::connect(socket)
        .await
        .map_err(|source| ClientError::Connect { path: socket.display().to_string(), source })?;
    fleet_wire::write_message(&mut stream, &request).await?;
    fleet_wire::read_message(&mut stream).await?.ok_or(ClientError::NoResponse)
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
