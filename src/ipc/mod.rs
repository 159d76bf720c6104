mod endpoint;
mod error;
#[cfg(test)]
pub mod memory;
mod message;
mod transport;
mod unix;

pub use endpoint::{Inbound, Inbox, LinkId, ReplyAddress};
pub use error::{ConnectError, ProtocolError, SendError};
pub use message::{Frame, Message, MessageKind};
pub use transport::{Channel, Connector};
pub use unix::UnixConnector;

use std::path::PathBuf;

/// Package identity of the worker process
pub const DEFAULT_PACKAGE: &str = "org.xprolog.xp";

/// Identity of the worker process a client binds to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTarget {
    /// Package the worker belongs to (e.g., "org.xprolog.xp")
    pub package: String,
    /// Named action the worker answers to (e.g., "org.xprolog.xp.RemoteService")
    pub action: String,
    /// Socket the action is served on
    pub socket: PathBuf,
}

impl ServiceTarget {
    /// Resolve a target to `<runtime dir>/<action>.sock`
    pub fn new(package: impl Into<String>, action: impl Into<String>) -> Self {
        let action = action.into();
        let socket = dirs::runtime_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(format!("{}.sock", action));

        Self {
            package: package.into(),
            action,
            socket,
        }
    }

    /// Serve the action on an explicit socket path instead
    pub fn with_socket(mut self, socket: impl Into<PathBuf>) -> Self {
        self.socket = socket.into();
        self
    }

    /// Default action name for a package
    pub fn default_action(package: &str) -> String {
        format!("{}.RemoteService", package)
    }
}

impl std::fmt::Display for ServiceTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} at {}", self.package, self.action, self.socket.display())
    }
}
