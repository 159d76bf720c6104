use std::io;
use thiserror::Error;

/// Failure to bind to the worker
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The platform refused the binding
    #[error("binding to {target} was denied")]
    Denied {
        target: String,
        #[source]
        source: io::Error,
    },
    /// Nothing is serving the target
    #[error("worker {target} is not available")]
    Unavailable {
        target: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to bind {target}")]
    Io {
        target: String,
        #[source]
        source: io::Error,
    },
}

impl ConnectError {
    /// Classify an I/O failure raised while binding `target`
    pub fn from_io(target: impl Into<String>, source: io::Error) -> Self {
        let target = target.into();
        match source.kind() {
            io::ErrorKind::PermissionDenied => ConnectError::Denied { target, source },
            io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused => {
                ConnectError::Unavailable { target, source }
            }
            _ => ConnectError::Io { target, source },
        }
    }
}

/// Failure to hand a message to the channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("worker process is gone")]
    PeerGone,
}

/// A frame that could not be decoded
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown message kind {0}")]
    UnknownKind(u32),
    #[error("frame has no {0} argument")]
    MissingArgument(&'static str),
}
