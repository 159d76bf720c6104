use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::Message;

static NEXT_ADDRESS: AtomicU64 = AtomicU64::new(0);

/// Identifies one successful bind; a fresh one is issued per connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LinkId(u64);

impl LinkId {
    pub fn next(self) -> Self {
        LinkId(self.0 + 1)
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link#{}", self.0)
    }
}

/// Something the worker side delivered to this client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Message(Message),
    /// The connection identified by the link terminated unexpectedly
    PeerLost(LinkId),
}

/// Receiving end of a reply address, drained on the UI thread
pub type Inbox = mpsc::UnboundedReceiver<Inbound>;

/// Endpoint the worker replies to.
///
/// One is opened per session and handed to every transport by reference.
/// Only transports look at the token, when writing it into outbound frames.
#[derive(Clone)]
pub struct ReplyAddress {
    token: Arc<str>,
    tx: mpsc::UnboundedSender<Inbound>,
}

impl ReplyAddress {
    pub fn open() -> (Self, Inbox) {
        let (tx, rx) = mpsc::unbounded_channel();
        let seq = NEXT_ADDRESS.fetch_add(1, Ordering::Relaxed);
        let token = format!("{}-{}", std::process::id(), seq);

        (
            Self {
                token: token.into(),
                tx,
            },
            rx,
        )
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Deliver to the inbox; false once the session has gone away
    pub fn deliver(&self, inbound: Inbound) -> bool {
        self.tx.send(inbound).is_ok()
    }
}

impl fmt::Debug for ReplyAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplyAddress")
            .field("token", &self.token)
            .finish()
    }
}
