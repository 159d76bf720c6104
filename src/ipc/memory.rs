//! In-process worker stand-in for tests.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{
    Channel, ConnectError, Connector, Inbound, LinkId, Message, MessageKind, ReplyAddress,
    SendError, ServiceTarget,
};

#[derive(Debug, Default)]
struct WorkerState {
    deny: bool,
    alive: bool,
    binds: usize,
    link: LinkId,
    sent: Vec<Message>,
    reply_to: Option<ReplyAddress>,
}

/// Handle on the fake worker, shared with the connector and its channels
#[derive(Debug, Clone, Default)]
pub struct MemoryWorker {
    state: Arc<Mutex<WorkerState>>,
}

impl MemoryWorker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, WorkerState> {
        self.state.lock().unwrap()
    }

    pub fn connector(&self) -> MemoryConnector {
        MemoryConnector {
            worker: self.clone(),
        }
    }

    /// Refuse subsequent binds with a permission error
    pub fn deny(&self) {
        self.lock().deny = true;
    }

    /// Make the worker unreachable without telling the client
    pub fn kill(&self) {
        self.lock().alive = false;
    }

    pub fn binds(&self) -> usize {
        self.lock().binds
    }

    /// Messages the client sent so far
    pub fn sent(&self) -> Vec<Message> {
        self.lock().sent.clone()
    }

    pub fn sent_kinds(&self) -> Vec<MessageKind> {
        self.lock().sent.iter().map(|m| m.kind).collect()
    }

    pub fn clear_sent(&self) {
        self.lock().sent.clear();
    }

    /// Reply through the address the client bound with
    pub fn reply(&self, kind: MessageKind, payload: impl Into<Vec<u8>>) {
        let reply_to = self.lock().reply_to.clone();
        if let Some(reply_to) = reply_to {
            reply_to.deliver(Inbound::Message(Message::new(kind, payload)));
        }
    }

    /// Crash the worker and report peer loss for the current link
    pub fn crash(&self) {
        let (reply_to, link) = {
            let mut state = self.lock();
            state.alive = false;
            (state.reply_to.clone(), state.link)
        };
        if let Some(reply_to) = reply_to {
            reply_to.deliver(Inbound::PeerLost(link));
        }
    }
}

pub struct MemoryConnector {
    worker: MemoryWorker,
}

impl Connector for MemoryConnector {
    type Channel = MemoryChannel;

    fn bind(
        &self,
        _target: &ServiceTarget,
        link: LinkId,
        reply_to: &ReplyAddress,
    ) -> impl Future<Output = Result<MemoryChannel, ConnectError>> + Send {
        let worker = self.worker.clone();
        let reply_to = reply_to.clone();

        async move {
            let mut state = worker.lock();
            state.binds += 1;
            if state.deny {
                return Err(ConnectError::from_io(
                    "memory",
                    std::io::Error::from(std::io::ErrorKind::PermissionDenied),
                ));
            }
            state.alive = true;
            state.link = link;
            state.reply_to = Some(reply_to);
            drop(state);

            Ok(MemoryChannel {
                worker: worker.clone(),
            })
        }
    }
}

pub struct MemoryChannel {
    worker: MemoryWorker,
}

impl Channel for MemoryChannel {
    fn send(&self, message: Message) -> Result<(), SendError> {
        let mut state = self.worker.lock();
        if !state.alive {
            return Err(SendError::PeerGone);
        }
        state.sent.push(message);
        Ok(())
    }
}
