use tracing::{debug, info, warn};

use crate::ipc::{Channel, ConnectError, Connector, LinkId, Message, ReplyAddress, ServiceTarget};

/// Binding state of the connection to the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Unbound,
    Binding,
    Bound,
}

/// Owns the channel to the worker and its bind/unbind lifecycle
pub struct ConnectionManager<C: Connector> {
    connector: C,
    target: ServiceTarget,
    state: LinkState,
    link: LinkId,
    channel: Option<C::Channel>,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C, target: ServiceTarget) -> Self {
        Self {
            connector,
            target,
            state: LinkState::Unbound,
            link: LinkId::default(),
            channel: None,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_bound(&self) -> bool {
        self.state == LinkState::Bound
    }

    /// Bind to the worker. A no-op while already bound.
    pub async fn connect(&mut self, reply_to: &ReplyAddress) -> Result<(), ConnectError> {
        if self.state != LinkState::Unbound {
            debug!(state = ?self.state, "Connect requested while not unbound");
            return Ok(());
        }

        let link = self.link.next();
        self.state = LinkState::Binding;
        info!(worker = %self.target, %link, "Binding to worker");

        match self.connector.bind(&self.target, link, reply_to).await {
            Ok(channel) => {
                self.link = link;
                self.channel = Some(channel);
                self.state = LinkState::Bound;
                info!(%link, "Bound to worker");
                Ok(())
            }
            Err(e) => {
                self.state = LinkState::Unbound;
                Err(e)
            }
        }
    }

    /// Release the channel. Returns whether anything was bound.
    pub fn disconnect(&mut self) -> bool {
        if self.state != LinkState::Bound {
            return false;
        }
        self.channel = None;
        self.state = LinkState::Unbound;
        info!(link = %self.link, "Unbound from worker");
        true
    }

    /// The worker behind `link` died. Stale links are ignored.
    pub fn on_peer_lost(&mut self, link: LinkId) {
        if link != self.link || self.state != LinkState::Bound {
            debug!(%link, current = %self.link, "Ignoring peer loss for stale link");
            return;
        }
        warn!(%link, "Worker terminated unexpectedly");
        self.channel = None;
        self.state = LinkState::Unbound;
    }

    /// Send if bound. A failed send unbinds; nothing is retried.
    pub fn send(&mut self, message: Message) -> bool {
        let Some(channel) = self.channel.as_ref().filter(|_| self.is_bound()) else {
            debug!(kind = ?message.kind, "Dropping message while unbound");
            return false;
        };

        debug!(kind = ?message.kind, len = message.payload.len(), "Outbound message");
        match channel.send(message) {
            Ok(()) => true,
            Err(e) => {
                warn!(link = %self.link, "Send failed: {}", e);
                self.channel = None;
                self.state = LinkState::Unbound;
                false
            }
        }
    }
}
