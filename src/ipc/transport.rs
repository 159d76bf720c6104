use std::future::Future;

use super::{ConnectError, LinkId, Message, ReplyAddress, SendError, ServiceTarget};

/// An established connection to the worker
pub trait Channel: Send {
    /// Hand a message to the transport without waiting for delivery or a reply
    fn send(&self, message: Message) -> Result<(), SendError>;
}

/// Locates a worker and binds a channel to it
pub trait Connector {
    type Channel: Channel;

    /// Bind to `target`. Inbound traffic and peer loss for this `link` are
    /// delivered to `reply_to`.
    fn bind(
        &self,
        target: &ServiceTarget,
        link: LinkId,
        reply_to: &ReplyAddress,
    ) -> impl Future<Output = Result<Self::Channel, ConnectError>> + Send;
}
