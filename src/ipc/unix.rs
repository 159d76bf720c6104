use std::future::Future;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{
    Channel, ConnectError, Connector, Frame, Inbound, LinkId, Message, ReplyAddress, SendError,
    ServiceTarget,
};

/// Binds to workers listening on a Unix domain socket
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixConnector;

impl UnixConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for UnixConnector {
    type Channel = UnixChannel;

    fn bind(
        &self,
        target: &ServiceTarget,
        link: LinkId,
        reply_to: &ReplyAddress,
    ) -> impl Future<Output = Result<UnixChannel, ConnectError>> + Send {
        let socket = target.socket.clone();
        let name = target.to_string();
        let reply_to = reply_to.clone();

        async move {
            let stream = UnixStream::connect(&socket)
                .await
                .map_err(|e| ConnectError::from_io(name, e))?;
            Ok(UnixChannel::spawn(stream, link, reply_to))
        }
    }
}

/// Newline-delimited JSON over a Unix stream.
///
/// Outbound frames are queued to a writer task so `send` never blocks.
/// A reader task decodes inbound frames in order and reports EOF as peer loss.
pub struct UnixChannel {
    outbox: mpsc::UnboundedSender<Frame>,
    reply_to: ReplyAddress,
    reader: JoinHandle<()>,
}

impl UnixChannel {
    fn spawn(stream: UnixStream, link: LinkId, reply_to: ReplyAddress) -> Self {
        let (read_half, write_half) = stream.into_split();
        let (outbox, queue) = mpsc::unbounded_channel();

        tokio::spawn(write_loop(write_half, queue, link));
        let reader = tokio::spawn(read_loop(read_half, link, reply_to.clone()));

        Self {
            outbox,
            reply_to,
            reader,
        }
    }
}

impl Channel for UnixChannel {
    fn send(&self, message: Message) -> Result<(), SendError> {
        let frame = Frame::outbound(&message, self.reply_to.token());
        self.outbox.send(frame).map_err(|_| SendError::PeerGone)
    }
}

impl Drop for UnixChannel {
    fn drop(&mut self) {
        // The writer drains what is already queued and exits on its own
        self.reader.abort();
    }
}

async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut queue: mpsc::UnboundedReceiver<Frame>,
    link: LinkId,
) {
    while let Some(frame) = queue.recv().await {
        let line = match frame.encode() {
            Ok(line) => line,
            Err(e) => {
                warn!(%link, "Dropping unencodable frame: {}", e);
                continue;
            }
        };
        if let Err(e) = writer.write_all(line.as_bytes()).await {
            warn!(%link, "Write to worker failed: {}", e);
            return;
        }
    }
    let _ = writer.shutdown().await;
}

async fn read_loop(reader: OwnedReadHalf, link: LinkId, reply_to: ReplyAddress) {
    let mut lines = BufReader::new(reader).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                match Frame::decode(&line).and_then(Frame::into_message) {
                    Ok(message) => {
                        debug!(%link, kind = ?message.kind, len = message.payload.len(), "Inbound message");
                        if !reply_to.deliver(Inbound::Message(message)) {
                            return;
                        }
                    }
                    Err(e) => warn!(%link, "Skipping inbound frame: {}", e),
                }
            }
            Ok(None) => {
                info!(%link, "Worker closed the connection");
                break;
            }
            Err(e) => {
                warn!(%link, "Read from worker failed: {}", e);
                break;
            }
        }
    }

    reply_to.deliver(Inbound::PeerLost(link));
}
