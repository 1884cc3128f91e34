//! Asynchronous messaging channel between client and worker.
//!
//! The transport is fire-and-forget: sends never fail, they are dropped with
//! a log line when the far side is gone. Delivery is FIFO per sender. Every
//! client connection owns a private reply channel that travels with each
//! envelope, so worker responses are unicast to exactly the requester rather
//! than matched back by sender identity.
//!
//! Envelopes cross the channel as raw JSON values and are decoded at the
//! receiving boundary; envelopes that do not decode into a known [`Message`]
//! are logged and skipped.

use serde_json::Value;
use tokio::sync::mpsc;

use crate::protocol::Message;

/// One message in flight to the worker, carrying the sender's reply channel.
#[derive(Debug)]
pub struct Envelope {
    pub body: Value,
    pub reply_to: ReplySender,
}

/// Worker-to-client unicast sender.
#[derive(Debug, Clone)]
pub struct ReplySender {
    tx: mpsc::UnboundedSender<Value>,
}

impl ReplySender {
    /// Send a message to the owning client. Dropped with a warning if the
    /// client port has been closed.
    pub fn send(&self, message: &Message) {
        if self.tx.send(message.encode()).is_err() {
            tracing::warn!("client port closed, response dropped");
        }
    }
}

/// Cloneable address of the worker's inbox. This is what the host hands to
/// clients once the worker has activated.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl WorkerHandle {
    /// Open a client connection with its own private reply channel.
    pub fn connect(&self) -> ClientPort {
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        ClientPort { worker: self.clone(), reply: ReplySender { tx: reply_tx }, inbox: reply_rx }
    }
}

/// The worker's receiving end.
#[derive(Debug)]
pub struct WorkerPort {
    rx: mpsc::UnboundedReceiver<Envelope>,
}

impl WorkerPort {
    /// Receive the next decodable message along with its reply channel.
    ///
    /// Returns `None` once every client handle has been dropped.
    pub async fn recv(&mut self) -> Option<(Message, ReplySender)> {
        loop {
            let envelope = self.rx.recv().await?;
            match Message::decode(&envelope.body) {
                Ok(message) => return Some((message, envelope.reply_to)),
                Err(err) => {
                    tracing::warn!(action = Message::action_of(&envelope.body), %err, "ignoring unrecognized message");
                }
            }
        }
    }
}

/// A client's connection to the worker.
#[derive(Debug)]
pub struct ClientPort {
    worker: WorkerHandle,
    reply: ReplySender,
    inbox: mpsc::UnboundedReceiver<Value>,
}

impl ClientPort {
    /// Send a message to the worker. Dropped with a warning if the worker is
    /// no longer receiving.
    pub fn send(&self, message: &Message) {
        let envelope = Envelope { body: message.encode(), reply_to: self.reply.clone() };
        if self.worker.tx.send(envelope).is_err() {
            tracing::warn!("worker unavailable, message dropped");
        }
    }

    /// Receive the next decodable message from the worker.
    ///
    /// Returns `None` once the worker side is gone.
    pub async fn recv(&mut self) -> Option<Message> {
        loop {
            let body = self.inbox.recv().await?;
            match Message::decode(&body) {
                Ok(message) => return Some(message),
                Err(err) => {
                    tracing::warn!(action = Message::action_of(&body), %err, "ignoring unrecognized message");
                }
            }
        }
    }
}

/// Create the worker inbox and the handle clients connect through.
pub fn worker_channel() -> (WorkerHandle, WorkerPort) {
    let (tx, rx) = mpsc::unbounded_channel();
    (WorkerHandle { tx }, WorkerPort { rx })
}
