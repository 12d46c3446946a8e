use crate::*;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Outcome of a single non-blocking delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// The peer's queue was full; this message was dropped for this peer only.
    Dropped,
    /// The peer's writer has already gone away.
    Gone,
}

/// What the writer half should do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Text(Arc<str>),
    Close,
}

/// Loop-side end of a peer's bounded outbound queue.
///
/// Frames are pre-encoded JSON shared between every recipient of a broadcast.
/// The loop never awaits on a peer: [`Outbox::deliver`] either enqueues or
/// drops. [`Outbox::close`] tells the peer's writer to tear the transport down.
#[derive(Debug, Clone)]
pub struct Outbox {
    id: ID<Outbox>,
    tx: mpsc::Sender<Arc<str>>,
    kill: Arc<Notify>,
}

/// Connection-side end of the queue.
#[derive(Debug)]
pub struct Inbox {
    rx: mpsc::Receiver<Arc<str>>,
    kill: Arc<Notify>,
}

impl Outbox {
    pub fn pair(capacity: usize) -> (Self, Inbox) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let kill = Arc::new(Notify::new());
        let outbox = Self {
            id: ID::default(),
            tx,
            kill: kill.clone(),
        };
        (outbox, Inbox { rx, kill })
    }
    pub fn id(&self) -> ID<Outbox> {
        self.id
    }
    pub fn deliver(&self, json: Arc<str>) -> Delivery {
        match self.tx.try_send(json) {
            Ok(()) => Delivery::Sent,
            Err(TrySendError::Full(_)) => Delivery::Dropped,
            Err(TrySendError::Closed(_)) => Delivery::Gone,
        }
    }
    /// Asks the peer's writer to close the transport. Idempotent.
    pub fn close(&self) {
        self.kill.notify_one();
    }
}

impl Inbox {
    /// Waits for the next frame. A close request wins over queued frames.
    pub async fn next(&mut self) -> Frame {
        tokio::select! {
            biased;
            _ = self.kill.notified() => Frame::Close,
            msg = self.rx.recv() => match msg {
                Some(json) => Frame::Text(json),
                None => Frame::Close,
            },
        }
    }
    /// Takes an already queued frame without waiting.
    pub fn try_next(&mut self) -> Option<Arc<str>> {
        self.rx.try_recv().ok()
    }
}
