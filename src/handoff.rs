use tokio::sync::{Mutex, mpsc};

/// Single-slot exchange point between the acceptor and the worker that
/// will own a freshly accepted socket.
///
/// `publish` suspends while a previously published item is still
/// unclaimed, so at most one item is ever in flight. `claim` takes the
/// receiver lock and drains exactly one item. Together they guarantee a
/// worker never observes a socket meant for another worker.
pub struct Handoff<T> {
    tx: mpsc::Sender<T>,
    rx: Mutex<mpsc::Receiver<T>>,
}

impl<T> Handoff<T> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(1);

        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }

    /// Park the item in the slot. Waits until the slot is free.
    pub async fn publish(&self, item: T) {
        if self.tx.send(item).await.is_err() {
            // The receiver lives inside this struct, so the channel can
            // only close once the Handoff itself is gone.
            unreachable!("handoff receiver dropped while handoff is alive");
        }
    }

    /// Take one item out of the slot. Waits until one is published.
    pub async fn claim(&self) -> Option<T> {
        self.rx.lock().await.recv().await
    }
}

impl<T> Default for Handoff<T> {
    fn default() -> Self {
        Self::new()
    }
}
