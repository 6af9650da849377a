// Adapted from: https://github.com/tokio-rs/mini-redis/blob/e186482ca00f8d884ddcbe20417f3654d03315a4/src/shutdown.rs

use std::future::pending;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::{Acquire, Release};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::broadcast::{Sender, channel};

/// Listens for a request to abandon in-flight work.
///
/// Cancellation is signalled using a `broadcast::Receiver`. Only a single value
/// is ever sent. Once a value has been sent via the broadcast channel, the
/// work should stop without producing a result.
///
/// The `Cancellation` struct listens for the signal and tracks that the signal
/// has been received. If every sender is dropped without sending, the work is
/// never cancelled.
#[derive(Debug)]
pub struct Cancellation {
    /// `true` if the cancellation signal has been received
    is_cancelled: Arc<AtomicBool>,

    /// The receive half of the channel used to listen for cancellation.
    notify: broadcast::Receiver<()>,
}

impl Cancellation {
    /// Create a new `Cancellation` and a sender for it.
    pub fn new() -> (Sender<()>, Cancellation) {
        let (sender, notify) = channel(1);
        (
            sender,
            Cancellation {
                is_cancelled: Arc::new(false.into()),
                notify,
            },
        )
    }

    /// A `Cancellation` that can never fire.
    pub fn never() -> Cancellation {
        Cancellation::new().1
    }

    /// Returns `true` if the cancellation signal has been received. Never blocks.
    pub fn is_cancelled(&mut self) -> bool {
        if self.is_cancelled.load(Acquire) {
            return true;
        }
        match self.notify.try_recv() {
            Ok(()) | Err(TryRecvError::Lagged(_)) => {
                self.is_cancelled.store(true, Release);
                true
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => false,
        }
    }

    /// Receive the cancellation notice, waiting if necessary. Never completes
    /// if all senders were dropped without sending.
    pub async fn cancelled(&mut self) {
        // If the signal has already been received, then return immediately.
        if self.is_cancelled.load(Acquire) {
            return;
        }

        match self.notify.recv().await {
            Ok(()) | Err(RecvError::Lagged(_)) => self.is_cancelled.store(true, Release),
            Err(RecvError::Closed) => pending().await,
        }
    }
}

impl Clone for Cancellation {
    /// All clones will receive the cancellation from the same sender.
    fn clone(&self) -> Self {
        Cancellation {
            is_cancelled: self.is_cancelled.clone(),
            notify: self.notify.resubscribe(),
        }
    }
}
