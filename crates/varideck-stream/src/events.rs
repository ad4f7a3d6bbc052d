//! Diagnostic events surfaced to whatever controls the engine.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Something a controller above the engine may want to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplexEvent {
    /// The active record buffer filled up before the previous drain finished.
    Overrun,
    /// The active play buffer ran out before the next fill finished.
    Underrun,
    /// A record buffer could not be written to storage; its audio is lost.
    WriteFailed {
        /// Resampled frames that were dropped
        frames: usize,
    },
    /// The playback source is exhausted and the last buffer has been played.
    PlaybackEnded,
}

/// Non-blocking event publisher. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<DuplexEvent>,
}

impl EventSender {
    /// Never blocks. Events are dropped when the queue is full or nobody listens.
    #[inline]
    pub fn emit(&self, event: DuplexEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

pub fn event_channel(capacity: usize) -> (EventSender, Receiver<DuplexEvent>) {
    let (tx, rx) = bounded(capacity.max(1));
    (EventSender { tx }, rx)
}
