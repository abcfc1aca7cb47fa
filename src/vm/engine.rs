//! Doorbell channel from the VM to the consensus engine.

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{self, Receiver, Sender};

/// Token sent to the consensus engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineMessage {
    /// Pending work exists; the engine should ask the VM to build a block.
    PendingBlocks,
}

/// Write side of the engine doorbell.
///
/// The channel has capacity 1 and is level-triggered: a token means "pending
/// work exists", not "one unit of work arrived". Sends never block; a full
/// channel coalesces with the pending token and a closed channel (engine
/// shut down) is a no-op. The mempool length is the source of truth.
#[derive(Clone, Debug)]
pub struct EngineNotifier {
    tx: Sender<EngineMessage>,
}

impl EngineNotifier {
    /// Creates the doorbell, returning the VM's write side and the engine's
    /// receive side.
    pub fn channel() -> (EngineNotifier, Receiver<EngineMessage>) {
        let (tx, rx) = mpsc::channel(1);
        (EngineNotifier { tx }, rx)
    }

    /// Rings the doorbell.
    pub fn notify(&self) {
        match self.tx.try_send(EngineMessage::PendingBlocks) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::error::TryRecvError;

    #[test]
    fn rapid_notifies_coalesce_into_one_token() {
        let (notifier, mut rx) = EngineNotifier::channel();
        for _ in 0..10 {
            notifier.notify();
        }

        assert_eq!(rx.try_recv(), Ok(EngineMessage::PendingBlocks));
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn notify_after_drain_delivers_again() {
        let (notifier, mut rx) = EngineNotifier::channel();
        notifier.notify();
        assert_eq!(rx.try_recv(), Ok(EngineMessage::PendingBlocks));

        notifier.notify();
        assert_eq!(rx.try_recv(), Ok(EngineMessage::PendingBlocks));
    }

    #[test]
    fn notify_on_closed_channel_is_a_noop() {
        let (notifier, rx) = EngineNotifier::channel();
        drop(rx);
        notifier.notify();
        notifier.notify();
    }
}
