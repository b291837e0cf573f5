//! Cross-thread action queue
//!
//! The store itself is single-threaded. Code running on other threads (worker
//! pools, blocking I/O, a terminal input reader) cannot call `dispatch`
//! directly; it sends actions through an [`ActionSender`] instead. They are
//! applied on the store's own thread, in the order they were sent, when the
//! host calls [`Store::drain_pending`](crate::Store::drain_pending).

use crate::action::Action;
use std::cell::RefCell;
use std::fmt;
use tokio::sync::mpsc;

/// Sends actions to a store owned by another thread
///
/// `Send + Sync` whenever the payload is `Send`.
pub struct ActionSender<P> {
    tx: mpsc::UnboundedSender<Action<P>>,
}

impl<P> ActionSender<P> {
    pub fn new(tx: mpsc::UnboundedSender<Action<P>>) -> Self {
        Self { tx }
    }

    /// Queue an action for the store's thread
    ///
    /// If the store has been dropped the action is discarded and an error is
    /// logged.
    pub fn send(&self, action: Action<P>) {
        if let Err(e) = self.tx.send(action) {
            log::error!(
                "ActionSender: store is gone, dropping action {}",
                e.0.action_type
            );
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl<P> Clone for ActionSender<P> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<P> fmt::Debug for ActionSender<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSender")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

/// Receiving end kept by the store
pub(crate) struct ActionQueue<P> {
    tx: mpsc::UnboundedSender<Action<P>>,
    rx: RefCell<mpsc::UnboundedReceiver<Action<P>>>,
}

impl<P> ActionQueue<P> {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: RefCell::new(rx),
        }
    }

    pub(crate) fn sender(&self) -> ActionSender<P> {
        ActionSender::new(self.tx.clone())
    }

    /// Next queued action, if one is waiting
    pub(crate) fn try_next(&self) -> Option<Action<P>> {
        self.rx.borrow_mut().try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_feeds_queue_in_order() {
        let queue = ActionQueue::new();
        let sender = queue.sender();

        sender.send(Action::new("A", 1));
        sender.clone().send(Action::new("B", 2));

        assert_eq!(queue.try_next(), Some(Action::new("A", 1)));
        assert_eq!(queue.try_next(), Some(Action::new("B", 2)));
        assert_eq!(queue.try_next(), None);
    }

    #[test]
    fn test_sender_works_from_another_thread() {
        let queue = ActionQueue::new();
        let sender = queue.sender();

        std::thread::spawn(move || sender.send(Action::new("REMOTE", "hi".to_string())))
            .join()
            .unwrap();

        assert_eq!(queue.try_next().map(|a| a.payload), Some("hi".to_string()));
    }

    #[test]
    fn test_send_after_queue_dropped_is_logged_not_panicking() {
        let queue = ActionQueue::<u8>::new();
        let sender = queue.sender();
        drop(queue);

        assert!(sender.is_closed());
        sender.send(Action::new("LATE", 0));
    }
}
