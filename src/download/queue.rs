use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// The shared piece-of-work queue.
///
/// Many workers pop from it, and push back pieces they cannot finish; the
/// scheduler fills it once at startup and closes it when the file is
/// complete. After `close`, `pop` yields `None` immediately (even if requeued
/// leftovers remain) and `push` drops its item, so straggler workers wind
/// down instead of cycling pieces nobody needs anymore.
pub(crate) struct WorkQueue<T> {
    items: Mutex<VecDeque<T>>,
    notify: Notify,
    closed: AtomicBool,
}

impl<T> WorkQueue<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Enqueues an item and wakes one waiting consumer.
    pub fn push(&self, item: T) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        self.items.lock().push_back(item);
        self.notify.notify_one();
    }

    /// Dequeues the next item, waiting if the queue is empty. Returns `None`
    /// once the queue is closed.
    pub async fn pop(&self) -> Option<T> {
        loop {
            // Register for a wakeup before checking state, so a push that
            // lands in between is not missed.
            let notified = self.notify.notified();

            if self.closed.load(Ordering::Acquire) {
                return None;
            }
            if let Some(item) = self.items.lock().pop_front() {
                return Some(item);
            }

            notified.await;
        }
    }

    /// Closes the queue and wakes every waiting consumer.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }
}
