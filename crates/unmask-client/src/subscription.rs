//! Message delivery to subscribers.
//!
//! A subscription is either [`Delivery::Live`] (a remote live query that
//! re-delivers the full ordered message list on every change until
//! unsubscribed) or [`Delivery::Snapshot`] (one synchronous delivery of the
//! local list, nothing afterwards). Callers must handle both.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use unmask_remote::Watch;
use unmask_shared::Message;

use crate::backend::{decode_messages, LocalEntityStore};

/// Receives the complete, timestamp-ordered message list of a topic.
pub type MessageCallback = Box<dyn FnMut(Vec<Message>) + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Pushed again on every remote change.
    Live,
    /// Delivered once, synchronously, at subscription time.
    Snapshot,
}

/// State shared between a live handle and its forwarding task.
struct Slot {
    cancelled: AtomicBool,
    // Held for the whole of each delivery.
    callback: Mutex<Option<MessageCallback>>,
    // Thread currently inside the callback, if any.
    delivering_on: Mutex<Option<ThreadId>>,
}

impl Slot {
    fn new(callback: MessageCallback) -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            callback: Mutex::new(Some(callback)),
            delivering_on: Mutex::new(None),
        }
    }

    fn callback(&self) -> MutexGuard<'_, Option<MessageCallback>> {
        self.callback.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn delivering_on(&self) -> MutexGuard<'_, Option<ThreadId>> {
        self.delivering_on
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Mark the subscription over and drop the callback.
    ///
    /// From another thread this waits for an in-flight delivery to finish.
    /// From inside the callback it only sets the flag; the running delivery
    /// drops the callback once it returns.
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if *self.delivering_on() == Some(thread::current().id()) {
            return;
        }
        self.callback().take();
    }

    /// Invoke the callback unless cancelled. Returns false when the
    /// subscription is over (cancelled or the callback panicked).
    fn deliver(&self, messages: Vec<Message>) -> bool {
        let mut guard = self.callback();
        if self.is_cancelled() {
            guard.take();
            return false;
        }
        let Some(callback) = guard.as_mut() else {
            return false;
        };

        *self.delivering_on() = Some(thread::current().id());
        let completed = invoke(callback, messages);
        *self.delivering_on() = None;

        if !completed || self.is_cancelled() {
            guard.take();
            self.cancelled.store(true, Ordering::SeqCst);
            return false;
        }
        true
    }
}

/// Run the callback, containing a panic. Returns whether it completed.
fn invoke(callback: &mut MessageCallback, messages: Vec<Message>) -> bool {
    if catch_unwind(AssertUnwindSafe(|| callback(messages))).is_err() {
        error!("message callback panicked, ending subscription");
        return false;
    }
    true
}

/// Handle returned by
/// [`DataService::subscribe_messages`](crate::DataService::subscribe_messages).
///
/// Dropping the handle does not end a live subscription; call
/// [`unsubscribe`](Self::unsubscribe).
#[must_use = "a live subscription keeps delivering until unsubscribed"]
pub struct Subscription {
    delivery: Delivery,
    slot: Option<Arc<Slot>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// A subscription whose only delivery already happened. A panic in the
    /// callback is contained and logged, as in live mode.
    pub(crate) fn snapshot(local: &LocalEntityStore, topic_id: &str, mut callback: MessageCallback) -> Self {
        invoke(&mut callback, local.message_snapshot(topic_id));
        Self {
            delivery: Delivery::Snapshot,
            slot: None,
            task: None,
        }
    }

    /// Forward `watch` to `callback` on the current runtime until
    /// unsubscribed or the watch ends. A watch error triggers one delivery
    /// of the local snapshot and ends the subscription.
    pub(crate) fn live(
        runtime: &tokio::runtime::Handle,
        watch: Watch,
        local: Arc<LocalEntityStore>,
        topic_id: String,
        callback: MessageCallback,
    ) -> Self {
        let slot = Arc::new(Slot::new(callback));
        let task = runtime.spawn(forward(watch, local, topic_id, slot.clone()));
        Self {
            delivery: Delivery::Live,
            slot: Some(slot),
            task: Some(task),
        }
    }

    pub fn delivery(&self) -> Delivery {
        self.delivery
    }

    /// Whether further deliveries can still happen.
    pub fn is_active(&self) -> bool {
        match self.slot {
            Some(ref slot) => !slot.is_cancelled(),
            None => false,
        }
    }

    /// Stop delivery. Once this returns the callback is never invoked
    /// again. It may be called from inside the callback itself. Calling it
    /// more than once, or on a snapshot, does nothing.
    pub fn unsubscribe(&self) {
        if let Some(ref slot) = self.slot {
            slot.cancel();
        }
        if let Some(ref task) = self.task {
            task.abort();
        }
    }
}

async fn forward(mut watch: Watch, local: Arc<LocalEntityStore>, topic_id: String, slot: Arc<Slot>) {
    while let Some(item) = watch.recv().await {
        let result = item.and_then(|docs| decode_messages(&docs));
        match result {
            Ok(messages) => {
                if !slot.deliver(messages) {
                    break;
                }
            }
            Err(e) => {
                warn!(topic_id = %topic_id, error = %e, "live message feed failed, delivering local snapshot");
                slot.deliver(local.message_snapshot(&topic_id));
                break;
            }
        }
    }

    debug!(topic_id = %topic_id, "message subscription ended");
    slot.cancelled.store(true, Ordering::SeqCst);
    slot.callback().take();
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use unmask_shared::defaults::default_user;

    use super::*;

    fn counting_slot() -> (Arc<Slot>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let slot = Arc::new(Slot::new(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })));
        (slot, calls)
    }

    #[test]
    fn cancelled_slot_never_delivers() {
        let (slot, calls) = counting_slot();
        assert!(slot.deliver(Vec::new()));
        slot.cancel();
        slot.cancel();
        assert!(!slot.deliver(Vec::new()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancel_from_inside_callback_returns() {
        let holder: Arc<Mutex<Option<Arc<Slot>>>> = Arc::new(Mutex::new(None));
        let inner = holder.clone();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let slot = Arc::new(Slot::new(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            let own = inner.lock().unwrap().clone();
            if let Some(own) = own {
                own.cancel();
            }
        })));
        *holder.lock().unwrap() = Some(slot.clone());

        assert!(!slot.deliver(vec![Message::compose(&default_user(), "hi", 1)]));
        assert!(slot.is_cancelled());
        assert!(slot.callback().is_none());
        assert!(!slot.deliver(Vec::new()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn snapshot_contains_callback_panic() {
        let local = LocalEntityStore::new(unmask_store::Database::open_in_memory().unwrap());
        let sub = Subscription::snapshot(&local, "t", Box::new(|_| panic!("render failed")));
        assert_eq!(sub.delivery(), Delivery::Snapshot);
        assert!(!sub.is_active());
    }
}
