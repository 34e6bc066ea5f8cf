//! InvalidationBus - debounced fan-out notifications
//!
//! `notify()` never calls subscribers directly. It (re)arms a deadline one
//! window in the future; a processor thread waits for the deadline and then
//! invokes every subscriber once, in subscription order, on that thread.
//! Any number of `notify()` calls inside one window collapse into one
//! delivery (trailing edge).

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Opaque subscription handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type Callback = Arc<dyn Fn() + Send + Sync>;

struct BusState {
    subscribers: BTreeMap<SubscriptionId, Callback>,
    next_id: u64,
    deadline: Option<Instant>,
    deliveries: u64,
    running: bool,
}

struct Shared {
    topic: String,
    window: Duration,
    state: Mutex<BusState>,
    wake: Condvar,
}

pub struct InvalidationBus {
    shared: Arc<Shared>,
    processor_thread: Option<thread::JoinHandle<()>>,
}

impl InvalidationBus {
    /// Create a bus for `topic` coalescing notifications within `window`
    pub fn new(topic: impl Into<String>, window: Duration) -> Self {
        let shared = Arc::new(Shared {
            topic: topic.into(),
            window,
            state: Mutex::new(BusState {
                subscribers: BTreeMap::new(),
                next_id: 0,
                deadline: None,
                deliveries: 0,
                running: true,
            }),
            wake: Condvar::new(),
        });

        let worker = Arc::clone(&shared);
        let processor_thread = thread::Builder::new()
            .name(format!("bus-{}", shared.topic))
            .spawn(move || worker.run())
            .map_err(|e| tracing::error!("cannot start bus processor: {}", e))
            .ok();

        Self {
            shared,
            processor_thread,
        }
    }

    pub fn topic(&self) -> &str {
        &self.shared.topic
    }

    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        let mut state = self.shared.state.lock();
        let id = SubscriptionId(state.next_id);
        state.next_id += 1;
        state.subscribers.insert(id, Arc::new(callback));
        id
    }

    /// Remove a subscription; returns whether it was still registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.state.lock().subscribers.remove(&id).is_some()
    }

    /// Schedule a delivery one window from now, replacing any pending one
    pub fn notify(&self) {
        let mut state = self.shared.state.lock();
        state.deadline = Some(Instant::now() + self.shared.window);
        drop(state);
        self.shared.wake.notify_one();
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.state.lock().subscribers.len()
    }

    /// Number of completed deliveries so far
    pub fn deliveries(&self) -> u64 {
        self.shared.state.lock().deliveries
    }

    pub fn is_pending(&self) -> bool {
        self.shared.state.lock().deadline.is_some()
    }
}

impl Shared {
    fn run(&self) {
        let mut state = self.state.lock();
        while state.running {
            let deadline = state.deadline;
            match deadline {
                None => self.wake.wait(&mut state),
                Some(deadline) if Instant::now() < deadline => {
                    self.wake.wait_until(&mut state, deadline);
                }
                Some(_) => {
                    state.deadline = None;
                    self.deliver(&mut state);
                }
            }
        }
    }

    fn deliver(&self, state: &mut MutexGuard<'_, BusState>) {
        let callbacks: Vec<Callback> = state.subscribers.values().cloned().collect();
        tracing::trace!("bus '{}' delivering to {} subscribers", self.topic, callbacks.len());
        // Subscribers may call back into the bus
        MutexGuard::unlocked(state, || {
            for callback in &callbacks {
                callback();
            }
        });
        state.deliveries += 1;
    }
}

impl Drop for InvalidationBus {
    fn drop(&mut self) {
        self.shared.state.lock().running = false;
        self.shared.wake.notify_all();
        if let Some(handle) = self.processor_thread.take() {
            if handle.join().is_err() {
                tracing::error!("bus '{}' processor panicked", self.shared.topic);
            }
        }
    }
}

impl std::fmt::Debug for InvalidationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvalidationBus")
            .field("topic", &self.shared.topic)
            .field("window", &self.shared.window)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
