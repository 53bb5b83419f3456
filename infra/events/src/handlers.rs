use crate::bus::Event;
use crate::error::EventBusError;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::error;

/// Conversion of a handler's return value into a delivery outcome.
///
/// Implemented for `()` (infallible handlers) and `Result<(), E>` for any
/// displayable `E`, so both plain closures and fallible handlers can subscribe.
pub trait HandlerOutcome {
    /// Converts the handler's return value.
    ///
    /// # Errors
    /// Returns [`EventBusError::Handler`] when the handler reported a failure.
    fn into_outcome(self) -> Result<(), EventBusError>;
}

impl HandlerOutcome for () {
    #[inline]
    fn into_outcome(self) -> Result<(), EventBusError> {
        Ok(())
    }
}

impl<E: fmt::Display> HandlerOutcome for Result<(), E> {
    #[inline]
    fn into_outcome(self) -> Result<(), EventBusError> {
        self.map_err(|e| EventBusError::Handler { message: e.to_string().into(), context: None })
    }
}

type HandlerFn<T> = dyn Fn(&T) -> Result<(), EventBusError> + Send + Sync;

struct Entry<T> {
    id: u64,
    active: Arc<AtomicBool>,
    handler: Arc<HandlerFn<T>>,
}

impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self { id: self.id, active: Arc::clone(&self.active), handler: Arc::clone(&self.handler) }
    }
}

/// Type-erased view of a per-kind subscriber list.
pub(crate) trait SubscriberList: Any + Send + Sync {
    fn unsubscribe(&self, id: u64);
    fn deactivate_all(&self) -> usize;
    fn len(&self) -> usize;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Copy-on-write subscriber list for one event kind.
///
/// Mutations serialize on `mutation`, copy the current snapshot and swap a new one in.
/// Readers load the snapshot pointer atomically, so publishing never takes a lock and
/// handlers run with no lock held.
pub(crate) struct Handlers<T> {
    mutation: Mutex<()>,
    snapshot: ArcSwap<Vec<Entry<T>>>,
}

impl<T: Event> Handlers<T> {
    pub(crate) fn new() -> Self {
        Self { mutation: Mutex::new(()), snapshot: ArcSwap::from_pointee(Vec::new()) }
    }

    pub(crate) fn add<F, R>(&self, id: u64, handler: F) -> Arc<AtomicBool>
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: HandlerOutcome,
    {
        let active = Arc::new(AtomicBool::new(true));
        let entry = Entry {
            id,
            active: Arc::clone(&active),
            handler: Arc::new(move |event: &T| handler(event).into_outcome()),
        };

        let _guard = self.mutation.lock();
        let current = self.snapshot.load_full();
        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(entry);
        self.snapshot.store(Arc::new(next));

        active
    }

    fn remove(&self, id: u64) {
        let _guard = self.mutation.lock();
        let current = self.snapshot.load_full();
        if !current.iter().any(|entry| entry.id == id) {
            return;
        }
        let next: Vec<Entry<T>> = current.iter().filter(|entry| entry.id != id).cloned().collect();
        self.snapshot.store(Arc::new(next));
    }

    /// Runs every live handler of the current snapshot against `event`.
    ///
    /// Returns the number of handlers that completed without error.
    pub(crate) fn handle(&self, event: &T) -> usize {
        let snapshot = self.snapshot.load_full();
        let mut delivered = 0;

        for entry in snapshot.iter() {
            if !entry.active.load(Ordering::Acquire) {
                continue;
            }

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (entry.handler)(event)))
                .unwrap_or_else(|payload| {
                    Err(EventBusError::Panicked {
                        message: panic_message(payload.as_ref()).into(),
                        context: None,
                    })
                });

            match outcome {
                Ok(()) => delivered += 1,
                Err(err) => error!(
                    event = std::any::type_name::<T>(),
                    subscription = entry.id,
                    error = %err,
                    "Failed to handle event"
                ),
            }
        }

        delivered
    }
}

impl<T: Event> SubscriberList for Handlers<T> {
    fn unsubscribe(&self, id: u64) {
        self.remove(id);
    }

    fn deactivate_all(&self) -> usize {
        let _guard = self.mutation.lock();
        let current = self.snapshot.swap(Arc::new(Vec::new()));
        for entry in current.iter() {
            entry.active.store(false, Ordering::Release);
        }
        current.len()
    }

    fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}
