use crate::handlers::SubscriberList;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::trace;

/// Handle to a registered event handler.
///
/// Disposing the handle (explicitly or by dropping it) removes the handler from the
/// bus. Disposal is idempotent and may happen from any thread, including from inside
/// the handler itself. Once [`Subscription::dispose`] returns, the handler is skipped by
/// every publish that has not reached it yet.
#[must_use = "dropping a Subscription unsubscribes its handler; call `detach` to keep it"]
pub struct Subscription {
    id: u64,
    kind: &'static str,
    active: Arc<AtomicBool>,
    list: Weak<dyn SubscriberList>,
    detached: bool,
}

impl Subscription {
    pub(crate) fn new(
        id: u64,
        kind: &'static str,
        active: Arc<AtomicBool>,
        list: Weak<dyn SubscriberList>,
    ) -> Self {
        Self { id, kind, active, list, detached: false }
    }

    /// Unique identifier of this subscription within its bus.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Type name of the event kind this subscription listens to.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        self.kind
    }

    /// Returns `true` until the subscription is disposed or the bus is cleared.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Removes the handler from the bus. Calling it again is a no-op.
    pub fn dispose(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(list) = self.list.upgrade() {
            list.unsubscribe(self.id);
        }
        trace!(event = self.kind, subscription = self.id, "Subscription disposed");
    }

    /// Keeps the handler registered for the lifetime of the bus.
    pub fn detach(mut self) {
        self.detached = true;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.detached {
            self.dispose();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("active", &self.is_active())
            .field("detached", &self.detached)
            .finish()
    }
}
