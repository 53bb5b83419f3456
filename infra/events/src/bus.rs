use crate::handlers::{HandlerOutcome, Handlers, SubscriberList};
use crate::subscription::Subscription;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::trace;

static GLOBAL: OnceLock<EventBus> = OnceLock::new();

/// Marker trait for types that can be sent across the [`EventBus`].
///
/// Any type that is `Send + Sync + 'static` automatically implements this trait.
pub trait Event: Any + Send + Sync + 'static {}
impl<T: Any + Send + Sync + 'static> Event for T {}

struct Registered {
    kind: &'static str,
    list: Arc<dyn SubscriberList>,
}

impl Registered {
    fn new<T: Event>() -> Self {
        trace!(event = std::any::type_name::<T>(), "Initializing new subscriber list");
        Self { kind: std::any::type_name::<T>(), list: Arc::new(Handlers::<T>::new()) }
    }

    fn downcast<T: Event>(&self) -> Option<Arc<Handlers<T>>> {
        Arc::clone(&self.list).into_any().downcast::<Handlers<T>>().ok()
    }
}

#[derive(Default)]
struct BusInner {
    lists: RwLock<FxHashMap<TypeId, Registered>>,
    next_id: AtomicU64,
}

/// A thread-safe, synchronous Event Bus.
///
/// Keeps one copy-on-write subscriber list per event type, indexed by the [`TypeId`]
/// of the event. Kinds are independent: publishing `A` never reaches subscribers of `B`.
/// Cloning the bus yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    /// Creates a new, empty `EventBus`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide bus, creating it on first use.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(Self::new)
    }

    /// Registers `handler` for events of type `T`.
    ///
    /// The handler may return `()` or `Result<(), E>` for any displayable `E`.
    /// Errors and panics are logged and never reach the publisher.
    ///
    /// # Examples
    /// ```rust
    /// use warren_event_bus::EventBus;
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicU64, Ordering};
    ///
    /// struct Tick(u64);
    ///
    /// let bus = EventBus::new();
    /// let total = Arc::new(AtomicU64::new(0));
    /// let sink = Arc::clone(&total);
    /// let subscription = bus.subscribe(move |tick: &Tick| {
    ///     sink.fetch_add(tick.0, Ordering::Relaxed);
    /// });
    ///
    /// bus.publish(Tick(3));
    /// subscription.dispose();
    /// bus.publish(Tick(4));
    /// assert_eq!(total.load(Ordering::Relaxed), 3);
    /// ```
    pub fn subscribe<T, F, R>(&self, handler: F) -> Subscription
    where
        T: Event,
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: HandlerOutcome,
    {
        let handlers = self.ensure_handlers::<T>();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let active = handlers.add(id, handler);

        trace!(event = std::any::type_name::<T>(), subscription = id, "Handler subscribed");

        let list: Arc<dyn SubscriberList> = handlers;
        Subscription::new(id, std::any::type_name::<T>(), active, Arc::downgrade(&list))
    }

    /// Publishes an event, dropping it once every handler has returned.
    ///
    /// Returns the number of handlers that processed the event successfully.
    ///
    /// # Examples
    /// ```rust
    /// use warren_event_bus::EventBus;
    ///
    /// struct Ping;
    ///
    /// let bus = EventBus::new();
    /// assert_eq!(bus.publish(Ping), 0, "no subscribers, nothing delivered");
    /// ```
    #[allow(clippy::needless_pass_by_value)]
    pub fn publish<T: Event>(&self, event: T) -> usize {
        self.publish_ref(&event)
    }

    /// Publishes a borrowed event; handlers observe the exact same instance.
    pub fn publish_ref<T: Event>(&self, event: &T) -> usize {
        let Some(handlers) = self.handlers::<T>() else {
            trace!(event = std::any::type_name::<T>(), "Event dropped: no subscribers");
            return 0;
        };

        let delivered = handlers.handle(event);
        trace!(event = std::any::type_name::<T>(), delivered, "Event dispatched");
        delivered
    }

    /// Number of live handlers currently subscribed to `T`.
    #[must_use]
    pub fn subscriber_count<T: Event>(&self) -> usize {
        self.handlers::<T>().map_or(0, |handlers| handlers.len())
    }

    /// Number of event kinds that have (or had) subscribers.
    #[must_use]
    pub fn kinds(&self) -> usize {
        self.inner.lists.read().len()
    }

    /// Drops every subscriber list and deactivates their subscriptions.
    ///
    /// Returns the number of event kinds that were removed.
    pub fn clear(&self) -> usize {
        let drained: Vec<Registered> = {
            let mut lists = self.inner.lists.write();
            lists.drain().map(|(_, registered)| registered).collect()
        };

        for registered in &drained {
            let removed = registered.list.deactivate_all();
            trace!(event = registered.kind, removed, "Subscriber list cleared");
        }
        drained.len()
    }

    fn handlers<T: Event>(&self) -> Option<Arc<Handlers<T>>> {
        let lists = self.inner.lists.read();
        lists.get(&TypeId::of::<T>()).and_then(Registered::downcast::<T>)
    }

    fn ensure_handlers<T: Event>(&self) -> Arc<Handlers<T>> {
        if let Some(handlers) = self.handlers::<T>() {
            return handlers;
        }

        let mut lists = self.inner.lists.write();
        let slot = lists.entry(TypeId::of::<T>()).or_insert_with(Registered::new::<T>);
        slot.downcast::<T>().unwrap_or_else(|| {
            let handlers = Arc::new(Handlers::<T>::new());
            *slot = Registered { kind: std::any::type_name::<T>(), list: handlers.clone() };
            handlers
        })
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lists = self.inner.lists.read();
        let mut kinds: Vec<(&str, usize)> =
            lists.values().map(|registered| (registered.kind, registered.list.len())).collect();
        kinds.sort_unstable();
        f.debug_struct("EventBus").field("kinds", &kinds).finish()
    }
}
