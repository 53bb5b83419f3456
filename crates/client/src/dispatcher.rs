use crate::channel::PersistentChannel;
use crate::command::{ActionCommand, Channel, ChannelOpener, ClientCommand, FuncCommand};
use crate::error::ClientError;
use crate::options::ChannelDispatchOptions;
use crate::retry::{ExponentialBackoff, RetryPolicy};
use fxhash::FxHashMap;
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use warren_domain::config::PersistentChannelConfig;
use warren_event_bus::EventBus;

/// Routes commands to persistent channels selected by [`ChannelDispatchOptions`].
pub trait CommandDispatcher<C: Channel>: Send + Sync {
    fn invoke<Cmd>(
        &self,
        command: Cmd,
        options: &ChannelDispatchOptions,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Cmd::Output, ClientError>> + Send
    where
        Cmd: ClientCommand<C>;

    /// Disposes every channel. Later calls fail with [`ClientError::Disposed`].
    fn dispose(&self);
}

/// Closure shapes of [`CommandDispatcher::invoke`].
pub trait CommandDispatcherExt<C: Channel>: CommandDispatcher<C> {
    /// Runs `action` for its side effect.
    fn invoke_action<A>(
        &self,
        action: A,
        options: &ChannelDispatchOptions,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), ClientError>> + Send
    where
        A: FnOnce(&mut C) -> Result<(), C::Error> + Send,
    {
        self.invoke(ActionCommand::new(action), options, cancel)
    }

    /// Runs `func` and returns its value.
    fn invoke_func<F, T>(
        &self,
        func: F,
        options: &ChannelDispatchOptions,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<T, ClientError>> + Send
    where
        F: FnOnce(&mut C) -> Result<T, C::Error> + Send,
        T: Send,
    {
        self.invoke(FuncCommand::new(func), options, cancel)
    }

    /// Runs `func` on the [`ChannelDispatchOptions::DEFAULT`] channel.
    fn invoke_default<F, T>(
        &self,
        func: F,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<T, ClientError>> + Send
    where
        F: FnOnce(&mut C) -> Result<T, C::Error> + Send,
        T: Send,
    {
        async move { self.invoke_func(func, &ChannelDispatchOptions::DEFAULT, cancel).await }
    }
}

impl<C: Channel, D: CommandDispatcher<C> + ?Sized> CommandDispatcherExt<C> for D {}

/// Builds the persistent channel behind one dispatch key.
pub trait PersistentChannelFactory: Send + Sync + 'static {
    type Opener: ChannelOpener;

    fn create(&self, options: &ChannelDispatchOptions) -> PersistentChannel<Self::Opener>;
}

/// Creates channels sharing one opener, one retry policy and, optionally, one event bus.
pub struct DefaultPersistentChannelFactory<O> {
    opener: Arc<O>,
    policy: Arc<dyn RetryPolicy>,
    events: Option<EventBus>,
}

impl<O: ChannelOpener> DefaultPersistentChannelFactory<O> {
    pub fn new(opener: O, config: &PersistentChannelConfig) -> Self {
        Self::with_policy(opener, Arc::new(ExponentialBackoff::from(&config.retry)))
    }

    pub fn with_policy(opener: O, policy: Arc<dyn RetryPolicy>) -> Self {
        Self { opener: Arc::new(opener), policy, events: None }
    }

    #[must_use]
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }
}

impl<O: ChannelOpener> PersistentChannelFactory for DefaultPersistentChannelFactory<O> {
    type Opener = Arc<O>;

    fn create(&self, options: &ChannelDispatchOptions) -> PersistentChannel<Arc<O>> {
        let channel = PersistentChannel::new(
            options.name(),
            options.channel_options(),
            Arc::clone(&self.opener),
            Arc::clone(&self.policy),
        );
        match &self.events {
            Some(events) => channel.with_events(events.clone()),
            None => channel,
        }
    }
}

impl<O> fmt::Debug for DefaultPersistentChannelFactory<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultPersistentChannelFactory")
            .field("events", &self.events.is_some())
            .finish_non_exhaustive()
    }
}

type Channels<O> = FxHashMap<ChannelDispatchOptions, Arc<PersistentChannel<O>>>;

struct Registry<O: ChannelOpener> {
    channels: Channels<O>,
    disposed: bool,
}

/// Dispatcher keeping exactly one persistent channel per dispatch key.
///
/// Channels are created lazily, on the first command for their key. Lookup and creation
/// happen under one lock, so concurrent first uses of a key share a single channel and
/// the factory runs once per key.
pub struct SingleChannelDispatcher<F: PersistentChannelFactory> {
    factory: F,
    registry: Mutex<Registry<F::Opener>>,
}

impl<F: PersistentChannelFactory> SingleChannelDispatcher<F> {
    pub fn new(factory: F) -> Self {
        Self { factory, registry: Mutex::new(Registry { channels: Channels::default(), disposed: false }) }
    }

    /// Number of persistent channels created so far.
    pub fn channel_count(&self) -> usize {
        self.registry.lock().channels.len()
    }

    pub fn is_disposed(&self) -> bool {
        self.registry.lock().disposed
    }

    fn channel_for(
        &self,
        options: &ChannelDispatchOptions,
    ) -> Result<Arc<PersistentChannel<F::Opener>>, ClientError> {
        let mut registry = self.registry.lock();
        if registry.disposed {
            return Err(ClientError::disposed());
        }
        if let Some(channel) = registry.channels.get(options) {
            return Ok(Arc::clone(channel));
        }

        let channel = Arc::new(self.factory.create(options));
        registry.channels.insert(options.clone(), Arc::clone(&channel));
        debug!(channel = %options, confirms = options.publisher_confirms(), "Persistent channel created");
        Ok(channel)
    }

    fn dispose_channels(&self) {
        let drained: Vec<_> = {
            let mut registry = self.registry.lock();
            if registry.disposed {
                return;
            }
            registry.disposed = true;
            registry.channels.drain().map(|(_, channel)| channel).collect()
        };

        for channel in &drained {
            channel.dispose();
        }
        debug!(channels = drained.len(), "Dispatcher disposed");
    }
}

impl<F> CommandDispatcher<<F::Opener as ChannelOpener>::Channel> for SingleChannelDispatcher<F>
where
    F: PersistentChannelFactory,
{
    async fn invoke<Cmd>(
        &self,
        command: Cmd,
        options: &ChannelDispatchOptions,
        cancel: &CancellationToken,
    ) -> Result<Cmd::Output, ClientError>
    where
        Cmd: ClientCommand<<F::Opener as ChannelOpener>::Channel>,
    {
        let channel = self.channel_for(options)?;
        channel.execute(command, cancel).await
    }

    fn dispose(&self) {
        self.dispose_channels();
    }
}

impl<F: PersistentChannelFactory> Drop for SingleChannelDispatcher<F> {
    fn drop(&mut self) {
        self.dispose_channels();
    }
}

impl<F: PersistentChannelFactory> fmt::Debug for SingleChannelDispatcher<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.lock();
        let mut keys: Vec<&str> = registry.channels.keys().map(ChannelDispatchOptions::name).collect();
        keys.sort_unstable();
        f.debug_struct("SingleChannelDispatcher")
            .field("channels", &keys)
            .field("disposed", &registry.disposed)
            .finish()
    }
}
