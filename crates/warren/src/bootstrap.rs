use crate::error::CoreError;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use warren_client::{
    ChannelOpener, CommandDispatcher, DefaultPersistentChannelFactory, ExponentialBackoff,
    RetryPolicy, SingleChannelDispatcher,
};
use warren_domain::config::ClientConfig;
use warren_event_bus::EventBus;

pub type Dispatcher<O> = SingleChannelDispatcher<DefaultPersistentChannelFactory<O>>;

/// The event bus and the command dispatcher of one client, sharing one bus.
pub struct Core<O: ChannelOpener> {
    events: EventBus,
    dispatcher: Dispatcher<O>,
    config: ClientConfig,
}

impl<O: ChannelOpener> Core<O> {
    /// Creates a new [`CoreBuilder`].
    pub fn builder() -> CoreBuilder<O> {
        CoreBuilder::new()
    }

    /// Bus receiving channel lifecycle events.
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    pub const fn dispatcher(&self) -> &Dispatcher<O> {
        &self.dispatcher
    }

    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Disposes every persistent channel. Subscriptions on the bus are left untouched.
    pub fn dispose(&self) {
        self.dispatcher.dispose();
        info!("Client core disposed");
    }
}

impl<O: ChannelOpener> fmt::Debug for Core<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Core")
            .field("events", &self.events)
            .field("dispatcher", &self.dispatcher)
            .field("config", &self.config)
            .finish()
    }
}

/// A fluent builder for [`Core`].
///
/// The opener is required. The configuration defaults to [`ClientConfig::default`], the bus
/// to a fresh [`EventBus`], and the retry policy to an [`ExponentialBackoff`] built from the
/// configuration.
#[must_use = "builders do nothing unless you call .build()"]
pub struct CoreBuilder<O> {
    opener: Option<O>,
    config: ClientConfig,
    events: Option<EventBus>,
    policy: Option<Arc<dyn RetryPolicy>>,
}

impl<O: ChannelOpener> CoreBuilder<O> {
    pub fn new() -> Self {
        Self { opener: None, config: ClientConfig::default(), events: None, policy: None }
    }

    /// Sets the opener every persistent channel opens its channel with.
    pub fn opener(mut self, opener: O) -> Self {
        self.opener = Some(opener);
        self
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Shares an existing bus, e.g. [`EventBus::global`].
    pub fn events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Overrides the retry policy derived from the configuration.
    pub fn retry_policy(mut self, policy: Arc<dyn RetryPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// # Errors
    /// [`CoreError::Validation`] if no opener was provided.
    pub fn build(self) -> Result<Core<O>, CoreError> {
        let opener = self.opener.ok_or(CoreError::Validation {
            message: "Channel opener is required".into(),
            context: None,
        })?;

        let events = self.events.unwrap_or_default();
        let policy = self
            .policy
            .unwrap_or_else(|| Arc::new(ExponentialBackoff::from(&self.config.channel.retry)));
        let factory = DefaultPersistentChannelFactory::with_policy(opener, policy).with_events(events.clone());

        debug!(retry = ?self.config.channel.retry, "Client core built");
        Ok(Core { events, dispatcher: SingleChannelDispatcher::new(factory), config: self.config })
    }
}

impl<O: ChannelOpener> Default for CoreBuilder<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> fmt::Debug for CoreBuilder<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreBuilder")
            .field("opener", &self.opener.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
