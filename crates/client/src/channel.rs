use crate::command::{Channel, ChannelFault, ChannelOpener, ClientCommand};
use crate::error::ClientError;
use crate::options::ChannelOptions;
use crate::retry::RetryPolicy;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::MutexGuard;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use warren_domain::events::{ChannelFaultedEvent, ChannelOpenedEvent};
use warren_event_bus::EventBus;

/// Lifecycle of a [`PersistentChannel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelState {
    /// No underlying channel yet.
    Closed,
    Opening,
    Open,
    /// The underlying channel was lost or could not be opened; reopened on next use.
    Faulted,
    /// Terminal.
    Disposed,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Open => "open",
            Self::Faulted => "faulted",
            Self::Disposed => "disposed",
        };
        f.write_str(state)
    }
}

/// A durable wrapper over one underlying channel.
///
/// Commands run one at a time, in arrival order, against the underlying channel. A missing
/// or dead channel is (re)opened before the next command, paced by the [`RetryPolicy`].
/// A connection-level command failure discards the channel and surfaces as
/// [`ClientError::ConnectionLost`]; the command is never re-run.
pub struct PersistentChannel<O: ChannelOpener> {
    name: String,
    options: ChannelOptions,
    opener: O,
    policy: Arc<dyn RetryPolicy>,
    events: Option<EventBus>,
    /// FIFO execution turn; the holder leases the channel out of `slot`.
    gate: tokio::sync::Mutex<()>,
    /// The idle underlying channel. Never held across an await.
    slot: Mutex<Option<O::Channel>>,
    state: Mutex<ChannelState>,
    disposed: AtomicBool,
    shutdown: CancellationToken,
}

/// Exclusive use of the underlying channel for one execution turn.
///
/// Dropping the lease parks the channel back in the slot before the turn is released,
/// or closes it when the owner was disposed meanwhile.
struct Lease<'a, O: ChannelOpener> {
    owner: &'a PersistentChannel<O>,
    channel: Option<O::Channel>,
    _turn: MutexGuard<'a, ()>,
}

impl<O: ChannelOpener> Drop for Lease<'_, O> {
    fn drop(&mut self) {
        self.owner.park(self.channel.take());
    }
}

impl<O: ChannelOpener> PersistentChannel<O> {
    pub fn new(
        name: impl Into<String>,
        options: ChannelOptions,
        opener: O,
        policy: Arc<dyn RetryPolicy>,
    ) -> Self {
        Self {
            name: name.into(),
            options,
            opener,
            policy,
            events: None,
            gate: tokio::sync::Mutex::new(()),
            slot: Mutex::new(None),
            state: Mutex::new(ChannelState::Closed),
            disposed: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
        }
    }

    /// Publishes [`ChannelOpenedEvent`] and [`ChannelFaultedEvent`] on `events`.
    #[must_use]
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn options(&self) -> &ChannelOptions {
        &self.options
    }

    pub fn state(&self) -> ChannelState {
        *self.state.lock()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Opens the underlying channel now instead of on first use.
    pub async fn start(&self, cancel: &CancellationToken) -> Result<(), ClientError> {
        let mut lease = self.acquire(cancel).await?;
        self.ensure_open(&mut lease.channel, cancel).await
    }

    /// Runs `command` against the underlying channel, opening it first if needed.
    ///
    /// # Errors
    /// * [`ClientError::Disposed`] once [`dispose`](Self::dispose) has been called.
    /// * [`ClientError::Cancelled`] if `cancel` fires before the command starts.
    /// * [`ClientError::OpenFailed`] when the retry policy gives up opening the channel.
    /// * [`ClientError::ConnectionLost`] when the command hit a connection-level failure.
    /// * [`ClientError::Command`] for any other command failure.
    pub async fn execute<C>(
        &self,
        command: C,
        cancel: &CancellationToken,
    ) -> Result<C::Output, ClientError>
    where
        C: ClientCommand<O::Channel>,
    {
        let mut lease = self.acquire(cancel).await?;
        self.ensure_open(&mut lease.channel, cancel).await?;

        let Some(channel) = lease.channel.as_mut() else {
            return Err("channel slot empty after open".into());
        };

        match command.invoke(channel) {
            Ok(output) => Ok(output),
            Err(err) if err.is_connection_failure() => {
                warn!(channel = %self.name, error = %err, "Connection lost while running command");
                if let Some(lost) = lease.channel.take() {
                    lost.close();
                }
                self.fault(err.to_string());
                Err(ClientError::ConnectionLost { source: Box::new(err), context: None })
            },
            Err(err) => Err(ClientError::Command { source: Box::new(err), context: None }),
        }
    }

    /// Closes the underlying channel and fails every later call with [`ClientError::Disposed`].
    ///
    /// Pending callers are released immediately. A command already running finishes, and the
    /// channel is closed as soon as it is handed back.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        *self.state.lock() = ChannelState::Disposed;
        self.shutdown.cancel();
        if let Some(channel) = self.slot.lock().take() {
            channel.close();
        }
        debug!(channel = %self.name, "Persistent channel disposed");
    }

    /// Waits for the execution turn and leases the idle channel.
    async fn acquire(&self, cancel: &CancellationToken) -> Result<Lease<'_, O>, ClientError> {
        if self.is_disposed() {
            return Err(ClientError::disposed());
        }

        let turn = tokio::select! {
            biased;
            () = self.shutdown.cancelled() => return Err(ClientError::disposed()),
            () = cancel.cancelled() => return Err(ClientError::cancelled()),
            turn = self.gate.lock() => turn,
        };

        let lease = Lease { owner: self, channel: self.slot.lock().take(), _turn: turn };
        if self.is_disposed() {
            return Err(ClientError::disposed());
        }
        Ok(lease)
    }

    /// Hands a leased channel back, closing it if disposal happened meanwhile.
    fn park(&self, channel: Option<O::Channel>) {
        let mut slot = self.slot.lock();
        if self.is_disposed() {
            drop(slot);
            if let Some(channel) = channel {
                channel.close();
            }
            return;
        }
        *slot = channel;
    }

    async fn ensure_open(
        &self,
        slot: &mut Option<O::Channel>,
        cancel: &CancellationToken,
    ) -> Result<(), ClientError> {
        match slot.take() {
            Some(channel) if channel.is_open() => {
                *slot = Some(channel);
                return Ok(());
            },
            Some(dead) => {
                warn!(channel = %self.name, "Underlying channel found closed, reopening");
                dead.close();
                self.fault("channel closed by peer".to_owned());
            },
            None => {},
        }

        *slot = Some(self.open(cancel).await?);
        Ok(())
    }

    #[instrument(skip(self, cancel), fields(channel = %self.name))]
    async fn open(&self, cancel: &CancellationToken) -> Result<O::Channel, ClientError> {
        // A cancelled open leaves a previously lost channel faulted.
        let mut resting = match self.state() {
            ChannelState::Faulted => ChannelState::Faulted,
            _ => ChannelState::Closed,
        };
        let mut attempt: u32 = 0;

        loop {
            self.set_state(ChannelState::Opening);

            let result = tokio::select! {
                biased;
                () = self.shutdown.cancelled() => return Err(ClientError::disposed()),
                () = cancel.cancelled() => {
                    self.set_state(resting);
                    return Err(ClientError::cancelled());
                },
                result = self.opener.open(&self.options) => result,
            };

            let err = match result {
                Ok(channel) => {
                    self.set_state(ChannelState::Open);
                    info!(
                        publisher_confirms = self.options.publisher_confirms,
                        attempts = attempt + 1,
                        "Channel opened"
                    );
                    if let Some(events) = &self.events {
                        events.publish(ChannelOpenedEvent {
                            channel: self.name.clone(),
                            publisher_confirms: self.options.publisher_confirms,
                        });
                    }
                    return Ok(channel);
                },
                Err(err) => err,
            };

            attempt = attempt.saturating_add(1);
            resting = ChannelState::Faulted;
            self.set_state(ChannelState::Faulted);
            let Some(delay) = self.policy.next_delay(attempt) else {
                warn!(attempt, error = %err, "Failed to open channel, giving up");
                return Err(ClientError::OpenFailed {
                    attempts: attempt,
                    source: Box::new(err),
                    context: None,
                });
            };

            warn!(attempt, ?delay, error = %err, "Failed to open channel, retrying...");
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => return Err(ClientError::disposed()),
                () = cancel.cancelled() => return Err(ClientError::cancelled()),
                () = tokio::time::sleep(delay) => {},
            }
        }
    }

    fn fault(&self, reason: String) {
        self.set_state(ChannelState::Faulted);
        if let Some(events) = &self.events {
            events.publish(ChannelFaultedEvent { channel: self.name.clone(), reason });
        }
    }

    fn set_state(&self, next: ChannelState) {
        let mut state = self.state.lock();
        if *state != ChannelState::Disposed {
            *state = next;
        }
    }
}

impl<O: ChannelOpener> Drop for PersistentChannel<O> {
    fn drop(&mut self) {
        self.dispose();
        if let Some(channel) = self.slot.get_mut().take() {
            channel.close();
        }
    }
}

impl<O: ChannelOpener> fmt::Debug for PersistentChannel<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistentChannel")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
