//! The seams between the client and the broker.
//!
//! A [`ChannelOpener`] produces [`Channel`]s; a [`ClientCommand`] runs against one. Commands are
//! synchronous, consumed on invocation, and statically dispatched.

use crate::options::ChannelOptions;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Classification of errors raised by a channel.
pub trait ChannelFault: std::error::Error + Send + Sync + 'static {
    /// `true` when the channel or its connection is gone and must be reopened.
    fn is_connection_failure(&self) -> bool;
}

/// An underlying, non-thread-safe broker channel.
pub trait Channel: Send + 'static {
    type Error: ChannelFault;

    /// `false` once the broker or the connection closed the channel.
    fn is_open(&self) -> bool;

    fn close(self);
}

/// Opens underlying channels, typically on a shared connection.
pub trait ChannelOpener: Send + Sync + 'static {
    type Channel: Channel;

    fn open(
        &self,
        options: &ChannelOptions,
    ) -> impl Future<Output = Result<Self::Channel, <Self::Channel as Channel>::Error>> + Send;
}

impl<O: ChannelOpener> ChannelOpener for Arc<O> {
    type Channel = O::Channel;

    fn open(
        &self,
        options: &ChannelOptions,
    ) -> impl Future<Output = Result<Self::Channel, <Self::Channel as Channel>::Error>> + Send {
        (**self).open(options)
    }
}

/// One unit of work run against a channel.
pub trait ClientCommand<C: Channel>: Send {
    type Output: Send;

    fn invoke(self, channel: &mut C) -> Result<Self::Output, C::Error>;
}

/// A command run for its side effect only.
#[derive(Debug, Clone, Copy)]
pub struct ActionCommand<F> {
    action: F,
}

impl<F> ActionCommand<F> {
    pub const fn new(action: F) -> Self {
        Self { action }
    }
}

impl<C, F> ClientCommand<C> for ActionCommand<F>
where
    C: Channel,
    F: FnOnce(&mut C) -> Result<(), C::Error> + Send,
{
    type Output = ();

    fn invoke(self, channel: &mut C) -> Result<(), C::Error> {
        (self.action)(channel)
    }
}

/// A command producing a value.
pub struct FuncCommand<F, T> {
    func: F,
    _output: PhantomData<fn() -> T>,
}

impl<F, T> FuncCommand<F, T> {
    pub const fn new(func: F) -> Self {
        Self { func, _output: PhantomData }
    }
}

impl<F, T> std::fmt::Debug for FuncCommand<F, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FuncCommand").field("output", &std::any::type_name::<T>()).finish()
    }
}

impl<C, F, T> ClientCommand<C> for FuncCommand<F, T>
where
    C: Channel,
    F: FnOnce(&mut C) -> Result<T, C::Error> + Send,
    T: Send,
{
    type Output = T;

    fn invoke(self, channel: &mut C) -> Result<T, C::Error> {
        (self.func)(channel)
    }
}
