//! # Client Command Dispatch
//!
//! Turns a fragile, non-thread-safe broker channel into a durable command execution facility.
//!
//! ## Key Features
//! - **One channel per key**: [`SingleChannelDispatcher`] lazily creates exactly one
//!   [`PersistentChannel`] per [`ChannelDispatchOptions`], even under concurrent first use.
//! - **Serialized execution**: commands against one channel never overlap and run in arrival order.
//! - **Transparent recovery**: lost channels are reopened on next use, paced by a [`RetryPolicy`].
//! - **Cancellation**: every wait honours a [`CancellationToken`].
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use warren_client::prelude::*;
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("broker error")]
//! struct BrokerError;
//!
//! impl ChannelFault for BrokerError {
//!     fn is_connection_failure(&self) -> bool {
//!         false
//!     }
//! }
//!
//! struct Model {
//!     published: Vec<String>,
//! }
//!
//! impl Channel for Model {
//!     type Error = BrokerError;
//!
//!     fn is_open(&self) -> bool {
//!         true
//!     }
//!
//!     fn close(self) {}
//! }
//!
//! struct Connection;
//!
//! impl ChannelOpener for Connection {
//!     type Channel = Model;
//!
//!     async fn open(&self, _options: &ChannelOptions) -> Result<Model, BrokerError> {
//!         Ok(Model { published: Vec::new() })
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ClientError> {
//!     let factory = DefaultPersistentChannelFactory::new(Connection, &Default::default());
//!     let dispatcher = SingleChannelDispatcher::new(factory);
//!     let cancel = CancellationToken::new();
//!
//!     let count = dispatcher
//!         .invoke_func(
//!             |model: &mut Model| {
//!                 model.published.push("hello".to_owned());
//!                 Ok(model.published.len())
//!             },
//!             &ChannelDispatchOptions::PUBLISH,
//!             &cancel,
//!         )
//!         .await?;
//!
//!     assert_eq!(count, 1);
//!     assert_eq!(dispatcher.channel_count(), 1);
//!     Ok(())
//! }
//! ```

mod channel;
mod command;
mod dispatcher;
mod error;
mod options;
mod retry;

pub use channel::{ChannelState, PersistentChannel};
pub use command::{ActionCommand, Channel, ChannelFault, ChannelOpener, ClientCommand, FuncCommand};
pub use dispatcher::{
    CommandDispatcher, CommandDispatcherExt, DefaultPersistentChannelFactory,
    PersistentChannelFactory, SingleChannelDispatcher,
};
pub use error::{BoxError, ClientError, ClientErrorExt, Result};
pub use options::{ChannelDispatchOptions, ChannelOptions};
pub use retry::{ExponentialBackoff, RetryPolicy};
pub use tokio_util::sync::CancellationToken;

pub mod prelude {
    pub use crate::{
        ActionCommand, CancellationToken, Channel, ChannelDispatchOptions, ChannelFault,
        ChannelOpener, ChannelOptions, ChannelState, ClientCommand, ClientError, CommandDispatcher,
        CommandDispatcherExt, DefaultPersistentChannelFactory, ExponentialBackoff, FuncCommand,
        PersistentChannel, PersistentChannelFactory, RetryPolicy, SingleChannelDispatcher,
    };
}
