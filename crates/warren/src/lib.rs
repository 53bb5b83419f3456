//! Facade crate for the broker client core.
//! Re-exports the event bus, the domain models and the client, and wires them together.
//! Keep this crate thin: it should compose other crates, not implement behaviour.
//!
//! ## Usage
//! - Implement [`client::ChannelOpener`] for your connection.
//! - Build a [`Core`] with [`Core::builder`] and submit commands through [`Core::dispatcher`].
//! - Subscribe to lifecycle events on [`Core::events`].

mod bootstrap;
mod error;

pub use bootstrap::{Core, CoreBuilder, Dispatcher};
pub use error::{CoreError, CoreErrorExt};
pub use warren_client as client;
pub use warren_domain as domain;
pub use warren_event_bus as events;

pub mod prelude {
    pub use crate::{Core, CoreBuilder, CoreError};
    pub use warren_client::prelude::*;
    pub use warren_domain::config::ClientConfig;
    pub use warren_domain::events::*;
    pub use warren_event_bus::{EventBus, Subscription};
}
