//! # Domain Models
//!
//! Pure data shared by the event bus and the client: the lifecycle events published on the
//! bus and the configuration structs of the client.
//! Keep it lean: no I/O, locking, or logic beyond small helpers. The only dependency is `serde`.

pub mod config;
pub mod events;
pub mod message;
