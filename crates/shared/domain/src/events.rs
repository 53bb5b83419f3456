//! Lifecycle events published on the event bus.
//!
//! Every event is an immutable value record. Publishers build one, hand it to the bus, and
//! the bus drops it once all handlers have returned.

use crate::message::{ConsumerId, MessageProperties, MessageReceivedInfo, Queue};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Outcome of handling a delivered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckResult {
    /// The handler succeeded and the message was acknowledged.
    Ack,
    /// The message was rejected.
    Nack,
    /// The handler failed.
    Exception,
}

/// Raised after a consumed message has been acknowledged, rejected or failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckEvent {
    pub received_info: MessageReceivedInfo,
    pub properties: MessageProperties,
    pub body: Arc<[u8]>,
    pub result: AckResult,
}

impl AckEvent {
    pub fn new(
        received_info: MessageReceivedInfo,
        properties: MessageProperties,
        body: impl Into<Arc<[u8]>>,
        result: AckResult,
    ) -> Self {
        Self { received_info, properties, body: body.into(), result }
    }
}

/// Raised when a consumer cannot start consuming from its queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartConsumingFailedEvent {
    pub consumer: ConsumerId,
    pub queue: Queue,
}

/// Raised once a consumer has started consuming from its queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartConsumingSucceededEvent {
    pub consumer: ConsumerId,
    pub queue: Queue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConnectedEvent {
    pub endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDisconnectedEvent {
    pub endpoint: String,
    pub reason: String,
}

/// The broker stopped accepting publishes on the connection (resource alarm).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionBlockedEvent {
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionUnblockedEvent;

/// Raised by a persistent channel each time its underlying channel is (re)opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelOpenedEvent {
    pub channel: String,
    pub publisher_confirms: bool,
}

/// Raised by a persistent channel when its underlying channel is lost and discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelFaultedEvent {
    pub channel: String,
    pub reason: String,
}
