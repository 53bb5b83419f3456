use std::borrow::Cow;

/// Boxed error raised by a channel, its opener or a command.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A specialized [`ClientError`] enum of this crate.
#[warren_derive::warren_error]
pub enum ClientError {
    /// The persistent channel or dispatcher has been disposed.
    #[error("Client disposed{}", format_context(.context))]
    Disposed { context: Option<Cow<'static, str>> },

    /// The caller's cancellation token fired before the command ran.
    #[error("Operation cancelled{}", format_context(.context))]
    Cancelled { context: Option<Cow<'static, str>> },

    /// The retry policy gave up opening the underlying channel.
    #[error("Failed to open channel after {attempts} attempt(s){}: {source}", format_context(.context))]
    OpenFailed {
        attempts: u32,
        #[source]
        source: BoxError,
        context: Option<Cow<'static, str>>,
    },

    /// The command hit a connection-level failure. The channel was discarded and is reopened
    /// on next use; the command itself was not re-run.
    #[error("Connection lost{}: {source}", format_context(.context))]
    ConnectionLost {
        #[source]
        source: BoxError,
        context: Option<Cow<'static, str>>,
    },

    /// The command failed at the application level. The channel is still usable.
    #[error("Command failed{}: {source}", format_context(.context))]
    Command {
        #[source]
        source: BoxError,
        context: Option<Cow<'static, str>>,
    },

    /// Internal fallback for invariant violations.
    #[error("Internal client error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

impl ClientError {
    pub(crate) const fn disposed() -> Self {
        Self::Disposed { context: None }
    }

    pub(crate) const fn cancelled() -> Self {
        Self::Cancelled { context: None }
    }

    /// Returns `true` when resubmitting the same command may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionLost { .. } | Self::OpenFailed { .. })
    }

    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    #[must_use]
    pub const fn is_disposed(&self) -> bool {
        matches!(self, Self::Disposed { .. })
    }

    /// Recovers the typed error raised by the channel, its opener or the command.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::OpenFailed { source, .. }
            | Self::ConnectionLost { source, .. }
            | Self::Command { source, .. } => source.downcast_ref::<E>(),
            _ => None,
        }
    }
}
