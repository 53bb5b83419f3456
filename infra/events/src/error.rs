use std::borrow::Cow;

/// Failures raised by event handlers.
///
/// These never reach the publisher: the bus logs them and moves on to the next handler.
#[warren_derive::warren_error]
pub enum EventBusError {
    /// A handler returned an error.
    #[error("Handler failed{}: {message}", format_context(.context))]
    Handler { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A handler panicked while processing an event.
    #[error("Handler panicked{}: {message}", format_context(.context))]
    Panicked { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
