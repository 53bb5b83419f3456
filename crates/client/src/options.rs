use std::borrow::Cow;
use std::fmt;

/// Dispatch key selecting one persistent channel of a dispatcher.
///
/// Two options are the same key when both the name and the confirm mode match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelDispatchOptions {
    name: Cow<'static, str>,
    publisher_confirms: bool,
}

impl ChannelDispatchOptions {
    /// Used for topology operations.
    pub const DEFAULT: Self = Self::from_static("Default", false);
    /// Used for publishing without confirmation.
    pub const PUBLISH: Self = Self::from_static("Publish", false);
    /// Used for publishing with broker confirmation.
    pub const PUBLISH_WITH_CONFIRMS: Self = Self::from_static("PublishWithConfirms", true);

    pub fn new(name: impl Into<Cow<'static, str>>, publisher_confirms: bool) -> Self {
        Self { name: name.into(), publisher_confirms }
    }

    const fn from_static(name: &'static str, publisher_confirms: bool) -> Self {
        Self { name: Cow::Borrowed(name), publisher_confirms }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn publisher_confirms(&self) -> bool {
        self.publisher_confirms
    }

    /// Options the underlying channel is opened with.
    #[must_use]
    pub const fn channel_options(&self) -> ChannelOptions {
        ChannelOptions { publisher_confirms: self.publisher_confirms }
    }
}

impl Default for ChannelDispatchOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for ChannelDispatchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Options passed to a [`ChannelOpener`](crate::ChannelOpener).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ChannelOptions {
    /// Put the channel in confirm mode after opening it.
    pub publisher_confirms: bool,
}

impl From<&ChannelDispatchOptions> for ChannelOptions {
    fn from(options: &ChannelDispatchOptions) -> Self {
        options.channel_options()
    }
}
