/// Settings for the threads a [`Dispatcher`](crate::Dispatcher) starts per handler invocation.
///
/// ```rust
/// use rusty_events::{Config, Dispatcher};
///
/// let dispatcher = Dispatcher::with_config(
///     Config::default().thread_prefix("orders").stack_size(256 * 1024),
/// );
/// # let _ = dispatcher;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    thread_prefix: String,
    stack_size: Option<usize>,
}

impl Config {
    pub const DEFAULT_THREAD_PREFIX: &'static str = "dispatch";

    /// Prefix for handler thread names; threads are named `"{prefix}:{event}"`, with NUL bytes
    /// written as `\0` since the OS cannot carry them in a thread name.
    pub fn thread_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_prefix = prefix.into();
        self
    }

    /// Stack size in bytes for handler threads. The platform default is used when unset.
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    #[inline]
    pub(crate) fn thread_name(&self, event: &str) -> String {
        format!("{}:{}", self.thread_prefix, event).replace('\0', "\\0")
    }

    #[inline]
    pub(crate) fn thread_stack_size(&self) -> Option<usize> {
        self.stack_size
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thread_prefix: Self::DEFAULT_THREAD_PREFIX.to_owned(),
            stack_size: None,
        }
    }
}
