/// Configuration for attaching to and operating a [`RingBuffer`](crate::RingBuffer).
///
/// This has no bearing on the buffer's capacity — that is fixed forever at
/// `create()` time and lives in the on-disk header. `RingConfig` only tunes
/// how *this* attachment behaves.
#[derive(Debug, Clone, Copy)]
pub struct RingConfig {
    /// Enable lightweight operation counters (see [`crate::Metrics`]).
    pub enable_metrics: bool,
    /// Reject attaching to a file whose size exceeds what `nb_words` implies.
    ///
    /// The on-disk format has no way to express "trailing garbage is fine",
    /// so by default any size mismatch is a [`crate::RingError::CorruptHeader`].
    /// Setting this to `false` is only useful for read-only inspection tools
    /// that tolerate a file grown by some other means.
    pub strict_size_check: bool,
}

impl RingConfig {
    /// Creates a new configuration.
    pub const fn new(enable_metrics: bool, strict_size_check: bool) -> Self {
        Self {
            enable_metrics,
            strict_size_check,
        }
    }

    /// Enables metrics collection, returning `self` for chaining.
    #[must_use]
    pub const fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    /// Sets whether attach enforces an exact file-size match, returning `self` for chaining.
    #[must_use]
    pub const fn with_strict_size_check(mut self, strict: bool) -> Self {
        self.strict_size_check = strict;
        self
    }
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            enable_metrics: false,
            strict_size_check: true,
        }
    }
}
