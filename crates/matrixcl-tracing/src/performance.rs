//! Performance events for device memory operations
//!
//! Allocation, release, fill and transfer events share one field layout so a
//! JSON log can be aggregated without per-call-site parsing.
//!
//! ```rust
//! use matrixcl_tracing::performance::{record_transfer, PerformanceSpan};
//!
//! let span = PerformanceSpan::new("upload", Some(100));
//! record_transfer(4096, "H2D", 250);
//! drop(span); // logged only if it took at least 100us
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;
use tracing::Level;

static ENABLED: AtomicBool = AtomicBool::new(true);
static THRESHOLD_US: AtomicU64 = AtomicU64::new(0);

/// Apply the performance settings of a [`crate::TracingConfig`].
///
/// Called by [`crate::install`]; tests may call it directly.
pub fn configure(enabled: bool, threshold_us: Option<u64>) {
    ENABLED.store(enabled, Ordering::Relaxed);
    THRESHOLD_US.store(threshold_us.unwrap_or(0), Ordering::Relaxed);
}

/// Whether performance events are currently emitted.
pub fn enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Globally configured span threshold, if any.
pub fn threshold_us() -> Option<u64> {
    match THRESHOLD_US.load(Ordering::Relaxed) {
        0 => None,
        t => Some(t),
    }
}

/// RAII guard that times an operation and logs it on drop when the
/// duration reaches the threshold.
pub struct PerformanceSpan {
    name: String,
    threshold_us: Option<u64>,
    start_time: Instant,
    span: tracing::Span,
}

impl PerformanceSpan {
    /// Create a span with an explicit threshold (`None` logs every span).
    pub fn new(name: impl Into<String>, threshold_us: Option<u64>) -> Self {
        Self::with_level(Level::DEBUG, name, threshold_us)
    }

    /// Create a span using the globally configured threshold.
    pub fn for_operation(name: impl Into<String>) -> Self {
        Self::new(name, threshold_us())
    }

    /// Create a span at a specific tracing level.
    pub fn with_level(level: Level, name: impl Into<String>, threshold_us: Option<u64>) -> Self {
        let name = name.into();
        let span = match level {
            Level::TRACE => tracing::trace_span!("perf", name = %name),
            Level::DEBUG => tracing::debug_span!("perf", name = %name),
            Level::INFO => tracing::info_span!("perf", name = %name),
            Level::WARN => tracing::warn_span!("perf", name = %name),
            _ => tracing::error_span!("perf", name = %name),
        };

        Self {
            name,
            threshold_us,
            start_time: Instant::now(),
            span,
        }
    }

    /// Operation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Microseconds since the span was created.
    pub fn elapsed_us(&self) -> u64 {
        self.start_time.elapsed().as_micros() as u64
    }

    /// Enter this span's context.
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for PerformanceSpan {
    fn drop(&mut self) {
        if !enabled() {
            return;
        }
        let elapsed_us = self.elapsed_us();
        let over_threshold = match self.threshold_us {
            Some(t) => elapsed_us >= t,
            None => true,
        };
        if over_threshold {
            let _entered = self.span.enter();
            tracing::debug!(
                duration_us = elapsed_us,
                duration_ms = elapsed_us as f64 / 1000.0,
                "performance_span_complete"
            );
        }
    }
}

/// Bandwidth in MiB/s, zero for instantaneous operations.
pub fn bandwidth_mbps(bytes: usize, duration_us: u64) -> f64 {
    if duration_us > 0 {
        (bytes as f64 / duration_us as f64) * 1_000_000.0 / (1024.0 * 1024.0)
    } else {
        0.0
    }
}

/// Record a device allocation.
pub fn record_allocation(size_bytes: usize, elements: usize, duration_us: u64) {
    if !enabled() {
        return;
    }
    tracing::debug!(
        event = "allocation",
        size_bytes = size_bytes,
        size_kb = size_bytes as f64 / 1024.0,
        elements = elements,
        duration_us = duration_us,
        "device_allocation"
    );
}

/// Record the release of a device allocation.
pub fn record_release(size_bytes: usize) {
    if !enabled() {
        return;
    }
    tracing::debug!(event = "release", size_bytes = size_bytes, "device_release");
}

/// Record a data transfer.
///
/// `direction` is `"H2D"`, `"D2H"` or `"D2D"`.
pub fn record_transfer(bytes: usize, direction: &str, duration_us: u64) {
    if !enabled() {
        return;
    }
    let bandwidth = bandwidth_mbps(bytes, duration_us);
    tracing::debug!(
        event = "transfer",
        bytes = bytes,
        kb = bytes as f64 / 1024.0,
        direction = direction,
        duration_us = duration_us,
        bandwidth_mbps = bandwidth,
        "data_transfer"
    );
}

/// Record a device-side fill.
pub fn record_fill(bytes: usize, pattern_len: usize, duration_us: u64) {
    if !enabled() {
        return;
    }
    tracing::debug!(
        event = "fill",
        bytes = bytes,
        pattern_len = pattern_len,
        duration_us = duration_us,
        "device_fill"
    );
}
