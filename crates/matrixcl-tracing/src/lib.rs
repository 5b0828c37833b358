//! Logging setup shared by the matrixcl crates.
//!
//! Library code only emits `tracing` events. Whoever owns the process
//! (a benchmark, an integration test, an application) installs the
//! subscriber once through [`install`], or [`install_for_tests`] when
//! several tests race to do it.
//!
//! ```rust
//! use matrixcl_tracing::{install, Profile, TracingConfig};
//!
//! let config = TracingConfig::for_profile(Profile::Ci).with_directives("matrixcl_core=debug");
//! let _ = install(&config); // fails harmlessly if a subscriber is already set
//! ```

pub mod performance;

use std::env;
use std::str::FromStr;
use std::sync::OnceLock;

use thiserror::Error;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

pub use tracing::{debug, error, info, trace, warn};

/// Environment variable selecting a [`Profile`].
pub const PROFILE_ENV: &str = "MATRIXCL_LOG_PROFILE";
/// Environment variable overriding filter directives.
pub const DIRECTIVES_ENV: &str = "MATRIXCL_LOG";
/// Environment variable selecting a [`LogFormat`].
pub const FORMAT_ENV: &str = "MATRIXCL_LOG_FORMAT";
/// Environment variable toggling performance events.
pub const PERF_ENV: &str = "MATRIXCL_PERF";
/// Environment variable with the performance span threshold in microseconds.
pub const PERF_THRESHOLD_ENV: &str = "MATRIXCL_PERF_THRESHOLD_US";

/// Preset subscriber settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Profile {
    /// Pretty, coloured output.
    #[default]
    Local,
    /// JSON without colour.
    Ci,
    /// JSON with debug-level matrixcl events, span close events and
    /// performance events.
    Performance,
}

impl FromStr for Profile {
    type Err = TracingSetupError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" | "" => Ok(Self::Local),
            "ci" => Ok(Self::Ci),
            "performance" | "perf" => Ok(Self::Performance),
            other => Err(TracingSetupError::UnknownProfile(other.to_string())),
        }
    }
}

/// Formatter layer output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = TracingSetupError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(TracingSetupError::UnknownFormat(other.to_string())),
        }
    }
}

/// Errors raised while building or installing the subscriber.
#[derive(Debug, Error)]
pub enum TracingSetupError {
    #[error("invalid tracing directive: {0}")]
    InvalidFilter(String),

    #[error("unknown log profile `{0}`")]
    UnknownProfile(String),

    #[error("unknown log format `{0}`")]
    UnknownFormat(String),

    #[error("failed to install global tracing subscriber: {0}")]
    SubscriberInit(#[from] tracing_subscriber::util::TryInitError),
}

/// How the process-wide subscriber is built.
#[derive(Clone, Debug)]
pub struct TracingConfig {
    /// Filter directives; `RUST_LOG` and then `fallback_directive` apply
    /// when absent.
    pub directives: Option<String>,
    pub fallback_directive: String,
    pub format: LogFormat,
    /// Ignored for [`LogFormat::Json`].
    pub ansi: bool,
    pub include_targets: bool,
    pub span_events: FmtSpan,
    /// Emit allocation, fill and transfer events from [`performance`].
    pub performance_events: bool,
    /// Minimum duration for a [`performance::PerformanceSpan`] to be logged.
    pub performance_threshold_us: Option<u64>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::for_profile(Profile::Local)
    }
}

impl TracingConfig {
    pub fn for_profile(profile: Profile) -> Self {
        let base = Self {
            directives: None,
            fallback_directive: "info".to_string(),
            format: LogFormat::Pretty,
            ansi: true,
            include_targets: true,
            span_events: FmtSpan::NONE,
            performance_events: cfg!(debug_assertions),
            performance_threshold_us: None,
        };

        match profile {
            Profile::Local => base,
            Profile::Ci => Self {
                format: LogFormat::Json,
                ansi: false,
                performance_events: false,
                ..base
            },
            Profile::Performance => Self {
                directives: Some("matrixcl_runtime=debug,matrixcl_core=debug".to_string()),
                format: LogFormat::Json,
                ansi: false,
                span_events: FmtSpan::CLOSE,
                performance_events: true,
                ..base
            },
        }
    }

    pub fn with_directives(mut self, directives: impl Into<String>) -> Self {
        self.directives = Some(directives.into());
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        if format == LogFormat::Json {
            self.ansi = false;
        }
        self
    }

    /// Configuration from `MATRIXCL_*` environment variables.
    ///
    /// Unparseable values are ignored and leave the profile default in place.
    pub fn from_env() -> Self {
        let profile = env::var(PROFILE_ENV)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or_default();
        let mut config = Self::for_profile(profile);

        if let Some(directives) = env::var(DIRECTIVES_ENV).ok().filter(|d| !d.trim().is_empty()) {
            config.directives = Some(directives);
        }
        if let Some(format) = env::var(FORMAT_ENV).ok().and_then(|value| value.parse().ok()) {
            config = config.with_format(format);
        }
        if let Ok(value) = env::var(PERF_ENV) {
            config.performance_events = matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        if let Some(threshold) = env::var(PERF_THRESHOLD_ENV).ok().and_then(|value| value.trim().parse().ok()) {
            config.performance_threshold_us = Some(threshold);
        }

        config
    }

    fn filter(&self) -> Result<EnvFilter, TracingSetupError> {
        match &self.directives {
            Some(directives) => {
                EnvFilter::try_new(directives).map_err(|err| TracingSetupError::InvalidFilter(err.to_string()))
            }
            None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.fallback_directive))),
        }
    }

    fn format_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let layer = tracing_subscriber::fmt::layer()
            .with_target(self.include_targets)
            .with_span_events(self.span_events.clone());

        match self.format {
            LogFormat::Compact => Box::new(layer.compact().with_ansi(self.ansi)),
            LogFormat::Pretty => Box::new(layer.pretty().with_ansi(self.ansi)),
            LogFormat::Json => Box::new(layer.json().with_ansi(false)),
        }
    }
}

/// Build the subscriber without installing it.
pub fn build_subscriber(config: &TracingConfig) -> Result<impl tracing::Subscriber + Send + Sync, TracingSetupError> {
    let filter = config.filter()?;
    Ok(Registry::default().with(config.format_layer()).with(filter))
}

/// Install the subscriber process-wide and apply the performance settings.
pub fn install(config: &TracingConfig) -> Result<(), TracingSetupError> {
    build_subscriber(config)?.try_init()?;
    performance::configure(config.performance_events, config.performance_threshold_us);
    tracing::debug!(format = ?config.format, performance = config.performance_events, "tracing installed");
    Ok(())
}

/// Install a compact, environment-driven subscriber at most once per process.
///
/// Returns whether this call installed it. Later calls, or a subscriber set
/// by someone else, leave the existing one in place.
pub fn install_for_tests() -> bool {
    static INSTALLED: OnceLock<bool> = OnceLock::new();
    *INSTALLED.get_or_init(|| {
        let config = TracingConfig::from_env().with_format(LogFormat::Compact);
        install(&config).is_ok()
    })
}
