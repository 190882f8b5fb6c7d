//! Tracing setup for hosts embedding binmodel.
//!
//! The library only emits events. Object construction runs inside an
//! `object_create` span, pipeline steps log record counts at `debug` and
//! skipped capabilities at `trace`, and load failures log at `warn`. A host
//! or a test opts into a subscriber through [`init_with`].

use std::sync::Once;

use tracing::info;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Filter directives read before `RUST_LOG`.
pub const LOG_ENV: &str = "BINMODEL_LOG";

/// Filter used when neither variable is set.
pub const DEFAULT_DIRECTIVE: &str = "warn,binmodel=info";

/// Output shape of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

static INIT: Once = Once::new();

fn env_filter() -> EnvFilter {
    std::env::var(LOG_ENV)
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install the global subscriber once.
///
/// Later calls are ignored, as is the whole call when the host already
/// installed a subscriber of its own.
pub fn init_with(format: LogFormat) {
    INIT.call_once(|| {
        let registry = tracing_subscriber::registry().with(env_filter());
        // closing object_create spans carry the construction time
        let installed = match format {
            LogFormat::Text => registry
                .with(
                    fmt::layer()
                        .with_span_events(FmtSpan::CLOSE)
                        .with_target(true),
                )
                .try_init(),
            LogFormat::Json => registry
                .with(
                    fmt::layer()
                        .json()
                        .with_span_events(FmtSpan::CLOSE)
                        .with_current_span(true),
                )
                .try_init(),
        };
        if installed.is_ok() {
            info!(?format, "binmodel tracing initialized");
        }
    });
}

pub fn init_tracing() {
    init_with(LogFormat::Text);
}

pub fn init_tracing_json() {
    init_with(LogFormat::Json);
}

/// `info_span!` for object-level operations.
#[macro_export]
macro_rules! span_trace {
    ($name:expr) => {
        tracing::info_span!($name)
    };
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

/// Log an error at `warn` and evaluate to it.
#[macro_export]
macro_rules! log_error {
    ($err:expr) => {{
        let e = $err;
        tracing::warn!(error = %e, "binmodel operation failed");
        e
    }};
    ($err:expr, $msg:expr) => {{
        let e = $err;
        tracing::warn!(error = %e, message = $msg, "binmodel operation failed");
        e
    }};
}
