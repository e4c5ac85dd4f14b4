//! Structured logging.

use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

/// Directive used when `RUST_LOG` is not set.
pub fn default_directive(level: &str) -> String {
    format!("multienv={level},tower_http={level}")
}

/// Changes the log level after the subscriber is installed.
#[derive(Clone)]
pub struct LogLevelHandle {
    inner: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogLevelHandle {
    /// Switch to `level`. A no-op when `RUST_LOG` chose the filter.
    pub fn set_level(&self, level: &str) -> Result<(), reload::Error> {
        if self.from_env {
            return Ok(());
        }
        self.inner.reload(EnvFilter::new(default_directive(level)))
    }
}

fn filter_layer(level: &str) -> (reload::Layer<EnvFilter, Registry>, LogLevelHandle) {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new(default_directive(level)), false),
    };
    let (layer, inner) = reload::Layer::new(filter);
    (layer, LogLevelHandle { inner, from_env })
}

/// Install the global subscriber at `level`.
///
/// `RUST_LOG` wins over `level`. Fails if a subscriber is already installed.
pub fn init_logging(level: &str) -> Result<LogLevelHandle, tracing_subscriber::util::TryInitError> {
    let (filter, handle) = filter_layer(level);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;
    Ok(handle)
}
