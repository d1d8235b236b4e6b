//! Tracing registration

use color_eyre::{eyre::Context, Report};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};
use tracing_tree::HierarchicalLayer;

use crate::settings::{LogConfig, LogFormat};

/// Sets all tracing subscribers up
///
/// This registers the infrastructure for span traces (used by
/// [color_eyre] reports), env filters and either pretty printing or
/// JSON lines, depending on [LogConfig::format].
///
/// `RUST_LOG` overrides [LogConfig::level] when set.
pub fn setup(config: &LogConfig) -> Result<(), Report> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .wrap_err_with(|| format!("{:?} is not a valid log level", config.level))?,
    };

    let output = match config.format {
        LogFormat::Pretty => HierarchicalLayer::new(2)
            .with_targets(true)
            .with_bracketed_fields(true)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
    };

    Registry::default()
        .with(filter)
        .with(output)
        .with(ErrorLayer::default())
        .try_init()
        .wrap_err("Installing the tracing subscriber")
}
