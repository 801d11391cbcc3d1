//! Tracing setup shared by the binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "postwall={level},postwall_dev={level},tower_http={level}",
            level = config.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);

    // stdout belongs to the CLI's rendered output
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if config.format == "json" {
        registry.with(layer.json()).init();
    } else {
        registry.with(layer).init();
    }
}
