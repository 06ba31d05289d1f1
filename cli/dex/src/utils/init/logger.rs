use std::sync::OnceLock;

use tracing::{debug, error};
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload::Handle;
use tracing_subscriber::{EnvFilter, Registry};

use crate::commands::Verbosity;

static LOGGER_HANDLE: OnceLock<Handle<EnvFilter, Registry>> = OnceLock::new();

/// The log filter for a verbosity level
pub(crate) fn log_filter(verbosity: Verbosity) -> &'static str {
    match verbosity {
        // Show only errors
        Verbosity::Quiet => "off,dex=error,dex_rust_sdk=error",
        // Only show our own warnings, the libraries' are reported as messages
        Verbosity::Verbose(0) => "off,dex=warn",
        // Show our own info logs
        Verbosity::Verbose(1) => "off,dex=info,dex_rust_sdk=info",
        // Also show debug from our libraries
        Verbosity::Verbose(2) => "off,dex=debug,dex_rust_sdk=debug,dex_catalog=debug",
        // Also show trace from our libraries
        Verbosity::Verbose(3) => "off,dex=trace,dex_rust_sdk=trace,dex_catalog=trace",
        // Also show debug from dependencies such as reqwest
        Verbosity::Verbose(4) => "debug,dex=trace,dex_rust_sdk=trace,dex_catalog=trace",
        Verbosity::Verbose(_) => "trace",
    }
}

/// Install the logger, or update its filter if it is already installed.
///
/// `RUST_LOG` takes precedence over the verbosity.
pub(crate) fn init_logger(verbosity: Option<Verbosity>) {
    let verbosity = verbosity.unwrap_or_default();

    let filter_handle = LOGGER_HANDLE.get_or_init(|| {
        let filter = EnvFilter::new("off");
        let (filter, reload_handle) = tracing_subscriber::reload::Layer::new(filter);
        let log_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(filter);
        tracing_subscriber::registry().with(log_layer).init();
        reload_handle
    });

    update_filters(filter_handle, log_filter(verbosity));
    debug!(?verbosity, "initialized logger");
}

pub fn update_filters(filter_handle: &Handle<EnvFilter, Registry>, log_filter: &str) {
    let result = filter_handle.modify(|layer| {
        match EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_filter)) {
            Ok(new_filter) => *layer = new_filter,
            Err(err) => {
                error!("Updating logger filter failed: {}", err);
            },
        };
    });
    if let Err(err) = result {
        error!("Updating logger filter failed: {}", err);
    }
}
