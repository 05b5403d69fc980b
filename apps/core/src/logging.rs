//! Tracing subscriber setup.
//!
//! Logs go to stderr so that stdout stays free for command output. The filter comes
//! from `RUST_LOG` (default `info`). Setting `DESK_LOG_FORMAT=json` switches from the
//! human-readable formatter to Bunyan-style JSON lines.

use std::env;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::error::{DeskError, Result};

pub const LOG_FORMAT_VAR: &str = "DESK_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match env::var(LOG_FORMAT_VAR) {
            Ok(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init_tracing(app_name: &str) -> Result<()> {
    match LogFormat::from_env() {
        LogFormat::Json => {
            let formatting_layer = BunyanFormattingLayer::new(app_name.to_string(), std::io::stderr);
            let subscriber = Registry::default()
                .with(env_filter())
                .with(JsonStorageLayer)
                .with(formatting_layer);
            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| DeskError::Internal(format!("cannot install subscriber: {}", e)))
        }
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| DeskError::Internal(format!("cannot install subscriber: {}", e))),
    }
}
