//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! - LOG_LEVEL sets the filter, e.g. "debug" or
//!   "info,access=debug,dictapp_gateway=debug,tower_http=info".
//! - LOG_FORMAT picks "pretty" (default) or "json".
//!
//! Bearer tokens are never recorded; handlers log whether one was present.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,access=debug,lounge=info,dictapp_gateway=debug,tower_http=info,axum=info";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}
