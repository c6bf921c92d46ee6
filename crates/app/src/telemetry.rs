//! Tracing setup for the `quiz` binary.
//!
//! - `LOG_LEVEL` sets the filter directives (default `info,services=debug`).
//! - `LOG_FORMAT=json` switches to structured JSON lines; anything else is
//!   the human-readable format.
//!
//! Logs go to stderr; stdout belongs to the quiz itself.

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "info,services=debug";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}
