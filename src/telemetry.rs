//! Tracing setup. `LOG_LEVEL` overrides the filter, `LOG_FORMAT=json` switches
//! to JSON lines. Targets: `treasure_hunt`, `run`, `leaderboard`, `scan`.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info,run=debug,leaderboard=debug,treasure_hunt=debug,tower_http=info,axum=info";

/// Directives from `LOG_LEVEL`, or the default set when unset or unparsable.
fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

pub fn init_tracing() {
    let directives = std::env::var("LOG_LEVEL").ok();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter_from(directives.as_deref()))
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}
