// Tracing setup for hosts embedding the editor.

use tracing_subscriber::EnvFilter;

/// Environment variable read before `RUST_LOG`.
pub const LOG_ENV: &str = "STAMP_LOG";

/// Install a fmt subscriber filtered by `STAMP_LOG`, then `RUST_LOG`, then
/// `default_directive`. Returns false if a global subscriber already exists.
pub fn init_tracing(default_directive: &str) -> bool {
    let filter = build_filter(
        std::env::var(LOG_ENV).ok(),
        std::env::var("RUST_LOG").ok(),
        default_directive,
    );

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

fn build_filter(primary: Option<String>, fallback: Option<String>, default: &str) -> EnvFilter {
    [primary, fallback]
        .into_iter()
        .flatten()
        .find_map(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_precedence() {
        let filter = build_filter(Some("stamp_gallery=trace".into()), Some("warn".into()), "info");
        assert!(filter.to_string().contains("stamp_gallery=trace"));

        let filter = build_filter(None, Some("warn".into()), "info");
        assert!(filter.to_string().contains("warn"));

        let filter = build_filter(None, None, "debug");
        assert!(filter.to_string().contains("debug"));
    }

    #[test]
    fn test_init_is_idempotent() {
        init_tracing("warn");
        assert!(!init_tracing("warn"));
    }
}
