use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Installs a JSON `tracing` subscriber filtered by `RUST_LOG` (default `info`).
///
/// CloudWatch ingests stdout line by line, so ANSI colours are disabled.
/// A second call keeps the subscriber already installed.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let installed = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_current_span(false)
        .try_init();

    if let Err(error) = installed {
        tracing::debug!(
            component = "logging",
            event = "subscriber_already_installed",
            error = %error,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_keeps_first_subscriber() {
        init();
        init();
        tracing::info!(component = "logging", event = "still_logging");
    }
}
