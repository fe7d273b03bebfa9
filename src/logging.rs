use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::settings::Settings;

/// `RUST_LOG` wins; otherwise the configured level.
fn filter(settings: &Settings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Diagnostics go to stderr so command output on stdout stays clean.
pub fn init(settings: &Settings) {
    let subscriber = tracing_subscriber::registry().with(filter(settings)).with(
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr),
    );

    let _ = subscriber.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_level_falls_back() {
        let settings = Settings {
            log_level: "[[not a filter".to_string(),
            ..Settings::default()
        };
        // Must not panic; the subscriber may already be set by another test.
        init(&settings);
        init(&settings);
    }
}
