//! Logging setup utilities for the Matcha client binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Library crates whose logs every binary should see by default.
const WORKSPACE_CRATES: [&str; 3] = ["matcha_shared", "matcha_api", "matcha_chat"];

/// Initialize the tracing subscriber with the specified default log level.
///
/// This function sets up logging for both the library crates and the binary.
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "matcha-chat")
/// * `default_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use matcha_shared::logger::setup_logger;
///
/// setup_logger("matcha-chat", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the default filter directive: every workspace library crate at
/// `default_log_level`, plus the binary itself. Targets use underscores,
/// so the binary name is normalized before it is added.
fn default_directive(binary_name: &str, default_log_level: &str) -> String {
    let mut directives: Vec<String> = WORKSPACE_CRATES
        .iter()
        .map(|krate| format!("{krate}={default_log_level}"))
        .collect();

    let binary = binary_name.replace('-', "_");
    if !WORKSPACE_CRATES.contains(&binary.as_str()) {
        directives.push(format!("{binary}={default_log_level}"));
    }

    directives.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};

    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::Context;

    /// Records the target of every event that makes it past the filter.
    #[derive(Clone, Default)]
    struct RecordingLayer {
        targets: Arc<Mutex<Vec<String>>>,
    }

    impl<S: tracing::Subscriber> Layer<S> for RecordingLayer {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            self.targets
                .lock()
                .unwrap()
                .push(event.metadata().target().to_string());
        }
    }

    #[test]
    fn test_default_directive_covers_every_workspace_crate() {
        // given / when:
        let directive = default_directive("matcha-chat", "info");

        // then:
        assert_eq!(
            directive,
            "matcha_shared=info,matcha_api=info,matcha_chat=info"
        );
    }

    #[test]
    fn test_default_directive_adds_standalone_binary_target() {
        // given / when:
        let directive = default_directive("matcha-admin", "warn");

        // then: the binary name is normalized to underscores
        assert!(directive.ends_with(",matcha_admin=warn"));
    }

    #[test]
    fn test_default_filter_passes_chat_and_api_events() {
        // given: the filter a binary would install without RUST_LOG set
        let filter = tracing_subscriber::EnvFilter::try_new(default_directive(
            "matcha-chat",
            "info",
        ))
        .unwrap();
        let layer = RecordingLayer::default();
        let targets = Arc::clone(&layer.targets);
        let subscriber = tracing_subscriber::registry().with(filter).with(layer);

        // when: crates across the workspace emit events
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "matcha_chat::session", "reconnect scheduled");
            tracing::info!(target: "matcha_api::client", "request failed");
            tracing::info!(target: "matcha_shared::time", "clock read");
            tracing::debug!(target: "matcha_chat::protocol", "dropped frame");
        });

        // then: info events from every crate pass, debug stays filtered
        let targets = targets.lock().unwrap();
        assert!(targets.contains(&"matcha_chat::session".to_string()));
        assert!(targets.contains(&"matcha_api::client".to_string()));
        assert!(targets.contains(&"matcha_shared::time".to_string()));
        assert!(!targets.contains(&"matcha_chat::protocol".to_string()));
    }
}
