//! Popups rendered as log lines.

use std::time::Duration;

use roomchain_core::world::Notifier;
use tracing::info;

/// A `Notifier` that logs every popup.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show_popup_for_everyone(&self, text: &str, duration: Duration) {
        info!(
            popup = text,
            duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            "popup shown"
        );
    }
}
