//! Test notifier: records every popup instead of showing it.

use std::sync::Mutex;
use std::time::Duration;

use roomchain_core::world::Notifier;

/// A notifier that keeps every popup it was asked to show.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    shown: Mutex<Vec<(String, Duration)>>,
}

impl RecordingNotifier {
    /// Creates an empty recording notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the popup texts in the order they were shown.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn popups(&self) -> Vec<String> {
        self.shown
            .lock()
            .unwrap()
            .iter()
            .map(|(text, _)| text.clone())
            .collect()
    }

    /// Returns the popups together with their requested durations.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn popups_with_duration(&self) -> Vec<(String, Duration)> {
        self.shown.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn show_popup_for_everyone(&self, text: &str, duration: Duration) {
        self.shown.lock().unwrap().push((text.to_owned(), duration));
    }
}
