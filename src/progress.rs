//! Progress reporting for long-running remote calls.
//!
//! The job client only talks to a [`ProgressObserver`]; whether that draws a
//! spinner, stays silent, or records calls for a test is up to the caller.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// Receives progress notifications from job operations.
pub trait ProgressObserver: Send + Sync {
    /// An operation has started, e.g. `"Submitting bulk query job"`.
    fn start(&self, action: &str);
    /// The operation started last has finished, successfully or not.
    fn stop(&self);
    /// A one-line status message for the user.
    fn message(&self, msg: &str);
}

// ─────────────────────────────────────────────────────────────────────────────
// SpinnerProgress
// ─────────────────────────────────────────────────────────────────────────────

/// Terminal spinner on stderr, status messages on stdout.
#[derive(Default)]
pub struct SpinnerProgress {
    active: Mutex<Option<(ProgressBar, String)>>,
}

impl SpinnerProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressObserver for SpinnerProgress {
    fn start(&self, action: &str) {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(format!("{}...", action));
        bar.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut guard) = self.active.lock() {
            if let Some((previous, _)) = guard.replace((bar, action.to_string())) {
                previous.finish_and_clear();
            }
        }
    }

    fn stop(&self) {
        if let Ok(mut guard) = self.active.lock() {
            if let Some((bar, action)) = guard.take() {
                bar.finish_with_message(format!("{}... done", action));
            }
        }
    }

    fn message(&self, msg: &str) {
        println!("{}", msg);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SilentProgress
// ─────────────────────────────────────────────────────────────────────────────

/// Draws nothing; messages only go to the log. Used with `--json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressObserver for SilentProgress {
    fn start(&self, _action: &str) {}

    fn stop(&self) {}

    fn message(&self, msg: &str) {
        info!("[BULK] {}", msg);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Test helpers
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// A single observed progress notification.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ProgressEvent {
        Start(String),
        Stop,
        Message(String),
    }

    /// Records every notification in order.
    #[derive(Default)]
    pub struct RecordingProgress {
        events: Mutex<Vec<ProgressEvent>>,
    }

    impl RecordingProgress {
        pub fn events(&self) -> Vec<ProgressEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ProgressObserver for RecordingProgress {
        fn start(&self, action: &str) {
            self.events
                .lock()
                .unwrap()
                .push(ProgressEvent::Start(action.to_string()));
        }

        fn stop(&self) {
            self.events.lock().unwrap().push(ProgressEvent::Stop);
        }

        fn message(&self, msg: &str) {
            self.events
                .lock()
                .unwrap()
                .push(ProgressEvent::Message(msg.to_string()));
        }
    }
}
