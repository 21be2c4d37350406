//! Progress observers for the upload loop.
//!
//! Units are advisory: bytes for delimited sources, elements for JSON.

use crate::domain::ports::ProgressObserver;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[cfg(feature = "cli")]
use indicatif::{ProgressBar, ProgressStyle};

/// Terminal progress bar showing percent complete.
#[cfg(feature = "cli")]
pub struct BarProgress {
    bar: ProgressBar,
}

#[cfg(feature = "cli")]
impl BarProgress {
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{msg}\n[{elapsed_precise}] [{wide_bar:.cyan/blue}] {percent:>3}% ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        bar.set_style(style);
        bar.set_message(message.to_string());
        Self { bar }
    }
}

#[cfg(feature = "cli")]
impl ProgressObserver for BarProgress {
    fn start(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
    }

    fn advance(&self, units: u64) {
        self.bar.inc(units);
    }

    fn finish(&self) {
        // Heuristic units may fall short of the total; a finished run is 100%.
        if let Some(total) = self.bar.length() {
            self.bar.set_position(total);
        }
        self.bar.finish();
    }
}

/// Discards progress; used with `--no-progress`.
#[derive(Debug, Default)]
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {
    fn start(&self, _total: u64) {}
    fn advance(&self, _units: u64) {}
    fn finish(&self) {}
}

/// Keeps counters instead of rendering, so callers can assert on them.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    total: AtomicU64,
    completed: AtomicU64,
    advances: AtomicU64,
    finished: AtomicBool,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn advances(&self) -> u64 {
        self.advances.load(Ordering::SeqCst)
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

impl ProgressObserver for RecordingProgress {
    fn start(&self, total: u64) {
        self.total.store(total, Ordering::SeqCst);
    }

    fn advance(&self, units: u64) {
        self.completed.fetch_add(units, Ordering::SeqCst);
        self.advances.fetch_add(1, Ordering::SeqCst);
    }

    fn finish(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }
}

impl<T: ProgressObserver + ?Sized> ProgressObserver for std::sync::Arc<T> {
    fn start(&self, total: u64) {
        (**self).start(total)
    }

    fn advance(&self, units: u64) {
        (**self).advance(units)
    }

    fn finish(&self) {
        (**self).finish()
    }
}

/// Format bytes into human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}
