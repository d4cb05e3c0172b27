//! CLI presenter for output formatting

use std::io::{self, Write};

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::application::SessionSnapshot;
use crate::domain::memo::{Duration, Recording};
use crate::domain::session::SessionMode;

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.red} {msg}")
        {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// Update spinner message
    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
    }

    pub fn is_spinner_active(&self) -> bool {
        self.spinner.is_some()
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Output text to stdout without newline
    pub fn output_inline(&self, text: &str) {
        print!("{}", text);
        let _ = io::stdout().flush();
    }

    /// Shell prompt
    pub fn prompt(&self) {
        self.output_inline(&format!("{} ", "voice-memo>".bold()));
    }

    /// Recording line shown next to the spinner
    pub fn format_recording(&self, elapsed: Duration, max: Option<Duration>) -> String {
        match max {
            Some(max) => format!("Recording {} / {}", elapsed, max),
            None => format!("Recording {}", elapsed),
        }
    }

    /// Show or advance the recording spinner
    pub fn show_recording(&mut self, elapsed: Duration, max: Option<Duration>) {
        let line = self.format_recording(elapsed, max);
        if self.is_spinner_active() {
            self.update_spinner(&line);
        } else {
            self.start_spinner(&line);
        }
    }

    /// One catalog line: number, name, date, duration, size
    pub fn format_memo_row(&self, index: usize, recording: &Recording, size_kb: u64) -> String {
        format!(
            "{:>3}. {:<18} {:<20} {:>6} {:>7} KB",
            index,
            recording.name(),
            recording.date_string(),
            recording.duration_string(),
            size_kb
        )
    }

    /// Print the catalog with sizes
    pub fn memo_list(&self, rows: &[(Recording, u64)], playing: Option<&Recording>) {
        if rows.is_empty() {
            self.info("No memos yet. Type 'record' to make one.");
            return;
        }
        for (i, (recording, size_kb)) in rows.iter().enumerate() {
            let row = self.format_memo_row(i + 1, recording, *size_kb);
            if playing.is_some_and(|p| p.id() == recording.id()) {
                println!("{} {}", row.green(), "▶".green());
            } else {
                println!("{}", row);
            }
        }
    }

    /// Print the session status block
    pub fn status(&self, snapshot: &SessionSnapshot) {
        let state = match &snapshot.mode {
            SessionMode::Idle => "idle".to_string(),
            SessionMode::Recording { elapsed, .. } => format!("recording ({})", elapsed),
            SessionMode::Playing { target } => {
                let name = snapshot
                    .recordings
                    .iter()
                    .find(|r| r.id() == *target)
                    .map(|r| r.name())
                    .unwrap_or_else(|| target.to_string());
                format!("playing {}", name)
            }
        };
        self.key_value("state", &state);
        self.key_value("memos", &snapshot.recordings.len().to_string());
        self.key_value(
            "microphone",
            if snapshot.has_permission {
                "granted"
            } else {
                "not granted"
            },
        );
        self.key_value("last error", snapshot.last_error.as_deref().unwrap_or("(none)"));
    }

    /// Print a key-value pair
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}
