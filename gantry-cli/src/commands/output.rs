//! User-facing output.
//!
//! Handlers write through the [`Output`] trait instead of `println!`
//! directly so they can be tested with a recording implementation.

use std::sync::Arc;
use std::time::Duration;

use console::{style, Term};
use gantry::orchestrator::{InstalledPackage, ProgressCallback, TaskEvent, TaskStage};
use gantry::DependencyKind;
use indicatif::{ProgressBar, ProgressStyle};

// ============================================================================
// Output Trait
// ============================================================================

/// Trait for outputting messages to the user.
pub trait Output: Send + Sync {
    /// Print a line of text.
    fn println(&self, message: &str);

    /// Print an empty line.
    fn newline(&self) {
        self.println("");
    }

    /// Print a warning message.
    fn warning(&self, message: &str) {
        self.println(&format!("Warning: {}", message));
    }

    /// Print a success message.
    fn success(&self, message: &str) {
        self.println(&format!("Success: {}", message));
    }

    /// Print one installed package.
    fn package(&self, package: &InstalledPackage) {
        let suffix = match package.kind {
            DependencyKind::Runtime => "",
            DependencyKind::Dev => " (dev)",
        };
        self.println(&format!("+ {}@{}{}", package.name, package.version, suffix));
    }
}

// ============================================================================
// Console Output Implementation
// ============================================================================

/// Standard console output implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleOutput;

impl ConsoleOutput {
    /// Create a new console output.
    pub fn new() -> Self {
        Self
    }
}

impl Output for ConsoleOutput {
    fn println(&self, message: &str) {
        println!("{}", message);
    }

    fn warning(&self, message: &str) {
        println!("{} {}", style("warning:").yellow().bold(), message);
    }

    fn success(&self, message: &str) {
        println!("{} {}", style("✓").green().bold(), message);
    }

    fn package(&self, package: &InstalledPackage) {
        let suffix = match package.kind {
            DependencyKind::Runtime => String::new(),
            DependencyKind::Dev => style(" (dev)").dim().to_string(),
        };
        println!(
            "{} {}@{}{}",
            style("+").green(),
            style(&package.name).bold(),
            package.version,
            suffix
        );
    }
}

// ============================================================================
// Progress
// ============================================================================

/// Live progress line for an install batch, drawn on stderr.
///
/// Hidden when stderr is not a terminal.
pub struct InstallProgress {
    bar: ProgressBar,
}

impl InstallProgress {
    pub fn new() -> Self {
        let bar = if Term::stderr().is_term() {
            let bar = ProgressBar::new(0);
            let template = "{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}";
            bar.set_style(
                ProgressStyle::with_template(template)
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            );
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        } else {
            ProgressBar::hidden()
        };
        Self { bar }
    }

    /// Callback feeding task events into the bar.
    pub fn callback(&self) -> ProgressCallback {
        let bar = self.bar.clone();
        Arc::new(move |event: &TaskEvent| match event.stage {
            TaskStage::Pending => bar.inc_length(1),
            TaskStage::Installed | TaskStage::Failed => bar.inc(1),
            stage => bar.set_message(format!("{} {}", stage, event.name)),
        })
    }

    /// Remove the bar from the terminal.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for InstallProgress {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Test Output
// ============================================================================

/// Output that records lines instead of printing them.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingOutput {
    lines: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordingOutput {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Output for RecordingOutput {
    fn println(&self, message: &str) {
        self.lines.lock().unwrap().push(message.to_string());
    }}
