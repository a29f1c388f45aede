//! Terminal output utilities
//!
//! Run log messages may span several lines (pretty payloads, server response
//! bodies). Continuation lines are indented under the label.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

fn layout(label: &str, message: &str) -> String {
    let indent = " ".repeat(label.len() + 2);
    let mut lines = message.lines();
    let mut out = lines.next().unwrap_or_default().to_string();
    for line in lines {
        out.push('\n');
        out.push_str(&indent);
        out.push_str(line);
    }
    out
}

/// Print an error message to stderr
pub fn print_error(message: &str) {
    eprintln!("{}: {}", style("error").red().bold(), layout("error", message));
}

/// Print a warning message to stderr
pub fn print_warning(message: &str) {
    eprintln!("{}: {}", style("warning").yellow().bold(), layout("warning", message));
}

/// Print an info message to stderr
pub fn print_info(message: &str) {
    eprintln!("{}: {}", style("info").blue().bold(), layout("info", message));
}

/// Print a debug message to stderr
pub fn print_debug(message: &str) {
    eprintln!("{}: {}", style("debug").dim(), layout("debug", message));
}

/// Print a success message to stdout
pub fn print_success(message: &str) {
    println!("{}: {}", style("success").green().bold(), message);
}

/// Spinner shown while a suite is replayed and published
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
