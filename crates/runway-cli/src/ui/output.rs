//! Terminal implementation of [`Reporter`].

use super::Reporter;
use crossterm::style::Stylize;
use std::io::Write;

/// Styled, sequential terminal output.
#[derive(Debug, Clone)]
pub struct Output {
    quiet: bool,
}

impl Output {
    /// Create an output handle. With `quiet`, only warnings and errors
    /// (and explicit results like `version show`) are printed.
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Reporter for Output {
    fn step(&self, msg: &str) {
        if !self.quiet {
            println!("{} {}", "»".dark_grey(), msg);
        }
    }

    fn info(&self, msg: &str) {
        if !self.quiet {
            println!("  {msg}");
        }
    }

    fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{} {}", "✔".green(), msg);
        }
    }

    fn warning(&self, msg: &str) {
        println!("{} {}", "⚠".yellow(), msg);
    }

    fn error(&self, msg: &str) {
        eprintln!("{} {}", "✗".red(), msg);
    }

    fn detail(&self, msg: &str) {
        if !self.quiet {
            println!("    {}", msg.dark_grey());
        }
    }
}

/// Ask the operator a yes/no question on stdin. Anything but `y`/`yes`
/// counts as no.
pub fn confirm(prompt: &str) -> std::io::Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

/// Format bytes as human-readable
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MiB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MiB");
    }
}
