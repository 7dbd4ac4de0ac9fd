//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use ninja_core::{total_bucks, Ninja};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a single ninja with its roster position
    pub fn print_ninja(&self, index: usize, ninja: &Ninja) {
        match self.format {
            OutputFormat::Human => {
                println!("{}", format_row(index, ninja));
            }
            OutputFormat::Json => {
                println!("{}", ninja_json(index, ninja));
            }
            OutputFormat::Quiet => {
                println!("{}", ninja.bucks);
            }
        }
    }

    /// Print the whole roster
    pub fn print_ninjas(&self, ninjas: &[Ninja]) {
        match self.format {
            OutputFormat::Human => {
                if ninjas.is_empty() {
                    println!("No ninjas yet. Add one with: ninjabucks add <name>");
                    return;
                }
                println!("{}", format_header());
                for (index, ninja) in ninjas.iter().enumerate() {
                    println!("{}", format_row(index, ninja));
                }
                println!(
                    "\n{} ninja(s), {} ninja bucks in total",
                    ninjas.len(),
                    format_total(total_bucks(ninjas))
                );
            }
            OutputFormat::Json => {
                let rows: Vec<_> = ninjas
                    .iter()
                    .enumerate()
                    .map(|(index, ninja)| ninja_json(index, ninja))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows).unwrap_or_default());
            }
            OutputFormat::Quiet => {
                for ninja in ninjas {
                    println!("{}\t{}", ninja.name, ninja.bucks);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a warning to stderr
    pub fn warning(&self, message: &str) {
        eprintln!("{}", self.warning_line(message));
    }

    /// Warnings are never silenced, quiet mode just drops the glyph
    fn warning_line(&self, message: &str) -> String {
        match self.format {
            OutputFormat::Human => format!("⚠ {}", message),
            OutputFormat::Json => {
                serde_json::json!({"status": "warning", "message": message}).to_string()
            }
            OutputFormat::Quiet => message.to_string(),
        }
    }
}

/// Total for display; "overflow" when it does not fit in an i64
pub fn format_total(total: Option<i64>) -> String {
    match total {
        Some(total) => total.to_string(),
        None => "overflow".to_string(),
    }
}

fn format_header() -> String {
    format!("{:>3}  {:<20}  {:>10}", "#", "NAME", "BUCKS")
}

fn format_row(index: usize, ninja: &Ninja) -> String {
    format!(
        "{:>3}  {:<20}  {:>10}",
        index,
        truncate(&ninja.name, 20),
        ninja.bucks
    )
}

fn ninja_json(index: usize, ninja: &Ninja) -> serde_json::Value {
    serde_json::json!({
        "index": index,
        "ninjaName": ninja.name,
        "ninjaBucks": ninja.bucks,
    })
}

/// Truncate a string to max characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
