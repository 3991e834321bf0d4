//! Pass Reporting
//!
//! Renders a [`PassReport`] as a line-oriented listing, a JSON document, or a
//! short summary.

use std::time::Duration;

use crate::cli::{OutputFormat, VerbosityLevel};
use crate::collector::WalkOutcome;
use crate::engine::PassReport;

/// Output formatter for pass reports
pub struct Output {
    format: OutputFormat,
    verbosity: VerbosityLevel,
    show_colors: bool,
}

impl Output {
    pub fn new(format: OutputFormat, verbosity: VerbosityLevel) -> Self {
        Self {
            format,
            verbosity,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    /// Disable ANSI colors regardless of the terminal
    pub fn without_colors(mut self) -> Self {
        self.show_colors = false;
        self
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    pub fn format_report(&self, report: &PassReport) -> String {
        match self.format {
            OutputFormat::Human => self.format_human(report),
            OutputFormat::Json => format_json(report),
            OutputFormat::Summary => self.format_summary(report),
        }
    }

    fn format_human(&self, report: &PassReport) -> String {
        let mut output = String::new();

        if self.verbosity > VerbosityLevel::Quiet {
            for reference in &report.collection.references {
                output.push_str(&self.format_line("referenced", "32", &reference.to_string()));
            }

            match &report.prune {
                None => {
                    for reference in &report.unreferenced {
                        output.push_str(&self.format_line(
                            "unreferenced",
                            "33",
                            &reference.to_string(),
                        ));
                    }
                }
                Some(prune) => {
                    let label = if prune.dry_run { "would delete" } else { "deleted" };
                    for reference in &prune.pruned {
                        output.push_str(&self.format_line(label, "36", &reference.to_string()));
                    }
                }
            }
        }

        if let Some(prune) = &report.prune {
            for failure in &prune.failures {
                output.push_str(&self.format_line(
                    "failed",
                    "31",
                    &format!("{} - {}", failure.path.display(), failure.reason),
                ));
            }
        }

        if self.verbosity >= VerbosityLevel::Verbose && !report.collection.issues.is_empty() {
            output.push_str("\nIssues:\n");
            for issue in &report.collection.issues {
                output.push_str(&format!("  {}\n", issue));
            }
        }

        if self.verbosity > VerbosityLevel::Quiet {
            output.push('\n');
            output.push_str(&self.format_summary(report));
        }

        output
    }

    fn format_line(&self, label: &str, color: &str, detail: &str) -> String {
        format!("{}  {}\n", self.colorize(&format!("{:<12}", label), color), detail)
    }

    fn format_summary(&self, report: &PassReport) -> String {
        let mut output = String::new();
        output.push_str("Summary:\n");
        output.push_str(&format!(
            "  Root documents: {}\n",
            report.collection.roots.len()
        ));
        output.push_str(&format!(
            "  Referenced schemas: {}\n",
            report.collection.references.len()
        ));
        output.push_str(&format!(
            "  Schema files under {}: {}\n",
            report.base_dir.display(),
            report.inventory_size
        ));
        output.push_str(&format!("  Unreferenced: {}\n", report.unreferenced.len()));

        if let Some(prune) = &report.prune {
            let label = if prune.dry_run { "Would delete:" } else { "Deleted:" };
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize(label, "36"),
                prune.pruned.len()
            ));
            if prune.has_failures() {
                output.push_str(&format!(
                    "  {} {}\n",
                    self.colorize("Failed:", "31"),
                    prune.failures.len()
                ));
            }
        }

        if !report.collection.issues.is_empty() {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Issues:", "33"),
                report.collection.issues.len()
            ));
        }

        output.push_str(&format!("  Walk: {}\n", outcome_label(report.outcome)));
        output.push_str(&format!(
            "  Duration: {}\n",
            format_duration(report.duration)
        ));
        output
    }
}

fn outcome_label(outcome: WalkOutcome) -> &'static str {
    match outcome {
        WalkOutcome::Complete => "complete",
        WalkOutcome::Partial => "partial (unresolved locations)",
        WalkOutcome::Degraded => "degraded (unparsable schemas)",
    }
}

fn format_json(report: &PassReport) -> String {
    let mut json = serde_json::to_string_pretty(report)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize report: {}\"}}", e));
    json.push('\n');
    json
}

fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs_f64();
    if total_secs < 1.0 {
        format!("{:.0}ms", duration.as_millis())
    } else if total_secs < 60.0 {
        format!("{:.2}s", total_secs)
    } else {
        let mins = (total_secs / 60.0) as u64;
        let secs = total_secs % 60.0;
        format!("{}m{:.1}s", mins, secs)
    }
}
