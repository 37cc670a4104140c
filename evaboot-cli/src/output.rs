//! Output helpers
//!
//! JSON records go to stdout so commands can be piped into each other;
//! human-readable status lines go to stderr.

use anyhow::Result;
use colored::*;
use evaboot_core::domain::job::JobStatus;
use serde_json::Value;

/// Print records as a pretty JSON array on stdout
pub fn print_records(records: &[Value]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(records)?);
    Ok(())
}

/// Print one status line per record on stderr
pub fn print_record_lines(records: &[Value]) {
    for record in records {
        if let Some(error) = record.get("error").and_then(Value::as_str) {
            eprintln!("  {} {}", "✗".red(), error.red());
            continue;
        }

        let id = match record.get("id").or_else(|| record.get("jobId")) {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => "?".to_string(),
        };
        let status = record
            .get("status")
            .and_then(Value::as_str)
            .map(|status| colorize_status(&JobStatus::from(status)).to_string())
            .unwrap_or_default();

        eprintln!("  {} Job {} {}", "▸".cyan(), id.dimmed(), status);
    }
}

/// Print a final summary line: green when nothing failed
pub fn print_summary(records: &[Value], what: &str) {
    let failed = records.iter().filter(|r| r.get("error").is_some()).count();
    let succeeded = records.len() - failed;

    if failed == 0 {
        eprintln!("{} {} {}", "✓".green(), succeeded, what);
    } else {
        eprintln!(
            "{} {} {}, {} failed",
            "⚠".yellow(),
            succeeded,
            what,
            failed.to_string().red()
        );
    }
}

/// Colorize job status for display
pub fn colorize_status(status: &JobStatus) -> ColoredString {
    let status_str = status.as_str();
    match status {
        JobStatus::Pending => status_str.yellow(),
        JobStatus::Processing => status_str.cyan(),
        JobStatus::Complete => status_str.green(),
        JobStatus::Failed => status_str.red(),
        JobStatus::Cancelled => status_str.dimmed(),
        JobStatus::Other(_) => status_str.normal(),
    }
}
