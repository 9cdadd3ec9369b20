use crate::error::CliError;
use engine_core::metrics::MetricsSnapshot;
use serde_json::Value;
use std::io::Write;

/// Writes one item as a single JSON line.
pub fn print_item(out: &mut impl Write, item: &Value) -> Result<(), CliError> {
    let line = serde_json::to_string(item).map_err(CliError::JsonSerialize)?;
    writeln!(out, "{line}").map_err(CliError::Output)
}

pub fn print_metrics(out: &mut impl Write, metrics: &MetricsSnapshot) -> Result<(), CliError> {
    write_metrics(out, metrics).map_err(CliError::Output)
}

fn write_metrics(out: &mut impl Write, metrics: &MetricsSnapshot) -> std::io::Result<()> {
    writeln!(out, "Scroll summary:")?;
    writeln!(out, "-----------------------------")?;
    writeln!(out, "{:<16} {}", "Requested", display_demand(metrics.items_requested))?;
    writeln!(out, "{:<16} {}", "Emitted", metrics.items_emitted)?;
    writeln!(out, "{:<16} {}", "Pages", metrics.batches_fetched)?;
    writeln!(out, "{:<16} {}", "Failures", metrics.failure_count)
}

fn display_demand(requested: u64) -> String {
    if requested == u64::MAX {
        "unbounded".to_string()
    } else {
        requested.to_string()
    }
}
