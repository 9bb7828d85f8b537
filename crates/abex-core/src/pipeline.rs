//! End-to-end report building: lines -> records -> merged, sorted rows

use crate::aggregate::{aggregate, SlotCapacity};
use crate::error::Result;
use crate::input::read_log_lines;
use crate::record::AggregatedRecord;
use crate::report::sort_report;
use crate::scanner::scan_lines;
use std::path::Path;
use tracing::info;

/// Build the sorted report from already-read log lines
pub fn build_report<S: AsRef<str>>(lines: &[S], capacity: SlotCapacity) -> Vec<AggregatedRecord> {
    let records = scan_lines(lines);
    let mut rows = aggregate(&records, capacity);
    sort_report(&mut rows);

    info!(
        lines = lines.len(),
        listings = records.len(),
        rows = rows.len(),
        "built shop report"
    );
    rows
}

/// Read a chat log and build its report
pub fn build_report_from_file<P: AsRef<Path>>(
    path: P,
    capacity: SlotCapacity,
) -> Result<Vec<AggregatedRecord>> {
    let lines = read_log_lines(path)?;
    Ok(build_report(&lines, capacity))
}
