//! Report CSV artifact emission under the exports root.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sp_schemas::ReportRow;
use uuid::Uuid;

/// Column order of the report artifact; must match [`ReportRow`] field order.
pub const REPORT_COLUMNS: [&str; 7] = [
    "store_id",
    "uptime_last_hour",
    "uptime_last_day",
    "uptime_last_week",
    "downtime_last_hour",
    "downtime_last_day",
    "downtime_last_week",
];

/// `<exports_root>/report_<report_id>.csv`
pub fn report_csv_path(exports_root: &Path, report_id: Uuid) -> PathBuf {
    exports_root.join(format!("report_{report_id}.csv"))
}

/// Write the report artifact. The header row is always present, even for an
/// empty dataset.
pub fn write_report_csv(
    exports_root: &Path,
    report_id: Uuid,
    rows: &[ReportRow],
) -> Result<PathBuf> {
    fs::create_dir_all(exports_root)
        .with_context(|| format!("create exports dir failed: {}", exports_root.display()))?;

    let path = report_csv_path(exports_root, report_id);
    // Header written by hand so it survives an empty row set; automatic
    // serde headers stay off.
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&path)
        .with_context(|| format!("open report artifact failed: {}", path.display()))?;

    wtr.write_record(REPORT_COLUMNS)
        .context("write report header failed")?;
    for row in rows {
        wtr.serialize(row).context("write report row failed")?;
    }
    wtr.flush().context("flush report artifact failed")?;

    Ok(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
