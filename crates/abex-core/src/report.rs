//! Report ordering and export
//!
//! Files are built in memory and written with a single `fs::write`, so a
//! failed export never leaves a half-written report behind.

use crate::error::{Error, Result};
use crate::record::AggregatedRecord;
use std::fs;
use std::path::Path;
use tracing::info;

/// Report columns, in output order
pub const REPORT_HEADER: [&str; 10] = [
    "Owner",
    "Land",
    "Item",
    "Enchantments",
    "Stock",
    "Left Stock",
    "Buy Price",
    "Sell Price",
    "Repair Cost",
    "Merged Count",
];

/// UTF-8 byte-order mark, so spreadsheet tools pick the right encoding
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Sort rows by land, then item, then enchantment signature
///
/// The sort is stable: rows equal on all three keep their incoming order.
pub fn sort_report(rows: &mut [AggregatedRecord]) {
    rows.sort_by(|a, b| {
        a.land
            .cmp(&b.land)
            .then_with(|| a.item.cmp(&b.item))
            .then_with(|| a.enchantments.cmp(&b.enchantments))
    });
}

/// Cell values of one report row, in [`REPORT_HEADER`] order
pub fn report_row(record: &AggregatedRecord) -> Vec<String> {
    vec![
        record.owner.clone(),
        record.land.clone(),
        record.item.clone(),
        record.enchantments.clone(),
        record.total_stock.to_string(),
        record.left_stock.to_string(),
        record.buy_price.to_string(),
        record.sell_price.to_string(),
        record
            .repair_cost_display
            .map(|level| level.to_string())
            .unwrap_or_default(),
        record.merged_count.to_string(),
    ]
}

/// Header plus string rows, for previews and for CSV output
pub fn report_rows(records: &[AggregatedRecord]) -> (Vec<String>, Vec<Vec<String>>) {
    let header = REPORT_HEADER.iter().map(|h| h.to_string()).collect();
    let rows = records.iter().map(report_row).collect();
    (header, rows)
}

/// Serialize rows as CSV, prefixed with a UTF-8 BOM
pub fn encode_csv<P: AsRef<Path>>(
    path: P,
    header: &[String],
    rows: &[Vec<String>],
) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let csv_err = |source: csv::Error| Error::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(UTF8_BOM.to_vec());

    if !header.is_empty() {
        writer.write_record(header).map_err(csv_err)?;
    }
    for row in rows {
        writer.write_record(row).map_err(csv_err)?;
    }

    writer.into_inner().map_err(|e| Error::FileWrite {
        path: path.to_path_buf(),
        source: e.into_error(),
    })
}

/// Write `bytes` to `path` in one operation
pub fn write_bytes<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, bytes).map_err(|e| Error::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write the report as a BOM-prefixed CSV file
pub fn write_report<P: AsRef<Path>>(path: P, records: &[AggregatedRecord]) -> Result<()> {
    let path = path.as_ref();
    let (header, rows) = report_rows(records);
    let bytes = encode_csv(path, &header, &rows)?;
    write_bytes(path, &bytes)?;

    info!(rows = records.len(), path = %path.display(), "wrote CSV report");
    Ok(())
}

/// Write the report as a JSON array
pub fn write_report_json<P: AsRef<Path>>(path: P, records: &[AggregatedRecord]) -> Result<()> {
    let path = path.as_ref();
    let mut content = serde_json::to_string_pretty(records)?;
    content.push('\n');
    write_bytes(path, content.as_bytes())?;

    info!(rows = records.len(), path = %path.display(), "wrote JSON report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Price;
    use std::path::PathBuf;

    fn row(land: &str, item: &str, enchantments: &str, owner: &str) -> AggregatedRecord {
        AggregatedRecord {
            owner: owner.to_string(),
            land: land.to_string(),
            item: item.to_string(),
            enchantments: enchantments.to_string(),
            total_stock: 10,
            left_stock: 3446,
            buy_price: Price::from_cents(1250),
            sell_price: Price::ZERO,
            repair_cost_display: None,
            merged_count: 1,
            has_enchantments: !enchantments.is_empty(),
        }
    }

    fn tmp_path(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("abex_report_{}_{}", std::process::id(), name));
        p
    }

    #[test]
    fn test_sort_report() {
        let mut rows = vec![
            row("B", "x", "", "1"),
            row("A", "y", "", "2"),
            row("A", "x", "Sharpness V", "3"),
            row("A", "x", "", "4"),
        ];

        sort_report(&mut rows);
        let owners: Vec<&str> = rows.iter().map(|r| r.owner.as_str()).collect();
        assert_eq!(owners, vec!["4", "3", "2", "1"]);
    }

    #[test]
    fn test_sort_report_is_stable() {
        let mut rows = vec![row("A", "x", "", "first"), row("A", "x", "", "second")];
        sort_report(&mut rows);
        assert_eq!(rows[0].owner, "first");
        assert_eq!(rows[1].owner, "second");
    }

    #[test]
    fn test_report_row_formatting() {
        let mut record = row("A", "Bow", "Power V", "Steve");
        record.repair_cost_display = Some(2);

        assert_eq!(
            report_row(&record),
            vec!["Steve", "A", "Bow", "Power V", "10", "3446", "12.5", "0.0", "2", "1"]
        );
    }

    #[test]
    fn test_write_report_has_bom_and_header() {
        let path = tmp_path("bom.csv");
        write_report(&path, &[row("A", "Stone, smooth", "", "Steve")]).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Owner,Land,Item,Enchantments,Stock,Left Stock,Buy Price,Sell Price,Repair Cost,Merged Count")
        );
        assert_eq!(lines.next(), Some("Steve,A,\"Stone, smooth\",,10,3446,12.5,0.0,,1"));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_write_report_json() {
        let path = tmp_path("report.json");
        write_report_json(&path, &[row("A", "Bow", "", "Steve")]).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["Owner"], "Steve");
        assert_eq!(value[0]["Buy Price"], 12.5);
        assert!(value[0]["Repair Cost"].is_null());
        assert!(value[0].get("has_enchantments").is_none());
        assert_eq!(value[0].as_object().map(|o| o.len()), Some(REPORT_HEADER.len()));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_write_report_fails_for_missing_directory() {
        let path = tmp_path("missing_dir").join("out.csv");
        let err = write_report(&path, &[]).unwrap_err();
        assert!(matches!(err, Error::FileWrite { .. }));
    }
}
