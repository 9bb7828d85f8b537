//! abex-core: Core library for turning shop chat logs into reports
//!
//! This library provides functionality to:
//! - Read chat logs written as UTF-8 or Big5
//! - Classify log lines and scan owner blocks into shop listings
//! - Merge repeated sightings of a listing and derive stock and repair fields
//! - Sort and export the report as CSV or JSON
//! - Apply a find/replace mapping table to an exported report

pub mod aggregate;
pub mod classify;
pub mod error;
pub mod input;
pub mod mapping;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod scanner;

pub use aggregate::{aggregate, repair_cost_display, SlotCapacity};
pub use classify::{classify, strip_color_codes, LineKind};
pub use error::{Error, Result};
pub use input::read_log_lines;
pub use mapping::{read_csv_rows, MappingRule, MappingTable};
pub use pipeline::{build_report, build_report_from_file};
pub use record::{AggregatedRecord, MergeKey, Price, RawShopRecord};
pub use report::{report_rows, sort_report, write_report, write_report_json, REPORT_HEADER};
pub use scanner::{scan_block, scan_lines, BlockScan};
