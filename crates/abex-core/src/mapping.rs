//! Find/replace substitution over an exported table
//!
//! A mapping table is a CSV file of `find,replace` rows. Rules are applied
//! to every cell in table order, as plain substring replacement. A rule can
//! match text produced by an earlier rule, so the order of the table
//! matters and is kept exactly.

use crate::error::{Error, Result};
use crate::report::{encode_csv, write_bytes};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// A single find/replace rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRule {
    pub find: String,
    pub replace: String,
}

/// Ordered find/replace rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    rules: Vec<MappingRule>,
    positions: HashMap<String, usize>,
}

impl MappingTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule. A repeated find key keeps its original position and
    /// takes the new replacement.
    pub fn insert(&mut self, find: impl Into<String>, replace: impl Into<String>) {
        let find = find.into();
        let replace = replace.into();

        match self.positions.get(&find) {
            Some(&pos) => self.rules[pos].replace = replace,
            None => {
                self.positions.insert(find.clone(), self.rules.len());
                self.rules.push(MappingRule { find, replace });
            }
        }
    }

    /// Rules in application order
    pub fn rules(&self) -> &[MappingRule] {
        &self.rules
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True if there are no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Build a table from CSV rows; only the first two columns are used and
    /// shorter rows are skipped
    pub fn from_rows<I, R>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[String]>,
    {
        let mut table = Self::new();
        for row in rows {
            if let [find, replace, ..] = row.as_ref() {
                table.insert(find.as_str(), replace.as_str());
            }
        }
        table
    }

    /// Load a mapping table from a CSV file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let rows = read_csv_rows(path)?;
        let table = Self::from_rows(&rows);

        debug!(rules = table.len(), path = %path.display(), "loaded mapping table");
        Ok(table)
    }

    /// Apply every rule, in order, to `text`
    pub fn apply(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_string(), |acc, rule| acc.replace(&rule.find, &rule.replace))
    }

    /// Apply the rules to every cell, keeping the row and column shape
    pub fn substitute_rows(&self, rows: &[Vec<String>]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|cell| self.apply(cell)).collect())
            .collect()
    }

    /// Rewrite the table at `input` and write the result to `output`
    ///
    /// Returns the number of rows written.
    pub fn substitute_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
    ) -> Result<usize> {
        let input = input.as_ref();
        let output = output.as_ref();

        let rows = read_csv_rows(input)?;
        let substituted = self.substitute_rows(&rows);
        let bytes = encode_csv(output, &[], &substituted)?;
        write_bytes(output, &bytes)?;

        info!(
            rows = substituted.len(),
            rules = self.len(),
            path = %output.display(),
            "wrote substituted table"
        );
        Ok(substituted.len())
    }
}

/// Read every row of a CSV file as strings, header row included
///
/// Rows may have different widths. A leading UTF-8 BOM is dropped. Blank
/// lines come back as empty rows, so a rewritten table keeps its row count.
pub fn read_csv_rows<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<String>>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let content = bytes.strip_prefix(crate::report::UTF8_BOM).unwrap_or(&bytes[..]);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content);
    let mut records = reader.records().map(|result| {
        result
            .map(|record| record.iter().map(str::to_string).collect::<Vec<_>>())
            .map_err(|e| Error::Csv {
                path: path.to_path_buf(),
                source: e,
            })
    });

    // The csv reader skips blank lines; put them back where they were
    let mut rows = Vec::new();
    for blank in line_layout(content) {
        if blank {
            rows.push(Vec::new());
        } else if let Some(record) = records.next() {
            rows.push(record?);
        }
    }
    for record in records {
        rows.push(record?);
    }
    Ok(rows)
}

/// One entry per physical row of `content`: `true` for a blank line,
/// `false` for a record. Line breaks inside quoted fields do not start a
/// new row.
fn line_layout(content: &[u8]) -> Vec<bool> {
    let mut layout = Vec::new();
    let mut i = 0;

    while i < content.len() {
        if let Some(len) = line_break(content, i) {
            layout.push(true);
            i += len;
            continue;
        }

        layout.push(false);
        let mut field_start = true;
        let mut in_quotes = false;

        while i < content.len() {
            let b = content[i];
            if in_quotes {
                if b == b'"' {
                    if content.get(i + 1) == Some(&b'"') {
                        i += 2;
                        continue;
                    }
                    in_quotes = false;
                }
                i += 1;
                continue;
            }

            if let Some(len) = line_break(content, i) {
                i += len;
                break;
            }
            match b {
                b'"' if field_start => in_quotes = true,
                b',' => {
                    field_start = true;
                    i += 1;
                    continue;
                }
                _ => {}
            }
            field_start = false;
            i += 1;
        }
    }

    layout
}

/// Length of the line terminator at `i` (`\r\n`, `\r` or `\n`), if any
fn line_break(content: &[u8], i: usize) -> Option<usize> {
    match content.get(i)? {
        b'\n' => Some(1),
        b'\r' if content.get(i + 1) == Some(&b'\n') => Some(2),
        b'\r' => Some(1),
        _ => None,
    }
}
