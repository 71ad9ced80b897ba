//! CSV input/output for workload tables
//!
//! Reads a header + rows into `WorkloadRow` maps and writes augmented
//! rows back out in a stable column order (the input columns as given,
//! then the appended recommendation columns). Handles RFC 4180 quoting
//! both ways; cells without commas, quotes, or newlines are written
//! bare.

use std::path::Path;

use crate::error::{CloudmatchError, Result};
use crate::orchestrator::WorkloadRow;

/// A parsed workload file: column order plus one map per row.
#[derive(Debug, Clone)]
pub struct WorkloadTable {
    pub columns: Vec<String>,
    pub rows: Vec<WorkloadRow>,
}

pub fn read_workloads(path: &Path) -> Result<WorkloadTable> {
    let content = std::fs::read_to_string(path)?;
    parse_workloads(&content)
}

pub fn parse_workloads(content: &str) -> Result<WorkloadTable> {
    let mut records = parse_records(content)?;
    if records.is_empty() {
        return Err(CloudmatchError::Workload {
            field: "input".to_string(),
            reason: "workload file has no header row".to_string(),
        });
    }

    let columns: Vec<String> = records.remove(0);
    let rows = records
        .into_iter()
        .map(|record| {
            // Short rows leave trailing columns absent; extra cells are
            // dropped with the header as the authority.
            columns
                .iter()
                .zip(record)
                .map(|(column, value)| (column.clone(), value))
                .collect::<WorkloadRow>()
        })
        .collect();

    Ok(WorkloadTable { columns, rows })
}

/// Write rows under `columns`; cells absent from a row become empty.
pub fn write_workloads(path: &Path, columns: &[String], rows: &[WorkloadRow]) -> Result<()> {
    let mut out = String::new();
    append_record(&mut out, columns.iter().map(String::as_str));
    for row in rows {
        append_record(
            &mut out,
            columns
                .iter()
                .map(|column| row.get(column).map(String::as_str).unwrap_or("")),
        );
    }
    std::fs::write(path, out)?;
    Ok(())
}

fn append_record<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>) {
    let mut first = true;
    for cell in cells {
        if !first {
            out.push(',');
        }
        first = false;
        if cell.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push('\n');
}

/// Quote-aware record split. Blank lines between records are skipped.
fn parse_records(content: &str) -> Result<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    cell.push('"');
                }
                '"' => in_quotes = false,
                _ => cell.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut cell)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(std::mem::take(&mut cell));
                if record.len() > 1 || !record[0].is_empty() {
                    records.push(std::mem::take(&mut record));
                } else {
                    record.clear();
                }
            }
            _ => cell.push(c),
        }
    }

    if in_quotes {
        return Err(CloudmatchError::Workload {
            field: "input".to_string(),
            reason: "unterminated quoted cell".to_string(),
        });
    }
    if !cell.is_empty() || !record.is_empty() {
        record.push(cell);
        records.push(record);
    }

    Ok(records)
}
