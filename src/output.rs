use crate::types::{ExportRow, Record};
use anyhow::Result;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Print a report header followed by a markdown preview of the first rows.
pub fn preview_table<T>(report_no: usize, title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("Report {}: {}", report_no, title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    preview_table_rows(rows, max_rows);
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

/// Filename for a filtered-data export, stamped to the second so repeated
/// exports in one session do not clobber each other.
pub fn export_filename(now: &DateTime<Local>) -> String {
    format!("dados_filtrados_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// Serialize the current view back to CSV next to the report files.
/// Returns the path written.
pub fn export_filtered(dir: &Path, view: &[&Record]) -> Result<PathBuf> {
    let path = dir.join(export_filename(&Local::now()));
    let mut wtr = csv::Writer::from_path(&path)?;
    for r in view {
        wtr.serialize(ExportRow::from(*r))?;
    }
    wtr.flush()?;
    Ok(path)
}
