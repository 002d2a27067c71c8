use crate::rules::CleaningRules;
use crate::types::{RawRow, Record, Weekday};
use crate::util::{parse_decimal, parse_i32_safe, parse_u32_safe, ratio};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Columns the loader insists on before reading any data row. Checked once
/// against the header, so row handling never has to re-validate presence.
const REQUIRED_COLUMNS: [&str; 10] = [
    "ROTA",
    "COD_ROTA",
    "CIDADE",
    "DIA_SEMANA",
    "MES",
    "SEMANA",
    "QUANTIDADE_NF",
    "QUDE_ITENS",
    "PESO_TOTAL",
    "VALOR_TOTAL",
];

/// Load failures that abort the whole run. Row-level problems never end up
/// here; they are recorded in the [`LoadReport`] and the load continues.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Cannot open input file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read CSV data: {0}")]
    Csv(#[from] csv::Error),

    #[error("Input file is missing required column {0}")]
    MissingColumn(String),
}

/// A row the loader dropped, with the 1-based line it came from.
#[derive(Debug, Clone)]
pub struct SkippedRow {
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub skipped: Vec<SkippedRow>,
}

impl LoadReport {
    pub fn parse_errors(&self) -> usize {
        self.skipped.len()
    }
}

pub fn load_and_clean(
    path: &Path,
    rules: &CleaningRules,
) -> Result<(Vec<Record>, LoadReport), LoadError> {
    let file = File::open(path).map_err(|e| LoadError::Open {
        path: path.display().to_string(),
        source: e,
    })?;
    load_from_reader(file, rules)
}

/// Core of the load: parse, clean, and derive. Split from the path-based
/// entry point so it can run against in-memory CSV data.
pub fn load_from_reader<R: Read>(
    input: R,
    rules: &CleaningRules,
) -> Result<(Vec<Record>, LoadReport), LoadError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(input);

    let headers = rdr.headers()?.clone();
    for col in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h.trim() == col) {
            return Err(LoadError::MissingColumn(col.to_string()));
        }
    }

    let mut report = LoadReport::default();
    let mut data: Vec<Record> = Vec::new();

    for (idx, result) in rdr.deserialize::<RawRow>().enumerate() {
        // Header occupies line 1; the first data row is line 2.
        let line = idx + 2;
        report.total_rows += 1;
        let raw = match result {
            Ok(r) => r,
            Err(e) => {
                skip(&mut report, line, format!("unreadable row: {}", e));
                continue;
            }
        };
        match clean_row(raw, rules) {
            Ok(record) => data.push(record),
            Err(reason) => skip(&mut report, line, reason),
        }
    }

    report.loaded_rows = data.len();
    Ok((data, report))
}

fn skip(report: &mut LoadReport, line: usize, reason: String) {
    debug!(line, %reason, "skipping row");
    report.skipped.push(SkippedRow { line, reason });
}

/// Turn one raw row into a clean record, or a reason it was dropped.
///
/// Cleanup order matters: categorical text is normalized through the rules
/// tables first, then the weekday is parsed, then numbers. The derived
/// ratios are computed last, with zero denominators mapped to `None`.
fn clean_row(raw: RawRow, rules: &CleaningRules) -> Result<Record, String> {
    let route = match raw.route.as_deref().map(str::trim) {
        Some(r) if !r.is_empty() => r.to_string(),
        _ => return Err("missing ROTA".to_string()),
    };
    let route_code = parse_i32_safe(raw.route_code.as_deref())
        .ok_or_else(|| "non-numeric COD_ROTA".to_string())?;
    let city = match raw.city.as_deref() {
        Some(c) if !c.trim().is_empty() => rules.normalize_city(c),
        _ => return Err("missing CIDADE".to_string()),
    };
    let weekday_name = raw
        .weekday
        .as_deref()
        .map(|d| rules.map_weekday(d))
        .ok_or_else(|| "missing DIA_SEMANA".to_string())?;
    let weekday = Weekday::parse(&weekday_name)
        .ok_or_else(|| format!("unknown DIA_SEMANA '{}'", weekday_name))?;
    let month =
        parse_u32_safe(raw.month.as_deref()).ok_or_else(|| "non-numeric MES".to_string())?;
    let week =
        parse_u32_safe(raw.week.as_deref()).ok_or_else(|| "non-numeric SEMANA".to_string())?;
    let invoices = parse_u32_safe(raw.invoices.as_deref())
        .ok_or_else(|| "non-numeric QUANTIDADE_NF".to_string())?;
    let items = parse_u32_safe(raw.items.as_deref())
        .ok_or_else(|| "non-numeric QUDE_ITENS".to_string())?;
    let weight = parse_decimal(raw.weight.as_deref())
        .ok_or_else(|| "non-numeric PESO_TOTAL".to_string())?;
    let value = parse_decimal(raw.value.as_deref())
        .ok_or_else(|| "non-numeric VALOR_TOTAL".to_string())?;

    Ok(Record {
        value_per_item: ratio(value, items as f64),
        weight_per_item: ratio(weight, items as f64),
        value_per_invoice: ratio(value, invoices as f64),
        route,
        route_code,
        city,
        weekday,
        month,
        week,
        invoices,
        items,
        weight,
        value,
    })
}
