use std::io::{Read, Write};
use std::path::Path;

use chrono::{Local, NaiveDate};

use super::model::{CellValue, ColumnStore, Row};
use super::schema::{self, AGE, DATE_OF_BIRTH, SUBJECT_ID};
use crate::error::{BrowserError, Result};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load and clean a full upstream export.
pub fn load_full(path: &Path) -> Result<ColumnStore> {
    let file = std::fs::File::open(path)?;
    let store = read_full(file, Local::now().date_naive())?;
    log::info!("Loaded database from {}", path.display());
    log::info!("Remaining candidates: {}", store.len());
    Ok(store)
}

/// Load a previously exported (already cleaned) dataset as-is.
pub fn load_filtered(path: &Path) -> Result<ColumnStore> {
    let file = std::fs::File::open(path)?;
    let store = read_filtered(file)?;
    log::info!("Loaded previously exported database from {}", path.display());
    log::info!("Remaining candidates: {}", store.len());
    Ok(store)
}

/// Write the current rows verbatim; missing cells become `-`.
pub fn export(store: &ColumnStore, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(store, file)?;
    log::info!("Wrote {} subjects to {}", store.len(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Full import
// ---------------------------------------------------------------------------

/// Clean a raw export read from `reader`. Ages are computed relative to `today`.
pub fn read_full<R: Read>(reader: R, today: NaiveDate) -> Result<ColumnStore> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    if headers.len() < schema::UPSTREAM_WIDTH {
        return Err(BrowserError::Parse(format!(
            "expected a full export with at least {} columns, found {}",
            schema::UPSTREAM_WIDTH,
            headers.len()
        )));
    }

    let columns: Vec<String> = schema::SELECTED_COLUMNS
        .iter()
        .map(|&i| headers[i].to_string())
        .collect();

    let mut rows: Vec<Row> = Vec::new();
    for (row_no, result) in csv_reader.records().enumerate() {
        let record = result?;
        if record.len() < schema::UPSTREAM_WIDTH {
            return Err(BrowserError::Parse(format!(
                "row {row_no} has {} cells, expected {}",
                record.len(),
                headers.len()
            )));
        }
        let row = schema::SELECTED_COLUMNS
            .iter()
            .map(|&i| upstream_cell(record.get(i).unwrap_or("")))
            .collect();
        rows.push(row);
    }

    let mut store = ColumnStore::new(columns, rows)?;
    for (from, to) in schema::RENAMES {
        store.rename_column(from, to)?;
    }

    let dob = required_column(&store, DATE_OF_BIRTH)?;
    store.push_column(AGE, |row| match &row[dob] {
        CellValue::Text(s) => age_from_birthdate(s, today).map_or(CellValue::Missing, |a| {
            CellValue::Number(a as f64)
        }),
        _ => CellValue::Missing,
    })?;

    let mut numeric: Vec<usize> = schema::NUMERIC_COLUMNS
        .iter()
        .copied()
        .filter(|&i| i < store.columns().len())
        .collect();
    let audiogram: Vec<usize> = store
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, name)| schema::is_audiogram_column(name))
        .map(|(i, _)| i)
        .collect();
    numeric.extend(audiogram.iter().copied());

    for row in store.rows_mut() {
        for &i in &numeric {
            row[i] = row[i].to_numeric();
        }
        for &i in &audiogram {
            if matches!(row[i], CellValue::Number(v) if v > schema::MAX_THRESHOLD_DB) {
                row[i] = CellValue::Missing;
            }
        }
    }

    let id = required_column(&store, SUBJECT_ID)?;
    store.rows_mut().sort_by(|a, b| match (&a[id], &b[id]) {
        (CellValue::Missing, CellValue::Missing) => std::cmp::Ordering::Equal,
        (CellValue::Missing, _) => std::cmp::Ordering::Greater,
        (_, CellValue::Missing) => std::cmp::Ordering::Less,
        (x, y) => x.cmp(y),
    });

    Ok(store)
}

fn upstream_cell(raw: &str) -> CellValue {
    if raw.trim() == schema::UPSTREAM_NULL {
        return CellValue::Missing;
    }
    CellValue::guess(raw)
}

fn required_column(store: &ColumnStore, name: &str) -> Result<usize> {
    store
        .column_index(name)
        .ok_or_else(|| BrowserError::Parse(format!("export is missing the '{name}' column")))
}

/// Whole years between a `M/D/YYYY` birthdate and `today`, counted as
/// `floor(days / 365.2425)`. This can roll over a day before the calendar
/// birthday.
///
/// Returns `None` for anything that does not parse as a real date.
pub fn age_from_birthdate(birthdate: &str, today: NaiveDate) -> Option<i64> {
    let mut parts = birthdate.trim().split('/');
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let year: i32 = parts.next()?.trim().parse().ok()?;
    let birth = NaiveDate::from_ymd_opt(year, month, day)?;
    let days = (today - birth).num_days();
    Some((days as f64 / 365.2425).floor() as i64)
}

// ---------------------------------------------------------------------------
// Filtered import / export
// ---------------------------------------------------------------------------

pub fn read_filtered<R: Read>(reader: R) -> Result<ColumnStore> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let columns: Vec<String> = csv_reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        rows.push(record.iter().map(CellValue::guess).collect());
    }
    ColumnStore::new(columns, rows)
}

pub fn write_csv<W: Write>(store: &ColumnStore, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(store.columns())?;
    for row in store.rows() {
        csv_writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    csv_writer.flush()?;
    Ok(())
}
