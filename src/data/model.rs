use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{BrowserError, Result};

/// Marker written for a missing cell and shown in place of absent data.
pub const MISSING_MARKER: &str = "-";

// ---------------------------------------------------------------------------
// CellValue – a single cell of the subject table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell: numeric, text, or missing.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Missing,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Missing => 0,
                Number(_) => 1,
                Text(_) => 2,
            }
        }
        match (self, other) {
            (Number(a), Number(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Missing => write!(f, "{MISSING_MARKER}"),
        }
    }
}

impl CellValue {
    /// Infer a cell from raw CSV text. Empty text and the missing marker are
    /// both read as [`CellValue::Missing`].
    pub fn guess(raw: &str) -> Self {
        let s = raw.trim();
        if s.is_empty() || s == MISSING_MARKER {
            return CellValue::Missing;
        }
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() => CellValue::Number(v),
            _ => CellValue::Text(s.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// Numeric coercion: numbers pass, everything else becomes missing.
    pub fn to_numeric(&self) -> CellValue {
        match self {
            CellValue::Number(v) => CellValue::Number(*v),
            CellValue::Text(s) => match s.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => CellValue::Number(v),
                _ => CellValue::Missing,
            },
            CellValue::Missing => CellValue::Missing,
        }
    }
}

// ---------------------------------------------------------------------------
// ColumnKind – the type a column's non-missing cells share
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Text,
    Mixed,
    /// Every cell is missing.
    Empty,
}

// ---------------------------------------------------------------------------
// ColumnStore – the in-memory subject table
// ---------------------------------------------------------------------------

/// One subject record; cells are in column order.
pub type Row = Vec<CellValue>;

/// Rows × named columns. Column names are unique and every row is as wide as
/// the header.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStore {
    columns: Vec<String>,
    index: BTreeMap<String, usize>,
    rows: Vec<Row>,
}

impl ColumnStore {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Result<Self> {
        let mut index = BTreeMap::new();
        for (i, name) in columns.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(BrowserError::Parse(format!("duplicate column '{name}'")));
            }
        }
        if let Some((row_no, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(BrowserError::Parse(format!(
                "row {row_no} has {} cells but there are {} columns",
                row.len(),
                columns.len()
            )));
        }
        Ok(Self {
            columns,
            index,
            rows,
        })
    }

    /// Number of subjects.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Cell at `row` for the named column.
    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[col])
    }

    /// All cells of one column, top to bottom.
    pub fn column_values<'a>(&'a self, column: &str) -> Option<impl Iterator<Item = &'a CellValue> + 'a> {
        let col = self.column_index(column)?;
        Some(self.rows.iter().map(move |r| &r[col]))
    }

    /// Index of the first row whose `column` equals `key`.
    pub fn find_row(&self, column: &str, key: &CellValue) -> Option<usize> {
        let col = self.column_index(column)?;
        self.rows.iter().position(|r| &r[col] == key)
    }

    pub fn column_kind(&self, column: &str) -> Option<ColumnKind> {
        let mut kind = ColumnKind::Empty;
        for value in self.column_values(column)? {
            let cell_kind = match value {
                CellValue::Number(_) => ColumnKind::Numeric,
                CellValue::Text(_) => ColumnKind::Text,
                CellValue::Missing => continue,
            };
            kind = match kind {
                ColumnKind::Empty => cell_kind,
                k if k == cell_kind => k,
                _ => return Some(ColumnKind::Mixed),
            };
        }
        Some(kind)
    }

    /// Sorted distinct values of a column, without the missing marker.
    pub fn unique_values(&self, column: &str) -> Option<BTreeSet<CellValue>> {
        Some(
            self.column_values(column)?
                .filter(|v| !v.is_missing())
                .cloned()
                .collect(),
        )
    }

    /// A narrower store holding only the rows `keep` accepts.
    pub fn retain_rows(&self, mut keep: impl FnMut(&Row) -> bool) -> ColumnStore {
        ColumnStore {
            columns: self.columns.clone(),
            index: self.index.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Row> {
        &mut self.rows
    }

    pub(crate) fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        if from == to {
            return Ok(());
        }
        if !self.index.contains_key(from) {
            return Ok(());
        }
        if self.index.contains_key(to) {
            return Err(BrowserError::Parse(format!(
                "renaming '{from}' would duplicate column '{to}'"
            )));
        }
        let Some(i) = self.index.remove(from) else {
            return Ok(());
        };
        self.columns[i] = to.to_string();
        self.index.insert(to.to_string(), i);
        Ok(())
    }

    /// Append a column whose cells are computed from each existing row.
    pub(crate) fn push_column(
        &mut self,
        name: &str,
        mut derive: impl FnMut(&Row) -> CellValue,
    ) -> Result<()> {
        if self.index.contains_key(name) {
            return Err(BrowserError::Parse(format!("duplicate column '{name}'")));
        }
        for row in &mut self.rows {
            let v = derive(row);
            row.push(v);
        }
        self.index.insert(name.to_string(), self.columns.len());
        self.columns.push(name.to_string());
        Ok(())
    }
}
