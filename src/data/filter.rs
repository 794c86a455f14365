use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::model::{CellValue, ColumnKind, ColumnStore, Row};
use super::schema::{EMPLOYMENT_STATUS, GOOD_CANDIDATE, STATUS};
use crate::error::{BrowserError, Result};

// ---------------------------------------------------------------------------
// Operator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    NotIn,
    Greater,
    GreaterEq,
    Less,
    LessEq,
}

impl Operator {
    /// In the order the operator picker lists them.
    pub const ALL: [Operator; 8] = [
        Operator::Equals,
        Operator::NotEquals,
        Operator::Contains,
        Operator::NotIn,
        Operator::Greater,
        Operator::GreaterEq,
        Operator::Less,
        Operator::LessEq,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "does not equal",
            Operator::Contains => "contains",
            Operator::NotIn => "not in",
            Operator::Greater => ">",
            Operator::GreaterEq => ">=",
            Operator::Less => "<",
            Operator::LessEq => "<=",
        }
    }

    /// `contains` and `not in` take a set of values.
    pub fn takes_set(&self) -> bool {
        matches!(self, Operator::Contains | Operator::NotIn)
    }

    fn is_ordering(&self) -> bool {
        matches!(
            self,
            Operator::Greater | Operator::GreaterEq | Operator::Less | Operator::LessEq
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = BrowserError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| BrowserError::Validation(format!("unknown operator '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Scalar / FilterValue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

impl Scalar {
    /// Numeric when the text parses as a number, text otherwise.
    pub fn coerce(raw: &str) -> Scalar {
        let s = raw.trim();
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() => Scalar::Number(v),
            _ => Scalar::Text(s.to_string()),
        }
    }

    fn matches(&self, cell: &CellValue) -> bool {
        match (self, cell) {
            (Scalar::Number(a), CellValue::Number(b)) => a == b,
            (Scalar::Text(a), CellValue::Text(b)) => a == b,
            _ => false,
        }
    }

    fn kind(&self) -> ColumnKind {
        match self {
            Scalar::Number(_) => ColumnKind::Numeric,
            Scalar::Text(_) => ColumnKind::Text,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(v) => write!(f, "{v}"),
            Scalar::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Scalar(Scalar),
    Set(Vec<Scalar>),
}

impl FilterValue {
    /// Build a value from form text: whitespace-separated for set operators.
    /// A set becomes numeric only when every element parses.
    pub fn from_input(op: Operator, raw: &str) -> FilterValue {
        if op.takes_set() {
            FilterValue::Set(coerce_all(raw.split_whitespace()))
        } else {
            FilterValue::Scalar(Scalar::coerce(raw))
        }
    }
}

/// All-or-nothing numeric coercion of a list of tokens.
pub(crate) fn coerce_all<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Vec<Scalar> {
    let tokens: Vec<&str> = tokens.into_iter().collect();
    let numbers: Option<Vec<Scalar>> = tokens
        .iter()
        .map(|t| match t.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Some(Scalar::Number(v)),
            _ => None,
        })
        .collect();
    numbers.unwrap_or_else(|| {
        tokens
            .iter()
            .map(|t| Scalar::Text(t.trim().to_string()))
            .collect()
    })
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Scalar(s) => write!(f, "{s}"),
            FilterValue::Set(items) => {
                let joined: Vec<String> = items.iter().map(|s| s.to_string()).collect();
                write!(f, "[{}]", joined.join(", "))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// FilterPredicate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct FilterPredicate {
    pub column: String,
    pub operator: Operator,
    pub value: FilterValue,
}

impl FilterPredicate {
    /// Fails when the value shape does not fit the operator.
    pub fn new(column: impl Into<String>, operator: Operator, value: FilterValue) -> Result<Self> {
        let column = column.into();
        let shape_ok = match &value {
            FilterValue::Set(_) => operator.takes_set(),
            FilterValue::Scalar(_) => !operator.takes_set(),
        };
        if !shape_ok {
            return Err(BrowserError::Validation(format!(
                "'{operator}' on '{column}' needs {}",
                if operator.takes_set() {
                    "a list of values"
                } else {
                    "a single value"
                }
            )));
        }
        Ok(Self {
            column,
            operator,
            value,
        })
    }

    pub fn scalar(column: &str, operator: Operator, value: Scalar) -> Result<Self> {
        Self::new(column, operator, FilterValue::Scalar(value))
    }
}

impl fmt::Display for FilterPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.column, self.operator, self.value)
    }
}

/// The three housekeeping filters run after a fresh import.
pub fn scrub_predicates() -> Vec<FilterPredicate> {
    let text = |s: &str| FilterValue::Scalar(Scalar::Text(s.to_string()));
    vec![
        FilterPredicate {
            column: STATUS.into(),
            operator: Operator::Equals,
            value: text("Active"),
        },
        FilterPredicate {
            column: GOOD_CANDIDATE.into(),
            operator: Operator::NotEquals,
            value: text("Poor"),
        },
        FilterPredicate {
            column: EMPLOYMENT_STATUS.into(),
            operator: Operator::NotEquals,
            value: text("Employee"),
        },
    ]
}

// ---------------------------------------------------------------------------
// Applying predicates
// ---------------------------------------------------------------------------

/// Result of one predicate application.
#[derive(Debug, Clone)]
pub struct Filtered {
    pub store: ColumnStore,
    pub before: usize,
    pub after: usize,
}

/// Narrow `store` by one predicate. The input store is left untouched.
pub fn apply(store: &ColumnStore, predicate: &FilterPredicate) -> Result<Filtered> {
    let col = store
        .column_index(&predicate.column)
        .ok_or_else(|| BrowserError::UnknownColumn(predicate.column.clone()))?;

    if let (true, FilterValue::Scalar(operand)) = (predicate.operator.is_ordering(), &predicate.value)
    {
        check_orderable(store, predicate, operand)?;
    }

    let keep = |row: &Row| row_passes(&row[col], predicate.operator, &predicate.value);
    let narrowed = store.retain_rows(keep);
    log::info!("Filtered by '{predicate}'");
    log::info!("Remaining candidates: {}", narrowed.len());

    Ok(Filtered {
        before: store.len(),
        after: narrowed.len(),
        store: narrowed,
    })
}

fn check_orderable(store: &ColumnStore, predicate: &FilterPredicate, operand: &Scalar) -> Result<()> {
    let kind = store.column_kind(&predicate.column).unwrap_or(ColumnKind::Empty);
    if kind == ColumnKind::Empty || kind == operand.kind() {
        return Ok(());
    }
    let described = match kind {
        ColumnKind::Numeric => "numeric",
        ColumnKind::Text => "text",
        _ => "mixed text and numeric",
    };
    let operand_kind = match operand {
        Scalar::Number(_) => "a number",
        Scalar::Text(_) => "text",
    };
    Err(BrowserError::TypeMismatch {
        column: predicate.column.clone(),
        operator: predicate.operator.to_string(),
        detail: format!("column holds {described} values but the search term is {operand_kind}"),
    })
}

fn row_passes(cell: &CellValue, op: Operator, value: &FilterValue) -> bool {
    match (op, value) {
        (Operator::Equals, FilterValue::Scalar(s)) => s.matches(cell),
        (Operator::NotEquals, FilterValue::Scalar(s)) => !s.matches(cell),
        (Operator::Contains, FilterValue::Set(items)) => items.iter().any(|s| s.matches(cell)),
        (Operator::NotIn, FilterValue::Set(items)) => !items.iter().any(|s| s.matches(cell)),
        (op, FilterValue::Scalar(s)) if op.is_ordering() => match compare(cell, s) {
            Some(ord) => match op {
                Operator::Greater => ord == Ordering::Greater,
                Operator::GreaterEq => ord != Ordering::Less,
                Operator::Less => ord == Ordering::Less,
                _ => ord != Ordering::Greater,
            },
            None => false,
        },
        _ => false,
    }
}

fn compare(cell: &CellValue, operand: &Scalar) -> Option<Ordering> {
    match (cell, operand) {
        (CellValue::Number(a), Scalar::Number(b)) => a.partial_cmp(b),
        (CellValue::Text(a), Scalar::Text(b)) => Some(a.as_str().cmp(b.as_str())),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FilterStep {
    pub predicate: FilterPredicate,
    pub before: usize,
    pub after: usize,
}

/// Outcome of running predicates in order. `store` reflects every step that
/// succeeded; `error` is the failure that stopped the batch, if any.
#[derive(Debug)]
pub struct BatchOutcome {
    pub store: ColumnStore,
    pub initial: usize,
    pub steps: Vec<FilterStep>,
    pub error: Option<BrowserError>,
}

impl BatchOutcome {
    /// Human-readable transcript of the batch.
    pub fn transcript(&self) -> Vec<String> {
        let mut lines = vec![format!("Candidates before filtering: {}", self.initial)];
        for step in &self.steps {
            lines.push(format!(
                "Filtering by: {} {} {}...\nRemaining Candidates: {}",
                step.predicate.column, step.predicate.operator, step.predicate.value, step.after
            ));
        }
        if let Some(err) = &self.error {
            lines.push(format!("Stopped: {err}"));
        }
        lines
    }
}

/// Apply predicates one after another, each seeing the previous result.
/// Stops at the first failure and keeps what was already applied.
pub fn apply_batch(store: ColumnStore, predicates: &[FilterPredicate]) -> BatchOutcome {
    let mut outcome = BatchOutcome {
        initial: store.len(),
        store,
        steps: Vec::new(),
        error: None,
    };
    for predicate in predicates {
        match apply(&outcome.store, predicate) {
            Ok(filtered) => {
                outcome.steps.push(FilterStep {
                    predicate: predicate.clone(),
                    before: filtered.before,
                    after: filtered.after,
                });
                outcome.store = filtered.store;
            }
            Err(e) => {
                log::error!("Filtering by '{predicate}' failed: {e}");
                outcome.error = Some(e);
                break;
            }
        }
    }
    outcome
}

// ---------------------------------------------------------------------------
// Filter form rows
// ---------------------------------------------------------------------------

/// Number of filter rows the form offers.
pub const FILTER_SLOTS: usize = 6;

/// Raw text of one attribute / operator / value row in the filter form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterRow {
    pub attribute: String,
    pub operator: String,
    pub value: String,
}

impl FilterRow {
    pub fn is_blank(&self) -> bool {
        self.attribute.trim().is_empty()
            && self.operator.trim().is_empty()
            && self.value.trim().is_empty()
    }

    fn is_complete(&self) -> bool {
        !self.attribute.trim().is_empty()
            && !self.operator.trim().is_empty()
            && !self.value.trim().is_empty()
    }
}

/// Turn form rows into predicates. Blank rows are allowed only after the last
/// populated one; a partially filled row rejects the whole form.
pub fn predicates_from_rows(rows: &[FilterRow]) -> Result<Vec<FilterPredicate>> {
    let mut predicates = Vec::new();
    let mut seen_blank = false;
    for row in rows {
        if row.is_blank() {
            seen_blank = true;
            continue;
        }
        if !row.is_complete() {
            return Err(BrowserError::Validation(
                "There are missing values! Please provide all filter parameters for a given row."
                    .into(),
            ));
        }
        if seen_blank {
            return Err(BrowserError::Validation(
                "One or more rows has been skipped! There cannot be empty rows between rows with values."
                    .into(),
            ));
        }
        let operator: Operator = row.operator.parse()?;
        predicates.push(FilterPredicate::new(
            row.attribute.trim(),
            operator,
            FilterValue::from_input(operator, &row.value),
        )?);
    }
    Ok(predicates)
}
