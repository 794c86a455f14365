//! Filter-definition files.
//!
//! One CSV column per filter slot. The header row holds the slot numbers, then
//! three rows follow: attribute, operator, value. Set values are written as a
//! list literal such as `['RIC', 'BTE']` or `[60, 70]`.

use std::io::{Read, Write};
use std::path::Path;

use super::filter::{coerce_all, FilterPredicate, FilterValue, Operator, Scalar};
use crate::error::{BrowserError, Result};

pub fn export_filters(predicates: &[FilterPredicate], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_filters(predicates, file)?;
    log::info!("Filters successfully written to {}", path.display());
    Ok(())
}

pub fn import_filters(path: &Path) -> Result<Vec<FilterPredicate>> {
    let file = std::fs::File::open(path)?;
    let predicates = read_filters(file)?;
    log::info!("Imported {} filters from {}", predicates.len(), path.display());
    Ok(predicates)
}

pub fn write_filters<W: Write>(predicates: &[FilterPredicate], writer: W) -> Result<()> {
    if predicates.is_empty() {
        return Err(BrowserError::Validation(
            "No filter values to save! Cannot export an empty filter list.".into(),
        ));
    }
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record((0..predicates.len()).map(|i| i.to_string()))?;
    csv_writer.write_record(predicates.iter().map(|p| p.column.as_str()))?;
    csv_writer.write_record(predicates.iter().map(|p| p.operator.as_str()))?;
    csv_writer.write_record(predicates.iter().map(|p| encode_value(&p.value)))?;
    csv_writer.flush()?;
    Ok(())
}

pub fn read_filters<R: Read>(reader: R) -> Result<Vec<FilterPredicate>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let slots = csv_reader.headers()?.len();
    let rows: Vec<csv::StringRecord> = csv_reader.records().collect::<std::result::Result<_, _>>()?;
    if rows.len() < 3 {
        return Err(BrowserError::Parse(format!(
            "filter file needs attribute, operator and value rows, found {} rows",
            rows.len()
        )));
    }

    (0..slots)
        .map(|slot| {
            let cell = |r: usize| rows[r].get(slot).unwrap_or("").trim();
            let operator: Operator = cell(1).parse()?;
            let value = if operator.takes_set() {
                FilterValue::Set(decode_list(cell(2))?)
            } else {
                FilterValue::Scalar(Scalar::coerce(cell(2)))
            };
            FilterPredicate::new(cell(0), operator, value)
        })
        .collect()
}

fn encode_value(value: &FilterValue) -> String {
    match value {
        FilterValue::Scalar(s) => s.to_string(),
        FilterValue::Set(items) => {
            let parts: Vec<String> = items
                .iter()
                .map(|s| match s {
                    Scalar::Number(v) => v.to_string(),
                    Scalar::Text(t) => format!("'{}'", t.replace('\\', "\\\\").replace('\'', "\\'")),
                })
                .collect();
            format!("[{}]", parts.join(", "))
        }
    }
}

/// Parse a list literal. Quoted items may contain commas; `\` escapes the
/// next character inside quotes.
fn decode_list(raw: &str) -> Result<Vec<Scalar>> {
    let inner = raw
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| BrowserError::Parse(format!("expected a list like ['a', 'b'], got '{raw}'")))?;

    let mut items: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(_), '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => quote = Some(c),
            (None, ',') => items.push(std::mem::take(&mut current)),
            (None, c) if c.is_whitespace() => {}
            (None, c) => current.push(c),
        }
    }
    if quote.is_some() {
        return Err(BrowserError::Parse(format!("unterminated quote in '{raw}'")));
    }
    if !current.is_empty() || !items.is_empty() {
        items.push(current);
    }
    Ok(coerce_all(items.iter().map(String::as_str)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn predicates() -> Vec<FilterPredicate> {
        vec![
            FilterPredicate::scalar("Status", Operator::Equals, Scalar::Text("Active".into())).unwrap(),
            FilterPredicate::scalar("Age", Operator::LessEq, Scalar::Number(75.0)).unwrap(),
            FilterPredicate::new(
                "RightStyle",
                Operator::NotIn,
                FilterValue::Set(vec![Scalar::Text("BTE".into()), Scalar::Text("In, Canal".into())]),
            )
            .unwrap(),
            FilterPredicate::new(
                "Left Ric Cable Size",
                Operator::Contains,
                FilterValue::Set(vec![Scalar::Number(1.0), Scalar::Number(2.5)]),
            )
            .unwrap(),
        ]
    }

    #[test]
    fn export_then_import_reproduces_predicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filters.csv");
        export_filters(&predicates(), &path).unwrap();
        assert_eq!(import_filters(&path).unwrap(), predicates());
    }

    #[test]
    fn file_layout_is_one_column_per_slot() {
        let mut buf = Vec::new();
        write_filters(&predicates()[..2], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "0,1\nStatus,Age\nequals,<=\nActive,75\n");
    }

    #[test]
    fn list_literals_written_by_other_tools_are_read() {
        let csv = "0\nRightStyle\ncontains\n\"['RIC', \"\"ITE\"\"]\"\n";
        let preds = read_filters(csv.as_bytes()).unwrap();
        assert_eq!(
            preds[0].value,
            FilterValue::Set(vec![Scalar::Text("RIC".into()), Scalar::Text("ITE".into())])
        );

        let csv = "0\nAge\nnot in\n\"[60.0, 70.0]\"\n";
        let preds = read_filters(csv.as_bytes()).unwrap();
        assert_eq!(
            preds[0].value,
            FilterValue::Set(vec![Scalar::Number(60.0), Scalar::Number(70.0)])
        );
    }

    #[test]
    fn numeric_strings_in_lists_are_coerced() {
        let csv = "0\nAge\ncontains\n\"['60', '70']\"\n";
        let preds = read_filters(csv.as_bytes()).unwrap();
        assert_eq!(
            preds[0].value,
            FilterValue::Set(vec![Scalar::Number(60.0), Scalar::Number(70.0)])
        );
    }

    #[test]
    fn empty_list_and_bad_input() {
        assert_eq!(decode_list("[]").unwrap(), vec![]);
        assert!(decode_list("RIC BTE").is_err());
        assert!(decode_list("['RIC]").is_err());
        assert!(matches!(
            write_filters(&[], Vec::new()),
            Err(BrowserError::Validation(_))
        ));
        assert!(read_filters("0\nAge\n".as_bytes()).is_err());
        assert!(read_filters("0\nAge\nabout\n5\n".as_bytes()).is_err());
    }
}
