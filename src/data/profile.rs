use super::model::{CellValue, ColumnStore, MISSING_MARKER};
use super::schema;

/// Display fields for the selected subject. Anything absent reads `-`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectProfile {
    pub age: String,
    pub miles_away: String,
    pub smartphone_type: String,
    pub will_not_wear: String,
    pub study_info: String,
    pub study_dates: String,
    pub right_style: String,
    pub left_style: String,
    pub right_coupling: String,
    pub left_coupling: String,
    pub right_receiver: String,
    pub left_receiver: String,
}

/// Collect the profile fields for `subject_id`, or `None` when the subject is
/// not in `store`.
pub fn subject_profile(store: &ColumnStore, subject_id: &CellValue) -> Option<SubjectProfile> {
    let row = store.find_row(schema::SUBJECT_ID, subject_id)?;
    let text = |column: &str| {
        store
            .value(row, column)
            .map_or_else(|| MISSING_MARKER.to_string(), |v| v.to_string())
    };
    let whole = |column: &str| match store.value(row, column) {
        Some(CellValue::Number(v)) => format!("{}", v.trunc() as i64),
        _ => MISSING_MARKER.to_string(),
    };

    let (study_info, study_dates) = match store.value(row, schema::LATEST_STUDY) {
        Some(CellValue::Text(s)) => split_latest_study(s),
        _ => (MISSING_MARKER.to_string(), MISSING_MARKER.to_string()),
    };

    Some(SubjectProfile {
        age: whole(schema::AGE),
        miles_away: whole(schema::MILES_AWAY),
        smartphone_type: text(schema::SMARTPHONE_TYPE),
        will_not_wear: text(schema::WILL_NOT_WEAR),
        study_info,
        study_dates,
        right_style: text(schema::RIGHT_STYLE),
        left_style: text(schema::LEFT_STYLE),
        right_coupling: text(schema::RIGHT_EARMOLD_STYLE),
        left_coupling: text(schema::LEFT_EARMOLD_STYLE),
        right_receiver: whole(schema::RIGHT_RIC_CABLE),
        left_receiver: whole(schema::LEFT_RIC_CABLE),
    })
}

/// `"Comfort Trial (01/2023 - 03/2023)"` → `("Comfort Trial", "01/2023 - 03/2023")`.
fn split_latest_study(raw: &str) -> (String, String) {
    let info = raw.split('(').next().unwrap_or("").trim().to_string();
    let dates = raw
        .split('(')
        .skip(1)
        .find(|part| part.contains(')'))
        .and_then(|part| part.split(')').next())
        .map(|d| d.trim().to_string())
        .unwrap_or_else(|| MISSING_MARKER.to_string());
    (info, dates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_study_is_split_into_info_and_dates() {
        assert_eq!(
            split_latest_study("Comfort Trial (01/2023 - 03/2023)"),
            ("Comfort Trial".to_string(), "01/2023 - 03/2023".to_string())
        );
        assert_eq!(
            split_latest_study("Pilot"),
            ("Pilot".to_string(), "-".to_string())
        );
        assert_eq!(
            split_latest_study("A (x (2021)"),
            ("A".to_string(), "2021".to_string())
        );
    }

    #[test]
    fn profile_fields_fall_back_to_marker() {
        let store = ColumnStore::new(
            vec![
                schema::SUBJECT_ID.into(),
                schema::AGE.into(),
                schema::SMARTPHONE_TYPE.into(),
                schema::LATEST_STUDY.into(),
                schema::RIGHT_RIC_CABLE.into(),
            ],
            vec![vec![
                CellValue::Number(12.0),
                CellValue::Number(71.0),
                CellValue::Missing,
                CellValue::Text("Sound Study (2022)".into()),
                CellValue::Number(3.0),
            ]],
        )
        .unwrap();

        let p = subject_profile(&store, &CellValue::Number(12.0)).unwrap();
        assert_eq!(p.age, "71");
        assert_eq!(p.smartphone_type, "-");
        assert_eq!(p.study_info, "Sound Study");
        assert_eq!(p.study_dates, "2022");
        assert_eq!(p.right_receiver, "3");
        // columns this store never had
        assert_eq!(p.left_receiver, "-");
        assert_eq!(p.right_style, "-");

        assert!(subject_profile(&store, &CellValue::Number(13.0)).is_none());
    }
}
