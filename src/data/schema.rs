//! Fixed layout of the upstream "General Search" export.
//!
//! The export is wide (205 columns) and only a positional subset is used. The
//! numeric list indexes the *reduced* table, with `Age` appended at the end.

/// Minimum width of a full export.
pub const UPSTREAM_WIDTH: usize = 205;

/// Source positions kept by a full import, in output order.
pub const SELECTED_COLUMNS: [usize; 85] = [
    0, 1, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26,
    27, 28, 29, 30, 31, 32, 33, 34, 35, 36, 38, 40, 42, 49, 51, 52, 74, 85, 86, 88, 90, 101, 102,
    103, 104, 109, 112, 113, 116, 121, 123, 124, 131, 132, 133, 134, 151, 154, 155, 158, 163, 164,
    165, 166, 170, 172, 173, 176, 177, 178, 179, 180, 185, 187, 189, 192, 196, 202, 204,
];

/// Positions in the reduced table (after `Age` is appended) coerced to numbers.
pub const NUMERIC_COLUMNS: [usize; 42] = [
    0, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31, 36, 40, 47,
    48, 49, 50, 51, 53, 56, 57, 59, 61, 62, 64, 66, 67, 68, 69, 71, 72, 85,
];

/// Headers the upstream system spells inconsistently.
pub const RENAMES: [(&str, &str); 8] = [
    ("L Pt Bc 1000", "LeftBC 1000"),
    ("L Pt Bc 2000", "LeftBC 2000"),
    ("L Pt Bc 4000", "LeftBC 4000"),
    ("L Pt Bc 500", "LeftBC 500"),
    ("RightBC  1000", "RightBC 1000"),
    ("RightBC  2000", "RightBC 2000"),
    ("RightBC  4000", "RightBC 4000"),
    ("Hearing AidUse", "Hearing Aid Use"),
];

/// Placeholder the upstream system writes for "no data".
pub const UPSTREAM_NULL: &str = "%null%";

/// Audiometer ceiling in dB HL; larger stored values are entry artifacts.
pub const MAX_THRESHOLD_DB: f64 = 120.0;

pub const SUBJECT_ID: &str = "Subject Id";
pub const DATE_OF_BIRTH: &str = "Date Of Birth";
pub const AGE: &str = "Age";
pub const STATUS: &str = "Status";
pub const GOOD_CANDIDATE: &str = "Good Candidate";
pub const EMPLOYMENT_STATUS: &str = "Employment Status";
pub const LATEST_STUDY: &str = "Latest Study";
pub const MILES_AWAY: &str = "Miles From Starkey";
pub const SMARTPHONE_TYPE: &str = "Smartphone Type";
pub const WILL_NOT_WEAR: &str = "Will Not Wear";
pub const RIGHT_STYLE: &str = "RightStyle";
pub const LEFT_STYLE: &str = "LeftStyle";
pub const RIGHT_EARMOLD_STYLE: &str = "Right Earmold Style";
pub const LEFT_EARMOLD_STYLE: &str = "Left Earmold Style";
pub const RIGHT_RIC_CABLE: &str = "Right Ric Cable Size";
pub const LEFT_RIC_CABLE: &str = "Left Ric Cable Size";

/// Whether `name` follows the `{Right|Left}{AC|BC} {freq}` convention.
pub fn is_audiogram_column(name: &str) -> bool {
    let Some((prefix, freq)) = name.split_once(' ') else {
        return false;
    };
    matches!(prefix, "RightAC" | "LeftAC" | "RightBC" | "LeftBC")
        && !freq.is_empty()
        && freq.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_positions_fit_the_reduced_table() {
        // the reduced table is the selection plus the derived Age column
        let width = SELECTED_COLUMNS.len() + 1;
        assert!(NUMERIC_COLUMNS.iter().all(|&i| i < width));
        assert_eq!(*NUMERIC_COLUMNS.last().unwrap(), SELECTED_COLUMNS.len());
        assert!(SELECTED_COLUMNS.iter().all(|&i| i < UPSTREAM_WIDTH));
        assert!(SELECTED_COLUMNS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn audiogram_column_names() {
        assert!(is_audiogram_column("RightAC 250"));
        assert!(is_audiogram_column("LeftBC 4000"));
        assert!(!is_audiogram_column("RightBC  1000"));
        assert!(!is_audiogram_column("Right Ric Cable Size"));
        assert!(!is_audiogram_column("LeftAC"));
    }
}
