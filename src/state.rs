use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use subject_browser::config::Settings;
use subject_browser::data::audiogram::{self, AudiogramThresholds, GroupAudiogram};
use subject_browser::data::coupling::{self, CouplingRecommendation};
use subject_browser::data::filter::{
    self, FilterPredicate, FilterRow, FilterValue, FILTER_SLOTS,
};
use subject_browser::data::filter_file;
use subject_browser::data::loader;
use subject_browser::data::model::{CellValue, ColumnStore};
use subject_browser::data::profile::{self, SubjectProfile};
use subject_browser::error::{BrowserError, ErrorKind, Result};

// ---------------------------------------------------------------------------
// Selected subject
// ---------------------------------------------------------------------------

/// Everything shown for the subject picked in the browser.
#[derive(Debug, Clone)]
pub struct SubjectView {
    pub id: CellValue,
    pub profile: Option<SubjectProfile>,
    pub audiogram: AudiogramThresholds,
    /// `None` when thresholds needed for the matrix are absent.
    pub recommendation: Option<CouplingRecommendation>,
    pub recommendation_error: Option<String>,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Current (possibly filtered) dataset; None until the user loads a file.
    pub store: Option<ColumnStore>,

    /// Attribute / operator / value text of the filter form.
    pub filter_rows: Vec<FilterRow>,

    /// Predicates in effect on `store` since it was loaded, in application order.
    pub active_filters: Vec<FilterPredicate>,

    /// Transcript of the last load or filter run.
    pub output: Vec<String>,

    pub selected: Option<SubjectView>,

    /// Cached group audiogram of the current store.
    pub group: Option<GroupAudiogram>,
    pub show_group_audiogram: bool,

    pub settings: Settings,
    pub settings_path: Option<PathBuf>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            store: None,
            filter_rows: vec![FilterRow::default(); FILTER_SLOTS],
            active_filters: Vec::new(),
            output: Vec::new(),
            selected: None,
            group: None,
            show_group_audiogram: false,
            settings: Settings::default(),
            settings_path: None,
            status_message: None,
        }
    }
}

impl AppState {
    /// State with settings read from `settings_path` (when given).
    pub fn with_settings(settings_path: Option<PathBuf>) -> Self {
        let settings = settings_path
            .as_deref()
            .map(Settings::load_or_default)
            .unwrap_or_default();
        Self {
            settings,
            settings_path,
            ..Self::default()
        }
    }

    pub fn row_count(&self) -> usize {
        self.store.as_ref().map_or(0, ColumnStore::len)
    }

    /// Sorted column names, for the attribute pickers.
    pub fn attributes(&self) -> Vec<String> {
        let mut cols: Vec<String> = self
            .store
            .as_ref()
            .map(|s| s.columns().to_vec())
            .unwrap_or_default();
        cols.sort();
        cols
    }

    /// Distinct values of a column for the value pickers, missing excluded.
    pub fn unique_values(&self, column: &str) -> BTreeSet<CellValue> {
        self.store
            .as_ref()
            .and_then(|s| s.unique_values(column))
            .unwrap_or_default()
    }

    pub fn subject_ids(&self) -> Vec<CellValue> {
        self.store
            .as_ref()
            .and_then(|s| s.column_values(subject_browser::data::schema::SUBJECT_ID))
            .map(|ids| ids.cloned().collect())
            .unwrap_or_default()
    }

    // -- Loading / exporting --

    /// Replace the dataset with a cleaned full export. On failure the previous
    /// dataset is kept.
    pub fn load_full(&mut self, path: &Path) -> Result<()> {
        let store = loader::load_full(path)?;
        self.set_store(store);
        if self.settings.initial_scrub {
            self.initial_scrub();
        } else {
            self.output = vec![format!("Candidates before filtering: {}", self.row_count())];
        }
        Ok(())
    }

    pub fn load_filtered(&mut self, path: &Path) -> Result<()> {
        let store = loader::load_filtered(path)?;
        self.set_store(store);
        self.output = vec![format!("Candidates before filtering: {}", self.row_count())];
        Ok(())
    }

    pub fn export(&self, path: &Path) -> Result<()> {
        let store = self.require_store()?;
        loader::export(store, path)
    }

    fn set_store(&mut self, store: ColumnStore) {
        self.store = Some(store);
        self.active_filters.clear();
        self.selected = None;
        self.status_message = None;
        self.refresh_group();
    }

    fn require_store(&self) -> Result<&ColumnStore> {
        self.store
            .as_ref()
            .ok_or_else(|| BrowserError::Validation("No database loaded.".into()))
    }

    // -- Filtering --

    /// Validate the form and run its predicates. Nothing is applied when the
    /// form is invalid.
    pub fn apply_filter_form(&mut self) -> Result<()> {
        let predicates = filter::predicates_from_rows(&self.filter_rows)?;
        self.apply_predicates(&predicates)
    }

    /// Run predicates in order against the current dataset. A failing step
    /// stops the batch; earlier steps stay applied.
    pub fn apply_predicates(&mut self, predicates: &[FilterPredicate]) -> Result<()> {
        let store = self.require_store()?.clone();
        let outcome = filter::apply_batch(store, predicates);
        self.output = outcome.transcript();
        self.active_filters
            .extend(outcome.steps.iter().map(|step| step.predicate.clone()));
        self.store = Some(outcome.store);
        self.refresh_selection();
        self.refresh_group();
        match outcome.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn initial_scrub(&mut self) {
        if let Err(e) = self.apply_predicates(&filter::scrub_predicates()) {
            self.report("Initial scrub failed", &e);
        }
    }

    /// Empty the form and the transcript.
    pub fn clear_filters(&mut self) {
        self.filter_rows = vec![FilterRow::default(); FILTER_SLOTS];
        self.output.clear();
    }

    pub fn set_initial_scrub(&mut self, enabled: bool) {
        self.settings.initial_scrub = enabled;
        if let Some(path) = &self.settings_path {
            if let Err(e) = self.settings.save(path) {
                log::error!("Failed to save settings: {e:#}");
            }
        }
    }

    // -- Filter files --

    /// Load predicates from a filter file, show them in the form and apply them.
    pub fn import_filters(&mut self, path: &Path) -> Result<()> {
        let predicates = filter_file::import_filters(path)?;
        if predicates.len() > FILTER_SLOTS {
            log::warn!(
                "{} imported filters but only {FILTER_SLOTS} form rows; all will be applied",
                predicates.len()
            );
        }
        self.filter_rows = vec![FilterRow::default(); FILTER_SLOTS];
        for (row, p) in self.filter_rows.iter_mut().zip(&predicates) {
            *row = form_row(p);
        }
        self.apply_predicates(&predicates)
    }

    /// Write the active filters; before any have been applied, the form's.
    pub fn export_filters(&self, path: &Path) -> Result<()> {
        if !self.active_filters.is_empty() {
            return filter_file::export_filters(&self.active_filters, path);
        }
        let predicates = filter::predicates_from_rows(&self.filter_rows)?;
        filter_file::export_filters(&predicates, path)
    }

    // -- Subject browsing --

    pub fn select_subject(&mut self, id: CellValue) {
        let Some(store) = &self.store else {
            return;
        };
        let thresholds = audiogram::extract(store, &id);
        let (recommendation, recommendation_error) = match coupling::recommend(&thresholds) {
            Ok(rec) => (Some(rec), None),
            Err(e) => {
                log::warn!("Failed to calculate coupling type for subject {id}: {e}");
                (None, Some(e.to_string()))
            }
        };
        self.selected = Some(SubjectView {
            profile: profile::subject_profile(store, &id),
            audiogram: thresholds,
            recommendation,
            recommendation_error,
            id,
        });
    }

    fn refresh_selection(&mut self) {
        let still_present = match (&self.selected, &self.store) {
            (Some(view), Some(store)) => {
                store.find_row(subject_browser::data::schema::SUBJECT_ID, &view.id).is_some()
            }
            _ => false,
        };
        if !still_present {
            self.selected = None;
        }
    }

    fn refresh_group(&mut self) {
        self.group = self.store.as_ref().map(audiogram::group_audiogram);
    }

    // -- Errors --

    /// Show an error to the user.
    pub fn report(&mut self, context: &str, err: &BrowserError) {
        log::error!("{context}: {err}");
        let hint = match err.kind() {
            ErrorKind::TypeMismatch => {
                " The search term data type does not match the database data type. Aborting."
            }
            _ => "",
        };
        self.status_message = Some(format!("{context}: {err}.{hint}"));
    }
}

fn form_row(p: &FilterPredicate) -> FilterRow {
    let value = match &p.value {
        FilterValue::Scalar(s) => s.to_string(),
        FilterValue::Set(items) => items
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(" "),
    };
    FilterRow {
        attribute: p.column.clone(),
        operator: p.operator.to_string(),
        value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use subject_browser::data::coupling::Coupling;
    use subject_browser::data::filter::{Operator, Scalar};
    use subject_browser::data::schema::{SMARTPHONE_TYPE, SUBJECT_ID};
    use subject_browser::data::sample::{random_records, write_upstream, UpstreamRecord};

    fn write_full(dir: &Path, records: &[UpstreamRecord]) -> PathBuf {
        let path = dir.join("general_search.csv");
        let file = std::fs::File::create(&path).unwrap();
        write_upstream(records, file).unwrap();
        path
    }

    fn row(a: &str, o: &str, v: &str) -> FilterRow {
        FilterRow {
            attribute: a.into(),
            operator: o.into(),
            value: v.into(),
        }
    }

    #[test]
    fn scrub_after_import_reports_intermediate_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_full(dir.path(), &random_records(100, 3));

        let mut state = AppState::default();
        state.settings.initial_scrub = true;
        state.load_full(&path).unwrap();

        assert_eq!(state.output[0], "Candidates before filtering: 100");
        assert_eq!(state.output.len(), 4);
        let counts: Vec<usize> = state.output[1..]
            .iter()
            .map(|line| line.rsplit(' ').next().unwrap().parse().unwrap())
            .collect();
        assert!(counts.windows(2).all(|w| w[1] <= w[0]));
        assert!(counts[0] <= 100);
        assert_eq!(*counts.last().unwrap(), state.row_count());
    }

    #[test]
    fn failed_load_keeps_previous_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_full(dir.path(), &random_records(10, 1));
        let mut state = AppState::default();
        state.load_full(&path).unwrap();

        let bad = dir.path().join("bad.csv");
        std::fs::write(&bad, "a,b\n1,2\n").unwrap();
        let err = state.load_full(&bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(state.row_count(), 10);
    }

    #[test]
    fn form_filters_narrow_and_mismatch_keeps_prior_steps() {
        let dir = tempfile::tempdir().unwrap();
        let mut records = vec![UpstreamRecord::example(1), UpstreamRecord::example(2)];
        records[1].status = "Inactive".into();
        let path = write_full(dir.path(), &records);

        let mut state = AppState::default();
        state.load_full(&path).unwrap();
        state.filter_rows[0] = row("Status", "equals", "Active");
        state.filter_rows[1] = row("Status", ">", "10");
        state.filter_rows[2] = row("Age", ">", "1");

        let err = state.apply_filter_form().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert_eq!(state.row_count(), 1);

        state.report("Filtering error", &err);
        assert!(state.status_message.as_deref().unwrap().contains("Status"));
    }

    #[test]
    fn invalid_form_applies_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_full(dir.path(), &random_records(10, 5));
        let mut state = AppState::default();
        state.load_full(&path).unwrap();
        state.filter_rows[0] = row("Status", "equals", "Active");
        state.filter_rows[1] = row("Age", "", "60");

        let err = state.apply_filter_form().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(state.row_count(), 10);
    }

    #[test]
    fn selecting_a_subject_computes_recommendation() {
        let dir = tempfile::tempdir().unwrap();
        let mut sparse = UpstreamRecord::example(8);
        sparse.right_ac[1] = "%null%".into();
        let path = write_full(dir.path(), &[UpstreamRecord::example(7), sparse]);

        let mut state = AppState::default();
        state.load_full(&path).unwrap();

        state.select_subject(CellValue::Number(7.0));
        let view = state.selected.as_ref().unwrap();
        let rec = view.recommendation.unwrap();
        // example audiogram: 250=20, 500=25, 1000=35, 2000=50
        assert_eq!(rec.right.coupling, Coupling::OpenDome);
        assert_eq!(view.profile.as_ref().unwrap().study_info, "Comfort Trial");

        state.select_subject(CellValue::Number(8.0));
        let view = state.selected.as_ref().unwrap();
        assert!(view.recommendation.is_none());
        assert!(view.recommendation_error.as_deref().unwrap().contains("500 Hz"));
        assert!(!view.audiogram.is_empty());
    }

    #[test]
    fn filtering_out_the_selected_subject_clears_selection() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_full(dir.path(), &[UpstreamRecord::example(1), UpstreamRecord::example(2)]);
        let mut state = AppState::default();
        state.load_full(&path).unwrap();
        state.select_subject(CellValue::Number(2.0));

        state.filter_rows[0] = row("Subject Id", "equals", "1");
        state.apply_filter_form().unwrap();
        assert!(state.selected.is_none());
        assert_eq!(state.subject_ids(), vec![CellValue::Number(1.0)]);
    }

    #[test]
    fn filter_files_round_trip_through_the_form() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_full(dir.path(), &random_records(30, 9));
        let mut state = AppState::default();
        state.load_full(&path).unwrap();
        state.filter_rows[0] = row("Status", "equals", "Active");
        state.filter_rows[1] = row("RightStyle", "contains", "RIC BTE");

        let filters = dir.path().join("filters.csv");
        state.export_filters(&filters).unwrap();
        let expected = filter::predicates_from_rows(&state.filter_rows).unwrap();

        state.clear_filters();
        state.load_full(&path).unwrap();
        state.import_filters(&filters).unwrap();
        assert_eq!(filter::predicates_from_rows(&state.filter_rows).unwrap(), expected);
        assert_eq!(state.output.len(), 3);
    }

    #[test]
    fn exported_filters_keep_multi_word_set_items() {
        let dir = tempfile::tempdir().unwrap();
        let mut records = vec![UpstreamRecord::example(1), UpstreamRecord::example(2)];
        records[0].smartphone_type = "Android Phone".into();
        records[1].smartphone_type = "Flip Phone".into();
        let path = write_full(dir.path(), &records);
        let mut state = AppState::default();
        state.load_full(&path).unwrap();

        let wanted = vec![FilterPredicate::new(
            SMARTPHONE_TYPE,
            Operator::Contains,
            FilterValue::Set(vec![
                Scalar::Text("Android Phone".into()),
                Scalar::Text("iPhone".into()),
            ]),
        )
        .unwrap()];
        let source = dir.path().join("in.csv");
        filter_file::export_filters(&wanted, &source).unwrap();

        state.import_filters(&source).unwrap();
        assert_eq!(state.row_count(), 1);

        let out = dir.path().join("out.csv");
        state.export_filters(&out).unwrap();
        assert_eq!(filter_file::import_filters(&out).unwrap(), wanted);
    }

    #[test]
    fn all_imported_filters_are_exported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_full(dir.path(), &random_records(20, 4));
        let mut state = AppState::default();
        state.load_full(&path).unwrap();

        let many: Vec<FilterPredicate> = (0..FILTER_SLOTS + 2)
            .map(|i| {
                FilterPredicate::scalar(SUBJECT_ID, Operator::GreaterEq, Scalar::Number(i as f64))
                    .unwrap()
            })
            .collect();
        let source = dir.path().join("in.csv");
        filter_file::export_filters(&many, &source).unwrap();
        state.import_filters(&source).unwrap();
        assert_eq!(state.active_filters.len(), FILTER_SLOTS + 2);

        let out = dir.path().join("out.csv");
        state.export_filters(&out).unwrap();
        assert_eq!(filter_file::import_filters(&out).unwrap(), many);

        // a new dataset starts with no active filters
        state.load_full(&path).unwrap();
        assert!(state.active_filters.is_empty());
    }

    #[test]
    fn export_without_data_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::default();
        assert!(state.export(&dir.path().join("out.csv")).is_err());
        assert!(state.export_filters(&dir.path().join("f.csv")).is_err());
    }

    #[test]
    fn scrub_setting_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg").join("config.json");
        let mut state = AppState::with_settings(Some(path.clone()));
        state.set_initial_scrub(true);
        assert!(AppState::with_settings(Some(path)).settings.initial_scrub);
    }

    #[test]
    fn unique_values_exclude_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut records = vec![UpstreamRecord::example(1), UpstreamRecord::example(2)];
        records[1].smartphone_type = "%null%".into();
        let path = write_full(dir.path(), &records);
        let mut state = AppState::default();
        state.load_full(&path).unwrap();
        let vals: Vec<String> = state
            .unique_values("Smartphone Type")
            .iter()
            .map(|v| v.to_string())
            .collect();
        assert_eq!(vals, vec!["iPhone"]);
    }
}
