use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};

use crate::config::AppConfig;
use crate::data::filter::FilterCriteria;
use crate::data::loader::{load_file, load_workbook_bytes, LoadError};
use crate::data::model::{CellValue, FacilityTable};
use crate::extract::{ExtractError, Extraction, Extractor};

// ---------------------------------------------------------------------------
// Session pieces
// ---------------------------------------------------------------------------

/// Where the active table came from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Default(PathBuf),
    Upload(PathBuf),
}

impl DataSource {
    pub fn path(&self) -> &Path {
        match self {
            DataSource::Default(p) | DataSource::Upload(p) => p,
        }
    }
}

/// Feedback on the last upload attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Success(String),
    Error(String),
}

/// Current tier / variable / value choices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub tier: Option<CellValue>,
    pub variable: Option<String>,
    pub value: Option<CellValue>,
}

/// Result of the last "Generate extraction" press.
#[derive(Debug, Clone)]
pub enum Outcome {
    Extracted(Box<Extraction>),
    NoMatch,
    Failed(String),
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full session state, independent of rendering. Every handler takes it
/// explicitly; nothing lives in globals.
pub struct AppState {
    pub config: AppConfig,
    extractor: Extractor,

    /// Active table (None until a load succeeds).
    pub table: Option<FacilityTable>,
    pub source: Option<DataSource>,

    /// Why the default dataset could not be loaded.
    pub load_failure: Option<String>,
    pub upload_notice: Option<Notice>,

    pub selection: Selection,
    pub outcome: Option<Outcome>,

    /// Status / error message shown next to the controls.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            extractor: Extractor::from_config(&config),
            config,
            table: None,
            source: None,
            load_failure: None,
            upload_notice: None,
            selection: Selection::default(),
            outcome: None,
            status_message: None,
        }
    }

    fn tier_column(&self) -> &str {
        &self.config.columns.tier
    }

    // -- Loading --

    /// Load the configured default dataset. On failure the current table
    /// (if any) stays active and the usage hint is shown.
    pub fn load_default(&mut self) {
        let path = self.config.default_dataset.clone();
        match load_file(&path, self.tier_column()) {
            Ok(table) => {
                self.load_failure = None;
                self.set_table(table, DataSource::Default(path));
            }
            Err(e) => {
                log::error!("Failed to load default dataset {}: {e:#}", path.display());
                self.load_failure = Some(format!("Error while loading the data: {e}"));
            }
        }
    }

    /// Replace the active table with a user-chosen file. On failure the
    /// previous table stays active.
    pub fn load_upload(&mut self, path: &Path) {
        let result = load_file(path, self.tier_column());
        self.finish_upload(result, path.to_path_buf());
    }

    /// Same as [`AppState::load_upload`] for a workbook dropped as raw bytes.
    pub fn load_upload_bytes(&mut self, name: &str, bytes: Vec<u8>) {
        let result = load_workbook_bytes(bytes, self.tier_column());
        self.finish_upload(result, PathBuf::from(name));
    }

    fn finish_upload(&mut self, result: Result<FacilityTable, LoadError>, path: PathBuf) {
        match result {
            Ok(table) => {
                self.load_failure = None;
                self.upload_notice = Some(Notice::Success("File loaded successfully".into()));
                self.set_table(table, DataSource::Upload(path));
            }
            Err(e) => {
                log::warn!("Failed to load {}: {e:#}", path.display());
                let kept = if self.table.is_some() {
                    "; keeping the previously loaded data"
                } else {
                    ""
                };
                self.upload_notice = Some(Notice::Error(format!("Error while loading: {e}{kept}")));
            }
        }
    }

    /// Ingest a newly loaded table and reset the selections.
    pub fn set_table(&mut self, table: FacilityTable, source: DataSource) {
        log::info!(
            "Loaded {} laboratories with {} columns from {}",
            table.len(),
            table.columns.len(),
            source.path().display()
        );
        self.table = Some(table);
        self.source = Some(source);
        self.outcome = None;
        self.status_message = None;

        self.selection.tier = self.tier_options().into_iter().next();
        let variables = self.variable_options();
        self.selection.variable = variables
            .iter()
            .find(|v| **v == self.config.default_variable)
            .or(variables.first())
            .cloned();
        self.selection.value = self.value_options().into_iter().next();
    }

    // -- Options --

    /// Distinct non-missing tiers, sorted. Rows without a tier are ignored.
    pub fn tier_options(&self) -> Vec<CellValue> {
        self.table
            .as_ref()
            .map(|t| t.distinct_values(self.tier_column()))
            .unwrap_or_default()
    }

    /// All column names, sorted.
    pub fn variable_options(&self) -> Vec<String> {
        self.table
            .as_ref()
            .map(FacilityTable::sorted_columns)
            .unwrap_or_default()
    }

    /// Distinct non-missing values of the selected variable, sorted.
    pub fn value_options(&self) -> Vec<CellValue> {
        match (&self.table, &self.selection.variable) {
            (Some(table), Some(var)) => table.distinct_values(var),
            _ => Vec::new(),
        }
    }

    // -- Selection handlers --

    pub fn select_tier(&mut self, tier: CellValue) {
        log::debug!("Tier selected: {tier}");
        self.selection.tier = Some(tier);
        self.clear_outcome();
    }

    /// Select a variable; the value resets to its first option.
    pub fn select_variable(&mut self, variable: String) {
        log::debug!("Variable selected: {variable}");
        self.selection.variable = Some(variable);
        self.selection.value = self.value_options().into_iter().next();
        self.clear_outcome();
    }

    pub fn select_value(&mut self, value: CellValue) {
        log::debug!("Value selected: {value}");
        self.selection.value = Some(value);
        self.clear_outcome();
    }

    /// Fill the selection from a configured preset. Never exports.
    pub fn apply_preset(&mut self, index: usize) {
        let Some(preset) = self.config.presets.get(index).cloned() else {
            return;
        };
        log::debug!("Preset applied: {}", preset.label);
        self.selection = Selection {
            tier: Some(CellValue::Text(preset.tier)),
            variable: Some(preset.variable),
            value: Some(CellValue::Text(preset.value)),
        };
        self.clear_outcome();
    }

    fn clear_outcome(&mut self) {
        self.outcome = None;
        self.status_message = None;
    }

    // -- Extraction --

    /// Run the extraction for the current selection.
    pub fn generate(&mut self) {
        self.generate_at(Local::now().naive_local());
    }

    pub fn generate_at(&mut self, now: NaiveDateTime) {
        let Some(table) = &self.table else {
            return;
        };
        let (Some(tier), Some(variable), Some(value)) = (
            &self.selection.tier,
            &self.selection.variable,
            &self.selection.value,
        ) else {
            self.outcome = None;
            self.status_message = Some("Please select a valid value".into());
            return;
        };

        let criteria = FilterCriteria::new(tier.clone(), variable, value.clone());

        self.status_message = None;
        self.outcome = Some(match self.extractor.run(table, &criteria, now) {
            Ok(extraction) => Outcome::Extracted(Box::new(extraction)),
            Err(ExtractError::NoMatch) => Outcome::NoMatch,
            Err(e) => {
                log::warn!("Extraction failed: {e}");
                Outcome::Failed(e.to_string())
            }
        });
    }

    /// The artifact of the last successful extraction.
    pub fn extraction(&self) -> Option<&Extraction> {
        match &self.outcome {
            Some(Outcome::Extracted(e)) => Some(e),
            _ => None,
        }
    }

    /// Write the current artifact to `path`.
    pub fn save_artifact(&mut self, path: &Path) {
        let Some(extraction) = self.extraction() else {
            return;
        };
        match write_artifact(&extraction.artifact.bytes, path) {
            Ok(()) => {
                log::info!("Saved extraction to {}", path.display());
                self.status_message = Some(format!("Saved {}", path.display()));
            }
            Err(e) => {
                log::error!("{e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    // -- Summary --

    pub fn total_rows(&self) -> usize {
        self.table.as_ref().map_or(0, FacilityTable::len)
    }

    /// Available tiers, comma separated.
    pub fn tier_list(&self) -> String {
        self.tier_options()
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Shown with a load failure of the default dataset.
    pub fn usage_hint(&self) -> String {
        format!(
            "How to use this application:\n\
             1. Load your data with \"Load workbook…\" in the side panel, or\n\
             2. Point `default_dataset` in {} (or ${}) at your file:\n   {}\n\
             3. Check that the sheet contains the column:\n   '{}'",
            crate::config::CONFIG_FILE,
            crate::config::CONFIG_ENV,
            self.config.default_dataset.display(),
            self.tier_column()
        )
    }
}

fn write_artifact(bytes: &[u8], path: &Path) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}

/// File name proposed in the save dialog: the artifact name with path
/// separators replaced.
pub fn download_file_name(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::tests::{ELISA, HIV, NAME, TIER};
    use chrono::NaiveDate;
    use rust_xlsxwriter::Workbook;
    use tempfile::TempDir;

    fn write_workbook(path: &Path, header: &[&str], rows: &[[&str; 4]]) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (c, h) in header.iter().enumerate() {
            sheet.write_string(0, c as u16, *h).unwrap();
        }
        for (r, row) in rows.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                if !v.is_empty() {
                    sheet.write_string(r as u32 + 1, c as u16, *v).unwrap();
                }
            }
        }
        workbook.save(path).unwrap();
    }

    fn labs(path: &Path) {
        write_workbook(
            path,
            &[NAME, TIER, HIV, ELISA],
            &[
                ["Lab Central", "Level I", "yes", "no"],
                ["Lab Ville", "Level II", "no", "yes"],
                ["Lab Regional", "Level III", "yes", "yes"],
                ["Lab National", "Level IV", "yes", "yes"],
                ["Lab Mobile", "", "no", ""],
            ],
        );
    }

    fn session(dir: &TempDir) -> AppState {
        let path = dir.path().join("labs.xlsx");
        labs(&path);
        let config = AppConfig {
            default_dataset: path,
            ..AppConfig::default()
        };
        let mut state = AppState::new(config);
        state.load_default();
        state
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 29)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    #[test]
    fn default_load_initialises_selection() {
        let dir = tempfile::tempdir().unwrap();
        let state = session(&dir);

        assert_eq!(state.total_rows(), 5);
        assert_eq!(state.tier_list(), "Level I, Level II, Level III, Level IV");
        assert_eq!(state.selection.tier, Some("Level I".into()));
        assert_eq!(state.selection.variable.as_deref(), Some(HIV));
        assert_eq!(state.selection.value, Some("no".into()));
        assert_eq!(state.variable_options(), [ELISA, HIV, NAME, TIER]);
    }

    #[test]
    fn variable_defaults_to_first_column_without_hiv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.xlsx");
        write_workbook(
            &path,
            &["Zone", TIER, "Beta", "Alpha"],
            &[["z", "Level I", "b", "a"], ["z", "Level I", "b", ""], ["", "", "", ""], ["", "", "", ""]],
        );
        let mut state = session(&dir);
        state.load_upload(&path);
        assert_eq!(state.selection.variable.as_deref(), Some("Alpha"));
        assert_eq!(state.value_options(), [CellValue::from("a")]);
    }

    #[test]
    fn changing_variable_resets_value() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = session(&dir);
        state.select_value("yes".into());
        state.select_variable(NAME.to_string());
        assert_eq!(state.selection.value, Some("Lab Central".into()));
    }

    #[test]
    fn generate_success_exposes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = session(&dir);
        state.select_value("yes".into());
        state.generate_at(now());

        let extraction = state.extraction().expect("artifact");
        assert_eq!(extraction.summary.count, 1);
        assert_eq!(extraction.result.rows[0].get(NAME), &CellValue::from("Lab Central"));

        let target = dir.path().join("out.xlsx");
        state.save_artifact(&target);
        assert_eq!(std::fs::read(&target).unwrap(), extraction_bytes(&state));
    }

    fn extraction_bytes(state: &AppState) -> Vec<u8> {
        state.extraction().unwrap().artifact.bytes.clone()
    }

    #[test]
    fn generate_no_match_offers_no_download() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = session(&dir);
        state.select_tier("Level III".into());
        state.select_value("no".into());
        state.generate_at(now());
        assert!(matches!(state.outcome, Some(Outcome::NoMatch)));
        assert!(state.extraction().is_none());
    }

    #[test]
    fn generate_without_value_asks_for_one() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = session(&dir);
        state.selection.value = None;
        state.generate_at(now());
        assert!(state.outcome.is_none());
        assert_eq!(state.status_message.as_deref(), Some("Please select a valid value"));
    }

    #[test]
    fn presets_fill_selection_without_exporting() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = session(&dir);
        state.apply_preset(1);
        assert_eq!(
            state.selection,
            Selection {
                tier: Some("Level I".into()),
                variable: Some(ELISA.into()),
                value: Some("yes".into()),
            }
        );
        assert!(state.outcome.is_none());

        state.generate_at(now());
        assert!(matches!(state.outcome, Some(Outcome::NoMatch)));

        state.apply_preset(0);
        state.generate_at(now());
        assert_eq!(state.extraction().map(|e| e.summary.count), Some(1));
    }

    #[test]
    fn preset_with_unknown_variable_fails_inline() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = session(&dir);
        state.config.presets[0].variable = "Nonexistent Column".into();
        state.apply_preset(0);
        state.generate_at(now());
        match &state.outcome {
            Some(Outcome::Failed(msg)) => assert!(msg.contains("Nonexistent Column")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn failed_upload_keeps_previous_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = session(&dir);
        let bad = dir.path().join("broken.xlsx");
        std::fs::write(&bad, b"not a workbook").unwrap();

        state.load_upload(&bad);
        assert_eq!(state.total_rows(), 5);
        assert!(matches!(state.source, Some(DataSource::Default(_))));
        assert!(matches!(state.upload_notice, Some(Notice::Error(ref m)) if m.contains("keeping")));
    }

    #[test]
    fn successful_upload_replaces_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = session(&dir);
        let other = dir.path().join("upload.xlsx");
        write_workbook(
            &other,
            &[NAME, TIER, HIV, ELISA],
            &[["Lab Nord", "Level II", "yes", "yes"], ["", "", "", ""], ["", "", "", ""], ["", "", "", ""]],
        );
        state.load_upload(&other);
        assert_eq!(state.total_rows(), 1);
        assert_eq!(state.tier_list(), "Level II");
        assert_eq!(state.upload_notice, Some(Notice::Success("File loaded successfully".into())));
    }

    #[test]
    fn dropped_bytes_replace_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = session(&dir);
        let other = dir.path().join("dropped.xlsx");
        write_workbook(
            &other,
            &[NAME, TIER, HIV, ELISA],
            &[["Lab Sud", "Level III", "no", "no"], ["Lab Est", "Level III", "yes", "no"], ["", "", "", ""], ["", "", "", ""]],
        );
        state.load_upload_bytes("dropped.xlsx", std::fs::read(&other).unwrap());
        assert_eq!(state.total_rows(), 2);
        assert_eq!(state.source, Some(DataSource::Upload(PathBuf::from("dropped.xlsx"))));

        state.load_upload_bytes("junk.xlsx", b"junk".to_vec());
        assert_eq!(state.total_rows(), 2);
        assert!(matches!(state.upload_notice, Some(Notice::Error(_))));
    }

    #[test]
    fn missing_default_shows_hint() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            default_dataset: dir.path().join("absent.xlsx"),
            ..AppConfig::default()
        };
        let mut state = AppState::new(config);
        state.load_default();
        assert!(state.table.is_none());
        assert!(state.load_failure.is_some());
        assert!(state.usage_hint().contains(TIER));
        assert!(state.tier_options().is_empty());
    }

    #[test]
    fn download_name_has_no_path_separators() {
        assert_eq!(
            download_file_name("Laboratories_Level_I_City /District_x.xlsx"),
            "Laboratories_Level_I_City _District_x.xlsx"
        );
    }
}
