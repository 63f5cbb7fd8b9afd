use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable pointing at an alternative config file.
pub const CONFIG_ENV: &str = "LAB_EXTRACT_CONFIG";
/// Config file looked up in the working directory when the env var is unset.
pub const CONFIG_FILE: &str = "lab-extract.json";

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

/// Names of the identity and tier columns in the survey sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub name: String,
    pub country: String,
    pub city: String,
    pub address: String,
    /// The facility complexity level. Required in every loaded table.
    pub tier: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            name: "Laboratory name".into(),
            country: "Country".into(),
            city: "City / District (Department)".into(),
            address: "Health facility address".into(),
            tier: "Select the laboratory complexity level".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

/// A named tier / variable / value shortcut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub label: String,
    pub tier: String,
    pub variable: String,
    pub value: String,
}

impl Preset {
    fn new(label: &str, tier: &str, variable: &str, value: &str) -> Self {
        Self {
            label: label.into(),
            tier: tier.into(),
            variable: variable.into(),
            value: value.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Application settings, read from JSON. Every field has a default so a
/// partial file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Workbook loaded at start-up when the user has not picked one.
    pub default_dataset: PathBuf,
    pub columns: ColumnNames,
    /// Appended to the export after the base columns, when present.
    pub optional_columns: Vec<String>,
    /// Variable pre-selected when the table has it.
    pub default_variable: String,
    pub sheet_name: String,
    pub file_prefix: String,
    /// Columns shown in the result preview, when present.
    pub preview_columns: Vec<String>,
    pub presets: Vec<Preset>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let columns = ColumnNames::default();
        Self {
            default_dataset: PathBuf::from(
                "Data_LabMab_2025_merge_final_LabMab_29_09_2025_for_R_.xlsx",
            ),
            optional_columns: vec![
                "GPS coordinates".into(),
                "Respondent personal phone number".into(),
                "Respondent email address".into(),
                "Respondent role".into(),
            ],
            default_variable: "HIV rapid antibody test".into(),
            sheet_name: "Laboratories".into(),
            file_prefix: "Laboratories".into(),
            preview_columns: vec![
                columns.name.clone(),
                columns.country.clone(),
                columns.city.clone(),
            ],
            presets: vec![
                Preset::new("HIV tests", "Level I", "HIV rapid antibody test", "yes"),
                Preset::new("ELISA tests", "Level I", "ELISA chain", "yes"),
            ],
            columns,
        }
    }
}

impl AppConfig {
    /// Read a config file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Config location: `$LAB_EXTRACT_CONFIG`, else `lab-extract.json`.
    pub fn resolve_path() -> PathBuf {
        match std::env::var(CONFIG_ENV) {
            Ok(value) if !value.trim().is_empty() => PathBuf::from(value.trim()),
            _ => PathBuf::from(CONFIG_FILE),
        }
    }

    /// Load from `path`, falling back to defaults when the file is absent or
    /// invalid.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::from_path(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring config: {e:#}");
                Self::default()
            }
        }
    }
}
