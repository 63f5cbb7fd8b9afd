use chrono::NaiveDateTime;
use thiserror::Error;

use crate::config::AppConfig;
use crate::data::export::{self, ExportArtifact, ExportError, ReportLayout};
use crate::data::filter::{self, FilterCriteria, FilterError};
use crate::data::model::FacilityTable;

// ---------------------------------------------------------------------------
// Extraction pipeline: filter → empty check → export
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("the variable '{0}' does not exist in the dataset")]
    UnknownVariable(String),
    #[error("the tier column '{0}' does not exist in the dataset")]
    MissingTierColumn(String),
    #[error("no laboratory found with these criteria")]
    NoMatch,
    #[error("failed to build the Excel file: {0}")]
    Export(#[from] ExportError),
}

impl From<FilterError> for ExtractError {
    fn from(e: FilterError) -> Self {
        match e {
            FilterError::UnknownVariable(v) => ExtractError::UnknownVariable(v),
            FilterError::MissingTierColumn(c) => ExtractError::MissingTierColumn(c),
        }
    }
}

/// What the user asked for and what came out.
#[derive(Debug, Clone)]
pub struct ExtractionSummary {
    pub criteria: FilterCriteria,
    pub count: usize,
    pub generated_at: NaiveDateTime,
}

/// A successful extraction: the matching rows and their export.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub result: FacilityTable,
    pub artifact: ExportArtifact,
    pub summary: ExtractionSummary,
}

/// Runs extractions against a loaded table.
#[derive(Debug, Clone)]
pub struct Extractor {
    pub tier_column: String,
    pub layout: ReportLayout,
}

impl Extractor {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            tier_column: config.columns.tier.clone(),
            layout: ReportLayout::from_config(config),
        }
    }

    pub fn run(
        &self,
        table: &FacilityTable,
        criteria: &FilterCriteria,
        now: NaiveDateTime,
    ) -> Result<Extraction, ExtractError> {
        let result = filter::filter(table, &self.tier_column, criteria)?;
        let artifact = export::export(&result, criteria, &self.layout, now)?
            .ok_or(ExtractError::NoMatch)?;

        log::info!(
            "Extracted {} laboratories into {}",
            artifact.row_count,
            artifact.file_name
        );

        Ok(Extraction {
            summary: ExtractionSummary {
                criteria: criteria.clone(),
                count: result.len(),
                generated_at: now,
            },
            result,
            artifact,
        })
    }
}
