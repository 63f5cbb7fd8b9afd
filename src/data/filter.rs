use thiserror::Error;

use super::model::{CellValue, FacilityTable};

// ---------------------------------------------------------------------------
// Filter predicate: tier, then variable == value
// ---------------------------------------------------------------------------

/// One extraction request. Built per interaction, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub tier: CellValue,
    /// Column name of the secondary predicate.
    pub variable: String,
    pub value: CellValue,
}

impl FilterCriteria {
    pub fn new(tier: impl Into<CellValue>, variable: &str, value: impl Into<CellValue>) -> Self {
        Self {
            tier: tier.into(),
            variable: variable.to_string(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("the variable '{0}' does not exist in the dataset")]
    UnknownVariable(String),
    #[error("the tier column '{0}' does not exist in the dataset")]
    MissingTierColumn(String),
}

/// Return indices of rows matching both equalities, in source order.
///
/// The tier predicate runs first; an empty tier selection still goes on to
/// the variable check, so an unknown variable is reported even then.
/// Comparisons are exact: no case folding, no trimming, no cross-type
/// coercion, and `Missing` never matches.
pub fn matching_indices(
    table: &FacilityTable,
    tier_column: &str,
    criteria: &FilterCriteria,
) -> Result<Vec<usize>, FilterError> {
    if !table.has_column(tier_column) {
        return Err(FilterError::MissingTierColumn(tier_column.to_string()));
    }

    let tier_rows: Vec<usize> = table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.get(tier_column).matches(&criteria.tier))
        .map(|(i, _)| i)
        .collect();

    if !table.has_column(&criteria.variable) {
        return Err(FilterError::UnknownVariable(criteria.variable.clone()));
    }

    Ok(tier_rows
        .into_iter()
        .filter(|&i| table.rows[i].get(&criteria.variable).matches(&criteria.value))
        .collect())
}

/// Materialise the matching rows as a table with the source column order.
pub fn filter(
    table: &FacilityTable,
    tier_column: &str,
    criteria: &FilterCriteria,
) -> Result<FacilityTable, FilterError> {
    let indices = matching_indices(table, tier_column, criteria)?;
    Ok(table.subset(&indices))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::model::Facility;

    pub const NAME: &str = "Laboratory name";
    pub const TIER: &str = "Select the laboratory complexity level";
    pub const HIV: &str = "HIV rapid antibody test";
    pub const ELISA: &str = "ELISA chain";

    /// Four laboratories, one per tier.
    pub fn scenario_table() -> FacilityTable {
        let data = [
            ("Lab Central", "Level I", "yes", "no"),
            ("Lab Ville", "Level II", "no", "yes"),
            ("Lab Regional", "Level III", "yes", "yes"),
            ("Lab National", "Level IV", "yes", "yes"),
        ];
        let rows = data
            .iter()
            .map(|(name, tier, hiv, elisa)| Facility {
                cells: [(NAME, *name), (TIER, *tier), (HIV, *hiv), (ELISA, *elisa)]
                    .iter()
                    .map(|(k, v)| (k.to_string(), CellValue::from(*v)))
                    .collect(),
            })
            .collect();
        FacilityTable::new(
            vec![NAME.into(), TIER.into(), HIV.into(), ELISA.into()],
            rows,
        )
    }

    fn names(table: &FacilityTable) -> Vec<String> {
        table.rows.iter().map(|r| r.get(NAME).to_string()).collect()
    }

    #[test]
    fn level_one_hiv_yes_matches_one_lab() {
        let table = scenario_table();
        let result = filter(&table, TIER, &FilterCriteria::new("Level I", HIV, "yes")).unwrap();
        assert_eq!(names(&result), ["Lab Central"]);
    }

    #[test]
    fn level_two_elisa_yes_matches_one_lab() {
        let table = scenario_table();
        let result = filter(&table, TIER, &FilterCriteria::new("Level II", ELISA, "yes")).unwrap();
        assert_eq!(names(&result), ["Lab Ville"]);
    }

    #[test]
    fn unknown_variable_is_an_error_whatever_the_tier() {
        let table = scenario_table();
        for tier in ["Level I", "Level IX", ""] {
            let err = filter(
                &table,
                TIER,
                &FilterCriteria::new(tier, "Nonexistent Column", "yes"),
            )
            .unwrap_err();
            assert_eq!(err, FilterError::UnknownVariable("Nonexistent Column".into()));
        }
    }

    #[test]
    fn no_match_is_an_empty_result() {
        let table = scenario_table();
        let result = filter(&table, TIER, &FilterCriteria::new("Level III", HIV, "no")).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.columns, table.columns);

        let result = filter(&table, TIER, &FilterCriteria::new("Level IX", HIV, "yes")).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn comparisons_are_exact() {
        let table = scenario_table();
        for criteria in [
            FilterCriteria::new("level i", HIV, "yes"),
            FilterCriteria::new("Level I ", HIV, "yes"),
            FilterCriteria::new("Level I", HIV, "Yes"),
        ] {
            assert!(matching_indices(&table, TIER, &criteria).unwrap().is_empty());
        }
    }

    #[test]
    fn numeric_columns_do_not_match_text_targets() {
        let mut table = scenario_table();
        table.columns.push("Beds".into());
        for row in &mut table.rows {
            row.cells.insert("Beds".into(), CellValue::Integer(10));
        }
        let table = FacilityTable::new(table.columns, table.rows);

        let text = FilterCriteria::new("Level I", "Beds", "10");
        assert!(matching_indices(&table, TIER, &text).unwrap().is_empty());

        let number = FilterCriteria::new("Level I", "Beds", CellValue::Integer(10));
        assert_eq!(matching_indices(&table, TIER, &number).unwrap(), [0]);
    }

    #[test]
    fn result_is_a_subset_of_the_tier_selection() {
        let table = scenario_table();
        for tier in table.distinct_values(TIER) {
            for variable in [HIV, ELISA] {
                for value in table.distinct_values(variable) {
                    let criteria = FilterCriteria {
                        tier: tier.clone(),
                        variable: variable.to_string(),
                        value: value.clone(),
                    };
                    let result = filter(&table, TIER, &criteria).unwrap();
                    let tier_count = table
                        .rows
                        .iter()
                        .filter(|r| r.get(TIER).matches(&tier))
                        .count();
                    assert!(result.len() <= tier_count);
                    for row in &result.rows {
                        assert!(row.get(TIER).matches(&tier));
                        assert!(row.get(variable).matches(&value));
                    }
                }
            }
        }
    }

    #[test]
    fn missing_tier_column_is_reported() {
        let table = scenario_table();
        let err = matching_indices(&table, "Tier", &FilterCriteria::new("Level I", HIV, "yes"));
        assert_eq!(err, Err(FilterError::MissingTierColumn("Tier".into())));
    }
}
