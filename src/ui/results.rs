use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::FacilityTable;
use crate::state::{download_file_name, AppState, Outcome};

const PREVIEW_HEIGHT: f32 = 200.0;

// ---------------------------------------------------------------------------
// Central panel – extraction results
// ---------------------------------------------------------------------------

/// Render the extraction outcome in the central panel.
pub fn results_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Laboratory extraction by criteria");
    ui.label("Select the criteria in the side panel to extract the list of laboratories.");
    ui.separator();

    if let Some(failure) = &state.load_failure {
        ui.label(RichText::new(failure).color(Color32::RED));
        ui.add_space(4.0);
        egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
            ui.label(state.usage_hint());
        });
        if state.table.is_none() {
            return;
        }
        ui.separator();
    }

    let mut save_clicked = false;
    match &state.outcome {
        None => {}
        Some(Outcome::NoMatch) => {
            ui.label(RichText::new("No laboratory found with these criteria").color(Color32::RED));
        }
        Some(Outcome::Failed(msg)) => {
            ui.label(RichText::new(format!("Error: {msg}")).color(Color32::RED));
        }
        Some(Outcome::Extracted(extraction)) => {
            ui.label(
                RichText::new(format!("{} laboratory(ies) found", extraction.summary.count))
                    .strong()
                    .color(Color32::DARK_GREEN),
            );
            ui.add_space(4.0);

            ui.strong("Data preview");
            preview_table(ui, &extraction.result, &state.config.preview_columns);
            ui.add_space(6.0);

            let button = egui::Button::new(RichText::new("Download Excel file").strong())
                .min_size(egui::vec2(ui.available_width(), 28.0));
            save_clicked = ui.add(button).clicked();

            egui::CollapsingHeader::new("Extraction details")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    let s = &extraction.summary;
                    ui.label(format!("Tier: {}", s.criteria.tier));
                    ui.label(format!("Variable: {}", s.criteria.variable));
                    ui.label(format!("Value: {}", s.criteria.value));
                    ui.label(format!("Total laboratories: {}", s.count));
                    ui.label(format!("Date: {}", s.generated_at.format("%d/%m/%Y %H:%M")));
                    ui.label(format!("Columns: {}", extraction.artifact.columns.join(", ")));
                    ui.label(format!(
                        "File: {} ({})",
                        extraction.artifact.file_name, extraction.artifact.mime_type
                    ));
                });
        }
    }

    if save_clicked {
        save_file_dialog(state);
    }
}

/// Preview of the matching rows, limited to the configured columns.
fn preview_table(ui: &mut Ui, table: &FacilityTable, wanted: &[String]) {
    let columns: Vec<&String> = wanted.iter().filter(|c| table.has_column(c)).collect();
    if columns.is_empty() {
        return;
    }

    ui.push_id("preview", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .max_scroll_height(PREVIEW_HEIGHT)
            .columns(Column::auto().at_least(120.0), columns.len())
            .header(20.0, |mut header| {
                for col in &columns {
                    header.col(|ui: &mut Ui| {
                        ui.strong(col.as_str());
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, table.len(), |mut row| {
                    let facility = &table.rows[row.index()];
                    for col in &columns {
                        row.col(|ui: &mut Ui| {
                            ui.label(facility.get(col).to_string());
                        });
                    }
                });
            });
    });
}

fn save_file_dialog(state: &mut AppState) {
    let Some(extraction) = state.extraction() else {
        return;
    };
    let file = rfd::FileDialog::new()
        .set_title("Download Excel file")
        .set_file_name(download_file_name(&extraction.artifact.file_name))
        .add_filter("Excel", &["xlsx"])
        .save_file();

    if let Some(path) = file {
        state.save_artifact(&path);
    }
}
