use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::loader::WORKBOOK_EXTENSIONS;
use crate::data::model::CellValue;
use crate::state::{AppState, Notice};

// ---------------------------------------------------------------------------
// Left side panel – selection widgets
// ---------------------------------------------------------------------------

/// Render the left selection panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Selection parameters");
            ui.separator();

            // ---- Upload ----
            ui.strong("Load your data");
            if ui
                .button("Load workbook…")
                .on_hover_text("Load your laboratory database (.xlsx / .xls)")
                .clicked()
            {
                open_file_dialog(state);
            }
            match &state.upload_notice {
                Some(Notice::Success(msg)) => {
                    ui.label(RichText::new(msg).color(Color32::DARK_GREEN));
                }
                Some(Notice::Error(msg)) => {
                    ui.label(RichText::new(msg).color(Color32::RED));
                }
                None => {}
            }
            ui.separator();

            if state.table.is_none() {
                ui.label("No dataset loaded.");
                return;
            }

            selectors(ui, state);

            ui.add_space(6.0);
            let generate = egui::Button::new(RichText::new("Generate extraction").strong())
                .min_size(egui::vec2(ui.available_width(), 28.0));
            if ui.add(generate).clicked() {
                state.generate();
            }
            if let Some(msg) = &state.status_message {
                ui.label(RichText::new(msg).color(Color32::RED));
            }

            // ---- Quick presets ----
            ui.separator();
            ui.strong("Quick analyses");
            let presets: Vec<String> = state
                .config
                .presets
                .iter()
                .map(|p| p.label.clone())
                .collect();
            ui.horizontal_wrapped(|ui: &mut Ui| {
                for (i, label) in presets.iter().enumerate() {
                    if ui.button(label).clicked() {
                        state.apply_preset(i);
                    }
                }
            });

            // ---- Information ----
            ui.separator();
            ui.strong("Information");
            ui.label(format!("Total laboratories: {}", state.total_rows()));
            ui.label(format!("Available tiers: {}", state.tier_list()));
        });
}

fn selectors(ui: &mut Ui, state: &mut AppState) {
    // ---- Tier ----
    ui.label("Tier:");
    let tiers = state.tier_options();
    let current = state.selection.tier.clone();
    if let Some(choice) = combo(ui, "tier", current.as_ref(), &tiers) {
        state.select_tier(choice);
    }

    // ---- Variable ----
    ui.label("Variable:");
    let variables = state.variable_options();
    let current = state.selection.variable.clone().unwrap_or_default();
    egui::ComboBox::from_id_salt("variable")
        .selected_text(&current)
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            for var in &variables {
                if ui.selectable_label(current == *var, var).clicked() {
                    state.select_variable(var.clone());
                }
            }
        });

    // ---- Value ----
    ui.label("Value:");
    let values = state.value_options();
    if values.is_empty() {
        ui.label(RichText::new("No value available for this variable").color(Color32::YELLOW));
    } else {
        let current = state.selection.value.clone();
        if let Some(choice) = combo(ui, "value", current.as_ref(), &values) {
            state.select_value(choice);
        }
    }
}

/// Combo box over cell values; returns the newly clicked value.
fn combo(ui: &mut Ui, id: &str, current: Option<&CellValue>, options: &[CellValue]) -> Option<CellValue> {
    let mut picked = None;
    egui::ComboBox::from_id_salt(id)
        .selected_text(current.map(|v| v.to_string()).unwrap_or_default())
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            for opt in options {
                if ui
                    .selectable_label(current == Some(opt), opt.to_string())
                    .clicked()
                {
                    picked = Some(opt.clone());
                }
            }
        });
    picked
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Load workbook…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload default dataset").clicked() {
                state.load_default();
                ui.close_menu();
            }
            if ui.button("Quit").clicked() {
                ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
            }
        });

        ui.separator();

        if let (Some(table), Some(source)) = (&state.table, &state.source) {
            let name = source
                .path()
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            ui.label(format!("{name}: {} laboratories", table.len()));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Load laboratory data")
        .add_filter("Excel", &["xlsx", "xls"])
        .add_filter("All workbooks", WORKBOOK_EXTENSIONS)
        .pick_file();

    if let Some(path) = file {
        state.load_upload(&path);
    }
}
