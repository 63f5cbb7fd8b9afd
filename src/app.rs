use eframe::egui;

use crate::config::AppConfig;
use crate::state::AppState;
use crate::ui::{panels, results};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct LabExtractApp {
    pub state: AppState,
}

impl LabExtractApp {
    /// Build the app and load the default dataset.
    pub fn new(config: AppConfig) -> Self {
        let mut state = AppState::new(config);
        state.load_default();
        Self { state }
    }
}

impl eframe::App for LabExtractApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Files dropped on the window replace the dataset ----
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if let Some(file) = dropped.into_iter().next() {
            match (file.path, file.bytes) {
                (Some(path), _) => self.state.load_upload(&path),
                (None, Some(bytes)) => self.state.load_upload_bytes(&file.name, bytes.to_vec()),
                (None, None) => {}
            }
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: selections ----
        egui::SidePanel::left("selection_panel")
            .default_width(280.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: results ----
        egui::CentralPanel::default().show(ctx, |ui| {
            results::results_panel(ui, &mut self.state);
        });
    }
}
