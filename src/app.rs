use eframe::egui;

use crate::data::loader::DataConfig;
use crate::state::AppState;
use crate::ui::{charts, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SalescopeApp {
    pub state: AppState,
}

impl SalescopeApp {
    /// Load the bundle once; every later frame reads the cached state.
    pub fn new(config: DataConfig) -> Self {
        Self {
            state: AppState::load(config),
        }
    }
}

impl eframe::App for SalescopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: selection + metrics ----
        egui::SidePanel::left("selection_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: diagnostic charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            charts::diagnostics(ui, &self.state);
        });
    }
}
