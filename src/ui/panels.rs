use eframe::egui::{self, Color32, RichText, Ui};

use crate::analysis::eval::{EvalError, Metrics};
use crate::data::filter::{dept_choices, store_choices};
use crate::export;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – selection widgets and metrics
// ---------------------------------------------------------------------------

/// Render the selection panel: store dropdown, dependent department
/// dropdown, and the metrics readout for the active slice.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Selection");
    ui.separator();

    let Some(bundle) = &state.bundle else {
        ui.label("No data bundle loaded.");
        return;
    };
    let caps = bundle.caps;

    if !caps.has_store {
        ui.label("No store column in this dataset; showing the full validation set.");
    } else {
        let stores = store_choices(&bundle.validation);
        let current = state.selection.store.clone();
        let mut picked = None;

        egui::ComboBox::from_label("Store")
            .selected_text(
                current
                    .as_ref()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "–".to_string()),
            )
            .show_ui(ui, |ui: &mut Ui| {
                for store in &stores {
                    if ui
                        .selectable_label(current.as_ref() == Some(store), store.to_string())
                        .clicked()
                    {
                        picked = Some(store.clone());
                    }
                }
            });

        if let Some(store) = picked {
            state.set_store(store);
        }

        if caps.has_dept {
            dept_combo(ui, state);
        }
    }

    ui.add_space(8.0);
    ui.heading("Metrics");
    ui.separator();
    metrics_panel(ui, state);
}

/// Department dropdown, scoped to the selected store. The first entry
/// clears the constraint.
fn dept_combo(ui: &mut Ui, state: &mut AppState) {
    let Some(bundle) = &state.bundle else { return };
    let Some(store) = state.selection.store.clone() else {
        return;
    };

    let depts = dept_choices(&bundle.validation, &store);
    let current = state.selection.dept.clone();
    let mut picked = None;

    egui::ComboBox::from_label("Dept")
        .selected_text(
            current
                .as_ref()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "All".to_string()),
        )
        .show_ui(ui, |ui: &mut Ui| {
            if ui.selectable_label(current.is_none(), "All").clicked() {
                picked = Some(None);
            }
            for dept in &depts {
                if ui
                    .selectable_label(current.as_ref() == Some(dept), dept.to_string())
                    .clicked()
                {
                    picked = Some(Some(dept.clone()));
                }
            }
        });

    if let Some(dept) = picked {
        state.set_dept(dept);
    }
}

fn metrics_panel(ui: &mut Ui, state: &AppState) {
    match &state.evaluation {
        Some(Ok(eval)) => {
            ui.label(format!("{} rows · {}", eval.len(), state.selection.label()));
            ui.add_space(4.0);
            ui.monospace(format!("MAE   {:>12.2}", eval.metrics.mae));
            ui.monospace(format!("RMSE  {:>12.2}", eval.metrics.rmse));
            ui.monospace(format!("R²    {:>12}", r_squared_text(&eval.metrics)));
            ui.add_space(4.0);
            let stats = &eval.residual_stats;
            ui.monospace(format!("resid mean   {:>10.2}", stats.mean));
            ui.monospace(format!("resid σ      {:>10.2}", stats.std_dev));
            ui.monospace(format!("resid median {:>10.2}", stats.median));
        }
        Some(Err(EvalError::EmptySelection)) => {
            ui.label(RichText::new("No data for this selection.").color(Color32::LIGHT_RED));
            ui.label("Pick a different store or department.");
        }
        None => {
            ui.label("Nothing evaluated yet.");
        }
    }
}

fn r_squared_text(metrics: &Metrics) -> String {
    match metrics.r_squared {
        Some(r2) => format!("{r2:.4}"),
        None => "undefined".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Reload data").clicked() {
                state.reload();
                ui.close_menu();
            }
            if ui.button("Export predictions…").clicked() {
                export_current(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(bundle) = &state.bundle {
            ui.label(format!(
                "{} validation rows · {} train rows · {} features",
                bundle.validation.len(),
                bundle.train_features.len(),
                bundle.features.names.len()
            ));
        }

        ui.separator();

        let exportable = matches!(&state.evaluation, Some(Ok(_)));
        if ui
            .add_enabled(exportable, egui::Button::new("Export CSV"))
            .clicked()
        {
            export_current(state);
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

fn export_current(state: &mut AppState) {
    let Some(Ok(eval)) = &state.evaluation else {
        return;
    };
    match export::save_with_dialog(eval, &state.selection) {
        Ok(Some(path)) => {
            state.status_message = Some(format!("Saved {path}"));
        }
        Ok(None) => {}
        Err(e) => {
            log::error!("export failed: {e:#}");
            state.status_message = Some(format!("Export error: {e:#}"));
        }
    }
}
