use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(payload) = &state.payload else {
        ui.label(state.no_charts_message());
        return;
    };

    // Clone what we need so we can mutate state after the widgets.
    let choices = payload.type_choices.clone();
    let first = state.request.selection.first.clone();
    let second = state.request.selection.second.clone();
    let mut show_by_make = state.request.show_by_make;
    let mut show_optional = state.optional_visible();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Vehicle type pickers ----
            ui.strong("Median price by type");
            if let Some(picked) = type_picker(ui, "first_type", "Select first vehicle type", &first, &choices) {
                state.set_first_type(picked);
            }
            if let Some(picked) = type_picker(ui, "second_type", "Select second vehicle type", &second, &choices) {
                state.set_second_type(picked);
            }
            ui.horizontal(|ui: &mut Ui| {
                if ui.button("Show All").clicked() {
                    state.reset_selection();
                }
                if state.request.selection.is_active() {
                    ui.label(RichText::new("filtered to two types").weak());
                }
            });
            ui.separator();

            // ---- Toggles ----
            if ui.checkbox(&mut show_by_make, "Show by Make").changed() {
                state.set_show_by_make(show_by_make);
            }
            if ui
                .checkbox(&mut show_optional, "Show optional charts")
                .changed()
            {
                state.set_show_optional(show_optional);
            }
            ui.separator();

            // ---- Dataset info (collapsible) ----
            dataset_info(ui, state);
        });
}

/// A combo box over the vehicle types. Returns the new value when the user
/// picked something different from `current`.
fn type_picker(
    ui: &mut Ui,
    id: &str,
    label: &str,
    current: &Option<String>,
    choices: &[String],
) -> Option<Option<String>> {
    let mut picked = None;
    ui.label(label);
    egui::ComboBox::from_id_salt(id)
        .selected_text(current.as_deref().unwrap_or("(any)"))
        .show_ui(ui, |ui: &mut Ui| {
            if ui.selectable_label(current.is_none(), "(any)").clicked() && current.is_some() {
                picked = Some(None);
            }
            for choice in choices {
                let selected = current.as_deref() == Some(choice.as_str());
                if ui.selectable_label(selected, choice).clicked() && !selected {
                    picked = Some(Some(choice.clone()));
                }
            }
        });
    picked
}

fn dataset_info(ui: &mut Ui, state: &AppState) {
    let Some(summary) = &state.summary else {
        return;
    };
    let header_text = format!("Dataset info  ({} rows)", summary.rows);

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt("dataset_info")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            if let Some(payload) = &state.payload {
                ui.label(format!(
                    "{} prepared, {} with known model year",
                    payload.total_listings, payload.known_year_listings
                ));
                if payload.report.rows_dropped > 0 {
                    ui.label(format!(
                        "{} rows dropped (blank model)",
                        payload.report.rows_dropped
                    ));
                }
            }

            TableBuilder::new(ui)
                .id_salt("dataset_info_table")
                .striped(true)
                .vscroll(false)
                .column(Column::auto())
                .column(Column::auto())
                .column(Column::remainder())
                .header(18.0, |mut header| {
                    header.col(|ui| {
                        ui.strong("Column");
                    });
                    header.col(|ui| {
                        ui.strong("Non-null");
                    });
                    header.col(|ui| {
                        ui.strong("Kind");
                    });
                })
                .body(|mut body| {
                    for (name, non_null, kind) in &summary.columns {
                        body.row(16.0, |mut row| {
                            row.col(|ui| {
                                ui.label(*name);
                            });
                            row.col(|ui| {
                                ui.label(non_null.to_string());
                            });
                            row.col(|ui| {
                                ui.label(*kind);
                            });
                        });
                    }
                });
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(payload) = &state.payload {
            ui.label(format!(
                "{} listings loaded, {} with known year",
                payload.total_listings, payload.known_year_listings
            ));
        }
        if let Some(path) = &state.source {
            ui.separator();
            ui.label(RichText::new(path.display().to_string()).weak());
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open vehicle listings")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}
