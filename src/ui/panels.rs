use std::path::PathBuf;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use subject_browser::data::filter::Operator;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter form
// ---------------------------------------------------------------------------

/// Render the filter form and the filtering transcript.
pub fn filter_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter");
    ui.separator();

    if state.store.is_none() {
        ui.label("No database loaded.");
        return;
    }

    let mut scrub = state.settings.initial_scrub;
    if ui
        .checkbox(&mut scrub, "Initial Scrub")
        .on_hover_text("Remove inactive, poor-candidate and employee records after a full import")
        .changed()
    {
        state.set_initial_scrub(scrub);
    }
    ui.add_space(6.0);

    let attributes = state.attributes();

    egui::Grid::new("filter_form")
        .num_columns(3)
        .spacing([8.0, 6.0])
        .show(ui, |ui: &mut Ui| {
            ui.strong("Attribute");
            ui.strong("Operator");
            ui.strong("Value");
            ui.end_row();

            for i in 0..state.filter_rows.len() {
                let values = state.unique_values(&state.filter_rows[i].attribute);
                let row = &mut state.filter_rows[i];

                egui::ComboBox::from_id_salt(("attribute", i))
                    .selected_text(row.attribute.clone())
                    .width(150.0)
                    .show_ui(ui, |ui: &mut Ui| {
                        for col in &attributes {
                            ui.selectable_value(&mut row.attribute, col.clone(), col);
                        }
                    });

                egui::ComboBox::from_id_salt(("operator", i))
                    .selected_text(row.operator.clone())
                    .width(110.0)
                    .show_ui(ui, |ui: &mut Ui| {
                        for op in Operator::ALL {
                            ui.selectable_value(&mut row.operator, op.to_string(), op.as_str());
                        }
                    });

                ui.horizontal(|ui: &mut Ui| {
                    ui.add(
                        egui::TextEdit::singleline(&mut row.value)
                            .desired_width(120.0)
                            .hint_text("value"),
                    );
                    let takes_set = row
                        .operator
                        .parse::<Operator>()
                        .map(|op| op.takes_set())
                        .unwrap_or(false);
                    ui.add_enabled_ui(!values.is_empty(), |ui: &mut Ui| {
                        ui.menu_button("▾", |ui: &mut Ui| {
                            ScrollArea::vertical().max_height(300.0).show(ui, |ui: &mut Ui| {
                                for v in &values {
                                    let label = v.to_string();
                                    if ui.button(&label).clicked() {
                                        if takes_set && !row.value.trim().is_empty() {
                                            row.value.push(' ');
                                            row.value.push_str(&label);
                                        } else {
                                            row.value = label;
                                        }
                                        ui.close_menu();
                                    }
                                }
                            });
                        });
                    });
                });
                ui.end_row();
            }
        });

    ui.add_space(6.0);
    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Filter Records").clicked() {
            if let Err(e) = state.apply_filter_form() {
                state.report("Filtering error", &e);
            }
        }
        if ui.button("Clear").clicked() {
            state.clear_filters();
        }
    });
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui: &mut Ui| {
            for line in &state.output {
                ui.monospace(line);
                ui.add_space(4.0);
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState, ctx: &egui::Context) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Import Full Database…").clicked() {
                ui.close_menu();
                if let Some(path) = pick_csv("Import full database") {
                    if let Err(e) = state.load_full(&path) {
                        state.report("Failed to load database", &e);
                    }
                }
            }
            if ui.button("Import Filtered Database…").clicked() {
                ui.close_menu();
                if let Some(path) = pick_csv("Import filtered database") {
                    if let Err(e) = state.load_filtered(&path) {
                        state.report("Failed to load database", &e);
                    }
                }
            }
            if ui.button("Export Database…").clicked() {
                ui.close_menu();
                if let Some(path) = save_csv("filtered_db") {
                    if let Err(e) = state.export(&path) {
                        state.report("Failed to export database", &e);
                    }
                }
            }
            ui.separator();
            if ui.button("Import Filters…").clicked() {
                ui.close_menu();
                if let Some(path) = pick_csv("Import filters") {
                    if let Err(e) = state.import_filters(&path) {
                        state.report("Failed to import filters", &e);
                    }
                }
            }
            if ui.button("Export Filters…").clicked() {
                ui.close_menu();
                if let Some(path) = save_csv("filters") {
                    if let Err(e) = state.export_filters(&path) {
                        state.report("Failed to export filters", &e);
                    }
                }
            }
            ui.separator();
            if ui.button("Quit").clicked() {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        });

        ui.menu_button("Tools", |ui: &mut Ui| {
            if ui.button("Reset Filters").clicked() {
                state.clear_filters();
                ui.close_menu();
            }
            if ui.button("Group Audiogram").clicked() {
                state.show_group_audiogram = true;
                ui.close_menu();
            }
        });

        ui.separator();

        if state.store.is_some() {
            ui.label(format!("{} candidates", state.row_count()));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
            if ui.small_button("✖").clicked() {
                state.status_message = None;
            }
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs – `None` means the user cancelled
// ---------------------------------------------------------------------------

fn pick_csv(title: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("CSV", &["csv"])
        .pick_file()
}

fn save_csv(prefix: &str) -> Option<PathBuf> {
    let stamp = chrono::Local::now().format("%Y_%b_%d_%H%M");
    rfd::FileDialog::new()
        .set_file_name(format!("{prefix}_{stamp}.csv"))
        .add_filter("CSV", &["csv"])
        .save_file()
}
