use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use subject_browser::data::audiogram::Ear;
use subject_browser::data::model::{CellValue, MISSING_MARKER};

use crate::state::AppState;
use crate::ui::plot;

/// Scrollable list of the subject ids in the current store.
pub fn subject_list(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Subjects");
    ui.separator();

    let ids = state.subject_ids();
    if ids.is_empty() {
        ui.label("No subjects.");
        return;
    }
    let selected = state.selected.as_ref().map(|v| v.id.clone());
    let mut clicked: Option<CellValue> = None;

    TableBuilder::new(ui)
        .striped(true)
        .sense(egui::Sense::click())
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|ui: &mut Ui| {
                ui.strong("Subject Id");
            });
        })
        .body(|body| {
            body.rows(18.0, ids.len(), |mut row| {
                let id = &ids[row.index()];
                row.set_selected(selected.as_ref() == Some(id));
                row.col(|ui: &mut Ui| {
                    ui.label(id.to_string());
                });
                if row.response().clicked() {
                    clicked = Some(id.clone());
                }
            });
        });

    if let Some(id) = clicked {
        state.select_subject(id);
    }
}

/// Profile, coupling recommendation and audiogram of the selected subject.
pub fn subject_details(ui: &mut Ui, state: &AppState) {
    if let Some(view) = &state.selected {
        ui.horizontal(|ui: &mut Ui| {
            egui::Grid::new("subject_profile")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui: &mut Ui| {
                    let p = view.profile.as_ref();
                    for (label, value) in [
                        ("Age", or_dash(p.map(|p| &p.age))),
                        ("Miles Away", or_dash(p.map(|p| &p.miles_away))),
                        ("Smartphone", or_dash(p.map(|p| &p.smartphone_type))),
                        ("Will Not Wear", or_dash(p.map(|p| &p.will_not_wear))),
                        ("Latest Study", or_dash(p.map(|p| &p.study_info))),
                        ("Study Dates", or_dash(p.map(|p| &p.study_dates))),
                    ] {
                        ui.label(label);
                        ui.label(value);
                        ui.end_row();
                    }
                });

            ui.separator();

            egui::Grid::new("subject_devices")
                .num_columns(3)
                .striped(true)
                .show(ui, |ui: &mut Ui| {
                    ui.label("");
                    ui.strong("Right");
                    ui.strong("Left");
                    ui.end_row();

                    let p = view.profile.as_ref();
                    let pair = |r: Option<&String>, l: Option<&String>| (or_dash(r), or_dash(l));
                    let mut rows = vec![
                        ("Style", pair(p.map(|p| &p.right_style), p.map(|p| &p.left_style))),
                        (
                            "Coupling",
                            pair(p.map(|p| &p.right_coupling), p.map(|p| &p.left_coupling)),
                        ),
                        (
                            "Receiver",
                            pair(p.map(|p| &p.right_receiver), p.map(|p| &p.left_receiver)),
                        ),
                    ];
                    let rec = |f: &dyn Fn(Ear) -> String| (f(Ear::Right), f(Ear::Left));
                    match &view.recommendation {
                        Some(r) => {
                            rows.push(("Matrix", rec(&|e| r.ear(e).matrix.to_string())));
                            rows.push(("Recommended Coupling", rec(&|e| r.ear(e).coupling.to_string())));
                            rows.push(("Vent", rec(&|e| r.ear(e).vent.to_string())));
                        }
                        None => {
                            let dash = (MISSING_MARKER.to_string(), MISSING_MARKER.to_string());
                            rows.push(("Matrix", dash.clone()));
                            rows.push(("Recommended Coupling", dash.clone()));
                            rows.push(("Vent", dash));
                        }
                    }
                    for (label, (right, left)) in rows {
                        ui.label(label);
                        ui.label(right);
                        ui.label(left);
                        ui.end_row();
                    }
                });
        });

        if let Some(err) = &view.recommendation_error {
            ui.label(
                RichText::new(format!("Failed to calculate coupling type: {err}"))
                    .color(Color32::RED),
            );
        }
        ui.separator();
    }

    plot::subject_audiogram(ui, state);
}

fn or_dash(value: Option<&String>) -> String {
    value.cloned().unwrap_or_else(|| MISSING_MARKER.to_string())
}

/// Floating window with every current subject's audiogram.
pub fn group_window(ctx: &egui::Context, state: &mut AppState) {
    let mut open = state.show_group_audiogram;
    egui::Window::new("Group Audiogram")
        .open(&mut open)
        .default_size([700.0, 450.0])
        .show(ctx, |ui: &mut Ui| match &state.group {
            Some(group) if group.subjects > 0 => plot::group_audiogram(ui, group),
            _ => {
                ui.label("No audiograms in the current dataset.");
            }
        });
    state.show_group_audiogram = open;
}
