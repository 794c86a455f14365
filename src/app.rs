use std::path::PathBuf;

use eframe::egui;

use crate::state::AppState;
use crate::ui::{browser, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SubjectBrowserApp {
    pub state: AppState,
}

impl SubjectBrowserApp {
    pub fn new(settings_path: Option<PathBuf>) -> Self {
        Self {
            state: AppState::with_settings(settings_path),
        }
    }
}

impl eframe::App for SubjectBrowserApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state, ctx);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(420.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::filter_panel(ui, &mut self.state);
            });

        // ---- Subject list ----
        egui::SidePanel::left("subject_list")
            .default_width(140.0)
            .resizable(true)
            .show(ctx, |ui| {
                browser::subject_list(ui, &mut self.state);
            });

        // ---- Central panel: selected subject ----
        egui::CentralPanel::default().show(ctx, |ui| {
            browser::subject_details(ui, &self.state);
        });

        if self.state.show_group_audiogram {
            browser::group_window(ctx, &mut self.state);
        }
    }
}
