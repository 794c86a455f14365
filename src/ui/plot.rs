use eframe::egui::{Color32, Ui};
use egui_plot::{GridMark, Line, MarkerShape, Plot, PlotPoints, PlotUi, Points, Polygon};

use subject_browser::data::audiogram::{AudiogramThresholds, Ear, GroupAudiogram};

use crate::color::{ear_color, severity_bands};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Audiogram axes
// ---------------------------------------------------------------------------
//
// Frequency is plotted as log10(Hz) and threshold as -dB HL so that louder
// thresholds sit lower on the chart, as audiograms are conventionally drawn.

const FREQ_TICKS: [u32; 6] = [250, 500, 1000, 2000, 4000, 8000];
const X_RANGE_HZ: (f64, f64) = (200.0, 9500.0);

fn to_point(freq: u32, db: f64) -> [f64; 2] {
    [(freq as f64).log10(), -db]
}

fn audiogram_axes(id: &'static str) -> Plot<'static> {
    Plot::new(id)
        .x_axis_label("Frequency (Hz)")
        .y_axis_label("Hearing Threshold (dB HL)")
        .include_x(X_RANGE_HZ.0.log10())
        .include_x(X_RANGE_HZ.1.log10())
        .include_y(10.0)
        .include_y(-120.0)
        .allow_drag(false)
        .allow_scroll(false)
        .x_axis_formatter(|mark: GridMark, _range| {
            let hz = 10f64.powf(mark.value);
            FREQ_TICKS
                .iter()
                .find(|&&t| (t as f64 / hz - 1.0).abs() < 0.05)
                .map(|t| t.to_string())
                .unwrap_or_default()
        })
        .y_axis_formatter(|mark: GridMark, _range| format!("{}", -mark.value))
}

fn draw_bands(plot_ui: &mut PlotUi) {
    let (x0, x1) = (X_RANGE_HZ.0.log10(), X_RANGE_HZ.1.log10());
    for band in severity_bands() {
        let corners: PlotPoints = vec![
            [x0, -band.lower],
            [x1, -band.lower],
            [x1, -band.upper],
            [x0, -band.upper],
        ]
        .into();
        plot_ui.polygon(
            Polygon::new(corners)
                .fill_color(band.fill)
                .stroke((0.0, Color32::TRANSPARENT))
                .name(band.name),
        );
    }
    // 25 dB HL: upper limit of normal hearing
    plot_ui.hline(egui_plot::HLine::new(-25.0).color(Color32::BLACK).width(1.0));
}

// ---------------------------------------------------------------------------
// Single-subject audiogram
// ---------------------------------------------------------------------------

pub fn subject_audiogram(ui: &mut Ui, state: &AppState) {
    let Some(view) = &state.selected else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("Select a subject to view their audiogram.");
        });
        return;
    };
    ui.strong(format!("Audiogram for Participant {}", view.id));
    let thresholds: &AudiogramThresholds = &view.audiogram;

    audiogram_axes("subject_audiogram")
        .legend(egui_plot::Legend::default())
        .show(ui, |plot_ui| {
            draw_bands(plot_ui);
            for ear in Ear::BOTH {
                let color = ear_color(ear);
                let air: Vec<[f64; 2]> = thresholds
                    .air_series(ear)
                    .into_iter()
                    .map(|(f, t)| to_point(f, t as f64))
                    .collect();
                let marker = match ear {
                    Ear::Right => MarkerShape::Circle,
                    Ear::Left => MarkerShape::Cross,
                };
                plot_ui.line(
                    Line::new(PlotPoints::from(air.clone()))
                        .color(color)
                        .width(1.5)
                        .name(format!("{ear} AC")),
                );
                plot_ui.points(Points::new(air).shape(marker).radius(4.0).color(color));

                let bone: Vec<[f64; 2]> = thresholds
                    .bone_series(ear)
                    .into_iter()
                    .map(|(f, t)| to_point(f, t as f64))
                    .collect();
                let bone_marker = match ear {
                    Ear::Right => MarkerShape::Left,
                    Ear::Left => MarkerShape::Right,
                };
                plot_ui.points(
                    Points::new(bone)
                        .shape(bone_marker)
                        .radius(5.0)
                        .color(color)
                        .name(format!("{ear} BC")),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Group audiogram
// ---------------------------------------------------------------------------

pub fn group_audiogram(ui: &mut Ui, group: &GroupAudiogram) {
    ui.strong(format!("Audiograms (n={})", group.subjects));
    audiogram_axes("group_audiogram").show(ui, |plot_ui| {
        for (ear, curve) in &group.curves {
            if curve.is_empty() {
                continue;
            }
            let points: Vec<[f64; 2]> = curve.iter().map(|&(f, t)| to_point(f, t)).collect();
            plot_ui.line(
                Line::new(PlotPoints::from(points))
                    .color(ear_color(*ear).gamma_multiply(0.35))
                    .width(1.0),
            );
        }
        let mean: Vec<[f64; 2]> = group.mean.iter().map(|&(f, t)| to_point(f, t)).collect();
        plot_ui.line(
            Line::new(PlotPoints::from(mean.clone()))
                .color(Color32::BLACK)
                .width(3.0)
                .style(egui_plot::LineStyle::dashed_loose())
                .name("mean"),
        );
        plot_ui.points(Points::new(mean).radius(4.0).color(Color32::BLACK));
    });
}
