use eframe::egui::{Color32, RichText, ScrollArea, Ui};
use egui_plot::{Bar, BarChart, Legend, Plot, PlotPoints, Points};

use crate::color::ColorMap;
use crate::dashboard::{BarMode, HistogramChart, PAGE_HEADER, RenderPayload, ScatterChart};
use crate::state::AppState;

const CHART_HEIGHT: f32 = 360.0;

// ---------------------------------------------------------------------------
// Dashboard (central panel)
// ---------------------------------------------------------------------------

/// Render every chart of the current payload in the central panel.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    let Some(payload) = &state.payload else {
        ui.centered_and_justified(|ui: &mut Ui| match &state.status_message {
            Some(msg) => {
                ui.heading(RichText::new(msg).color(Color32::RED));
            }
            None => {
                ui.heading("Open a listings file to view charts  (File → Open…)");
            }
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading(PAGE_HEADER);
            ui.add_space(8.0);

            scatter_section(ui, "median_by_type", &payload.median_by_type);
            if let Some(chart) = &payload.median_by_make {
                scatter_section(ui, "median_by_make", chart);
            }
            if let Some(chart) = &payload.days_listed {
                histogram_section(ui, "days_listed", chart);
            }
            if let Some(chart) = &payload.condition {
                histogram_section(ui, "condition", chart);
            }

            conclusion(ui, payload);
        });
}

fn conclusion(ui: &mut Ui, payload: &RenderPayload) {
    ui.add_space(12.0);
    ui.label(RichText::new("Conclusion:").heading());
    ui.label(payload.conclusion);
}

// ---------------------------------------------------------------------------
// Scatter: median price vs model year
// ---------------------------------------------------------------------------

fn scatter_section(ui: &mut Ui, id: &str, chart: &ScatterChart) {
    ui.label(RichText::new(chart.heading).strong().size(16.0));
    let colors = ColorMap::new(chart.series.iter().map(|s| s.label.as_str()));

    ui.label(chart.title);
    Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(chart.x_title)
        .y_axis_label(chart.y_title)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for s in &chart.series {
                let points: PlotPoints = s.points.iter().copied().collect();
                plot_ui.points(
                    Points::new(points)
                        .name(&s.label)
                        .color(colors.color_for(&s.label))
                        .radius(3.0),
                );
            }
        });
    ui.label(chart.caption);
    ui.add_space(12.0);
}

// ---------------------------------------------------------------------------
// Histogram: counts per x, one series per colour value
// ---------------------------------------------------------------------------

fn histogram_section(ui: &mut Ui, id: &str, chart: &HistogramChart) {
    ui.label(RichText::new(&chart.heading).strong().size(16.0));
    let colors = ColorMap::new(chart.series.iter().map(|s| s.label.as_str()));
    let n_series = chart.series.len().max(1);

    // Grouped bars share one category slot; stacked bars fill it.
    let width = match chart.mode {
        BarMode::Stacked => 0.9,
        BarMode::Grouped => 0.8 / n_series as f64,
    };

    let mut charts: Vec<BarChart> = Vec::with_capacity(chart.series.len());
    for (i, s) in chart.series.iter().enumerate() {
        let offset = match chart.mode {
            BarMode::Stacked => 0.0,
            BarMode::Grouped => (i as f64 - (n_series as f64 - 1.0) / 2.0) * width,
        };
        let bars: Vec<Bar> = s
            .bars
            .iter()
            .map(|&(x, count)| Bar::new(x + offset, count as f64).width(width))
            .collect();
        let mut bar_chart = BarChart::new(bars)
            .name(&s.label)
            .color(colors.color_for(&s.label));
        if chart.mode == BarMode::Stacked {
            let below: Vec<&BarChart> = charts.iter().collect();
            bar_chart = bar_chart.stack_on(&below);
        }
        charts.push(bar_chart);
    }

    let x_labels = chart.x_labels.clone();
    let mut plot = Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(chart.x_title)
        .y_axis_label(chart.y_title)
        .allow_scroll(false);
    if !x_labels.is_empty() {
        plot = plot.x_axis_formatter(move |mark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() > f64::EPSILON || idx < 0.0 {
                return String::new();
            }
            x_labels.get(idx as usize).cloned().unwrap_or_default()
        });
    }

    ui.label(chart.title.as_str());
    plot.show(ui, |plot_ui| {
        for c in charts {
            plot_ui.bar_chart(c);
        }
    });
    ui.label(chart.caption);
    ui.add_space(12.0);
}
