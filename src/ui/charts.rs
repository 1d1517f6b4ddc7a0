use eframe::egui::{ScrollArea, Stroke, Ui};
use egui_plot::{
    Bar, BarChart, HLine, Legend, Line, LineStyle, MarkerShape, Plot, PlotPoint, PlotPoints,
    Points, Polygon, Text, VLine,
};

use crate::analysis::distribution::density_histogram;
use crate::analysis::eval::{EvalError, Evaluation};
use crate::color::ChartPalette;
use crate::state::AppState;

const CHART_HEIGHT: f32 = 320.0;
const HISTOGRAM_BINS: usize = 50;

// ---------------------------------------------------------------------------
// Central panel – the five diagnostic charts
// ---------------------------------------------------------------------------

/// Render the diagnostics for the active selection.
pub fn diagnostics(ui: &mut Ui, state: &AppState) {
    if state.bundle.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No data bundle loaded (File → Reload data)");
        });
        return;
    }

    match &state.evaluation {
        Some(Ok(eval)) => {
            let label = state.selection.label();
            let palette = state.palette;
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| {
                    ui.heading(format!("Actual vs. predicted ({label})"));
                    actual_vs_predicted(ui, &palette, eval);
                    ui.add_space(12.0);

                    ui.heading(format!("Residuals vs. predicted ({label})"));
                    residual_scatter(ui, &palette, eval);
                    ui.add_space(12.0);

                    ui.heading(format!("Weekly sales over time ({label})"));
                    time_series(ui, &palette, eval);
                    ui.add_space(12.0);

                    ui.heading(format!("Residual distribution ({label})"));
                    residual_distribution(ui, &palette, eval);
                    ui.add_space(12.0);

                    ui.heading("Top feature importances");
                    importance_chart(ui, &palette, eval);
                });
        }
        Some(Err(EvalError::EmptySelection)) => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("No data for this selection");
            });
        }
        None => {}
    }
}

// ---------------------------------------------------------------------------
// 1. Actual vs. predicted scatter with identity line
// ---------------------------------------------------------------------------

fn actual_vs_predicted(ui: &mut Ui, palette: &ChartPalette, eval: &Evaluation) {
    let points: PlotPoints = eval
        .actual
        .iter()
        .zip(&eval.predicted)
        .map(|(&a, &p)| [a, p])
        .collect();

    // Identity line spans the union of both value ranges.
    let lo = min_of(eval.actual.iter().chain(&eval.predicted));
    let hi = max_of(eval.actual.iter().chain(&eval.predicted));

    Plot::new("actual_vs_predicted")
        .legend(Legend::default())
        .x_axis_label("Actual (Weekly_Sales)")
        .y_axis_label("Predicted (Weekly_Sales)")
        .height(CHART_HEIGHT)
        .show(ui, |plot_ui| {
            plot_ui.points(
                Points::new(points)
                    .radius(2.5)
                    .color(palette.actual)
                    .name("Weeks"),
            );
            plot_ui.line(
                Line::new(PlotPoints::from(vec![[lo, lo], [hi, hi]]))
                    .color(palette.reference)
                    .style(LineStyle::dashed_loose())
                    .width(2.0)
                    .name("Perfect prediction (y = x)"),
            );
        });
}

// ---------------------------------------------------------------------------
// 2. Residuals vs. predicted with zero line, mean line, ±1σ band
// ---------------------------------------------------------------------------

fn residual_scatter(ui: &mut Ui, palette: &ChartPalette, eval: &Evaluation) {
    let points: PlotPoints = eval
        .predicted
        .iter()
        .zip(&eval.residuals)
        .map(|(&p, &r)| [p, r])
        .collect();

    let stats = eval.residual_stats;
    let x_lo = min_of(eval.predicted.iter());
    let x_hi = max_of(eval.predicted.iter());
    let band = Polygon::new(PlotPoints::from(vec![
        [x_lo, stats.mean - stats.std_dev],
        [x_hi, stats.mean - stats.std_dev],
        [x_hi, stats.mean + stats.std_dev],
        [x_lo, stats.mean + stats.std_dev],
    ]))
    .fill_color(palette.band)
    .stroke(Stroke::NONE)
    .name(format!("±1 std dev: {:.2}", stats.std_dev));

    Plot::new("residual_scatter")
        .legend(Legend::default())
        .x_axis_label("Predicted (Weekly_Sales)")
        .y_axis_label("Residual (actual − predicted)")
        .height(CHART_HEIGHT)
        .show(ui, |plot_ui| {
            plot_ui.polygon(band);
            plot_ui.points(
                Points::new(points)
                    .radius(2.5)
                    .color(palette.actual)
                    .name("Weeks"),
            );
            plot_ui.hline(
                HLine::new(0.0)
                    .color(palette.reference)
                    .style(LineStyle::dashed_loose())
                    .width(2.0)
                    .name("Zero error"),
            );
            plot_ui.hline(
                HLine::new(stats.mean)
                    .color(palette.predicted)
                    .style(LineStyle::dotted_dense())
                    .width(1.5)
                    .name(format!("Mean residual: {:.2}", stats.mean)),
            );
        });
}

// ---------------------------------------------------------------------------
// 3. Time-ordered actual vs. predicted series
// ---------------------------------------------------------------------------

fn time_series(ui: &mut Ui, palette: &ChartPalette, eval: &Evaluation) {
    let order = eval.time_order();

    // Date ordinals give true calendar spacing; positions are the
    // fallback when there is no date column (or a non-ISO date slips in).
    let xs: Vec<f64> = match &eval.dates {
        Some(dates) => {
            let ordinals: Option<Vec<f64>> = order
                .iter()
                .map(|&i| date_ordinal(&dates[i]))
                .collect();
            ordinals.unwrap_or_else(|| (0..order.len()).map(|i| i as f64).collect())
        }
        None => (0..order.len()).map(|i| i as f64).collect(),
    };

    let actual: PlotPoints = xs
        .iter()
        .zip(order.iter())
        .map(|(&x, &i)| [x, eval.actual[i]])
        .collect();
    let predicted: PlotPoints = xs
        .iter()
        .zip(order.iter())
        .map(|(&x, &i)| [x, eval.predicted[i]])
        .collect();
    let predicted_markers: PlotPoints = xs
        .iter()
        .zip(order.iter())
        .map(|(&x, &i)| [x, eval.predicted[i]])
        .collect();

    let x_label = if eval.dates.is_some() {
        "Date (days)"
    } else {
        "Row"
    };

    Plot::new("time_series")
        .legend(Legend::default())
        .x_axis_label(x_label)
        .y_axis_label("Weekly_Sales")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .height(CHART_HEIGHT)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(actual)
                    .color(palette.actual)
                    .width(2.0)
                    .name("Actual"),
            );
            plot_ui.line(
                Line::new(predicted)
                    .color(palette.predicted)
                    .style(LineStyle::dashed_loose())
                    .width(2.0)
                    .name("Predicted"),
            );
            plot_ui.points(
                Points::new(predicted_markers)
                    .shape(MarkerShape::Cross)
                    .radius(4.0)
                    .color(palette.predicted)
                    .name("Predicted"),
            );
        });
}

// ---------------------------------------------------------------------------
// 4. Residual distribution
// ---------------------------------------------------------------------------

fn residual_distribution(ui: &mut Ui, palette: &ChartPalette, eval: &Evaluation) {
    let hist = density_histogram(&eval.residuals, HISTOGRAM_BINS);
    let stats = eval.residual_stats;

    let bars: Vec<Bar> = hist
        .bins
        .iter()
        .map(|b| {
            Bar::new(b.center, b.density)
                .width(hist.bin_width)
                .fill(palette.actual.gamma_multiply(0.6))
        })
        .collect();

    let skew_text = match stats.skewness {
        Some(s) => format!("skewness: {s:.2}"),
        None => "skewness: undefined".to_string(),
    };
    ui.label(skew_text);

    Plot::new("residual_distribution")
        .legend(Legend::default())
        .x_axis_label("Residual (actual − predicted)")
        .y_axis_label("Density")
        .height(CHART_HEIGHT)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Residuals"));
            if !hist.curve.is_empty() {
                plot_ui.line(
                    Line::new(PlotPoints::from(hist.curve.clone()))
                        .color(palette.actual)
                        .width(2.0)
                        .name("Density"),
                );
            }
            plot_ui.vline(
                VLine::new(stats.mean)
                    .color(palette.reference)
                    .style(LineStyle::dashed_loose())
                    .width(1.5)
                    .name(format!("Mean: {:.2}", stats.mean)),
            );
            plot_ui.vline(
                VLine::new(stats.median)
                    .color(palette.marker)
                    .style(LineStyle::dotted_dense())
                    .width(1.5)
                    .name(format!("Median: {:.2}", stats.median)),
            );
        });
}

// ---------------------------------------------------------------------------
// 5. Top feature importances
// ---------------------------------------------------------------------------

fn importance_chart(ui: &mut Ui, palette: &ChartPalette, eval: &Evaluation) {
    let n = eval.importance.len();
    let colors = crate::color::generate_palette(n.max(1));

    // Most important feature at the top.
    let bars: Vec<Bar> = eval
        .importance
        .iter()
        .enumerate()
        .map(|(rank, (_, weight))| {
            Bar::new((n - 1 - rank) as f64, *weight)
                .width(0.6)
                .fill(colors[rank % colors.len()])
        })
        .collect();

    let labels: Vec<Text> = eval
        .importance
        .iter()
        .enumerate()
        .map(|(rank, (name, weight))| {
            Text::new(
                PlotPoint::new(*weight, (n - 1 - rank) as f64),
                format!("  {name}"),
            )
            .anchor(eframe::egui::Align2::LEFT_CENTER)
            .color(palette.actual)
        })
        .collect();

    Plot::new("feature_importance")
        .x_axis_label("Importance")
        .show_axes([true, false])
        .height(CHART_HEIGHT)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal().name("Importance"));
            for label in labels {
                plot_ui.text(label);
            }
        });
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn min_of<'a>(values: impl Iterator<Item = &'a f64>) -> f64 {
    values.copied().fold(f64::INFINITY, f64::min)
}

fn max_of<'a>(values: impl Iterator<Item = &'a f64>) -> f64 {
    values.copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Days since 1970-01-01 for an ISO `YYYY-MM-DD` string, without pulling
/// in a calendar crate (days-from-civil algorithm).
fn date_ordinal(date: &str) -> Option<f64> {
    let mut parts = date.splitn(3, '-');
    let y: i64 = parts.next()?.parse().ok()?;
    let m: i64 = parts.next()?.parse().ok()?;
    let d: i64 = parts.next()?.parse().ok()?;
    if !(1..=12).contains(&m) || !(1..=31).contains(&d) {
        return None;
    }
    let y = if m <= 2 { y - 1 } else { y };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let mp = (m + 9) % 12;
    let doy = (153 * mp + 2) / 5 + d - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    Some((era * 146097 + doe - 719468) as f64)
}

#[cfg(test)]
mod tests {
    use super::date_ordinal;

    #[test]
    fn epoch_is_day_zero() {
        assert_eq!(date_ordinal("1970-01-01"), Some(0.0));
    }

    #[test]
    fn weekly_dates_are_seven_days_apart() {
        let a = date_ordinal("2011-01-07").unwrap();
        let b = date_ordinal("2011-01-14").unwrap();
        assert_eq!(b - a, 7.0);
    }

    #[test]
    fn leap_day_is_counted() {
        let a = date_ordinal("2012-02-28").unwrap();
        let b = date_ordinal("2012-03-01").unwrap();
        assert_eq!(b - a, 2.0);
    }

    #[test]
    fn malformed_dates_are_rejected() {
        assert_eq!(date_ordinal("05/02/2010"), None);
        assert_eq!(date_ordinal("2011-13-01"), None);
        assert_eq!(date_ordinal(""), None);
    }
}
