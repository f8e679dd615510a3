//! Throughput line chart.

use apollo_apps::stores::ThroughputSeries;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

pub const CHART_TITLE: &str = " Throughput (Kbps) ";

const LINE_COLOR: Color = Color::Rgb(233, 69, 96);
const FILL_COLOR: Color = Color::Rgb(88, 30, 45);

/// `(index, kbps)` points in series order.
pub fn chart_points(series: &ThroughputSeries) -> Vec<(f64, f64)> {
    series
        .values()
        .into_iter()
        .enumerate()
        .map(|(i, v)| (i as f64, v))
        .collect()
}

/// Y upper bound with some headroom, never zero.
fn y_upper_bound(peak: f64) -> f64 {
    if peak <= 0.0 {
        1.0
    } else {
        peak * 1.2
    }
}

pub fn draw_throughput(f: &mut Frame, series: &ThroughputSeries, area: Rect) {
    let points = chart_points(series);
    // Axis spans the samples present, so the edge labels sit over the edge points
    let x_max = (series.len().max(2) - 1) as f64;
    let y_max = y_upper_bound(series.peak_kbps());

    let first_label = series.iter().next().map(|s| s.label.clone()).unwrap_or_default();
    let last_label = series.latest().map(|s| s.label.clone()).unwrap_or_default();
    let latest = series
        .latest()
        .map(|s| format!("{} Kbps", s.display_value()))
        .unwrap_or_else(|| "waiting for data".to_string());

    let datasets = vec![
        Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Bar)
            .style(Style::default().fg(FILL_COLOR))
            .data(&points),
        Dataset::default()
            .name(latest)
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(LINE_COLOR))
            .data(&points),
    ];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(
                    CHART_TITLE,
                    Style::default().add_modifier(Modifier::BOLD),
                )),
        )
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, x_max])
                .labels(vec![first_label, last_label]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, y_max])
                .labels(vec![
                    "0".to_string(),
                    format!("{:.0}", y_max / 2.0),
                    format!("{:.0}", y_max),
                ]),
        );

    f.render_widget(chart, area);
}
