//! Home screen: headline numbers and the latest prediction.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{BarChart, Paragraph, Sparkline},
    Frame,
};

use reactor_core::formatting::{format_fixed, format_number, percentage};
use reactor_core::mock_data::{RECENT_PREDICTIONS, WEEKLY_PREDICTIONS};
use reactor_core::models::{output_label, PerformanceMetrics, PredictionResult};
use reactor_data::uploads::UploadRegistry;

use crate::components::progress_bar::PercentBar;
use crate::screens::panel;
use crate::themes::Theme;

pub struct DashboardView<'a> {
    pub results: &'a [PredictionResult],
    pub uploads: &'a UploadRegistry,
    pub metrics: &'a PerformanceMetrics,
}

pub fn render(frame: &mut Frame, area: Rect, view: &DashboardView, theme: &Theme) {
    let [intro_area, cards_area, lower_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(7),
        Constraint::Min(8),
    ])
    .areas(area);

    frame.render_widget(
        Paragraph::new(vec![
            Line::from(Span::styled("Neural Networks in Polymer Growth", theme.bold)),
            Line::from(Span::styled(
                "Overview of predictions, datasets and model health.",
                theme.dim,
            )),
        ]),
        intro_area,
    );

    let [predictions_area, accuracy_area, experiments_area] = Layout::horizontal([
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
    ])
    .areas(cards_area);

    render_predictions_card(frame, predictions_area, view.results.len(), theme);
    render_accuracy_card(frame, accuracy_area, view.metrics, theme);
    render_experiments_card(frame, experiments_area, view, theme);

    let [latest_area, weekly_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
            .areas(lower_area);

    frame.render_widget(
        Paragraph::new(latest_lines(view.results.last(), theme))
            .block(panel("Last Prediction", theme)),
        latest_area,
    );
    frame.render_widget(
        BarChart::default()
            .block(panel("Predictions This Week", theme))
            .data(&WEEKLY_PREDICTIONS[..])
            .bar_width(5)
            .bar_gap(1)
            .bar_style(theme.chart_primary)
            .value_style(theme.value)
            .label_style(theme.label),
        weekly_area,
    );
}

fn render_predictions_card(frame: &mut Frame, area: Rect, count: usize, theme: &Theme) {
    let block = panel("Recent Predictions", theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [value_area, spark_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Min(1)]).areas(inner);
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(format_number(count as f64, 0), theme.value),
            Span::styled(" saved in history", theme.dim),
        ])),
        value_area,
    );
    let trend: Vec<u64> = RECENT_PREDICTIONS.iter().map(|(_, v)| *v).collect();
    frame.render_widget(
        Sparkline::default().data(trend).style(theme.chart_primary),
        spark_area,
    );
}

fn render_accuracy_card(frame: &mut Frame, area: Rect, metrics: &PerformanceMetrics, theme: &Theme) {
    let accuracy = percentage(metrics.r2_score, 1.0, 1);
    let mut bar = PercentBar::from_fraction(metrics.r2_score, theme);
    bar.config.width = 24;
    bar.config.show_percentage = false;
    frame.render_widget(
        Paragraph::new(vec![
            Line::from(Span::styled(format!("{accuracy}%"), theme.value)),
            Line::from(vec![
                Span::styled("R² Score  ", theme.label),
                Span::styled(format_fixed(metrics.r2_score, 3), theme.text),
            ]),
            bar.to_line(),
        ])
        .block(panel("Model Accuracy", theme)),
        area,
    );
}

fn render_experiments_card(frame: &mut Frame, area: Rect, view: &DashboardView, theme: &Theme) {
    frame.render_widget(
        Paragraph::new(vec![
            Line::from(vec![
                Span::styled(view.metrics.training_samples.to_string(), theme.value),
                Span::styled(" experiments", theme.dim),
            ]),
            Line::from(vec![
                Span::styled("Batch Reactor  ", theme.label),
                Span::styled(view.metrics.training_samples.to_string(), theme.text),
            ]),
            Line::from(vec![
                Span::styled("Flow Reactor   ", theme.label),
                Span::styled("Coming Soon", theme.warning),
            ]),
            Line::from(vec![
                Span::styled("Uploaded files ", theme.label),
                Span::styled(view.uploads.len().to_string(), theme.text),
                Span::styled(
                    format!(" ({} rows)", format_number(view.uploads.total_rows() as f64, 0)),
                    theme.dim,
                ),
            ]),
        ])
        .block(panel("Total Experiments", theme)),
        area,
    );
}

fn latest_lines<'a>(latest: Option<&PredictionResult>, theme: &Theme) -> Vec<Line<'a>> {
    let Some(result) = latest else {
        return vec![Line::from(Span::styled(
            "No predictions yet. Open Forward Prediction to run one.",
            theme.dim,
        ))];
    };
    let mut lines = vec![Line::from(vec![
        Span::styled("At ", theme.label),
        Span::styled(
            result.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            theme.text,
        ),
    ])];
    lines.extend(result.outputs.fields.iter().map(|f| {
        Line::from(vec![
            Span::styled(format!("{:<8}", output_label(&f.name)), theme.label),
            Span::styled(format_number(f.value, 2), theme.value),
        ])
    }));
    lines.push(Line::from(vec![
        Span::styled(format!("{:<8}", "Conf."), theme.label),
        Span::styled(
            format!("{}%", percentage(result.outputs.confidence, 1.0, 1)),
            theme.value,
        ),
    ]));
    lines
}
