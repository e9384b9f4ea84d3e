//! Model performance: training curves, error histograms and sensitivity.

use rand::Rng;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, BarChart, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table},
    Frame,
};

use reactor_core::formatting::format_fixed;
use reactor_core::mock_data::{
    self, ComparisonPoint, LossPoint, CHAIN_LENGTH, ERROR_DISTRIBUTION, FEATURE_IMPORTANCE,
    PERFORMANCE_BY_TYPE, SENSITIVITY,
};
use reactor_core::models::PerformanceMetrics;

use crate::components::progress_bar::PercentBar;
use crate::screens::forward::mw_axis;
use crate::screens::panel;
use crate::themes::Theme;

/// Mock figures shown on the screen, generated once per session.
#[derive(Debug, Clone)]
pub struct PerformanceData {
    pub metrics: PerformanceMetrics,
    pub losses: Vec<LossPoint>,
    pub comparison: Vec<ComparisonPoint>,
}

impl PerformanceData {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            metrics: mock_data::model_metrics(),
            losses: mock_data::training_history(rng),
            comparison: mock_data::comparison_curve(rng),
        }
    }
}

pub fn render(frame: &mut Frame, area: Rect, data: &PerformanceData, theme: &Theme) {
    let [cards_area, charts_area, bars_area, sensitivity_area] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Min(10),
        Constraint::Length(10),
        Constraint::Length(7),
    ])
    .areas(area);

    render_cards(frame, cards_area, &data.metrics, theme);

    let [loss_area, comparison_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
            .areas(charts_area);
    render_losses(frame, loss_area, &data.losses, theme);
    render_comparison(frame, comparison_area, &data.comparison, theme);

    let [error_area, chain_area, importance_area] = Layout::horizontal([
        Constraint::Percentage(30),
        Constraint::Percentage(35),
        Constraint::Percentage(35),
    ])
    .areas(bars_area);

    frame.render_widget(
        BarChart::default()
            .block(panel("Prediction Error Distribution", theme))
            .data(&ERROR_DISTRIBUTION[..])
            .bar_width(4)
            .bar_gap(1)
            .bar_style(theme.chart_primary)
            .value_style(theme.value)
            .label_style(theme.label),
        error_area,
    );
    frame.render_widget(
        BarChart::default()
            .block(panel("Chain Length Distribution", theme))
            .data(&CHAIN_LENGTH[..])
            .bar_width(3)
            .bar_gap(1)
            .bar_style(theme.chart_secondary)
            .value_style(theme.value)
            .label_style(theme.label),
        chain_area,
    );
    frame.render_widget(
        Paragraph::new(importance_lines(theme)).block(panel("Feature Importance Rankings", theme)),
        importance_area,
    );

    render_sensitivity(frame, sensitivity_area, theme);
}

fn render_cards(frame: &mut Frame, area: Rect, m: &PerformanceMetrics, theme: &Theme) {
    let cards = [
        ("R² Score", format_fixed(m.r2_score, 3)),
        ("MSE", format_fixed(m.mse, 4)),
        ("MAE", format_fixed(m.mae, 3)),
        ("RMSE", format_fixed(m.rmse, 3)),
        (
            "Samples",
            format!("{} train / {} val", m.training_samples, m.validation_samples),
        ),
        (
            "Training",
            format!("{} epochs @ {}", m.epochs, m.learning_rate),
        ),
    ];
    let columns = Layout::horizontal(
        cards
            .iter()
            .map(|_| Constraint::Ratio(1, cards.len() as u32))
            .collect::<Vec<_>>(),
    )
    .split(area);
    for ((label, value), column) in cards.iter().zip(columns.iter()) {
        frame.render_widget(
            Paragraph::new(vec![
                Line::from(Span::styled(*label, theme.label)),
                Line::from(Span::styled(value.clone(), theme.value)),
            ])
            .block(panel("", theme)),
            *column,
        );
    }
}

fn render_losses(frame: &mut Frame, area: Rect, losses: &[LossPoint], theme: &Theme) {
    let training: Vec<(f64, f64)> = losses.iter().map(|p| (p.epoch as f64, p.training)).collect();
    let validation: Vec<(f64, f64)> = losses
        .iter()
        .map(|p| (p.epoch as f64, p.validation))
        .collect();
    let epochs = losses.last().map(|p| p.epoch as f64).unwrap_or(1.0);
    let y_max = losses
        .iter()
        .map(|p| p.training.max(p.validation))
        .fold(0.1_f64, f64::max);

    let datasets = vec![
        Dataset::default()
            .name("Training")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(theme.chart_primary)
            .data(&training),
        Dataset::default()
            .name("Validation")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(theme.chart_secondary)
            .data(&validation),
    ];
    let chart = Chart::new(datasets)
        .block(panel("Training vs Validation Loss", theme))
        .x_axis(
            Axis::default()
                .title(Span::styled("Epochs", theme.label))
                .style(theme.dim)
                .bounds([1.0, epochs])
                .labels(vec![
                    Span::styled("1", theme.dim),
                    Span::styled(format_fixed(epochs, 0), theme.dim),
                ]),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled("Loss", theme.label))
                .style(theme.dim)
                .bounds([0.0, y_max])
                .labels(vec![
                    Span::styled("0", theme.dim),
                    Span::styled(format_fixed(y_max, 2), theme.dim),
                ]),
        );
    frame.render_widget(chart, area);
}

fn render_comparison(frame: &mut Frame, area: Rect, points: &[ComparisonPoint], theme: &Theme) {
    let predicted: Vec<(f64, f64)> = points
        .iter()
        .filter(|p| p.mw > 0.0)
        .map(|p| (p.mw.log10(), p.predicted))
        .collect();
    let experimental: Vec<(f64, f64)> = points
        .iter()
        .filter(|p| p.mw > 0.0)
        .map(|p| (p.mw.log10(), p.experimental))
        .collect();
    let y_max = points
        .iter()
        .map(|p| p.predicted.max(p.experimental))
        .fold(0.1_f64, f64::max);

    let datasets = vec![
        Dataset::default()
            .name("Predicted")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(theme.chart_primary)
            .data(&predicted),
        Dataset::default()
            .name("Experimental")
            .marker(Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(theme.chart_secondary)
            .data(&experimental),
    ];
    let chart = Chart::new(datasets)
        .block(panel("Predicted vs Experimental MWD", theme))
        .x_axis(mw_axis(theme))
        .y_axis(
            Axis::default()
                .style(theme.dim)
                .bounds([0.0, y_max])
                .labels(vec![
                    Span::styled("0", theme.dim),
                    Span::styled(format_fixed(y_max, 2), theme.dim),
                ]),
        );
    frame.render_widget(chart, area);
}

fn importance_lines(theme: &Theme) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    for (name, importance) in FEATURE_IMPORTANCE {
        let mut bar = PercentBar::from_fraction(importance, theme);
        bar.config.width = 12;
        let mut spans = vec![Span::styled(format!("{name:<17}"), theme.label)];
        spans.extend(bar.to_line().spans);
        lines.push(Line::from(spans));
    }
    lines.push(Line::from(""));
    for (reactor, accuracy) in PERFORMANCE_BY_TYPE {
        let value = if accuracy == 0 {
            Span::styled("Coming Soon", theme.warning)
        } else {
            Span::styled(format!("{accuracy}% accuracy"), theme.value)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{reactor} Reactor: "), theme.label),
            value,
        ]));
    }
    lines
}

fn render_sensitivity(frame: &mut Frame, area: Rect, theme: &Theme) {
    let header = Row::new(vec!["Parameter", "Low", "Medium", "High"]).style(theme.table_header);
    let rows: Vec<Row> = SENSITIVITY
        .iter()
        .map(|s| {
            Row::new(vec![
                Cell::from(s.param),
                Cell::from(format_fixed(s.low, 2)),
                Cell::from(format_fixed(s.med, 2)),
                Cell::from(format_fixed(s.high, 2)),
            ])
            .style(theme.table_row)
        })
        .collect();
    frame.render_widget(
        Table::new(
            rows,
            [
                Constraint::Length(12),
                Constraint::Length(8),
                Constraint::Length(8),
                Constraint::Length(8),
            ],
        )
        .header(header)
        .block(panel("Parameter Sensitivity", theme)),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[test]
    fn test_generate_uses_mock_figures() {
        let data = PerformanceData::generate(&mut StdRng::seed_from_u64(3));
        assert_eq!(data.metrics.r2_score, 0.943);
        assert_eq!(data.losses.len(), 50);
        assert!(!data.comparison.is_empty());
    }

    #[test]
    fn test_importance_shown_as_whole_percent() {
        let theme = Theme::dark();
        let text: String = importance_lines(&theme)
            .iter()
            .flat_map(|l| l.spans.iter().map(|s| s.content.to_string()))
            .collect();
        assert!(text.contains("92%"));
        assert!(text.contains("52%"));
        assert!(text.contains("Coming Soon"));
    }

    #[test]
    fn test_render_smoke() {
        let data = PerformanceData::generate(&mut StdRng::seed_from_u64(9));
        let theme = Theme::light();
        let mut terminal = Terminal::new(TestBackend::new(140, 45)).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), &data, &theme))
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Training vs Validation Loss"));
        assert!(text.contains("0.943"));
        assert!(text.contains("Parameter Sensitivity"));
    }
}
