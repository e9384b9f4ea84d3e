//! Forward prediction: reaction-condition form, result table and MWD chart.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    symbols::Marker,
    text::{Line, Span, Text},
    widgets::{Axis, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, Tabs},
    Frame,
};

use reactor_core::error::{DashboardError, Result};
use reactor_core::formatting::{decade_label, delta_indicator, format_fixed};
use reactor_core::models::{output_label, ConditionsForm, MwdPoint, PredictionResult, ReactionConditions};
use reactor_core::mwd;

use crate::components::banner::WarningBanner;
use crate::screens::panel;
use crate::themes::Theme;

/// Decimals shown for predicted molecular weights.
const OUTPUT_DECIMALS: usize = 2;
const CONFIDENCE_DECIMALS: usize = 4;

// ── State ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultView {
    #[default]
    Chart,
    Table,
}

/// Editable form plus view toggles.
#[derive(Debug, Clone, Default)]
pub struct ForwardState {
    pub form: ConditionsForm,
    pub selected: usize,
    /// Text being typed into the selected field, if editing.
    pub editing: Option<String>,
    pub view: ResultView,
}

impl ForwardState {
    pub fn new(form: ConditionsForm) -> Self {
        Self {
            form,
            ..Self::default()
        }
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % ReactionConditions::FIELD_NAMES.len();
    }

    pub fn select_prev(&mut self) {
        let n = ReactionConditions::FIELD_NAMES.len();
        self.selected = (self.selected + n - 1) % n;
    }

    /// Start editing the selected field from its current value.
    pub fn begin_edit(&mut self) {
        let current = self.form.slots()[self.selected]
            .map(|v| v.to_string())
            .unwrap_or_default();
        self.editing = Some(current);
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(buffer) = self.editing.as_mut() {
            if c.is_ascii_digit() || matches!(c, '.' | '-' | 'e' | 'E' | '+') {
                buffer.push(c);
            }
        }
    }

    pub fn backspace(&mut self) {
        if let Some(buffer) = self.editing.as_mut() {
            buffer.pop();
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Store the typed value. An empty buffer clears the field.
    pub fn commit_edit(&mut self) -> Result<()> {
        let Some(buffer) = self.editing.take() else {
            return Ok(());
        };
        let trimmed = buffer.trim();
        let value = if trimmed.is_empty() {
            None
        } else {
            let parsed: f64 = trimmed.parse().map_err(|_| {
                DashboardError::Parse(format!(
                    "'{trimmed}' is not a number for {}",
                    ReactionConditions::LABELS[self.selected]
                ))
            })?;
            if !parsed.is_finite() {
                return Err(DashboardError::Parse(format!("'{trimmed}' is not finite")));
            }
            Some(parsed)
        };
        if let Some(slot) = self.form.slot_mut(self.selected) {
            *slot = value;
        }
        Ok(())
    }

    pub fn toggle_view(&mut self) {
        self.view = match self.view {
            ResultView::Chart => ResultView::Table,
            ResultView::Table => ResultView::Chart,
        };
    }
}

// ── Rendering ─────────────────────────────────────────────────────────────────

pub struct ForwardView<'a> {
    pub state: &'a ForwardState,
    /// Prediction history, oldest first.
    pub results: &'a [PredictionResult],
    /// Requests submitted but not yet answered.
    pub pending: usize,
}

pub fn render(frame: &mut Frame, area: Rect, view: &ForwardView, theme: &Theme) {
    let [left, right] =
        Layout::horizontal([Constraint::Length(38), Constraint::Min(40)]).areas(area);

    let [reactor_area, form_area, help_area] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Length(10),
        Constraint::Min(0),
    ])
    .areas(left);

    frame.render_widget(
        Paragraph::new(vec![
            Line::from(vec![
                Span::styled("(●) ", theme.info),
                Span::styled("Batch Reactor", theme.text),
            ]),
            Line::from(vec![
                Span::styled("( ) Flow Reactor ", theme.dim),
                Span::styled("Coming Soon", theme.warning),
            ]),
        ])
        .block(panel("Reactor Configuration", theme)),
        reactor_area,
    );

    frame.render_widget(
        Paragraph::new(form_lines(view.state, theme)).block(panel("Reaction Conditions", theme)),
        form_area,
    );

    frame.render_widget(
        Paragraph::new(vec![
            Line::from(Span::styled("↑/↓ select   Enter edit   p predict", theme.dim)),
            Line::from(Span::styled("v chart/table   x clear history", theme.dim)),
            Line::from(Span::styled("c/j/h export CSV / JSON / HTML", theme.dim)),
        ])
        .block(panel("Keys", theme)),
        help_area,
    );

    let [banner_area, tabs_area, content_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(right);

    frame.render_widget(
        Paragraph::new(WarningBanner::prediction(theme).to_line()),
        banner_area,
    );

    let selected = match view.state.view {
        ResultView::Chart => 0,
        ResultView::Table => 1,
    };
    frame.render_widget(
        Tabs::new(vec!["Chart View", "Table View"])
            .select(selected)
            .style(theme.tab_inactive)
            .highlight_style(theme.tab_active)
            .divider(" | "),
        tabs_area,
    );

    match view.state.view {
        ResultView::Chart => render_chart(frame, content_area, view, theme),
        ResultView::Table => render_table(frame, content_area, view, theme),
    }
}

fn form_lines<'a>(state: &ForwardState, theme: &Theme) -> Vec<Line<'a>> {
    let slots = state.form.slots();
    let mut lines: Vec<Line> = ReactionConditions::LABELS
        .iter()
        .enumerate()
        .map(|(idx, label)| {
            let is_selected = idx == state.selected;
            let marker = if is_selected { "› " } else { "  " };
            let label = format!("{marker}{label:<10}");
            match (&state.editing, is_selected) {
                (Some(buffer), true) => Line::from(vec![
                    Span::styled(label, theme.selected),
                    Span::styled(buffer.clone(), theme.value),
                    Span::styled("█", theme.info),
                ]),
                _ => {
                    let value = match slots[idx] {
                        Some(v) => Span::styled(v.to_string(), theme.value),
                        None => Span::styled("(required)", theme.error),
                    };
                    let label_style = if is_selected { theme.selected } else { theme.label };
                    Line::from(vec![Span::styled(label, label_style), value])
                }
            }
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("[p] Predict MWD", theme.info)));
    lines
}

/// Predicted curve of the latest result, or the preview curve when there is
/// none yet.
fn chart_points(results: &[PredictionResult]) -> (Vec<(f64, f64)>, bool) {
    let curve: Vec<MwdPoint> = match results.last() {
        Some(latest) if !latest.mwd_data.is_empty() => latest.mwd_data.clone(),
        _ => return (to_log_points(&mwd::preview_curve()), false),
    };
    (to_log_points(&curve), true)
}

pub(crate) fn to_log_points(curve: &[MwdPoint]) -> Vec<(f64, f64)> {
    curve
        .iter()
        .filter(|p| p.mw > 0.0)
        .map(|p| (p.mw.log10(), p.predicted))
        .collect()
}

/// Log-scale molecular weight axis from 10² to 10⁶.
pub(crate) fn mw_axis<'a>(theme: &Theme) -> Axis<'a> {
    Axis::default()
        .title(Span::styled("Molecular Weight (g/mol)", theme.label))
        .style(theme.dim)
        .bounds([2.0, 6.0])
        .labels((2..=6).map(|e| Span::styled(decade_label(e), theme.dim)).collect::<Vec<_>>())
}

fn render_chart(frame: &mut Frame, area: Rect, view: &ForwardView, theme: &Theme) {
    let (points, predicted) = chart_points(view.results);
    let y_max = points
        .iter()
        .map(|(_, y)| *y)
        .fold(1.0_f64, f64::max);

    let name = if predicted { "Predicted" } else { "Preview" };
    let style = if predicted { theme.chart_primary } else { theme.dim };
    let datasets = vec![Dataset::default()
        .name(name)
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(style)
        .data(&points)];

    let title = if view.pending > 0 {
        "Molecular Weight Distribution (loading…)"
    } else {
        "Molecular Weight Distribution"
    };
    let chart = Chart::new(datasets)
        .block(panel(title, theme))
        .x_axis(mw_axis(theme))
        .y_axis(
            Axis::default()
                .title(Span::styled("Weight Fraction", theme.label))
                .style(theme.dim)
                .bounds([0.0, y_max])
                .labels(vec![
                    Span::styled("0", theme.dim),
                    Span::styled(format_fixed(y_max / 2.0, 1), theme.dim),
                    Span::styled(format_fixed(y_max, 1), theme.dim),
                ]),
        );
    frame.render_widget(chart, area);
}

/// Output field names in the order of the first result.
fn output_names(results: &[PredictionResult]) -> Vec<String> {
    results
        .first()
        .map(|r| r.outputs.fields.iter().map(|f| f.name.clone()).collect())
        .unwrap_or_default()
}

/// Every numeric column of one result, inputs first, confidence last.
fn row_values(result: &PredictionResult, outputs: &[String]) -> Vec<Option<f64>> {
    let mut values: Vec<Option<f64>> = result.inputs.values().iter().copied().map(Some).collect();
    values.extend(outputs.iter().map(|name| result.outputs.get(name)));
    values.push(Some(result.outputs.confidence));
    values
}

fn column_decimals(outputs: usize) -> Vec<usize> {
    let mut decimals = ReactionConditions::DECIMALS.to_vec();
    decimals.extend(std::iter::repeat_n(OUTPUT_DECIMALS, outputs));
    decimals.push(CONFIDENCE_DECIMALS);
    decimals
}

fn value_cell<'a>(value: Option<f64>, previous: Option<Option<f64>>, decimals: usize, theme: &Theme) -> Cell<'a> {
    let Some(value) = value else {
        return Cell::from(Span::styled("—", theme.dim));
    };
    let mut lines = vec![Line::from(Span::styled(format_fixed(value, decimals), theme.text))];
    if let Some(Some(prev)) = previous {
        let (trend, text) = delta_indicator(value - prev);
        lines.push(Line::from(Span::styled(text, theme.trend_style(trend))));
    }
    Cell::from(Text::from(lines))
}

fn render_table(frame: &mut Frame, area: Rect, view: &ForwardView, theme: &Theme) {
    if view.results.is_empty() && view.pending == 0 {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "No predictions yet. Run a prediction to see results.",
                theme.dim,
            )))
            .block(panel("Results", theme)),
            area,
        );
        return;
    }

    let outputs = output_names(view.results);
    let decimals = column_decimals(outputs.len());

    let mut header: Vec<Cell> = vec![Cell::from("#")];
    header.extend(ReactionConditions::LABELS.iter().map(|l| Cell::from(*l)));
    header.extend(outputs.iter().map(|n| Cell::from(output_label(n))));
    header.push(Cell::from("Confidence"));
    let columns = header.len();

    let mut rows: Vec<Row> = Vec::with_capacity(view.results.len() + 1);
    let mut previous: Option<Vec<Option<f64>>> = None;
    for (index, result) in view.results.iter().enumerate() {
        let values = row_values(result, &outputs);
        let mut cells = vec![Cell::from(Span::styled(index.to_string(), theme.bold))];
        for (col, value) in values.iter().enumerate() {
            let prev = previous.as_ref().map(|p| p.get(col).copied().flatten());
            cells.push(value_cell(*value, prev, decimals[col], theme));
        }
        let style = if index % 2 == 0 { theme.table_row } else { theme.table_row_alt };
        rows.push(Row::new(cells).height(2).style(style));
        previous = Some(values);
    }
    if view.pending > 0 {
        rows.push(Row::new(vec![
            Cell::from(""),
            Cell::from(Span::styled("Loading Next...", theme.dim)),
        ]));
    }

    let mut widths = vec![Constraint::Length(3)];
    widths.extend(std::iter::repeat_n(Constraint::Min(10), columns - 1));

    let table = Table::new(rows, widths)
        .header(Row::new(header).style(theme.table_header).bottom_margin(1))
        .block(panel("Results", theme))
        .column_spacing(1);
    frame.render_widget(table, area);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
