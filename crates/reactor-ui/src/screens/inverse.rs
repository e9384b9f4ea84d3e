//! Inverse problem: pick or sketch a target MWD, then estimate the reaction
//! conditions that would produce it.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Points},
        Axis, Chart, Dataset, GraphType, Paragraph, Tabs,
    },
    Frame,
};

use reactor_core::formatting::format_fixed;
use reactor_core::inverse::{InverseState, InverseTab, SolvedParameter, MIN_DRAWN_POINTS};
use reactor_core::sketch::{Paint, Point, Raster, Surface, Tool};

use crate::components::progress_bar::ConfidenceBar;
use crate::screens::forward::{mw_axis, to_log_points};
use crate::screens::{input_line, panel};
use crate::themes::{resolve, Theme, ThemeToken};

// ── State ─────────────────────────────────────────────────────────────────────

/// Inverse-problem state plus the screen's text entry.
#[derive(Debug, Clone, Default)]
pub struct InverseScreen {
    pub problem: InverseState,
    /// Path being typed on the upload tab.
    pub path_input: Option<String>,
    /// Upload id of a target file still being read.
    pub loading: Option<String>,
}

impl InverseScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_tab(&mut self, tab: InverseTab) {
        if self.problem.tab != tab {
            self.problem.pointer_leave();
            self.problem.tab = tab;
        }
    }

    pub fn toggle_tool(&mut self) {
        let next = match self.problem.capture.tool() {
            Tool::Draw => Tool::Erase,
            Tool::Erase => Tool::Draw,
        };
        self.problem.capture.set_tool(next);
    }
}

/// Convert a terminal cell inside the canvas `inner` rect into raster
/// pixels. Cells outside the rect map to `None`.
pub fn to_raster(inner: Rect, column: u16, row: u16, raster_size: (u32, u32)) -> Option<Point> {
    if inner.width == 0
        || inner.height == 0
        || column < inner.x
        || row < inner.y
        || column >= inner.x + inner.width
        || row >= inner.y + inner.height
    {
        return None;
    }
    let (w, h) = raster_size;
    let fx = (column - inner.x) as f64 + 0.5;
    let fy = (row - inner.y) as f64 + 0.5;
    Some(Point::new(
        fx / inner.width as f64 * w as f64,
        fy / inner.height as f64 * h as f64,
    ))
}

// ── Rendering ─────────────────────────────────────────────────────────────────

/// Draw the screen. Returns the inner rect of the sketch canvas when the draw
/// tab is showing.
pub fn render(frame: &mut Frame, area: Rect, screen: &InverseScreen, theme: &Theme) -> Option<Rect> {
    let [tabs_area, target_area, status_area, solution_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(12),
        Constraint::Length(2),
        Constraint::Length(8),
    ])
    .areas(area);

    let problem = &screen.problem;
    let selected = match problem.tab {
        InverseTab::Upload => 0,
        InverseTab::Draw => 1,
    };
    frame.render_widget(
        Tabs::new(vec!["Upload Target [u]", "Draw Target [d]"])
            .select(selected)
            .style(theme.tab_inactive)
            .highlight_style(theme.tab_active)
            .divider(" | "),
        tabs_area,
    );

    let canvas = match problem.tab {
        InverseTab::Draw => Some(render_canvas(frame, target_area, problem, theme)),
        InverseTab::Upload => {
            render_upload(frame, target_area, screen, theme);
            None
        }
    };

    frame.render_widget(Paragraph::new(status_lines(screen, theme)), status_area);
    render_solution(frame, solution_area, problem, theme);
    canvas
}

fn render_canvas(frame: &mut Frame, area: Rect, problem: &InverseState, theme: &Theme) -> Rect {
    let raster: &Raster = &problem.raster;
    let (w, h) = raster.size();
    let (w, h) = (w as f64, h as f64);
    // Raster rows grow downwards; canvas y grows upwards.
    let flip = |(x, y): (u32, u32)| (x as f64, h - y as f64);
    let grid: Vec<(f64, f64)> = raster.pixels_with(Paint::Grid).map(flip).collect();
    let ink: Vec<(f64, f64)> = raster.pixels_with(Paint::Ink).map(flip).collect();

    let tool = match problem.capture.tool() {
        Tool::Draw => "Draw",
        Tool::Erase => "Erase",
    };
    let title = format!("Draw Target MWD [tool: {tool}]");
    let block = panel(&title, theme);
    let inner = block.inner(area);

    let grid_color = resolve(ThemeToken::Grid, theme.is_dark);
    let ink_color = resolve(ThemeToken::Ink, theme.is_dark);
    let label_style = theme.dim;
    let labels = raster.labels().to_vec();

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .background_color(resolve(ThemeToken::Background, theme.is_dark))
        .x_bounds([0.0, w])
        .y_bounds([0.0, h])
        .paint(move |ctx| {
            ctx.draw(&Points {
                coords: &grid,
                color: grid_color,
            });
            ctx.layer();
            ctx.draw(&Points {
                coords: &ink,
                color: ink_color,
            });
            for label in &labels {
                ctx.print(
                    label.at.x,
                    h - label.at.y,
                    Line::from(Span::styled(label.text.clone(), label_style)),
                );
            }
        });
    frame.render_widget(canvas, area);
    inner
}

fn render_upload(frame: &mut Frame, area: Rect, screen: &InverseScreen, theme: &Theme) {
    let [entry_area, chart_area] =
        Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(area);

    let entry = match (&screen.path_input, &screen.loading, screen.problem.target()) {
        (Some(buffer), _, _) => input_line("Path: ", buffer, theme),
        (None, Some(_), _) => Line::from(Span::styled("Reading target file…", theme.info)),
        (None, None, Some(target)) => Line::from(vec![
            Span::styled("Target: ", theme.label),
            Span::styled(target.name.clone(), theme.value),
            Span::styled(format!("  ({} points)", target.curve.len()), theme.dim),
        ]),
        (None, None, None) => Line::from(Span::styled(
            "Press [o] and type the path of a CSV or Excel file with MW and fraction columns",
            theme.dim,
        )),
    };
    frame.render_widget(
        Paragraph::new(entry).block(panel("Upload Target MWD", theme)),
        entry_area,
    );

    let points = screen
        .problem
        .target()
        .map(|t| to_log_points(&t.curve))
        .unwrap_or_default();
    let y_max = points.iter().map(|(_, y)| *y).fold(1.0_f64, f64::max);
    let datasets = vec![Dataset::default()
        .name("Target")
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(theme.chart_secondary)
        .data(&points)];
    let chart = Chart::new(datasets)
        .block(panel("Target Distribution", theme))
        .x_axis(mw_axis(theme))
        .y_axis(
            Axis::default()
                .style(theme.dim)
                .bounds([0.0, y_max])
                .labels(vec![
                    Span::styled("0", theme.dim),
                    Span::styled(format_fixed(y_max, 1), theme.dim),
                ]),
        );
    frame.render_widget(chart, chart_area);
}

fn status_lines<'a>(screen: &InverseScreen, theme: &Theme) -> Vec<Line<'a>> {
    let problem = &screen.problem;
    let drawn = problem.capture.points().len();
    let gate = if problem.can_solve() {
        Span::styled("ready to solve [s]", theme.success)
    } else {
        Span::styled(
            format!("draw more than {MIN_DRAWN_POINTS} points or upload a target"),
            theme.warning,
        )
    };
    vec![
        Line::from(vec![
            Span::styled(format!("Points drawn: {drawn}   "), theme.label),
            gate,
        ]),
        Line::from(Span::styled(
            "mouse draw   e toggle draw/erase   c clear   o open target file   s solve",
            theme.dim,
        )),
    ]
}

fn parameter_lines<'a>(param: &SolvedParameter, theme: &'a Theme) -> Vec<Line<'a>> {
    let style = theme.confidence_style(param.confidence);
    let mut bar = ConfidenceBar::new(param.confidence, theme);
    bar.config.width = 14;
    vec![
        Line::from(Span::styled(param.name.clone(), theme.label)),
        Line::from(vec![
            Span::styled(format_value(param.value), theme.value),
            Span::styled(format!(" {}", param.unit), theme.dim),
        ]),
        Line::from(vec![
            Span::styled("Confidence ", theme.dim),
            Span::styled(format!("{}%", param.confidence), style),
        ]),
        bar.to_line(),
        Line::from(Span::styled("Range: ±10%", theme.dim)),
    ]
}

/// Up to three significant decimals, as the estimates are displayed.
fn format_value(value: f64) -> String {
    if value.abs() >= 100.0 {
        format_fixed(value, 0)
    } else if value.abs() >= 1.0 {
        format_fixed(value, 2)
    } else {
        format_fixed(value, 3)
    }
}

fn render_solution(frame: &mut Frame, area: Rect, problem: &InverseState, theme: &Theme) {
    let Some(solution) = problem.solution() else {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "No solution yet. Provide a target distribution and press [s].",
                theme.dim,
            )))
            .block(panel("Predicted Reaction Conditions", theme)),
            area,
        );
        return;
    };

    let title = format!(
        "Predicted Reaction Conditions (target peak {} g/mol)",
        format_fixed(solution.target_peak_mw, 0)
    );
    let block = panel(&title, theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let count = solution.parameters.len().max(1) as u32;
    let columns = Layout::horizontal(
        (0..count).map(|_| Constraint::Ratio(1, count)).collect::<Vec<_>>(),
    )
    .split(inner);
    for (param, column) in solution.parameters.iter().zip(columns.iter()) {
        frame.render_widget(Paragraph::new(parameter_lines(param, theme)), *column);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use reactor_core::inverse::TargetFile;
    use reactor_core::mwd;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_to_raster_maps_corners() {
        let inner = Rect::new(10, 5, 40, 20);
        let top_left = to_raster(inner, 10, 5, (400, 200)).unwrap();
        assert!((top_left.x - 5.0).abs() < 1e-9);
        assert!((top_left.y - 5.0).abs() < 1e-9);
        let bottom_right = to_raster(inner, 49, 24, (400, 200)).unwrap();
        assert!((bottom_right.x - 395.0).abs() < 1e-9);
        assert!((bottom_right.y - 195.0).abs() < 1e-9);
    }

    #[test]
    fn test_to_raster_outside_is_none() {
        let inner = Rect::new(10, 5, 40, 20);
        assert!(to_raster(inner, 9, 10, (400, 200)).is_none());
        assert!(to_raster(inner, 50, 10, (400, 200)).is_none());
        assert!(to_raster(inner, 20, 25, (400, 200)).is_none());
        assert!(to_raster(Rect::default(), 0, 0, (400, 200)).is_none());
    }

    #[test]
    fn test_toggle_tool_and_tab_switch_ends_stroke() {
        let mut screen = InverseScreen::new();
        screen.toggle_tool();
        assert_eq!(screen.problem.capture.tool(), Tool::Erase);
        screen.toggle_tool();
        screen.problem.pointer_down(Point::new(50.0, 50.0));
        screen.select_tab(InverseTab::Upload);
        assert_eq!(
            screen.problem.capture.state(),
            reactor_core::sketch::CaptureState::Idle
        );
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(2.73), "2.73");
        assert_eq!(format_value(135.2), "135");
        assert_eq!(format_value(0.048), "0.048");
    }

    #[test]
    fn test_render_draw_tab_returns_canvas_rect() {
        let mut screen = InverseScreen::new();
        for i in 0..15 {
            let x = 20.0 + i as f64 * 20.0;
            if i == 0 {
                screen.problem.pointer_down(Point::new(x, 150.0));
            } else {
                screen.problem.pointer_move(Point::new(x, 150.0 - i as f64 * 5.0));
            }
        }
        screen.problem.pointer_up();
        screen.problem.solve().unwrap();

        let theme = Theme::dark();
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        let mut canvas = None;
        terminal
            .draw(|frame| canvas = render(frame, frame.area(), &screen, &theme))
            .unwrap();
        let rect = canvas.expect("draw tab exposes its canvas");
        assert!(rect.width > 0 && rect.height > 0);
        let text = buffer_text(&terminal);
        assert!(text.contains("Range: ±10%"));
        assert!(text.contains("ready to solve"));
    }

    #[test]
    fn test_render_upload_tab() {
        let mut screen = InverseScreen::new();
        screen.select_tab(InverseTab::Upload);
        screen.problem.set_target(TargetFile {
            name: "target.csv".into(),
            curve: mwd::preview_curve(),
        });
        let theme = Theme::light();
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        let mut canvas = Some(Rect::default());
        terminal
            .draw(|frame| canvas = render(frame, frame.area(), &screen, &theme))
            .unwrap();
        assert!(canvas.is_none());
        assert!(buffer_text(&terminal).contains("target.csv"));
    }
}
