//! Data management: uploaded experiment files and their previews.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

use reactor_core::formatting::{format_file_size, format_number};
use reactor_core::models::{ParsedData, UploadStatus, UploadedFile};
use reactor_data::csv_ingest::ADVISORY_MAX_BYTES;
use reactor_data::uploads::UploadRegistry;

use crate::components::progress_bar::UploadProgressBar;
use crate::screens::{fit, input_line, panel};
use crate::themes::Theme;

const NAME_WIDTH: usize = 28;
const COLUMN_WIDTH: usize = 14;

// ── State ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct DataScreen {
    pub selected: usize,
    /// Path being typed, if the entry line is open.
    pub path_input: Option<String>,
}

impl DataScreen {
    pub fn select_next(&mut self, len: usize) {
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Keep the selection inside the list after a removal.
    pub fn clamp(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
    }
}

// ── Rendering ─────────────────────────────────────────────────────────────────

pub fn render(
    frame: &mut Frame,
    area: Rect,
    screen: &DataScreen,
    uploads: &UploadRegistry,
    theme: &Theme,
) {
    let [summary_area, entry_area, table_area, preview_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Min(6),
        Constraint::Length(10),
    ])
    .areas(area);

    let completed = uploads
        .files()
        .iter()
        .filter(|f| f.status == UploadStatus::Completed)
        .count();
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Files: ", theme.label),
            Span::styled(uploads.len().to_string(), theme.value),
            Span::styled("   Processed: ", theme.label),
            Span::styled(completed.to_string(), theme.value),
            Span::styled("   Total rows: ", theme.label),
            Span::styled(format_number(uploads.total_rows() as f64, 0), theme.value),
        ])),
        summary_area,
    );

    let entry = match &screen.path_input {
        Some(buffer) => input_line("Path: ", buffer, theme),
        None => Line::from(Span::styled(
            format!(
                "[a] add .csv / .xlsx / .xls file (up to {})   [r] remove   ↑/↓ select",
                format_file_size(ADVISORY_MAX_BYTES)
            ),
            theme.dim,
        )),
    };
    frame.render_widget(
        Paragraph::new(entry).block(panel("Upload Experimental Data", theme)),
        entry_area,
    );

    render_files(frame, table_area, screen, uploads.files(), theme);

    let selected = uploads.files().get(screen.selected);
    render_preview(
        frame,
        preview_area,
        selected,
        selected.and_then(|f| uploads.parsed(&f.id)),
        theme,
    );
}

fn render_files(
    frame: &mut Frame,
    area: Rect,
    screen: &DataScreen,
    files: &[UploadedFile],
    theme: &Theme,
) {
    if files.is_empty() {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled("No files uploaded yet.", theme.dim)))
                .block(panel("Uploaded Files", theme)),
            area,
        );
        return;
    }

    let header = Row::new(vec!["Name", "Size", "Uploaded", "Status", "Progress", "Rows", "Columns"])
        .style(theme.table_header);
    let rows: Vec<Row> = files
        .iter()
        .enumerate()
        .map(|(idx, file)| {
            let status = match file.status {
                UploadStatus::Processing => "processing",
                UploadStatus::Completed => "completed",
                UploadStatus::Error => "error",
            };
            let mut bar = UploadProgressBar::new(file.progress, file.status, theme);
            bar.config.width = 10;
            let row = Row::new(vec![
                Cell::from(fit(&file.name, NAME_WIDTH)),
                Cell::from(format_file_size(file.size)),
                Cell::from(file.upload_date.format("%Y-%m-%d %H:%M").to_string()),
                Cell::from(Span::styled(status, theme.status_style(file.status))),
                Cell::from(bar.to_line()),
                Cell::from(format_number(file.row_count as f64, 0)),
                Cell::from(file.columns.len().to_string()),
            ]);
            if idx == screen.selected {
                row.style(theme.selected)
            } else {
                row.style(theme.table_row)
            }
        })
        .collect();

    let widths = [
        Constraint::Length(NAME_WIDTH as u16),
        Constraint::Length(10),
        Constraint::Length(16),
        Constraint::Length(10),
        Constraint::Length(15),
        Constraint::Length(8),
        Constraint::Length(7),
    ];
    frame.render_widget(
        Table::new(rows, widths)
            .header(header)
            .block(panel("Uploaded Files", theme))
            .column_spacing(1),
        area,
    );
}

fn render_preview(
    frame: &mut Frame,
    area: Rect,
    file: Option<&UploadedFile>,
    parsed: Option<&ParsedData>,
    theme: &Theme,
) {
    let block = panel("Data Preview", theme);
    match (file, parsed) {
        (Some(file), _) if file.status == UploadStatus::Error => {
            let message = file.error.clone().unwrap_or_else(|| "upload failed".to_string());
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(message, theme.error)))
                    .wrap(Wrap { trim: true })
                    .block(block),
                area,
            );
        }
        (Some(_), Some(data)) if !data.headers.is_empty() => {
            let header = Row::new(
                data.headers
                    .iter()
                    .map(|h| Cell::from(fit(h, COLUMN_WIDTH)))
                    .collect::<Vec<_>>(),
            )
            .style(theme.table_header);
            let rows: Vec<Row> = data
                .preview
                .iter()
                .map(|r| {
                    Row::new(
                        r.iter()
                            .map(|c| Cell::from(fit(c, COLUMN_WIDTH)))
                            .collect::<Vec<_>>(),
                    )
                    .style(theme.table_row)
                })
                .collect();
            let widths = vec![Constraint::Length(COLUMN_WIDTH as u16); data.headers.len()];
            frame.render_widget(
                Table::new(rows, widths).header(header).block(block),
                area,
            );
        }
        (Some(file), _) if file.status == UploadStatus::Processing => {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled("Reading file…", theme.info))).block(block),
                area,
            );
        }
        _ => {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    "Select a processed file to preview its first rows.",
                    theme.dim,
                )))
                .block(block),
                area,
            );
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use reactor_data::csv_ingest;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn draw(screen: &DataScreen, uploads: &UploadRegistry) -> String {
        let theme = Theme::light();
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), screen, uploads, &theme))
            .unwrap();
        buffer_text(&terminal)
    }

    #[test]
    fn test_selection_bounds() {
        let mut screen = DataScreen::default();
        screen.select_next(0);
        assert_eq!(screen.selected, 0);
        screen.select_next(2);
        screen.select_next(2);
        assert_eq!(screen.selected, 1);
        screen.clamp(1);
        assert_eq!(screen.selected, 0);
        screen.select_prev();
        assert_eq!(screen.selected, 0);
    }

    #[test]
    fn test_render_completed_file_with_preview() {
        let mut uploads = UploadRegistry::new();
        let id = uploads.begin("batch_run.csv", 2048);
        let parsed = csv_ingest::parse_text("mw,fraction\n1000,0.2\n2000,0.4\n").unwrap();
        assert!(uploads.complete(&id, parsed));

        let text = draw(&DataScreen::default(), &uploads);
        assert!(text.contains("batch_run.csv"));
        assert!(text.contains("2.0 KB"));
        assert!(text.contains("completed"));
        assert!(text.contains("fraction"));
        assert!(text.contains("2000"));
    }

    #[test]
    fn test_render_failed_file_shows_error() {
        let mut uploads = UploadRegistry::new();
        let id = uploads.begin("broken.csv", 10);
        uploads.fail(&id, "file is not valid UTF-8");
        let text = draw(&DataScreen::default(), &uploads);
        assert!(text.contains("error"));
        assert!(text.contains("file is not valid UTF-8"));
    }

    #[test]
    fn test_render_empty_and_path_entry() {
        let screen = DataScreen {
            selected: 0,
            path_input: Some("/tmp/run".into()),
        };
        let text = draw(&screen, &UploadRegistry::new());
        assert!(text.contains("No files uploaded yet."));
        assert!(text.contains("Path: /tmp/run"));
    }
}
