//! Main application state and TUI event loop.
//!
//! [`App`] owns every piece of screen state, the preferences store, the
//! prediction history and the upload registry. Background work (backend
//! calls, file reads) reports back over channels that the loop drains
//! between frames.

use std::cell::Cell;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Paragraph, Tabs},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use reactor_core::inverse::{InverseTab, TargetFile};
use reactor_core::models::{ConditionsForm, UploadStatus};
use reactor_core::preferences::PreferencesStore;
use reactor_core::sketch::Surface;
use reactor_data::csv_ingest::ADVISORY_MAX_BYTES;
use reactor_data::export::{self, ExportFormat};
use reactor_data::history::PredictionHistory;
use reactor_data::uploads::UploadRegistry;
use reactor_runtime::upload_worker::{self, UploadEvent, UploadSource, DEFAULT_STEP_DELAY};
use reactor_runtime::worker::{PredictionEvent, PredictionHandle};

use crate::components::banner::ErrorBanner;
use crate::components::header::Header;
use crate::screens::dashboard::{self, DashboardView};
use crate::screens::data::{self, DataScreen};
use crate::screens::forward::{self, ForwardState, ForwardView};
use crate::screens::inverse::{self, InverseScreen};
use crate::screens::performance::{self, PerformanceData};
use crate::screens::settings::{self, SettingsScreen};
use crate::screens::Screen;
use crate::themes::Theme;

/// Sub-directory of the data dir receiving exports.
pub const EXPORT_DIR: &str = "exports";

// ── AppConfig ─────────────────────────────────────────────────────────────────

/// Start-up options resolved by the binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub screen: Screen,
    /// Name of the prediction source, shown in the header.
    pub source_name: &'static str,
    /// `Some` when `--theme light|dark` overrides the dark-mode preference.
    pub theme_override: Option<bool>,
    pub data_dir: PathBuf,
    pub form: ConditionsForm,
    /// Pause between simulated upload progress steps.
    pub upload_step: Duration,
}

impl AppConfig {
    pub fn new(data_dir: PathBuf, source_name: &'static str) -> Self {
        Self {
            screen: Screen::Dashboard,
            source_name,
            theme_override: None,
            data_dir,
            form: ConditionsForm::default(),
            upload_step: DEFAULT_STEP_DELAY,
        }
    }
}

// ── App ───────────────────────────────────────────────────────────────────────

pub struct App {
    pub screen: Screen,
    pub theme: Theme,
    pub should_quit: bool,
    /// Dismissible error banner text.
    pub error: Option<String>,
    /// One-line status message in the footer.
    pub notice: Option<String>,

    pub preferences: PreferencesStore,
    pub history: PredictionHistory,
    pub uploads: UploadRegistry,

    pub forward: ForwardState,
    pub inverse: InverseScreen,
    pub data: DataScreen,
    pub settings: SettingsScreen,
    pub performance: PerformanceData,

    source_name: &'static str,
    theme_override: Option<bool>,
    dark_mode: Arc<AtomicBool>,
    data_dir: PathBuf,
    upload_step: Duration,

    predictions: PredictionHandle,
    prediction_events: mpsc::Receiver<PredictionEvent>,
    upload_tx: mpsc::UnboundedSender<UploadEvent>,
    upload_events: mpsc::UnboundedReceiver<UploadEvent>,

    /// Inner rect of the sketch canvas from the last frame.
    canvas: Cell<Option<Rect>>,
}

impl App {
    pub fn new(
        config: AppConfig,
        mut preferences: PreferencesStore,
        history: PredictionHistory,
        predictions: PredictionHandle,
        prediction_events: mpsc::Receiver<PredictionEvent>,
    ) -> Self {
        let dark_mode = Arc::new(AtomicBool::new(preferences.get().dark_mode));
        let mirror = Arc::clone(&dark_mode);
        preferences.subscribe(move |prefs| mirror.store(prefs.dark_mode, Ordering::Relaxed));

        let is_dark = config
            .theme_override
            .unwrap_or_else(|| dark_mode.load(Ordering::Relaxed));
        let (upload_tx, upload_events) = mpsc::unbounded_channel();

        Self {
            screen: config.screen,
            theme: Theme::for_mode(is_dark),
            should_quit: false,
            error: None,
            notice: None,
            preferences,
            history,
            uploads: UploadRegistry::new(),
            forward: ForwardState::new(config.form),
            inverse: InverseScreen::new(),
            data: DataScreen::default(),
            settings: SettingsScreen::default(),
            performance: PerformanceData::generate(&mut rand::thread_rng()),
            source_name: config.source_name,
            theme_override: config.theme_override,
            dark_mode,
            data_dir: config.data_dir,
            upload_step: config.upload_step,
            predictions,
            prediction_events,
            upload_tx,
            upload_events,
            canvas: Cell::new(None),
        }
    }

    // ── Event loop ────────────────────────────────────────────────────────────

    /// Run the interactive dashboard until `q`, `Q` or `Ctrl+C`.
    ///
    /// Terminal events are polled with a 250 ms timeout; prediction and
    /// upload results are drained with `try_recv` after every poll.
    pub async fn run(mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = Duration::from_millis(250);

        let result = loop {
            if let Err(e) = terminal.draw(|frame| self.render(frame)) {
                break Err(e);
            }

            match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => self.handle_key(key),
                    Ok(Event::Mouse(mouse)) => self.handle_mouse(mouse),
                    Ok(_) => {}
                    Err(e) => break Err(e),
                },
                Ok(false) => {}
                Err(e) => break Err(e),
            }

            self.drain_channels();

            if self.should_quit {
                break Ok(());
            }
        };

        self.predictions.abort();

        // Restore terminal state unconditionally.
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    /// Apply every prediction and upload event that has arrived.
    pub fn drain_channels(&mut self) {
        loop {
            match self.prediction_events.try_recv() {
                Ok(event) => self.apply_prediction(event),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    if self.predictions.pending() > 0 {
                        self.show_error("prediction worker stopped");
                        self.predictions.resolved();
                    }
                    break;
                }
            }
        }
        while let Ok(event) = self.upload_events.try_recv() {
            self.apply_upload(event);
        }
    }

    /// Requests submitted but not yet answered.
    pub fn pending_predictions(&self) -> usize {
        self.predictions.pending()
    }

    // ── Background results ────────────────────────────────────────────────────

    fn apply_prediction(&mut self, event: PredictionEvent) {
        self.predictions.resolved();
        match event {
            PredictionEvent::Completed { request_id, result } => {
                info!(request_id, id = %result.id, "prediction received");
                if let Err(e) = self.history.push(result) {
                    self.show_error(format!("could not save prediction history: {e}"));
                } else {
                    self.notice = Some(format!("Prediction #{request_id} added to history"));
                }
            }
            PredictionEvent::Failed { error, .. } => self.show_error(error),
        }
    }

    fn apply_upload(&mut self, event: UploadEvent) {
        match event {
            UploadEvent::Progress {
                upload_id,
                progress,
            } => {
                self.uploads.set_progress(&upload_id, progress);
            }
            UploadEvent::Completed { upload_id, data } => {
                if self.inverse.loading.as_deref() == Some(upload_id.as_str()) {
                    let name = self
                        .uploads
                        .get(&upload_id)
                        .map(|f| f.name.clone())
                        .unwrap_or_default();
                    let target = TargetFile::from_parsed(name, &data);
                    self.notice = Some(format!(
                        "Target {} loaded ({} points)",
                        target.name,
                        target.curve.len()
                    ));
                    self.inverse.problem.set_target(target);
                    self.inverse.loading = None;
                }
                self.uploads.complete(&upload_id, data);
            }
            UploadEvent::Failed { upload_id, error } => {
                if self.inverse.loading.as_deref() == Some(upload_id.as_str()) {
                    self.inverse.loading = None;
                    self.show_error(format!("Target file rejected: {error}"));
                }
                self.uploads.fail(&upload_id, error.to_string());
            }
        }
    }

    /// Register an upload and read it in the background.
    fn start_upload(&mut self, path: PathBuf) -> String {
        let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        if size > ADVISORY_MAX_BYTES {
            warn!(path = %path.display(), size, "upload exceeds the advisory size limit");
        }
        let source = UploadSource::Path(path);
        let id = self.uploads.begin(source.name(), size);
        upload_worker::spawn_upload(id.clone(), source, self.upload_step, self.upload_tx.clone());
        id
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.text_entry_active() {
            self.handle_text_entry(key);
            self.sync_theme();
            return;
        }

        match key.code {
            KeyCode::Esc => {
                self.error = None;
                self.notice = None;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Tab => self.switch_screen(self.screen.next()),
            KeyCode::BackTab => self.switch_screen(self.screen.prev()),
            KeyCode::Char(c @ '1'..='6') => {
                let idx = c as usize - '1' as usize;
                self.switch_screen(Screen::ALL[idx]);
            }
            KeyCode::Char('t') => {
                self.theme_override = None;
                if let Err(e) = self.preferences.toggle("darkMode") {
                    self.show_error(e);
                }
            }
            _ => match self.screen {
                Screen::Forward => self.handle_forward_key(key),
                Screen::Inverse => self.handle_inverse_key(key),
                Screen::Data => self.handle_data_key(key),
                Screen::Settings => self.handle_settings_key(key),
                Screen::Dashboard | Screen::Performance => {}
            },
        }
        self.sync_theme();
    }

    fn text_entry_active(&self) -> bool {
        match self.screen {
            Screen::Forward => self.forward.editing.is_some(),
            Screen::Inverse => self.inverse.path_input.is_some(),
            Screen::Data => self.data.path_input.is_some(),
            Screen::Settings => self.settings.editing.is_some(),
            _ => false,
        }
    }

    fn handle_text_entry(&mut self, key: KeyEvent) {
        let buffer = match self.screen {
            Screen::Forward => {
                match key.code {
                    KeyCode::Char(c) => self.forward.push_char(c),
                    KeyCode::Backspace => self.forward.backspace(),
                    KeyCode::Esc => self.forward.cancel_edit(),
                    KeyCode::Enter => {
                        if let Err(e) = self.forward.commit_edit() {
                            self.show_error(e);
                        }
                    }
                    _ => {}
                }
                return;
            }
            Screen::Inverse => &mut self.inverse.path_input,
            Screen::Data => &mut self.data.path_input,
            Screen::Settings => &mut self.settings.editing,
            _ => return,
        };

        match key.code {
            KeyCode::Char(c) => {
                if let Some(b) = buffer.as_mut() {
                    b.push(c);
                }
            }
            KeyCode::Backspace => {
                if let Some(b) = buffer.as_mut() {
                    b.pop();
                }
            }
            KeyCode::Esc => *buffer = None,
            KeyCode::Enter => self.commit_text_entry(),
            _ => {}
        }
    }

    fn commit_text_entry(&mut self) {
        match self.screen {
            Screen::Inverse => {
                let Some(path) = self.inverse.path_input.take() else {
                    return;
                };
                let path = path.trim();
                if path.is_empty() {
                    return;
                }
                let id = self.start_upload(PathBuf::from(path));
                self.inverse.loading = Some(id);
            }
            Screen::Data => {
                let Some(path) = self.data.path_input.take() else {
                    return;
                };
                let path = path.trim();
                if path.is_empty() {
                    return;
                }
                self.start_upload(PathBuf::from(path));
                self.data.selected = self.uploads.len().saturating_sub(1);
            }
            Screen::Settings => {
                if let Err(e) = self.settings.commit(&mut self.preferences) {
                    self.show_error(e);
                }
            }
            _ => {}
        }
    }

    fn handle_forward_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.forward.select_prev(),
            KeyCode::Down => self.forward.select_next(),
            KeyCode::Enter => self.forward.begin_edit(),
            KeyCode::Char('p') => self.submit_prediction(),
            KeyCode::Char('v') => self.forward.toggle_view(),
            KeyCode::Char('c') => self.export_latest(ExportFormat::Csv),
            KeyCode::Char('j') => self.export_latest(ExportFormat::Json),
            KeyCode::Char('h') => self.export_latest(ExportFormat::Html),
            KeyCode::Char('e') => {
                match self.preferences.get().file_format.parse::<ExportFormat>() {
                    Ok(format) => self.export_latest(format),
                    Err(e) => self.show_error(e),
                }
            }
            KeyCode::Char('x') => match self.history.clear() {
                Ok(()) => self.notice = Some("Prediction history cleared".to_string()),
                Err(e) => self.show_error(e),
            },
            _ => {}
        }
    }

    fn handle_inverse_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('u') => self.inverse.select_tab(InverseTab::Upload),
            KeyCode::Char('d') => self.inverse.select_tab(InverseTab::Draw),
            KeyCode::Left | KeyCode::Right => {
                let next = match self.inverse.problem.tab {
                    InverseTab::Upload => InverseTab::Draw,
                    InverseTab::Draw => InverseTab::Upload,
                };
                self.inverse.select_tab(next);
            }
            KeyCode::Char('e') => self.inverse.toggle_tool(),
            KeyCode::Char('c') => self.inverse.problem.clear(),
            KeyCode::Char('o') => {
                self.inverse.select_tab(InverseTab::Upload);
                self.inverse.path_input = Some(String::new());
            }
            KeyCode::Char('s') => match self.inverse.problem.solve() {
                Ok(solution) => {
                    self.notice = Some(format!(
                        "Solved for a target peak at {:.0} g/mol",
                        solution.target_peak_mw
                    ));
                }
                Err(e) => self.show_error(e),
            },
            _ => {}
        }
    }

    fn handle_data_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.data.select_prev(),
            KeyCode::Down => self.data.select_next(self.uploads.len()),
            KeyCode::Char('a') => self.data.path_input = Some(String::new()),
            KeyCode::Char('r') | KeyCode::Delete => {
                let id = self
                    .uploads
                    .files()
                    .get(self.data.selected)
                    .filter(|f| f.status != UploadStatus::Processing)
                    .map(|f| f.id.clone());
                if let Some(id) = id {
                    self.uploads.remove(&id);
                    self.data.clamp(self.uploads.len());
                }
            }
            _ => {}
        }
    }

    fn handle_settings_key(&mut self, key: KeyEvent) {
        let len = self.preferences.get().entries().len();
        match key.code {
            KeyCode::Up => self.settings.select_prev(len),
            KeyCode::Down => self.settings.select_next(len),
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Err(e) = self.settings.activate(&mut self.preferences) {
                    self.show_error(e);
                }
            }
            KeyCode::Char('r') => match self.preferences.reset() {
                Ok(()) => self.notice = Some("Settings reset to defaults".to_string()),
                Err(e) => self.show_error(e),
            },
            _ => {}
        }
    }

    /// Mouse input drives the sketch canvas on the inverse screen.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.screen != Screen::Inverse || self.inverse.problem.tab != InverseTab::Draw {
            return;
        }
        let Some(inner) = self.canvas.get() else {
            return;
        };
        let size = self.inverse.problem.raster.size();
        let at = inverse::to_raster(inner, mouse.column, mouse.row, size);
        let problem = &mut self.inverse.problem;
        match (mouse.kind, at) {
            (MouseEventKind::Down(MouseButton::Left), Some(p)) => problem.pointer_down(p),
            (MouseEventKind::Drag(MouseButton::Left), Some(p)) => problem.pointer_move(p),
            (MouseEventKind::Up(MouseButton::Left), _) => problem.pointer_up(),
            (MouseEventKind::Drag(_) | MouseEventKind::Moved, None) => problem.pointer_leave(),
            _ => {}
        }
    }

    // ── Actions ───────────────────────────────────────────────────────────────

    fn submit_prediction(&mut self) {
        self.error = None;
        let inputs = match self.forward.form.validate() {
            Ok(inputs) => inputs,
            Err(e) => return self.show_error(e),
        };
        match self.predictions.submit(inputs) {
            Ok(request_id) => {
                debug!(request_id, "prediction submitted");
                self.notice = Some(format!("Prediction #{request_id} running…"));
            }
            Err(e) => self.show_error(e),
        }
    }

    fn export_latest(&mut self, format: ExportFormat) {
        let Some(latest) = self.history.latest() else {
            return self.show_error("Nothing to export yet: run a prediction first");
        };
        let dir = self.data_dir.join(EXPORT_DIR);
        match export::write_export(&dir, latest, format) {
            Ok(path) => self.notice = Some(format!("Exported to {}", path.display())),
            Err(e) => self.show_error(e),
        }
    }

    fn switch_screen(&mut self, screen: Screen) {
        if self.screen == Screen::Inverse {
            self.inverse.problem.pointer_leave();
        }
        self.screen = screen;
    }

    fn show_error(&mut self, error: impl ToString) {
        let message = error.to_string();
        warn!(error = %message, "showing error banner");
        self.error = Some(message);
    }

    /// Follow dark-mode changes; the sketch background is repainted so the
    /// grid matches the new palette.
    fn sync_theme(&mut self) {
        let is_dark = self
            .theme_override
            .unwrap_or_else(|| self.dark_mode.load(Ordering::Relaxed));
        if is_dark != self.theme.is_dark {
            self.theme = Theme::for_mode(is_dark);
            self.inverse.problem.redraw_background();
            debug!(is_dark, "theme switched");
        }
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(self.theme.background), area);

        let banner_height = if self.error.is_some() { 1 } else { 0 };
        let [header_area, tabs_area, banner_area, body_area, footer_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(banner_height),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(
            Paragraph::new(Header::new(self.screen.title(), self.source_name, &self.theme).to_lines()),
            header_area,
        );

        let titles: Vec<String> = Screen::ALL
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{} {}", i + 1, s.title()))
            .collect();
        frame.render_widget(
            Tabs::new(titles)
                .select(self.screen.index())
                .style(self.theme.tab_inactive)
                .highlight_style(self.theme.tab_active)
                .divider(" │ "),
            tabs_area,
        );

        if let Some(message) = &self.error {
            frame.render_widget(
                Paragraph::new(ErrorBanner::new(message, &self.theme).to_line()),
                banner_area,
            );
        }

        let mut canvas = None;
        match self.screen {
            Screen::Dashboard => {
                let view = DashboardView {
                    results: self.history.results(),
                    uploads: &self.uploads,
                    metrics: &self.performance.metrics,
                };
                dashboard::render(frame, body_area, &view, &self.theme);
            }
            Screen::Forward => {
                let view = ForwardView {
                    state: &self.forward,
                    results: self.history.results(),
                    pending: self.predictions.pending(),
                };
                forward::render(frame, body_area, &view, &self.theme);
            }
            Screen::Inverse => {
                canvas = inverse::render(frame, body_area, &self.inverse, &self.theme);
            }
            Screen::Data => data::render(frame, body_area, &self.data, &self.uploads, &self.theme),
            Screen::Performance => {
                performance::render(frame, body_area, &self.performance, &self.theme)
            }
            Screen::Settings => {
                settings::render(frame, body_area, &self.settings, &self.preferences, &self.theme)
            }
        }
        self.canvas.set(canvas);

        let footer = match &self.notice {
            Some(notice) => Line::from(Span::styled(notice.clone(), self.theme.info)),
            None => Line::from(Span::styled(
                "Tab/1-6 switch screen   t light/dark   Esc dismiss   q quit",
                self.theme.dim,
            )),
        };
        frame.render_widget(Paragraph::new(footer), footer_area);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use reactor_core::models::ReactionConditions;
    use reactor_runtime::prediction::{MockSource, OutputSchema};
    use reactor_runtime::worker::PredictionWorker;
    use tempfile::TempDir;

    fn app_in(tmp: &TempDir) -> App {
        let dir = tmp.path().to_path_buf();
        let source = Arc::new(MockSource::with_seed(OutputSchema::default(), 11));
        let (handle, events) = PredictionWorker::new(source).start();
        let mut config = AppConfig::new(dir.clone(), "mock");
        config.form = ConditionsForm::filled(&ReactionConditions::default());
        config.upload_step = Duration::from_millis(1);
        App::new(
            config,
            PreferencesStore::load(PreferencesStore::path_in(&dir)),
            PredictionHistory::load(PredictionHistory::path_in(&dir)),
            handle,
            events,
        )
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    async fn settle(app: &mut App, done: impl Fn(&App) -> bool) {
        for _ in 0..300 {
            app.drain_channels();
            if done(app) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached");
    }

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 45)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[tokio::test]
    async fn test_screen_navigation_and_quit() {
        let tmp = TempDir::new().expect("tempdir");
        let mut app = app_in(&tmp);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.screen, Screen::Forward);
        press(&mut app, KeyCode::BackTab);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.screen, Screen::Settings);
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.screen, Screen::Inverse);
        assert!(!app.should_quit);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_even_while_editing() {
        let tmp = TempDir::new().expect("tempdir");
        let mut app = app_in(&tmp);
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Enter);
        assert!(app.forward.editing.is_some());
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_prediction_lands_in_history() {
        let tmp = TempDir::new().expect("tempdir");
        let mut app = app_in(&tmp);
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Char('p'));
        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.pending_predictions(), 2);
        assert!(draw(&app).contains("loading"));

        settle(&mut app, |a| a.history.len() == 2).await;
        assert_eq!(app.pending_predictions(), 0);
        assert!(app.error.is_none());
        assert!(app.history.path().exists());
        assert_eq!(app.history.results()[0].mwd_data.len(), 50);
    }

    #[tokio::test]
    async fn test_missing_field_shows_validation_banner() {
        let tmp = TempDir::new().expect("tempdir");
        let mut app = app_in(&tmp);
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        for _ in 0..8 {
            press(&mut app, KeyCode::Backspace);
        }
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('p'));

        let message = app.error.clone().expect("banner");
        assert_eq!(message, "Missing required input parameters (S)");
        assert_eq!(app.pending_predictions(), 0);
        assert!(draw(&app).contains("[Esc] Dismiss"));

        press(&mut app, KeyCode::Esc);
        assert!(app.error.is_none());
    }

    #[tokio::test]
    async fn test_export_writes_file() {
        let tmp = TempDir::new().expect("tempdir");
        let mut app = app_in(&tmp);
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Char('c'));
        assert!(app.error.is_some());
        press(&mut app, KeyCode::Esc);

        press(&mut app, KeyCode::Char('p'));
        settle(&mut app, |a| a.history.len() == 1).await;
        press(&mut app, KeyCode::Char('j'));
        assert!(app.error.is_none());
        let exported = std::fs::read_dir(tmp.path().join(EXPORT_DIR))
            .unwrap()
            .count();
        assert_eq!(exported, 1);
    }

    #[tokio::test]
    async fn test_theme_toggle_persists_and_switches() {
        let tmp = TempDir::new().expect("tempdir");
        let mut app = app_in(&tmp);
        assert!(!app.theme.is_dark);
        press(&mut app, KeyCode::Char('t'));
        assert!(app.theme.is_dark);
        assert!(app.preferences.get().dark_mode);

        let reloaded = PreferencesStore::load(PreferencesStore::path_in(tmp.path()));
        assert!(reloaded.get().dark_mode);
    }

    #[tokio::test]
    async fn test_data_upload_flow() {
        let tmp = TempDir::new().expect("tempdir");
        let file = tmp.path().join("batch.csv");
        std::fs::write(&file, "mw,fraction\n1000,0.1\n10000,0.8\n100000,0.3\n").unwrap();

        let mut app = app_in(&tmp);
        press(&mut app, KeyCode::Char('4'));
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, file.to_str().unwrap());
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.uploads.len(), 1);

        settle(&mut app, |a| a.uploads.files()[0].status.is_terminal()).await;
        let uploaded = &app.uploads.files()[0];
        assert_eq!(uploaded.status, UploadStatus::Completed);
        assert_eq!(uploaded.row_count, 3);
        assert_eq!(uploaded.progress, 100);
        assert!(draw(&app).contains("batch.csv"));

        press(&mut app, KeyCode::Char('r'));
        assert!(app.uploads.is_empty());
    }

    #[tokio::test]
    async fn test_bad_extension_marks_upload_failed() {
        let tmp = TempDir::new().expect("tempdir");
        let file = tmp.path().join("notes.txt");
        std::fs::write(&file, "hello").unwrap();

        let mut app = app_in(&tmp);
        press(&mut app, KeyCode::Char('4'));
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, file.to_str().unwrap());
        press(&mut app, KeyCode::Enter);

        settle(&mut app, |a| a.uploads.files()[0].status.is_terminal()).await;
        assert_eq!(app.uploads.files()[0].status, UploadStatus::Error);
        assert!(app.uploads.parsed(&app.uploads.files()[0].id).is_none());
    }

    #[tokio::test]
    async fn test_inverse_target_upload_enables_solve() {
        let tmp = TempDir::new().expect("tempdir");
        let file = tmp.path().join("target.csv");
        std::fs::write(&file, "mw,fraction\n1000,0.1\n10000,0.8\n100000,0.3\n").unwrap();

        let mut app = app_in(&tmp);
        press(&mut app, KeyCode::Char('3'));
        press(&mut app, KeyCode::Char('s'));
        assert!(app.error.is_some());
        press(&mut app, KeyCode::Esc);

        press(&mut app, KeyCode::Char('o'));
        type_text(&mut app, file.to_str().unwrap());
        press(&mut app, KeyCode::Enter);
        settle(&mut app, |a| a.inverse.problem.target().is_some()).await;
        assert!(app.inverse.loading.is_none());

        press(&mut app, KeyCode::Char('s'));
        assert!(app.error.is_none());
        let solution = app.inverse.problem.solution().expect("solution");
        assert_eq!(solution.parameters.len(), 4);
        assert!(draw(&app).contains("Range: ±10%"));
    }

    #[tokio::test]
    async fn test_mouse_draws_on_canvas() {
        let tmp = TempDir::new().expect("tempdir");
        let mut app = app_in(&tmp);
        press(&mut app, KeyCode::Char('3'));
        draw(&app);
        let inner = app.canvas.get().expect("canvas rect after draw");

        let mouse = |kind, column, row| MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };
        let row = inner.y + inner.height / 2;
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), inner.x + 1, row));
        for dx in 2..14 {
            app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), inner.x + dx, row));
        }
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), inner.x + 14, row));

        assert_eq!(app.inverse.problem.capture.points().len(), 13);
        assert!(app.inverse.problem.can_solve());

        // Dragging outside the canvas ends the stroke.
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), inner.x + 1, row));
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 0, 0));
        assert_eq!(
            app.inverse.problem.capture.state(),
            reactor_core::sketch::CaptureState::Idle
        );
    }

    #[tokio::test]
    async fn test_every_screen_renders() {
        let tmp = TempDir::new().expect("tempdir");
        let mut app = app_in(&tmp);
        for screen in Screen::ALL {
            app.switch_screen(screen);
            let text = draw(&app);
            assert!(text.contains("POLYMER REACTOR ML DASHBOARD"));
        }
    }
}
