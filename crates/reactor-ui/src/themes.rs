use ratatui::style::{Color, Modifier, Style};

use reactor_core::formatting::Trend;
use reactor_core::inverse::LOW_CONFIDENCE;
use reactor_core::models::UploadStatus;

// ── Tokens ────────────────────────────────────────────────────────────────────

/// Semantic colour slots. Every widget colour goes through [`resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeToken {
    Background,
    Surface,
    Text,
    Muted,
    Border,
    Accent,
    Success,
    Warning,
    Error,
    /// Freehand strokes on the sketch canvas.
    Ink,
    /// Sketch canvas grid lines and axis labels.
    Grid,
    /// Second series in line charts (validation loss, experimental data).
    Secondary,
}

impl ThemeToken {
    pub const ALL: [ThemeToken; 12] = [
        ThemeToken::Background,
        ThemeToken::Surface,
        ThemeToken::Text,
        ThemeToken::Muted,
        ThemeToken::Border,
        ThemeToken::Accent,
        ThemeToken::Success,
        ThemeToken::Warning,
        ThemeToken::Error,
        ThemeToken::Ink,
        ThemeToken::Grid,
        ThemeToken::Secondary,
    ];
}

/// The single place where light and dark colours are chosen.
pub fn resolve(token: ThemeToken, is_dark: bool) -> Color {
    use ThemeToken::*;
    match (token, is_dark) {
        (Background, true) => Color::Rgb(17, 24, 39),
        (Background, false) => Color::Rgb(255, 255, 255),
        (Surface, true) => Color::Rgb(31, 41, 55),
        (Surface, false) => Color::Rgb(243, 244, 246),
        (Text, true) => Color::Rgb(243, 244, 246),
        (Text, false) => Color::Rgb(17, 24, 39),
        (Muted, true) => Color::Rgb(156, 163, 175),
        (Muted, false) => Color::Rgb(75, 85, 99),
        (Border, true) => Color::Rgb(75, 85, 99),
        (Border, false) => Color::Rgb(209, 213, 219),
        (Accent, true) => Color::Rgb(96, 165, 250),
        (Accent, false) => Color::Rgb(37, 99, 235),
        (Success, true) => Color::Rgb(74, 222, 128),
        (Success, false) => Color::Rgb(22, 163, 74),
        (Warning, true) => Color::Rgb(251, 191, 36),
        (Warning, false) => Color::Rgb(217, 119, 6),
        (Error, true) => Color::Rgb(248, 113, 113),
        (Error, false) => Color::Rgb(220, 38, 38),
        (Ink, true) => Color::Rgb(147, 197, 253),
        (Ink, false) => Color::Rgb(37, 99, 235),
        (Grid, true) => Color::Rgb(55, 65, 81),
        (Grid, false) => Color::Rgb(229, 231, 235),
        (Secondary, true) => Color::Rgb(52, 211, 153),
        (Secondary, false) => Color::Rgb(5, 150, 105),
    }
}

// ── Theme ─────────────────────────────────────────────────────────────────────

/// Complete set of widget styles for one mode.
#[derive(Debug, Clone)]
pub struct Theme {
    pub is_dark: bool,

    // ── Chrome ───────────────────────────────────────────────────────────────
    pub background: Style,
    pub header: Style,
    pub separator: Style,
    pub border: Style,
    pub tab_active: Style,
    pub tab_inactive: Style,
    pub selected: Style,

    // ── Text ─────────────────────────────────────────────────────────────────
    pub text: Style,
    pub dim: Style,
    pub bold: Style,
    pub label: Style,
    pub value: Style,

    // ── Status ───────────────────────────────────────────────────────────────
    pub info: Style,
    pub success: Style,
    pub warning: Style,
    pub error: Style,

    // ── Progress bars ────────────────────────────────────────────────────────
    pub progress_fill: Style,
    pub progress_empty: Style,
    pub progress_label: Style,

    // ── Table ────────────────────────────────────────────────────────────────
    pub table_header: Style,
    pub table_row: Style,
    pub table_row_alt: Style,

    // ── Charts and canvas ────────────────────────────────────────────────────
    pub chart_primary: Style,
    pub chart_secondary: Style,
    pub ink: Style,
    pub grid: Style,

    // ── Banners ──────────────────────────────────────────────────────────────
    pub banner_warning: Style,
    pub banner_error: Style,
}

impl Theme {
    // ── Constructors ─────────────────────────────────────────────────────────

    /// Build every style from [`resolve`].
    pub fn for_mode(is_dark: bool) -> Self {
        let c = |token| resolve(token, is_dark);
        let fg = |token| Style::default().fg(c(token));

        Self {
            is_dark,

            background: Style::default()
                .bg(c(ThemeToken::Background))
                .fg(c(ThemeToken::Text)),
            header: fg(ThemeToken::Accent).add_modifier(Modifier::BOLD),
            separator: fg(ThemeToken::Border),
            border: fg(ThemeToken::Border),
            tab_active: fg(ThemeToken::Accent).add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            tab_inactive: fg(ThemeToken::Muted),
            selected: Style::default()
                .bg(c(ThemeToken::Surface))
                .fg(c(ThemeToken::Accent))
                .add_modifier(Modifier::BOLD),

            text: fg(ThemeToken::Text),
            dim: fg(ThemeToken::Muted),
            bold: fg(ThemeToken::Text).add_modifier(Modifier::BOLD),
            label: fg(ThemeToken::Muted),
            value: fg(ThemeToken::Text).add_modifier(Modifier::BOLD),

            info: fg(ThemeToken::Accent),
            success: fg(ThemeToken::Success),
            warning: fg(ThemeToken::Warning),
            error: fg(ThemeToken::Error),

            progress_fill: fg(ThemeToken::Accent),
            progress_empty: fg(ThemeToken::Grid),
            progress_label: fg(ThemeToken::Muted),

            table_header: fg(ThemeToken::Text).add_modifier(Modifier::BOLD),
            table_row: fg(ThemeToken::Text),
            table_row_alt: fg(ThemeToken::Muted),

            chart_primary: fg(ThemeToken::Accent),
            chart_secondary: fg(ThemeToken::Secondary),
            ink: fg(ThemeToken::Ink),
            grid: fg(ThemeToken::Grid),

            banner_warning: Style::default()
                .bg(c(ThemeToken::Surface))
                .fg(c(ThemeToken::Warning)),
            banner_error: Style::default()
                .bg(c(ThemeToken::Surface))
                .fg(c(ThemeToken::Error))
                .add_modifier(Modifier::BOLD),
        }
    }

    pub fn dark() -> Self {
        Self::for_mode(true)
    }

    pub fn light() -> Self {
        Self::for_mode(false)
    }

    // ── Style helpers ────────────────────────────────────────────────────────

    /// Green for an increase, red for a decrease, amber when unchanged.
    pub fn trend_style(&self, trend: Trend) -> Style {
        match trend {
            Trend::Up => self.success,
            Trend::Down => self.error,
            Trend::Flat => self.warning,
        }
    }

    /// Amber below the low-confidence threshold, green otherwise.
    pub fn confidence_style(&self, confidence: u8) -> Style {
        if confidence < LOW_CONFIDENCE {
            self.warning
        } else {
            self.success
        }
    }

    pub fn status_style(&self, status: UploadStatus) -> Style {
        match status {
            UploadStatus::Processing => self.info,
            UploadStatus::Completed => self.success,
            UploadStatus::Error => self.error,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_token_differs_between_modes() {
        for token in ThemeToken::ALL {
            assert_ne!(
                resolve(token, true),
                resolve(token, false),
                "{token:?} resolves to the same colour in both modes"
            );
        }
    }

    #[test]
    fn test_theme_styles_come_from_resolver() {
        let dark = Theme::dark();
        assert!(dark.is_dark);
        assert_eq!(dark.text.fg, Some(resolve(ThemeToken::Text, true)));
        assert_eq!(dark.background.bg, Some(resolve(ThemeToken::Background, true)));

        let light = Theme::light();
        assert!(!light.is_dark);
        assert_eq!(light.ink.fg, Some(resolve(ThemeToken::Ink, false)));
        assert_eq!(light.grid.fg, Some(resolve(ThemeToken::Grid, false)));
    }

    #[test]
    fn test_header_is_bold() {
        assert!(Theme::light().header.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_trend_style() {
        let t = Theme::dark();
        assert_eq!(t.trend_style(Trend::Up), t.success);
        assert_eq!(t.trend_style(Trend::Down), t.error);
        assert_eq!(t.trend_style(Trend::Flat), t.warning);
    }

    #[test]
    fn test_confidence_style_threshold() {
        let t = Theme::light();
        assert_eq!(t.confidence_style(68), t.warning);
        assert_eq!(t.confidence_style(70), t.success);
        assert_eq!(t.confidence_style(85), t.success);
    }

    #[test]
    fn test_status_style() {
        let t = Theme::dark();
        assert_eq!(t.status_style(UploadStatus::Error), t.error);
        assert_eq!(t.status_style(UploadStatus::Completed), t.success);
    }
}
