use crate::themes::Theme;
use ratatui::text::{Line, Span};

/// Glyph placed either side of the application title.
pub const FLASK: &str = "⚗";

/// Dashboard header rendering three lines:
///
/// 1. Application title (ALL CAPS).
/// 2. A 60-column `=` separator.
/// 3. `[ screen | source | mode ]` status line.
pub struct Header<'a> {
    /// Title of the active screen.
    pub screen: &'a str,
    /// Name of the prediction source in use (`remote` or `mock`).
    pub source: &'a str,
    pub theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(screen: &'a str, source: &'a str, theme: &'a Theme) -> Self {
        Self {
            screen,
            source,
            theme,
        }
    }

    pub fn to_lines(&self) -> Vec<Line<'a>> {
        let mode = if self.theme.is_dark { "dark" } else { "light" };
        vec![
            Line::from(vec![
                Span::styled(FLASK, self.theme.warning),
                Span::styled(" POLYMER REACTOR ML DASHBOARD ", self.theme.header),
                Span::styled(FLASK, self.theme.warning),
            ]),
            Line::from(Span::styled("=".repeat(60), self.theme.separator)),
            Line::from(vec![
                Span::styled("[ ", self.theme.label),
                Span::styled(self.screen.to_lowercase(), self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(self.source, self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(mode, self.theme.value),
                Span::styled(" ]", self.theme.label),
            ]),
        ]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_header_lines() {
        let theme = Theme::dark();
        let lines = Header::new("Forward Prediction", "mock", &theme).to_lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(text(&lines[0]), "⚗ POLYMER REACTOR ML DASHBOARD ⚗");
        assert_eq!(text(&lines[1]).len(), 60);
        assert_eq!(text(&lines[2]), "[ forward prediction | mock | dark ]");
    }

    #[test]
    fn test_header_light_mode() {
        let theme = Theme::light();
        let lines = Header::new("Settings", "remote", &theme).to_lines();
        assert!(text(&lines[2]).ends_with("| light ]"));
        assert_eq!(lines[0].spans[1].style, theme.header);
    }
}
