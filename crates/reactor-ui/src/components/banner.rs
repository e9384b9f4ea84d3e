use crate::themes::Theme;
use ratatui::text::{Line, Span};

/// Standing caveat shown above every prediction.
pub const PREDICTION_WARNING: &str = "Predictions are based on limited batch reactor data - validate experimentally before implementation.";

/// Amber caveat banner.
pub struct WarningBanner<'a> {
    pub message: &'a str,
    pub theme: &'a Theme,
}

impl<'a> WarningBanner<'a> {
    pub fn new(message: &'a str, theme: &'a Theme) -> Self {
        Self { message, theme }
    }

    pub fn prediction(theme: &'a Theme) -> Self {
        Self::new(PREDICTION_WARNING, theme)
    }

    pub fn to_line(&self) -> Line<'a> {
        Line::from(vec![
            Span::styled(" ⚠ ", self.theme.banner_warning),
            Span::styled(self.message, self.theme.banner_warning),
        ])
    }
}

/// Error banner that stays until the user dismisses it with `Esc`.
pub struct ErrorBanner<'a> {
    pub message: &'a str,
    pub theme: &'a Theme,
}

impl<'a> ErrorBanner<'a> {
    pub fn new(message: &'a str, theme: &'a Theme) -> Self {
        Self { message, theme }
    }

    pub fn to_line(&self) -> Line<'a> {
        Line::from(vec![
            Span::styled(" ✖ ", self.theme.banner_error),
            Span::styled(self.message, self.theme.banner_error),
            Span::styled("  [Esc] Dismiss", self.theme.dim),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_prediction_warning_text() {
        let theme = Theme::light();
        let line = WarningBanner::prediction(&theme).to_line();
        assert!(text(&line).contains("validate experimentally before implementation"));
        assert_eq!(line.spans[1].style, theme.banner_warning);
    }

    #[test]
    fn test_error_banner_offers_dismiss() {
        let theme = Theme::dark();
        let line = ErrorBanner::new("Model prediction failed: Not Found", &theme).to_line();
        let rendered = text(&line);
        assert!(rendered.contains("Model prediction failed: Not Found"));
        assert!(rendered.ends_with("[Esc] Dismiss"));
    }
}
