use crate::themes::Theme;
use ratatui::style::Style;
use ratatui::text::{Line, Span};

use reactor_core::models::UploadStatus;

/// Configuration controlling visual appearance of a progress bar.
pub struct ProgressBarConfig {
    /// Width in columns of the bar portion (excluding the label).
    pub width: u16,
    pub filled_char: char,
    pub empty_char: char,
    pub show_percentage: bool,
}

impl Default for ProgressBarConfig {
    fn default() -> Self {
        Self {
            width: 20,
            filled_char: '\u{2588}', // █  FULL BLOCK
            empty_char: '\u{2591}',  // ░  LIGHT SHADE
            show_percentage: true,
        }
    }
}

fn bar_line<'a>(
    percent: u8,
    config: &ProgressBarConfig,
    fill: Style,
    empty: Style,
    label_style: Style,
) -> Line<'a> {
    let percent = percent.min(100);
    let filled = (percent as u32 * config.width as u32 / 100) as usize;
    let empty_width = (config.width as usize).saturating_sub(filled);

    let mut spans = vec![
        Span::styled(
            std::iter::repeat_n(config.filled_char, filled).collect::<String>(),
            fill,
        ),
        Span::styled(
            std::iter::repeat_n(config.empty_char, empty_width).collect::<String>(),
            empty,
        ),
    ];
    if config.show_percentage {
        spans.push(Span::styled(format!(" {percent:>3}%"), label_style));
    }
    Line::from(spans)
}

// ── PercentBar ───────────────────────────────────────────────────────────────

/// Plain percentage bar in the accent colour.
pub struct PercentBar<'a> {
    pub percent: u8,
    pub theme: &'a Theme,
    pub config: ProgressBarConfig,
}

impl<'a> PercentBar<'a> {
    pub fn new(percent: u8, theme: &'a Theme) -> Self {
        Self {
            percent,
            theme,
            config: ProgressBarConfig::default(),
        }
    }

    /// Bar for a `0.0..=1.0` fraction, rounded to whole percent.
    pub fn from_fraction(fraction: f64, theme: &'a Theme) -> Self {
        Self::new((fraction.clamp(0.0, 1.0) * 100.0).round() as u8, theme)
    }

    pub fn to_line(&self) -> Line<'a> {
        bar_line(
            self.percent,
            &self.config,
            self.theme.progress_fill,
            self.theme.progress_empty,
            self.theme.progress_label,
        )
    }
}

// ── UploadProgressBar ────────────────────────────────────────────────────────

/// Read progress of one uploaded file, coloured by its status.
pub struct UploadProgressBar<'a> {
    pub progress: u8,
    pub status: UploadStatus,
    pub theme: &'a Theme,
    pub config: ProgressBarConfig,
}

impl<'a> UploadProgressBar<'a> {
    pub fn new(progress: u8, status: UploadStatus, theme: &'a Theme) -> Self {
        Self {
            progress,
            status,
            theme,
            config: ProgressBarConfig::default(),
        }
    }

    pub fn to_line(&self) -> Line<'a> {
        let fill = match self.status {
            UploadStatus::Processing => self.theme.progress_fill,
            other => self.theme.status_style(other),
        };
        bar_line(
            self.progress,
            &self.config,
            fill,
            self.theme.progress_empty,
            self.theme.progress_label,
        )
    }
}

// ── ConfidenceBar ────────────────────────────────────────────────────────────

/// Confidence percentage bar; amber below the low-confidence threshold.
pub struct ConfidenceBar<'a> {
    pub confidence: u8,
    pub theme: &'a Theme,
    pub config: ProgressBarConfig,
}

impl<'a> ConfidenceBar<'a> {
    pub fn new(confidence: u8, theme: &'a Theme) -> Self {
        Self {
            confidence,
            theme,
            config: ProgressBarConfig::default(),
        }
    }

    pub fn to_line(&self) -> Line<'a> {
        let style = self.theme.confidence_style(self.confidence);
        bar_line(
            self.confidence,
            &self.config,
            style,
            self.theme.progress_empty,
            style,
        )
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
    fn test_upload_bar_fill_proportional() {
        let theme = Theme::dark();
        let line = UploadProgressBar::new(40, UploadStatus::Processing, &theme).to_line();
        assert_eq!(line.spans[0].content.chars().count(), 8);
        assert_eq!(line.spans[1].content.chars().count(), 12);
        assert!(text(&line).ends_with("  40%"));
    }

    #[test]
    fn test_upload_bar_clamps_over_100() {
        let theme = Theme::dark();
        let line = UploadProgressBar::new(250, UploadStatus::Completed, &theme).to_line();
        assert_eq!(line.spans[1].content.chars().count(), 0);
        assert!(text(&line).ends_with(" 100%"));
        assert_eq!(line.spans[0].style, theme.success);
    }

    #[test]
    fn test_upload_bar_error_colour() {
        let theme = Theme::light();
        let line = UploadProgressBar::new(60, UploadStatus::Error, &theme).to_line();
        assert_eq!(line.spans[0].style, theme.error);
    }

    #[test]
    fn test_confidence_bar_amber_below_threshold() {
        let theme = Theme::light();
        let low = ConfidenceBar::new(68, &theme).to_line();
        assert_eq!(low.spans[0].style, theme.warning);
        let high = ConfidenceBar::new(85, &theme).to_line();
        assert_eq!(high.spans[0].style, theme.success);
    }

    #[test]
    fn test_percent_bar_from_fraction() {
        let theme = Theme::dark();
        let bar = PercentBar::from_fraction(0.943, &theme);
        assert_eq!(bar.percent, 94);
        assert!(text(&bar.to_line()).ends_with("  94%"));
        assert_eq!(PercentBar::from_fraction(2.0, &theme).percent, 100);
    }

    #[test]
    fn test_hide_percentage() {
        let theme = Theme::dark();
        let mut bar = ConfidenceBar::new(50, &theme);
        bar.config.show_percentage = false;
        bar.config.width = 10;
        let line = bar.to_line();
        assert_eq!(line.spans.len(), 2);
        assert_eq!(text(&line).chars().count(), 10);
    }
}
