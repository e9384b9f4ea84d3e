//! One module per dashboard screen.
//!
//! Every `render` function borrows the data it shows; screen state is only
//! changed by the event handlers in [`crate::app`].

pub mod dashboard;
pub mod data;
pub mod forward;
pub mod inverse;
pub mod performance;
pub mod settings;

use ratatui::text::Span;
use ratatui::widgets::{Block, Borders};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::themes::Theme;

// ── Screen ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Dashboard,
    Forward,
    Inverse,
    Data,
    Performance,
    Settings,
}

impl Screen {
    pub const ALL: [Screen; 6] = [
        Screen::Dashboard,
        Screen::Forward,
        Screen::Inverse,
        Screen::Data,
        Screen::Performance,
        Screen::Settings,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Screen::Dashboard => "Dashboard",
            Screen::Forward => "Forward Prediction",
            Screen::Inverse => "Inverse Problem",
            Screen::Data => "Data Management",
            Screen::Performance => "Model Performance",
            Screen::Settings => "Settings",
        }
    }

    /// Parse the `--screen` flag value. Unknown names open the dashboard.
    pub fn from_name(name: &str) -> Self {
        match name {
            "forward" => Screen::Forward,
            "inverse" => Screen::Inverse,
            "data" => Screen::Data,
            "performance" => Screen::Performance,
            "settings" => Screen::Settings,
            _ => Screen::Dashboard,
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

// ── Shared helpers ────────────────────────────────────────────────────────────

/// Bordered panel with a themed title.
pub(crate) fn panel<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border)
        .title(Span::styled(format!(" {title} "), theme.bold))
}

/// Truncate `s` to at most `width` display columns, marking the cut with `…`.
pub(crate) fn fit(s: &str, width: usize) -> String {
    if s.width() <= width {
        return s.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Text-entry line with a block cursor.
pub(crate) fn input_line<'a>(label: &'a str, buffer: &str, theme: &Theme) -> ratatui::text::Line<'a> {
    ratatui::text::Line::from(vec![
        Span::styled(label, theme.label),
        Span::styled(buffer.to_string(), theme.value),
        Span::styled("█", theme.info),
    ])
}
