//! Settings: browse, edit and reset the persisted preferences.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};
use serde_json::Value;

use reactor_core::error::{DashboardError, Result};
use reactor_core::preferences::PreferencesStore;

use crate::screens::{input_line, panel};
use crate::themes::Theme;

#[derive(Debug, Clone, Default)]
pub struct SettingsScreen {
    pub selected: usize,
    /// Text being typed for a non-boolean setting.
    pub editing: Option<String>,
}

impl SettingsScreen {
    pub fn select_next(&mut self, len: usize) {
        if len > 0 {
            self.selected = (self.selected + 1) % len;
        }
    }

    pub fn select_prev(&mut self, len: usize) {
        if len > 0 {
            self.selected = (self.selected + len - 1) % len;
        }
    }

    /// Key of the selected entry.
    pub fn selected_key(&self, store: &PreferencesStore) -> Option<(String, Value)> {
        store.get().entries().into_iter().nth(self.selected)
    }

    /// Enter on a boolean flips it; any other value opens the editor.
    pub fn activate(&mut self, store: &mut PreferencesStore) -> Result<()> {
        let Some((key, value)) = self.selected_key(store) else {
            return Ok(());
        };
        match value {
            Value::Bool(_) => store.toggle(&key),
            Value::String(s) => {
                self.editing = Some(s);
                Ok(())
            }
            other => {
                self.editing = Some(other.to_string());
                Ok(())
            }
        }
    }

    /// Write the edited text back through the store.
    pub fn commit(&mut self, store: &mut PreferencesStore) -> Result<()> {
        let Some(text) = self.editing.take() else {
            return Ok(());
        };
        let Some((key, current)) = self.selected_key(store) else {
            return Ok(());
        };
        store.set(&key, parse_entry(&current, &text)?)
    }
}

/// Parse `text` into a value of the same JSON type as `current`.
pub fn parse_entry(current: &Value, text: &str) -> Result<Value> {
    let text = text.trim();
    let invalid = || DashboardError::Config(format!("'{text}' is not a valid value"));
    match current {
        Value::String(_) => Ok(Value::String(text.to_string())),
        Value::Number(n) if n.is_u64() => text.parse::<u64>().map(Value::from).map_err(|_| invalid()),
        Value::Number(_) => {
            let v: f64 = text.parse().map_err(|_| invalid())?;
            serde_json::Number::from_f64(v).map(Value::Number).ok_or_else(invalid)
        }
        Value::Bool(_) => text.parse::<bool>().map(Value::Bool).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

/// `confidenceThreshold` → `Confidence Threshold`.
pub fn humanize(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, c) in key.chars().enumerate() {
        if i == 0 {
            out.extend(c.to_uppercase());
        } else if c.is_uppercase() {
            out.push(' ');
            out.push(c);
        } else {
            out.push(c);
        }
    }
    out
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Bool(true) => "on".to_string(),
        Value::Bool(false) => "off".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn render(
    frame: &mut Frame,
    area: Rect,
    screen: &SettingsScreen,
    store: &PreferencesStore,
    theme: &Theme,
) {
    let [list_area, info_area] =
        Layout::horizontal([Constraint::Min(40), Constraint::Length(44)]).areas(area);

    let lines: Vec<Line> = store
        .get()
        .entries()
        .into_iter()
        .enumerate()
        .map(|(idx, (key, value))| {
            let selected = idx == screen.selected;
            let label = format!("{}{:<28}", if selected { "› " } else { "  " }, humanize(&key));
            let label_style = if selected { theme.selected } else { theme.label };
            match (&screen.editing, selected) {
                (Some(buffer), true) => {
                    let mut line = input_line("", buffer, theme);
                    line.spans.insert(0, Span::styled(label, label_style));
                    line
                }
                _ => {
                    let value_style = match value {
                        Value::Bool(true) => theme.success,
                        Value::Bool(false) => theme.dim,
                        _ => theme.value,
                    };
                    Line::from(vec![
                        Span::styled(label, label_style),
                        Span::styled(display_value(&value), value_style),
                    ])
                }
            }
        })
        .collect();
    frame.render_widget(Paragraph::new(lines).block(panel("Preferences", theme)), list_area);

    let info = vec![
        Line::from(Span::styled("Saved to", theme.label)),
        Line::from(Span::styled(store.path().display().to_string(), theme.value)),
        Line::from(""),
        Line::from(Span::styled("↑/↓ select", theme.dim)),
        Line::from(Span::styled("Enter toggle or edit", theme.dim)),
        Line::from(Span::styled("t toggle dark mode", theme.dim)),
        Line::from(Span::styled("r reset to defaults", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(info)
            .wrap(Wrap { trim: false })
            .block(panel("Storage", theme)),
        info_area,
    );
}
