//! Style roles.
//!
//! Widgets never pick colors directly; they ask the console's [`ColorTheme`] for
//! the style of a semantic role (header, selected row, status bar).

use crate::error::{GhdError, Result};
use ratatui::style::{Color, Modifier, Style};
use std::str::FromStr;

/// Styles keyed by semantic role
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorTheme {
    /// Plain text and cleared areas
    pub default: Style,

    pub table_header: Style,
    pub table_row: Style,

    /// Selected row of the table that currently has focus
    pub table_row_selected_focus: Style,

    /// Selected row of a table that is not focused
    pub table_row_selected: Style,

    pub status_bar: Style,

    /// Frames of message boxes and popovers
    pub border: Style,

    pub error: Style,
    pub success: Style,
    pub info: Style,
}

impl Default for ColorTheme {
    fn default() -> Self {
        let default = Style::default().fg(Color::Gray).bg(Color::Black);
        Self {
            default,
            table_header: default.fg(Color::White).add_modifier(Modifier::UNDERLINED),
            table_row: default,
            table_row_selected_focus: Style::default().fg(Color::White).bg(Color::Blue),
            table_row_selected: Style::default().fg(Color::White).bg(Color::DarkGray),
            status_bar: Style::default().fg(Color::Black).bg(Color::Cyan),
            border: default.fg(Color::White),
            error: default.fg(Color::LightRed),
            success: default.fg(Color::Green),
            info: default.fg(Color::Cyan),
        }
    }
}

impl ColorTheme {
    /// Theme for terminals without color support
    pub fn monochrome() -> Self {
        let default = Style::default();
        Self {
            default,
            table_header: default.add_modifier(Modifier::UNDERLINED),
            table_row: default,
            table_row_selected_focus: default.add_modifier(Modifier::REVERSED),
            table_row_selected: default.add_modifier(Modifier::BOLD),
            status_bar: default.add_modifier(Modifier::REVERSED),
            border: default,
            error: default.add_modifier(Modifier::BOLD),
            success: default,
            info: default,
        }
    }

    /// High-contrast theme for accessibility
    pub fn high_contrast() -> Self {
        let default = Style::default().fg(Color::White).bg(Color::Black);
        Self {
            default,
            table_header: default
                .fg(Color::LightYellow)
                .add_modifier(Modifier::UNDERLINED | Modifier::BOLD),
            table_row: default,
            table_row_selected_focus: Style::default().fg(Color::Black).bg(Color::LightYellow),
            table_row_selected: Style::default().fg(Color::Black).bg(Color::White),
            status_bar: Style::default().fg(Color::Black).bg(Color::White),
            border: default.fg(Color::LightYellow),
            error: default.fg(Color::LightRed).add_modifier(Modifier::BOLD),
            success: default.fg(Color::LightGreen),
            info: default.fg(Color::LightCyan),
        }
    }

    pub fn named(name: ThemeName) -> Self {
        match name {
            ThemeName::Default => Self::default(),
            ThemeName::Monochrome => Self::monochrome(),
            ThemeName::HighContrast => Self::high_contrast(),
        }
    }

    /// Pick the named theme, falling back to monochrome when colors are unavailable.
    pub fn for_terminal(name: ThemeName, supports_color: bool) -> Self {
        if supports_color {
            Self::named(name)
        } else {
            Self::monochrome()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "kebab-case"))]
pub enum ThemeName {
    #[default]
    Default,
    Monochrome,
    HighContrast,
}

impl FromStr for ThemeName {
    type Err = GhdError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(ThemeName::Default),
            "monochrome" | "mono" => Ok(ThemeName::Monochrome),
            "high-contrast" | "high_contrast" => Ok(ThemeName::HighContrast),
            other => Err(GhdError::config(format!("unknown theme '{other}'"))),
        }
    }
}
