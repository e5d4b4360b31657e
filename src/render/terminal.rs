//! Terminal backends.
//!
//! [`Terminal`] is the seam between the widget framework and the real screen.
//! [`CrosstermTerminal`] drives a real terminal; tests use
//! [`VirtualTerminal`](crate::render::VirtualTerminal).

use crate::error::{GhdError, Result};
use crate::render::screen::ScreenOp;
use ratatui::crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{
        available_color_count, Attribute, Color as CColor, Print, SetAttribute,
        SetBackgroundColor, SetForegroundColor,
    },
    terminal::{
        disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::style::{Color, Modifier, Style};
use std::io::{self, Write};

/// Capability queries and frame output.
pub trait Terminal {
    /// Enter the full-screen mode used while the application runs.
    fn initialize(&mut self) -> Result<()>;

    /// Restore the terminal. Must be safe to call more than once.
    fn cleanup(&mut self) -> Result<()>;

    /// Current size as (columns, rows).
    fn size(&self) -> Result<(u16, u16)>;

    fn supports_color(&self) -> bool;

    /// Apply one frame of buffered ops.
    fn write(&mut self, ops: &[ScreenOp]) -> Result<()>;
}

/// Real terminal driven through crossterm.
pub struct CrosstermTerminal {
    active: bool,
}

impl CrosstermTerminal {
    pub fn new() -> Self {
        Self { active: false }
    }
}

impl Default for CrosstermTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for CrosstermTerminal {
    fn initialize(&mut self) -> Result<()> {
        enable_raw_mode().map_err(|e| GhdError::terminal("Failed to enable raw mode", e))?;
        execute!(
            io::stdout(),
            EnterAlternateScreen,
            Hide,
            Clear(ClearType::All)
        )
        .map_err(|e| GhdError::terminal("Failed to enter alternate screen", e))?;
        self.active = true;
        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        if self.active {
            self.active = false;
            disable_raw_mode()?;
            execute!(
                io::stdout(),
                SetAttribute(Attribute::Reset),
                Show,
                LeaveAlternateScreen
            )?;
        }
        Ok(())
    }

    fn size(&self) -> Result<(u16, u16)> {
        let (cols, rows) = ratatui::crossterm::terminal::size()?;
        Ok((cols, rows))
    }

    fn supports_color(&self) -> bool {
        available_color_count() >= 8
    }

    fn write(&mut self, ops: &[ScreenOp]) -> Result<()> {
        let mut frame = Vec::with_capacity(4096);
        encode_ops(ops, &mut frame)?;

        let mut stdout = io::stdout().lock();
        stdout.write_all(&frame)?;
        stdout.flush()?;
        Ok(())
    }
}

impl Drop for CrosstermTerminal {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Encode screen ops as escape sequences.
pub fn encode_ops(ops: &[ScreenOp], out: &mut impl Write) -> io::Result<()> {
    for op in ops {
        match op {
            ScreenOp::MoveTo { x, y } => queue!(out, MoveTo(*x, *y))?,
            ScreenOp::SetStyle(style) => queue_style(out, *style)?,
            ScreenOp::Print(text) => queue!(out, Print(text))?,
        }
    }
    Ok(())
}

fn queue_style(out: &mut impl Write, style: Style) -> io::Result<()> {
    queue!(out, SetAttribute(Attribute::Reset))?;
    if let Some(fg) = style.fg {
        queue!(out, SetForegroundColor(to_crossterm_color(fg)))?;
    }
    if let Some(bg) = style.bg {
        queue!(out, SetBackgroundColor(to_crossterm_color(bg)))?;
    }

    let modifiers = style.add_modifier;
    let attributes = [
        (Modifier::BOLD, Attribute::Bold),
        (Modifier::DIM, Attribute::Dim),
        (Modifier::ITALIC, Attribute::Italic),
        (Modifier::UNDERLINED, Attribute::Underlined),
        (Modifier::REVERSED, Attribute::Reverse),
        (Modifier::CROSSED_OUT, Attribute::CrossedOut),
    ];
    for (modifier, attribute) in attributes {
        if modifiers.contains(modifier) {
            queue!(out, SetAttribute(attribute))?;
        }
    }
    Ok(())
}

fn to_crossterm_color(color: Color) -> CColor {
    match color {
        Color::Reset => CColor::Reset,
        Color::Black => CColor::Black,
        Color::Red => CColor::DarkRed,
        Color::Green => CColor::DarkGreen,
        Color::Yellow => CColor::DarkYellow,
        Color::Blue => CColor::DarkBlue,
        Color::Magenta => CColor::DarkMagenta,
        Color::Cyan => CColor::DarkCyan,
        Color::Gray => CColor::Grey,
        Color::DarkGray => CColor::DarkGrey,
        Color::LightRed => CColor::Red,
        Color::LightGreen => CColor::Green,
        Color::LightYellow => CColor::Yellow,
        Color::LightBlue => CColor::Blue,
        Color::LightMagenta => CColor::Magenta,
        Color::LightCyan => CColor::Cyan,
        Color::White => CColor::White,
        Color::Rgb(r, g, b) => CColor::Rgb { r, g, b },
        Color::Indexed(i) => CColor::AnsiValue(i),
    }
}
