//! Frame staging buffer.
//!
//! Widgets append cursor moves and styled text here during paint; the console
//! hands the accumulated ops to the terminal in a single write per flush.

use ratatui::style::Style;
use ratatui::text::Span;
use unicode_width::UnicodeWidthChar;

/// One primitive terminal operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenOp {
    MoveTo { x: u16, y: u16 },
    /// Replaces the active style entirely (reset, then apply)
    SetStyle(Style),
    Print(String),
}

#[derive(Debug, Default)]
pub struct ScreenBuffer {
    ops: Vec<ScreenOp>,
    current_style: Option<Style>,
}

impl ScreenBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, x: u16, y: u16) {
        self.ops.push(ScreenOp::MoveTo { x, y });
    }

    pub fn set_style(&mut self, style: Style) {
        if self.current_style == Some(style) {
            return;
        }
        self.current_style = Some(style);
        self.ops.push(ScreenOp::SetStyle(style));
    }

    pub fn print(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(ScreenOp::Print(last)) = self.ops.last_mut() {
            last.push_str(text);
        } else {
            self.ops.push(ScreenOp::Print(text.to_string()));
        }
    }

    /// Position the cursor and print `spans`, stopping after `max_width` columns.
    ///
    /// Returns the number of columns written.
    pub fn print_at(&mut self, x: u16, y: u16, spans: &[Span<'_>], max_width: u16) -> u16 {
        self.move_to(x, y);
        let mut remaining = usize::from(max_width);
        for span in spans {
            if remaining == 0 {
                break;
            }
            let (text, width) = clip_to_width(&span.content, remaining);
            if text.is_empty() {
                continue;
            }
            self.set_style(span.style);
            self.print(text);
            remaining -= width;
        }
        max_width - remaining as u16
    }

    pub fn ops(&self) -> &[ScreenOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Drain the buffered ops, leaving the buffer ready for the next frame.
    pub fn take(&mut self) -> Vec<ScreenOp> {
        self.current_style = None;
        std::mem::take(&mut self.ops)
    }

    pub fn clear(&mut self) {
        self.ops.clear();
        self.current_style = None;
    }
}

/// Longest prefix of `text` that fits in `max_width` terminal columns, with its width.
pub fn clip_to_width(text: &str, max_width: usize) -> (&str, usize) {
    let mut width = 0;
    for (index, ch) in text.char_indices() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width {
            return (&text[..index], width);
        }
        width += ch_width;
    }
    (text, width)
}

/// Display width of `text` in terminal columns.
pub fn display_width(text: &str) -> usize {
    text.chars().map(|ch| ch.width().unwrap_or(0)).sum()
}
