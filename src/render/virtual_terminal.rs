//! In-memory terminal for golden rendering tests.
//!
//! Applies [`ScreenOp`]s to a ratatui [`Buffer`] so tests can assert the exact
//! characters and styles a widget produced. Clones share the same grid, so a
//! test can keep one handle while the console owns another.

use crate::error::Result;
use crate::render::screen::ScreenOp;
use crate::render::terminal::Terminal;
use ratatui::buffer::{Buffer, Cell};
use ratatui::layout::Rect;
use ratatui::style::Style;
use std::cell::RefCell;
use std::rc::Rc;
use unicode_width::UnicodeWidthChar;

struct Grid {
    buffer: Buffer,
    cursor: (u16, u16),
    style: Style,
    color: bool,
    initialized: bool,
    frames: usize,
}

#[derive(Clone)]
pub struct VirtualTerminal {
    grid: Rc<RefCell<Grid>>,
}

fn area(width: u16, height: u16) -> Rect {
    Rect {
        x: 0,
        y: 0,
        width,
        height,
    }
}

impl VirtualTerminal {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            grid: Rc::new(RefCell::new(Grid {
                buffer: Buffer::empty(area(width, height)),
                cursor: (0, 0),
                style: Style::default(),
                color: true,
                initialized: false,
                frames: 0,
            })),
        }
    }

    /// Report no color support, as a dumb terminal would.
    pub fn without_color(self) -> Self {
        self.grid.borrow_mut().color = false;
        self
    }

    /// Simulate the user resizing the window. Content is discarded.
    pub fn set_size(&self, width: u16, height: u16) {
        let mut grid = self.grid.borrow_mut();
        grid.buffer = Buffer::empty(area(width, height));
        grid.cursor = (0, 0);
    }

    /// Rows of the grid as plain strings.
    pub fn lines(&self) -> Vec<String> {
        let grid = self.grid.borrow();
        let Rect { width, height, .. } = grid.buffer.area;
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| grid.buffer.get(x, y).symbol())
                    .collect::<String>()
            })
            .collect()
    }

    pub fn line(&self, y: u16) -> String {
        self.lines().swap_remove(usize::from(y))
    }

    pub fn cell(&self, x: u16, y: u16) -> Cell {
        self.grid.borrow().buffer.get(x, y).clone()
    }

    /// Style of the cell at (x, y)
    pub fn style_at(&self, x: u16, y: u16) -> Style {
        self.grid.borrow().buffer.get(x, y).style()
    }

    /// Number of frames written so far
    pub fn frames(&self) -> usize {
        self.grid.borrow().frames
    }

    pub fn is_initialized(&self) -> bool {
        self.grid.borrow().initialized
    }
}

impl Grid {
    fn apply(&mut self, op: &ScreenOp) {
        match op {
            ScreenOp::MoveTo { x, y } => self.cursor = (*x, *y),
            ScreenOp::SetStyle(style) => self.style = *style,
            ScreenOp::Print(text) => self.print(text),
        }
    }

    // Text is clipped at the right edge rather than wrapped.
    fn print(&mut self, text: &str) {
        let Rect { width, height, .. } = self.buffer.area;
        let (mut x, y) = self.cursor;
        if y >= height {
            return;
        }

        for ch in text.chars() {
            let ch_width = ch.width().unwrap_or(0) as u16;
            if ch_width == 0 {
                continue;
            }
            if x + ch_width > width {
                break;
            }

            let cell = self.buffer.get_mut(x, y);
            cell.reset();
            cell.set_char(ch).set_style(self.style);
            for pad in 1..ch_width {
                let cell = self.buffer.get_mut(x + pad, y);
                cell.reset();
                cell.set_symbol("").set_style(self.style);
            }
            x += ch_width;
        }
        self.cursor = (x, y);
    }
}

impl Terminal for VirtualTerminal {
    fn initialize(&mut self) -> Result<()> {
        self.grid.borrow_mut().initialized = true;
        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        self.grid.borrow_mut().initialized = false;
        Ok(())
    }

    fn size(&self) -> Result<(u16, u16)> {
        let area = self.grid.borrow().buffer.area;
        Ok((area.width, area.height))
    }

    fn supports_color(&self) -> bool {
        self.grid.borrow().color
    }

    fn write(&mut self, ops: &[ScreenOp]) -> Result<()> {
        let mut grid = self.grid.borrow_mut();
        for op in ops {
            grid.apply(op);
        }
        grid.frames += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    #[test]
    fn prints_at_cursor_with_style() {
        let mut term = VirtualTerminal::new(10, 2);
        let red = Style::default().fg(Color::Red);
        term.write(&[
            ScreenOp::MoveTo { x: 3, y: 1 },
            ScreenOp::SetStyle(red),
            ScreenOp::Print("abc".to_string()),
        ])
        .unwrap();

        assert_eq!(term.lines(), vec!["          ", "   abc    "]);
        assert_eq!(term.style_at(4, 1).fg, Some(Color::Red));
        assert_eq!(term.frames(), 1);
    }

    #[test]
    fn clips_at_right_edge() {
        let mut term = VirtualTerminal::new(4, 1);
        term.write(&[
            ScreenOp::MoveTo { x: 2, y: 0 },
            ScreenOp::Print("xyz".to_string()),
        ])
        .unwrap();
        assert_eq!(term.line(0), "  xy");
    }

    #[test]
    fn resize_and_capabilities() {
        let term = VirtualTerminal::new(80, 24).without_color();
        assert!(!term.supports_color());
        term.set_size(40, 10);
        assert_eq!(term.size().unwrap(), (40, 10));
        assert_eq!(term.lines().len(), 10);
    }
}
