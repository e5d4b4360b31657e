//! Container reserving its bottom row for a status line.

use crate::widget::core::{Widget, WidgetCore};
use ratatui::text::Span;
use std::cell::RefCell;
use std::rc::Rc;
use unicode_width::UnicodeWidthStr;

pub struct StatusBar {
    core: WidgetCore,
    text: String,
}

impl StatusBar {
    pub fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            core: WidgetCore::vertical(),
            text: String::new(),
        }))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

impl Widget for StatusBar {
    fn core(&self) -> &WidgetCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut WidgetCore {
        &mut self.core
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.core.set_size(width, height);
        let (width, height) = (self.core.width(), self.core.height());
        self.core.layout_children(width, height.saturating_sub(1));
    }

    fn paint(&mut self) {
        self.core.paint_children();

        let Some(y) = self.core.height().checked_sub(1) else {
            return;
        };
        let width = usize::from(self.core.width());
        let fill = width.saturating_sub(self.text.width());
        let style = self.core.theme().status_bar;
        self.core.write_at(
            0,
            y,
            &[
                Span::styled(self.text.as_str(), style),
                Span::styled(" ".repeat(fill), style),
            ],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::core::{attach, Container};
    use crate::widget::test_support::console;
    use crate::widget::util::bullet_join;
    use ratatui::layout::Rect;
    use ratatui::style::Color;

    #[test]
    fn children_get_all_but_the_last_row() {
        let bar = StatusBar::new();
        let body = Container::vertical();
        attach(&body, &bar);

        bar.borrow_mut().resize(30, 10);
        assert_eq!(bar.borrow().core().height(), 10);
        assert_eq!(body.borrow().core().area(), Rect::new(0, 0, 30, 9));
    }

    #[test]
    fn paints_text_across_the_full_width() {
        let (console, term, _tx) = console(24, 3);
        let bar = StatusBar::new();
        attach(&bar, &console);
        bar.borrow_mut().set_text(bullet_join(&["q: quit", "r: reload"]));
        bar.borrow_mut().resize(24, 3);

        bar.borrow_mut().paint();
        console.flush().unwrap();

        assert_eq!(term.line(2), "q: quit • r: reload     ");
        assert_eq!(term.style_at(23, 2).bg, Some(Color::Cyan));
        assert_eq!(term.style_at(0, 2).fg, Some(Color::Black));
    }
}
