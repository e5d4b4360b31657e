//! Modal message with a row of choices.

use crate::error::Result;
use crate::input::Key;
use crate::signal::{merge_results, AsyncSignal, EventFlow};
use crate::widget::core::{Widget, WidgetCore};
use crate::widget::util::{clip_line, draw_border_double};
use ratatui::text::{Span, Text};
use std::cell::RefCell;
use std::rc::Rc;
use unicode_width::UnicodeWidthStr;

pub struct MessageBox<V> {
    core: WidgetCore,
    message: Text<'static>,
    choices: Vec<(String, V)>,
    current: usize,
    selected: AsyncSignal<V, Result<()>>,
    aborted: AsyncSignal<(), Result<()>>,
}

impl<V: Clone + 'static> MessageBox<V> {
    /// Build a message box with `choices` as `(label, value)` pairs.
    ///
    /// Tab/Right and BackTab/Left cycle the choices, Enter raises
    /// [`selected`](Self::selected) and Esc or `q` raises [`aborted`](Self::aborted).
    pub fn new(message: impl Into<Text<'static>>, choices: Vec<(String, V)>) -> Rc<RefCell<Self>> {
        let this = Rc::new(RefCell::new(Self {
            core: WidgetCore::vertical(),
            message: message.into(),
            choices,
            current: 0,
            selected: AsyncSignal::new(),
            aborted: AsyncSignal::new(),
        }));

        let keys = |key: Key| this.borrow_mut().core.on(key);
        for key in [Key::Tab, Key::Right] {
            keys(key).connect_weak(&this, |mb, _| {
                mb.borrow_mut().next_choice();
                async { Ok(EventFlow::Handled) }
            });
        }
        for key in [Key::BackTab, Key::Left] {
            keys(key).connect_weak(&this, |mb, _| {
                mb.borrow_mut().prev_choice();
                async { Ok(EventFlow::Handled) }
            });
        }
        for key in [Key::Esc, Key::Char('q')] {
            keys(key).connect_weak(&this, |mb, _| {
                let aborted = mb.borrow().aborted.clone();
                async move {
                    merge_results(aborted.emit(()).await)?;
                    Ok(EventFlow::Handled)
                }
            });
        }
        keys(Key::Enter).connect_weak(&this, |mb, _| {
            let (selected, value) = {
                let mb = mb.borrow();
                (mb.selected.clone(), mb.choice().map(|(_, value)| value.clone()))
            };
            async move {
                if let Some(value) = value {
                    merge_results(selected.emit(value).await)?;
                }
                Ok(EventFlow::Handled)
            }
        });

        this
    }

    pub fn selected(&self) -> &AsyncSignal<V, Result<()>> {
        &self.selected
    }

    pub fn aborted(&self) -> &AsyncSignal<(), Result<()>> {
        &self.aborted
    }

    pub fn set_message(&mut self, message: impl Into<Text<'static>>) {
        self.message = message.into();
    }

    pub fn choice(&self) -> Option<&(String, V)> {
        self.choices.get(self.current)
    }

    pub fn choice_index(&self) -> usize {
        self.current
    }

    pub fn set_choice_index(&mut self, index: usize) {
        self.current = index.min(self.choices.len().saturating_sub(1));
    }

    pub fn next_choice(&mut self) {
        if !self.choices.is_empty() {
            self.current = (self.current + 1) % self.choices.len();
        }
    }

    pub fn prev_choice(&mut self) {
        if !self.choices.is_empty() {
            self.current = (self.current + self.choices.len() - 1) % self.choices.len();
        }
    }
}

impl<V: 'static> Widget for MessageBox<V> {
    fn core(&self) -> &WidgetCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut WidgetCore {
        &mut self.core
    }

    fn paint(&mut self) {
        self.core.clear_viewport();
        draw_border_double(&self.core);

        let theme = self.core.theme();
        let max_width = usize::from(self.core.width().saturating_sub(4));
        let mut y = 1;
        for line in &self.message.lines {
            self.core.write_at(2, y, &clip_line(line, max_width));
            y += 1;
        }

        y += 1;
        let mut x = 2;
        for (index, (label, _)) in self.choices.iter().enumerate() {
            let text = format!("[ {label} ]");
            let style = if index == self.current {
                theme.table_row_selected_focus
            } else {
                theme.default
            };
            let width = text.width() as u16;
            self.core.write_at(x, y, &[Span::styled(text, style)]);
            x = x.saturating_add(width + 2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::core::{attach, handle_input, WidgetRef};
    use crate::widget::test_support::console;
    use ratatui::style::Color;
    use std::cell::Cell;

    fn yes_no() -> Rc<RefCell<MessageBox<bool>>> {
        MessageBox::new(
            "Deploy?",
            vec![("Yes".to_string(), true), ("No".to_string(), false)],
        )
    }

    #[tokio::test]
    async fn left_then_enter_selects_yes() {
        let mb = yes_no();
        mb.borrow_mut().set_choice_index(1);
        let picked = Rc::new(Cell::new(None));

        let sink = Rc::clone(&picked);
        mb.borrow().selected().connect(move |value| {
            sink.set(Some(value));
            async { Ok(()) }
        });

        let widget: WidgetRef = mb.clone();
        handle_input(widget.clone(), Key::Left).await.unwrap();
        let flow = handle_input(widget, Key::Enter).await.unwrap();

        assert_eq!(flow, EventFlow::Handled);
        assert_eq!(picked.get(), Some(true));
    }

    #[tokio::test]
    async fn choices_wrap_and_abort_fires() {
        let mb = yes_no();
        let aborts = Rc::new(Cell::new(0));
        let counter = Rc::clone(&aborts);
        mb.borrow().aborted().connect(move |()| {
            counter.set(counter.get() + 1);
            async { Ok(()) }
        });

        let widget: WidgetRef = mb.clone();
        handle_input(widget.clone(), Key::Tab).await.unwrap();
        handle_input(widget.clone(), Key::Right).await.unwrap();
        assert_eq!(mb.borrow().choice_index(), 0);
        handle_input(widget.clone(), Key::BackTab).await.unwrap();
        assert_eq!(mb.borrow().choice().map(|c| c.1), Some(false));

        handle_input(widget.clone(), Key::Esc).await.unwrap();
        handle_input(widget, Key::Char('q')).await.unwrap();
        assert_eq!(aborts.get(), 2);
    }

    #[test]
    fn choice_index_is_clamped() {
        let mb = yes_no();
        mb.borrow_mut().set_choice_index(7);
        assert_eq!(mb.borrow().choice_index(), 1);
    }

    #[test]
    fn paints_frame_message_and_choices() {
        let (console, term, _tx) = console(20, 6);
        let mb = yes_no();
        attach(&mb, &console);
        mb.borrow_mut().resize(20, 6);

        mb.borrow_mut().paint();
        console.flush().unwrap();

        assert_eq!(
            term.lines(),
            vec![
                "╔══════════════════╗",
                "║ Deploy?          ║",
                "║                  ║",
                "║ [ Yes ]  [ No ]  ║",
                "║                  ║",
                "╚══════════════════╝",
            ]
        );
        assert_eq!(term.style_at(2, 3).bg, Some(Color::Blue));
        assert_ne!(term.style_at(11, 3).bg, Some(Color::Blue));
    }
}
