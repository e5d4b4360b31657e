//! Transient overlays drawn straight to the screen.
//!
//! A popover is not part of the widget tree: it paints a framed, word-wrapped
//! message over a widget's rectangle and flushes immediately. The next regular
//! paint removes it.

use crate::error::{GhdError, Result};
use crate::input::Key;
use crate::widget::core::{WidgetCore, WidgetRef};
use crate::widget::util::draw_border_double;
use ratatui::text::Span;
use unicode_width::UnicodeWidthStr;

/// Accent used for the popover text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopoverKind {
    #[default]
    Plain,
    Info,
    Error,
}

fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for chunk in text.lines() {
        let wrapped = textwrap::wrap(chunk, width);
        if wrapped.is_empty() {
            // Keep blank lines of the source text
            lines.push(String::new());
        }
        lines.extend(wrapped.into_iter().map(|line| line.into_owned()));
    }
    lines
}

fn draw(core: &WidgetCore, text: &str, kind: PopoverKind) {
    let theme = core.theme();
    let style = match kind {
        PopoverKind::Plain => theme.default,
        PopoverKind::Info => theme.info,
        PopoverKind::Error => theme.error,
    };

    core.clear_viewport();
    draw_border_double(core);

    let (width, height) = (core.width(), core.height());
    if width <= 4 {
        return;
    }
    let lines = wrap_lines(text, usize::from(width - 4));
    let top = height.saturating_sub(lines.len() as u16) / 2;
    for (index, line) in lines.iter().enumerate() {
        let left = width.saturating_sub(line.width() as u16) / 2;
        core.write_at(left, top + index as u16, &[Span::styled(line.as_str(), style)]);
    }
}

fn show(core: &WidgetCore, text: &str, kind: PopoverKind) -> Result<()> {
    draw(core, text, kind);
    match core.console() {
        Some(console) => console.flush(),
        None => Ok(()),
    }
}

/// Draw `text` centered over the widget and flush.
pub fn popover(core: &WidgetCore, text: &str) -> Result<()> {
    show(core, text, PopoverKind::Plain)
}

pub fn popover_info(core: &WidgetCore, text: &str) -> Result<()> {
    show(core, text, PopoverKind::Info)
}

pub fn popover_error(core: &WidgetCore, text: &str) -> Result<()> {
    show(core, text, PopoverKind::Error)
}

/// Show a popover and wait for the key press acknowledging it.
pub async fn popover_confirm(widget: &WidgetRef, text: &str, kind: PopoverKind) -> Result<Key> {
    let console = {
        let widget = widget.borrow();
        draw(widget.core(), text, kind);
        widget.core().console().cloned()
    };
    let console =
        console.ok_or_else(|| GhdError::ui("popover requires a widget attached to a console"))?;
    console.flush()?;
    console.next_key().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputEvent;
    use crate::widget::core::{attach, Container, Widget};
    use crate::widget::test_support::console;
    use ratatui::style::Color;

    #[test]
    fn wraps_and_keeps_blank_lines() {
        assert_eq!(wrap_lines("one two three four", 8), vec!["one two", "three", "four"]);
        assert_eq!(wrap_lines("a\n\nb", 8), vec!["a", "", "b"]);
    }

    #[test]
    fn centered_in_a_frame() {
        let (console, term, _tx) = console(20, 5);
        let root = Container::vertical();
        attach(&root, &console);
        root.borrow_mut().resize(20, 5);

        popover(root.borrow().core(), "Saved").unwrap();

        assert_eq!(term.frames(), 1);
        assert_eq!(
            term.lines(),
            vec![
                "╔══════════════════╗",
                "║                  ║",
                "║      Saved       ║",
                "║                  ║",
                "╚══════════════════╝",
            ]
        );
    }

    #[test]
    fn error_accent() {
        let (console, term, _tx) = console(20, 5);
        let root = Container::vertical();
        attach(&root, &console);
        root.borrow_mut().resize(20, 5);

        popover_error(root.borrow().core(), "boom").unwrap();
        assert_eq!(term.style_at(8, 2).fg, Some(Color::LightRed));
    }

    #[tokio::test]
    async fn confirm_returns_the_acknowledging_key() {
        let (console, term, tx) = console(24, 5);
        let root = Container::vertical();
        attach(&root, &console);
        root.borrow_mut().resize(24, 5);

        tx.send(InputEvent::Key(Key::Char('x'))).unwrap();
        let widget: WidgetRef = root.clone();
        let key = popover_confirm(&widget, "Deployment failed", PopoverKind::Error)
            .await
            .unwrap();

        assert_eq!(key, Key::Char('x'));
        assert!(term.line(2).contains("Deployment failed"));
    }

    #[tokio::test]
    async fn confirm_needs_a_console() {
        let widget: WidgetRef = Container::vertical();
        let err = popover_confirm(&widget, "hi", PopoverKind::Plain).await.unwrap_err();
        assert!(matches!(err, GhdError::Ui { .. }));
    }
}
