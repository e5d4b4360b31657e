//! Widget tree primitives: geometry, composition, focus and key dispatch.
//!
//! Widgets live behind `Rc<RefCell<_>>` on the single UI thread. Parents hold
//! strong references to their children and children hold a weak reference to
//! their parent. No borrow is held across an `.await`: dispatch looks up what it
//! needs, releases the borrow, then awaits handlers.

use crate::error::Result;
use crate::input::Key;
use crate::render::{ColorTheme, Console};
use crate::signal::{merge_flows, AsyncSignal, EventFlow};
use crate::widget::layout::{flex_offsets, Direction};
use futures::future::{FutureExt, LocalBoxFuture};
use ratatui::layout::Rect;
use ratatui::text::Span;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

pub type WidgetRef = Rc<RefCell<dyn Widget>>;
pub type WeakWidgetRef = Weak<RefCell<dyn Widget>>;

/// Per-key signal. Handlers report whether they consumed the key.
pub type KeySignal = AsyncSignal<Key, Result<EventFlow>>;

/// A widget's built-in reaction to a key nobody else consumed.
pub enum KeyReaction {
    Unhandled,
    Handled,
    /// Consumed; the notification runs after the widget borrow is released.
    Deferred(LocalBoxFuture<'static, Result<()>>),
}

impl KeyReaction {
    async fn resolve(self) -> Result<EventFlow> {
        match self {
            KeyReaction::Unhandled => Ok(EventFlow::Unhandled),
            KeyReaction::Handled => Ok(EventFlow::Handled),
            KeyReaction::Deferred(notify) => {
                notify.await?;
                Ok(EventFlow::Handled)
            }
        }
    }
}

/// A node of the UI tree.
///
/// Implementors embed a [`WidgetCore`] and override the phases they need.
pub trait Widget {
    fn core(&self) -> &WidgetCore;
    fn core_mut(&mut self) -> &mut WidgetCore;

    /// Take the given size (clipped to the parent) and lay out children.
    fn resize(&mut self, width: u16, height: u16) {
        let core = self.core_mut();
        core.set_size(width, height);
        core.layout_children(core.width(), core.height());
    }

    fn paint(&mut self) {
        let core = self.core();
        core.clear_viewport();
        core.paint_children();
    }

    /// Built-in key behavior, consulted after key signals and the focused child.
    fn handle_key(&mut self, _key: Key) -> KeyReaction {
        KeyReaction::Unhandled
    }
}

/// State shared by every widget.
pub struct WidgetCore {
    console: Option<Rc<Console>>,
    parent: Option<WeakWidgetRef>,
    children: Vec<WidgetRef>,
    direction: Direction,
    area: Rect,
    // Parent rectangle at the time of the last layout
    bounds: Option<Rect>,
    flex: u16,
    focus_index: usize,
    focused: bool,
    keys: HashMap<Key, KeySignal>,
}

impl WidgetCore {
    pub fn new(direction: Direction) -> Self {
        Self {
            console: None,
            parent: None,
            children: Vec::new(),
            direction,
            area: Rect {
                x: 0,
                y: 0,
                width: 1,
                height: 1,
            },
            bounds: None,
            flex: 1,
            focus_index: 0,
            focused: true,
            keys: HashMap::new(),
        }
    }

    pub fn vertical() -> Self {
        Self::new(Direction::Vertical)
    }

    pub fn horizontal() -> Self {
        Self::new(Direction::Horizontal)
    }

    pub fn with_flex(mut self, flex: u16) -> Self {
        self.flex = flex;
        self
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn x(&self) -> u16 {
        self.area.x
    }

    pub fn y(&self) -> u16 {
        self.area.y
    }

    pub fn width(&self) -> u16 {
        self.area.width
    }

    pub fn height(&self) -> u16 {
        self.area.height
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn flex(&self) -> u16 {
        self.flex
    }

    pub fn set_flex(&mut self, flex: u16) {
        self.flex = flex;
    }

    pub fn parent(&self) -> Option<WidgetRef> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    pub fn children(&self) -> &[WidgetRef] {
        &self.children
    }

    pub fn console(&self) -> Option<&Rc<Console>> {
        self.console.as_ref()
    }

    /// Active theme, or the default one while detached.
    pub fn theme(&self) -> ColorTheme {
        self.console
            .as_ref()
            .map(|console| *console.theme())
            .unwrap_or_default()
    }

    /// Signal raised when `key` reaches this widget, created on first use.
    pub fn on(&mut self, key: impl Into<Key>) -> KeySignal {
        self.keys.entry(key.into()).or_default().clone()
    }

    pub fn key_signal(&self, key: Key) -> Option<KeySignal> {
        self.keys.get(&key).cloned()
    }

    pub fn focus_index(&self) -> usize {
        self.focus_index
    }

    /// True when this widget and every ancestor focus along the path to it.
    pub fn has_focus(&self) -> bool {
        self.focused
    }

    pub fn focused_child(&self) -> Option<WidgetRef> {
        self.children.get(self.focus_index).cloned()
    }

    /// Focus the child at `index`, wrapping modulo the child count.
    pub fn set_focus_index(&mut self, index: usize) {
        self.focus_index = if self.children.is_empty() {
            0
        } else {
            index % self.children.len()
        };
        self.sync_focus(self.focused);
    }

    pub fn focus_next(&mut self) {
        self.set_focus_index(self.focus_index + 1);
    }

    pub fn focus_prev(&mut self) {
        let len = self.children.len().max(1);
        self.set_focus_index(self.focus_index + len - 1);
    }

    /// Swap the whole child list, focusing the first new child.
    pub fn replace_children(&mut self, children: Vec<WidgetRef>) {
        for child in &children {
            child.borrow_mut().core_mut().set_console(self.console.clone());
        }
        self.children = children;
        self.focus_index = 0;
        self.sync_focus(self.focused);
    }

    pub(crate) fn set_parent(&mut self, parent: Option<WeakWidgetRef>) {
        self.parent = parent;
    }

    pub(crate) fn set_console(&mut self, console: Option<Rc<Console>>) {
        for child in &self.children {
            child.borrow_mut().core_mut().set_console(console.clone());
        }
        self.console = console;
    }

    fn sync_focus(&mut self, focused: bool) {
        self.focused = focused;
        for (index, child) in self.children.iter().enumerate() {
            child
                .borrow_mut()
                .core_mut()
                .sync_focus(focused && index == self.focus_index);
        }
    }

    /// Move the origin and record the rectangle the widget must stay inside.
    pub fn place(&mut self, x: u16, y: u16, bounds: Option<Rect>) {
        self.area.x = x;
        self.area.y = y;
        self.bounds = bounds;
    }

    /// Set the size, clipped to the space left in the parent's rectangle.
    pub fn set_size(&mut self, width: u16, height: u16) {
        let (mut width, mut height) = (width, height);
        if let Some(bounds) = self.bounds {
            width = width.min(bounds.right().saturating_sub(self.area.x));
            height = height.min(bounds.bottom().saturating_sub(self.area.y));
        }
        self.area.width = width;
        self.area.height = height;
    }

    /// Partition `width` x `height` among the children by flex weight.
    pub fn layout_children(&self, width: u16, height: u16) {
        if self.children.is_empty() {
            return;
        }

        let weights: Vec<u16> = self
            .children
            .iter()
            .map(|child| child.borrow().core().flex)
            .collect();
        let length = match self.direction {
            Direction::Vertical => height,
            Direction::Horizontal => width,
        };
        let offsets = flex_offsets(&weights, length);

        for (index, child) in self.children.iter().enumerate() {
            let start = offsets[index];
            let extent = offsets[index + 1] - start;
            let (x, y, w, h) = match self.direction {
                Direction::Vertical => (self.area.x, self.area.y.saturating_add(start), width, extent),
                Direction::Horizontal => (self.area.x.saturating_add(start), self.area.y, extent, height),
            };

            let mut child = child.borrow_mut();
            child.core_mut().place(x, y, Some(self.area));
            child.resize(w, h);
        }
    }

    pub fn paint_children(&self) {
        for child in &self.children {
            child.borrow_mut().paint();
        }
    }

    /// Print spans at widget-local (x, y), clipped at the right edge.
    ///
    /// Does nothing when the position lies outside the widget or the widget is
    /// not attached to a console. Unstyled parts use the theme's default style.
    pub fn write_at(&self, x: u16, y: u16, spans: &[Span<'_>]) {
        if x >= self.area.width || y >= self.area.height {
            return;
        }
        let Some(console) = &self.console else {
            return;
        };

        let base = console.theme().default;
        let styled: Vec<Span<'_>> = spans
            .iter()
            .map(|span| Span::styled(span.content.as_ref(), base.patch(span.style)))
            .collect();
        console.screen().print_at(
            self.area.x + x,
            self.area.y + y,
            &styled,
            self.area.width - x,
        );
    }

    /// Blank the widget's rectangle in the default style.
    pub fn clear_viewport(&self) {
        let blank = " ".repeat(usize::from(self.area.width));
        for y in 0..self.area.height {
            self.write_at(0, y, &[Span::raw(blank.as_str())]);
        }
    }
}

/// Where a widget is attached.
#[derive(Clone)]
pub enum Host {
    Parent(WidgetRef),
    /// Root of a tree drawn on this console
    Console(Rc<Console>),
}

impl<W: Widget + 'static> From<&Rc<RefCell<W>>> for Host {
    fn from(widget: &Rc<RefCell<W>>) -> Self {
        Host::Parent(widget.clone())
    }
}

impl From<&Rc<Console>> for Host {
    fn from(console: &Rc<Console>) -> Self {
        Host::Console(Rc::clone(console))
    }
}

/// Attach `widget` under `host`.
///
/// With a parent host the widget is appended to the parent's children and
/// inherits its console. With a console host it becomes a root. Neither the
/// widget nor the parent may be borrowed during the call.
pub fn attach<W: Widget + 'static>(widget: &Rc<RefCell<W>>, host: impl Into<Host>) {
    let child: WidgetRef = widget.clone();
    attach_ref(&child, host.into());
}

/// [`attach`] for type-erased widgets.
pub fn attach_ref(child: &WidgetRef, host: Host) {
    match host {
        Host::Parent(parent) => {
            let mut parent_widget = parent.borrow_mut();
            let parent_core = parent_widget.core_mut();
            {
                let mut child_widget = child.borrow_mut();
                let core = child_widget.core_mut();
                core.set_parent(Some(Rc::downgrade(&parent)));
                core.set_console(parent_core.console.clone());
            }
            parent_core.children.push(Rc::clone(child));
            parent_core.sync_focus(parent_core.focused);
        }
        Host::Console(console) => {
            let mut child_widget = child.borrow_mut();
            let core = child_widget.core_mut();
            core.set_parent(None);
            core.set_console(Some(console));
            core.sync_focus(true);
        }
    }
}

/// Route a key through the tree rooted at `widget`.
///
/// Order: the widget's own key signal, then the focused child (recursively),
/// then the widget's built-in [`Widget::handle_key`].
pub fn handle_input(widget: WidgetRef, key: Key) -> LocalBoxFuture<'static, Result<EventFlow>> {
    async move {
        let signal = widget.borrow().core().key_signal(key);
        if let Some(signal) = signal {
            let flow = merge_flows(signal.emit(key).await)?;
            if flow.is_consumed() {
                return Ok(flow);
            }
        }

        let focused = widget.borrow().core().focused_child();
        if let Some(child) = focused {
            let flow = handle_input(child, key).await?;
            if flow.is_consumed() {
                return Ok(flow);
            }
        }

        let reaction = widget.borrow_mut().handle_key(key);
        reaction.resolve().await
    }
    .boxed_local()
}

/// Plain layout node without content of its own.
pub struct Container {
    core: WidgetCore,
}

impl Container {
    pub fn new(direction: Direction) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            core: WidgetCore::new(direction),
        }))
    }

    pub fn vertical() -> Rc<RefCell<Self>> {
        Self::new(Direction::Vertical)
    }

    pub fn horizontal() -> Rc<RefCell<Self>> {
        Self::new(Direction::Horizontal)
    }
}

impl Widget for Container {
    fn core(&self) -> &WidgetCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut WidgetCore {
        &mut self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::test_support::console;
    use ratatui::style::{Color, Style};
    use std::cell::Cell;

    fn child_of(parent: &Rc<RefCell<Container>>, flex: u16) -> Rc<RefCell<Container>> {
        let child = Container::vertical();
        child.borrow_mut().core_mut().set_flex(flex);
        attach(&child, parent);
        child
    }

    #[test]
    fn resize_partitions_by_flex_and_relayouts() {
        let root = Container::vertical();
        let big = child_of(&root, 2);
        let small = child_of(&root, 1);

        root.borrow_mut().resize(80, 24);
        assert_eq!(big.borrow().core().area(), Rect::new(0, 0, 80, 16));
        assert_eq!(small.borrow().core().area(), Rect::new(0, 16, 80, 8));

        root.borrow_mut().resize(40, 10);
        assert_eq!(big.borrow().core().height(), 6);
        assert_eq!(small.borrow().core().area(), Rect::new(0, 6, 40, 4));
    }

    #[test]
    fn nested_layout_uses_absolute_origins() {
        let root = Container::vertical();
        let top = child_of(&root, 1);
        let row = Container::horizontal();
        attach(&row, &root);
        let left = child_of(&row, 1);
        let right = child_of(&row, 3);

        root.borrow_mut().resize(40, 10);
        assert_eq!(top.borrow().core().area(), Rect::new(0, 0, 40, 5));
        assert_eq!(left.borrow().core().area(), Rect::new(0, 5, 10, 5));
        assert_eq!(right.borrow().core().area(), Rect::new(10, 5, 30, 5));
    }

    #[test]
    fn size_is_clipped_to_parent() {
        let root = Container::vertical();
        let child = child_of(&root, 1);
        root.borrow_mut().resize(20, 6);

        child.borrow_mut().resize(100, 100);
        assert_eq!(child.borrow().core().area(), Rect::new(0, 0, 20, 6));
    }

    #[test]
    fn focus_is_transitive() {
        let root = Container::horizontal();
        let a = Container::vertical();
        attach(&a, &root);
        let a1 = child_of(&a, 1);
        let a2 = child_of(&a, 1);
        let b = child_of(&root, 1);

        assert!(a1.borrow().core().has_focus());
        assert!(!a2.borrow().core().has_focus());
        assert!(!b.borrow().core().has_focus());

        root.borrow_mut().core_mut().focus_next();
        assert!(b.borrow().core().has_focus());
        // a still focuses a1, but a itself lost focus
        assert_eq!(a.borrow().core().focus_index(), 0);
        assert!(!a1.borrow().core().has_focus());

        root.borrow_mut().core_mut().focus_next();
        assert!(a1.borrow().core().has_focus());

        root.borrow_mut().core_mut().focus_prev();
        assert!(b.borrow().core().has_focus());
    }

    #[test]
    fn write_at_translates_and_clips() {
        let (console, term, _tx) = console(20, 5);
        let root = Container::vertical();
        attach(&root, &console);
        let child = child_of(&root, 1);
        let other = child_of(&root, 1);
        root.borrow_mut().resize(10, 4);
        let _ = other;

        let red = Style::default().fg(Color::Red);
        {
            let child = child.borrow();
            child.core().write_at(2, 1, &[Span::styled("abcdefghijkl", red)]);
            child.core().write_at(10, 0, &[Span::raw("out")]);
            child.core().write_at(0, 2, &[Span::raw("out")]);
        }
        console.flush().unwrap();

        assert_eq!(term.line(1), "  abcdefgh          ");
        assert_eq!(term.line(2), " ".repeat(20));
        assert_eq!(term.style_at(2, 1).fg, Some(Color::Red));
        assert_eq!(term.style_at(2, 1).bg, console.theme().default.bg);
    }

    #[tokio::test]
    async fn own_handlers_win_over_focused_child() {
        let root = Container::vertical();
        let child = child_of(&root, 1);
        let hits = Rc::new(Cell::new(0));

        let seen = Rc::clone(&hits);
        child
            .borrow_mut()
            .core_mut()
            .on('x')
            .connect(move |_| {
                seen.set(seen.get() + 1);
                async { Ok(EventFlow::Handled) }
            });

        let root_ref: WidgetRef = root.clone();
        let flow = handle_input(root_ref.clone(), Key::Char('x')).await.unwrap();
        assert_eq!(flow, EventFlow::Handled);
        assert_eq!(hits.get(), 1);

        root.borrow_mut()
            .core_mut()
            .on('x')
            .connect(|_| async { Ok(EventFlow::Handled) });
        handle_input(root_ref.clone(), Key::Char('x')).await.unwrap();
        assert_eq!(hits.get(), 1);

        let flow = handle_input(root_ref, Key::Char('y')).await.unwrap();
        assert_eq!(flow, EventFlow::Unhandled);
    }

    #[tokio::test]
    async fn unhandled_results_fall_through_and_exit_propagates() {
        let root = Container::vertical();
        let child = child_of(&root, 1);

        root.borrow_mut()
            .core_mut()
            .on(Key::Esc)
            .connect(|_| async { Ok(EventFlow::Unhandled) });
        child
            .borrow_mut()
            .core_mut()
            .on(Key::Esc)
            .connect(|_| async { Ok(EventFlow::Exit) });

        let flow = handle_input(root.clone(), Key::Esc).await.unwrap();
        assert_eq!(flow, EventFlow::Exit);
    }

    #[tokio::test]
    async fn handler_errors_propagate() {
        let root = Container::vertical();
        root.borrow_mut()
            .core_mut()
            .on('r')
            .connect(|_| async { Err(crate::error::GhdError::provider("offline")) });

        let err = handle_input(root.clone(), Key::Char('r')).await.unwrap_err();
        assert_eq!(err.to_string(), "offline");
    }
}
