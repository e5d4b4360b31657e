//! Virtualized, scrollable multi-column list.
//!
//! Only the rows inside the visible window are rendered. Columns wider than the
//! widget can be scrolled horizontally with a left-column cursor.

use crate::error::Result;
use crate::input::Key;
use crate::render::screen::clip_to_width;
use crate::signal::{merge_results, AsyncSignal};
use crate::widget::core::{KeyReaction, Widget, WidgetCore};
use crate::widget::util::truncate;
use futures::future::FutureExt;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use std::cell::RefCell;
use std::rc::Rc;

/// Width handed to cell renderers when measuring columns.
const MEASURE_WIDTH: usize = u16::MAX as usize;

type CellRenderer<R> = Box<dyn Fn(&R, usize) -> Line<'static>>;

/// One table column: a title and a renderer producing at most `max_width` columns.
pub struct Column<R> {
    title: String,
    render: CellRenderer<R>,
}

impl<R> Column<R> {
    pub fn new(
        title: impl Into<String>,
        render: impl Fn(&R, usize) -> Line<'static> + 'static,
    ) -> Self {
        Self {
            title: title.into(),
            render: Box::new(render),
        }
    }

    /// Unstyled column from a text getter; the text is truncated to fit.
    pub fn text(title: impl Into<String>, getter: impl Fn(&R) -> String + 'static) -> Self {
        Self::new(title, move |row, max_width| {
            Line::raw(truncate(&getter(row), max_width))
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn render(&self, row: &R, max_width: usize) -> Line<'static> {
        (self.render)(row, max_width)
    }
}

/// Pending "selection changed" notification.
///
/// Produced while the table is borrowed; await [`notify`](Self::notify) after
/// the borrow is gone.
#[must_use = "selection_changed only fires when the notification is awaited"]
pub struct SelectionChanged {
    signal: AsyncSignal<usize, Result<()>>,
    index: usize,
}

impl SelectionChanged {
    pub fn index(&self) -> usize {
        self.index
    }

    pub async fn notify(self) -> Result<()> {
        merge_results(self.signal.emit(self.index).await)
    }
}

pub struct Table<R> {
    core: WidgetCore,
    columns: Vec<Column<R>>,
    rows: Vec<R>,
    widths: Vec<usize>,
    selected: usize,
    view_offset: usize,
    left_column: usize,
    column_padding: usize,
    selection_changed: AsyncSignal<usize, Result<()>>,
}

impl<R: 'static> Table<R> {
    pub fn new(columns: Vec<Column<R>>) -> Rc<RefCell<Self>> {
        let mut table = Self {
            core: WidgetCore::vertical(),
            columns,
            rows: Vec::new(),
            widths: Vec::new(),
            selected: 0,
            view_offset: 0,
            left_column: 0,
            column_padding: 2,
            selection_changed: AsyncSignal::new(),
        };
        table.calc_widths();
        Rc::new(RefCell::new(table))
    }

    /// Raised with the new index whenever a selection notification is awaited.
    pub fn selection_changed(&self) -> &AsyncSignal<usize, Result<()>> {
        &self.selection_changed
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Replace the row set, recomputing column widths and re-clamping the selection.
    pub fn set_rows(&mut self, rows: Vec<R>) {
        self.rows = rows;
        self.calc_widths();
        self.selected = self.selected.min(self.rows.len().saturating_sub(1));
        self.scroll_to_selection();
    }

    pub fn column_widths(&self) -> &[usize] {
        &self.widths
    }

    pub fn column_padding(&self) -> usize {
        self.column_padding
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_row(&self) -> Option<&R> {
        self.rows.get(self.selected)
    }

    /// First row inside the visible window.
    pub fn view_offset(&self) -> usize {
        self.view_offset
    }

    pub fn left_column(&self) -> usize {
        self.left_column
    }

    /// Rows that fit below the header.
    pub fn visible_rows(&self) -> usize {
        usize::from(self.core.height().saturating_sub(1))
    }

    pub fn set_selected_index(&mut self, index: usize) -> SelectionChanged {
        self.selected = index.min(self.rows.len().saturating_sub(1));
        self.scroll_to_selection();
        SelectionChanged {
            signal: self.selection_changed.clone(),
            index: self.selected,
        }
    }

    /// Select `index` and await the change notification.
    pub async fn select(this: &Rc<RefCell<Self>>, index: usize) -> Result<()> {
        let changed = this.borrow_mut().set_selected_index(index);
        changed.notify().await
    }

    fn calc_widths(&mut self) {
        self.widths = self
            .columns
            .iter()
            .map(|column| {
                self.rows
                    .iter()
                    .map(|row| column.render(row, MEASURE_WIDTH).width())
                    .fold(Line::raw(column.title()).width(), usize::max)
            })
            .collect();
    }

    fn scroll_to_selection(&mut self) {
        let visible = self.visible_rows();
        if visible == 0 {
            self.view_offset = self.selected;
            return;
        }

        if self.selected < self.view_offset {
            self.view_offset = self.selected;
        } else if self.selected >= self.view_offset + visible {
            self.view_offset = self.selected + 1 - visible;
        }
        // Don't leave blank rows at the bottom when the window could show more.
        self.view_offset = self
            .view_offset
            .min(self.rows.len().saturating_sub(visible));
    }

    fn is_capped(&self) -> bool {
        let shown = &self.widths[self.left_column.min(self.widths.len())..];
        let needed = self.column_padding
            + shown.len() * self.column_padding
            + shown.iter().sum::<usize>();
        needed > usize::from(self.core.width())
    }

    /// Widths of the columns drawn from `left_column` on; the last may be cut.
    fn column_dimensions(&self) -> Vec<usize> {
        let width = usize::from(self.core.width());
        let padding = self.column_padding;
        let mut dims = Vec::new();
        let mut x = padding;

        for &column_width in self.widths.iter().skip(self.left_column) {
            let next_x = x + padding + column_width;
            if next_x + padding >= width {
                dims.push(column_width.min(width.saturating_sub(x + padding)));
                break;
            }
            dims.push(column_width);
            x = next_x;
        }
        dims
    }

    fn paint_row(&self, y: u16, style: Style, cells: Vec<Line<'static>>, dims: &[usize]) {
        let mut spans = vec![Span::styled(" ".repeat(self.column_padding), style)];
        let mut used = self.column_padding;

        for (&width, line) in dims.iter().zip(cells) {
            let line_style = style.patch(line.style);
            let mut remaining = width;
            for span in line.spans {
                if remaining == 0 {
                    break;
                }
                let (text, text_width) = clip_to_width(&span.content, remaining);
                spans.push(Span::styled(text.to_string(), line_style.patch(span.style)));
                remaining -= text_width;
            }
            spans.push(Span::styled(
                " ".repeat(remaining + self.column_padding),
                style,
            ));
            used += width + self.column_padding;
        }

        let total = usize::from(self.core.width());
        if used < total {
            spans.push(Span::styled(" ".repeat(total - used), style));
        }
        self.core.write_at(0, y, &spans);
    }
}

impl<R: 'static> Widget for Table<R> {
    fn core(&self) -> &WidgetCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut WidgetCore {
        &mut self.core
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.core.set_size(width, height);
        self.scroll_to_selection();
    }

    fn paint(&mut self) {
        self.core.clear_viewport();

        let theme = self.core.theme();
        let dims = self.column_dimensions();
        let first = self.view_offset.min(self.rows.len());
        let last = (first + self.visible_rows()).min(self.rows.len());

        let titles = self
            .columns
            .iter()
            .skip(self.left_column)
            .map(|column| Line::raw(column.title().to_string()))
            .collect();
        self.paint_row(0, theme.table_header, titles, &dims);

        let selected_style = if self.core.has_focus() {
            theme.table_row_selected_focus
        } else {
            theme.table_row_selected
        };
        for (index, row) in self.rows[first..last].iter().enumerate() {
            let row_index = first + index;
            let style = if row_index == self.selected {
                selected_style
            } else {
                theme.table_row
            };
            let cells = self
                .columns
                .iter()
                .skip(self.left_column)
                .zip(&dims)
                .map(|(column, &width)| column.render(row, width))
                .collect();
            self.paint_row(index as u16 + 1, style, cells, &dims);
        }

        if first > 0 {
            self.core.write_at(0, 1, &[Span::styled("↑", theme.default)]);
        }
        if last < self.rows.len() {
            let bottom = self.core.height().saturating_sub(1);
            self.core.write_at(0, bottom, &[Span::styled("↓", theme.default)]);
        }
        if self.left_column > 0 {
            self.core.write_at(0, 0, &[Span::styled("←", theme.table_header)]);
        }
        if self.is_capped() {
            let right = self.core.width().saturating_sub(1);
            self.core.write_at(right, 0, &[Span::styled("→", theme.table_header)]);
        }
    }

    fn handle_key(&mut self, key: Key) -> KeyReaction {
        let page = self.visible_rows().max(1);
        let target = match key {
            Key::Down | Key::Char('j') => self.selected + 1,
            Key::Up | Key::Char('k') => self.selected.saturating_sub(1),
            Key::PageDown | Key::Char('J') => self.selected + page,
            Key::PageUp | Key::Char('K') => self.selected.saturating_sub(page),
            Key::Home => 0,
            Key::End => self.rows.len().saturating_sub(1),
            Key::Left | Key::Char('h') => {
                if self.left_column == 0 {
                    return KeyReaction::Unhandled;
                }
                self.left_column -= 1;
                return KeyReaction::Handled;
            }
            Key::Right | Key::Char('l') => {
                if !self.is_capped() || self.left_column + 1 >= self.columns.len() {
                    return KeyReaction::Unhandled;
                }
                self.left_column += 1;
                return KeyReaction::Handled;
            }
            _ => return KeyReaction::Unhandled,
        };

        let changed = self.set_selected_index(target);
        KeyReaction::Deferred(changed.notify().boxed_local())
    }
}
