//! Small text and drawing helpers shared by widgets.

use crate::render::screen::clip_to_width;
use crate::widget::core::WidgetCore;
use ratatui::text::{Line, Span};

pub fn bullet_join<S: AsRef<str>>(parts: &[S]) -> String {
    join_with(parts, " \u{2022} ")
}

/// Breadcrumb trail; every part is preceded by the separator.
pub fn breadcrumbs<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(|part| format!(" \u{203a} {}", part.as_ref()))
        .collect()
}

fn join_with<S: AsRef<str>>(parts: &[S], separator: &str) -> String {
    parts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(separator)
}

/// Longest prefix of `text` fitting in `max_width` columns.
pub fn truncate(text: &str, max_width: usize) -> String {
    clip_to_width(text, max_width).0.to_string()
}

/// Spans of `line` cut to `max_width` columns, with the line style folded in.
pub fn clip_line(line: &Line<'_>, max_width: usize) -> Vec<Span<'static>> {
    let mut remaining = max_width;
    let mut spans = Vec::with_capacity(line.spans.len());
    for span in &line.spans {
        if remaining == 0 {
            break;
        }
        let (text, width) = clip_to_width(&span.content, remaining);
        spans.push(Span::styled(text.to_string(), line.style.patch(span.style)));
        remaining -= width;
    }
    spans
}

/// Frame the widget's rectangle with double box-drawing lines.
pub fn draw_border_double(core: &WidgetCore) {
    let (width, height) = (core.width(), core.height());
    if width < 2 || height < 2 {
        return;
    }

    let style = core.theme().border;
    let inner = "\u{2550}".repeat(usize::from(width - 2));
    core.write_at(
        0,
        0,
        &[Span::styled(format!("\u{2554}{inner}\u{2557}"), style)],
    );
    core.write_at(
        0,
        height - 1,
        &[Span::styled(format!("\u{255a}{inner}\u{255d}"), style)],
    );
    for y in 1..height - 1 {
        core.write_at(0, y, &[Span::styled("\u{2551}", style)]);
        core.write_at(width - 1, y, &[Span::styled("\u{2551}", style)]);
    }
}
