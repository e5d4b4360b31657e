//! Composable widgets.
//!
//! Every widget embeds a [`WidgetCore`] and implements [`Widget`]. Trees are
//! built by creating a widget detached and then calling [`attach`] with its
//! parent (or with the [`Console`](crate::render::Console) for the root).

pub mod core;
pub mod layout;
pub mod messagebox;
pub mod multiview;
pub mod popover;
pub mod statusbar;
pub mod table;
pub mod util;

pub use self::core::{
    attach, attach_ref, handle_input, Container, Host, KeyReaction, KeySignal, WeakWidgetRef,
    Widget, WidgetCore, WidgetRef,
};
pub use layout::{flex_extents, flex_offsets, Direction};
pub use messagebox::MessageBox;
pub use multiview::MultiView;
pub use popover::{popover, popover_confirm, popover_error, popover_info, PopoverKind};
pub use statusbar::StatusBar;
pub use table::{Column, SelectionChanged, Table};
pub use util::{breadcrumbs, bullet_join, clip_line, draw_border_double, truncate};
