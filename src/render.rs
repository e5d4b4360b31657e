//! Rendering subsystem.
//!
//! Widgets paint into the [`ScreenBuffer`] owned by a [`Console`]; the console
//! flushes it through a [`Terminal`] backend once per frame.

pub mod console;
pub mod screen;
pub mod terminal;
pub mod theme;
pub mod virtual_terminal;

pub use console::{Console, FaultSender};
pub use screen::{ScreenBuffer, ScreenOp};
pub use terminal::{CrosstermTerminal, Terminal};
pub use theme::{ColorTheme, ThemeName};
pub use virtual_terminal::VirtualTerminal;

pub use ratatui::style::{Color, Modifier, Style};
