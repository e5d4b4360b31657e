//! Input subsystem: key decoding and the blocking reader thread.

pub mod key;
pub mod service;

// Modules outside this crate should prefer importing from `crate::input`.
pub use key::Key;
pub use service::{spawn_input_thread, InputEvent, InputService, InputThread};
