//! Blocking input collection.
//!
//! Reading the terminal blocks, so it runs on a dedicated thread that forwards
//! decoded [`InputEvent`]s over a tokio channel. The channel is the only point
//! where data crosses threads; widgets are only touched on the UI loop.

use crate::error::Result;
use crate::input::key::Key;
use ratatui::crossterm::event::{self, Event};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Events delivered to the application loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key(Key),
    Resize { width: u16, height: u16 },
}

/// Polls crossterm and translates raw events.
///
/// Consecutive resize events reporting the same size are collapsed.
#[derive(Debug, Default)]
pub struct InputService {
    last_size: Option<(u16, u16)>,
}

impl InputService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait up to `timeout` for the next meaningful event.
    pub fn poll_event(&mut self, timeout: Duration) -> Result<Option<InputEvent>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        let raw = event::read()?;
        Ok(self.process_event(raw))
    }

    pub fn process_event(&mut self, event: Event) -> Option<InputEvent> {
        match event {
            Event::Key(key_event) => Key::from_event(&key_event).map(InputEvent::Key),
            Event::Resize(width, height) => {
                if self.last_size == Some((width, height)) {
                    return None;
                }
                self.last_size = Some((width, height));
                Some(InputEvent::Resize { width, height })
            }
            _ => None,
        }
    }
}

/// Spawn a blocking thread that polls for terminal events and forwards them to the UI loop.
pub fn spawn_input_thread(
    tx: UnboundedSender<InputEvent>,
    shutdown: Arc<AtomicBool>,
    poll_interval: Duration,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut service = InputService::new();
        while !shutdown.load(Ordering::SeqCst) {
            match service.poll_event(poll_interval) {
                Ok(Some(event)) => {
                    if tx.send(event).is_err() {
                        log::debug!("input receiver dropped, stopping input thread");
                        return;
                    }
                }
                Ok(None) => continue,
                Err(err) => {
                    log::error!("input thread error: {}", err);
                    break;
                }
            }
        }
    })
}

/// Owns the input thread and stops it on drop.
pub struct InputThread {
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl InputThread {
    /// Start polling the terminal, returning the thread guard and the event stream.
    pub fn spawn(poll_interval: Duration) -> (Self, UnboundedReceiver<InputEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        let handle = spawn_input_thread(tx, Arc::clone(&shutdown), poll_interval);
        (
            Self {
                shutdown,
                handle: Some(handle),
            },
            rx,
        )
    }

    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("input thread panicked");
            }
        }
    }
}

impl Drop for InputThread {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn keys_are_translated() {
        let mut service = InputService::new();
        assert_eq!(
            service.process_event(key(KeyCode::Char('j'))),
            Some(InputEvent::Key(Key::Char('j')))
        );
        assert_eq!(
            service.process_event(key(KeyCode::Enter)),
            Some(InputEvent::Key(Key::Enter))
        );
    }

    #[test]
    fn duplicate_resizes_are_collapsed() {
        let mut service = InputService::new();
        assert_eq!(
            service.process_event(Event::Resize(80, 24)),
            Some(InputEvent::Resize {
                width: 80,
                height: 24
            })
        );
        assert_eq!(service.process_event(Event::Resize(80, 24)), None);
        assert_eq!(
            service.process_event(Event::Resize(40, 10)),
            Some(InputEvent::Resize {
                width: 40,
                height: 10
            })
        );
    }

    #[test]
    fn mouse_events_are_ignored() {
        let mut service = InputService::new();
        let mouse = Event::Mouse(MouseEvent {
            kind: MouseEventKind::ScrollDown,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(service.process_event(mouse), None);
    }
}
