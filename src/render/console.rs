//! Shared drawing and input context for one widget tree.
//!
//! The console bundles the terminal handle, the frame's [`ScreenBuffer`], the
//! active [`ColorTheme`], the stream of input events and the fault channel. The
//! root widget receives it on attach and every descendant shares it.

use crate::error::{GhdError, Result};
use crate::input::{InputEvent, Key};
use crate::render::screen::ScreenBuffer;
use crate::render::terminal::Terminal;
use crate::render::theme::{ColorTheme, ThemeName};
use std::cell::{Cell, RefCell, RefMut};
use std::rc::Rc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::{Mutex, Notify};

/// Sender half used by timers and detached tasks to report failures to the loop.
pub type FaultSender = UnboundedSender<GhdError>;

pub struct Console {
    terminal: RefCell<Box<dyn Terminal>>,
    screen: RefCell<ScreenBuffer>,
    theme: ColorTheme,
    // Awaited by the loop and by confirm popovers; a RefCell borrow would be
    // held across the await.
    input: Mutex<UnboundedReceiver<InputEvent>>,
    resized: Cell<bool>,
    redraw: Notify,
    fault_tx: FaultSender,
    faults: Mutex<UnboundedReceiver<GhdError>>,
}

impl Console {
    pub fn new(
        terminal: Box<dyn Terminal>,
        input: UnboundedReceiver<InputEvent>,
        theme: ThemeName,
    ) -> Rc<Self> {
        let theme = ColorTheme::for_terminal(theme, terminal.supports_color());
        Self::with_theme(terminal, input, theme)
    }

    pub fn with_theme(
        terminal: Box<dyn Terminal>,
        input: UnboundedReceiver<InputEvent>,
        theme: ColorTheme,
    ) -> Rc<Self> {
        let (fault_tx, faults) = mpsc::unbounded_channel();
        Rc::new(Self {
            terminal: RefCell::new(terminal),
            screen: RefCell::new(ScreenBuffer::new()),
            theme,
            input: Mutex::new(input),
            // The first frame always runs layout.
            resized: Cell::new(true),
            redraw: Notify::new(),
            fault_tx,
            faults: Mutex::new(faults),
        })
    }

    pub fn theme(&self) -> &ColorTheme {
        &self.theme
    }

    pub fn screen(&self) -> RefMut<'_, ScreenBuffer> {
        self.screen.borrow_mut()
    }

    pub fn size(&self) -> Result<(u16, u16)> {
        self.terminal.borrow().size()
    }

    pub fn initialize(&self) -> Result<()> {
        self.terminal.borrow_mut().initialize()
    }

    pub fn cleanup(&self) -> Result<()> {
        self.terminal.borrow_mut().cleanup()
    }

    /// Write everything buffered so far to the terminal in one go.
    pub fn flush(&self) -> Result<()> {
        let ops = self.screen.borrow_mut().take();
        if ops.is_empty() {
            return Ok(());
        }
        self.terminal.borrow_mut().write(&ops)
    }

    /// Next input event, or `None` once the input thread has gone away.
    pub async fn next_input(&self) -> Option<InputEvent> {
        self.input.lock().await.recv().await
    }

    /// Wait for a key press. Resize events seen meanwhile mark the layout dirty.
    pub async fn next_key(&self) -> Result<Key> {
        loop {
            match self.next_input().await {
                Some(InputEvent::Key(key)) => return Ok(key),
                Some(InputEvent::Resize { .. }) => self.mark_resized(),
                None => return Err(GhdError::InputClosed),
            }
        }
    }

    pub fn mark_resized(&self) {
        self.resized.set(true);
    }

    /// Returns and clears the dirty-layout flag.
    pub fn take_resized(&self) -> bool {
        self.resized.replace(false)
    }

    /// Ask the loop to repaint without waiting for input.
    pub fn request_redraw(&self) {
        self.redraw.notify_one();
    }

    pub async fn redraw_requested(&self) {
        self.redraw.notified().await;
    }

    pub fn fault_sender(&self) -> FaultSender {
        self.fault_tx.clone()
    }

    /// Report a failure from outside the dispatch path.
    pub fn report(&self, error: GhdError) {
        // The console owns the receiver, so this cannot fail while `self` lives.
        let _ = self.fault_tx.send(error);
    }

    pub async fn next_fault(&self) -> Option<GhdError> {
        self.faults.lock().await.recv().await
    }
}
