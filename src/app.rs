//! Application orchestration layer
//!
//! Owns nothing but the console and the root widget: each iteration renders the
//! tree, then waits for whichever comes first of a key press, a resize, a redraw
//! request or a reported fault.

use crate::error::{GhdError, Result};
use crate::input::{InputEvent, Key};
use crate::render::Console;
use crate::signal::EventFlow;
use crate::widget::{attach_ref, handle_input, popover_confirm, Host, PopoverKind, WidgetRef};
use std::rc::Rc;

pub struct Application {
    console: Rc<Console>,
    root: WidgetRef,
}

impl Application {
    /// Create the application and make `root` the console's root widget.
    pub fn new(console: Rc<Console>, root: WidgetRef) -> Self {
        attach_ref(&root, Host::Console(Rc::clone(&console)));
        Self { console, root }
    }

    pub fn console(&self) -> &Rc<Console> {
        &self.console
    }

    pub fn root(&self) -> &WidgetRef {
        &self.root
    }

    /// Run until a handler answers [`EventFlow::Exit`] or input closes.
    ///
    /// Wiring errors (see [`GhdError::is_wiring_error`]) end the loop with an
    /// error; other failures are acknowledged and the loop continues. The
    /// terminal is restored even when the loop fails.
    pub async fn run(&mut self) -> Result<()> {
        self.console.initialize()?;
        let outcome = self.event_loop().await;
        let cleanup = self.console.cleanup();
        outcome.and(cleanup)
    }

    async fn event_loop(&self) -> Result<()> {
        loop {
            self.render()?;

            let flow = tokio::select! {
                biased;

                Some(fault) = self.console.next_fault() => {
                    if fault.is_wiring_error() {
                        log::error!("background task hit a wiring error: {fault}");
                        return Err(fault);
                    }
                    log::warn!("background task failed: {fault}");
                    self.acknowledge(&fault).await?
                }
                () = self.console.redraw_requested() => EventFlow::Handled,
                event = self.console.next_input() => match event {
                    Some(InputEvent::Key(key)) => self.dispatch(key).await?,
                    Some(InputEvent::Resize { width, height }) => {
                        log::debug!("terminal resized to {width}x{height}");
                        self.console.mark_resized();
                        EventFlow::Handled
                    }
                    None => {
                        log::info!("input closed, leaving event loop");
                        EventFlow::Exit
                    }
                },
            };

            if flow == EventFlow::Exit {
                return Ok(());
            }
        }
    }

    /// Lay out when the size changed, paint the tree and flush the frame.
    fn render(&self) -> Result<()> {
        if self.console.take_resized() {
            let (width, height) = self.console.size()?;
            self.root.borrow_mut().resize(width, height);
        }
        self.root.borrow_mut().paint();
        self.console.flush()
    }

    async fn dispatch(&self, key: Key) -> Result<EventFlow> {
        match handle_input(Rc::clone(&self.root), key).await {
            Ok(flow) => Ok(flow),
            Err(err) if err.is_wiring_error() => {
                log::error!("handler for {key} hit a wiring error: {err}");
                Err(err)
            }
            Err(err) => {
                log::warn!("handler for {key} failed: {err}");
                self.acknowledge(&err).await
            }
        }
    }

    // Shows the error until a key is pressed. Closed input ends the loop.
    async fn acknowledge(&self, error: &GhdError) -> Result<EventFlow> {
        let text = format!("{error}\n\n(press any key to continue)");
        match popover_confirm(&self.root, &text, PopoverKind::Error).await {
            Ok(_) => Ok(EventFlow::Handled),
            Err(GhdError::InputClosed) => Ok(EventFlow::Exit),
            Err(err) => Err(err),
        }
    }
}
