//! Cooperative periodic callbacks.
//!
//! A [`Timer`] fires its callback immediately on [`start`](Timer::start) and then
//! once per interval until stopped. Callbacks run as local tasks on the current
//! `LocalSet`, so they may touch widgets but must not hold borrows across awaits.
//! Failures are forwarded to a fault channel when one is set, and logged otherwise.

use crate::error::Result;
use crate::render::FaultSender;
use futures::future::{FutureExt, LocalBoxFuture};
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

type Callback = dyn Fn() -> LocalBoxFuture<'static, Result<()>>;

struct TimerState {
    interval: Duration,
    callback: Box<Callback>,
    running: Cell<bool>,
    schedule: RefCell<Option<JoinHandle<()>>>,
    faults: RefCell<Option<FaultSender>>,
}

impl TimerState {
    fn fire(&self) {
        let pending = (self.callback)();
        let faults = self.faults.borrow().clone();
        tokio::task::spawn_local(async move {
            let Err(err) = pending.await else {
                return;
            };
            let err = match faults {
                Some(faults) => match faults.send(err) {
                    Ok(()) => return,
                    Err(unsent) => unsent.0,
                },
                None => err,
            };
            log::error!("timer callback failed: {err}");
        });
    }

    fn cancel_schedule(&self) {
        if let Some(handle) = self.schedule.borrow_mut().take() {
            handle.abort();
        }
    }
}

impl Drop for TimerState {
    fn drop(&mut self) {
        self.cancel_schedule();
    }
}

/// Handle to a periodic callback. Clones control the same timer.
#[derive(Clone)]
pub struct Timer {
    state: Rc<TimerState>,
}

impl Timer {
    pub fn new<F, Fut>(interval: Duration, callback: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<()>> + 'static,
    {
        Self {
            state: Rc::new(TimerState {
                interval,
                callback: Box::new(move || callback().boxed_local()),
                running: Cell::new(false),
                schedule: RefCell::new(None),
                faults: RefCell::new(None),
            }),
        }
    }

    pub fn interval(&self) -> Duration {
        self.state.interval
    }

    pub fn is_running(&self) -> bool {
        self.state.running.get()
    }

    /// Send callback errors to `faults` instead of only logging them.
    pub fn report_errors_to(&self, faults: FaultSender) {
        *self.state.faults.borrow_mut() = Some(faults);
    }

    /// Fire now and then every interval. Does nothing if already running.
    ///
    /// Must be called from within a `LocalSet`.
    pub fn start(&self) {
        if self.state.running.replace(true) {
            return;
        }
        log::debug!("timer started, interval {:?}", self.state.interval);

        self.state.fire();

        let interval = self.state.interval;
        let first = Instant::now() + interval;
        let state = Rc::downgrade(&self.state);
        let handle = tokio::task::spawn_local(async move {
            let mut ticks = interval_at(first, interval);
            // A stalled loop gets one late tick, not a burst of catch-up calls
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let Some(state) = state.upgrade() else {
                    break;
                };
                if !state.running.get() {
                    break;
                }
                state.fire();
            }
        });
        *self.state.schedule.borrow_mut() = Some(handle);
    }

    /// Cancel the pending reschedule. Callbacks already running finish normally.
    pub fn stop(&self) {
        if self.state.running.replace(false) {
            log::debug!("timer stopped");
        }
        self.state.cancel_schedule();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GhdError;
    use tokio::sync::mpsc;
    use tokio::task::LocalSet;
    use tokio::time::sleep;

    const TICK: Duration = Duration::from_millis(100);

    fn counting() -> (Timer, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let timer = Timer::new(TICK, move || {
            counter.set(counter.get() + 1);
            async { Ok(()) }
        });
        (timer, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn fires_immediately_then_every_interval() {
        LocalSet::new()
            .run_until(async {
                let (timer, calls) = counting();
                timer.start();
                assert_eq!(calls.get(), 1);

                sleep(TICK * 9 / 2).await;
                timer.stop();
                assert_eq!(calls.get(), 5);
                assert!(!timer.is_running());

                sleep(TICK * 5).await;
                assert_eq!(calls.get(), 5);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn start_is_idempotent_and_restartable() {
        LocalSet::new()
            .run_until(async {
                let (timer, calls) = counting();
                timer.start();
                timer.start();
                assert_eq!(calls.get(), 1);
                assert!(timer.is_running());

                timer.stop();
                timer.start();
                assert_eq!(calls.get(), 2);

                sleep(TICK * 3 / 2).await;
                assert_eq!(calls.get(), 3);
                timer.stop();
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn missed_ticks_fire_once() {
        LocalSet::new()
            .run_until(async {
                let (timer, calls) = counting();
                timer.start();
                assert_eq!(calls.get(), 1);

                // Ten intervals pass without the schedule getting polled
                tokio::time::advance(TICK * 10).await;
                for _ in 0..5 {
                    tokio::task::yield_now().await;
                }
                assert_eq!(calls.get(), 2);

                // The cadence restarts from the late tick
                sleep(TICK * 3 / 2).await;
                assert_eq!(calls.get(), 3);
                timer.stop();
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_last_handle_cancels() {
        LocalSet::new()
            .run_until(async {
                let (timer, calls) = counting();
                timer.start();
                drop(timer);

                sleep(TICK * 3).await;
                assert_eq!(calls.get(), 1);
            })
            .await;
    }

    #[tokio::test]
    async fn errors_go_to_the_fault_channel() {
        LocalSet::new()
            .run_until(async {
                let (tx, mut rx) = mpsc::unbounded_channel();
                let timer = Timer::new(Duration::from_secs(60), || async {
                    Err(GhdError::provider("rate limited"))
                });
                timer.report_errors_to(tx);
                timer.start();

                let fault = rx.recv().await.unwrap();
                assert_eq!(fault.to_string(), "rate limited");
                timer.stop();
            })
            .await;
    }
}
