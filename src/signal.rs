//! Typed publish/subscribe signals.
//!
//! [`Signal`] runs its handlers synchronously in connection order. [`AsyncSignal`]
//! starts every handler future at emission time and awaits them concurrently,
//! collecting results in completion order; callers must not rely on any ordering
//! among async handlers.
//!
//! Handlers can hold their target weakly ([`Signal::connect_weak`],
//! [`AsyncSignal::connect_weak`]). Once the target is dropped the handler becomes
//! inert and is pruned on the next emission. For explicit lifetimes use
//! [`Subscription`], which disconnects when dropped.

use crate::error::{Result, SignalError};
use futures::future::{FutureExt, LocalBoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};

/// Identifies one registration on one signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

/// What a key handler did with the event.
///
/// Ordered by strength so results from several handlers fold with `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventFlow {
    /// Not consumed; dispatch continues
    Unhandled,
    /// Consumed; dispatch stops here
    Handled,
    /// Consumed, and the application loop should terminate
    Exit,
}

impl EventFlow {
    pub fn is_consumed(self) -> bool {
        self != EventFlow::Unhandled
    }
}

/// Fold handler results: the first error wins, otherwise the strongest flow.
pub fn merge_flows(results: impl IntoIterator<Item = Result<EventFlow>>) -> Result<EventFlow> {
    let mut flow = EventFlow::Unhandled;
    for result in results {
        flow = flow.max(result?);
    }
    Ok(flow)
}

/// Fold unit handler results, returning the first error.
pub fn merge_results(results: impl IntoIterator<Item = Result<()>>) -> Result<()> {
    for result in results {
        result?;
    }
    Ok(())
}

struct Registry<H: ?Sized> {
    next_id: u64,
    slots: Vec<(HandlerId, Rc<H>)>,
}

impl<H: ?Sized> Registry<H> {
    fn new() -> Self {
        Self {
            next_id: 0,
            slots: Vec::new(),
        }
    }

    fn insert(&mut self, handler: Rc<H>) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.slots.push((id, handler));
        id
    }

    fn remove(&mut self, id: HandlerId) -> std::result::Result<(), SignalError> {
        let before = self.slots.len();
        self.slots.retain(|(slot, _)| *slot != id);
        if self.slots.len() == before {
            Err(SignalError::NotConnected(id))
        } else {
            Ok(())
        }
    }

    // Handlers may connect or disconnect while an emission is running, so
    // emission always works on a copy.
    fn snapshot(&self) -> Vec<(HandlerId, Rc<H>)> {
        self.slots
            .iter()
            .map(|(id, handler)| (*id, Rc::clone(handler)))
            .collect()
    }

    fn prune(&mut self, dead: &[HandlerId]) {
        self.slots.retain(|(id, _)| !dead.contains(id));
    }
}

/// RAII registration guard. Dropping it disconnects the handler.
#[must_use = "dropping a Subscription disconnects its handler immediately"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new(detach: impl FnOnce() + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// Keep the handler connected for the lifetime of the signal.
    pub fn forget(mut self) {
        self.detach = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.detach.is_some())
            .finish()
    }
}

fn scoped<H: ?Sized + 'static>(registry: &Rc<RefCell<Registry<H>>>, id: HandlerId) -> Subscription {
    let registry: Weak<RefCell<Registry<H>>> = Rc::downgrade(registry);
    Subscription::new(move || {
        if let Some(registry) = registry.upgrade() {
            // Already disconnected explicitly is fine.
            let _ = registry.borrow_mut().remove(id);
        }
    })
}

type SyncHandler<A, R> = dyn Fn(A) -> Option<R>;

/// Synchronous signal: handlers run in connection order.
pub struct Signal<A, R = ()> {
    registry: Rc<RefCell<Registry<SyncHandler<A, R>>>>,
}

impl<A: Clone + 'static, R: 'static> Signal<A, R> {
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry::new())),
        }
    }

    /// Register a handler that lives as long as the signal.
    pub fn connect(&self, handler: impl Fn(A) -> R + 'static) -> HandlerId {
        self.insert(Rc::new(move |args: A| Some(handler(args))))
    }

    /// Register a handler bound to `target` without keeping it alive.
    pub fn connect_weak<T: ?Sized + 'static>(
        &self,
        target: &Rc<T>,
        method: impl Fn(&T, A) -> R + 'static,
    ) -> HandlerId {
        let target = Rc::downgrade(target);
        self.insert(Rc::new(move |args: A| {
            target.upgrade().map(|target| method(&*target, args))
        }))
    }

    /// Register a handler that stays connected while the returned guard lives.
    pub fn subscribe(&self, handler: impl Fn(A) -> R + 'static) -> Subscription {
        let id = self.connect(handler);
        scoped(&self.registry, id)
    }

    pub fn disconnect(&self, id: HandlerId) -> Result<()> {
        Ok(self.registry.borrow_mut().remove(id)?)
    }

    /// Number of registrations, including weak ones not yet pruned.
    pub fn handler_count(&self) -> usize {
        self.registry.borrow().slots.len()
    }

    /// Invoke every live handler in connection order and collect the results.
    pub fn emit(&self, args: A) -> Vec<R> {
        let snapshot = self.registry.borrow().snapshot();
        let mut results = Vec::with_capacity(snapshot.len());
        let mut dead = Vec::new();

        for (id, handler) in snapshot {
            match handler(args.clone()) {
                Some(result) => results.push(result),
                None => dead.push(id),
            }
        }

        if !dead.is_empty() {
            log::trace!("pruning {} dead signal handler(s)", dead.len());
            self.registry.borrow_mut().prune(&dead);
        }
        results
    }

    fn insert(&self, handler: Rc<SyncHandler<A, R>>) -> HandlerId {
        self.registry.borrow_mut().insert(handler)
    }
}

impl<A: Clone + 'static, R: 'static> Default for Signal<A, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R> Clone for Signal<A, R> {
    fn clone(&self) -> Self {
        Self {
            registry: Rc::clone(&self.registry),
        }
    }
}

impl<A, R> fmt::Debug for Signal<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("handlers", &self.registry.borrow().slots.len())
            .finish()
    }
}

type AsyncHandler<A, R> = dyn Fn(A) -> Option<LocalBoxFuture<'static, R>>;

/// Asynchronous signal: handlers are awaited concurrently.
pub struct AsyncSignal<A, R = ()> {
    registry: Rc<RefCell<Registry<AsyncHandler<A, R>>>>,
}

impl<A: Clone + 'static, R: 'static> AsyncSignal<A, R> {
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry::new())),
        }
    }

    pub fn connect<F, Fut>(&self, handler: F) -> HandlerId
    where
        F: Fn(A) -> Fut + 'static,
        Fut: Future<Output = R> + 'static,
    {
        self.insert(Rc::new(move |args: A| Some(handler(args).boxed_local())))
    }

    /// Register a handler bound to `target` without keeping it alive.
    ///
    /// The handler receives a strong reference for the duration of one call.
    pub fn connect_weak<T, F, Fut>(&self, target: &Rc<T>, method: F) -> HandlerId
    where
        T: ?Sized + 'static,
        F: Fn(Rc<T>, A) -> Fut + 'static,
        Fut: Future<Output = R> + 'static,
    {
        let target = Rc::downgrade(target);
        self.insert(Rc::new(move |args: A| {
            target
                .upgrade()
                .map(|target| method(target, args).boxed_local())
        }))
    }

    pub fn subscribe<F, Fut>(&self, handler: F) -> Subscription
    where
        F: Fn(A) -> Fut + 'static,
        Fut: Future<Output = R> + 'static,
    {
        let id = self.connect(handler);
        scoped(&self.registry, id)
    }

    pub fn disconnect(&self, id: HandlerId) -> Result<()> {
        Ok(self.registry.borrow_mut().remove(id)?)
    }

    pub fn handler_count(&self) -> usize {
        self.registry.borrow().slots.len()
    }

    /// Start every live handler and await them all.
    ///
    /// Handlers are invoked before this returns; the future only drives them to
    /// completion, so it does not borrow the signal.
    pub fn emit(&self, args: A) -> impl Future<Output = Vec<R>> + 'static {
        self.start(args).collect::<Vec<R>>()
    }

    fn start(&self, args: A) -> FuturesUnordered<LocalBoxFuture<'static, R>> {
        let snapshot = self.registry.borrow().snapshot();
        let pending = FuturesUnordered::new();
        let mut dead = Vec::new();

        for (id, handler) in snapshot {
            match handler(args.clone()) {
                Some(future) => pending.push(future),
                None => dead.push(id),
            }
        }

        if !dead.is_empty() {
            log::trace!("pruning {} dead async signal handler(s)", dead.len());
            self.registry.borrow_mut().prune(&dead);
        }
        pending
    }

    fn insert(&self, handler: Rc<AsyncHandler<A, R>>) -> HandlerId {
        self.registry.borrow_mut().insert(handler)
    }
}

impl<A: Clone + 'static> AsyncSignal<A, Result<EventFlow>> {
    /// Re-emit every event on `target` and report the merged outcome.
    ///
    /// The target is held weakly. Forwarding a signal to itself is rejected.
    pub fn forward(&self, target: &Self) -> Result<HandlerId> {
        if Rc::ptr_eq(&self.registry, &target.registry) {
            return Err(SignalError::SelfConnection.into());
        }

        let target = Rc::downgrade(&target.registry);
        Ok(self.insert(Rc::new(move |args: A| {
            let registry = target.upgrade()?;
            let pending = AsyncSignal { registry }.start(args);
            Some(async move { merge_flows(pending.collect::<Vec<_>>().await) }.boxed_local())
        })))
    }
}

impl<A: Clone + 'static, R: 'static> Default for AsyncSignal<A, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R> Clone for AsyncSignal<A, R> {
    fn clone(&self) -> Self {
        Self {
            registry: Rc::clone(&self.registry),
        }
    }
}

impl<A, R> fmt::Debug for AsyncSignal<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncSignal")
            .field("handlers", &self.registry.borrow().slots.len())
            .finish()
    }
}
