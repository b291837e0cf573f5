//! State cell - the single current state value and its subscribers

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

type Listener<S> = Rc<dyn Fn(&S)>;

/// Identifies a subscription so it can be removed again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Holds the current state
///
/// Only the dispatch core replaces the value. Everyone else reads a snapshot
/// taken at call time.
pub struct StateCell<S> {
    value: RefCell<S>,
    listeners: RefCell<Vec<(SubscriptionId, Listener<S>)>>,
    next_id: Cell<u64>,
}

impl<S: Clone> StateCell<S> {
    pub fn new(initial_state: S) -> Self {
        Self {
            value: RefCell::new(initial_state),
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Snapshot of the current value
    pub fn get(&self) -> S {
        self.value.borrow().clone()
    }

    /// Borrow the current value without cloning it
    ///
    /// `f` must not dispatch: the value is borrowed until it returns.
    pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Replace the value in one step, then notify subscribers
    pub(crate) fn commit(&self, next: S) {
        *self.value.borrow_mut() = next;
        log::trace!("State committed, notifying {} listener(s)", self.listeners.borrow().len());

        // Listeners may dispatch or (un)subscribe, so run them on a copy
        let listeners: Vec<Listener<S>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        if listeners.is_empty() {
            return;
        }
        let snapshot = self.get();
        for listener in listeners {
            listener(&snapshot);
        }
    }

    /// Call `listener` with the new state after every commit
    pub fn subscribe(&self, listener: impl Fn(&S) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Returns `false` when `id` was not subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }
}

impl<S: fmt::Debug> fmt::Debug for StateCell<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateCell")
            .field("value", &self.value.borrow())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

/// Read-only view of a [`StateCell`] (getState)
pub struct StateReader<S> {
    cell: Rc<StateCell<S>>,
}

impl<S: Clone> StateReader<S> {
    pub fn new(cell: Rc<StateCell<S>>) -> Self {
        Self { cell }
    }

    pub fn get(&self) -> S {
        self.cell.get()
    }

    /// See [`StateCell::with`]
    pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        self.cell.with(f)
    }
}

impl<S> Clone for StateReader<S> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for StateReader<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StateReader").field(&self.cell).finish()
    }
}
