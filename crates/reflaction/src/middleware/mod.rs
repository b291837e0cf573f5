//! Middleware system
//!
//! Middleware wraps the dispatch function, allowing logging, guards, async
//! hand-off and other cross-cutting concerns without touching the handlers.
//!
//! ## Design
//!
//! ```text
//! dispatch → m1 → m2 → … → Dispatch core → State
//! ```
//!
//! Each middleware receives the next-innermost dispatch and a read-only view of
//! the state, and returns a new dispatch. The list is composed right to left,
//! so the first declared middleware is the outermost: it sees every action
//! first and may return without calling `next`, in which case nothing further
//! runs and the state is untouched.
//!
//! ## Example
//!
//! ```rust
//! use reflaction::middleware::from_fn;
//! use reflaction::{Dispatch, StateReader};
//!
//! let audit = from_fn(|next: Dispatch<u32, ()>, _state: StateReader<u32>| {
//!     Dispatch::new(move |action| {
//!         log::info!("dispatching {}", action);
//!         next.dispatch(action)
//!     })
//! });
//! # let _ = audit;
//! ```

use crate::dispatch::Dispatch;
use crate::state::StateReader;

mod filter;
mod logging;

pub use filter::{filter, FilterMiddleware};
pub use logging::LoggingMiddleware;

/// Transformer from the next dispatch function to a wrapping one
pub trait Middleware<S, P> {
    /// Build the dispatch function that runs this middleware, then `next`
    ///
    /// # Parameters
    /// - `next`: the next-innermost dispatch; not calling it short-circuits
    /// - `state`: read access to the current state (getState)
    fn wrap(&self, next: Dispatch<S, P>, state: StateReader<S>) -> Dispatch<S, P>;

    /// Name used in log output and errors
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<S, P, F> Middleware<S, P> for F
where
    F: Fn(Dispatch<S, P>, StateReader<S>) -> Dispatch<S, P>,
{
    fn wrap(&self, next: Dispatch<S, P>, state: StateReader<S>) -> Dispatch<S, P> {
        self(next, state)
    }
}

/// Box a closure as middleware, fixing its argument types for inference
pub fn from_fn<S, P, F>(f: F) -> Box<dyn Middleware<S, P>>
where
    F: Fn(Dispatch<S, P>, StateReader<S>) -> Dispatch<S, P> + 'static,
    S: 'static,
    P: 'static,
{
    Box::new(f)
}

/// Wrap `base` in `middleware`, first entry outermost
///
/// An empty list returns `base` itself.
pub fn compose<S, P>(
    base: Dispatch<S, P>,
    middleware: &[Box<dyn Middleware<S, P>>],
    state: &StateReader<S>,
) -> Dispatch<S, P> {
    middleware.iter().rev().fold(base, |next, m| {
        log::debug!("Wrapping dispatch in middleware: {}", m.name());
        m.wrap(next, state.clone())
    })
}
