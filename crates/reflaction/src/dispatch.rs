//! Dispatch core and the dispatch function type
//!
//! ```text
//! Action → lookup(type) → fold handlers over a copy of state → commit → State
//! ```
//!
//! The fold runs on a copy; the state cell is only touched once every handler
//! in the chain has succeeded, so a failing handler leaves no partial update.

use crate::action::Action;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::DispatchError;
use crate::handler::{Handler, HandlerRegistry};
use crate::state::StateCell;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub type DispatchResult<S> = Result<S, DispatchError>;

type DispatchFn<S, P> = dyn Fn(Action<P>) -> DispatchResult<S>;

/// A dispatch function: the base dispatch, or one wrapped by middleware
///
/// Cheap to clone; every clone calls the same function.
pub struct Dispatch<S, P> {
    f: Rc<DispatchFn<S, P>>,
}

impl<S, P> Dispatch<S, P> {
    pub fn new(f: impl Fn(Action<P>) -> DispatchResult<S> + 'static) -> Self {
        Self { f: Rc::new(f) }
    }

    pub fn dispatch(&self, action: Action<P>) -> DispatchResult<S> {
        (self.f)(action)
    }

    /// Whether both values call the same function
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.f, &b.f)
    }
}

impl<S, P> Clone for Dispatch<S, P> {
    fn clone(&self) -> Self {
        Self { f: self.f.clone() }
    }
}

impl<S, P> fmt::Debug for Dispatch<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dispatch({:p})", Rc::as_ptr(&self.f) as *const ())
    }
}

/// Fold `chain` over `state` left to right, each handler seeing the previous
/// handler's output and the same payload
pub fn fold_chain<S, P>(
    action_type: &str,
    chain: &[Handler<S, P>],
    state: S,
    payload: &P,
) -> DispatchResult<S> {
    chain
        .iter()
        .enumerate()
        .try_fold(state, |state, (index, handler)| {
            handler
                .call(state, payload)
                .map_err(|source| DispatchError::HandlerFailed {
                    action_type: action_type.to_string(),
                    index,
                    source,
                })
        })
}

/// Innermost dispatch: applies the registered handlers and commits the result
pub struct DispatchCore<S, P> {
    registry: Rc<RefCell<HandlerRegistry<S, P>>>,
    state: Rc<StateCell<S>>,
    diagnostics: Diagnostics,
}

impl<S: Clone + 'static, P: 'static> DispatchCore<S, P> {
    pub fn new(
        registry: Rc<RefCell<HandlerRegistry<S, P>>>,
        state: Rc<StateCell<S>>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            registry,
            state,
            diagnostics,
        }
    }

    /// Run the handler chain for `action_type` and commit its result
    ///
    /// Returns the unchanged state (and reports it) when no handler is
    /// registered for the type.
    pub fn apply(&self, action_type: &str, payload: &P) -> DispatchResult<S> {
        // Copy the chain so handlers can register more handlers re-entrantly
        let chain = self.registry.borrow().lookup(action_type).to_vec();
        if chain.is_empty() {
            self.diagnostics.report(Diagnostic::UnhandledActionType {
                action_type: action_type.to_string(),
            });
            return Ok(self.state.get());
        }

        let next = fold_chain(action_type, &chain, self.state.get(), payload)?;
        self.state.commit(next.clone());
        Ok(next)
    }

    /// The base dispatch function every middleware chain ends in
    pub fn into_dispatch(self: Rc<Self>) -> Dispatch<S, P> {
        Dispatch::new(move |action: Action<P>| self.apply(&action.action_type, &action.payload))
    }
}

impl<S, P> fmt::Debug for DispatchCore<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchCore")
            .field("registry", &self.registry.borrow())
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}
