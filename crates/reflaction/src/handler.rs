//! Handler registry - ordered reducer chains per action type
//!
//! Several handlers may respond to the same action type. They are kept in
//! registration order and folded over the state in that order, so two
//! unrelated slices of state can both react to one action without knowing
//! about each other. The price is that the order is load-bearing: callers
//! register handlers in the order they want them applied.

use crate::error::{BoxError, ConfigError};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

type HandlerFn<S, P> = dyn Fn(S, &P) -> Result<S, BoxError>;

/// A pure reducer `(state, payload) -> state`
///
/// Handlers receive an owned copy of the state and return its replacement.
pub struct Handler<S, P> {
    f: Rc<HandlerFn<S, P>>,
}

impl<S: 'static, P: 'static> Handler<S, P> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(S, &P) -> S + 'static,
    {
        let f: Rc<HandlerFn<S, P>> = Rc::new(move |state: S, payload: &P| Ok(f(state, payload)));
        Self { f }
    }

    /// Handler that may fail; a failure aborts the whole dispatch
    pub fn try_new<F, E>(f: F) -> Self
    where
        F: Fn(S, &P) -> Result<S, E> + 'static,
        E: Into<BoxError>,
    {
        let f: Rc<HandlerFn<S, P>> =
            Rc::new(move |state: S, payload: &P| f(state, payload).map_err(Into::into));
        Self { f }
    }
}

impl<S, P> Handler<S, P> {
    pub fn call(&self, state: S, payload: &P) -> Result<S, BoxError> {
        (self.f)(state, payload)
    }

    /// Whether both values refer to the same registered function
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.f, &b.f)
    }
}

impl<S, P> Clone for Handler<S, P> {
    fn clone(&self) -> Self {
        Self { f: self.f.clone() }
    }
}

impl<S, P> fmt::Debug for Handler<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.f) as *const ())
    }
}

/// One mapping of action type to handler, in insertion order
pub struct HandlerMap<S, P> {
    entries: Vec<(String, Handler<S, P>)>,
}

impl<S: 'static, P: 'static> HandlerMap<S, P> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn on<F>(self, action_type: impl Into<String>, f: F) -> Self
    where
        F: Fn(S, &P) -> S + 'static,
    {
        self.handler(action_type, Handler::new(f))
    }

    pub fn try_on<F, E>(self, action_type: impl Into<String>, f: F) -> Self
    where
        F: Fn(S, &P) -> Result<S, E> + 'static,
        E: Into<BoxError>,
    {
        self.handler(action_type, Handler::try_new(f))
    }

    pub fn handler(mut self, action_type: impl Into<String>, handler: Handler<S, P>) -> Self {
        self.entries.push((action_type.into(), handler));
        self
    }
}

impl<S, P> HandlerMap<S, P> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for (action_type, _) in &self.entries {
            if action_type.is_empty() {
                return Err(ConfigError::EmptyActionType);
            }
            if !seen.insert(action_type.as_str()) {
                return Err(ConfigError::DuplicateHandler(action_type.clone()));
            }
        }
        Ok(())
    }
}

impl<S: 'static, P: 'static> Default for HandlerMap<S, P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Either a single [`HandlerMap`] or an ordered sequence of sets
///
/// Sequences may nest; they are applied depth-first in order.
pub enum HandlerSet<S, P> {
    One(HandlerMap<S, P>),
    Many(Vec<HandlerSet<S, P>>),
}

impl<S, P> HandlerSet<S, P> {
    fn flatten_into(self, out: &mut Vec<HandlerMap<S, P>>) {
        match self {
            Self::One(map) => out.push(map),
            Self::Many(sets) => sets.into_iter().for_each(|set| set.flatten_into(out)),
        }
    }
}

impl<S, P> Default for HandlerSet<S, P> {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl<S, P> From<HandlerMap<S, P>> for HandlerSet<S, P> {
    fn from(map: HandlerMap<S, P>) -> Self {
        Self::One(map)
    }
}

impl<S, P> From<Vec<HandlerMap<S, P>>> for HandlerSet<S, P> {
    fn from(maps: Vec<HandlerMap<S, P>>) -> Self {
        Self::Many(maps.into_iter().map(Self::One).collect())
    }
}

impl<S, P> From<Vec<HandlerSet<S, P>>> for HandlerSet<S, P> {
    fn from(sets: Vec<HandlerSet<S, P>>) -> Self {
        Self::Many(sets)
    }
}

/// Action type → ordered handler chain
pub struct HandlerRegistry<S, P> {
    chains: HashMap<String, Vec<Handler<S, P>>>,
}

impl<S, P> HandlerRegistry<S, P> {
    pub fn new() -> Self {
        Self {
            chains: HashMap::new(),
        }
    }

    /// Append every handler in `set` to its type's chain
    ///
    /// All maps are validated first; on error nothing is registered.
    pub fn register(&mut self, set: impl Into<HandlerSet<S, P>>) -> Result<(), ConfigError> {
        let mut maps = Vec::new();
        set.into().flatten_into(&mut maps);
        maps.iter().try_for_each(HandlerMap::validate)?;

        for (action_type, handler) in maps.into_iter().flat_map(|map| map.entries) {
            let chain = self.chains.entry(action_type.clone()).or_default();
            chain.push(handler);
            log::debug!(
                "Registered handler #{} for action type: {}",
                chain.len() - 1,
                action_type
            );
        }
        Ok(())
    }

    /// Handler chain for `action_type`, empty when nothing is registered
    pub fn lookup(&self, action_type: &str) -> &[Handler<S, P>] {
        self.chains
            .get(action_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn action_types(&self) -> impl Iterator<Item = &str> {
        self.chains.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

impl<S, P> Default for HandlerRegistry<S, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, P> fmt::Debug for HandlerRegistry<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.chains.iter().map(|(k, v)| (k, v.len())))
            .finish()
    }
}
