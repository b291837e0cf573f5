//! Store - assembles the engine and exposes its public surface
//!
//! The store follows the Redux loop:
//! - one centralized state value
//! - state changes only by dispatching actions
//! - pure handlers compute the next state
//! - the state is replaced, never mutated in place
//!
//! Hosts build a [`Store`] once per subtree and pass its [`StoreHandle`] to the
//! consumers that need it.

use crate::action::Action;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::dispatch::{Dispatch, DispatchCore, DispatchResult};
use crate::dispatcher::{ActionQueue, ActionSender};
use crate::error::{ConfigError, DispatchError};
use crate::flow::{Flow, FlowMap, FlowOrchestrator, FlowRegistry};
use crate::handler::{HandlerRegistry, HandlerSet};
use crate::middleware::{compose, Middleware};
use crate::state::{StateCell, StateReader, SubscriptionId};
use serde_json::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Construction-time configuration
pub struct StoreConfig<S, P = Value> {
    /// Starting state. Default: `S::default()`
    pub initial_state: S,
    /// Handlers, folded per type in the order given. Default: none
    pub action_handlers: HandlerSet<S, P>,
    /// Named flows. Default: none
    pub action_flows: FlowMap<S, P>,
    /// Middleware, first entry outermost. Default: none
    pub action_middleware: Vec<Box<dyn Middleware<S, P>>>,
    /// Where diagnostics go besides the log. Default: log only
    pub diagnostics: Diagnostics,
}

impl<S: 'static, P: 'static> StoreConfig<S, P> {
    pub fn new(initial_state: S) -> Self {
        Self {
            initial_state,
            action_handlers: HandlerSet::default(),
            action_flows: FlowMap::new(),
            action_middleware: Vec::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Append handlers after those already configured
    pub fn action_handlers(mut self, handlers: impl Into<HandlerSet<S, P>>) -> Self {
        let previous = std::mem::take(&mut self.action_handlers);
        self.action_handlers = HandlerSet::Many(vec![previous, handlers.into()]);
        self
    }

    /// Replace the configured flows
    pub fn action_flows(mut self, flows: FlowMap<S, P>) -> Self {
        self.action_flows = flows;
        self
    }

    pub fn flow(mut self, name: impl Into<String>, flow: Flow<S, P>) -> Self {
        self.action_flows = self.action_flows.insert(name, flow);
        self
    }

    /// Add middleware inside the ones already configured
    pub fn middleware(mut self, middleware: impl Middleware<S, P> + 'static) -> Self {
        self.action_middleware.push(Box::new(middleware));
        self
    }

    /// Add middleware that is already boxed, e.g. from [`crate::middleware::from_fn`]
    pub fn boxed_middleware(mut self, middleware: Box<dyn Middleware<S, P>>) -> Self {
        self.action_middleware.push(middleware);
        self
    }

    pub fn on_diagnostic(mut self, sink: impl Fn(&Diagnostic) + 'static) -> Self {
        self.diagnostics = Diagnostics::with_sink(sink);
        self
    }
}

impl<S: Default + 'static, P: 'static> Default for StoreConfig<S, P> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

/// The public surface handed to consumers: getState, dispatch, trigger_flow
///
/// Cheap to clone. Keeps the store's engine alive.
pub struct StoreHandle<S, P = Value> {
    state: StateReader<S>,
    dispatch: Dispatch<S, P>,
    flows: FlowOrchestrator<S, P>,
}

impl<S: Clone + 'static, P: 'static> StoreHandle<S, P> {
    /// Snapshot of the current state
    pub fn state(&self) -> S {
        self.state.get()
    }

    pub fn state_reader(&self) -> &StateReader<S> {
        &self.state
    }

    /// Dispatch through the full middleware chain
    pub fn dispatch(&self, action: Action<P>) -> DispatchResult<S> {
        self.dispatch.dispatch(action)
    }

    /// The composed dispatch function itself
    pub fn dispatcher(&self) -> &Dispatch<S, P> {
        &self.dispatch
    }

    pub fn trigger_flow(&self, name: &str, payload: P) {
        self.flows.trigger(name, payload)
    }
}

impl<S, P> Clone for StoreHandle<S, P> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            dispatch: self.dispatch.clone(),
            flows: self.flows.clone(),
        }
    }
}

impl<S: fmt::Debug, P> fmt::Debug for StoreHandle<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHandle")
            .field("state", &self.state)
            .field("flows", &self.flows)
            .finish_non_exhaustive()
    }
}

/// Owns one engine instance: state cell, handler registry, flows, middleware
///
/// Not `Send`: all calls must come from the thread that built the store.
/// Other threads queue actions through [`Store::sender`].
pub struct Store<S, P = Value> {
    cell: Rc<StateCell<S>>,
    registry: Rc<RefCell<HandlerRegistry<S, P>>>,
    handle: StoreHandle<S, P>,
    queue: ActionQueue<P>,
}

impl<S: Clone + 'static, P: 'static> Store<S, P> {
    /// Build the engine; malformed handler or flow maps fail here
    pub fn new(config: StoreConfig<S, P>) -> Result<Self, ConfigError> {
        let StoreConfig {
            initial_state,
            action_handlers,
            action_flows,
            action_middleware,
            diagnostics,
        } = config;

        let mut registry = HandlerRegistry::new();
        registry.register(action_handlers)?;
        let mut flows = FlowRegistry::new();
        flows.extend(action_flows)?;

        let cell = Rc::new(StateCell::new(initial_state));
        let registry = Rc::new(RefCell::new(registry));
        let core = Rc::new(DispatchCore::new(
            registry.clone(),
            cell.clone(),
            diagnostics.clone(),
        ));

        let reader = StateReader::new(cell.clone());
        let dispatch = compose(core.into_dispatch(), &action_middleware, &reader);
        let flows = FlowOrchestrator::new(Rc::new(RefCell::new(flows)), dispatch.clone(), diagnostics);
        log::debug!(
            "Store created with {} middleware, {:?} handler chains, {:?}",
            action_middleware.len(),
            registry.borrow(),
            flows
        );

        Ok(Self {
            cell,
            registry,
            handle: StoreHandle {
                state: reader,
                dispatch,
                flows,
            },
            queue: ActionQueue::new(),
        })
    }

    /// Snapshot of the current state (getState)
    pub fn state(&self) -> S {
        self.cell.get()
    }

    pub fn state_reader(&self) -> StateReader<S> {
        self.handle.state.clone()
    }

    /// Dispatch through the middleware chain, then the handlers
    ///
    /// Returns the resulting state; for an unhandled type that is the current
    /// state unchanged.
    pub fn dispatch(&self, action: Action<P>) -> DispatchResult<S> {
        self.handle.dispatch(action)
    }

    pub fn dispatcher(&self) -> Dispatch<S, P> {
        self.handle.dispatch.clone()
    }

    pub fn trigger_flow(&self, name: &str, payload: P) {
        self.handle.trigger_flow(name, payload)
    }

    /// Append more handlers; existing chains keep their handlers and grow
    pub fn add_action_handlers(
        &self,
        handlers: impl Into<HandlerSet<S, P>>,
    ) -> Result<(), ConfigError> {
        self.registry.borrow_mut().register(handlers)
    }

    /// Define or redefine a flow
    pub fn define_flow(&self, name: impl Into<String>, flow: Flow<S, P>) -> Result<(), ConfigError> {
        self.handle.flows.define(name, flow)
    }

    /// Call `listener` with the new state after every commit
    pub fn subscribe(&self, listener: impl Fn(&S) + 'static) -> SubscriptionId {
        self.cell.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.cell.unsubscribe(id)
    }

    /// Handle for consumers
    pub fn handle(&self) -> StoreHandle<S, P> {
        self.handle.clone()
    }

    /// Sender other threads use to queue actions for this store
    pub fn sender(&self) -> ActionSender<P> {
        self.queue.sender()
    }

    /// Dispatch every queued action in arrival order
    ///
    /// Stops at the first failing dispatch; later actions stay queued.
    pub fn drain_pending(&self) -> Result<usize, DispatchError> {
        let mut applied = 0;
        while let Some(action) = self.queue.try_next() {
            self.dispatch(action)?;
            applied += 1;
        }
        Ok(applied)
    }
}

impl<S: fmt::Debug, P> fmt::Debug for Store<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.cell)
            .field("handlers", &self.registry.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerMap;
    use crate::middleware::{filter, from_fn, LoggingMiddleware};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Counter {
        count: i64,
        history: Vec<i64>,
    }

    fn counter_handlers() -> HandlerMap<Counter, i64> {
        HandlerMap::new()
            .on("INCREMENT", |state: Counter, by: &i64| Counter {
                count: state.count + by,
                ..state
            })
            .on("RESET", |state: Counter, _: &i64| Counter { count: 0, ..state })
    }

    fn history_handlers() -> HandlerMap<Counter, i64> {
        HandlerMap::new().on("INCREMENT", |mut state: Counter, _: &i64| {
            state.history.push(state.count);
            state
        })
    }

    #[test]
    fn test_store_increments_with_any_payload() {
        let store: Store<Value> = Store::new(StoreConfig::new(json!({ "count": 0 })).action_handlers(
            HandlerMap::new().on("INCREMENT", |state: Value, payload: &Value| {
                json!({ "count": state["count"].as_i64().unwrap_or(0) + payload.as_i64().unwrap_or(0) })
            }),
        ))
        .unwrap();

        store.dispatch(Action::new("INCREMENT", json!(5))).unwrap();
        assert_eq!(store.state(), json!({ "count": 5 }));

        let result = store.dispatch(Action::new("INCREMENT", json!(3))).unwrap();
        assert_eq!(result, json!({ "count": 8 }));
        assert_eq!(store.state(), json!({ "count": 8 }));
    }

    #[test]
    fn test_store_folds_handlers_from_several_maps() {
        let store = Store::new(
            StoreConfig::default().action_handlers(vec![counter_handlers(), history_handlers()]),
        )
        .unwrap();

        store.dispatch(Action::new("INCREMENT", 2)).unwrap();
        store.dispatch(Action::new("INCREMENT", 3)).unwrap();

        assert_eq!(
            store.state(),
            Counter {
                count: 5,
                history: vec![2, 5],
            }
        );
    }

    #[test]
    fn test_unhandled_type_returns_prior_state_and_reports() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let store = Store::new(
            StoreConfig::default()
                .action_handlers(counter_handlers())
                .on_diagnostic({
                    let seen = seen.clone();
                    move |d| seen.borrow_mut().push(d.clone())
                }),
        )
        .unwrap();
        store.dispatch(Action::new("INCREMENT", 4)).unwrap();
        let prior = store.state();

        let result = store.dispatch(Action::new("UNKNOWN", 0)).unwrap();

        assert_eq!(result, prior);
        assert_eq!(store.state(), prior);
        assert_eq!(
            *seen.borrow(),
            vec![Diagnostic::UnhandledActionType {
                action_type: "UNKNOWN".to_string()
            }]
        );
    }

    #[test]
    fn test_handlers_added_later_append() {
        let store = Store::new(StoreConfig::default().action_handlers(counter_handlers())).unwrap();

        store.add_action_handlers(history_handlers()).unwrap();
        store.dispatch(Action::new("INCREMENT", 1)).unwrap();

        assert_eq!(store.state().history, vec![1]);
    }

    #[test]
    fn test_malformed_config_fails_fast() {
        let result = Store::new(
            StoreConfig::<Counter, i64>::default()
                .action_handlers(HandlerMap::new().on("", |s: Counter, _: &i64| s)),
        );
        assert!(matches!(result, Err(ConfigError::EmptyActionType)));

        let result = Store::new(
            StoreConfig::<Counter, i64>::default()
                .flow("", Flow::new(|_: Dispatch<Counter, i64>, _: i64| Ok(()))),
        );
        assert!(matches!(result, Err(ConfigError::EmptyFlowName)));
    }

    #[test]
    fn test_failing_handler_propagates_and_keeps_state() {
        let store = Store::new(
            StoreConfig::default()
                .action_handlers(counter_handlers())
                .action_handlers(HandlerMap::new().try_on(
                    "INCREMENT",
                    |state: Counter, _: &i64| {
                        if state.count > 10 {
                            Err("counter overflow")
                        } else {
                            Ok(state)
                        }
                    },
                )),
        )
        .unwrap();
        store.dispatch(Action::new("INCREMENT", 5)).unwrap();

        let err = store.dispatch(Action::new("INCREMENT", 20)).unwrap_err();

        assert!(matches!(err, DispatchError::HandlerFailed { index: 1, .. }));
        assert_eq!(store.state().count, 5);
    }

    #[test]
    fn test_failing_middleware_propagates_and_keeps_state() {
        let store = Store::new(
            StoreConfig::default()
                .action_handlers(counter_handlers())
                .boxed_middleware(from_fn(
                    |next: Dispatch<Counter, i64>, _state: StateReader<Counter>| {
                        Dispatch::new(move |action: Action<i64>| {
                            if action.payload > 100 {
                                return Err(DispatchError::middleware(
                                    "limit",
                                    action.action_type,
                                    "payload too large",
                                ));
                            }
                            next.dispatch(action)
                        })
                    },
                )),
        )
        .unwrap();
        store.dispatch(Action::new("INCREMENT", 3)).unwrap();

        let err = store.dispatch(Action::new("INCREMENT", 500)).unwrap_err();

        assert!(matches!(
            &err,
            DispatchError::MiddlewareFailed { middleware, action_type, .. }
                if middleware == "limit" && action_type == "INCREMENT"
        ));
        assert_eq!(store.state().count, 3);
    }

    #[test]
    fn test_blocking_middleware_leaves_state_unchanged() {
        let observed = Rc::new(RefCell::new(Vec::new()));
        let store = Store::new(
            StoreConfig::default()
                .action_handlers(counter_handlers())
                .middleware(LoggingMiddleware::new())
                .boxed_middleware(filter(|action: &Action<i64>, _: &Counter| action.payload >= 0))
                .boxed_middleware(from_fn({
                    let observed = observed.clone();
                    move |next: Dispatch<Counter, i64>, _state: StateReader<Counter>| {
                        let observed = observed.clone();
                        Dispatch::new(move |action: Action<i64>| {
                            observed.borrow_mut().push(action.payload);
                            next.dispatch(action)
                        })
                    }
                })),
        )
        .unwrap();

        store.dispatch(Action::new("INCREMENT", 2)).unwrap();
        let result = store.dispatch(Action::new("INCREMENT", -7)).unwrap();

        assert_eq!(result.count, 2);
        assert_eq!(store.state().count, 2);
        assert_eq!(*observed.borrow(), vec![2]);
    }

    #[test]
    fn test_flow_receives_composed_dispatch() {
        let through_middleware = Rc::new(RefCell::new(0));
        let store = Store::new(
            StoreConfig::default()
                .action_handlers(counter_handlers())
                .boxed_middleware(from_fn({
                    let through_middleware = through_middleware.clone();
                    move |next: Dispatch<Counter, i64>, _state: StateReader<Counter>| {
                        let through_middleware = through_middleware.clone();
                        Dispatch::new(move |action: Action<i64>| {
                            *through_middleware.borrow_mut() += 1;
                            next.dispatch(action)
                        })
                    }
                }))
                .flow(
                    "reset_then_add",
                    Flow::new(|dispatch: Dispatch<Counter, i64>, amount: i64| {
                        dispatch.dispatch(Action::new("RESET", 0))?;
                        dispatch.dispatch(Action::new("INCREMENT", amount))?;
                        Ok(())
                    }),
                ),
        )
        .unwrap();
        store.dispatch(Action::new("INCREMENT", 9)).unwrap();

        store.trigger_flow("reset_then_add", 4);
        store.trigger_flow("no_such_flow", 4);

        assert_eq!(store.state().count, 4);
        assert_eq!(*through_middleware.borrow(), 3);
    }

    #[test]
    fn test_subscribers_see_each_commit() {
        let store = Store::new(StoreConfig::default().action_handlers(counter_handlers())).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let id = store.subscribe({
            let seen = seen.clone();
            move |state: &Counter| seen.borrow_mut().push(state.count)
        });

        store.dispatch(Action::new("INCREMENT", 1)).unwrap();
        store.dispatch(Action::new("UNKNOWN", 1)).unwrap();
        store.dispatch(Action::new("INCREMENT", 1)).unwrap();
        store.unsubscribe(id);
        store.dispatch(Action::new("INCREMENT", 1)).unwrap();

        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_subscriber_may_dispatch_reentrantly() {
        let store = Rc::new(
            Store::new(StoreConfig::default().action_handlers(counter_handlers())).unwrap(),
        );
        let handle = store.handle();
        store.subscribe(move |state: &Counter| {
            if state.count == 3 {
                handle.dispatch(Action::new("RESET", 0)).unwrap();
            }
        });

        store.dispatch(Action::new("INCREMENT", 3)).unwrap();

        assert_eq!(store.state().count, 0);
    }

    #[test]
    fn test_handle_shares_state_with_store() {
        let store = Store::new(StoreConfig::default().action_handlers(counter_handlers())).unwrap();
        let handle = store.handle();

        handle.dispatch(Action::new("INCREMENT", 6)).unwrap();

        assert_eq!(store.state().count, 6);
        assert_eq!(handle.state().count, 6);
        assert_eq!(handle.state_reader().with(|s| s.count), 6);
    }

    #[test]
    fn test_drain_pending_applies_queued_actions_in_order() {
        let store = Store::new(
            StoreConfig::default().action_handlers(vec![counter_handlers(), history_handlers()]),
        )
        .unwrap();
        let sender = store.sender();

        let worker = std::thread::spawn(move || {
            for n in 1..=3 {
                sender.send(Action::new("INCREMENT", n));
            }
        });
        worker.join().unwrap();

        assert_eq!(store.drain_pending().unwrap(), 3);
        assert_eq!(
            store.state(),
            Counter {
                count: 6,
                history: vec![1, 3, 6],
            }
        );
        assert_eq!(store.drain_pending().unwrap(), 0);
    }
}
