//! Flow orchestrator - named routines that dispatch over time
//!
//! A flow receives the composed dispatch and a payload, and may dispatch zero,
//! one or many actions. Synchronous flows run to completion inside
//! [`FlowOrchestrator::trigger`]. Async flows are spawned onto the current
//! thread's [`tokio::task::LocalSet`] and may await between dispatches.
//!
//! The orchestrator keeps no per-flow state: it does not track whether a flow
//! is running, and flows cannot be cancelled.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::dispatch::Dispatch;
use crate::error::{ConfigError, DispatchError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

/// Boxed future that stays on the current thread
pub type LocalBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

type FlowResult = Result<(), DispatchError>;
type SyncFlowFn<S, P> = dyn Fn(Dispatch<S, P>, P) -> FlowResult;
type AsyncFlowFn<S, P> = dyn Fn(Dispatch<S, P>, P) -> LocalBoxFuture<'static, FlowResult>;

enum FlowKind<S, P> {
    Sync(Rc<SyncFlowFn<S, P>>),
    Async(Rc<AsyncFlowFn<S, P>>),
}

/// An orchestration routine `(dispatch, payload)`
pub struct Flow<S, P> {
    kind: FlowKind<S, P>,
}

impl<S: 'static, P: 'static> Flow<S, P> {
    /// Flow that runs to completion when triggered
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Dispatch<S, P>, P) -> FlowResult + 'static,
    {
        Self {
            kind: FlowKind::Sync(Rc::new(f)),
        }
    }

    /// Flow spawned with [`tokio::task::spawn_local`] when triggered
    ///
    /// Triggering it with no tokio runtime on the thread reports
    /// [`Diagnostic::FlowNotStarted`] and runs nothing. Inside a runtime the
    /// trigger must happen within a `LocalSet`.
    pub fn spawn<F, Fut>(f: F) -> Self
    where
        F: Fn(Dispatch<S, P>, P) -> Fut + 'static,
        Fut: Future<Output = FlowResult> + 'static,
    {
        let f: Rc<AsyncFlowFn<S, P>> = Rc::new(move |dispatch: Dispatch<S, P>, payload: P| {
            Box::pin(f(dispatch, payload)) as LocalBoxFuture<'static, FlowResult>
        });
        Self {
            kind: FlowKind::Async(f),
        }
    }

    fn run(&self, name: &str, dispatch: Dispatch<S, P>, payload: P, diagnostics: &Diagnostics) {
        match &self.kind {
            FlowKind::Sync(f) => {
                if let Err(e) = f(dispatch, payload) {
                    report_failure(diagnostics, name, &e);
                }
            }
            FlowKind::Async(f) => {
                if tokio::runtime::Handle::try_current().is_err() {
                    diagnostics.report(Diagnostic::FlowNotStarted {
                        name: name.to_string(),
                    });
                    return;
                }
                let future = f(dispatch, payload);
                let name = name.to_string();
                let diagnostics = diagnostics.clone();
                tokio::task::spawn_local(async move {
                    if let Err(e) = future.await {
                        report_failure(&diagnostics, &name, &e);
                    }
                });
            }
        }
    }
}

fn report_failure(diagnostics: &Diagnostics, name: &str, error: &DispatchError) {
    diagnostics.report(Diagnostic::FlowFailed {
        name: name.to_string(),
        message: error.to_string(),
    });
}

impl<S, P> Clone for Flow<S, P> {
    fn clone(&self) -> Self {
        let kind = match &self.kind {
            FlowKind::Sync(f) => FlowKind::Sync(f.clone()),
            FlowKind::Async(f) => FlowKind::Async(f.clone()),
        };
        Self { kind }
    }
}

impl<S, P> fmt::Debug for Flow<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FlowKind::Sync(_) => f.write_str("Flow::Sync"),
            FlowKind::Async(_) => f.write_str("Flow::Async"),
        }
    }
}

/// Flows to register at construction, in declaration order
pub struct FlowMap<S, P> {
    entries: Vec<(String, Flow<S, P>)>,
}

impl<S: 'static, P: 'static> FlowMap<S, P> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn flow<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Dispatch<S, P>, P) -> FlowResult + 'static,
    {
        self.insert(name, Flow::new(f))
    }

    pub fn spawn<F, Fut>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Dispatch<S, P>, P) -> Fut + 'static,
        Fut: Future<Output = FlowResult> + 'static,
    {
        self.insert(name, Flow::spawn(f))
    }

    pub fn insert(mut self, name: impl Into<String>, flow: Flow<S, P>) -> Self {
        self.entries.push((name.into(), flow));
        self
    }
}

impl<S: 'static, P: 'static> Default for FlowMap<S, P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Flow name → flow
pub struct FlowRegistry<S, P> {
    flows: HashMap<String, Flow<S, P>>,
}

impl<S, P> FlowRegistry<S, P> {
    pub fn new() -> Self {
        Self {
            flows: HashMap::new(),
        }
    }

    /// Register `flow` under `name`, replacing any previous definition
    pub fn define(&mut self, name: impl Into<String>, flow: Flow<S, P>) -> Result<(), ConfigError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigError::EmptyFlowName);
        }
        if self.flows.insert(name.clone(), flow).is_some() {
            log::debug!("Redefined action flow: {}", name);
        } else {
            log::debug!("Defined action flow: {}", name);
        }
        Ok(())
    }

    /// Define every flow in `map`; on error nothing is defined
    pub fn extend(&mut self, map: FlowMap<S, P>) -> Result<(), ConfigError> {
        if map.entries.iter().any(|(name, _)| name.is_empty()) {
            return Err(ConfigError::EmptyFlowName);
        }
        map.entries
            .into_iter()
            .try_for_each(|(name, flow)| self.define(name, flow))
    }

    pub fn get(&self, name: &str) -> Option<Flow<S, P>> {
        self.flows.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.flows.keys().map(String::as_str)
    }
}

impl<S, P> Default for FlowRegistry<S, P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Looks up flows by name and runs them with the composed dispatch
pub struct FlowOrchestrator<S, P> {
    flows: Rc<RefCell<FlowRegistry<S, P>>>,
    dispatch: Dispatch<S, P>,
    diagnostics: Diagnostics,
}

impl<S: 'static, P: 'static> FlowOrchestrator<S, P> {
    pub fn new(
        flows: Rc<RefCell<FlowRegistry<S, P>>>,
        dispatch: Dispatch<S, P>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            flows,
            dispatch,
            diagnostics,
        }
    }

    pub fn define(&self, name: impl Into<String>, flow: Flow<S, P>) -> Result<(), ConfigError> {
        self.flows.borrow_mut().define(name, flow)
    }

    /// Run the flow registered under `name` with `payload`
    ///
    /// An unknown name is reported and otherwise ignored.
    pub fn trigger(&self, name: &str, payload: P) {
        // Release the registry before running: flows may define other flows
        let flow = self.flows.borrow().get(name);
        match flow {
            Some(flow) => {
                log::debug!("Triggering action flow: {}", name);
                flow.run(name, self.dispatch.clone(), payload, &self.diagnostics);
            }
            None => self.diagnostics.report(Diagnostic::UnknownFlow {
                name: name.to_string(),
            }),
        }
    }
}

impl<S, P> Clone for FlowOrchestrator<S, P> {
    fn clone(&self) -> Self {
        Self {
            flows: self.flows.clone(),
            dispatch: self.dispatch.clone(),
            diagnostics: self.diagnostics.clone(),
        }
    }
}

impl<S, P> fmt::Debug for FlowOrchestrator<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flows = self.flows.borrow();
        let mut names: Vec<&str> = flows.names().collect();
        names.sort_unstable();
        f.debug_struct("FlowOrchestrator")
            .field("flows", &names)
            .finish_non_exhaustive()
    }
}
