//! Diagnostic channel for recoverable dispatch problems
//!
//! Dispatching an action type nobody handles, or triggering a flow nobody
//! defined, must not break the caller's update cycle. These conditions are
//! reported here instead of being returned as errors: always to the `log`
//! facade, and additionally to a sink the host installs via
//! [`StoreConfig::on_diagnostic`](crate::StoreConfig::on_diagnostic).

use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// A recoverable problem observed by the engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    /// Dispatch of a type with no registered handlers; the state is unchanged
    #[error("There are no handlers for action type: {action_type}")]
    UnhandledActionType { action_type: String },

    /// Trigger of a flow name that was never defined; nothing ran
    #[error("There is no action flow with name: {name}")]
    UnknownFlow { name: String },

    /// A flow finished with an error
    #[error("Action flow `{name}` failed: {message}")]
    FlowFailed { name: String, message: String },

    /// An async flow was triggered on a thread with no tokio runtime
    #[error("Action flow `{name}` needs a tokio runtime with a LocalSet to start")]
    FlowNotStarted { name: String },
}

type Sink = Rc<dyn Fn(&Diagnostic)>;

/// Reporter shared by the dispatch core and the flow orchestrator
#[derive(Clone, Default)]
pub struct Diagnostics {
    sink: Option<Sink>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reporter that forwards every diagnostic to `sink` after logging it
    pub fn with_sink(sink: impl Fn(&Diagnostic) + 'static) -> Self {
        Self {
            sink: Some(Rc::new(sink)),
        }
    }

    pub fn report(&self, diagnostic: Diagnostic) {
        log::error!("{}", diagnostic);
        if let Some(sink) = &self.sink {
            sink(&diagnostic);
        }
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("sink", &self.sink.is_some())
            .finish()
    }
}
