//! # reflaction
//!
//! A small, embeddable state container. A host constructs one [`Store`] per
//! subtree of consumers; consumers mutate the shared state only by dispatching
//! [`Action`]s to declared handlers, and kick off multi-step orchestrations by
//! triggering named [`Flow`]s.
//!
//! ## Design
//!
//! ```text
//! trigger_flow ─► Flow ─┐
//!                       ▼
//! dispatch ─► Middleware chain ─► Dispatch core ─► Handler chain ─► State cell
//! ```
//!
//! - Handlers are registered per action type and folded in registration order.
//! - Middleware wraps dispatch; the first declared middleware is the outermost.
//! - Flows receive the composed dispatch and may call it any number of times,
//!   synchronously or from an async task.
//!
//! The engine is single-threaded (`Rc`/`RefCell`, `!Send`). Other threads feed
//! it through an [`ActionSender`] queue that the owning thread drains.
//!
//! ## Usage
//!
//! ```rust
//! use reflaction::{Action, HandlerMap, Store, StoreConfig};
//!
//! #[derive(Clone, Debug, Default, PartialEq)]
//! struct Counter {
//!     count: i64,
//! }
//!
//! let config = StoreConfig::new(Counter::default()).action_handlers(
//!     HandlerMap::new().on("INCREMENT", |state: Counter, by: &i64| Counter {
//!         count: state.count + by,
//!     }),
//! );
//! let store = Store::new(config)?;
//!
//! store.dispatch(Action::new("INCREMENT", 5))?;
//! assert_eq!(store.state(), Counter { count: 5 });
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod action;
pub mod connector;
pub mod diagnostics;
pub mod dispatch;
pub mod dispatcher;
pub mod error;
pub mod flow;
pub mod handler;
pub mod middleware;
pub mod provider;
pub mod state;
pub mod store;

pub use action::Action;
pub use connector::{Connected, Connector};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use dispatch::{Dispatch, DispatchCore, DispatchResult};
pub use dispatcher::ActionSender;
pub use error::{BoxError, ConfigError, DispatchError};
pub use flow::{Flow, FlowMap, FlowOrchestrator, FlowRegistry};
pub use handler::{Handler, HandlerMap, HandlerRegistry, HandlerSet};
pub use middleware::{compose, LoggingMiddleware, Middleware};
pub use provider::ProviderRegistry;
pub use state::{StateCell, StateReader, SubscriptionId};
pub use store::{Store, StoreConfig, StoreHandle};
