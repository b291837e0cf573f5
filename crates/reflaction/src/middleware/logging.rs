//! LoggingMiddleware - logs all actions passing through dispatch

use super::Middleware;
use crate::action::Action;
use crate::dispatch::Dispatch;
use crate::state::StateReader;
use std::fmt;

/// Logs every action before it continues down the chain, and any dispatch
/// error on the way back out
///
/// Never short-circuits.
#[derive(Debug, Clone, Copy)]
pub struct LoggingMiddleware {
    level: log::Level,
}

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self {
            level: log::Level::Debug,
        }
    }

    /// Log actions at `level` instead of `Debug`
    pub fn with_level(level: log::Level) -> Self {
        Self { level }
    }
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: 'static, P: fmt::Debug + 'static> Middleware<S, P> for LoggingMiddleware {
    fn wrap(&self, next: Dispatch<S, P>, _state: StateReader<S>) -> Dispatch<S, P> {
        let level = self.level;
        Dispatch::new(move |action: Action<P>| {
            log::log!(level, "Action: {} {:?}", action.action_type, action.payload);
            let action_type = action.action_type.clone();
            let result = next.dispatch(action);
            if let Err(e) = &result {
                log::warn!("Action {} failed: {}", action_type, e);
            }
            result
        })
    }

    fn name(&self) -> &str {
        "logging"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DispatchError;
    use crate::state::StateCell;
    use std::rc::Rc;

    #[test]
    fn test_logging_middleware_passes_through() {
        let cell = Rc::new(StateCell::new(1u8));
        let next = Dispatch::new(|action: Action<u8>| Ok(action.payload));

        let dispatch = LoggingMiddleware::new().wrap(next, StateReader::new(cell));

        assert_eq!(dispatch.dispatch(Action::new("SET", 9)).unwrap(), 9);
    }

    #[test]
    fn test_logging_middleware_returns_errors_unchanged() {
        let cell = Rc::new(StateCell::new(1u8));
        let next = Dispatch::new(|action: Action<u8>| {
            Err(DispatchError::middleware("inner", action.action_type, "nope"))
        });

        let dispatch =
            LoggingMiddleware::with_level(log::Level::Info).wrap(next, StateReader::new(cell));
        let err = dispatch.dispatch(Action::new("SET", 9)).unwrap_err();

        assert_eq!(err.action_type(), "SET");
        assert_eq!(Middleware::<u8, u8>::name(&LoggingMiddleware::new()), "logging");
    }
}
