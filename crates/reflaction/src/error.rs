//! Errors raised by dispatch and by handler/flow registration

use thiserror::Error;

/// Boxed error returned by fallible handlers and middleware
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of a single dispatch.
///
/// Whenever a dispatch returns one of these, the state cell still holds the
/// value it had before the dispatch started.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("handler #{index} for action type `{action_type}` failed: {source}")]
    HandlerFailed {
        action_type: String,
        /// Position of the failing handler in the chain
        index: usize,
        #[source]
        source: BoxError,
    },

    #[error("middleware `{middleware}` rejected action `{action_type}`: {source}")]
    MiddlewareFailed {
        middleware: String,
        action_type: String,
        #[source]
        source: BoxError,
    },
}

impl DispatchError {
    /// Wrap an arbitrary error raised inside a middleware
    pub fn middleware(
        middleware: impl Into<String>,
        action_type: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::MiddlewareFailed {
            middleware: middleware.into(),
            action_type: action_type.into(),
            source: source.into(),
        }
    }

    /// Action type whose dispatch failed
    pub fn action_type(&self) -> &str {
        match self {
            Self::HandlerFailed { action_type, .. } | Self::MiddlewareFailed { action_type, .. } => {
                action_type
            }
        }
    }
}

/// Malformed handler or flow configuration, reported at registration time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("handler registered for an empty action type")]
    EmptyActionType,

    #[error("action type `{0}` is listed twice in one handler map")]
    DuplicateHandler(String),

    #[error("flow registered with an empty name")]
    EmptyFlowName,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_failed_message_names_type_and_position() {
        let err = DispatchError::HandlerFailed {
            action_type: "SAVE".to_string(),
            index: 1,
            source: "disk full".into(),
        };
        assert_eq!(
            err.to_string(),
            "handler #1 for action type `SAVE` failed: disk full"
        );
        assert_eq!(err.action_type(), "SAVE");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_middleware_helper() {
        let err = DispatchError::middleware("auth", "DELETE", "not allowed");
        assert_eq!(
            err.to_string(),
            "middleware `auth` rejected action `DELETE`: not allowed"
        );
    }
}
