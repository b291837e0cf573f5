//! Actions - typed messages describing an intended state change

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// An action routed to the handlers registered for its `action_type`.
///
/// The payload is opaque to the engine. The default payload type is
/// [`serde_json::Value`] for stores that carry arbitrary data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action<P = Value> {
    /// Dispatch key
    #[serde(rename = "type")]
    pub action_type: String,
    pub payload: P,
}

impl<P> Action<P> {
    pub fn new(action_type: impl Into<String>, payload: P) -> Self {
        Self {
            action_type: action_type.into(),
            payload,
        }
    }
}

impl<P: Default> Action<P> {
    /// Action without a meaningful payload (the payload type's default)
    pub fn bare(action_type: impl Into<String>) -> Self {
        Self::new(action_type, P::default())
    }
}

impl<P> fmt::Display for Action<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.action_type)
    }
}
