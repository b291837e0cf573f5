//! Connector - adapts a store handle to a consumer's input shape
//!
//! A consumer declares what it wants to see of the store through a
//! projection. The default projection is the identity: the consumer gets the
//! whole [`StoreHandle`]. The wrapped consumer stays reachable through
//! `Deref`, so its own methods and fields work unchanged on the wrapper.

use crate::store::StoreHandle;
use serde_json::Value;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

type Projection<S, P, T> = Rc<dyn Fn(&StoreHandle<S, P>) -> T>;

/// Projection from a store handle to `T`
pub struct Connector<S, P = Value, T = StoreHandle<S, P>> {
    projection: Projection<S, P, T>,
}

impl<S, P, T> Connector<S, P, T> {
    pub fn new(projection: impl Fn(&StoreHandle<S, P>) -> T + 'static) -> Self {
        Self {
            projection: Rc::new(projection),
        }
    }

    pub fn project(&self, handle: &StoreHandle<S, P>) -> T {
        (self.projection)(handle)
    }

    /// Attach `consumer` to `handle`
    pub fn connect<C>(&self, consumer: C, handle: StoreHandle<S, P>) -> Connected<C, S, P, T> {
        log::debug!("Connecting {} to store", std::any::type_name::<C>());
        Connected {
            consumer,
            handle,
            projection: self.projection.clone(),
        }
    }
}

impl<S: 'static, P: 'static> Connector<S, P, StoreHandle<S, P>> {
    /// Hands the consumer the full handle
    pub fn identity() -> Self {
        Self::new(StoreHandle::clone)
    }
}

impl<S: 'static, P: 'static> Default for Connector<S, P, StoreHandle<S, P>> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<S, P, T> Clone for Connector<S, P, T> {
    fn clone(&self) -> Self {
        Self {
            projection: self.projection.clone(),
        }
    }
}

impl<S, P, T> fmt::Debug for Connector<S, P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("output", &std::any::type_name::<T>())
            .finish()
    }
}

/// A consumer together with the store it is connected to
pub struct Connected<C, S, P = Value, T = StoreHandle<S, P>> {
    consumer: C,
    handle: StoreHandle<S, P>,
    projection: Projection<S, P, T>,
}

impl<C, S, P, T> Connected<C, S, P, T> {
    /// Projection of the store as it is right now
    pub fn props(&self) -> T {
        (self.projection)(&self.handle)
    }

    pub fn handle(&self) -> &StoreHandle<S, P> {
        &self.handle
    }

    /// Type name of the wrapped consumer
    pub fn consumer_name(&self) -> &'static str {
        std::any::type_name::<C>()
    }

    pub fn into_inner(self) -> C {
        self.consumer
    }
}

impl<C, S, P, T> Deref for Connected<C, S, P, T> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.consumer
    }
}

impl<C, S, P, T> DerefMut for Connected<C, S, P, T> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.consumer
    }
}

impl<C: fmt::Debug, S, P, T> fmt::Debug for Connected<C, S, P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connected")
            .field("consumer", &self.consumer)
            .finish_non_exhaustive()
    }
}
