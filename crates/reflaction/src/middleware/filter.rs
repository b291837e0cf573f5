//! FilterMiddleware - lets an action through only when a predicate holds

use super::Middleware;
use crate::action::Action;
use crate::dispatch::Dispatch;
use crate::state::StateReader;
use std::rc::Rc;

/// Blocks actions for which `predicate(action, state)` is false
///
/// A blocked action never reaches the rest of the chain; dispatch returns the
/// current state as-is.
pub struct FilterMiddleware<F> {
    predicate: Rc<F>,
}

impl<F> FilterMiddleware<F> {
    pub fn new(predicate: F) -> Self {
        Self {
            predicate: Rc::new(predicate),
        }
    }
}

impl<S, P, F> Middleware<S, P> for FilterMiddleware<F>
where
    S: Clone + 'static,
    P: 'static,
    F: Fn(&Action<P>, &S) -> bool + 'static,
{
    fn wrap(&self, next: Dispatch<S, P>, state: StateReader<S>) -> Dispatch<S, P> {
        let predicate = self.predicate.clone();
        Dispatch::new(move |action: Action<P>| {
            let current = state.get();
            if predicate(&action, &current) {
                next.dispatch(action)
            } else {
                log::debug!("Action {} blocked by filter", action.action_type);
                Ok(current)
            }
        })
    }

    fn name(&self) -> &str {
        "filter"
    }
}

/// Boxed [`FilterMiddleware`]
pub fn filter<S, P, F>(predicate: F) -> Box<dyn Middleware<S, P>>
where
    S: Clone + 'static,
    P: 'static,
    F: Fn(&Action<P>, &S) -> bool + 'static,
{
    Box::new(FilterMiddleware::new(predicate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateCell;
    use std::cell::Cell;

    #[test]
    fn test_filter_blocks_and_passes() {
        let cell = Rc::new(StateCell::new(3i64));
        let reached = Rc::new(Cell::new(0));
        let next = Dispatch::new({
            let reached = reached.clone();
            move |action: Action<i64>| {
                reached.set(reached.get() + 1);
                Ok(action.payload)
            }
        });

        let guard = filter(|action: &Action<i64>, state: &i64| action.payload >= *state);
        let dispatch = guard.wrap(next, StateReader::new(cell));

        assert_eq!(dispatch.dispatch(Action::new("SET", 1)).unwrap(), 3);
        assert_eq!(reached.get(), 0);
        assert_eq!(dispatch.dispatch(Action::new("SET", 4)).unwrap(), 4);
        assert_eq!(reached.get(), 1);
    }

    #[test]
    fn test_predicate_may_dispatch() {
        let cell = Rc::new(StateCell::new(0i64));
        let next = Dispatch::new({
            let cell = cell.clone();
            move |action: Action<i64>| {
                cell.commit(action.payload);
                Ok(action.payload)
            }
        });
        let side = next.clone();

        let guard = filter(move |action: &Action<i64>, _: &i64| {
            if action.action_type == "AUDITED" {
                side.dispatch(Action::new("AUDIT", -1)).is_ok()
            } else {
                true
            }
        });
        let dispatch = guard.wrap(next, StateReader::new(cell.clone()));

        assert_eq!(dispatch.dispatch(Action::new("AUDITED", 7)).unwrap(), 7);
        assert_eq!(cell.get(), 7);
    }
}
