//! Counter store: state, handlers, middleware and flows

use crate::config::DemoConfig;
use reflaction::middleware::filter;
use reflaction::{
    Action, ConfigError, Dispatch, DispatchError, FlowMap, HandlerMap, LoggingMiddleware, Store,
    StoreConfig,
};
use serde::Serialize;
use std::time::Duration;

pub const INCREMENT: &str = "INCREMENT";
pub const DECREMENT: &str = "DECREMENT";
pub const RESET: &str = "RESET";

/// Entries kept in the history slice
const HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CounterState {
    pub count: i64,
    /// Most recent counts, oldest first
    pub history: Vec<i64>,
}

fn count_handlers() -> HandlerMap<CounterState, i64> {
    HandlerMap::new()
        .try_on(INCREMENT, |state: CounterState, by: &i64| -> Result<_, &'static str> {
            let count = state.count.checked_add(*by).ok_or("count overflow")?;
            Ok(CounterState { count, ..state })
        })
        .try_on(DECREMENT, |state: CounterState, by: &i64| -> Result<_, &'static str> {
            let count = state.count.checked_sub(*by).ok_or("count overflow")?;
            Ok(CounterState { count, ..state })
        })
        .on(RESET, |state: CounterState, _: &i64| CounterState { count: 0, ..state })
}

fn record(mut state: CounterState, _: &i64) -> CounterState {
    state.history.push(state.count);
    if state.history.len() > HISTORY_LIMIT {
        state.history.remove(0);
    }
    state
}

// Runs after count_handlers, so it records the updated count
fn history_handlers() -> HandlerMap<CounterState, i64> {
    HandlerMap::new()
        .on(INCREMENT, record)
        .on(DECREMENT, record)
        .on(RESET, record)
}

fn flows(delay: Duration) -> FlowMap<CounterState, i64> {
    FlowMap::new()
        .flow("double", |dispatch: Dispatch<CounterState, i64>, by: i64| {
            dispatch.dispatch(Action::new(INCREMENT, by))?;
            dispatch.dispatch(Action::new(INCREMENT, by))?;
            Ok(())
        })
        .spawn(
            "delayed",
            move |dispatch: Dispatch<CounterState, i64>, by: i64| async move {
                tokio::time::sleep(delay).await;
                dispatch.dispatch(Action::new(INCREMENT, by))?;
                Ok::<(), DispatchError>(())
            },
        )
        .spawn(
            "countdown",
            move |dispatch: Dispatch<CounterState, i64>, to: i64| async move {
                let mut state = dispatch.dispatch(Action::new(DECREMENT, 0))?;
                while state.count > to {
                    tokio::time::sleep(delay).await;
                    state = dispatch.dispatch(Action::new(DECREMENT, 1))?;
                }
                Ok::<(), DispatchError>(())
            },
        )
}

pub fn build_store(config: &DemoConfig) -> Result<Store<CounterState, i64>, ConfigError> {
    let max_count = config.max_count;
    let initial_state = CounterState {
        count: config.initial_count,
        history: Vec::new(),
    };

    Store::new(
        StoreConfig::new(initial_state)
            .action_handlers(vec![count_handlers(), history_handlers()])
            .action_flows(flows(Duration::from_millis(config.flow_delay_ms)))
            .middleware(LoggingMiddleware::new())
            .boxed_middleware(filter(
                move |action: &Action<i64>, state: &CounterState| {
                    // Overflowing sums are left to the handler, which rejects them
                    let allowed = action.action_type != INCREMENT
                        || state
                            .count
                            .checked_add(action.payload)
                            .is_none_or(|next| next <= max_count);
                    if !allowed {
                        log::warn!("Blocked increment past {}", max_count);
                    }
                    allowed
                },
            )),
    )
}
