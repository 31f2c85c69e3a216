//! Trailing drawdown monitoring.
//!
//! Monitor state lives in a caller-owned [`MonitorBook`] keyed by account id,
//! passed into each evaluation. Creation happens on the first evaluated
//! sample, teardown through [`MonitorBook::evict`]. The book performs no I/O;
//! breach events are returned to the caller, which forwards them to a
//! notification sink.

use crate::domain::account::AccountConfig;
use crate::domain::error::EquitywatchError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Per-account monitor state for the lifetime of monitoring.
#[derive(Debug, Clone)]
pub struct DrawdownState {
    /// Highest equity observed. Never lowered once raised.
    pub peak_equity: f64,
    /// `max(0, peak - current)` as of the last evaluated sample.
    pub drawdown: f64,
    /// Sticky: equity recovering above the limit does not clear it.
    pub breached: bool,
    pub breached_at: Option<DateTime<Utc>>,
}

impl DrawdownState {
    fn new(initial_balance: f64) -> Self {
        Self {
            peak_equity: initial_balance,
            drawdown: 0.0,
            breached: false,
            breached_at: None,
        }
    }
}

/// Emitted once per account on the not-breached to breached transition.
#[derive(Debug, Clone)]
pub struct RiskEvent {
    pub account_id: String,
    pub drawdown: f64,
    pub limit: f64,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of evaluating one equity sample.
#[derive(Debug, Clone)]
pub enum DrawdownEvaluation {
    /// The account is inactive or has no loss limit; nothing was recorded.
    NotMonitored,
    Evaluated {
        drawdown: f64,
        breached: bool,
        /// Present only on the breach transition itself.
        event: Option<RiskEvent>,
    },
}

impl DrawdownEvaluation {
    pub fn is_breached(&self) -> bool {
        matches!(self, DrawdownEvaluation::Evaluated { breached: true, .. })
    }
}

/// Caller-owned table of per-account drawdown state.
#[derive(Debug, Default)]
pub struct MonitorBook {
    states: HashMap<String, DrawdownState>,
}

impl MonitorBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate one equity sample for one account.
    ///
    /// Samples must be presented in increasing timestamp order per account;
    /// staleness detection is the caller's job. Re-evaluating an identical
    /// sample is idempotent: the breach event fires only on the transition.
    pub fn evaluate(
        &mut self,
        config: &AccountConfig,
        current_equity: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<DrawdownEvaluation, EquitywatchError> {
        if !current_equity.is_finite() {
            return Err(EquitywatchError::MalformedSample {
                account_id: config.id.clone(),
                reason: format!("current equity is not finite: {current_equity}"),
            });
        }
        if !config.initial_balance.is_finite() {
            return Err(EquitywatchError::MalformedSample {
                account_id: config.id.clone(),
                reason: format!("initial balance is not finite: {}", config.initial_balance),
            });
        }

        let limit = match config.max_loss_limit {
            Some(limit) if config.active => limit,
            _ => return Ok(DrawdownEvaluation::NotMonitored),
        };

        let state = self
            .states
            .entry(config.id.clone())
            .or_insert_with(|| DrawdownState::new(config.initial_balance));

        if current_equity > state.peak_equity {
            state.peak_equity = current_equity;
        }
        state.drawdown = (state.peak_equity - current_equity).max(0.0);

        let mut event = None;
        if !state.breached && state.drawdown >= limit {
            state.breached = true;
            state.breached_at = Some(timestamp);
            event = Some(RiskEvent {
                account_id: config.id.clone(),
                drawdown: state.drawdown,
                limit,
                timestamp,
            });
        }

        Ok(DrawdownEvaluation::Evaluated {
            drawdown: state.drawdown,
            breached: state.breached,
            event,
        })
    }

    pub fn state(&self, account_id: &str) -> Option<&DrawdownState> {
        self.states.get(account_id)
    }

    /// Discard an account's monitor state. The explicit teardown/reset path;
    /// the next evaluated sample starts a fresh state.
    pub fn evict(&mut self, account_id: &str) -> Option<DrawdownState> {
        self.states.remove(account_id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
