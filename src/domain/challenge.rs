//! Prop-firm challenge phase tracking.
//!
//! Layered on top of the drawdown monitor: the breach decision for a sample
//! is made first and fed in here. Phase state lives in a caller-owned
//! [`ChallengeBook`] keyed by account id.

use crate::domain::account::AccountConfig;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengePhase {
    Evaluating,
    Passed,
    Failed,
    Funded,
}

impl ChallengePhase {
    /// Failed and Funded accept no further transitions. Passed leaves the
    /// evaluation stage too, but can still be promoted externally.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChallengePhase::Failed | ChallengePhase::Funded)
    }
}

impl fmt::Display for ChallengePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChallengePhase::Evaluating => "evaluating",
            ChallengePhase::Passed => "passed",
            ChallengePhase::Failed => "failed",
            ChallengePhase::Funded => "funded",
        };
        write!(f, "{s}")
    }
}

/// Caller-owned table of per-account challenge phases.
#[derive(Debug, Default)]
pub struct ChallengeBook {
    phases: HashMap<String, ChallengePhase>,
}

impl ChallengeBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate one sample for a prop-firm account, after the drawdown
    /// monitor has seen the same sample.
    ///
    /// The breach check comes first: when a single sample satisfies both the
    /// loss limit and the profit target, the account fails. Without a profit
    /// target the account stays in `Evaluating` (tracking not applicable).
    pub fn evaluate(
        &mut self,
        config: &AccountConfig,
        current_equity: f64,
        drawdown_breached: bool,
    ) -> ChallengePhase {
        let phase = self
            .phases
            .entry(config.id.clone())
            .or_insert(ChallengePhase::Evaluating);

        if *phase != ChallengePhase::Evaluating {
            return *phase;
        }

        if drawdown_breached {
            *phase = ChallengePhase::Failed;
        } else if let Some(target) = config.profit_target {
            if current_equity - config.initial_balance >= target {
                *phase = ChallengePhase::Passed;
            }
        }

        *phase
    }

    /// External promotion of a passed account to funded. Evaluation never
    /// performs this transition. Returns the new phase, or `None` when the
    /// account is unknown or not in `Passed`.
    pub fn promote(&mut self, account_id: &str) -> Option<ChallengePhase> {
        let phase = self.phases.get_mut(account_id)?;
        if *phase != ChallengePhase::Passed {
            return None;
        }
        *phase = ChallengePhase::Funded;
        Some(*phase)
    }

    pub fn phase(&self, account_id: &str) -> Option<ChallengePhase> {
        self.phases.get(account_id).copied()
    }

    pub fn evict(&mut self, account_id: &str) -> Option<ChallengePhase> {
        self.phases.remove(account_id)
    }
}
