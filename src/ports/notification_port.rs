//! Notification port trait.

use crate::domain::challenge::ChallengePhase;
use crate::domain::drawdown::RiskEvent;
use crate::domain::error::EquitywatchError;
use chrono::{DateTime, Utc};

/// Sink for risk events and challenge transitions.
pub trait NotificationPort {
    fn notify_breach(&self, event: &RiskEvent) -> Result<(), EquitywatchError>;

    /// Default implementation: phase transitions are ignored. Sinks that only
    /// care about breaches need not override this.
    fn notify_phase(
        &self,
        _account_id: &str,
        _phase: ChallengePhase,
        _timestamp: DateTime<Utc>,
    ) -> Result<(), EquitywatchError> {
        Ok(())
    }
}
