//! Log-backed notification adapter.
//!
//! Breaches go out at warn level, phase transitions at info. A dedicated
//! alerting channel can replace this by implementing the same port.

use crate::domain::challenge::ChallengePhase;
use crate::domain::drawdown::RiskEvent;
use crate::domain::error::EquitywatchError;
use crate::ports::notification_port::NotificationPort;
use chrono::{DateTime, Utc};

#[derive(Debug, Default)]
pub struct LogNotificationAdapter;

impl LogNotificationAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl NotificationPort for LogNotificationAdapter {
    fn notify_breach(&self, event: &RiskEvent) -> Result<(), EquitywatchError> {
        log::warn!(
            "account {} breached max loss limit: drawdown {:.2} >= limit {:.2} at {}",
            event.account_id,
            event.drawdown,
            event.limit,
            event.timestamp
        );
        Ok(())
    }

    fn notify_phase(
        &self,
        account_id: &str,
        phase: ChallengePhase,
        timestamp: DateTime<Utc>,
    ) -> Result<(), EquitywatchError> {
        log::info!("account {} entered phase {} at {}", account_id, phase, timestamp);
        Ok(())
    }
}
