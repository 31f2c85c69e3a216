//! Review orchestration: fetch, aggregate, monitor, track, notify.
//!
//! One [`ReviewEngine`] owns the caller-side state the evaluators need
//! between passes: the drawdown and challenge tables, per-account last-seen
//! timestamps for stale-sample rejection, and an in-memory equity history for
//! display collaborators. Scheduling (poll timer, on-demand trigger) stays
//! with the caller.

use crate::domain::account::AccountConfig;
use crate::domain::challenge::{ChallengeBook, ChallengePhase};
use crate::domain::drawdown::{DrawdownEvaluation, DrawdownState, MonitorBook};
use crate::domain::equity::compute_equity;
use crate::domain::error::EquitywatchError;
use crate::ports::ledger_port::{LedgerPort, LedgerSnapshot};
use crate::ports::notification_port::NotificationPort;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// One applied equity sample, kept for display.
#[derive(Debug, Clone)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
}

/// Per-account outcome of one review pass.
#[derive(Debug, Clone)]
pub struct AccountReview {
    pub account_id: String,
    pub equity: f64,
    pub drawdown: DrawdownEvaluation,
    /// `None` for non-prop-firm accounts.
    pub phase: Option<ChallengePhase>,
}

#[derive(Debug, Default)]
pub struct ReviewEngine {
    monitors: MonitorBook,
    challenges: ChallengeBook,
    last_seen: HashMap<String, DateTime<Utc>>,
    history: HashMap<String, Vec<EquityPoint>>,
}

impl ReviewEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Review one account against an already-fetched ledger snapshot.
    ///
    /// Returns `Ok(None)` when the sample is stale (older than the last
    /// applied timestamp for this account); nothing is mutated in that case.
    /// Re-presenting the last applied timestamp is allowed and idempotent.
    pub fn review_account(
        &mut self,
        config: &AccountConfig,
        snapshot: &LedgerSnapshot,
        sink: &dyn NotificationPort,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<AccountReview>, EquitywatchError> {
        if let Some(last) = self.last_seen.get(&config.id) {
            if timestamp < *last {
                log::debug!(
                    "discarding stale sample for {}: {} < {}",
                    config.id,
                    timestamp,
                    last
                );
                return Ok(None);
            }
        }

        if !config.active && self.monitors.evict(&config.id).is_some() {
            log::debug!("evicted monitor state for deactivated account {}", config.id);
        }

        let equity = compute_equity(config, &snapshot.trades, &snapshot.transactions);

        let drawdown = self.monitors.evaluate(config, equity, timestamp)?;
        if let DrawdownEvaluation::Evaluated {
            event: Some(ref event),
            ..
        } = drawdown
        {
            sink.notify_breach(event)?;
        }

        let phase = if config.prop_firm {
            let previous = self.challenges.phase(&config.id);
            let phase = self
                .challenges
                .evaluate(config, equity, drawdown.is_breached());
            if previous != Some(phase) && phase != ChallengePhase::Evaluating {
                sink.notify_phase(&config.id, phase, timestamp)?;
            }
            Some(phase)
        } else {
            None
        };

        self.last_seen.insert(config.id.clone(), timestamp);
        let history = self.history.entry(config.id.clone()).or_default();
        if history.last().map(|p| p.timestamp) != Some(timestamp) {
            history.push(EquityPoint { timestamp, equity });
        }

        Ok(Some(AccountReview {
            account_id: config.id.clone(),
            equity,
            drawdown,
            phase,
        }))
    }

    /// One pass over every account the ledger knows, or a single account when
    /// a filter is given.
    ///
    /// Fetch failures propagate; a failed fetch is never treated as an empty
    /// ledger.
    pub fn review_all(
        &mut self,
        ledger: &dyn LedgerPort,
        sink: &dyn NotificationPort,
        account_filter: Option<&str>,
        timestamp: DateTime<Utc>,
    ) -> Result<Vec<AccountReview>, EquitywatchError> {
        let mut accounts = ledger.fetch_accounts()?;
        if let Some(filter) = account_filter {
            accounts.retain(|a| a.id == filter);
            if accounts.is_empty() {
                return Err(EquitywatchError::NoSuchAccount {
                    account_id: filter.to_string(),
                });
            }
        }

        let mut reviews = Vec::with_capacity(accounts.len());
        for config in &accounts {
            let snapshot = ledger.fetch_ledger(&config.id)?;
            if let Some(review) = self.review_account(config, &snapshot, sink, timestamp)? {
                reviews.push(review);
            }
        }
        Ok(reviews)
    }

    /// Explicit external promotion of a passed prop-firm account to funded.
    pub fn promote_funded(&mut self, account_id: &str) -> Option<ChallengePhase> {
        self.challenges.promote(account_id)
    }

    pub fn drawdown_state(&self, account_id: &str) -> Option<&DrawdownState> {
        self.monitors.state(account_id)
    }

    pub fn phase(&self, account_id: &str) -> Option<ChallengePhase> {
        self.challenges.phase(account_id)
    }

    pub fn history(&self, account_id: &str) -> &[EquityPoint] {
        self.history
            .get(account_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::drawdown::RiskEvent;
    use crate::domain::ledger::{TradeRecord, TradeStatus, TransactionKind, TransactionRecord};
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingSink {
        breaches: RefCell<Vec<RiskEvent>>,
        phases: RefCell<Vec<(String, ChallengePhase)>>,
    }

    impl NotificationPort for RecordingSink {
        fn notify_breach(&self, event: &RiskEvent) -> Result<(), EquitywatchError> {
            self.breaches.borrow_mut().push(event.clone());
            Ok(())
        }

        fn notify_phase(
            &self,
            account_id: &str,
            phase: ChallengePhase,
            _timestamp: DateTime<Utc>,
        ) -> Result<(), EquitywatchError> {
            self.phases
                .borrow_mut()
                .push((account_id.to_string(), phase));
            Ok(())
        }
    }

    fn ts(day: u32) -> DateTime<Utc> {
        chrono::NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
            .and_utc()
    }

    fn monitored_account() -> AccountConfig {
        AccountConfig {
            id: "acct-1".to_string(),
            initial_balance: 10_000.0,
            active: true,
            prop_firm: false,
            max_loss_limit: Some(1_000.0),
            profit_target: None,
        }
    }

    fn snapshot_with_pnl(pnl: f64) -> LedgerSnapshot {
        LedgerSnapshot {
            trades: vec![TradeRecord {
                id: "t-1".into(),
                account_id: "acct-1".into(),
                pnl,
                status: TradeStatus::Closed,
            }],
            transactions: vec![],
        }
    }

    #[test]
    fn review_computes_equity_from_snapshot() {
        let mut engine = ReviewEngine::new();
        let sink = RecordingSink::default();
        let account = monitored_account();
        let snapshot = LedgerSnapshot {
            trades: vec![TradeRecord {
                id: "t-1".into(),
                account_id: "acct-1".into(),
                pnl: 500.0,
                status: TradeStatus::Closed,
            }],
            transactions: vec![TransactionRecord {
                id: "x-1".into(),
                account_id: "acct-1".into(),
                amount: 250.0,
                kind: TransactionKind::Deposit,
            }],
        };

        let review = engine
            .review_account(&account, &snapshot, &sink, ts(1))
            .unwrap()
            .unwrap();
        assert!((review.equity - 10_750.0).abs() < 1e-9);
        assert!(review.phase.is_none());
    }

    #[test]
    fn breach_is_forwarded_to_sink_once() {
        let mut engine = ReviewEngine::new();
        let sink = RecordingSink::default();
        let account = monitored_account();

        engine
            .review_account(&account, &snapshot_with_pnl(-1_200.0), &sink, ts(1))
            .unwrap();
        engine
            .review_account(&account, &snapshot_with_pnl(-1_300.0), &sink, ts(2))
            .unwrap();

        assert_eq!(sink.breaches.borrow().len(), 1);
        assert_eq!(sink.breaches.borrow()[0].account_id, "acct-1");
    }

    #[test]
    fn stale_sample_is_discarded_without_state_change() {
        let mut engine = ReviewEngine::new();
        let sink = RecordingSink::default();
        let account = monitored_account();

        engine
            .review_account(&account, &snapshot_with_pnl(200.0), &sink, ts(5))
            .unwrap();
        let peak_before = engine.drawdown_state("acct-1").unwrap().peak_equity;

        let stale = engine
            .review_account(&account, &snapshot_with_pnl(-5_000.0), &sink, ts(2))
            .unwrap();
        assert!(stale.is_none());
        assert!(sink.breaches.borrow().is_empty());
        let state = engine.drawdown_state("acct-1").unwrap();
        assert!((state.peak_equity - peak_before).abs() < f64::EPSILON);
        assert!(!state.breached);
        assert_eq!(engine.history("acct-1").len(), 1);
    }

    #[test]
    fn equal_timestamp_replay_is_idempotent() {
        let mut engine = ReviewEngine::new();
        let sink = RecordingSink::default();
        let account = monitored_account();

        engine
            .review_account(&account, &snapshot_with_pnl(-1_200.0), &sink, ts(1))
            .unwrap();
        let replay = engine
            .review_account(&account, &snapshot_with_pnl(-1_200.0), &sink, ts(1))
            .unwrap();

        assert!(replay.is_some());
        assert_eq!(sink.breaches.borrow().len(), 1);
        assert_eq!(engine.history("acct-1").len(), 1);
    }

    #[test]
    fn deactivation_evicts_monitor_state() {
        let mut engine = ReviewEngine::new();
        let sink = RecordingSink::default();
        let active = monitored_account();

        engine
            .review_account(&active, &snapshot_with_pnl(-1_200.0), &sink, ts(1))
            .unwrap();
        assert!(engine.drawdown_state("acct-1").is_some());

        let inactive = AccountConfig {
            active: false,
            ..monitored_account()
        };
        let review = engine
            .review_account(&inactive, &snapshot_with_pnl(-1_200.0), &sink, ts(2))
            .unwrap()
            .unwrap();
        assert!(matches!(review.drawdown, DrawdownEvaluation::NotMonitored));
        assert!(engine.drawdown_state("acct-1").is_none());
    }

    #[test]
    fn prop_firm_phase_transitions_notify() {
        let mut engine = ReviewEngine::new();
        let sink = RecordingSink::default();
        let account = AccountConfig {
            prop_firm: true,
            profit_target: Some(1_000.0),
            ..monitored_account()
        };

        // Still evaluating: no phase notification.
        engine
            .review_account(&account, &snapshot_with_pnl(500.0), &sink, ts(1))
            .unwrap();
        assert!(sink.phases.borrow().is_empty());

        let review = engine
            .review_account(&account, &snapshot_with_pnl(1_050.0), &sink, ts(2))
            .unwrap()
            .unwrap();
        assert_eq!(review.phase, Some(ChallengePhase::Passed));
        assert_eq!(
            sink.phases.borrow().as_slice(),
            &[("acct-1".to_string(), ChallengePhase::Passed)]
        );

        // Re-reviewing a passed account does not re-notify.
        engine
            .review_account(&account, &snapshot_with_pnl(1_100.0), &sink, ts(3))
            .unwrap();
        assert_eq!(sink.phases.borrow().len(), 1);
    }

    #[test]
    fn promote_funded_passes_through() {
        let mut engine = ReviewEngine::new();
        let sink = RecordingSink::default();
        let account = AccountConfig {
            prop_firm: true,
            profit_target: Some(1_000.0),
            ..monitored_account()
        };

        engine
            .review_account(&account, &snapshot_with_pnl(1_500.0), &sink, ts(1))
            .unwrap();
        assert_eq!(
            engine.promote_funded("acct-1"),
            Some(ChallengePhase::Funded)
        );
        assert_eq!(engine.phase("acct-1"), Some(ChallengePhase::Funded));
    }

    #[test]
    fn history_records_applied_samples() {
        let mut engine = ReviewEngine::new();
        let sink = RecordingSink::default();
        let account = monitored_account();

        engine
            .review_account(&account, &snapshot_with_pnl(100.0), &sink, ts(1))
            .unwrap();
        engine
            .review_account(&account, &snapshot_with_pnl(200.0), &sink, ts(2))
            .unwrap();

        let history = engine.history("acct-1");
        assert_eq!(history.len(), 2);
        assert!((history[0].equity - 10_100.0).abs() < 1e-9);
        assert!((history[1].equity - 10_200.0).abs() < 1e-9);
        assert!(engine.history("unknown").is_empty());
    }
}
