#![allow(dead_code)]

use chrono::{DateTime, Utc};
use equitywatch::domain::account::AccountConfig;
use equitywatch::domain::challenge::ChallengePhase;
use equitywatch::domain::drawdown::RiskEvent;
use equitywatch::domain::error::EquitywatchError;
pub use equitywatch::domain::ledger::{
    TradeRecord, TradeStatus, TransactionKind, TransactionRecord,
};
use equitywatch::ports::ledger_port::{LedgerPort, LedgerSnapshot};
use equitywatch::ports::notification_port::NotificationPort;
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Debug)]
pub struct MockLedgerPort {
    pub accounts: Vec<AccountConfig>,
    pub ledgers: HashMap<String, LedgerSnapshot>,
    pub errors: HashMap<String, String>,
    pub accounts_error: Option<String>,
}

impl MockLedgerPort {
    pub fn new() -> Self {
        Self {
            accounts: Vec::new(),
            ledgers: HashMap::new(),
            errors: HashMap::new(),
            accounts_error: None,
        }
    }

    pub fn with_account(mut self, account: AccountConfig) -> Self {
        self.accounts.push(account);
        self
    }

    pub fn with_trades(mut self, account_id: &str, trades: Vec<TradeRecord>) -> Self {
        self.ledgers.entry(account_id.to_string()).or_default().trades = trades;
        self
    }

    pub fn with_transactions(
        mut self,
        account_id: &str,
        transactions: Vec<TransactionRecord>,
    ) -> Self {
        self.ledgers
            .entry(account_id.to_string())
            .or_default()
            .transactions = transactions;
        self
    }

    pub fn with_error(mut self, account_id: &str, reason: &str) -> Self {
        self.errors
            .insert(account_id.to_string(), reason.to_string());
        self
    }

    pub fn with_accounts_error(mut self, reason: &str) -> Self {
        self.accounts_error = Some(reason.to_string());
        self
    }
}

impl LedgerPort for MockLedgerPort {
    fn fetch_accounts(&self) -> Result<Vec<AccountConfig>, EquitywatchError> {
        if let Some(reason) = &self.accounts_error {
            return Err(EquitywatchError::Database {
                reason: reason.clone(),
            });
        }
        Ok(self.accounts.clone())
    }

    fn fetch_ledger(&self, account_id: &str) -> Result<LedgerSnapshot, EquitywatchError> {
        if let Some(reason) = self.errors.get(account_id) {
            return Err(EquitywatchError::Database {
                reason: reason.clone(),
            });
        }
        Ok(self.ledgers.get(account_id).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct RecordingNotificationSink {
    pub breaches: RefCell<Vec<RiskEvent>>,
    pub phases: RefCell<Vec<(String, ChallengePhase)>>,
}

impl RecordingNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NotificationPort for RecordingNotificationSink {
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

pub fn make_account(id: &str) -> AccountConfig {
    AccountConfig {
        id: id.to_string(),
        initial_balance: 10_000.0,
        active: true,
        prop_firm: false,
        max_loss_limit: Some(1_000.0),
        profit_target: None,
    }
}

pub fn make_prop_firm_account(id: &str) -> AccountConfig {
    AccountConfig {
        prop_firm: true,
        profit_target: Some(1_000.0),
        ..make_account(id)
    }
}

pub fn make_trade(account_id: &str, id: &str, pnl: f64) -> TradeRecord {
    TradeRecord {
        id: id.to_string(),
        account_id: account_id.to_string(),
        pnl,
        status: TradeStatus::Closed,
    }
}

pub fn make_open_trade(account_id: &str, id: &str, pnl: f64) -> TradeRecord {
    TradeRecord {
        id: id.to_string(),
        account_id: account_id.to_string(),
        pnl,
        status: TradeStatus::Open,
    }
}

pub fn make_txn(account_id: &str, id: &str, kind: TransactionKind, amount: f64) -> TransactionRecord {
    TransactionRecord {
        id: id.to_string(),
        account_id: account_id.to_string(),
        amount,
        kind,
    }
}

pub fn ts(day: u32) -> DateTime<Utc> {
    chrono::NaiveDate::from_ymd_opt(2024, 3, day)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
        .and_utc()
}
