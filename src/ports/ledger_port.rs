//! Ledger access port trait.

use crate::domain::account::AccountConfig;
use crate::domain::error::EquitywatchError;
use crate::domain::ledger::{TradeRecord, TransactionRecord};

/// All records relevant to one account's equity, fetched under one logical
/// read. Implementors must not return a partially fetched snapshot.
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    pub trades: Vec<TradeRecord>,
    pub transactions: Vec<TransactionRecord>,
}

pub trait LedgerPort: std::fmt::Debug {
    fn fetch_accounts(&self) -> Result<Vec<AccountConfig>, EquitywatchError>;

    fn fetch_ledger(&self, account_id: &str) -> Result<LedgerSnapshot, EquitywatchError>;
}
