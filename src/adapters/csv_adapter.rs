//! CSV file ledger adapter.
//!
//! Reads three files under one base directory: `accounts.csv`, `trades.csv`
//! and `transactions.csv`. Headers are required; rows for other accounts are
//! filtered out at fetch time.

use crate::domain::account::AccountConfig;
use crate::domain::error::EquitywatchError;
use crate::domain::ledger::{TradeRecord, TradeStatus, TransactionKind, TransactionRecord};
use crate::ports::ledger_port::{LedgerPort, LedgerSnapshot};
use std::fs;
use std::path::PathBuf;

#[derive(Debug)]
pub struct CsvLedgerAdapter {
    base_path: PathBuf,
}

impl CsvLedgerAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn read_file(&self, name: &str) -> Result<String, EquitywatchError> {
        let path = self.base_path.join(name);
        fs::read_to_string(&path).map_err(|e| EquitywatchError::Database {
            reason: format!("failed to read {}: {}", path.display(), e),
        })
    }
}

fn field<'r>(
    record: &'r csv::StringRecord,
    idx: usize,
    name: &str,
) -> Result<&'r str, EquitywatchError> {
    record.get(idx).ok_or_else(|| EquitywatchError::Database {
        reason: format!("missing {} column", name),
    })
}

fn parse_f64(record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64, EquitywatchError> {
    field(record, idx, name)?
        .trim()
        .parse()
        .map_err(|e| EquitywatchError::Database {
            reason: format!("invalid {} value: {}", name, e),
        })
}

fn parse_opt_f64(
    record: &csv::StringRecord,
    idx: usize,
    name: &str,
) -> Result<Option<f64>, EquitywatchError> {
    match record.get(idx) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| EquitywatchError::Database {
                reason: format!("invalid {} value: {}", name, e),
            }),
    }
}

fn parse_bool(record: &csv::StringRecord, idx: usize, name: &str) -> Result<bool, EquitywatchError> {
    match field(record, idx, name)?.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        other => Err(EquitywatchError::Database {
            reason: format!("invalid {} value: {}", name, other),
        }),
    }
}

impl LedgerPort for CsvLedgerAdapter {
    fn fetch_accounts(&self) -> Result<Vec<AccountConfig>, EquitywatchError> {
        let content = self.read_file("accounts.csv")?;
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut accounts = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| EquitywatchError::Database {
                reason: format!("CSV parse error: {}", e),
            })?;

            let id = field(&record, 0, "id")?.trim().to_string();
            let initial_balance = parse_f64(&record, 1, "initial_balance")?;
            let active = parse_bool(&record, 2, "active")?;
            let prop_firm = parse_bool(&record, 3, "prop_firm")?;
            let max_loss_limit = parse_opt_f64(&record, 4, "max_loss_limit")?;
            let profit_target = parse_opt_f64(&record, 5, "profit_target")?;

            accounts.push(AccountConfig {
                id,
                initial_balance,
                active,
                prop_firm,
                max_loss_limit,
                profit_target,
            });
        }

        Ok(accounts)
    }

    fn fetch_ledger(&self, account_id: &str) -> Result<LedgerSnapshot, EquitywatchError> {
        let trades_content = self.read_file("trades.csv")?;
        let mut rdr = csv::Reader::from_reader(trades_content.as_bytes());
        let mut trades = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| EquitywatchError::Database {
                reason: format!("CSV parse error: {}", e),
            })?;

            let owner = field(&record, 1, "account_id")?.trim();
            if owner != account_id {
                continue;
            }

            let id = field(&record, 0, "id")?.trim().to_string();
            let pnl = parse_f64(&record, 2, "pnl")?;
            let status: TradeStatus =
                field(&record, 3, "status")?
                    .parse()
                    .map_err(|reason: String| EquitywatchError::Database { reason })?;

            trades.push(TradeRecord {
                id,
                account_id: owner.to_string(),
                pnl,
                status,
            });
        }

        let txn_content = self.read_file("transactions.csv")?;
        let mut rdr = csv::Reader::from_reader(txn_content.as_bytes());
        let mut transactions = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| EquitywatchError::Database {
                reason: format!("CSV parse error: {}", e),
            })?;

            let owner = field(&record, 1, "account_id")?.trim();
            if owner != account_id {
                continue;
            }

            let id = field(&record, 0, "id")?.trim().to_string();
            let amount = parse_f64(&record, 2, "amount")?;
            if amount < 0.0 {
                return Err(EquitywatchError::MalformedSample {
                    account_id: account_id.to_string(),
                    reason: format!("transaction {} has negative amount {}", id, amount),
                });
            }
            let kind: TransactionKind =
                field(&record, 3, "kind")?
                    .parse()
                    .map_err(|reason: String| EquitywatchError::Database { reason })?;

            transactions.push(TransactionRecord {
                id,
                account_id: owner.to_string(),
                amount,
                kind,
            });
        }

        Ok(LedgerSnapshot {
            trades,
            transactions,
        })
    }
}
