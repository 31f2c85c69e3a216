//! PostgreSQL ledger adapter.

use crate::domain::account::AccountConfig;
use crate::domain::error::EquitywatchError;
use crate::domain::ledger::{TradeRecord, TradeStatus, TransactionKind, TransactionRecord};
use crate::ports::config_port::ConfigPort;
use crate::ports::ledger_port::{LedgerPort, LedgerSnapshot};
use postgres::{Client, NoTls};
use std::cell::RefCell;

pub struct PostgresLedgerAdapter {
    client: RefCell<Client>,
}

impl std::fmt::Debug for PostgresLedgerAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresLedgerAdapter").finish_non_exhaustive()
    }
}

impl PostgresLedgerAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, EquitywatchError> {
        // Try [postgres] connection_string first, fall back to [database] conninfo
        let connection_string = config
            .get_str("postgres", "connection_string")
            .or_else(|| config.get_str("database", "conninfo"))
            .ok_or_else(|| EquitywatchError::ConfigMissing {
                section: "database".into(),
                key: "conninfo".into(),
            })?;

        let client =
            Client::connect(&connection_string, NoTls).map_err(|e| EquitywatchError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client: RefCell::new(client),
        })
    }
}

impl LedgerPort for PostgresLedgerAdapter {
    fn fetch_accounts(&self) -> Result<Vec<AccountConfig>, EquitywatchError> {
        let query = "SELECT id, initial_balance::double precision, active, prop_firm, \
                            max_loss_limit::double precision, profit_target::double precision \
                     FROM public.accounts \
                     ORDER BY id ASC";

        let rows = self
            .client
            .borrow_mut()
            .query(query, &[])
            .map_err(|e| EquitywatchError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let accounts: Vec<AccountConfig> = rows
            .into_iter()
            .map(|row| AccountConfig {
                id: row.get(0),
                initial_balance: row.get(1),
                active: row.get(2),
                prop_firm: row.get(3),
                max_loss_limit: row.get(4),
                profit_target: row.get(5),
            })
            .collect();

        Ok(accounts)
    }

    fn fetch_ledger(&self, account_id: &str) -> Result<LedgerSnapshot, EquitywatchError> {
        let mut client = self.client.borrow_mut();

        // One transaction covers both reads so a concurrent writer cannot
        // split the snapshot.
        let mut tx = client
            .transaction()
            .map_err(|e| EquitywatchError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let trade_rows = tx
            .query(
                "SELECT id, account_id, pnl::double precision, status \
                 FROM public.trades WHERE account_id = $1 ORDER BY id ASC",
                &[&account_id],
            )
            .map_err(|e| EquitywatchError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut trades = Vec::new();
        for row in trade_rows {
            let status_str: String = row.get(3);
            let status: TradeStatus =
                status_str
                    .parse()
                    .map_err(|reason: String| EquitywatchError::DatabaseQuery { reason })?;
            trades.push(TradeRecord {
                id: row.get(0),
                account_id: row.get(1),
                pnl: row.get(2),
                status,
            });
        }

        let txn_rows = tx
            .query(
                "SELECT id, account_id, amount::double precision, kind \
                 FROM public.transactions WHERE account_id = $1 ORDER BY id ASC",
                &[&account_id],
            )
            .map_err(|e| EquitywatchError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut transactions = Vec::new();
        for row in txn_rows {
            let kind_str: String = row.get(3);
            let kind: TransactionKind =
                kind_str
                    .parse()
                    .map_err(|reason: String| EquitywatchError::DatabaseQuery { reason })?;
            let txn = TransactionRecord {
                id: row.get(0),
                account_id: row.get(1),
                amount: row.get(2),
                kind,
            };
            if txn.amount < 0.0 {
                return Err(EquitywatchError::MalformedSample {
                    account_id: account_id.to_string(),
                    reason: format!("transaction {} has negative amount {}", txn.id, txn.amount),
                });
            }
            transactions.push(txn);
        }

        tx.commit().map_err(|e| EquitywatchError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(LedgerSnapshot {
            trades,
            transactions,
        })
    }
}
