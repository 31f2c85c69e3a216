//! SQLite ledger adapter.

use crate::domain::account::AccountConfig;
use crate::domain::error::EquitywatchError;
use crate::domain::ledger::{TradeRecord, TradeStatus, TransactionKind, TransactionRecord};
use crate::ports::config_port::ConfigPort;
use crate::ports::ledger_port::{LedgerPort, LedgerSnapshot};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

#[derive(Debug)]
pub struct SqliteLedgerAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteLedgerAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, EquitywatchError> {
        let db_path =
            config
                .get_str("sqlite", "path")
                .ok_or_else(|| EquitywatchError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_i64("sqlite", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| EquitywatchError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, EquitywatchError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| EquitywatchError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), EquitywatchError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| EquitywatchError::Database {
                reason: e.to_string(),
            })?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                initial_balance REAL NOT NULL,
                active INTEGER NOT NULL,
                prop_firm INTEGER NOT NULL,
                max_loss_limit REAL,
                profit_target REAL
            );
            CREATE TABLE IF NOT EXISTS trades (
                id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL,
                pnl REAL NOT NULL,
                status TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS transactions (
                id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL,
                amount REAL NOT NULL,
                kind TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_trades_account ON trades(account_id);
            CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id);",
        )
        .map_err(|e: rusqlite::Error| EquitywatchError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }

    pub fn insert_accounts(&self, accounts: &[AccountConfig]) -> Result<(), EquitywatchError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| EquitywatchError::Database {
                reason: e.to_string(),
            })?;

        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| EquitywatchError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        for account in accounts {
            tx.execute(
                "INSERT OR REPLACE INTO accounts
                 (id, initial_balance, active, prop_firm, max_loss_limit, profit_target)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    account.id,
                    account.initial_balance,
                    account.active,
                    account.prop_firm,
                    account.max_loss_limit,
                    account.profit_target
                ],
            )
            .map_err(|e: rusqlite::Error| EquitywatchError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| EquitywatchError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(())
    }

    pub fn insert_trades(&self, trades: &[TradeRecord]) -> Result<(), EquitywatchError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| EquitywatchError::Database {
                reason: e.to_string(),
            })?;

        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| EquitywatchError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        for trade in trades {
            tx.execute(
                "INSERT OR REPLACE INTO trades (id, account_id, pnl, status)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    trade.id,
                    trade.account_id,
                    trade.pnl,
                    trade.status.to_string()
                ],
            )
            .map_err(|e: rusqlite::Error| EquitywatchError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| EquitywatchError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(())
    }

    pub fn insert_transactions(
        &self,
        transactions: &[TransactionRecord],
    ) -> Result<(), EquitywatchError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| EquitywatchError::Database {
                reason: e.to_string(),
            })?;

        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| EquitywatchError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        for txn in transactions {
            tx.execute(
                "INSERT OR REPLACE INTO transactions (id, account_id, amount, kind)
                 VALUES (?1, ?2, ?3, ?4)",
                params![txn.id, txn.account_id, txn.amount, txn.kind.to_string()],
            )
            .map_err(|e: rusqlite::Error| EquitywatchError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| EquitywatchError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(())
    }
}

impl LedgerPort for SqliteLedgerAdapter {
    fn fetch_accounts(&self) -> Result<Vec<AccountConfig>, EquitywatchError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| EquitywatchError::Database {
                reason: e.to_string(),
            })?;

        let query = "SELECT id, initial_balance, active, prop_firm, max_loss_limit, profit_target
                     FROM accounts ORDER BY id ASC";

        let mut stmt =
            conn.prepare(query)
                .map_err(|e: rusqlite::Error| EquitywatchError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        let rows = stmt
            .query_map([], |row| {
                Ok(AccountConfig {
                    id: row.get(0)?,
                    initial_balance: row.get(1)?,
                    active: row.get(2)?,
                    prop_firm: row.get(3)?,
                    max_loss_limit: row.get(4)?,
                    profit_target: row.get(5)?,
                })
            })
            .map_err(|e: rusqlite::Error| EquitywatchError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut accounts = Vec::new();
        for row in rows {
            accounts.push(row.map_err(|e: rusqlite::Error| EquitywatchError::DatabaseQuery {
                reason: e.to_string(),
            })?);
        }

        Ok(accounts)
    }

    fn fetch_ledger(&self, account_id: &str) -> Result<LedgerSnapshot, EquitywatchError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| EquitywatchError::Database {
                reason: e.to_string(),
            })?;

        // Both tables are read under one transaction so the snapshot cannot
        // straddle a concurrent writer.
        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| EquitywatchError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let trades = {
            let mut stmt = tx
                .prepare(
                    "SELECT id, account_id, pnl, status FROM trades
                     WHERE account_id = ?1 ORDER BY id ASC",
                )
                .map_err(|e: rusqlite::Error| EquitywatchError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

            let rows = stmt
                .query_map(params![account_id], |row| {
                    let status_str: String = row.get(3)?;
                    let status: TradeStatus = status_str.parse().map_err(|e: String| {
                        rusqlite::Error::FromSqlConversionFailure(
                            3,
                            rusqlite::types::Type::Text,
                            e.into(),
                        )
                    })?;
                    Ok(TradeRecord {
                        id: row.get(0)?,
                        account_id: row.get(1)?,
                        pnl: row.get(2)?,
                        status,
                    })
                })
                .map_err(|e: rusqlite::Error| EquitywatchError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

            let mut trades = Vec::new();
            for row in rows {
                trades.push(row.map_err(|e: rusqlite::Error| {
                    EquitywatchError::DatabaseQuery {
                        reason: e.to_string(),
                    }
                })?);
            }
            trades
        };

        let transactions = {
            let mut stmt = tx
                .prepare(
                    "SELECT id, account_id, amount, kind FROM transactions
                     WHERE account_id = ?1 ORDER BY id ASC",
                )
                .map_err(|e: rusqlite::Error| EquitywatchError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

            let rows = stmt
                .query_map(params![account_id], |row| {
                    let kind_str: String = row.get(3)?;
                    let kind: TransactionKind = kind_str.parse().map_err(|e: String| {
                        rusqlite::Error::FromSqlConversionFailure(
                            3,
                            rusqlite::types::Type::Text,
                            e.into(),
                        )
                    })?;
                    Ok(TransactionRecord {
                        id: row.get(0)?,
                        account_id: row.get(1)?,
                        amount: row.get(2)?,
                        kind,
                    })
                })
                .map_err(|e: rusqlite::Error| EquitywatchError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

            let mut transactions = Vec::new();
            for row in rows {
                let txn = row.map_err(|e: rusqlite::Error| EquitywatchError::DatabaseQuery {
                    reason: e.to_string(),
                })?;
                if txn.amount < 0.0 {
                    return Err(EquitywatchError::MalformedSample {
                        account_id: account_id.to_string(),
                        reason: format!(
                            "transaction {} has negative amount {}",
                            txn.id, txn.amount
                        ),
                    });
                }
                transactions.push(txn);
            }
            transactions
        };

        Ok(LedgerSnapshot {
            trades,
            transactions,
        })
    }
}
