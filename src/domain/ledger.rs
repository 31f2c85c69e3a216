//! Ledger records: trades and financial transactions.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeStatus {
    Open,
    Closed,
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeStatus::Open => write!(f, "open"),
            TradeStatus::Closed => write!(f, "closed"),
        }
    }
}

impl FromStr for TradeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(TradeStatus::Open),
            "closed" => Ok(TradeStatus::Closed),
            other => Err(format!("unknown trade status: {other}")),
        }
    }
}

/// A trade belonging to exactly one account. Immutable once closed.
#[derive(Debug, Clone)]
pub struct TradeRecord {
    pub id: String,
    pub account_id: String,
    /// Signed result of the trade. Zero while the trade is open.
    pub pnl: f64,
    pub status: TradeStatus,
}

impl TradeRecord {
    /// Contribution to equity. Open trades contribute nothing until closed
    /// (no mark-to-market).
    pub fn realized_pnl(&self) -> f64 {
        match self.status {
            TradeStatus::Closed => self.pnl,
            TradeStatus::Open => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Payout,
    EvaluationFee,
    Commission,
    Other,
}

impl TransactionKind {
    /// Only deposits, payouts, and withdrawals move equity. Evaluation fees,
    /// commissions, and "other" are informational by domain rule, not by
    /// oversight.
    pub fn affects_equity(&self) -> bool {
        matches!(
            self,
            TransactionKind::Deposit | TransactionKind::Withdrawal | TransactionKind::Payout
        )
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
            TransactionKind::Payout => "payout",
            TransactionKind::EvaluationFee => "evaluation_fee",
            TransactionKind::Commission => "commission",
            TransactionKind::Other => "other",
        };
        write!(f, "{s}")
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deposit" => Ok(TransactionKind::Deposit),
            "withdrawal" => Ok(TransactionKind::Withdrawal),
            "payout" => Ok(TransactionKind::Payout),
            "evaluation_fee" => Ok(TransactionKind::EvaluationFee),
            "commission" => Ok(TransactionKind::Commission),
            "other" => Ok(TransactionKind::Other),
            unknown => Err(format!("unknown transaction kind: {unknown}")),
        }
    }
}

/// A cash-flow transaction belonging to exactly one account. Immutable.
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub id: String,
    pub account_id: String,
    /// Stored as a positive magnitude; the sign is implied by `kind`.
    pub amount: f64,
    pub kind: TransactionKind,
}

impl TransactionRecord {
    /// Equity contribution: deposits and payouts add, withdrawals subtract,
    /// every other kind contributes zero.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Deposit | TransactionKind::Payout => self.amount,
            TransactionKind::Withdrawal => -self.amount,
            TransactionKind::EvaluationFee | TransactionKind::Commission | TransactionKind::Other => {
                0.0
            }
        }
    }
}
