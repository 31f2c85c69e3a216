//! Equity aggregation.
//!
//! Equity is recomputed in full on every call rather than kept as a running
//! delta: historical records can be amended, so the aggregation must reflect
//! the data as fetched, O(n) per call.

use crate::domain::account::AccountConfig;
use crate::domain::ledger::{TradeRecord, TransactionRecord};

/// Current equity for one account:
/// `initial_balance + sum(closed trade pnl) + sum(signed included transactions)`.
///
/// Total over any input, including empty slices. Records belonging to other
/// accounts are ignored, so callers may pass an unfiltered ledger. The caller
/// is responsible for fetching trades and transactions under one consistent
/// read.
pub fn compute_equity(
    config: &AccountConfig,
    trades: &[TradeRecord],
    transactions: &[TransactionRecord],
) -> f64 {
    let trade_sum: f64 = trades
        .iter()
        .filter(|t| t.account_id == config.id)
        .map(|t| t.realized_pnl())
        .sum();

    let transaction_sum: f64 = transactions
        .iter()
        .filter(|x| x.account_id == config.id)
        .map(|x| x.signed_amount())
        .sum();

    config.initial_balance + trade_sum + transaction_sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ledger::{TradeStatus, TransactionKind};

    fn sample_account() -> AccountConfig {
        AccountConfig {
            id: "acct-1".to_string(),
            initial_balance: 10_000.0,
            active: true,
            prop_firm: false,
            max_loss_limit: None,
            profit_target: None,
        }
    }

    fn trade(id: &str, account: &str, pnl: f64, status: TradeStatus) -> TradeRecord {
        TradeRecord {
            id: id.to_string(),
            account_id: account.to_string(),
            pnl,
            status,
        }
    }

    fn txn(id: &str, account: &str, amount: f64, kind: TransactionKind) -> TransactionRecord {
        TransactionRecord {
            id: id.to_string(),
            account_id: account.to_string(),
            amount,
            kind,
        }
    }

    #[test]
    fn no_activity_equals_initial_balance() {
        let account = sample_account();
        let equity = compute_equity(&account, &[], &[]);
        assert!((equity - 10_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn closed_trades_and_included_transactions() {
        // 10,000 + (500 - 200 + 300) + (1,000 - 300) = 11,300; commission ignored.
        let account = sample_account();
        let trades = vec![
            trade("t-1", "acct-1", 500.0, TradeStatus::Closed),
            trade("t-2", "acct-1", -200.0, TradeStatus::Closed),
            trade("t-3", "acct-1", 300.0, TradeStatus::Closed),
        ];
        let transactions = vec![
            txn("x-1", "acct-1", 1_000.0, TransactionKind::Deposit),
            txn("x-2", "acct-1", 300.0, TransactionKind::Withdrawal),
            txn("x-3", "acct-1", 50.0, TransactionKind::Commission),
        ];

        let equity = compute_equity(&account, &trades, &transactions);
        assert!((equity - 11_300.0).abs() < 1e-9);
    }

    #[test]
    fn open_trades_contribute_nothing() {
        let account = sample_account();
        let trades = vec![
            trade("t-1", "acct-1", 500.0, TradeStatus::Closed),
            trade("t-2", "acct-1", 9_999.0, TradeStatus::Open),
        ];
        let equity = compute_equity(&account, &trades, &[]);
        assert!((equity - 10_500.0).abs() < 1e-9);
    }

    #[test]
    fn other_accounts_records_ignored() {
        let account = sample_account();
        let trades = vec![
            trade("t-1", "acct-1", 100.0, TradeStatus::Closed),
            trade("t-2", "acct-2", 5_000.0, TradeStatus::Closed),
        ];
        let transactions = vec![
            txn("x-1", "acct-2", 2_000.0, TransactionKind::Deposit),
            txn("x-2", "acct-1", 50.0, TransactionKind::Deposit),
        ];
        let equity = compute_equity(&account, &trades, &transactions);
        assert!((equity - 10_150.0).abs() < 1e-9);
    }

    #[test]
    fn payout_adds_like_deposit() {
        let account = sample_account();
        let transactions = vec![txn("x-1", "acct-1", 750.0, TransactionKind::Payout)];
        let equity = compute_equity(&account, &[], &transactions);
        assert!((equity - 10_750.0).abs() < 1e-9);
    }

    #[test]
    fn excluded_kinds_never_move_equity() {
        let account = sample_account();
        let with_fee = vec![
            txn("x-1", "acct-1", 1_000.0, TransactionKind::Deposit),
            txn("x-2", "acct-1", 500.0, TransactionKind::EvaluationFee),
        ];
        let without_fee = vec![txn("x-1", "acct-1", 1_000.0, TransactionKind::Deposit)];

        let a = compute_equity(&account, &[], &with_fee);
        let b = compute_equity(&account, &[], &without_fee);
        assert!((a - b).abs() < f64::EPSILON);
    }

    #[test]
    fn transaction_order_does_not_matter() {
        let account = sample_account();
        let forward = vec![
            txn("x-1", "acct-1", 1_000.0, TransactionKind::Deposit),
            txn("x-2", "acct-1", 200.0, TransactionKind::Withdrawal),
        ];
        let reversed: Vec<_> = forward.iter().rev().cloned().collect();

        let a = compute_equity(&account, &[], &forward);
        let b = compute_equity(&account, &[], &reversed);
        assert!((a - b).abs() < f64::EPSILON);
        assert!((a - 10_800.0).abs() < 1e-9);
    }

    #[test]
    fn losses_can_take_equity_below_initial() {
        let account = sample_account();
        let trades = vec![trade("t-1", "acct-1", -2_500.0, TradeStatus::Closed)];
        let equity = compute_equity(&account, &trades, &[]);
        assert!((equity - 7_500.0).abs() < 1e-9);
    }
}
