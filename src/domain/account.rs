//! Trading account configuration.
//!
//! AccountConfig is owned by the account-management collaborator and is
//! read-only input to every evaluator in this crate.

#[derive(Debug, Clone)]
pub struct AccountConfig {
    pub id: String,
    /// Balance at account creation. Immutable.
    pub initial_balance: f64,
    pub active: bool,
    pub prop_firm: bool,
    /// Maximum trailing loss before a breach. `None` means drawdown
    /// monitoring does not apply to this account.
    pub max_loss_limit: Option<f64>,
    /// Profit above initial balance that passes a prop-firm challenge.
    /// `None` means challenge tracking does not apply.
    pub profit_target: Option<f64>,
}
