//! Port traits decoupling the domain from storage and notification.

pub mod config_port;
pub mod ledger_port;
pub mod notification_port;
