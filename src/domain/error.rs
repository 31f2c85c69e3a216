//! Domain error types.

/// Top-level error type for equitywatch.
#[derive(Debug, thiserror::Error)]
pub enum EquitywatchError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("malformed sample for account {account_id}: {reason}")]
    MalformedSample { account_id: String, reason: String },

    #[error("no such account: {account_id}")]
    NoSuchAccount { account_id: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&EquitywatchError> for std::process::ExitCode {
    fn from(err: &EquitywatchError) -> Self {
        let code: u8 = match err {
            EquitywatchError::Io(_) => 1,
            EquitywatchError::ConfigParse { .. }
            | EquitywatchError::ConfigMissing { .. }
            | EquitywatchError::ConfigInvalid { .. } => 2,
            EquitywatchError::Database { .. } | EquitywatchError::DatabaseQuery { .. } => 3,
            EquitywatchError::MalformedSample { .. } => 4,
            EquitywatchError::NoSuchAccount { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
