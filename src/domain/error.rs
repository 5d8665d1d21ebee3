//! Domain error types.

/// Top-level error type for macross.
#[derive(Debug, thiserror::Error)]
pub enum MacrossError {
    #[error("no price data{}", for_symbol(.symbol))]
    NoData { symbol: String },

    #[error("insufficient data: have {points} points, need at least {required}")]
    InsufficientData { points: usize, required: usize },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

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

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MacrossError {
    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        MacrossError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        MacrossError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Process exit status for this error family.
    pub fn exit_status(&self) -> u8 {
        match self {
            MacrossError::Io(_) => 1,
            MacrossError::ConfigParse { .. }
            | MacrossError::ConfigMissing { .. }
            | MacrossError::ConfigInvalid { .. } => 2,
            MacrossError::DataSource { .. } => 3,
            MacrossError::InvalidParameter { .. } => 4,
            MacrossError::NoData { .. } | MacrossError::InsufficientData { .. } => 5,
            MacrossError::Report { .. } => 6,
        }
    }
}

fn for_symbol(symbol: &str) -> String {
    if symbol.is_empty() {
        String::new()
    } else {
        format!(" for {symbol}")
    }
}

impl From<&MacrossError> for std::process::ExitCode {
    fn from(err: &MacrossError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
