//! Domain error types.

/// Top-level error type for stockeval.
#[derive(Debug, thiserror::Error)]
pub enum StockevalError {
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

    /// The trailing price series for a stock could not be retrieved at all.
    #[error("market data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// A single upstream request or payload failed.
    #[error("{source_name} request failed: {reason}")]
    Source { source_name: String, reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StockevalError {
    pub fn upstream(source_name: &str, reason: impl Into<String>) -> Self {
        StockevalError::Source {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, StockevalError::DataUnavailable { .. })
    }

    /// Process exit status for this error category.
    pub fn exit_status(&self) -> u8 {
        match self {
            StockevalError::Io(_) | StockevalError::Report { .. } => 1,
            StockevalError::ConfigParse { .. }
            | StockevalError::ConfigMissing { .. }
            | StockevalError::ConfigInvalid { .. } => 2,
            StockevalError::Source { .. } => 3,
            StockevalError::DataUnavailable { .. } => 5,
        }
    }
}

impl From<&StockevalError> for std::process::ExitCode {
    fn from(err: &StockevalError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}

/// Errors raised while pushing a report through a notification channel.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("network error: {0}")]
    Network(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("platform error: {0}")]
    Platform(String),
}
