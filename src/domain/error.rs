//! Domain error types.

use chrono::NaiveDateTime;

/// Top-level error type for trendstop.
#[derive(Debug, thiserror::Error)]
pub enum TrendstopError {
    #[error("malformed bar from {origin}: {reason}")]
    MalformedBar { origin: String, reason: String },

    #[error("series is empty")]
    EmptySeries,

    #[error("insufficient history: have {rows} rows, need more than {periods}")]
    InsufficientHistory { rows: usize, periods: usize },

    #[error("duplicate timestamp {time} with differing values")]
    DuplicateTimestamp { time: NaiveDateTime },

    #[error("{resolution} resolution not supported for {origin} source")]
    UnsupportedResolution { origin: String, resolution: String },

    #[error("unknown source: {0}")]
    UnknownSource(String),

    #[error("invalid asset id: {0}")]
    InvalidAssetId(String),

    #[error("feed error from {origin}: {reason}")]
    Feed { origin: String, reason: String },

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

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TrendstopError {
    pub fn malformed(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedBar {
            origin: source.into(),
            reason: reason.into(),
        }
    }

    pub fn feed(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Feed {
            origin: source.into(),
            reason: reason.into(),
        }
    }
}

impl TrendstopError {
    /// Process exit status: io 1, config 2, feed/source 3, data 4.
    pub fn exit_status(&self) -> u8 {
        match self {
            TrendstopError::Io(_) => 1,
            TrendstopError::ConfigParse { .. }
            | TrendstopError::ConfigMissing { .. }
            | TrendstopError::ConfigInvalid { .. } => 2,
            TrendstopError::Feed { .. }
            | TrendstopError::UnknownSource(_)
            | TrendstopError::InvalidAssetId(_)
            | TrendstopError::UnsupportedResolution { .. } => 3,
            TrendstopError::MalformedBar { .. }
            | TrendstopError::EmptySeries
            | TrendstopError::InsufficientHistory { .. }
            | TrendstopError::DuplicateTimestamp { .. } => 4,
        }
    }
}

impl From<&TrendstopError> for std::process::ExitCode {
    fn from(err: &TrendstopError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
