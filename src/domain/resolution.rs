//! Time bucket size of a bar series.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Day,
    Week,
    Month,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Day => "day",
            Resolution::Week => "week",
            Resolution::Month => "month",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resolution: {0}")]
pub struct ParseResolutionError(pub String);

impl FromStr for Resolution {
    type Err = ParseResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "d" | "daily" => Ok(Resolution::Day),
            "week" | "w" | "weekly" => Ok(Resolution::Week),
            "month" | "m" | "monthly" => Ok(Resolution::Month),
            other => Err(ParseResolutionError(other.to_string())),
        }
    }
}
