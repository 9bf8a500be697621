//! Asset identity: a source plus the id of the instrument within it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::TrendstopError;
use crate::domain::normalize::SourceKind;

/// Supported data sources, identified by their short prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "AV")]
    Avanza,
    #[serde(rename = "CMC")]
    Cmc,
    #[serde(rename = "KR")]
    Kraken,
    /// Nordnet instruments are looked up through the Avanza feed.
    #[serde(rename = "NN")]
    Nordnet,
    #[serde(rename = "DG")]
    Degiro,
}

impl Source {
    pub const ALL: [Source; 5] = [
        Source::Avanza,
        Source::Cmc,
        Source::Kraken,
        Source::Nordnet,
        Source::Degiro,
    ];

    pub fn prefix(&self) -> &'static str {
        match self {
            Source::Avanza => "AV",
            Source::Cmc => "CMC",
            Source::Kraken => "KR",
            Source::Nordnet => "NN",
            Source::Degiro => "DG",
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Source::Avanza | Source::Nordnet => SourceKind::Avanza,
            Source::Cmc => SourceKind::Cmc,
            Source::Kraken => SourceKind::Kraken,
            Source::Degiro => SourceKind::Degiro,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for Source {
    type Err = TrendstopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Source::ALL
            .into_iter()
            .find(|source| source.prefix() == s)
            .ok_or_else(|| TrendstopError::UnknownSource(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub source: Source,
    pub source_id: String,
    pub name: Option<String>,
}

impl Asset {
    pub fn new(source: Source, source_id: impl Into<String>) -> Self {
        Self {
            source,
            source_id: source_id.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// `"{prefix}:{source_id}"`, e.g. `AV:5269`.
    pub fn fqn_id(&self) -> String {
        format!("{}:{}", self.source.prefix(), self.source_id)
    }

    /// Name for display and column headers, falling back to the fqn id.
    pub fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.fqn_id())
    }

    /// Splits an fqn id into its source and source id.
    pub fn parse_fqn_id(fqn_id: &str) -> Result<(Source, String), TrendstopError> {
        let (prefix, source_id) = fqn_id
            .split_once(':')
            .ok_or_else(|| TrendstopError::InvalidAssetId(fqn_id.to_string()))?;

        if source_id.is_empty() || source_id.contains(':') {
            return Err(TrendstopError::InvalidAssetId(fqn_id.to_string()));
        }

        Ok((prefix.parse()?, source_id.to_string()))
    }
}

/// Splits a comma-separated list of fqn ids, dropping blanks and bare `:`.
pub fn parse_fqn_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty() && *id != ":")
        .map(str::to_string)
        .collect()
}
