//! Data feed for one source on top of raw payloads.

use std::sync::Arc;

use tracing::debug;

use crate::domain::asset::Source;
use crate::domain::bar::BarSet;
use crate::domain::error::TrendstopError;
use crate::domain::normalize::SourceKind;
use crate::domain::price::Price;
use crate::domain::resample::resample;
use crate::domain::resolution::Resolution;
use crate::domain::series::OhlcSeries;
use crate::ports::data_feed_port::DataFeedPort;
use crate::ports::payload_port::PayloadPort;

pub struct SourceFeed {
    source: Source,
    payloads: Arc<dyn PayloadPort>,
}

impl SourceFeed {
    pub fn new(source: Source, payloads: Arc<dyn PayloadPort>) -> Self {
        Self { source, payloads }
    }

    fn kind(&self) -> SourceKind {
        self.source.kind()
    }
}

impl DataFeedPort for SourceFeed {
    fn retrieve_ohlc(
        &self,
        source_id: &str,
        resolution: Resolution,
    ) -> Result<OhlcSeries, TrendstopError> {
        let kind = self.kind();
        let upstream = kind.upstream_resolution(resolution)?;
        let payload = self.payloads.fetch_bars(self.source, source_id, upstream)?;

        let mut barset = BarSet::new();
        for raw in kind.extract_records(&payload)? {
            let bar = kind.normalize(raw).inspect_err(|e| {
                debug!(
                    asset_id = %format!("{}:{}", self.source, source_id),
                    source = %self.source,
                    error = %e,
                    "malformed record"
                );
            })?;
            barset.insert(kind.adjust_for_resolution(bar, upstream));
        }

        let series = OhlcSeries::from_barset(&barset)?;
        debug!(
            source = %self.source,
            source_id,
            %upstream,
            rows = series.len(),
            "normalized payload"
        );

        if upstream == resolution {
            Ok(series)
        } else {
            Ok(resample(&series, resolution))
        }
    }

    fn retrieve_asset_name(&self, source_id: &str) -> Result<String, TrendstopError> {
        let kind = self.kind();
        if kind == SourceKind::Kraken {
            return kind.asset_name(&serde_json::Value::Null, source_id);
        }
        let metadata = self.payloads.fetch_metadata(self.source, source_id)?;
        kind.asset_name(&metadata, source_id)
    }

    fn retrieve_price(&self, source_id: &str) -> Result<Price, TrendstopError> {
        let payload = self.payloads.fetch_price(self.source, source_id)?;
        self.kind().price(&payload)
    }
}
