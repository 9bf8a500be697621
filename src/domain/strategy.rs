//! Trend-following settings and the per-asset stop-loss pipeline.
//!
//! Stocks (Avanza, Nordnet, Degiro) trade on monthly bars with a tighter
//! multiplier; commodities and crypto (CMC, Kraken) trade on weekly bars.

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::domain::asset::{Asset, Source};
use crate::domain::calendar::is_last_bar_closed;
use crate::domain::error::TrendstopError;
use crate::domain::feed_registry::FeedRegistry;
use crate::domain::resolution::Resolution;
use crate::domain::trailing_stop::{StopSeries, compute_trailing_stop, latest_stop};
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_ATR_PERIOD: usize = 21;
pub const DEFAULT_WEEK_MULTIPLIER: f64 = 3.0;
pub const DEFAULT_MONTH_MULTIPLIER: f64 = 2.5;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategySettings {
    pub atr_period: usize,
    pub week_multiplier: f64,
    pub month_multiplier: f64,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            atr_period: DEFAULT_ATR_PERIOD,
            week_multiplier: DEFAULT_WEEK_MULTIPLIER,
            month_multiplier: DEFAULT_MONTH_MULTIPLIER,
        }
    }
}

impl StrategySettings {
    /// Reads the `[strategy]` section, falling back to the defaults.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TrendstopError> {
        let atr_period = config.get_int("strategy", "atr_period", DEFAULT_ATR_PERIOD as i64);
        if atr_period <= 0 {
            return Err(TrendstopError::ConfigInvalid {
                section: "strategy".to_string(),
                key: "atr_period".to_string(),
                reason: "atr_period must be positive".to_string(),
            });
        }

        let week_multiplier =
            config.get_double("strategy", "week_multiplier", DEFAULT_WEEK_MULTIPLIER);
        let month_multiplier =
            config.get_double("strategy", "month_multiplier", DEFAULT_MONTH_MULTIPLIER);

        for (key, value) in [
            ("week_multiplier", week_multiplier),
            ("month_multiplier", month_multiplier),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(TrendstopError::ConfigInvalid {
                    section: "strategy".to_string(),
                    key: key.to_string(),
                    reason: format!("{key} must be a positive number"),
                });
            }
        }

        Ok(Self {
            atr_period: atr_period as usize,
            week_multiplier,
            month_multiplier,
        })
    }

    pub fn multiplier_for(&self, resolution: Resolution) -> f64 {
        match resolution {
            Resolution::Month => self.month_multiplier,
            Resolution::Week | Resolution::Day => self.week_multiplier,
        }
    }
}

/// Bar resolution the strategy trades each source on.
pub fn periodicity(source: Source) -> Resolution {
    match source {
        Source::Avanza | Source::Nordnet | Source::Degiro => Resolution::Month,
        Source::Cmc | Source::Kraken => Resolution::Week,
    }
}

/// Trailing stop over the asset's strategy periodicity. The last row is dropped
/// while its week or month is still open at `now`.
pub fn stop_loss_for_asset(
    asset: &Asset,
    registry: &FeedRegistry,
    settings: &StrategySettings,
    now: NaiveDateTime,
) -> Result<StopSeries, TrendstopError> {
    let resolution = periodicity(asset.source);
    let multiplier = settings.multiplier_for(resolution);
    let feed = registry.feed(asset.source)?;

    let series = feed.retrieve_ohlc(&asset.source_id, resolution)?;
    debug!(
        asset_id = %asset.fqn_id(),
        %resolution,
        rows = series.len(),
        "retrieved bars"
    );

    let stops = compute_trailing_stop(&series, settings.atr_period, multiplier)?;
    if is_last_bar_closed(resolution, now) {
        Ok(stops)
    } else {
        debug!(asset_id = %asset.fqn_id(), "dropping open bar");
        Ok(stops.without_last())
    }
}

/// Latest closed-bar stop for the asset.
pub fn current_stop_for_asset(
    asset: &Asset,
    registry: &FeedRegistry,
    settings: &StrategySettings,
    now: NaiveDateTime,
) -> Result<f64, TrendstopError> {
    let stops = stop_loss_for_asset(asset, registry, settings, now)?;
    let stop = latest_stop(&stops)?;
    info!(asset_id = %asset.fqn_id(), stop, "computed trailing stop");
    Ok(stop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn defaults_when_section_missing() {
        let settings = StrategySettings::from_config(&make_config("[feeds]\n")).unwrap();
        assert_eq!(settings, StrategySettings::default());
        assert_eq!(settings.atr_period, 21);
    }

    #[test]
    fn reads_overrides() {
        let config = make_config(
            "[strategy]\natr_period = 14\nweek_multiplier = 2.0\nmonth_multiplier = 1.5\n",
        );
        let settings = StrategySettings::from_config(&config).unwrap();
        assert_eq!(settings.atr_period, 14);
        assert_eq!(settings.multiplier_for(Resolution::Week), 2.0);
        assert_eq!(settings.multiplier_for(Resolution::Month), 1.5);
    }

    #[test]
    fn zero_period_is_rejected() {
        let err = StrategySettings::from_config(&make_config("[strategy]\natr_period = 0\n"))
            .unwrap_err();
        assert!(matches!(err, TrendstopError::ConfigInvalid { key, .. } if key == "atr_period"));
    }

    #[test]
    fn negative_multiplier_is_rejected() {
        let err =
            StrategySettings::from_config(&make_config("[strategy]\nweek_multiplier = -1\n"))
                .unwrap_err();
        assert!(
            matches!(err, TrendstopError::ConfigInvalid { key, .. } if key == "week_multiplier")
        );
    }

    #[test]
    fn periodicity_per_source() {
        assert_eq!(periodicity(Source::Avanza), Resolution::Month);
        assert_eq!(periodicity(Source::Nordnet), Resolution::Month);
        assert_eq!(periodicity(Source::Degiro), Resolution::Month);
        assert_eq!(periodicity(Source::Cmc), Resolution::Week);
        assert_eq!(periodicity(Source::Kraken), Resolution::Week);
    }

    #[test]
    fn default_multipliers() {
        let settings = StrategySettings::default();
        assert_eq!(settings.multiplier_for(Resolution::Month), 2.5);
        assert_eq!(settings.multiplier_for(Resolution::Week), 3.0);
    }
}
