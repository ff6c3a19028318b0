use serde::{Deserialize, Serialize};

/// Snapshot of a [`Market`](super::market::Market) (spec §3 `Ticker`).
///
/// Fields a venue does not supply are `None`, never coerced to zero (spec §9). Invariant: when
/// both `last` and `open` are present, `change = last - open` (spec §3, enforced by
/// [`Ticker::with_change`]).
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Ticker {
    pub symbol: String,
    pub timestamp: i64,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub open: Option<f64>,
    pub last: Option<f64>,
    pub close: Option<f64>,
    pub bid: Option<f64>,
    pub bid_volume: Option<f64>,
    pub ask: Option<f64>,
    pub ask_volume: Option<f64>,
    pub volume: Option<f64>,
    pub quote_volume: Option<f64>,
    pub vwap: Option<f64>,
    pub change: Option<f64>,
    pub percentage: Option<f64>,
}

impl Ticker {
    /// Derive `change` from `last - open` whenever both are present, overriding any
    /// venue-reported value so the invariant in spec §3 always holds for the unified shape.
    pub fn with_change(mut self) -> Self {
        if let (Some(last), Some(open)) = (self.last, self.open) {
            self.change = Some(last - open);
        }
        self
    }

    pub fn datetime(&self) -> String {
        spotlink_datetime::iso8601_ms(self.timestamp)
    }
}

// Re-exported under a crate-local alias so `Ticker::datetime` doesn't have to depend on the
// sibling `spotlink-integration` crate (this crate sits below it in the dependency graph).
mod spotlink_datetime {
    use chrono::{DateTime, SecondsFormat, Utc};

    pub fn iso8601_ms(timestamp_ms: i64) -> String {
        DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
            .unwrap_or_else(|| DateTime::<Utc>::from_timestamp(0, 0).unwrap())
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_is_derived_from_last_minus_open() {
        let ticker = Ticker {
            last: Some(105.0),
            open: Some(100.0),
            ..Default::default()
        }
        .with_change();
        assert_eq!(ticker.change, Some(5.0));
    }

    #[test]
    fn missing_fields_stay_absent() {
        let ticker = Ticker::default();
        assert_eq!(ticker.bid, None);
        assert_eq!(ticker.change, None);
    }
}
