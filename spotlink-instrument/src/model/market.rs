use crate::exchange::ExchangeId;
use derive_more::Constructor;
use serde::{Deserialize, Serialize};

/// Decimal-place precision for a [`Market`]'s amount and price fields (spec §3).
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize, Constructor)]
pub struct Precision {
    pub amount: Option<u32>,
    pub price: Option<u32>,
}

#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize, Constructor)]
pub struct MinMax {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize, Constructor)]
pub struct Limits {
    pub amount: MinMax,
    pub price: MinMax,
    /// Only `min` is meaningful for cost (minimum notional); `max` is always `None`.
    pub cost: MinMax,
}

/// A tradable pair, normalised from a venue's native market listing (spec §3 `Market`).
///
/// Invariant: for a loaded adapter, `markets[symbol].id` round-trips through the venue's
/// `to_venue`/`from_venue` symbol codec (spec §8 property 1).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Market {
    pub exchange: ExchangeId,
    /// Venue-native identifier, e.g. `tBTCUSD`, `BTC-USDT`, `btc_usdt`, `XXBTZUSD`.
    pub id: String,
    /// Canonical `BASE/QUOTE` symbol, uppercase.
    pub symbol: String,
    pub base: String,
    pub quote: String,
    pub active: bool,
    pub precision: Precision,
    pub tick_size: Option<f64>,
    pub step_size: Option<f64>,
    pub limits: Limits,
}

impl Market {
    pub fn new(
        exchange: ExchangeId,
        id: impl Into<String>,
        base: impl Into<String>,
        quote: impl Into<String>,
    ) -> Self {
        let base = base.into();
        let quote = quote.into();
        let symbol = format!("{base}/{quote}");
        Self {
            exchange,
            id: id.into(),
            symbol,
            base,
            quote,
            active: true,
            precision: Precision::new(None, None),
            tick_size: None,
            step_size: None,
            limits: Limits::new(
                MinMax::new(None, None),
                MinMax::new(None, None),
                MinMax::new(None, None),
            ),
        }
    }
}
