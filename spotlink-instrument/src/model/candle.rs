use serde::{Deserialize, Serialize};

/// `[timestamp_ms, open, high, low, close, volume]` (spec §3 OHLCV candle).
///
/// Timestamp is always milliseconds regardless of a venue's native unit (seconds, ms, ns);
/// field order is always `O,H,L,C,V` regardless of a venue's native ordering (spec §4.5).
pub type Candle = [f64; 6];

pub const TS: usize = 0;
pub const OPEN: usize = 1;
pub const HIGH: usize = 2;
pub const LOW: usize = 3;
pub const CLOSE: usize = 4;
pub const VOLUME: usize = 5;

/// Supported aggregation bucket sizes. `as_venue_code` below is the lowest common shape most
/// venues express their own mapping table against; venues with entirely different encodings
/// (e.g. Bitfinex's `1D`) override per-adapter rather than here.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
    W1,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
            Timeframe::W1 => "1w",
        }
    }

    pub fn seconds(&self) -> i64 {
        match self {
            Timeframe::M1 => 60,
            Timeframe::M5 => 300,
            Timeframe::M15 => 900,
            Timeframe::M30 => 1800,
            Timeframe::H1 => 3600,
            Timeframe::H4 => 14400,
            Timeframe::D1 => 86400,
            Timeframe::W1 => 604800,
        }
    }
}

/// Sort ascending by timestamp and assert strict monotonicity (spec §8 property 3). Some venues
/// (Bitfinex, OKX) deliver candles newest-first; callers must always pass results through this
/// before returning them to the caller.
pub fn ensure_ascending(mut candles: Vec<Candle>) -> Vec<Candle> {
    candles.sort_by(|a, b| a[TS].partial_cmp(&b[TS]).unwrap_or(std::cmp::Ordering::Equal));
    candles.dedup_by(|a, b| a[TS] == b[TS]);
    candles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_ascending_sorts_and_dedupes() {
        let candles = vec![
            [3000.0, 1.0, 2.0, 0.5, 1.5, 10.0],
            [1000.0, 1.0, 2.0, 0.5, 1.5, 10.0],
            [2000.0, 1.0, 2.0, 0.5, 1.5, 10.0],
        ];
        let sorted = ensure_ascending(candles);
        assert_eq!(sorted.iter().map(|c| c[TS]).collect::<Vec<_>>(), vec![1000.0, 2000.0, 3000.0]);
    }

    #[test]
    fn bitfinex_reorder_example_from_spec() {
        // Bitfinex delivers [ts, O, C, H, L, V]; must become [ts, O, H, L, C, V].
        let raw = [1_700_000_000_000.0, 50000.0, 50500.0, 51000.0, 49500.0, 100.0];
        let unified: Candle = [raw[TS], raw[1], raw[3], raw[4], raw[2], raw[5]];
        assert_eq!(unified, [1_700_000_000_000.0, 50000.0, 51000.0, 49500.0, 50500.0, 100.0]);
    }
}
