use serde::{Deserialize, Serialize};

/// `[price, amount]` level.
pub type Level = [f64; 2];

/// A normalised order book snapshot (spec §3 `OrderBook`).
///
/// Invariants (spec §8 property 4): `bids` strictly descending by price, `asks` strictly
/// ascending by price, all quantities `> 0`. Zero-quantity levels are removed by
/// [`OrderBook::new`]; for venues that sign amount (Bitfinex), the bid/ask split must happen
/// before construction based on the sign of the raw amount.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OrderBook {
    pub symbol: String,
    pub timestamp: i64,
    /// Venue-supplied sequence number / update id, when available (e.g. Bybit's `u`).
    pub nonce: Option<u64>,
    pub bids: Vec<Level>,
    pub asks: Vec<Level>,
}

impl OrderBook {
    pub fn new(
        symbol: impl Into<String>,
        timestamp: i64,
        nonce: Option<u64>,
        mut bids: Vec<Level>,
        mut asks: Vec<Level>,
    ) -> Self {
        bids.retain(|level| level[1] > 0.0);
        asks.retain(|level| level[1] > 0.0);
        bids.sort_by(|a, b| b[0].partial_cmp(&a[0]).unwrap_or(std::cmp::Ordering::Equal));
        asks.sort_by(|a, b| a[0].partial_cmp(&b[0]).unwrap_or(std::cmp::Ordering::Equal));

        Self {
            symbol: symbol.into(),
            timestamp,
            nonce,
            bids,
            asks,
        }
    }

    pub fn is_crossed(&self, epsilon: f64) -> bool {
        match (self.bids.first(), self.asks.first()) {
            (Some(bid), Some(ask)) => bid[0] > ask[0] + epsilon,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_zero_quantity_levels() {
        let book = OrderBook::new("BTC/USDT", 0, None, vec![[100.0, 0.0], [99.0, 1.0]], vec![]);
        assert_eq!(book.bids, vec![[99.0, 1.0]]);
    }

    #[test]
    fn bids_descending_asks_ascending() {
        let book = OrderBook::new(
            "BTC/USDT",
            0,
            None,
            vec![[99.0, 1.0], [100.0, 1.0]],
            vec![[102.0, 1.0], [101.0, 1.0]],
        );
        assert_eq!(book.bids, vec![[100.0, 1.0], [99.0, 1.0]]);
        assert_eq!(book.asks, vec![[101.0, 1.0], [102.0, 1.0]]);
    }
}
