use serde::{Deserialize, Serialize};

/// Best bid/ask only, the lighter-weight sibling of a full [`Ticker`](super::ticker::Ticker)
/// snapshot that several venues expose as a dedicated endpoint/channel.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct BookTicker {
    pub timestamp: i64,
    pub bid: f64,
    pub bid_volume: Option<f64>,
    pub ask: f64,
    pub ask_volume: Option<f64>,
}

impl BookTicker {
    pub fn mid(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mid_is_the_average_of_bid_and_ask() {
        let book_ticker = BookTicker {
            timestamp: 0,
            bid: 99.0,
            bid_volume: None,
            ask: 101.0,
            ask_volume: None,
        };
        assert_eq!(book_ticker.mid(), 100.0);
    }
}
