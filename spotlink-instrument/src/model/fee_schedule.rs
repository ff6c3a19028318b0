use serde::{Deserialize, Serialize};

/// A venue's maker/taker commission rate, expressed as a fraction (`0.001` == 0.1%), scoped to a
/// single symbol when a venue quotes per-pair rates, or to the whole account otherwise.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TradingFee {
    pub symbol: Option<String>,
    pub maker: f64,
    pub taker: f64,
}
