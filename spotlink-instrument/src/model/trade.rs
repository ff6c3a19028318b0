use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Bitfinex hazard (spec §4.5): side is inferred from the sign of a signed amount field
    /// rather than carried explicitly.
    pub fn from_signed_amount(amount: f64) -> Self {
        if amount.is_sign_negative() { Side::Sell } else { Side::Buy }
    }
}

/// A public trade print (spec §3 `Trade`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Trade {
    pub id: String,
    pub symbol: String,
    pub timestamp: i64,
    pub price: f64,
    pub amount: f64,
    pub side: Side,
    pub is_buyer_maker: Option<bool>,
    pub r#type: Option<String>,
}

impl Trade {
    pub fn cost(&self) -> f64 {
        self.price * self.amount
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Fee {
    pub cost: f64,
    pub currency: String,
}

/// A private fill (spec §3 `MyTrade`): public [`Trade`] fields plus execution metadata.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MyTrade {
    pub trade: Trade,
    pub order_id: String,
    pub fee: Option<Fee>,
    pub is_maker: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_from_signed_amount() {
        assert_eq!(Side::from_signed_amount(1.5), Side::Buy);
        assert_eq!(Side::from_signed_amount(-1.5), Side::Sell);
    }

    #[test]
    fn cost_is_price_times_amount() {
        let trade = Trade {
            id: "1".into(),
            symbol: "BTC/USDT".into(),
            timestamp: 0,
            price: 100.0,
            amount: 2.0,
            side: Side::Buy,
            is_buyer_maker: None,
            r#type: None,
        };
        assert_eq!(trade.cost(), 200.0);
    }
}
