use crate::model::trade::{Fee, MyTrade, Side};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Market,
    Limit,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeInForce {
    Gtc,
    Ioc,
    Fok,
}

/// Unified order lifecycle state (spec §3 `Order.status`).
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
    Expired,
    /// A venue status string/code with no mapping to the known enum. Carried verbatim; treated
    /// as non-terminal unless it matches a venue's own terminal set (spec §4.5).
    Unknown(String),
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Canceled | OrderStatus::Rejected | OrderStatus::Expired
        )
    }
}

/// A unified order (spec §3 `Order`).
///
/// Invariants (spec §8 property 2): `0 <= filled <= amount`; `remaining = amount - filled`; if
/// `filled > 0` and `cost > 0` then `average = cost / filled`. Enforced by [`Order::new`] rather
/// than trusted from venue input.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Order {
    pub id: String,
    pub client_order_id: Option<String>,
    pub symbol: String,
    pub r#type: OrderType,
    pub side: Side,
    pub price: Option<f64>,
    pub amount: f64,
    pub filled: f64,
    pub remaining: f64,
    pub cost: f64,
    pub average: Option<f64>,
    pub status: OrderStatus,
    pub time_in_force: Option<TimeInForce>,
    pub fee: Option<Fee>,
    pub trades: Vec<MyTrade>,
    pub timestamp: i64,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        symbol: impl Into<String>,
        r#type: OrderType,
        side: Side,
        price: Option<f64>,
        amount: f64,
        filled: f64,
        cost: f64,
        status: OrderStatus,
        timestamp: i64,
    ) -> Self {
        let filled = filled.clamp(0.0, amount);
        let remaining = amount - filled;
        let average = if filled > 0.0 && cost > 0.0 {
            Some(cost / filled)
        } else {
            None
        };
        Self {
            id: id.into(),
            client_order_id: None,
            symbol: symbol.into(),
            r#type,
            side,
            price,
            amount,
            filled,
            remaining,
            cost,
            average,
            status,
            time_in_force: None,
            fee: None,
            trades: Vec::new(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_is_cost_over_filled_when_both_positive() {
        let order = Order::new(
            "1",
            "BTC/USDT",
            OrderType::Limit,
            Side::Buy,
            Some(50_000.0),
            1.0,
            0.5,
            25_000.0,
            OrderStatus::PartiallyFilled,
            0,
        );
        assert_eq!(order.average, Some(50_000.0));
        assert_eq!(order.remaining, 0.5);
    }

    #[test]
    fn average_absent_when_unfilled() {
        let order = Order::new(
            "1",
            "BTC/USDT",
            OrderType::Limit,
            Side::Buy,
            Some(50_000.0),
            1.0,
            0.0,
            0.0,
            OrderStatus::New,
            0,
        );
        assert_eq!(order.average, None);
    }

    #[test]
    fn filled_never_exceeds_amount() {
        let order = Order::new(
            "1", "BTC/USDT", OrderType::Market, Side::Buy, None, 1.0, 5.0, 100.0,
            OrderStatus::Filled, 0,
        );
        assert_eq!(order.filled, 1.0);
        assert_eq!(order.remaining, 0.0);
    }
}
