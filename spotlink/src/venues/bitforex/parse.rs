//! `error::validate` already unwraps Bitforex's `{success, code, data}` envelope, so every
//! function here receives the bare `data` payload.

use crate::error::ExchangeError;
use serde_json::Value;
use spotlink_instrument::model::balance::{AssetBalance, Balances};
use spotlink_instrument::model::candle::{ensure_ascending, Candle};
use spotlink_instrument::model::order::{Order, OrderStatus, OrderType};
use spotlink_instrument::model::order_book::OrderBook;
use spotlink_instrument::model::ticker::Ticker;
use spotlink_instrument::model::trade::{MyTrade, Side, Trade};
use spotlink_integration::helpers::{now_ms, parse_optional_f64};

pub fn parse_ticker(symbol: &str, data: &Value) -> Ticker {
    Ticker {
        symbol: symbol.to_string(),
        timestamp: data.get("date").and_then(Value::as_i64).unwrap_or_else(now_ms),
        high: parse_optional_f64(data.get("high")),
        low: parse_optional_f64(data.get("low")),
        open: None,
        last: parse_optional_f64(data.get("last")),
        close: parse_optional_f64(data.get("last")),
        bid: parse_optional_f64(data.get("buy")),
        bid_volume: None,
        ask: parse_optional_f64(data.get("sell")),
        ask_volume: None,
        volume: parse_optional_f64(data.get("vol")),
        quote_volume: None,
        vwap: None,
        change: None,
        percentage: None,
    }
}

fn parse_levels(rows: Option<&Vec<Value>>) -> Vec<[f64; 2]> {
    rows.map(|rows| rows.iter().filter_map(|row| Some([parse_optional_f64(row.get("price"))?, parse_optional_f64(row.get("amount"))?])).collect()).unwrap_or_default()
}

pub fn parse_order_book(symbol: &str, data: &Value) -> OrderBook {
    let bids = parse_levels(data.get("bids").and_then(Value::as_array));
    let asks = parse_levels(data.get("asks").and_then(Value::as_array));
    let timestamp = data.get("time").and_then(Value::as_i64).unwrap_or_else(now_ms);
    OrderBook::new(symbol, timestamp, None, bids, asks)
}

pub fn parse_trades(symbol: &str, data: &Value) -> Vec<Trade> {
    data.as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    Some(Trade {
                        id: row.get("tid").and_then(Value::as_i64)?.to_string(),
                        symbol: symbol.to_string(),
                        timestamp: row.get("time").and_then(Value::as_i64)?,
                        price: parse_optional_f64(row.get("price"))?,
                        amount: parse_optional_f64(row.get("amount"))?,
                        side: match row.get("direction").and_then(Value::as_str) {
                            Some("sell") => Side::Sell,
                            _ => Side::Buy,
                        },
                        is_buyer_maker: None,
                        r#type: None,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn parse_candles(data: &Value) -> Vec<Candle> {
    let raw: Vec<Candle> = data
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    Some([
                        parse_optional_f64(row.get("time"))?,
                        parse_optional_f64(row.get("open"))?,
                        parse_optional_f64(row.get("high"))?,
                        parse_optional_f64(row.get("low"))?,
                        parse_optional_f64(row.get("close"))?,
                        parse_optional_f64(row.get("vol"))?,
                    ])
                })
                .collect()
        })
        .unwrap_or_default();
    ensure_ascending(raw)
}

pub fn parse_balances(data: &Value) -> Balances {
    let mut balances = Balances::new(now_ms());
    for row in data.as_array().into_iter().flatten() {
        let Some(asset) = row.get("currency").and_then(Value::as_str) else { continue };
        let free = parse_optional_f64(row.get("active")).unwrap_or(0.0);
        let used = parse_optional_f64(row.get("frozen")).unwrap_or(0.0);
        balances.insert_nonzero(asset.to_uppercase(), AssetBalance { free, used });
    }
    balances
}

fn parse_status(state: i64) -> OrderStatus {
    match state {
        0 => OrderStatus::New,
        1 => OrderStatus::PartiallyFilled,
        2 => OrderStatus::Filled,
        3 | 4 => OrderStatus::Canceled,
        other => OrderStatus::Unknown(other.to_string()),
    }
}

pub fn parse_order(symbol: &str, data: &Value) -> Result<Order, ExchangeError> {
    let id = data
        .get("orderId")
        .and_then(Value::as_i64)
        .ok_or_else(|| ExchangeError::BadRequest("missing orderId in Bitforex response".into()))?
        .to_string();
    let amount = parse_optional_f64(data.get("amount")).unwrap_or(0.0);
    let filled = parse_optional_f64(data.get("dealAmount")).unwrap_or(0.0);
    let price = parse_optional_f64(data.get("price"));
    let avg_price = parse_optional_f64(data.get("avgPrice"));
    let cost = avg_price.map(|avg| avg * filled).unwrap_or(0.0);
    let side = match data.get("tradeType").and_then(Value::as_i64) {
        Some(2) => Side::Sell,
        _ => Side::Buy,
    };
    let r#type = if price.is_some() { OrderType::Limit } else { OrderType::Market };
    let status = data.get("orderState").and_then(Value::as_i64).map(parse_status).unwrap_or(OrderStatus::Unknown("unknown".into()));
    let timestamp = data.get("createTime").and_then(Value::as_i64).unwrap_or_else(now_ms);
    Ok(Order::new(id, symbol, r#type, side, price, amount, filled, cost, status, timestamp))
}

pub fn parse_my_trade(symbol: &str, row: &Value) -> Option<MyTrade> {
    Some(MyTrade {
        trade: Trade {
            id: row.get("tradeId").and_then(Value::as_i64)?.to_string(),
            symbol: symbol.to_string(),
            timestamp: row.get("dealTime").and_then(Value::as_i64)?,
            price: parse_optional_f64(row.get("price"))?,
            amount: parse_optional_f64(row.get("amount"))?,
            side: match row.get("direction").and_then(Value::as_i64) {
                Some(2) => Side::Sell,
                _ => Side::Buy,
            },
            is_buyer_maker: None,
            r#type: None,
        },
        order_id: row.get("orderId").and_then(Value::as_i64)?.to_string(),
        fee: parse_optional_f64(row.get("fee")).map(|cost| spotlink_instrument::model::trade::Fee { cost, currency: String::new() }),
        is_maker: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn order_state_two_is_filled() {
        assert_eq!(parse_status(2), OrderStatus::Filled);
    }

    #[test]
    fn order_parses_sell_from_trade_type_two() {
        let data = json!({"orderId": 1, "amount": "1.0", "dealAmount": "1.0", "price": "30000", "avgPrice": "30000", "tradeType": 2, "orderState": 2, "createTime": 1});
        let order = parse_order("BTC/USDT", &data).unwrap();
        assert_eq!(order.side, Side::Sell);
    }
}
