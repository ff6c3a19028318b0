//! Gate.io returns bare JSON arrays/objects (spec §4.5) - no envelope to unwrap once
//! [`super::error::validate`] has passed the body through.

use crate::error::ExchangeError;
use serde_json::Value;
use spotlink_instrument::model::balance::{AssetBalance, Balances};
use spotlink_instrument::model::candle::{ensure_ascending, Candle};
use spotlink_instrument::model::order::{Order, OrderStatus, OrderType};
use spotlink_instrument::model::order_book::OrderBook;
use spotlink_instrument::model::ticker::Ticker;
use spotlink_instrument::model::trade::{Fee, MyTrade, Side, Trade};
use spotlink_integration::helpers::{now_ms, parse_optional_f64};

fn first(body: &Value) -> &Value {
    body.as_array().and_then(|rows| rows.first()).unwrap_or(&Value::Null)
}

fn side_of(value: Option<&str>) -> Side {
    match value {
        Some("sell") => Side::Sell,
        _ => Side::Buy,
    }
}

pub fn parse_ticker(symbol: &str, body: &Value) -> Ticker {
    let row = first(body);
    Ticker {
        symbol: symbol.to_string(),
        timestamp: now_ms(),
        high: parse_optional_f64(row.get("high_24h")),
        low: parse_optional_f64(row.get("low_24h")),
        open: None,
        last: parse_optional_f64(row.get("last")),
        close: parse_optional_f64(row.get("last")),
        bid: parse_optional_f64(row.get("highest_bid")),
        bid_volume: None,
        ask: parse_optional_f64(row.get("lowest_ask")),
        ask_volume: None,
        volume: parse_optional_f64(row.get("base_volume")),
        quote_volume: parse_optional_f64(row.get("quote_volume")),
        vwap: None,
        change: None,
        percentage: parse_optional_f64(row.get("change_percentage")),
    }
}

fn parse_levels(rows: Option<&Vec<Value>>) -> Vec<[f64; 2]> {
    rows.map(|rows| {
        rows.iter()
            .filter_map(|row| {
                let row = row.as_array()?;
                Some([parse_optional_f64(row.first())?, parse_optional_f64(row.get(1))?])
            })
            .collect()
    })
    .unwrap_or_default()
}

pub fn parse_order_book(symbol: &str, body: &Value) -> OrderBook {
    let bids = parse_levels(body.get("bids").and_then(Value::as_array));
    let asks = parse_levels(body.get("asks").and_then(Value::as_array));
    let id = body.get("id").and_then(Value::as_u64);
    OrderBook::new(symbol, now_ms(), id, bids, asks)
}

pub fn parse_trades(symbol: &str, body: &Value) -> Vec<Trade> {
    body.as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    Some(Trade {
                        id: row.get("id").and_then(Value::as_str)?.to_string(),
                        symbol: symbol.to_string(),
                        timestamp: row.get("create_time_ms").and_then(Value::as_str).and_then(|s| s.parse::<f64>().ok()).map(|ms| ms as i64)?,
                        price: parse_optional_f64(row.get("price"))?,
                        amount: parse_optional_f64(row.get("amount"))?,
                        side: side_of(row.get("side").and_then(Value::as_str)),
                        is_buyer_maker: None,
                        r#type: None,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Gate.io delivers `[ts_seconds, V, C, H, L, O, quoteV]` (spec §4.5); reorder to `O,H,L,C,V`.
pub fn parse_candles(body: &Value) -> Vec<Candle> {
    let raw: Vec<Candle> = body
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    let row = row.as_array()?;
                    let ts: f64 = parse_optional_f64(row.first())?;
                    Some([
                        ts * 1000.0,
                        parse_optional_f64(row.get(5))?,
                        parse_optional_f64(row.get(3))?,
                        parse_optional_f64(row.get(4))?,
                        parse_optional_f64(row.get(2))?,
                        parse_optional_f64(row.get(1))?,
                    ])
                })
                .collect()
        })
        .unwrap_or_default();
    ensure_ascending(raw)
}

pub fn parse_balances(body: &Value) -> Balances {
    let mut balances = Balances::new(now_ms());
    for row in body.as_array().into_iter().flatten() {
        let Some(asset) = row.get("currency").and_then(Value::as_str) else { continue };
        let free = parse_optional_f64(row.get("available")).unwrap_or(0.0);
        let used = parse_optional_f64(row.get("locked")).unwrap_or(0.0);
        balances.insert_nonzero(asset.to_string(), AssetBalance { free, used });
    }
    balances
}

fn parse_status(status: &str) -> OrderStatus {
    match status {
        "open" => OrderStatus::New,
        "closed" => OrderStatus::Filled,
        "cancelled" => OrderStatus::Canceled,
        other => OrderStatus::Unknown(other.to_string()),
    }
}

pub fn parse_order(symbol: &str, row: &Value) -> Result<Order, ExchangeError> {
    let id = row
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| ExchangeError::BadRequest("missing order id in Gate.io response".into()))?;
    let amount = parse_optional_f64(row.get("amount")).unwrap_or(0.0);
    let filled = parse_optional_f64(row.get("filled_total")).unwrap_or(0.0);
    let price = parse_optional_f64(row.get("price"));
    let status = row.get("status").and_then(Value::as_str).map(parse_status).unwrap_or(OrderStatus::Unknown("unknown".into()));
    let r#type = match row.get("type").and_then(Value::as_str) {
        Some("market") => OrderType::Market,
        _ => OrderType::Limit,
    };
    let side = side_of(row.get("side").and_then(Value::as_str));
    let cost = price.map(|p| p * filled).unwrap_or(0.0);
    let timestamp = row.get("create_time_ms").and_then(Value::as_str).and_then(|s| s.parse::<f64>().ok()).map(|ms| ms as i64).unwrap_or_else(now_ms);
    let mut order = Order::new(id.to_string(), symbol, r#type, side, price, amount, filled, cost, status, timestamp);
    order.client_order_id = row.get("text").and_then(Value::as_str).map(String::from);
    Ok(order)
}

pub fn parse_my_trade(symbol: &str, row: &Value) -> Option<MyTrade> {
    Some(MyTrade {
        trade: Trade {
            id: row.get("id").and_then(Value::as_str)?.to_string(),
            symbol: symbol.to_string(),
            timestamp: row.get("create_time_ms").and_then(Value::as_str).and_then(|s| s.parse::<f64>().ok()).map(|ms| ms as i64)?,
            price: parse_optional_f64(row.get("price"))?,
            amount: parse_optional_f64(row.get("amount"))?,
            side: side_of(row.get("side").and_then(Value::as_str)),
            is_buyer_maker: None,
            r#type: None,
        },
        order_id: row.get("order_id").and_then(Value::as_str)?.to_string(),
        fee: parse_optional_f64(row.get("fee")).map(|cost| Fee {
            cost,
            currency: row.get("fee_currency").and_then(Value::as_str).unwrap_or_default().to_string(),
        }),
        is_maker: row.get("role").and_then(Value::as_str) == Some("maker"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn candles_are_reordered_and_converted_to_milliseconds() {
        let body = json!([
            ["1609459260", "10.0", "1.5", "2.0", "0.5", "1.0", "15.0"],
            ["1609459200", "10.0", "1.5", "2.0", "0.5", "1.0", "15.0"],
        ]);
        let candles = parse_candles(&body);
        assert_eq!(candles[0], [1609459200000.0, 1.0, 2.0, 0.5, 1.5, 10.0]);
        assert_eq!(candles.iter().map(|c| c[0]).collect::<Vec<_>>(), vec![1609459200000.0, 1609459260000.0]);
    }

    #[test]
    fn closed_status_maps_to_filled() {
        assert_eq!(parse_status("closed"), OrderStatus::Filled);
    }
}
