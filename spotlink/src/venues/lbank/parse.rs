//! LBank wraps every payload in `{"result","data"}` (spec §4.5); parsers read `data`.

use crate::error::ExchangeError;
use serde_json::Value;
use spotlink_instrument::model::balance::{AssetBalance, Balances};
use spotlink_instrument::model::candle::{ensure_ascending, Candle};
use spotlink_instrument::model::order::{Order, OrderStatus, OrderType};
use spotlink_instrument::model::order_book::OrderBook;
use spotlink_instrument::model::ticker::Ticker;
use spotlink_instrument::model::trade::{MyTrade, Side, Trade};
use spotlink_integration::helpers::{now_ms, parse_optional_f64};

fn data(body: &Value) -> &Value {
    body.get("data").unwrap_or(&Value::Null)
}

fn side_of(value: Option<&str>) -> Side {
    match value {
        Some(s) if s.starts_with("sell") => Side::Sell,
        _ => Side::Buy,
    }
}

pub fn parse_ticker(symbol: &str, body: &Value) -> Ticker {
    let row = data(body).as_array().and_then(|rows| rows.first()).cloned().unwrap_or(Value::Null);
    let ticker = row.get("ticker").cloned().unwrap_or(Value::Null);
    Ticker {
        symbol: symbol.to_string(),
        timestamp: row.get("timestamp").and_then(Value::as_i64).unwrap_or_else(now_ms),
        high: parse_optional_f64(ticker.get("high")),
        low: parse_optional_f64(ticker.get("low")),
        open: None,
        last: parse_optional_f64(ticker.get("latest")),
        close: parse_optional_f64(ticker.get("latest")),
        bid: None,
        bid_volume: None,
        ask: None,
        ask_volume: None,
        volume: parse_optional_f64(ticker.get("vol")),
        quote_volume: parse_optional_f64(ticker.get("turnover")),
        vwap: None,
        change: None,
        percentage: parse_optional_f64(ticker.get("change")),
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
    let data = data(body);
    let bids = parse_levels(data.get("bids").and_then(Value::as_array));
    let asks = parse_levels(data.get("asks").and_then(Value::as_array));
    let timestamp = data.get("timestamp").and_then(Value::as_i64).unwrap_or_else(now_ms);
    OrderBook::new(symbol, timestamp, None, bids, asks)
}

pub fn parse_trades(symbol: &str, body: &Value) -> Vec<Trade> {
    data(body)
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    Some(Trade {
                        id: row.get("tid").and_then(Value::as_str)?.to_string(),
                        symbol: symbol.to_string(),
                        timestamp: row.get("date_ms").and_then(Value::as_i64)?,
                        price: parse_optional_f64(row.get("price"))?,
                        amount: parse_optional_f64(row.get("amount"))?,
                        side: side_of(row.get("type").and_then(Value::as_str)),
                        is_buyer_maker: None,
                        r#type: None,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// LBank delivers standard `[ts_seconds, O, H, L, C, V]` ordering (spec §4.5); only the
/// timestamp unit needs converting to milliseconds.
pub fn parse_candles(body: &Value) -> Vec<Candle> {
    let raw: Vec<Candle> = data(body)
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    let row = row.as_array()?;
                    let ts: f64 = parse_optional_f64(row.first())?;
                    Some([
                        ts * 1000.0,
                        parse_optional_f64(row.get(1))?,
                        parse_optional_f64(row.get(2))?,
                        parse_optional_f64(row.get(3))?,
                        parse_optional_f64(row.get(4))?,
                        parse_optional_f64(row.get(5))?,
                    ])
                })
                .collect()
        })
        .unwrap_or_default();
    ensure_ascending(raw)
}

pub fn parse_balances(body: &Value) -> Balances {
    let mut balances = Balances::new(now_ms());
    for row in data(body).as_array().into_iter().flatten() {
        let Some(asset) = row.get("coin").and_then(Value::as_str) else { continue };
        let free = parse_optional_f64(row.get("usableAmt")).unwrap_or(0.0);
        let used = parse_optional_f64(row.get("freezeAmt")).unwrap_or(0.0);
        balances.insert_nonzero(asset.to_string(), AssetBalance { free, used });
    }
    balances
}

fn parse_status(status: i64) -> OrderStatus {
    match status {
        -1 => OrderStatus::Canceled,
        0 => OrderStatus::New,
        1 => OrderStatus::PartiallyFilled,
        2 => OrderStatus::Filled,
        4 => OrderStatus::Canceled,
        other => OrderStatus::Unknown(other.to_string()),
    }
}

pub fn parse_order(symbol: &str, row: &Value) -> Result<Order, ExchangeError> {
    let id = row
        .get("order_id")
        .and_then(Value::as_str)
        .ok_or_else(|| ExchangeError::BadRequest("missing order id in LBank response".into()))?;
    let amount = parse_optional_f64(row.get("amount")).unwrap_or(0.0);
    let filled = parse_optional_f64(row.get("deal_amount")).unwrap_or(0.0);
    let price = parse_optional_f64(row.get("price"));
    let cost = parse_optional_f64(row.get("avg_price")).map(|avg| avg * filled).unwrap_or(0.0);
    let status = row.get("status").and_then(Value::as_i64).map(parse_status).unwrap_or(OrderStatus::Unknown("unknown".into()));
    let r#type = match row.get("type").and_then(Value::as_str) {
        Some(t) if t.contains("market") => OrderType::Market,
        _ => OrderType::Limit,
    };
    let side = side_of(row.get("type").and_then(Value::as_str));
    let timestamp = row.get("create_time").and_then(Value::as_i64).unwrap_or_else(now_ms);
    let order = Order::new(id.to_string(), symbol, r#type, side, price, amount, filled, cost, status, timestamp);
    Ok(order)
}

pub fn parse_my_trade(symbol: &str, row: &Value) -> Option<MyTrade> {
    Some(MyTrade {
        trade: Trade {
            id: row.get("txUuid").and_then(Value::as_str)?.to_string(),
            symbol: symbol.to_string(),
            timestamp: row.get("txTime").and_then(Value::as_i64)?,
            price: parse_optional_f64(row.get("txPrice"))?,
            amount: parse_optional_f64(row.get("txVolume"))?,
            side: side_of(row.get("tradeType").and_then(Value::as_str)),
            is_buyer_maker: None,
            r#type: None,
        },
        order_id: row.get("orderUuid").and_then(Value::as_str)?.to_string(),
        fee: None,
        is_maker: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn candles_convert_seconds_to_milliseconds() {
        let body = json!({"result": true, "data": [[1609459200, 1.0, 2.0, 0.5, 1.5, 10.0]]});
        let candles = parse_candles(&body);
        assert_eq!(candles[0][0], 1609459200000.0);
    }

    #[test]
    fn status_two_is_filled() {
        assert_eq!(parse_status(2), OrderStatus::Filled);
    }
}
