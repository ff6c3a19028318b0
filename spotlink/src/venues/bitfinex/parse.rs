//! Bitfinex V2 responses are raw Json arrays, positionally encoded, rather than objects (spec
//! §4.1) - every parser here indexes into `Value::Array` instead of looking up named fields.

use crate::error::ExchangeError;
use serde_json::Value;
use spotlink_instrument::model::balance::{AssetBalance, Balances};
use spotlink_instrument::model::candle::{ensure_ascending, Candle};
use spotlink_instrument::model::order::{Order, OrderStatus, OrderType};
use spotlink_instrument::model::order_book::OrderBook;
use spotlink_instrument::model::ticker::Ticker;
use spotlink_instrument::model::trade::{MyTrade, Side, Trade};
use spotlink_integration::helpers::{now_ms, parse_optional_f64};

fn at(row: &Value, index: usize) -> Option<&Value> {
    row.as_array()?.get(index)
}

pub fn parse_ticker(symbol: &str, body: &Value) -> Ticker {
    Ticker {
        symbol: symbol.to_string(),
        timestamp: now_ms(),
        high: parse_optional_f64(at(body, 8)),
        low: parse_optional_f64(at(body, 9)),
        open: None,
        last: parse_optional_f64(at(body, 6)),
        close: parse_optional_f64(at(body, 6)),
        bid: parse_optional_f64(at(body, 0)),
        bid_volume: parse_optional_f64(at(body, 1)),
        ask: parse_optional_f64(at(body, 2)),
        ask_volume: parse_optional_f64(at(body, 3)),
        volume: parse_optional_f64(at(body, 7)),
        quote_volume: None,
        vwap: None,
        change: parse_optional_f64(at(body, 4)),
        percentage: parse_optional_f64(at(body, 5)),
    }
}

pub fn parse_order_book(symbol: &str, body: &Value) -> OrderBook {
    let mut bids = Vec::new();
    let mut asks = Vec::new();
    for level in body.as_array().into_iter().flatten() {
        let (Some(price), Some(amount)) = (parse_optional_f64(at(level, 0)), parse_optional_f64(at(level, 2))) else { continue };
        if amount.is_sign_positive() {
            bids.push([price, amount]);
        } else {
            asks.push([price, -amount]);
        }
    }
    OrderBook::new(symbol, now_ms(), None, bids, asks)
}

pub fn parse_trades(symbol: &str, body: &Value) -> Vec<Trade> {
    body.as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    let amount = parse_optional_f64(at(row, 2))?;
                    Some(Trade {
                        id: at(row, 0)?.as_i64()?.to_string(),
                        symbol: symbol.to_string(),
                        timestamp: at(row, 1)?.as_i64()?,
                        price: parse_optional_f64(at(row, 3))?,
                        amount: amount.abs(),
                        side: Side::from_signed_amount(amount),
                        is_buyer_maker: None,
                        r#type: None,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Bitfinex delivers `[MTS, OPEN, CLOSE, HIGH, LOW, VOLUME]` newest-first; reorder fields to the
/// unified `O,H,L,C,V` layout and sort ascending (spec §4.5, §8 property 3).
pub fn parse_candles(body: &Value) -> Vec<Candle> {
    let raw: Vec<Candle> = body
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    Some([
                        parse_optional_f64(at(row, 0))?,
                        parse_optional_f64(at(row, 1))?,
                        parse_optional_f64(at(row, 3))?,
                        parse_optional_f64(at(row, 4))?,
                        parse_optional_f64(at(row, 2))?,
                        parse_optional_f64(at(row, 5))?,
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
        if at(row, 0).and_then(Value::as_str) != Some("exchange") {
            continue;
        }
        let Some(asset) = at(row, 1).and_then(Value::as_str) else { continue };
        let total = parse_optional_f64(at(row, 2)).unwrap_or(0.0);
        let available = parse_optional_f64(at(row, 4)).unwrap_or(total);
        let asset = if asset == "UST" { "USDT".to_string() } else { asset.to_string() };
        balances.insert_nonzero(asset, AssetBalance { free: available, used: total - available });
    }
    balances
}

fn parse_status(status: &str) -> OrderStatus {
    if status.starts_with("ACTIVE") {
        OrderStatus::New
    } else if status.starts_with("EXECUTED") {
        OrderStatus::Filled
    } else if status.starts_with("PARTIALLY FILLED") {
        OrderStatus::PartiallyFilled
    } else if status.starts_with("CANCELED") || status.starts_with("POSTONLY CANCELED") {
        OrderStatus::Canceled
    } else if status.starts_with("RSN_") {
        OrderStatus::Rejected
    } else {
        OrderStatus::Unknown(status.to_string())
    }
}

/// Extract the single order array from an `order/submit`/`order/cancel` notification envelope
/// (`[MTS, TYPE, MESSAGE_ID, null, [[ORDER]], CODE, STATUS, TEXT]`), or pass a bare order array
/// through unchanged for endpoints that return it directly (`orders`, `orders/hist`).
pub fn unwrap_order_notification(body: &Value) -> Value {
    let Some(candidate) = at(body, 4) else { return body.clone() };
    match candidate.as_array().and_then(|rows| rows.first()) {
        Some(inner) if inner.is_array() => inner.clone(),
        _ => candidate.clone(),
    }
}

pub fn parse_order(symbol: &str, row: &Value) -> Result<Order, ExchangeError> {
    let id = at(row, 0)
        .and_then(Value::as_i64)
        .ok_or_else(|| ExchangeError::BadRequest("missing order id in Bitfinex response".into()))?;
    let amount_orig = parse_optional_f64(at(row, 7)).unwrap_or(0.0);
    let remaining = parse_optional_f64(at(row, 6)).unwrap_or(0.0);
    let amount = amount_orig.abs();
    let filled = amount - remaining.abs();
    let price = parse_optional_f64(at(row, 16));
    let average = parse_optional_f64(at(row, 17));
    let cost = average.map(|avg| avg * filled).unwrap_or(0.0);
    let status = at(row, 13).and_then(Value::as_str).map(parse_status).unwrap_or(OrderStatus::Unknown("unknown".into()));
    let r#type = match at(row, 8).and_then(Value::as_str) {
        Some(t) if t.contains("MARKET") => OrderType::Market,
        _ => OrderType::Limit,
    };
    let mut order = Order::new(id.to_string(), symbol, r#type, Side::from_signed_amount(amount_orig), price, amount, filled, cost, status, at(row, 4).and_then(Value::as_i64).unwrap_or_else(now_ms));
    order.client_order_id = at(row, 2).and_then(Value::as_i64).map(|cid| cid.to_string());
    Ok(order)
}

pub fn parse_my_trade(symbol: &str, row: &Value) -> Option<MyTrade> {
    let amount = parse_optional_f64(at(row, 4))?;
    Some(MyTrade {
        trade: Trade {
            id: at(row, 0)?.as_i64()?.to_string(),
            symbol: symbol.to_string(),
            timestamp: at(row, 2)?.as_i64()?,
            price: parse_optional_f64(at(row, 5))?,
            amount: amount.abs(),
            side: Side::from_signed_amount(amount),
            is_buyer_maker: None,
            r#type: None,
        },
        order_id: at(row, 3)?.as_i64()?.to_string(),
        fee: parse_optional_f64(at(row, 9)).map(|cost| spotlink_instrument::model::trade::Fee {
            cost: cost.abs(),
            currency: at(row, 10).and_then(Value::as_str).unwrap_or_default().to_string(),
        }),
        is_maker: at(row, 8).and_then(Value::as_bool).unwrap_or(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn candles_are_reordered_to_ohlcv() {
        let body = json!([
            [3000, 1.0, 1.5, 2.0, 0.5, 10.0],
            [1000, 1.0, 1.5, 2.0, 0.5, 10.0],
        ]);
        let candles = parse_candles(&body);
        assert_eq!(candles[0], [1000.0, 1.0, 2.0, 0.5, 1.5, 10.0]);
        assert_eq!(candles.iter().map(|c| c[0]).collect::<Vec<_>>(), vec![1000.0, 3000.0]);
    }

    #[test]
    fn negative_book_amount_is_an_ask() {
        let body = json!([[100.0, 1, 5.0], [101.0, 1, -2.0]]);
        let book = parse_order_book("BTC/USD", &body);
        assert_eq!(book.bids, vec![[100.0, 5.0]]);
        assert_eq!(book.asks, vec![[101.0, 2.0]]);
    }
}
