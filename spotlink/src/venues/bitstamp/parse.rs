//! Bitstamp returns bare JSON (spec §4.5); balances are a single flat object with a
//! `{currency}_balance`/`{currency}_available`/`{currency}_reserved` key triplet per asset
//! instead of a list, so [`parse_balances`] must enumerate the object's own keys.

use crate::error::ExchangeError;
use serde_json::Value;
use spotlink_instrument::model::balance::{AssetBalance, Balances};
use spotlink_instrument::model::candle::{ensure_ascending, Candle};
use spotlink_instrument::model::order::{Order, OrderStatus, OrderType};
use spotlink_instrument::model::order_book::OrderBook;
use spotlink_instrument::model::ticker::Ticker;
use spotlink_instrument::model::trade::{MyTrade, Side, Trade};
use spotlink_integration::helpers::{now_ms, parse_optional_f64};

pub fn parse_ticker(symbol: &str, body: &Value) -> Ticker {
    Ticker {
        symbol: symbol.to_string(),
        timestamp: body.get("timestamp").and_then(Value::as_str).and_then(|s| s.parse::<i64>().ok()).map(|s| s * 1000).unwrap_or_else(now_ms),
        high: parse_optional_f64(body.get("high")),
        low: parse_optional_f64(body.get("low")),
        open: parse_optional_f64(body.get("open")),
        last: parse_optional_f64(body.get("last")),
        close: parse_optional_f64(body.get("last")),
        bid: parse_optional_f64(body.get("bid")),
        bid_volume: None,
        ask: parse_optional_f64(body.get("ask")),
        ask_volume: None,
        volume: parse_optional_f64(body.get("volume")),
        quote_volume: None,
        vwap: parse_optional_f64(body.get("vwap")),
        change: None,
        percentage: parse_optional_f64(body.get("percent_change_24")),
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
    let timestamp = body.get("timestamp").and_then(Value::as_str).and_then(|s| s.parse::<i64>().ok()).map(|s| s * 1000).unwrap_or_else(now_ms);
    OrderBook::new(symbol, timestamp, None, bids, asks)
}

pub fn parse_trades(symbol: &str, body: &Value) -> Vec<Trade> {
    body.as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    Some(Trade {
                        id: row.get("tid").and_then(Value::as_str)?.to_string(),
                        symbol: symbol.to_string(),
                        timestamp: row.get("date").and_then(Value::as_str)?.parse::<i64>().ok()? * 1000,
                        price: parse_optional_f64(row.get("price"))?,
                        amount: parse_optional_f64(row.get("amount"))?,
                        side: match row.get("type").and_then(Value::as_str) {
                            Some("1") => Side::Sell,
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

pub fn parse_candles(body: &Value) -> Vec<Candle> {
    let raw: Vec<Candle> = body
        .get("data")
        .and_then(|d| d.get("ohlc"))
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    let ts: i64 = row.get("timestamp").and_then(Value::as_str)?.parse().ok()?;
                    Some([
                        (ts * 1000) as f64,
                        parse_optional_f64(row.get("open"))?,
                        parse_optional_f64(row.get("high"))?,
                        parse_optional_f64(row.get("low"))?,
                        parse_optional_f64(row.get("close"))?,
                        parse_optional_f64(row.get("volume"))?,
                    ])
                })
                .collect()
        })
        .unwrap_or_default();
    ensure_ascending(raw)
}

/// Bitstamp's balance response is a single flat object keyed `{currency}_balance` /
/// `{currency}_available` / `{currency}_reserved` rather than a list of rows.
pub fn parse_balances(body: &Value) -> Balances {
    let mut balances = Balances::new(now_ms());
    let Some(object) = body.as_object() else { return balances };
    for key in object.keys() {
        let Some(asset) = key.strip_suffix("_balance") else { continue };
        let free = parse_optional_f64(object.get(&format!("{asset}_available"))).unwrap_or(0.0);
        let used = parse_optional_f64(object.get(&format!("{asset}_reserved"))).unwrap_or(0.0);
        balances.insert_nonzero(asset.to_uppercase(), AssetBalance { free, used });
    }
    balances
}

fn parse_status(status: &str, remaining: f64, amount: f64) -> OrderStatus {
    match status {
        "In Queue" if remaining == amount => OrderStatus::New,
        "In Queue" | "Open" => OrderStatus::PartiallyFilled,
        "Finished" => OrderStatus::Filled,
        "Canceled" => OrderStatus::Canceled,
        other => OrderStatus::Unknown(other.to_string()),
    }
}

pub fn parse_order(symbol: &str, row: &Value) -> Result<Order, ExchangeError> {
    let id = row
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| ExchangeError::BadRequest("missing order id in Bitstamp response".into()))?;
    let amount = parse_optional_f64(row.get("amount")).unwrap_or(0.0);
    let remaining = parse_optional_f64(row.get("amount_remaining")).unwrap_or(amount);
    let filled = amount - remaining;
    let price = parse_optional_f64(row.get("price"));
    let status = row.get("status").and_then(Value::as_str).map(|s| parse_status(s, remaining, amount)).unwrap_or(OrderStatus::Unknown("unknown".into()));
    let r#type = match row.get("type").and_then(Value::as_str) {
        Some("market") => OrderType::Market,
        _ => OrderType::Limit,
    };
    let side = match row.get("type").and_then(Value::as_i64) {
        Some(1) => Side::Sell,
        _ => Side::Buy,
    };
    let cost = price.map(|p| p * filled).unwrap_or(0.0);
    let timestamp = row.get("datetime").and_then(Value::as_str).map(|_| now_ms()).unwrap_or_else(now_ms);
    let order = Order::new(id.to_string(), symbol, r#type, side, price, amount, filled, cost, status, timestamp);
    Ok(order)
}

pub fn parse_my_trade(symbol: &str, row: &Value) -> Option<MyTrade> {
    Some(MyTrade {
        trade: Trade {
            id: row.get("id").and_then(Value::as_i64)?.to_string(),
            symbol: symbol.to_string(),
            timestamp: now_ms(),
            price: parse_optional_f64(row.get(symbol)).or_else(|| parse_optional_f64(row.get("price")))?,
            amount: parse_optional_f64(row.get("amount"))?,
            side: match row.get("type").and_then(Value::as_str) {
                Some("1") => Side::Sell,
                _ => Side::Buy,
            },
            is_buyer_maker: None,
            r#type: None,
        },
        order_id: row.get("order_id").and_then(Value::as_i64)?.to_string(),
        fee: parse_optional_f64(row.get("fee")).map(|cost| spotlink_instrument::model::trade::Fee { cost, currency: String::new() }),
        is_maker: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flat_balance_object_is_expanded_per_asset() {
        let body = json!({"btc_balance": "1.5", "btc_available": "1.0", "btc_reserved": "0.5"});
        let balances = parse_balances(&body);
        let btc = balances.by_asset.get("BTC").unwrap();
        assert_eq!(btc.free, 1.0);
        assert_eq!(btc.used, 0.5);
    }

    #[test]
    fn finished_status_maps_to_filled() {
        assert_eq!(parse_status("Finished", 0.0, 1.0), OrderStatus::Filled);
    }
}
