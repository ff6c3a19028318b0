//! KuCoin wraps every payload in `{"code","data"}` (spec §4.5); parsers read `data` and convert
//! its string-encoded numerics into the unified shapes.

use crate::error::ExchangeError;
use serde_json::Value;
use spotlink_instrument::model::balance::{AssetBalance, Balances};
use spotlink_instrument::model::candle::{ensure_ascending, Candle};
use spotlink_instrument::model::order::{Order, OrderStatus, OrderType};
use spotlink_instrument::model::order_book::OrderBook;
use spotlink_instrument::model::ticker::Ticker;
use spotlink_instrument::model::trade::{Fee, MyTrade, Side, Trade};
use spotlink_integration::helpers::{now_ms, parse_optional_f64};

fn data(body: &Value) -> &Value {
    body.get("data").unwrap_or(&Value::Null)
}

fn side_of(value: Option<&str>) -> Side {
    match value {
        Some("sell") => Side::Sell,
        _ => Side::Buy,
    }
}

pub fn parse_ticker(symbol: &str, body: &Value) -> Ticker {
    let data = data(body);
    Ticker {
        symbol: symbol.to_string(),
        timestamp: data.get("time").and_then(Value::as_i64).unwrap_or_else(now_ms),
        high: None,
        low: None,
        open: None,
        last: parse_optional_f64(data.get("price")),
        close: parse_optional_f64(data.get("price")),
        bid: parse_optional_f64(data.get("bestBid")),
        bid_volume: parse_optional_f64(data.get("bestBidSize")),
        ask: parse_optional_f64(data.get("bestAsk")),
        ask_volume: parse_optional_f64(data.get("bestAskSize")),
        volume: None,
        quote_volume: None,
        vwap: None,
        change: None,
        percentage: None,
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
    let timestamp = data.get("time").and_then(Value::as_i64).unwrap_or_else(now_ms);
    OrderBook::new(symbol, timestamp, None, bids, asks)
}

pub fn parse_trades(symbol: &str, body: &Value) -> Vec<Trade> {
    data(body)
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    Some(Trade {
                        id: row.get("sequence").and_then(Value::as_str)?.to_string(),
                        symbol: symbol.to_string(),
                        timestamp: row.get("time").and_then(Value::as_str)?.parse::<i64>().ok()? / 1_000_000,
                        price: parse_optional_f64(row.get("price"))?,
                        amount: parse_optional_f64(row.get("size"))?,
                        side: side_of(row.get("side").and_then(Value::as_str)),
                        is_buyer_maker: None,
                        r#type: None,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// KuCoin delivers `[ts_seconds, O, C, H, L, V, turnover]` (spec §4.5); reorder to `O,H,L,C,V`
/// and convert the timestamp to milliseconds.
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
                        parse_optional_f64(row.get(3))?,
                        parse_optional_f64(row.get(4))?,
                        parse_optional_f64(row.get(2))?,
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
        if row.get("type").and_then(Value::as_str) != Some("trade") {
            continue;
        }
        let Some(asset) = row.get("currency").and_then(Value::as_str) else { continue };
        let free = parse_optional_f64(row.get("available")).unwrap_or(0.0);
        let used = parse_optional_f64(row.get("holds")).unwrap_or(0.0);
        balances.insert_nonzero(asset.to_string(), AssetBalance { free, used });
    }
    balances
}

fn parse_status(is_active: bool, cancel_exist: bool, filled: f64) -> OrderStatus {
    if is_active {
        if filled > 0.0 {
            OrderStatus::PartiallyFilled
        } else {
            OrderStatus::New
        }
    } else if cancel_exist {
        OrderStatus::Canceled
    } else {
        OrderStatus::Filled
    }
}

pub fn parse_order(row: &Value) -> Result<Order, ExchangeError> {
    let id = row
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| ExchangeError::BadRequest("missing order id in KuCoin response".into()))?;
    let symbol = row.get("symbol").and_then(Value::as_str).unwrap_or_default();
    let amount = parse_optional_f64(row.get("size")).unwrap_or(0.0);
    let filled = parse_optional_f64(row.get("dealSize")).unwrap_or(0.0);
    let cost = parse_optional_f64(row.get("dealFunds")).unwrap_or(0.0);
    let price = parse_optional_f64(row.get("price"));
    let is_active = row.get("isActive").and_then(Value::as_bool).unwrap_or(false);
    let cancel_exist = row.get("cancelExist").and_then(Value::as_bool).unwrap_or(false);
    let status = parse_status(is_active, cancel_exist, filled);
    let r#type = match row.get("type").and_then(Value::as_str) {
        Some("market") => OrderType::Market,
        _ => OrderType::Limit,
    };
    let side = side_of(row.get("side").and_then(Value::as_str));
    let timestamp = row.get("createdAt").and_then(Value::as_i64).unwrap_or_else(now_ms);
    let mut order = Order::new(id.to_string(), crate::venues::kucoin::symbols::from_venue(symbol), r#type, side, price, amount, filled, cost, status, timestamp);
    order.client_order_id = row.get("clientOid").and_then(Value::as_str).map(String::from);
    Ok(order)
}

pub fn parse_my_trade(row: &Value) -> Option<MyTrade> {
    let symbol = row.get("symbol").and_then(Value::as_str)?;
    Some(MyTrade {
        trade: Trade {
            id: row.get("tradeId").and_then(Value::as_str)?.to_string(),
            symbol: crate::venues::kucoin::symbols::from_venue(symbol),
            timestamp: row.get("createdAt").and_then(Value::as_i64)?,
            price: parse_optional_f64(row.get("price"))?,
            amount: parse_optional_f64(row.get("size"))?,
            side: side_of(row.get("side").and_then(Value::as_str)),
            is_buyer_maker: None,
            r#type: row.get("type").and_then(Value::as_str).map(String::from),
        },
        order_id: row.get("orderId").and_then(Value::as_str)?.to_string(),
        fee: parse_optional_f64(row.get("fee")).map(|cost| Fee {
            cost,
            currency: row.get("feeCurrency").and_then(Value::as_str).unwrap_or_default().to_string(),
        }),
        is_maker: row.get("liquidity").and_then(Value::as_str) == Some("maker"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn candles_are_reordered_and_converted_to_milliseconds() {
        let body = json!({"code": "200000", "data": [
            ["1609459260", "1.0", "1.5", "2.0", "0.5", "10.0", "15.0"],
            ["1609459200", "1.0", "1.5", "2.0", "0.5", "10.0", "15.0"],
        ]});
        let candles = parse_candles(&body);
        assert_eq!(candles[0], [1609459200000.0, 1.0, 2.0, 0.5, 1.5, 10.0]);
        assert_eq!(candles.iter().map(|c| c[0]).collect::<Vec<_>>(), vec![1609459200000.0, 1609459260000.0]);
    }

    #[test]
    fn inactive_order_without_cancel_is_filled() {
        assert_eq!(parse_status(false, false, 1.0), OrderStatus::Filled);
    }
}
