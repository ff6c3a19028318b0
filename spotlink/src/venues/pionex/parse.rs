//! `error::validate` already unwraps Pionex's `{result, code, message, data}` envelope, so every
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

pub fn parse_ticker(symbol: &str, data: &Value) -> Option<Ticker> {
    let row = data.get("tickers").and_then(Value::as_array).and_then(|rows| rows.first())?;
    Some(Ticker {
        symbol: symbol.to_string(),
        timestamp: row.get("time").and_then(Value::as_i64).unwrap_or_else(now_ms),
        high: parse_optional_f64(row.get("high")),
        low: parse_optional_f64(row.get("low")),
        open: parse_optional_f64(row.get("open")),
        last: parse_optional_f64(row.get("close")),
        close: parse_optional_f64(row.get("close")),
        bid: None,
        bid_volume: None,
        ask: None,
        ask_volume: None,
        volume: parse_optional_f64(row.get("volume")),
        quote_volume: None,
        vwap: None,
        change: None,
        percentage: None,
    })
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

pub fn parse_order_book(symbol: &str, data: &Value) -> OrderBook {
    let bids = parse_levels(data.get("bids").and_then(Value::as_array));
    let asks = parse_levels(data.get("asks").and_then(Value::as_array));
    let timestamp = data.get("timestamp").and_then(Value::as_i64).unwrap_or_else(now_ms);
    OrderBook::new(symbol, timestamp, None, bids, asks)
}

pub fn parse_trades(symbol: &str, data: &Value) -> Vec<Trade> {
    data.get("trades")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .enumerate()
                .filter_map(|(index, row)| {
                    let timestamp = row.get("timestamp").and_then(Value::as_i64)?;
                    Some(Trade {
                        id: format!("{timestamp}-{index}"),
                        symbol: symbol.to_string(),
                        timestamp,
                        price: parse_optional_f64(row.get("price"))?,
                        amount: parse_optional_f64(row.get("size"))?,
                        side: match row.get("side").and_then(Value::as_str) {
                            Some("SELL") => Side::Sell,
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
        .get("klines")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    Some([
                        parse_optional_f64(row.get("time"))?,
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

pub fn parse_balances(data: &Value) -> Balances {
    let mut balances = Balances::new(now_ms());
    for row in data.get("balances").and_then(Value::as_array).into_iter().flatten() {
        let Some(asset) = row.get("coin").and_then(Value::as_str) else { continue };
        let free = parse_optional_f64(row.get("free")).unwrap_or(0.0);
        let used = parse_optional_f64(row.get("frozen")).unwrap_or(0.0);
        balances.insert_nonzero(asset.to_uppercase(), AssetBalance { free, used });
    }
    balances
}

fn parse_status(status: &str) -> OrderStatus {
    match status {
        "OPEN" | "NEW" => OrderStatus::New,
        "PARTIALLY_FILLED" => OrderStatus::PartiallyFilled,
        "FILLED" | "CLOSED" => OrderStatus::Filled,
        "CANCELED" | "REJECTED" => OrderStatus::Canceled,
        other => OrderStatus::Unknown(other.to_string()),
    }
}

pub fn parse_order(symbol: &str, data: &Value) -> Result<Order, ExchangeError> {
    let id = data
        .get("orderId")
        .and_then(Value::as_i64)
        .ok_or_else(|| ExchangeError::BadRequest("missing orderId in Pionex response".into()))?
        .to_string();
    let amount = parse_optional_f64(data.get("size")).unwrap_or(0.0);
    let filled = parse_optional_f64(data.get("filledSize")).unwrap_or(0.0);
    let cost = parse_optional_f64(data.get("filledAmount")).unwrap_or(0.0);
    let price = parse_optional_f64(data.get("price"));
    let side = match data.get("side").and_then(Value::as_str) {
        Some("SELL") => Side::Sell,
        _ => Side::Buy,
    };
    let r#type = match data.get("type").and_then(Value::as_str) {
        Some("MARKET") => OrderType::Market,
        _ => OrderType::Limit,
    };
    let status = data.get("status").and_then(Value::as_str).map(parse_status).unwrap_or(OrderStatus::Unknown("unknown".into()));
    let timestamp = data.get("createTime").and_then(Value::as_i64).unwrap_or_else(now_ms);
    Ok(Order::new(id, symbol, r#type, side, price, amount, filled, cost, status, timestamp))
}

pub fn parse_my_trade(symbol: &str, row: &Value) -> Option<MyTrade> {
    Some(MyTrade {
        trade: Trade {
            id: row.get("tradeId").and_then(Value::as_i64)?.to_string(),
            symbol: symbol.to_string(),
            timestamp: row.get("timestamp").and_then(Value::as_i64)?,
            price: parse_optional_f64(row.get("price"))?,
            amount: parse_optional_f64(row.get("size"))?,
            side: match row.get("side").and_then(Value::as_str) {
                Some("SELL") => Side::Sell,
                _ => Side::Buy,
            },
            is_buyer_maker: None,
            r#type: None,
        },
        order_id: row.get("orderId").and_then(Value::as_i64)?.to_string(),
        fee: parse_optional_f64(row.get("commission")).map(|cost| spotlink_instrument::model::trade::Fee {
            cost,
            currency: row.get("commissionCurrency").and_then(Value::as_str).unwrap_or_default().to_string(),
        }),
        is_maker: row.get("isMaker").and_then(Value::as_bool).unwrap_or(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filled_status_maps_to_filled() {
        assert_eq!(parse_status("FILLED"), OrderStatus::Filled);
    }

    #[test]
    fn ticker_reads_first_row() {
        let data = json!({"tickers": [{"symbol": "BTC_USDT", "close": "30000", "open": "29000", "high": "31000", "low": "28000", "volume": "10", "time": 1}]});
        let ticker = parse_ticker("BTC/USDT", &data).unwrap();
        assert_eq!(ticker.last, Some(30000.0));
    }
}
