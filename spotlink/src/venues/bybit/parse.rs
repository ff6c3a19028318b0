use crate::error::ExchangeError;
use serde_json::Value;
use spotlink_instrument::model::balance::{AssetBalance, Balances};
use spotlink_instrument::model::candle::{ensure_ascending, Candle};
use spotlink_instrument::model::order::{Order, OrderStatus, OrderType};
use spotlink_instrument::model::order_book::OrderBook;
use spotlink_instrument::model::ticker::Ticker;
use spotlink_instrument::model::trade::{Fee, MyTrade, Side, Trade};
use spotlink_integration::helpers::{now_ms, parse_optional_f64};

fn result(body: &Value) -> &Value {
    body.get("result").unwrap_or(body)
}

pub fn parse_ticker(symbol: &str, body: &Value) -> Ticker {
    let row = result(body)
        .get("list")
        .and_then(Value::as_array)
        .and_then(|rows| rows.first())
        .cloned()
        .unwrap_or(Value::Null);
    Ticker {
        symbol: symbol.to_string(),
        timestamp: now_ms(),
        high: parse_optional_f64(row.get("highPrice24h")),
        low: parse_optional_f64(row.get("lowPrice24h")),
        open: parse_optional_f64(row.get("prevPrice24h")),
        last: parse_optional_f64(row.get("lastPrice")),
        close: parse_optional_f64(row.get("lastPrice")),
        bid: parse_optional_f64(row.get("bid1Price")),
        bid_volume: parse_optional_f64(row.get("bid1Size")),
        ask: parse_optional_f64(row.get("ask1Price")),
        ask_volume: parse_optional_f64(row.get("ask1Size")),
        volume: parse_optional_f64(row.get("volume24h")),
        quote_volume: parse_optional_f64(row.get("turnover24h")),
        vwap: None,
        change: None,
        percentage: parse_optional_f64(row.get("price24hPcnt")),
    }
    .with_change()
}

fn parse_level(value: &Value) -> Option<[f64; 2]> {
    let pair = value.as_array()?;
    Some([parse_optional_f64(pair.first())?, parse_optional_f64(pair.get(1))?])
}

pub fn parse_order_book(symbol: &str, body: &Value) -> OrderBook {
    let row = result(body);
    let bids = row.get("b").and_then(Value::as_array).map(|l| l.iter().filter_map(parse_level).collect()).unwrap_or_default();
    let asks = row.get("a").and_then(Value::as_array).map(|l| l.iter().filter_map(parse_level).collect()).unwrap_or_default();
    let nonce = row.get("u").and_then(Value::as_u64);
    let timestamp = row.get("ts").and_then(Value::as_i64).unwrap_or_else(now_ms);
    OrderBook::new(symbol, timestamp, nonce, bids, asks)
}

pub fn parse_trades(symbol: &str, body: &Value) -> Vec<Trade> {
    result(body)
        .get("list")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    Some(Trade {
                        id: row.get("execId")?.as_str()?.to_string(),
                        symbol: symbol.to_string(),
                        timestamp: row.get("time").and_then(Value::as_str).and_then(|s| s.parse().ok())?,
                        price: parse_optional_f64(row.get("price"))?,
                        amount: parse_optional_f64(row.get("size"))?,
                        side: match row.get("side").and_then(Value::as_str) {
                            Some("Sell") => Side::Sell,
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
    let raw: Vec<Candle> = result(body)
        .get("list")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    let row = row.as_array()?;
                    Some([
                        parse_optional_f64(row.first())?,
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
    if let Some(accounts) = result(body).get("list").and_then(Value::as_array) {
        for account in accounts {
            if let Some(coins) = account.get("coin").and_then(Value::as_array) {
                for coin in coins {
                    let Some(asset) = coin.get("coin").and_then(Value::as_str) else { continue };
                    let total = parse_optional_f64(coin.get("walletBalance")).unwrap_or(0.0);
                    let locked = parse_optional_f64(coin.get("locked")).unwrap_or(0.0);
                    balances.insert_nonzero(asset, AssetBalance { free: total - locked, used: locked });
                }
            }
        }
    }
    balances
}

fn parse_status(status: &str) -> OrderStatus {
    match status {
        "New" | "Created" => OrderStatus::New,
        "PartiallyFilled" => OrderStatus::PartiallyFilled,
        "Filled" => OrderStatus::Filled,
        "Cancelled" | "PendingCancel" => OrderStatus::Canceled,
        "Rejected" => OrderStatus::Rejected,
        "Deactivated" => OrderStatus::Expired,
        other => OrderStatus::Unknown(other.to_string()),
    }
}

pub fn parse_order(symbol: &str, row: &Value) -> Result<Order, ExchangeError> {
    let id = row
        .get("orderId")
        .and_then(Value::as_str)
        .ok_or_else(|| ExchangeError::BadRequest("missing orderId in Bybit response".into()))?;
    let amount = parse_optional_f64(row.get("qty")).unwrap_or(0.0);
    let filled = parse_optional_f64(row.get("cumExecQty")).unwrap_or(0.0);
    let cost = parse_optional_f64(row.get("cumExecValue")).unwrap_or(0.0);
    let status = row.get("orderStatus").and_then(Value::as_str).map(parse_status).unwrap_or(OrderStatus::Unknown("Unknown".into()));
    let r#type = match row.get("orderType").and_then(Value::as_str) {
        Some("Market") => OrderType::Market,
        _ => OrderType::Limit,
    };
    let side = match row.get("side").and_then(Value::as_str) {
        Some("Sell") => Side::Sell,
        _ => Side::Buy,
    };
    let mut order = Order::new(
        id,
        symbol,
        r#type,
        side,
        parse_optional_f64(row.get("price")),
        amount,
        filled,
        cost,
        status,
        row.get("createdTime").and_then(Value::as_str).and_then(|s| s.parse().ok()).unwrap_or_else(now_ms),
    );
    order.client_order_id = row.get("orderLinkId").and_then(Value::as_str).map(String::from);
    Ok(order)
}

pub fn parse_my_trade(symbol: &str, row: &Value) -> Option<MyTrade> {
    Some(MyTrade {
        trade: Trade {
            id: row.get("execId")?.as_str()?.to_string(),
            symbol: symbol.to_string(),
            timestamp: row.get("execTime").and_then(Value::as_str).and_then(|s| s.parse().ok())?,
            price: parse_optional_f64(row.get("execPrice"))?,
            amount: parse_optional_f64(row.get("execQty"))?,
            side: match row.get("side").and_then(Value::as_str) {
                Some("Sell") => Side::Sell,
                _ => Side::Buy,
            },
            is_buyer_maker: None,
            r#type: None,
        },
        order_id: row.get("orderId")?.as_str()?.to_string(),
        fee: parse_optional_f64(row.get("execFee")).map(|cost| Fee {
            cost,
            currency: row.get("feeCurrency").and_then(Value::as_str).unwrap_or_default().to_string(),
        }),
        is_maker: row.get("isMaker").and_then(Value::as_bool).unwrap_or(false),
    })
}
