use crate::error::ExchangeError;
use serde_json::Value;
use spotlink_instrument::model::balance::{AssetBalance, Balances};
use spotlink_instrument::model::candle::{ensure_ascending, Candle};
use spotlink_instrument::model::order::{Order, OrderStatus, OrderType, TimeInForce};
use spotlink_instrument::model::order_book::OrderBook;
use spotlink_instrument::model::ticker::Ticker;
use spotlink_instrument::model::trade::{Fee, MyTrade, Side, Trade};
use spotlink_integration::helpers::{now_ms, parse_optional_f64};

fn data(body: &Value) -> &[Value] {
    body.get("data").and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
}

pub fn parse_ticker(symbol: &str, body: &Value) -> Ticker {
    let row = data(body).first().cloned().unwrap_or(Value::Null);
    let timestamp = row.get("ts").and_then(Value::as_str).and_then(|s| s.parse().ok()).unwrap_or_else(now_ms);
    Ticker {
        symbol: symbol.to_string(),
        timestamp,
        high: parse_optional_f64(row.get("high24h")),
        low: parse_optional_f64(row.get("low24h")),
        open: parse_optional_f64(row.get("open24h")),
        last: parse_optional_f64(row.get("last")),
        close: parse_optional_f64(row.get("last")),
        bid: parse_optional_f64(row.get("bidPx")),
        bid_volume: parse_optional_f64(row.get("bidSz")),
        ask: parse_optional_f64(row.get("askPx")),
        ask_volume: parse_optional_f64(row.get("askSz")),
        volume: parse_optional_f64(row.get("vol24h")),
        quote_volume: parse_optional_f64(row.get("volCcy24h")),
        vwap: None,
        change: None,
        percentage: None,
    }
    .with_change()
}

fn parse_level(value: &Value) -> Option<[f64; 2]> {
    let pair = value.as_array()?;
    Some([parse_optional_f64(pair.first())?, parse_optional_f64(pair.get(1))?])
}

pub fn parse_order_book(symbol: &str, body: &Value) -> OrderBook {
    let row = data(body).first().cloned().unwrap_or(Value::Null);
    let bids = row.get("bids").and_then(Value::as_array).map(|l| l.iter().filter_map(parse_level).collect()).unwrap_or_default();
    let asks = row.get("asks").and_then(Value::as_array).map(|l| l.iter().filter_map(parse_level).collect()).unwrap_or_default();
    let timestamp = row.get("ts").and_then(Value::as_str).and_then(|s| s.parse().ok()).unwrap_or_else(now_ms);
    OrderBook::new(symbol, timestamp, None, bids, asks)
}

pub fn parse_trades(symbol: &str, body: &Value) -> Vec<Trade> {
    data(body)
        .iter()
        .filter_map(|row| {
            Some(Trade {
                id: row.get("tradeId")?.as_str()?.to_string(),
                symbol: symbol.to_string(),
                timestamp: row.get("ts").and_then(Value::as_str).and_then(|s| s.parse().ok())?,
                price: parse_optional_f64(row.get("px"))?,
                amount: parse_optional_f64(row.get("sz"))?,
                side: match row.get("side").and_then(Value::as_str) {
                    Some("sell") => Side::Sell,
                    _ => Side::Buy,
                },
                is_buyer_maker: None,
                r#type: None,
            })
        })
        .collect()
}

/// OKX delivers candles newest-first as `[ts, o, h, l, c, vol, ...]`; field order already
/// matches the unified shape, only the direction needs fixing.
pub fn parse_candles(body: &Value) -> Vec<Candle> {
    let raw: Vec<Candle> = data(body)
        .iter()
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
        .collect();
    ensure_ascending(raw)
}

pub fn parse_balances(body: &Value) -> Balances {
    let mut balances = Balances::new(now_ms());
    if let Some(details) = data(body).first().and_then(|row| row.get("details")).and_then(Value::as_array) {
        for entry in details {
            let Some(asset) = entry.get("ccy").and_then(Value::as_str) else { continue };
            let free = parse_optional_f64(entry.get("availBal")).unwrap_or(0.0);
            let used = parse_optional_f64(entry.get("frozenBal")).unwrap_or(0.0);
            balances.insert_nonzero(asset, AssetBalance { free, used });
        }
    }
    balances
}

fn parse_status(state: &str) -> OrderStatus {
    match state {
        "live" => OrderStatus::New,
        "partially_filled" => OrderStatus::PartiallyFilled,
        "filled" => OrderStatus::Filled,
        "canceled" => OrderStatus::Canceled,
        "mmp_canceled" => OrderStatus::Rejected,
        other => OrderStatus::Unknown(other.to_string()),
    }
}

pub fn parse_order(symbol: &str, row: &Value) -> Result<Order, ExchangeError> {
    let id = row
        .get("ordId")
        .and_then(Value::as_str)
        .ok_or_else(|| ExchangeError::BadRequest("missing ordId in OKX response".into()))?;
    let amount = parse_optional_f64(row.get("sz")).unwrap_or(0.0);
    let filled = parse_optional_f64(row.get("accFillSz")).unwrap_or(0.0);
    let average = parse_optional_f64(row.get("avgPx"));
    let cost = average.map(|avg| avg * filled).unwrap_or(0.0);
    let status = row.get("state").and_then(Value::as_str).map(parse_status).unwrap_or(OrderStatus::Unknown("unknown".into()));
    let r#type = match row.get("ordType").and_then(Value::as_str) {
        Some("market") => OrderType::Market,
        _ => OrderType::Limit,
    };
    let side = match row.get("side").and_then(Value::as_str) {
        Some("sell") => Side::Sell,
        _ => Side::Buy,
    };
    let mut order = Order::new(
        id,
        symbol,
        r#type,
        side,
        parse_optional_f64(row.get("px")),
        amount,
        filled,
        cost,
        status,
        row.get("cTime").and_then(Value::as_str).and_then(|s| s.parse().ok()).unwrap_or_else(now_ms),
    );
    order.client_order_id = row.get("clOrdId").and_then(Value::as_str).filter(|s| !s.is_empty()).map(String::from);
    order.time_in_force = match row.get("ordType").and_then(Value::as_str) {
        Some("ioc") => Some(TimeInForce::Ioc),
        Some("fok") => Some(TimeInForce::Fok),
        _ => Some(TimeInForce::Gtc),
    };
    Ok(order)
}

pub fn parse_my_trade(symbol: &str, row: &Value) -> Option<MyTrade> {
    Some(MyTrade {
        trade: Trade {
            id: row.get("tradeId")?.as_str()?.to_string(),
            symbol: symbol.to_string(),
            timestamp: row.get("ts").and_then(Value::as_str).and_then(|s| s.parse().ok())?,
            price: parse_optional_f64(row.get("fillPx"))?,
            amount: parse_optional_f64(row.get("fillSz"))?,
            side: match row.get("side").and_then(Value::as_str) {
                Some("sell") => Side::Sell,
                _ => Side::Buy,
            },
            is_buyer_maker: None,
            r#type: None,
        },
        order_id: row.get("ordId")?.as_str()?.to_string(),
        fee: parse_optional_f64(row.get("fee")).map(|cost| Fee {
            cost,
            currency: row.get("feeCcy").and_then(Value::as_str).unwrap_or_default().to_string(),
        }),
        is_maker: row.get("execType").and_then(Value::as_str) == Some("M"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn candles_are_reordered_ascending() {
        let body = json!({"code":"0","data": [
            ["3000","1","2","0.5","1.5","10"],
            ["1000","1","2","0.5","1.5","10"],
            ["2000","1","2","0.5","1.5","10"],
        ]});
        let candles = parse_candles(&body);
        assert_eq!(candles.iter().map(|c| c[0]).collect::<Vec<_>>(), vec![1000.0, 2000.0, 3000.0]);
    }
}
