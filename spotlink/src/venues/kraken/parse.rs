use crate::error::ExchangeError;
use serde_json::Value;
use spotlink_instrument::model::balance::{canonicalize_asset, AssetBalance, Balances};
use spotlink_instrument::model::candle::{ensure_ascending, Candle};
use spotlink_instrument::model::order::{Order, OrderStatus, OrderType};
use spotlink_instrument::model::order_book::OrderBook;
use spotlink_instrument::model::ticker::Ticker;
use spotlink_instrument::model::trade::{Fee, MyTrade, Side, Trade};
use spotlink_integration::helpers::{now_ms, parse_optional_f64};

fn result(body: &Value) -> &Value {
    body.get("result").unwrap_or(body)
}

/// Kraken keys `result` by its own internal pair name (e.g. `XXBTZUSD`), which rarely matches
/// the alt name used in the request; the first (and only) entry is always the one asked for.
fn first_entry(body: &Value) -> &Value {
    result(body).as_object().and_then(|map| map.values().next()).unwrap_or(&Value::Null)
}

fn parse_pair(value: &Value, index: usize) -> Option<f64> {
    parse_optional_f64(value.as_array().and_then(|a| a.get(index)))
}

pub fn parse_ticker(symbol: &str, body: &Value) -> Ticker {
    let row = first_entry(body);
    Ticker {
        symbol: symbol.to_string(),
        timestamp: now_ms(),
        high: parse_pair(row.get("h").unwrap_or(&Value::Null), 1),
        low: parse_pair(row.get("l").unwrap_or(&Value::Null), 1),
        open: parse_optional_f64(row.get("o")),
        last: parse_pair(row.get("c").unwrap_or(&Value::Null), 0),
        close: parse_pair(row.get("c").unwrap_or(&Value::Null), 0),
        bid: parse_pair(row.get("b").unwrap_or(&Value::Null), 0),
        bid_volume: parse_pair(row.get("b").unwrap_or(&Value::Null), 2),
        ask: parse_pair(row.get("a").unwrap_or(&Value::Null), 0),
        ask_volume: parse_pair(row.get("a").unwrap_or(&Value::Null), 2),
        volume: parse_pair(row.get("v").unwrap_or(&Value::Null), 1),
        quote_volume: None,
        vwap: parse_pair(row.get("p").unwrap_or(&Value::Null), 1),
        change: None,
        percentage: None,
    }
    .with_change()
}

fn parse_level(value: &Value) -> Option<[f64; 2]> {
    let triple = value.as_array()?;
    Some([parse_optional_f64(triple.first())?, parse_optional_f64(triple.get(1))?])
}

pub fn parse_order_book(symbol: &str, body: &Value) -> OrderBook {
    let row = first_entry(body);
    let bids = row.get("bids").and_then(Value::as_array).map(|l| l.iter().filter_map(parse_level).collect()).unwrap_or_default();
    let asks = row.get("asks").and_then(Value::as_array).map(|l| l.iter().filter_map(parse_level).collect()).unwrap_or_default();
    OrderBook::new(symbol, now_ms(), None, bids, asks)
}

pub fn parse_trades(symbol: &str, body: &Value) -> Vec<Trade> {
    let row = first_entry(body);
    row.as_array()
        .map(|rows| {
            rows.iter()
                .enumerate()
                .filter_map(|(i, row)| {
                    let row = row.as_array()?;
                    let time = parse_optional_f64(row.get(2))?;
                    Some(Trade {
                        id: format!("{}-{i}", (time * 1000.0) as i64),
                        symbol: symbol.to_string(),
                        timestamp: (time * 1000.0) as i64,
                        price: parse_optional_f64(row.first())?,
                        amount: parse_optional_f64(row.get(1))?,
                        side: match row.get(3).and_then(Value::as_str) {
                            Some("s") => Side::Sell,
                            _ => Side::Buy,
                        },
                        is_buyer_maker: None,
                        r#type: row.get(4).and_then(Value::as_str).map(String::from),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn parse_candles(body: &Value) -> Vec<Candle> {
    let row = first_entry(body);
    let raw: Vec<Candle> = row
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    let row = row.as_array()?;
                    let ts = parse_optional_f64(row.first())?;
                    Some([
                        ts * 1000.0,
                        parse_optional_f64(row.get(1))?,
                        parse_optional_f64(row.get(2))?,
                        parse_optional_f64(row.get(3))?,
                        parse_optional_f64(row.get(4))?,
                        parse_optional_f64(row.get(6))?,
                    ])
                })
                .collect()
        })
        .unwrap_or_default();
    ensure_ascending(raw)
}

/// Kraken's `Balance` endpoint reports only a total per asset; nothing here distinguishes
/// held/locked funds, so the full amount is reported as free.
pub fn parse_balances(body: &Value) -> Balances {
    let mut balances = Balances::new(now_ms());
    if let Some(map) = result(body).as_object() {
        for (asset, value) in map {
            let free = parse_optional_f64(Some(value)).unwrap_or(0.0);
            balances.insert_nonzero(canonicalize_asset(asset), AssetBalance { free, used: 0.0 });
        }
    }
    balances
}

fn parse_status(status: &str) -> OrderStatus {
    match status {
        "pending" | "open" => OrderStatus::New,
        "closed" => OrderStatus::Filled,
        "canceled" => OrderStatus::Canceled,
        "expired" => OrderStatus::Expired,
        other => OrderStatus::Unknown(other.to_string()),
    }
}

pub fn parse_order(id: &str, symbol: &str, row: &Value) -> Result<Order, ExchangeError> {
    let descr = row.get("descr").unwrap_or(&Value::Null);
    let amount = parse_optional_f64(row.get("vol")).unwrap_or(0.0);
    let filled = parse_optional_f64(row.get("vol_exec")).unwrap_or(0.0);
    let cost = parse_optional_f64(row.get("cost")).unwrap_or(0.0);
    let status = row.get("status").and_then(Value::as_str).map(parse_status).unwrap_or(OrderStatus::Unknown("unknown".into()));
    let r#type = match descr.get("ordertype").and_then(Value::as_str) {
        Some("market") => OrderType::Market,
        _ => OrderType::Limit,
    };
    let side = match descr.get("type").and_then(Value::as_str) {
        Some("sell") => Side::Sell,
        _ => Side::Buy,
    };
    let timestamp = parse_optional_f64(row.get("opentm")).map(|t| (t * 1000.0) as i64).unwrap_or_else(now_ms);
    let mut order = Order::new(id, symbol, r#type, side, parse_optional_f64(descr.get("price")), amount, filled, cost, status, timestamp);
    order.fee = parse_optional_f64(row.get("fee")).map(|cost| Fee { cost, currency: String::new() });
    Ok(order)
}

pub fn parse_my_trade(id: &str, symbol: &str, row: &Value) -> Option<MyTrade> {
    Some(MyTrade {
        trade: Trade {
            id: id.to_string(),
            symbol: symbol.to_string(),
            timestamp: parse_optional_f64(row.get("time")).map(|t| (t * 1000.0) as i64)?,
            price: parse_optional_f64(row.get("price"))?,
            amount: parse_optional_f64(row.get("vol"))?,
            side: match row.get("type").and_then(Value::as_str) {
                Some("sell") => Side::Sell,
                _ => Side::Buy,
            },
            is_buyer_maker: None,
            r#type: row.get("ordertype").and_then(Value::as_str).map(String::from),
        },
        order_id: row.get("ordertxid")?.as_str()?.to_string(),
        fee: parse_optional_f64(row.get("fee")).map(|cost| Fee { cost, currency: String::new() }),
        is_maker: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn balance_asset_codes_are_canonicalized() {
        let body = json!({"error": [], "result": {"XXBT": "1.5", "ZUSD": "100.0"}});
        let balances = parse_balances(&body);
        assert!(balances.by_asset.contains_key("BTC"));
        assert!(balances.by_asset.contains_key("USD"));
    }

    #[test]
    fn ticker_reads_through_the_internal_pair_key() {
        let body = json!({"error": [], "result": {"XXBTZUSD": {"c": ["50000.0", "1.0"], "h": ["0", "51000.0"], "l": ["0", "49000.0"], "o": "49500.0"}}});
        let ticker = parse_ticker("BTC/USD", &body);
        assert_eq!(ticker.last, Some(50000.0));
    }
}
