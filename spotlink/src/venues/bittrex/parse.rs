use crate::error::ExchangeError;
use serde_json::Value;
use spotlink_instrument::model::balance::{AssetBalance, Balances};
use spotlink_instrument::model::candle::{ensure_ascending, Candle};
use spotlink_instrument::model::order::{Order, OrderStatus, OrderType};
use spotlink_instrument::model::order_book::OrderBook;
use spotlink_instrument::model::ticker::Ticker;
use spotlink_instrument::model::trade::{MyTrade, Side, Trade};
use spotlink_integration::helpers::{now_ms, parse_optional_f64, iso8601_to_ms};

/// Bittrex splits ticker data across `GET /v3/markets/{symbol}/ticker` (price quotes) and
/// `GET /v3/markets/{symbol}/summary` (24h volume/change), so both bodies feed one [`Ticker`].
pub fn parse_ticker(symbol: &str, ticker: &Value, summary: &Value) -> Ticker {
    Ticker {
        symbol: symbol.to_string(),
        timestamp: summary.get("updatedAt").and_then(Value::as_str).and_then(iso8601_to_ms).unwrap_or_else(now_ms),
        high: parse_optional_f64(summary.get("high")),
        low: parse_optional_f64(summary.get("low")),
        open: None,
        last: parse_optional_f64(ticker.get("lastTradeRate")),
        close: parse_optional_f64(ticker.get("lastTradeRate")),
        bid: parse_optional_f64(ticker.get("bidRate")),
        bid_volume: None,
        ask: parse_optional_f64(ticker.get("askRate")),
        ask_volume: None,
        volume: parse_optional_f64(summary.get("volume")),
        quote_volume: parse_optional_f64(summary.get("quoteVolume")),
        vwap: None,
        change: None,
        percentage: parse_optional_f64(summary.get("percentChange")),
    }
}

fn parse_levels(rows: Option<&Vec<Value>>) -> Vec<[f64; 2]> {
    rows.map(|rows| rows.iter().filter_map(|row| Some([parse_optional_f64(row.get("rate"))?, parse_optional_f64(row.get("quantity"))?])).collect()).unwrap_or_default()
}

pub fn parse_order_book(symbol: &str, body: &Value) -> OrderBook {
    let bids = parse_levels(body.get("bid").and_then(Value::as_array));
    let asks = parse_levels(body.get("ask").and_then(Value::as_array));
    let nonce = body.get("sequence").and_then(Value::as_u64);
    OrderBook::new(symbol, now_ms(), nonce, bids, asks)
}

pub fn parse_trades(symbol: &str, body: &Value) -> Vec<Trade> {
    body.as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    Some(Trade {
                        id: row.get("id").and_then(Value::as_str)?.to_string(),
                        symbol: symbol.to_string(),
                        timestamp: row.get("executedAt").and_then(Value::as_str).and_then(iso8601_to_ms)?,
                        price: parse_optional_f64(row.get("rate"))?,
                        amount: parse_optional_f64(row.get("quantity"))?,
                        side: match row.get("takerSide").and_then(Value::as_str) {
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

pub fn parse_candles(body: &Value) -> Vec<Candle> {
    let raw: Vec<Candle> = body
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    Some([
                        row.get("startsAt").and_then(Value::as_str).and_then(iso8601_to_ms)? as f64,
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

pub fn parse_balances(body: &Value) -> Balances {
    let mut balances = Balances::new(now_ms());
    for row in body.as_array().into_iter().flatten() {
        let Some(asset) = row.get("currencySymbol").and_then(Value::as_str) else { continue };
        let total = parse_optional_f64(row.get("total")).unwrap_or(0.0);
        let free = parse_optional_f64(row.get("available")).unwrap_or(0.0);
        balances.insert_nonzero(asset, AssetBalance { free, used: total - free });
    }
    balances
}

fn parse_status(status: &str) -> OrderStatus {
    match status {
        "OPEN" => OrderStatus::New,
        "CLOSED" => OrderStatus::Filled,
        "CANCELLED" => OrderStatus::Canceled,
        other => OrderStatus::Unknown(other.to_string()),
    }
}

pub fn parse_order(row: &Value) -> Result<Order, ExchangeError> {
    let id = row
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| ExchangeError::BadRequest("missing order id in Bittrex response".into()))?;
    let symbol = row.get("marketSymbol").and_then(Value::as_str).map(super::symbols::from_venue).unwrap_or_default();
    let r#type = match row.get("type").and_then(Value::as_str) {
        Some(t) if t.starts_with("MARKET") => OrderType::Market,
        _ => OrderType::Limit,
    };
    let side = match row.get("direction").and_then(Value::as_str) {
        Some("SELL") => Side::Sell,
        _ => Side::Buy,
    };
    let amount = parse_optional_f64(row.get("quantity")).unwrap_or(0.0);
    let filled = parse_optional_f64(row.get("fillQuantity")).unwrap_or(0.0);
    let cost = parse_optional_f64(row.get("proceeds")).unwrap_or(0.0);
    let price = parse_optional_f64(row.get("limit"));
    let status = row.get("status").and_then(Value::as_str).map(parse_status).unwrap_or(OrderStatus::Unknown("unknown".into()));
    let timestamp = row.get("createdAt").and_then(Value::as_str).and_then(iso8601_to_ms).unwrap_or_else(now_ms);
    Ok(Order::new(id.to_string(), symbol, r#type, side, price, amount, filled, cost, status, timestamp))
}

pub fn parse_my_trade(row: &Value) -> Option<MyTrade> {
    let symbol = row.get("marketSymbol").and_then(Value::as_str).map(super::symbols::from_venue)?;
    Some(MyTrade {
        trade: Trade {
            id: row.get("id").and_then(Value::as_str)?.to_string(),
            symbol,
            timestamp: row.get("executedAt").and_then(Value::as_str).and_then(iso8601_to_ms)?,
            price: parse_optional_f64(row.get("rate"))?,
            amount: parse_optional_f64(row.get("quantity"))?,
            side: Side::Buy,
            is_buyer_maker: None,
            r#type: None,
        },
        order_id: row.get("orderId").and_then(Value::as_str)?.to_string(),
        fee: parse_optional_f64(row.get("commission")).map(|cost| spotlink_instrument::model::trade::Fee { cost, currency: String::new() }),
        is_maker: row.get("isTaker").and_then(Value::as_bool).map(|taker| !taker).unwrap_or(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn open_status_maps_to_new() {
        assert_eq!(parse_status("OPEN"), OrderStatus::New);
    }

    #[test]
    fn balance_used_is_total_minus_available() {
        let body = json!([{"currencySymbol": "BTC", "total": "2.0", "available": "1.5"}]);
        let balances = parse_balances(&body);
        let btc = balances.by_asset.get("BTC").unwrap();
        assert_eq!(btc.free, 1.5);
        assert_eq!(btc.used, 0.5);
    }
}
