use crate::error::ExchangeError;
use serde_json::Value;
use spotlink_instrument::model::balance::{AssetBalance, Balances};
use spotlink_instrument::model::candle::{ensure_ascending, Candle};
use spotlink_instrument::model::order::{Order, OrderStatus, OrderType};
use spotlink_instrument::model::order_book::OrderBook;
use spotlink_instrument::model::ticker::Ticker;
use spotlink_instrument::model::trade::{Fee, MyTrade, Side, Trade};
use spotlink_integration::helpers::{now_ms, parse_optional_f64};

pub fn parse_ticker(symbol: &str, body: &Value) -> Ticker {
    Ticker {
        symbol: symbol.to_string(),
        timestamp: body.get("closeTime").and_then(Value::as_i64).unwrap_or_else(now_ms),
        high: parse_optional_f64(body.get("highPrice")),
        low: parse_optional_f64(body.get("lowPrice")),
        open: parse_optional_f64(body.get("openPrice")),
        last: parse_optional_f64(body.get("lastPrice")),
        close: parse_optional_f64(body.get("lastPrice")),
        bid: parse_optional_f64(body.get("bidPrice")),
        bid_volume: parse_optional_f64(body.get("bidQty")),
        ask: parse_optional_f64(body.get("askPrice")),
        ask_volume: parse_optional_f64(body.get("askQty")),
        volume: parse_optional_f64(body.get("volume")),
        quote_volume: parse_optional_f64(body.get("quoteVolume")),
        vwap: parse_optional_f64(body.get("weightedAvgPrice")),
        change: None,
        percentage: parse_optional_f64(body.get("priceChangePercent")),
    }
    .with_change()
}

fn parse_level(value: &Value) -> Option<[f64; 2]> {
    let pair = value.as_array()?;
    let price = parse_optional_f64(pair.first())?;
    let amount = parse_optional_f64(pair.get(1))?;
    Some([price, amount])
}

pub fn parse_order_book(symbol: &str, body: &Value) -> OrderBook {
    let bids = body
        .get("bids")
        .and_then(Value::as_array)
        .map(|levels| levels.iter().filter_map(parse_level).collect())
        .unwrap_or_default();
    let asks = body
        .get("asks")
        .and_then(Value::as_array)
        .map(|levels| levels.iter().filter_map(parse_level).collect())
        .unwrap_or_default();
    let nonce = body.get("lastUpdateId").and_then(Value::as_u64);
    OrderBook::new(symbol, now_ms(), nonce, bids, asks)
}

pub fn parse_trades(symbol: &str, body: &Value) -> Vec<Trade> {
    body.as_array()
        .map(|trades| {
            trades
                .iter()
                .filter_map(|trade| {
                    Some(Trade {
                        id: trade.get("id")?.to_string(),
                        symbol: symbol.to_string(),
                        timestamp: trade.get("time").and_then(Value::as_i64)?,
                        price: parse_optional_f64(trade.get("price"))?,
                        amount: parse_optional_f64(trade.get("qty"))?,
                        side: if trade.get("isBuyerMaker").and_then(Value::as_bool).unwrap_or(false) {
                            Side::Sell
                        } else {
                            Side::Buy
                        },
                        is_buyer_maker: trade.get("isBuyerMaker").and_then(Value::as_bool),
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
    if let Some(rows) = body.get("balances").and_then(Value::as_array) {
        for row in rows {
            let Some(asset) = row.get("asset").and_then(Value::as_str) else { continue };
            let free = parse_optional_f64(row.get("free")).unwrap_or(0.0);
            let locked = parse_optional_f64(row.get("locked")).unwrap_or(0.0);
            balances.insert_nonzero(asset, AssetBalance { free, used: locked });
        }
    }
    balances
}

fn parse_status(status: &str) -> OrderStatus {
    match status {
        "NEW" => OrderStatus::New,
        "PARTIALLY_FILLED" => OrderStatus::PartiallyFilled,
        "FILLED" => OrderStatus::Filled,
        "CANCELED" | "PENDING_CANCEL" => OrderStatus::Canceled,
        "REJECTED" => OrderStatus::Rejected,
        "EXPIRED" => OrderStatus::Expired,
        other => OrderStatus::Unknown(other.to_string()),
    }
}

pub fn parse_order(symbol: &str, body: &Value) -> Result<Order, ExchangeError> {
    let id = body
        .get("orderId")
        .map(|v| v.to_string())
        .ok_or_else(|| ExchangeError::BadRequest("missing orderId in Binance response".into()))?;
    let amount = parse_optional_f64(body.get("origQty")).unwrap_or(0.0);
    let filled = parse_optional_f64(body.get("executedQty")).unwrap_or(0.0);
    let cost = parse_optional_f64(body.get("cummulativeQuoteQty")).unwrap_or(0.0);
    let status = body
        .get("status")
        .and_then(Value::as_str)
        .map(parse_status)
        .unwrap_or(OrderStatus::Unknown("UNKNOWN".into()));
    let r#type = match body.get("type").and_then(Value::as_str) {
        Some("MARKET") => OrderType::Market,
        _ => OrderType::Limit,
    };
    let side = match body.get("side").and_then(Value::as_str) {
        Some("SELL") => Side::Sell,
        _ => Side::Buy,
    };
    let mut order = Order::new(
        id,
        symbol,
        r#type,
        side,
        parse_optional_f64(body.get("price")),
        amount,
        filled,
        cost,
        status,
        body.get("time").or_else(|| body.get("transactTime")).and_then(Value::as_i64).unwrap_or_else(now_ms),
    );
    order.client_order_id = body.get("clientOrderId").and_then(Value::as_str).map(String::from);
    Ok(order)
}

pub fn parse_my_trade(symbol: &str, body: &Value) -> Option<MyTrade> {
    Some(MyTrade {
        trade: Trade {
            id: body.get("id")?.to_string(),
            symbol: symbol.to_string(),
            timestamp: body.get("time").and_then(Value::as_i64)?,
            price: parse_optional_f64(body.get("price"))?,
            amount: parse_optional_f64(body.get("qty"))?,
            side: if body.get("isBuyer").and_then(Value::as_bool).unwrap_or(true) {
                Side::Buy
            } else {
                Side::Sell
            },
            is_buyer_maker: body.get("isBuyerMaker").and_then(Value::as_bool),
            r#type: None,
        },
        order_id: body.get("orderId")?.to_string(),
        fee: parse_optional_f64(body.get("commission")).map(|cost| Fee {
            cost,
            currency: body
                .get("commissionAsset")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }),
        is_maker: body.get("isMaker").and_then(Value::as_bool).unwrap_or(false),
    })
}
