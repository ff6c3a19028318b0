pub mod error;
pub mod parse;
pub mod sign;
pub mod symbols;
pub mod ws;

use crate::capability::Capabilities;
use crate::config::ExchangeConfig;
use crate::error::ExchangeError;
use crate::exchange::{Exchange, NewOrder};
use crate::market_cache::MarketCache;
use crate::request::{self, SignedRestClient};
use crate::ws_registry::WsRegistry;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use spotlink_instrument::exchange::ExchangeId;
use spotlink_instrument::model::balance::Balances;
use spotlink_instrument::model::candle::{Candle, Timeframe};
use spotlink_instrument::model::market::Market;
use spotlink_instrument::model::order::{Order, OrderType};
use spotlink_instrument::model::order_book::OrderBook;
use spotlink_instrument::model::ticker::Ticker;
use spotlink_instrument::model::trade::{MyTrade, Side, Trade};
use spotlink_integration::channel::{mpsc_unbounded, StreamRx};
use spotlink_integration::rate_limit::Throttler;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const BASE_URL: &str = "https://www.bitstamp.net";

pub struct Bitstamp {
    client: SignedRestClient<sign::BitstampSigner>,
    throttler: Throttler,
    markets: MarketCache,
    ws: WsRegistry,
}

fn timeframe_seconds(timeframe: Timeframe) -> u32 {
    match timeframe {
        Timeframe::M1 => 60,
        Timeframe::M5 => 300,
        Timeframe::M15 => 900,
        Timeframe::M30 => 1800,
        Timeframe::H1 => 3600,
        Timeframe::H4 => 14400,
        Timeframe::D1 => 86400,
        Timeframe::W1 => 604800,
    }
}

impl Bitstamp {
    pub fn new(config: ExchangeConfig) -> Self {
        let signer = sign::BitstampSigner::new(config.api_key, config.secret);
        let client = request::build_client(BASE_URL, signer, Arc::new(error::validate));
        Self {
            client,
            throttler: Throttler::new(200, 8.0, Duration::from_secs(1)),
            markets: MarketCache::new(),
            ws: WsRegistry::new(),
        }
    }

    async fn private_request(&self, method: Method, path: impl Into<std::borrow::Cow<'static, str>>, body: Option<Value>, weight: u32) -> Result<Value, ExchangeError> {
        request::request(&self.client, &self.throttler, method, path, None, body, true, weight).await
    }
}

#[async_trait]
impl Exchange for Bitstamp {
    fn id(&self) -> ExchangeId {
        ExchangeId::Bitstamp
    }

    fn capabilities(&self) -> Capabilities {
        let mut capabilities = Capabilities::full();
        capabilities.fetch_time = false;
        capabilities.fetch_avg_price = false;
        capabilities.fetch_trading_fees = false;
        capabilities.fetch_commission = false;
        capabilities.test_order = false;
        capabilities.cancel_all_orders = false;
        capabilities.amend_order = false;
        capabilities.fetch_closed_orders = false;
        capabilities
    }

    async fn load_markets(&self, force_reload: bool) -> Result<Arc<HashMap<String, Market>>, ExchangeError> {
        self.markets
            .load_markets(force_reload, || async {
                let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v2/trading-pairs-info/", None, None, false, 1).await?;
                let mut map = HashMap::new();
                for row in body.as_array().into_iter().flatten() {
                    let (Some(id), Some(name)) = (row.get("url_symbol").and_then(Value::as_str), row.get("name").and_then(Value::as_str)) else {
                        continue;
                    };
                    let Some((base, quote)) = name.split_once('/') else { continue };
                    let market = Market::new(ExchangeId::Bitstamp, id, base, quote);
                    map.insert(market.symbol.clone(), market);
                }
                Ok::<_, ExchangeError>(map)
            })
            .await
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError> {
        let path = format!("/api/v2/ticker/{}/", symbols::to_venue(symbol));
        let body = request::request(&self.client, &self.throttler, Method::GET, path, None, None, false, 1).await?;
        Ok(parse::parse_ticker(symbol, &body))
    }

    async fn fetch_order_book(&self, symbol: &str, _limit: Option<u32>) -> Result<OrderBook, ExchangeError> {
        let path = format!("/api/v2/order_book/{}/", symbols::to_venue(symbol));
        let body = request::request(&self.client, &self.throttler, Method::GET, path, None, None, false, 1).await?;
        Ok(parse::parse_order_book(symbol, &body))
    }

    async fn fetch_trades(&self, symbol: &str, _limit: Option<u32>) -> Result<Vec<Trade>, ExchangeError> {
        let path = format!("/api/v2/transactions/{}/", symbols::to_venue(symbol));
        let body = request::request(&self.client, &self.throttler, Method::GET, path, Some(json!({ "time": "hour" })), None, false, 1).await?;
        Ok(parse::parse_trades(symbol, &body))
    }

    async fn fetch_ohlcv(&self, symbol: &str, timeframe: Timeframe, limit: Option<u32>) -> Result<Vec<Candle>, ExchangeError> {
        let path = format!("/api/v2/ohlc/{}/", symbols::to_venue(symbol));
        let query = json!({ "step": timeframe_seconds(timeframe), "limit": limit.unwrap_or(100) });
        let body = request::request(&self.client, &self.throttler, Method::GET, path, Some(query), None, false, 1).await?;
        Ok(parse::parse_candles(&body))
    }

    async fn fetch_balance(&self) -> Result<Balances, ExchangeError> {
        let body = self.private_request(Method::POST, "/api/v2/balance/", None, 1).await?;
        Ok(parse::parse_balances(&body))
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, ExchangeError> {
        let side = if matches!(order.side, Side::Buy) { "buy" } else { "sell" };
        let venue_symbol = symbols::to_venue(&order.symbol);
        let path = match (order.r#type, order.price) {
            (OrderType::Market, _) => format!("/api/v2/{side}/market/{venue_symbol}/"),
            _ => format!("/api/v2/{side}/{venue_symbol}/"),
        };
        let mut body = json!({ "amount": order.amount.to_string() });
        if let Some(price) = order.price {
            body["price"] = json!(price.to_string());
        }
        let response = self.private_request(Method::POST, path, Some(body), 1).await?;
        parse::parse_order(&order.symbol, &response)
    }

    async fn cancel_order(&self, id: &str, _symbol: &str) -> Result<(), ExchangeError> {
        self.private_request(Method::POST, "/api/v2/cancel_order/", Some(json!({ "id": id })), 1).await?;
        Ok(())
    }

    async fn fetch_order(&self, id: &str, symbol: &str) -> Result<Order, ExchangeError> {
        let body = self.private_request(Method::POST, "/api/v2/order_status/", Some(json!({ "id": id })), 1).await?;
        parse::parse_order(symbol, &body)
    }

    async fn fetch_open_orders(&self, symbol: Option<&str>) -> Result<Vec<Order>, ExchangeError> {
        let symbol = symbol.ok_or_else(|| ExchangeError::BadRequest("Bitstamp requires a symbol to list open orders".into()))?;
        let path = format!("/api/v2/open_orders/{}/", symbols::to_venue(symbol));
        let body = self.private_request(Method::POST, path, None, 1).await?;
        body.as_array()
            .into_iter()
            .flatten()
            .map(|row| parse::parse_order(symbol, row))
            .collect()
    }

    async fn fetch_my_trades(&self, symbol: Option<&str>, limit: Option<u32>) -> Result<Vec<MyTrade>, ExchangeError> {
        let symbol = symbol.ok_or_else(|| ExchangeError::BadRequest("Bitstamp requires a symbol to list user transactions".into()))?;
        let path = format!("/api/v2/user_transactions/{}/", symbols::to_venue(symbol));
        let body = self.private_request(Method::POST, path, Some(json!({ "limit": limit.unwrap_or(100) })), 1).await?;
        Ok(body
            .as_array()
            .into_iter()
            .flatten()
            .filter(|row| row.get("type").and_then(Value::as_str) == Some("2"))
            .filter_map(|row| parse::parse_my_trade(symbol, row))
            .collect())
    }

    async fn watch_trades(&self, symbol: &str) -> Result<StreamRx<Trade>, ExchangeError> {
        let venue_symbol = symbols::to_venue(symbol);
        let channel = ws::trade_channel(&venue_symbol);
        let url = url::Url::parse(ws::WS_URL).expect("static bitstamp ws url is valid");
        let client = self.ws.get_or_connect(&url, ws::ping_strategy()).await.map_err(ExchangeError::NetworkError)?;

        client
            .send(&json!({ "event": "bts:subscribe", "data": { "channel": channel } }))
            .await
            .map_err(ExchangeError::NetworkError)?;

        let (tx, rx) = mpsc_unbounded::<Trade>();
        let symbol = symbol.to_string();
        client
            .register(
                &channel,
                Arc::new(move |text: &str| {
                    let Ok(value) = serde_json::from_str::<Value>(text) else { return };
                    if value.get("event").and_then(Value::as_str) != Some("trade") {
                        return;
                    }
                    let Some(data) = value.get("data") else { return };
                    if let Some(trade) = parse_stream_trade(&symbol, data) {
                        let _ = tx.tx.send(trade);
                    }
                }),
            )
            .await;
        Ok(rx)
    }

    async fn close_all_ws(&self) {
        self.ws.close_all().await;
    }
}

fn parse_stream_trade(symbol: &str, data: &Value) -> Option<Trade> {
    use spotlink_integration::helpers::parse_optional_f64;
    Some(Trade {
        id: data.get("id").and_then(Value::as_i64)?.to_string(),
        symbol: symbol.to_string(),
        timestamp: data.get("microtimestamp").and_then(Value::as_str).and_then(|s| s.parse::<i64>().ok()).map(|us| us / 1000)?,
        price: parse_optional_f64(data.get("price"))?,
        amount: parse_optional_f64(data.get("amount"))?,
        side: match data.get("type").and_then(Value::as_i64) {
            Some(1) => Side::Sell,
            _ => Side::Buy,
        },
        is_buyer_maker: None,
        r#type: None,
    })
}
