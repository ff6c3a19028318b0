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
use spotlink_integration::channel::{mpsc_unbounded, StreamRx, StreamTx};
use spotlink_integration::helpers::now_ms;
use spotlink_integration::rate_limit::Throttler;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const BASE_URL: &str = "https://api.pionex.com";

pub struct Pionex {
    client: SignedRestClient<sign::PionexSigner>,
    throttler: Throttler,
    markets: MarketCache,
    ws: WsRegistry,
    trade_senders: Arc<Mutex<HashMap<String, StreamTx<Trade>>>>,
}

fn timeframe_code(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::M1 => "1M",
        Timeframe::M5 => "5M",
        Timeframe::M15 => "15M",
        Timeframe::M30 => "30M",
        Timeframe::H1 => "60M",
        Timeframe::H4 => "4H",
        Timeframe::D1 => "1D",
        Timeframe::W1 => "1W",
    }
}

impl Pionex {
    pub fn new(config: ExchangeConfig) -> Self {
        let signer = sign::PionexSigner::new(config.api_key, config.secret);
        let client = request::build_client(BASE_URL, signer, Arc::new(error::validate));
        Self {
            client,
            throttler: Throttler::new(200, 10.0, Duration::from_secs(1)),
            markets: MarketCache::new(),
            ws: WsRegistry::new(),
            trade_senders: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Injects the `timestamp` field [`sign::PionexSigner`] needs to find in the query string it
    /// re-derives, so it reaches the venue as part of the request rather than only the signature.
    async fn private_request(&self, method: Method, path: impl Into<std::borrow::Cow<'static, str>>, mut query: Value, body: Option<Value>, weight: u32) -> Result<Value, ExchangeError> {
        query["timestamp"] = json!(now_ms());
        request::request(&self.client, &self.throttler, method, path, Some(query), body, true, weight).await
    }
}

#[async_trait]
impl Exchange for Pionex {
    fn id(&self) -> ExchangeId {
        ExchangeId::Pionex
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
                let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v1/common/symbols", None, None, false, 1).await?;
                let mut map = HashMap::new();
                for row in body.get("symbols").and_then(Value::as_array).into_iter().flatten() {
                    let (Some(id), Some(base), Some(quote)) = (
                        row.get("symbol").and_then(Value::as_str),
                        row.get("baseCurrency").and_then(Value::as_str),
                        row.get("quoteCurrency").and_then(Value::as_str),
                    ) else {
                        continue;
                    };
                    let market = Market::new(ExchangeId::Pionex, id, base, quote);
                    map.insert(market.symbol.clone(), market);
                }
                Ok::<_, ExchangeError>(map)
            })
            .await
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError> {
        let query = json!({ "symbol": symbols::to_venue(symbol) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v1/market/tickers", Some(query), None, false, 1).await?;
        parse::parse_ticker(symbol, &body).ok_or_else(|| ExchangeError::BadRequest(format!("Pionex returned no ticker row for {symbol}")))
    }

    async fn fetch_order_book(&self, symbol: &str, limit: Option<u32>) -> Result<OrderBook, ExchangeError> {
        let query = json!({ "symbol": symbols::to_venue(symbol), "limit": limit.unwrap_or(20) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v1/market/depth", Some(query), None, false, 1).await?;
        Ok(parse::parse_order_book(symbol, &body))
    }

    async fn fetch_trades(&self, symbol: &str, limit: Option<u32>) -> Result<Vec<Trade>, ExchangeError> {
        let query = json!({ "symbol": symbols::to_venue(symbol), "limit": limit.unwrap_or(100) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v1/market/trades", Some(query), None, false, 1).await?;
        Ok(parse::parse_trades(symbol, &body))
    }

    async fn fetch_ohlcv(&self, symbol: &str, timeframe: Timeframe, limit: Option<u32>) -> Result<Vec<Candle>, ExchangeError> {
        let query = json!({ "symbol": symbols::to_venue(symbol), "interval": timeframe_code(timeframe), "limit": limit.unwrap_or(100) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v1/market/klines", Some(query), None, false, 1).await?;
        Ok(parse::parse_candles(&body))
    }

    async fn fetch_balance(&self) -> Result<Balances, ExchangeError> {
        let body = self.private_request(Method::GET, "/api/v1/account/balances", json!({}), None, 1).await?;
        Ok(parse::parse_balances(&body))
    }

    /// Pionex routes spot market orders by which side is trading: a market buy supplies
    /// quote-currency spend in `amount`; a market sell supplies base-currency quantity in
    /// `size` (spec §6 example 6). Limit orders always carry both `price` and `size`.
    async fn create_order(&self, order: NewOrder) -> Result<Order, ExchangeError> {
        let mut query = json!({
            "symbol": symbols::to_venue(&order.symbol),
            "side": if matches!(order.side, Side::Buy) { "BUY" } else { "SELL" },
            "type": if matches!(order.r#type, OrderType::Market) { "MARKET" } else { "LIMIT" },
        });
        match (order.r#type, order.side) {
            (OrderType::Market, Side::Buy) => query["amount"] = json!(order.amount.to_string()),
            (OrderType::Market, Side::Sell) => query["size"] = json!(order.amount.to_string()),
            (OrderType::Limit, _) => {
                query["size"] = json!(order.amount.to_string());
                if let Some(price) = order.price {
                    query["price"] = json!(price.to_string());
                }
            }
        }
        let response = self.private_request(Method::POST, "/api/v1/trade/order", query, None, 1).await?;
        let id = response
            .get("orderId")
            .and_then(Value::as_i64)
            .ok_or_else(|| ExchangeError::BadRequest("Pionex order response carried no orderId".into()))?
            .to_string();
        self.fetch_order(&id, &order.symbol).await
    }

    async fn cancel_order(&self, id: &str, symbol: &str) -> Result<(), ExchangeError> {
        let id: i64 = id.parse().map_err(|_| ExchangeError::BadRequest("invalid Pionex order id".into()))?;
        self.private_request(Method::DELETE, "/api/v1/trade/order", json!({ "symbol": symbols::to_venue(symbol), "orderId": id }), None, 1).await?;
        Ok(())
    }

    async fn fetch_order(&self, id: &str, symbol: &str) -> Result<Order, ExchangeError> {
        let id: i64 = id.parse().map_err(|_| ExchangeError::BadRequest("invalid Pionex order id".into()))?;
        let body = self.private_request(Method::GET, "/api/v1/trade/order", json!({ "orderId": id }), None, 1).await?;
        parse::parse_order(symbol, &body)
    }

    async fn fetch_open_orders(&self, symbol: Option<&str>) -> Result<Vec<Order>, ExchangeError> {
        let mut query = json!({});
        if let Some(symbol) = symbol {
            query["symbol"] = json!(symbols::to_venue(symbol));
        }
        let body = self.private_request(Method::GET, "/api/v1/trade/openOrders", query, None, 1).await?;
        body.get("orders")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .map(|row| {
                let venue_symbol = row.get("symbol").and_then(Value::as_str).unwrap_or_default();
                parse::parse_order(symbol.unwrap_or(&symbols::from_venue(venue_symbol)), row)
            })
            .collect()
    }

    async fn fetch_my_trades(&self, symbol: Option<&str>, limit: Option<u32>) -> Result<Vec<MyTrade>, ExchangeError> {
        let mut query = json!({ "limit": limit.unwrap_or(100) });
        if let Some(symbol) = symbol {
            query["symbol"] = json!(symbols::to_venue(symbol));
        }
        let body = self.private_request(Method::GET, "/api/v1/trade/fills", query, None, 1).await?;
        Ok(body
            .get("fills")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|row| {
                let venue_symbol = row.get("symbol").and_then(Value::as_str).unwrap_or_default();
                parse::parse_my_trade(symbol.unwrap_or(&symbols::from_venue(venue_symbol)), row)
            })
            .collect())
    }

    async fn watch_trades(&self, symbol: &str) -> Result<StreamRx<Trade>, ExchangeError> {
        let venue_symbol = symbols::to_venue(symbol);
        let url = url::Url::parse(ws::WS_URL).expect("static pionex ws url is valid");
        let client = self.ws.get_or_connect(&url, ws::ping_strategy()).await.map_err(ExchangeError::NetworkError)?;

        client
            .send(&json!({ "op": "SUBSCRIBE", "topic": "TRADE", "symbol": venue_symbol }))
            .await
            .map_err(ExchangeError::NetworkError)?;

        let (tx, rx) = mpsc_unbounded::<Trade>();
        self.trade_senders.lock().expect("trade_senders mutex poisoned").insert(venue_symbol, tx);

        let senders = self.trade_senders.clone();
        let ping_client = client.clone();
        client
            .register(
                "*",
                Arc::new(move |text: &str| {
                    if text == "PING" {
                        let client = ping_client.clone();
                        tokio::spawn(async move {
                            let _ = client.send_raw_text("PONG").await;
                        });
                        return;
                    }
                    let Ok(value) = serde_json::from_str::<Value>(text) else { return };
                    if value.get("topic").and_then(Value::as_str) != Some("TRADE") {
                        return;
                    }
                    let Some(venue_symbol) = value.get("symbol").and_then(Value::as_str) else { return };
                    let Some(data) = value.get("data") else { return };
                    let Some(trade) = parse_stream_trade(venue_symbol, data) else { return };
                    let Ok(senders) = senders.lock() else { return };
                    if let Some(tx) = senders.get(venue_symbol) {
                        let _ = tx.tx.send(trade);
                    }
                }),
            )
            .await;
        Ok(rx)
    }

    async fn close_all_ws(&self) {
        self.ws.close_all().await;
        self.trade_senders.lock().expect("trade_senders mutex poisoned").clear();
    }
}

fn parse_stream_trade(venue_symbol: &str, data: &Value) -> Option<Trade> {
    use spotlink_integration::helpers::parse_optional_f64;
    let timestamp = data.get("timestamp").and_then(Value::as_i64)?;
    Some(Trade {
        id: format!("{venue_symbol}-{timestamp}"),
        symbol: symbols::from_venue(venue_symbol),
        timestamp,
        price: parse_optional_f64(data.get("price"))?,
        amount: parse_optional_f64(data.get("size"))?,
        side: match data.get("side").and_then(Value::as_str) {
            Some("SELL") => Side::Sell,
            _ => Side::Buy,
        },
        is_buyer_maker: None,
        r#type: None,
    })
}
