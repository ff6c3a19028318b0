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
use spotlink_integration::rate_limit::Throttler;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const BASE_URL: &str = "https://api.bittrex.com";

pub struct Bittrex {
    client: SignedRestClient<sign::BittrexSigner>,
    throttler: Throttler,
    markets: MarketCache,
    ws: WsRegistry,
    invocation_ids: ws::InvocationIds,
    trade_senders: Arc<Mutex<HashMap<String, StreamTx<Trade>>>>,
}

fn timeframe_code(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::M1 => "MINUTE_1",
        Timeframe::M5 => "MINUTE_5",
        Timeframe::M15 => "MINUTE_15",
        Timeframe::M30 => "MINUTE_30",
        Timeframe::H1 => "HOUR_1",
        Timeframe::H4 => "HOUR_1",
        Timeframe::D1 => "DAY_1",
        Timeframe::W1 => "DAY_1",
    }
}

impl Bittrex {
    pub fn new(config: ExchangeConfig) -> Self {
        let signer = sign::BittrexSigner::new(config.api_key, config.secret, BASE_URL);
        let client = request::build_client(BASE_URL, signer, Arc::new(error::validate));
        Self {
            client,
            throttler: Throttler::new(200, 60.0, Duration::from_secs(1)),
            markets: MarketCache::new(),
            ws: WsRegistry::new(),
            invocation_ids: ws::InvocationIds::new(),
            trade_senders: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn private_request(&self, method: Method, path: impl Into<std::borrow::Cow<'static, str>>, query: Option<Value>, body: Option<Value>, weight: u32) -> Result<Value, ExchangeError> {
        request::request(&self.client, &self.throttler, method, path, query, body, true, weight).await
    }
}

#[async_trait]
impl Exchange for Bittrex {
    fn id(&self) -> ExchangeId {
        ExchangeId::Bittrex
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
                let body = request::request(&self.client, &self.throttler, Method::GET, "/v3/markets", None, None, false, 1).await?;
                let mut map = HashMap::new();
                for row in body.as_array().into_iter().flatten() {
                    let (Some(id), Some(base), Some(quote)) = (
                        row.get("symbol").and_then(Value::as_str),
                        row.get("baseCurrencySymbol").and_then(Value::as_str),
                        row.get("quoteCurrencySymbol").and_then(Value::as_str),
                    ) else {
                        continue;
                    };
                    let market = Market::new(ExchangeId::Bittrex, id, base, quote);
                    map.insert(market.symbol.clone(), market);
                }
                Ok::<_, ExchangeError>(map)
            })
            .await
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError> {
        let venue_symbol = symbols::to_venue(symbol);
        let ticker = request::request(&self.client, &self.throttler, Method::GET, format!("/v3/markets/{venue_symbol}/ticker"), None, None, false, 1).await?;
        let summary = request::request(&self.client, &self.throttler, Method::GET, format!("/v3/markets/{venue_symbol}/summary"), None, None, false, 1).await?;
        Ok(parse::parse_ticker(symbol, &ticker, &summary))
    }

    async fn fetch_order_book(&self, symbol: &str, limit: Option<u32>) -> Result<OrderBook, ExchangeError> {
        let query = json!({ "depth": limit.unwrap_or(25) });
        let path = format!("/v3/markets/{}/orderbook", symbols::to_venue(symbol));
        let body = request::request(&self.client, &self.throttler, Method::GET, path, Some(query), None, false, 1).await?;
        Ok(parse::parse_order_book(symbol, &body))
    }

    async fn fetch_trades(&self, symbol: &str, _limit: Option<u32>) -> Result<Vec<Trade>, ExchangeError> {
        let path = format!("/v3/markets/{}/trades", symbols::to_venue(symbol));
        let body = request::request(&self.client, &self.throttler, Method::GET, path, None, None, false, 1).await?;
        Ok(parse::parse_trades(symbol, &body))
    }

    async fn fetch_ohlcv(&self, symbol: &str, timeframe: Timeframe, _limit: Option<u32>) -> Result<Vec<Candle>, ExchangeError> {
        let path = format!("/v3/markets/{}/candles/{}/recent", symbols::to_venue(symbol), timeframe_code(timeframe));
        let body = request::request(&self.client, &self.throttler, Method::GET, path, None, None, false, 1).await?;
        Ok(parse::parse_candles(&body))
    }

    async fn fetch_balance(&self) -> Result<Balances, ExchangeError> {
        let body = self.private_request(Method::GET, "/v3/balances", None, None, 1).await?;
        Ok(parse::parse_balances(&body))
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, ExchangeError> {
        let body = json!({
            "marketSymbol": symbols::to_venue(&order.symbol),
            "direction": if matches!(order.side, Side::Buy) { "BUY" } else { "SELL" },
            "type": if matches!(order.r#type, OrderType::Market) { "MARKET" } else { "LIMIT" },
            "quantity": order.amount.to_string(),
            "limit": order.price.map(|p| p.to_string()),
            "timeInForce": "GOOD_TIL_CANCELLED",
        });
        let response = self.private_request(Method::POST, "/v3/orders", None, Some(body), 1).await?;
        parse::parse_order(&response)
    }

    async fn cancel_order(&self, id: &str, _symbol: &str) -> Result<(), ExchangeError> {
        self.private_request(Method::DELETE, format!("/v3/orders/{id}"), None, None, 1).await?;
        Ok(())
    }

    async fn fetch_order(&self, id: &str, _symbol: &str) -> Result<Order, ExchangeError> {
        let body = self.private_request(Method::GET, format!("/v3/orders/{id}"), None, None, 1).await?;
        parse::parse_order(&body)
    }

    async fn fetch_open_orders(&self, symbol: Option<&str>) -> Result<Vec<Order>, ExchangeError> {
        let mut query = json!({});
        if let Some(symbol) = symbol {
            query["marketSymbol"] = json!(symbols::to_venue(symbol));
        }
        let body = self.private_request(Method::GET, "/v3/orders/open", Some(query), None, 1).await?;
        body.as_array().into_iter().flatten().map(parse::parse_order).collect()
    }

    async fn fetch_my_trades(&self, symbol: Option<&str>, _limit: Option<u32>) -> Result<Vec<MyTrade>, ExchangeError> {
        let mut query = json!({});
        if let Some(symbol) = symbol {
            query["marketSymbol"] = json!(symbols::to_venue(symbol));
        }
        let body = self.private_request(Method::GET, "/v3/executions", Some(query), None, 1).await?;
        Ok(body.as_array().into_iter().flatten().filter_map(parse::parse_my_trade).collect())
    }

    async fn watch_trades(&self, symbol: &str) -> Result<StreamRx<Trade>, ExchangeError> {
        let venue_symbol = symbols::to_venue(symbol);
        let channel = format!("trade_{venue_symbol}");
        let url = url::Url::parse(ws::WS_URL).expect("static bittrex ws url is valid");
        let client = self.ws.get_or_connect(&url, ws::ping_strategy()).await.map_err(ExchangeError::NetworkError)?;

        client
            .send(&json!({ "H": "c3", "M": "Subscribe", "A": [[channel.clone()]], "I": self.invocation_ids.next() }))
            .await
            .map_err(ExchangeError::NetworkError)?;

        let (tx, rx) = mpsc_unbounded::<Trade>();
        self.trade_senders.lock().expect("trade_senders mutex poisoned").insert(channel, tx);

        let senders = self.trade_senders.clone();
        client
            .register(
                "*",
                Arc::new(move |text: &str| {
                    let Ok(value) = serde_json::from_str::<Value>(text) else { return };
                    for invocation in value.get("M").and_then(Value::as_array).into_iter().flatten() {
                        if invocation.get("M").and_then(Value::as_str) != Some("trade") {
                            continue;
                        }
                        let Some(payload) = invocation.get("A").and_then(Value::as_array).and_then(|a| a.first()) else { continue };
                        let Some(market_symbol) = payload.get("marketSymbol").and_then(Value::as_str) else { continue };
                        let channel = format!("trade_{market_symbol}");
                        let Ok(senders) = senders.lock() else { continue };
                        let Some(tx) = senders.get(&channel) else { continue };
                        for delta in payload.get("deltas").and_then(Value::as_array).into_iter().flatten() {
                            if let Some(trade) = parse_stream_trade(market_symbol, delta) {
                                let _ = tx.tx.send(trade);
                            }
                        }
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

fn parse_stream_trade(venue_symbol: &str, delta: &Value) -> Option<Trade> {
    use spotlink_integration::helpers::{iso8601_to_ms, parse_optional_f64};
    Some(Trade {
        id: delta.get("id").and_then(Value::as_str)?.to_string(),
        symbol: symbols::from_venue(venue_symbol),
        timestamp: delta.get("executedAt").and_then(Value::as_str).and_then(iso8601_to_ms)?,
        price: parse_optional_f64(delta.get("rate"))?,
        amount: parse_optional_f64(delta.get("quantity"))?,
        side: match delta.get("takerSide").and_then(Value::as_str) {
            Some("SELL") => Side::Sell,
            _ => Side::Buy,
        },
        is_buyer_maker: None,
        r#type: None,
    })
}
