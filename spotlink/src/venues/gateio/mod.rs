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

const BASE_URL: &str = "https://api.gateio.ws/api/v4";

pub struct Gateio {
    client: SignedRestClient<sign::GateioSigner>,
    throttler: Throttler,
    markets: MarketCache,
    ws: WsRegistry,
    trade_senders: Arc<Mutex<HashMap<String, StreamTx<Trade>>>>,
}

fn timeframe_code(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::M1 => "1m",
        Timeframe::M5 => "5m",
        Timeframe::M15 => "15m",
        Timeframe::M30 => "30m",
        Timeframe::H1 => "1h",
        Timeframe::H4 => "4h",
        Timeframe::D1 => "1d",
        Timeframe::W1 => "7d",
    }
}

impl Gateio {
    pub fn new(config: ExchangeConfig) -> Self {
        let signer = sign::GateioSigner::new(config.api_key, config.secret);
        let client = request::build_client(BASE_URL, signer, Arc::new(error::validate));
        Self {
            client,
            throttler: Throttler::new(200, 10.0, std::time::Duration::from_secs(1)),
            markets: MarketCache::new(),
            ws: WsRegistry::new(),
            trade_senders: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn private_request(&self, method: Method, path: impl Into<std::borrow::Cow<'static, str>>, query: Option<Value>, body: Option<Value>, weight: u32) -> Result<Value, ExchangeError> {
        request::request(&self.client, &self.throttler, method, path, query, body, true, weight).await
    }
}

#[async_trait]
impl Exchange for Gateio {
    fn id(&self) -> ExchangeId {
        ExchangeId::Gateio
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
                let body = request::request(&self.client, &self.throttler, Method::GET, "/spot/currency_pairs", None, None, false, 1).await?;
                let mut map = HashMap::new();
                for row in body.as_array().into_iter().flatten() {
                    let (Some(id), Some(base), Some(quote)) = (
                        row.get("id").and_then(Value::as_str),
                        row.get("base").and_then(Value::as_str),
                        row.get("quote").and_then(Value::as_str),
                    ) else {
                        continue;
                    };
                    let market = Market::new(ExchangeId::Gateio, id, base, quote);
                    map.insert(market.symbol.clone(), market);
                }
                Ok::<_, ExchangeError>(map)
            })
            .await
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError> {
        let query = json!({ "currency_pair": symbols::to_venue(symbol) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/spot/tickers", Some(query), None, false, 1).await?;
        Ok(parse::parse_ticker(symbol, &body))
    }

    async fn fetch_order_book(&self, symbol: &str, limit: Option<u32>) -> Result<OrderBook, ExchangeError> {
        let query = json!({ "currency_pair": symbols::to_venue(symbol), "limit": limit.unwrap_or(20) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/spot/order_book", Some(query), None, false, 1).await?;
        Ok(parse::parse_order_book(symbol, &body))
    }

    async fn fetch_trades(&self, symbol: &str, limit: Option<u32>) -> Result<Vec<Trade>, ExchangeError> {
        let query = json!({ "currency_pair": symbols::to_venue(symbol), "limit": limit.unwrap_or(100) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/spot/trades", Some(query), None, false, 1).await?;
        Ok(parse::parse_trades(symbol, &body))
    }

    async fn fetch_ohlcv(&self, symbol: &str, timeframe: Timeframe, limit: Option<u32>) -> Result<Vec<Candle>, ExchangeError> {
        let query = json!({ "currency_pair": symbols::to_venue(symbol), "interval": timeframe_code(timeframe), "limit": limit.unwrap_or(100) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/spot/candlesticks", Some(query), None, false, 1).await?;
        Ok(parse::parse_candles(&body))
    }

    async fn fetch_balance(&self) -> Result<Balances, ExchangeError> {
        let body = self.private_request(Method::GET, "/spot/accounts", None, None, 1).await?;
        Ok(parse::parse_balances(&body))
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, ExchangeError> {
        let mut body = json!({
            "currency_pair": symbols::to_venue(&order.symbol),
            "side": if matches!(order.side, Side::Buy) { "buy" } else { "sell" },
            "type": if matches!(order.r#type, OrderType::Market) { "market" } else { "limit" },
            "amount": order.amount.to_string(),
        });
        if let Some(price) = order.price {
            body["price"] = json!(price.to_string());
        }
        let response = self.private_request(Method::POST, "/spot/orders", None, Some(body), 1).await?;
        parse::parse_order(&order.symbol, &response)
    }

    async fn cancel_order(&self, id: &str, symbol: &str) -> Result<(), ExchangeError> {
        let query = json!({ "currency_pair": symbols::to_venue(symbol) });
        self.private_request(Method::DELETE, format!("/spot/orders/{id}"), Some(query), None, 1).await?;
        Ok(())
    }

    async fn fetch_order(&self, id: &str, symbol: &str) -> Result<Order, ExchangeError> {
        let query = json!({ "currency_pair": symbols::to_venue(symbol) });
        let body = self.private_request(Method::GET, format!("/spot/orders/{id}"), Some(query), None, 1).await?;
        parse::parse_order(symbol, &body)
    }

    async fn fetch_open_orders(&self, symbol: Option<&str>) -> Result<Vec<Order>, ExchangeError> {
        let mut query = json!({ "status": "open" });
        if let Some(symbol) = symbol {
            query["currency_pair"] = json!(symbols::to_venue(symbol));
        }
        let body = self.private_request(Method::GET, "/spot/orders", Some(query), None, 1).await?;
        body.as_array()
            .into_iter()
            .flatten()
            .map(|row| {
                let pair = row.get("currency_pair").and_then(Value::as_str).unwrap_or_default();
                parse::parse_order(symbol.unwrap_or(&symbols::from_venue(pair)), row)
            })
            .collect()
    }

    async fn fetch_my_trades(&self, symbol: Option<&str>, limit: Option<u32>) -> Result<Vec<MyTrade>, ExchangeError> {
        let mut query = json!({ "limit": limit.unwrap_or(100) });
        if let Some(symbol) = symbol {
            query["currency_pair"] = json!(symbols::to_venue(symbol));
        }
        let body = self.private_request(Method::GET, "/spot/my_trades", Some(query), None, 1).await?;
        Ok(body
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|row| {
                let pair = row.get("currency_pair").and_then(Value::as_str).unwrap_or_default();
                parse::parse_my_trade(symbol.unwrap_or(&symbols::from_venue(pair)), row)
            })
            .collect())
    }

    async fn watch_trades(&self, symbol: &str) -> Result<StreamRx<Trade>, ExchangeError> {
        let venue_symbol = symbols::to_venue(symbol);
        let url = url::Url::parse(ws::WS_URL).expect("static gateio ws url is valid");
        let client = self.ws.get_or_connect(&url, ws::ping_strategy()).await.map_err(ExchangeError::NetworkError)?;

        client
            .send(&json!({ "time": now_ms() / 1000, "channel": ws::channel(), "event": "subscribe", "payload": [venue_symbol.clone()] }))
            .await
            .map_err(ExchangeError::NetworkError)?;

        let (tx, rx) = mpsc_unbounded::<Trade>();
        self.trade_senders.lock().expect("trade_senders mutex poisoned").insert(venue_symbol, tx);

        let senders = self.trade_senders.clone();
        client
            .register(
                ws::channel(),
                Arc::new(move |text: &str| {
                    let Ok(value) = serde_json::from_str::<Value>(text) else { return };
                    let Some(result) = value.get("result") else { return };
                    let Some(pair) = result.get("currency_pair").and_then(Value::as_str) else { return };
                    let Some(trade) = parse_stream_trade(pair, result) else { return };
                    let Ok(senders) = senders.lock() else { return };
                    if let Some(tx) = senders.get(pair) {
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

fn parse_stream_trade(venue_symbol: &str, row: &Value) -> Option<Trade> {
    use spotlink_integration::helpers::parse_optional_f64;
    Some(Trade {
        id: row.get("id").and_then(Value::as_i64).map(|id| id.to_string()).unwrap_or_default(),
        symbol: symbols::from_venue(venue_symbol),
        timestamp: row.get("create_time_ms").and_then(Value::as_str).and_then(|s| s.parse::<f64>().ok()).map(|ms| ms as i64)?,
        price: parse_optional_f64(row.get("price"))?,
        amount: parse_optional_f64(row.get("amount"))?,
        side: match row.get("side").and_then(Value::as_str) {
            Some("sell") => Side::Sell,
            _ => Side::Buy,
        },
        is_buyer_maker: None,
        r#type: None,
    })
}
