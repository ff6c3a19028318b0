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
use crate::request::{self, BaseRestClient};
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

const BASE_URL: &str = "https://api.lbkex.com";

pub struct Lbank {
    client: BaseRestClient,
    signer: sign::LbankSigner,
    throttler: Throttler,
    markets: MarketCache,
    ws: WsRegistry,
    trade_senders: Arc<Mutex<HashMap<String, StreamTx<Trade>>>>,
}

fn timeframe_code(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::M1 => "minute1",
        Timeframe::M5 => "minute5",
        Timeframe::M15 => "minute15",
        Timeframe::M30 => "minute30",
        Timeframe::H1 => "hour1",
        Timeframe::H4 => "hour4",
        Timeframe::D1 => "day1",
        Timeframe::W1 => "week1",
    }
}

impl Lbank {
    pub fn new(config: ExchangeConfig) -> Self {
        let signer = sign::LbankSigner::new(config.api_key, config.secret);
        let client = request::build_client_with_headers(BASE_URL, Vec::new(), Arc::new(error::validate));
        Self {
            client,
            signer,
            throttler: Throttler::new(200, 10.0, Duration::from_secs(1)),
            markets: MarketCache::new(),
            ws: WsRegistry::new(),
            trade_senders: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn private_request(&self, path: &'static str, mut params: Value, weight: u32) -> Result<Value, ExchangeError> {
        self.signer.apply(&mut params);
        request::request(&self.client, &self.throttler, Method::POST, path, None, Some(params), false, weight).await
    }
}

#[async_trait]
impl Exchange for Lbank {
    fn id(&self) -> ExchangeId {
        ExchangeId::Lbank
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
                let body = request::request(&self.client, &self.throttler, Method::GET, "/v2/currencyPairs.do", None, None, false, 1).await?;
                let mut map = HashMap::new();
                for pair in body.get("data").and_then(Value::as_array).into_iter().flatten() {
                    let Some(id) = pair.as_str() else { continue };
                    let Some((base, quote)) = id.split_once('_') else { continue };
                    let market = Market::new(ExchangeId::Lbank, id, base, quote);
                    map.insert(market.symbol.clone(), market);
                }
                Ok::<_, ExchangeError>(map)
            })
            .await
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError> {
        let query = json!({ "symbol": symbols::to_venue(symbol) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/v2/ticker/24hr.do", Some(query), None, false, 1).await?;
        Ok(parse::parse_ticker(symbol, &body))
    }

    async fn fetch_order_book(&self, symbol: &str, limit: Option<u32>) -> Result<OrderBook, ExchangeError> {
        let query = json!({ "symbol": symbols::to_venue(symbol), "size": limit.unwrap_or(60) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/v2/depth.do", Some(query), None, false, 1).await?;
        Ok(parse::parse_order_book(symbol, &body))
    }

    async fn fetch_trades(&self, symbol: &str, limit: Option<u32>) -> Result<Vec<Trade>, ExchangeError> {
        let query = json!({ "symbol": symbols::to_venue(symbol), "size": limit.unwrap_or(100) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/v2/trades.do", Some(query), None, false, 1).await?;
        Ok(parse::parse_trades(symbol, &body))
    }

    async fn fetch_ohlcv(&self, symbol: &str, timeframe: Timeframe, limit: Option<u32>) -> Result<Vec<Candle>, ExchangeError> {
        let query = json!({
            "symbol": symbols::to_venue(symbol),
            "type": timeframe_code(timeframe),
            "size": limit.unwrap_or(100),
            "time": spotlink_integration::helpers::now_ms() / 1000,
        });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/v2/kline.do", Some(query), None, false, 1).await?;
        Ok(parse::parse_candles(&body))
    }

    async fn fetch_balance(&self) -> Result<Balances, ExchangeError> {
        let body = self.private_request("/v2/supplement/user_info.do", json!({}), 1).await?;
        Ok(parse::parse_balances(&body))
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, ExchangeError> {
        let side = if matches!(order.side, Side::Buy) { "buy" } else { "sell" };
        let r#type = if matches!(order.r#type, OrderType::Market) { format!("{side}_market") } else { side.to_string() };
        let mut body = json!({
            "symbol": symbols::to_venue(&order.symbol),
            "type": r#type,
            "amount": order.amount.to_string(),
        });
        if let Some(price) = order.price {
            body["price"] = json!(price.to_string());
        }
        let response = self.private_request("/v2/supplement/create_order.do", body, 1).await?;
        let id = response
            .get("data")
            .and_then(|d| d.get("order_id"))
            .and_then(Value::as_str)
            .ok_or_else(|| ExchangeError::BadRequest("LBank order response carried no order_id".into()))?
            .to_string();
        self.fetch_order(&id, &order.symbol).await
    }

    async fn cancel_order(&self, id: &str, symbol: &str) -> Result<(), ExchangeError> {
        self.private_request("/v2/supplement/cancel_order.do", json!({ "symbol": symbols::to_venue(symbol), "order_id": id }), 1).await?;
        Ok(())
    }

    async fn fetch_order(&self, id: &str, symbol: &str) -> Result<Order, ExchangeError> {
        let body = self.private_request("/v2/supplement/orders_info.do", json!({ "symbol": symbols::to_venue(symbol), "order_id": id }), 1).await?;
        let row = body.get("data").ok_or_else(|| ExchangeError::OrderNotFound(id.to_string()))?;
        parse::parse_order(symbol, row)
    }

    async fn fetch_open_orders(&self, symbol: Option<&str>) -> Result<Vec<Order>, ExchangeError> {
        let symbol = symbol.ok_or_else(|| ExchangeError::BadRequest("LBank requires a symbol to list open orders".into()))?;
        let body = self
            .private_request("/v2/supplement/orders_info_no_deal.do", json!({ "symbol": symbols::to_venue(symbol), "current_page": 1, "page_length": 100 }), 1)
            .await?;
        body.get("data")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .map(|row| parse::parse_order(symbol, row))
            .collect()
    }

    async fn fetch_my_trades(&self, symbol: Option<&str>, limit: Option<u32>) -> Result<Vec<MyTrade>, ExchangeError> {
        let symbol = symbol.ok_or_else(|| ExchangeError::BadRequest("LBank requires a symbol to list fills".into()))?;
        let body = self
            .private_request("/v2/supplement/transaction_history.do", json!({ "symbol": symbols::to_venue(symbol), "limit": limit.unwrap_or(100) }), 1)
            .await?;
        Ok(body
            .get("data")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|row| parse::parse_my_trade(symbol, row))
            .collect())
    }

    async fn watch_trades(&self, symbol: &str) -> Result<StreamRx<Trade>, ExchangeError> {
        let venue_symbol = symbols::to_venue(symbol);
        let url = url::Url::parse(ws::WS_URL).expect("static lbank ws url is valid");
        let client = self.ws.get_or_connect(&url, ws::ping_strategy()).await.map_err(ExchangeError::NetworkError)?;

        client
            .send(&json!({ "action": "subscribe", "subscribe": "trade", "pair": venue_symbol }))
            .await
            .map_err(ExchangeError::NetworkError)?;

        let (tx, rx) = mpsc_unbounded::<Trade>();
        self.trade_senders.lock().expect("trade_senders mutex poisoned").insert(venue_symbol, tx);

        let senders = self.trade_senders.clone();
        client
            .register(
                "*",
                Arc::new(move |text: &str| {
                    let Ok(value) = serde_json::from_str::<Value>(text) else { return };
                    if value.get("type").and_then(Value::as_str) != Some("trade") {
                        return;
                    }
                    let Some(pair) = value.get("pair").and_then(Value::as_str) else { return };
                    let Some(trade) = parse_stream_trade(pair, &value) else { return };
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

fn parse_stream_trade(venue_symbol: &str, value: &Value) -> Option<Trade> {
    use spotlink_integration::helpers::parse_optional_f64;
    let trade = value.get("trade")?;
    Some(Trade {
        id: value.get("TS").and_then(Value::as_str).map(String::from).unwrap_or_default(),
        symbol: symbols::from_venue(venue_symbol),
        timestamp: spotlink_integration::helpers::now_ms(),
        price: parse_optional_f64(trade.get("price"))?,
        amount: parse_optional_f64(trade.get("amount"))?,
        side: match trade.get("direction").and_then(Value::as_str) {
            Some(d) if d.starts_with("sell") => Side::Sell,
            _ => Side::Buy,
        },
        is_buyer_maker: None,
        r#type: None,
    })
}
