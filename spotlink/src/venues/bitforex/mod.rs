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
use spotlink_instrument::model::order::Order;
use spotlink_instrument::model::order_book::OrderBook;
use spotlink_instrument::model::ticker::Ticker;
use spotlink_instrument::model::trade::{MyTrade, Side, Trade};
use spotlink_integration::channel::{mpsc_unbounded, StreamRx, StreamTx};
use spotlink_integration::rate_limit::Throttler;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const BASE_URL: &str = "https://api.bitforex.com";

pub struct Bitforex {
    client: BaseRestClient,
    signer: sign::BitforexSigner,
    throttler: Throttler,
    markets: MarketCache,
    ws: WsRegistry,
    trade_senders: Arc<Mutex<HashMap<String, StreamTx<Trade>>>>,
}

fn timeframe_code(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::M1 => "1min",
        Timeframe::M5 => "5min",
        Timeframe::M15 => "15min",
        Timeframe::M30 => "30min",
        Timeframe::H1 => "1hour",
        Timeframe::H4 => "4hour",
        Timeframe::D1 => "1day",
        Timeframe::W1 => "1week",
    }
}

impl Bitforex {
    pub fn new(config: ExchangeConfig) -> Self {
        let signer = sign::BitforexSigner::new(config.api_key, config.secret);
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
        self.signer.apply(path, &mut params);
        request::request(&self.client, &self.throttler, Method::POST, path, None, Some(params), false, weight).await
    }
}

#[async_trait]
impl Exchange for Bitforex {
    fn id(&self) -> ExchangeId {
        ExchangeId::Bitforex
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
                let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v1/market/symbols", None, None, false, 1).await?;
                let mut map = HashMap::new();
                for row in body.as_array().into_iter().flatten() {
                    let Some(id) = row.get("symbol").and_then(Value::as_str) else { continue };
                    let Some(symbol) = symbols::from_venue(id) else { continue };
                    let (base, quote) = symbol.split_once('/').unwrap_or((symbol.as_str(), ""));
                    let market = Market::new(ExchangeId::Bitforex, id, base, quote);
                    map.insert(market.symbol.clone(), market);
                }
                Ok::<_, ExchangeError>(map)
            })
            .await
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError> {
        let query = json!({ "symbol": symbols::to_venue(symbol) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v1/market/ticker", Some(query), None, false, 1).await?;
        Ok(parse::parse_ticker(symbol, &body))
    }

    async fn fetch_order_book(&self, symbol: &str, limit: Option<u32>) -> Result<OrderBook, ExchangeError> {
        let query = json!({ "symbol": symbols::to_venue(symbol), "size": limit.unwrap_or(50) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v1/market/depth", Some(query), None, false, 1).await?;
        Ok(parse::parse_order_book(symbol, &body))
    }

    async fn fetch_trades(&self, symbol: &str, limit: Option<u32>) -> Result<Vec<Trade>, ExchangeError> {
        let query = json!({ "symbol": symbols::to_venue(symbol), "size": limit.unwrap_or(100) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v1/market/trades", Some(query), None, false, 1).await?;
        Ok(parse::parse_trades(symbol, &body))
    }

    async fn fetch_ohlcv(&self, symbol: &str, timeframe: Timeframe, limit: Option<u32>) -> Result<Vec<Candle>, ExchangeError> {
        let query = json!({ "symbol": symbols::to_venue(symbol), "ktype": timeframe_code(timeframe), "size": limit.unwrap_or(100) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v1/market/kline", Some(query), None, false, 1).await?;
        Ok(parse::parse_candles(&body))
    }

    async fn fetch_balance(&self) -> Result<Balances, ExchangeError> {
        let body = self.private_request("/api/v1/fund/allAccount", json!({}), 1).await?;
        Ok(parse::parse_balances(&body))
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, ExchangeError> {
        let params = json!({
            "symbol": symbols::to_venue(&order.symbol),
            "price": order.price.unwrap_or(0.0).to_string(),
            "amount": order.amount.to_string(),
            "tradeType": if matches!(order.side, Side::Buy) { 1 } else { 2 },
        });
        let response = self.private_request("/api/v1/trade/placeOrder", params, 1).await?;
        let id = response
            .get("orderId")
            .and_then(Value::as_i64)
            .ok_or_else(|| ExchangeError::BadRequest("Bitforex order response carried no orderId".into()))?
            .to_string();
        self.fetch_order(&id, &order.symbol).await
    }

    async fn cancel_order(&self, id: &str, symbol: &str) -> Result<(), ExchangeError> {
        let id: i64 = id.parse().map_err(|_| ExchangeError::BadRequest("invalid Bitforex order id".into()))?;
        self.private_request("/api/v1/trade/cancelOrder", json!({ "symbol": symbols::to_venue(symbol), "orderId": id }), 1).await?;
        Ok(())
    }

    async fn fetch_order(&self, id: &str, symbol: &str) -> Result<Order, ExchangeError> {
        let id: i64 = id.parse().map_err(|_| ExchangeError::BadRequest("invalid Bitforex order id".into()))?;
        let body = self.private_request("/api/v1/trade/orderInfo", json!({ "symbol": symbols::to_venue(symbol), "orderId": id }), 1).await?;
        parse::parse_order(symbol, &body)
    }

    async fn fetch_open_orders(&self, symbol: Option<&str>) -> Result<Vec<Order>, ExchangeError> {
        let symbol = symbol.ok_or_else(|| ExchangeError::BadRequest("Bitforex requires a symbol to list open orders".into()))?;
        let body = self.private_request("/api/v1/trade/orderInfos", json!({ "symbol": symbols::to_venue(symbol), "state": 0 }), 1).await?;
        body.as_array().into_iter().flatten().map(|row| parse::parse_order(symbol, row)).collect()
    }

    async fn fetch_my_trades(&self, symbol: Option<&str>, limit: Option<u32>) -> Result<Vec<MyTrade>, ExchangeError> {
        let symbol = symbol.ok_or_else(|| ExchangeError::BadRequest("Bitforex requires a symbol to list fills".into()))?;
        let body = self
            .private_request("/api/v1/trade/tradeHistory", json!({ "symbol": symbols::to_venue(symbol), "size": limit.unwrap_or(100) }), 1)
            .await?;
        Ok(body.as_array().into_iter().flatten().filter_map(|row| parse::parse_my_trade(symbol, row)).collect())
    }

    async fn watch_trades(&self, symbol: &str) -> Result<StreamRx<Trade>, ExchangeError> {
        let venue_symbol = symbols::to_venue(symbol);
        let url = url::Url::parse(ws::WS_URL).expect("static bitforex ws url is valid");
        let client = self.ws.get_or_connect(&url, ws::ping_strategy()).await.map_err(ExchangeError::NetworkError)?;

        client
            .send(&json!([{ "type": "subHq", "event": "trade", "param": { "businessType": venue_symbol, "dType": 0 } }]))
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
                    let Some(entries) = value.as_array() else { return };
                    for entry in entries {
                        if entry.get("event").and_then(Value::as_str) != Some("trade") {
                            continue;
                        }
                        let Some(business_type) = entry.get("param").and_then(|p| p.get("businessType")).and_then(Value::as_str) else { continue };
                        let Ok(senders) = senders.lock() else { continue };
                        let Some(tx) = senders.get(business_type) else { continue };
                        for row in entry.get("data").and_then(Value::as_array).into_iter().flatten() {
                            if let Some(trade) = parse_stream_trade(business_type, row) {
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

fn parse_stream_trade(venue_symbol: &str, row: &Value) -> Option<Trade> {
    use spotlink_integration::helpers::parse_optional_f64;
    Some(Trade {
        id: row.get("tid").and_then(Value::as_i64)?.to_string(),
        symbol: symbols::from_venue(venue_symbol)?,
        timestamp: row.get("time").and_then(Value::as_i64)?,
        price: parse_optional_f64(row.get("price"))?,
        amount: parse_optional_f64(row.get("amount"))?,
        side: match row.get("direction").and_then(Value::as_str) {
            Some("sell") => Side::Sell,
            _ => Side::Buy,
        },
        is_buyer_maker: None,
        r#type: None,
    })
}
