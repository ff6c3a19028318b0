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

const BASE_URL: &str = "https://api.kraken.com";

pub struct Kraken {
    client: SignedRestClient<sign::KrakenSigner>,
    signer: sign::KrakenSigner,
    throttler: Throttler,
    markets: MarketCache,
    ws: WsRegistry,
    trade_senders: Arc<Mutex<HashMap<String, StreamTx<Trade>>>>,
}

fn timeframe_minutes(timeframe: Timeframe) -> i64 {
    match timeframe {
        Timeframe::M1 => 1,
        Timeframe::M5 => 5,
        Timeframe::M15 => 15,
        Timeframe::M30 => 30,
        Timeframe::H1 => 60,
        Timeframe::H4 => 240,
        Timeframe::D1 => 1440,
        Timeframe::W1 => 10080,
    }
}

impl Kraken {
    pub fn new(config: ExchangeConfig) -> Self {
        let signer = sign::KrakenSigner::new(config.api_key, &config.secret);
        let client = request::build_client(BASE_URL, signer.clone(), Arc::new(error::validate));
        Self {
            client,
            signer,
            throttler: Throttler::new(15, 0.33, Duration::from_secs(1)),
            markets: MarketCache::new(),
            ws: WsRegistry::new(),
            trade_senders: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn private_request(&self, path: &'static str, mut body: Value, weight: u32) -> Result<Value, ExchangeError> {
        self.signer.apply(&mut body);
        request::request(&self.client, &self.throttler, Method::POST, path, None, Some(body), true, weight).await
    }
}

#[async_trait]
impl Exchange for Kraken {
    fn id(&self) -> ExchangeId {
        ExchangeId::Kraken
    }

    fn capabilities(&self) -> Capabilities {
        let mut capabilities = Capabilities::full();
        capabilities.watch_orders = false;
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
                let body = request::request(&self.client, &self.throttler, Method::GET, "/0/public/AssetPairs", None, None, false, 1).await?;
                let mut map = HashMap::new();
                if let Some(pairs) = body.get("result").and_then(Value::as_object) {
                    for (id, row) in pairs {
                        let (Some(base), Some(quote)) = (row.get("base").and_then(Value::as_str), row.get("quote").and_then(Value::as_str)) else { continue };
                        let base = spotlink_instrument::model::balance::canonicalize_asset(base);
                        let quote = spotlink_instrument::model::balance::canonicalize_asset(quote);
                        let market = Market::new(ExchangeId::Kraken, id, base, quote);
                        map.insert(market.symbol.clone(), market);
                    }
                }
                Ok::<_, ExchangeError>(map)
            })
            .await
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError> {
        let query = json!({ "pair": symbols::to_venue(symbol) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/0/public/Ticker", Some(query), None, false, 1).await?;
        Ok(parse::parse_ticker(symbol, &body))
    }

    async fn fetch_order_book(&self, symbol: &str, limit: Option<u32>) -> Result<OrderBook, ExchangeError> {
        let query = json!({ "pair": symbols::to_venue(symbol), "count": limit.unwrap_or(100) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/0/public/Depth", Some(query), None, false, 2).await?;
        Ok(parse::parse_order_book(symbol, &body))
    }

    async fn fetch_trades(&self, symbol: &str, _limit: Option<u32>) -> Result<Vec<Trade>, ExchangeError> {
        let query = json!({ "pair": symbols::to_venue(symbol) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/0/public/Trades", Some(query), None, false, 2).await?;
        Ok(parse::parse_trades(symbol, &body))
    }

    async fn fetch_ohlcv(&self, symbol: &str, timeframe: Timeframe, _limit: Option<u32>) -> Result<Vec<Candle>, ExchangeError> {
        let query = json!({ "pair": symbols::to_venue(symbol), "interval": timeframe_minutes(timeframe) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/0/public/OHLC", Some(query), None, false, 2).await?;
        Ok(parse::parse_candles(&body))
    }

    async fn fetch_balance(&self) -> Result<Balances, ExchangeError> {
        let body = self.private_request("/0/private/Balance", json!({}), 2).await?;
        Ok(parse::parse_balances(&body))
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, ExchangeError> {
        let mut body = json!({
            "pair": symbols::to_venue(&order.symbol),
            "type": if matches!(order.side, Side::Buy) { "buy" } else { "sell" },
            "ordertype": if matches!(order.r#type, OrderType::Market) { "market" } else { "limit" },
            "volume": order.amount.to_string(),
        });
        if let Some(price) = order.price {
            body["price"] = json!(price.to_string());
        }
        let response = self.private_request("/0/private/AddOrder", body, 1).await?;
        let id = response
            .get("result")
            .and_then(|r| r.get("txid"))
            .and_then(Value::as_array)
            .and_then(|ids| ids.first())
            .and_then(Value::as_str)
            .ok_or_else(|| ExchangeError::BadRequest("Kraken AddOrder response carried no txid".into()))?
            .to_string();
        self.fetch_order(&id, &order.symbol).await
    }

    async fn cancel_order(&self, id: &str, _symbol: &str) -> Result<(), ExchangeError> {
        self.private_request("/0/private/CancelOrder", json!({ "txid": id }), 1).await?;
        Ok(())
    }

    async fn fetch_order(&self, id: &str, symbol: &str) -> Result<Order, ExchangeError> {
        let body = self.private_request("/0/private/QueryOrders", json!({ "txid": id }), 1).await?;
        let row = body
            .get("result")
            .and_then(|r| r.get(id))
            .ok_or_else(|| ExchangeError::OrderNotFound(id.to_string()))?;
        parse::parse_order(id, symbol, row)
    }

    async fn fetch_open_orders(&self, symbol: Option<&str>) -> Result<Vec<Order>, ExchangeError> {
        let body = self.private_request("/0/private/OpenOrders", json!({}), 3).await?;
        let Some(open) = body.get("result").and_then(|r| r.get("open")).and_then(Value::as_object) else {
            return Ok(Vec::new());
        };
        open.iter()
            .filter_map(|(id, row)| {
                let pair = row.get("descr").and_then(|d| d.get("pair")).and_then(Value::as_str)?;
                if let Some(wanted) = symbol {
                    if symbols::to_venue(wanted) != pair {
                        return None;
                    }
                }
                Some(parse::parse_order(id, symbol.unwrap_or(pair), row))
            })
            .collect()
    }

    async fn fetch_my_trades(&self, symbol: Option<&str>, _limit: Option<u32>) -> Result<Vec<MyTrade>, ExchangeError> {
        let body = self.private_request("/0/private/TradesHistory", json!({}), 2).await?;
        let Some(trades) = body.get("result").and_then(|r| r.get("trades")).and_then(Value::as_object) else {
            return Ok(Vec::new());
        };
        Ok(trades
            .iter()
            .filter_map(|(id, row)| {
                let pair = row.get("pair").and_then(Value::as_str)?;
                if let Some(wanted) = symbol {
                    if symbols::to_venue(wanted) != pair {
                        return None;
                    }
                }
                parse::parse_my_trade(id, symbol.unwrap_or(pair), row)
            })
            .collect())
    }

    async fn watch_trades(&self, symbol: &str) -> Result<StreamRx<Trade>, ExchangeError> {
        let url = url::Url::parse(ws::WS_URL).expect("static kraken ws url is valid");
        let client = self.ws.get_or_connect(&url, ws::ping_strategy()).await.map_err(ExchangeError::NetworkError)?;

        client
            .send(&json!({ "method": "subscribe", "params": { "channel": "trade", "symbol": [symbol] } }))
            .await
            .map_err(ExchangeError::NetworkError)?;

        let (tx, rx) = mpsc_unbounded::<Trade>();
        self.trade_senders.lock().expect("trade_senders mutex poisoned").insert(symbol.to_string(), tx);

        let senders = self.trade_senders.clone();
        client
            .register(
                "trade",
                Arc::new(move |text: &str| {
                    let Ok(value) = serde_json::from_str::<Value>(text) else { return };
                    for row in value.get("data").and_then(Value::as_array).into_iter().flatten() {
                        let Some(symbol) = row.get("symbol").and_then(Value::as_str) else { continue };
                        let Some(trade) = parse_stream_trade(symbol, row) else { continue };
                        if let Ok(senders) = senders.lock() {
                            if let Some(tx) = senders.get(symbol) {
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

fn parse_stream_trade(symbol: &str, row: &Value) -> Option<Trade> {
    use spotlink_integration::helpers::{iso8601_to_ms, parse_optional_f64};
    Some(Trade {
        id: row.get("trade_id").and_then(Value::as_u64).map(|id| id.to_string()).unwrap_or_default(),
        symbol: symbol.to_string(),
        timestamp: row.get("timestamp").and_then(Value::as_str).and_then(iso8601_to_ms)?,
        price: parse_optional_f64(row.get("price"))?,
        amount: parse_optional_f64(row.get("qty"))?,
        side: match row.get("side").and_then(Value::as_str) {
            Some("sell") => Side::Sell,
            _ => Side::Buy,
        },
        is_buyer_maker: None,
        r#type: row.get("ord_type").and_then(Value::as_str).map(String::from),
    })
}
