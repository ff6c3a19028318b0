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

const BASE_URL: &str = "https://api.bitfinex.com";

pub struct Bitfinex {
    client: SignedRestClient<sign::BitfinexSigner>,
    throttler: Throttler,
    markets: MarketCache,
    ws: WsRegistry,
    chan_symbols: Arc<Mutex<HashMap<u64, String>>>,
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
        Timeframe::D1 => "1D",
        Timeframe::W1 => "1W",
    }
}

impl Bitfinex {
    pub fn new(config: ExchangeConfig) -> Self {
        let signer = sign::BitfinexSigner::new(config.api_key, config.secret);
        let client = request::build_client(BASE_URL, signer, Arc::new(error::validate));
        Self {
            client,
            throttler: Throttler::new(90, 1.5, Duration::from_secs(60)),
            markets: MarketCache::new(),
            ws: WsRegistry::new(),
            chan_symbols: Arc::new(Mutex::new(HashMap::new())),
            trade_senders: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn private_request(&self, path: impl Into<std::borrow::Cow<'static, str>>, body: Value, weight: u32) -> Result<Value, ExchangeError> {
        request::request(&self.client, &self.throttler, Method::POST, path, None, Some(body), true, weight).await
    }
}

#[async_trait]
impl Exchange for Bitfinex {
    fn id(&self) -> ExchangeId {
        ExchangeId::Bitfinex
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
                let body = request::request(&self.client, &self.throttler, Method::GET, "/v2/conf/pub:list:pair:exchange", None, None, false, 1).await?;
                let mut map = HashMap::new();
                for id in body.as_array().and_then(|rows| rows.first()).and_then(Value::as_array).into_iter().flatten() {
                    let Some(pair) = id.as_str() else { continue };
                    let (base, quote) = pair.split_once(':').unwrap_or_else(|| pair.split_at(pair.len().saturating_sub(3).max(3).min(pair.len())));
                    let market = Market::new(ExchangeId::Bitfinex, format!("t{pair}"), base, quote);
                    map.insert(market.symbol.clone(), market);
                }
                Ok::<_, ExchangeError>(map)
            })
            .await
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError> {
        let path = format!("/v2/ticker/{}", symbols::to_venue(symbol));
        let body = request::request(&self.client, &self.throttler, Method::GET, path, None, None, false, 1).await?;
        Ok(parse::parse_ticker(symbol, &body))
    }

    async fn fetch_order_book(&self, symbol: &str, _limit: Option<u32>) -> Result<OrderBook, ExchangeError> {
        let path = format!("/v2/book/{}/P0", symbols::to_venue(symbol));
        let body = request::request(&self.client, &self.throttler, Method::GET, path, None, None, false, 1).await?;
        Ok(parse::parse_order_book(symbol, &body))
    }

    async fn fetch_trades(&self, symbol: &str, limit: Option<u32>) -> Result<Vec<Trade>, ExchangeError> {
        let path = format!("/v2/trades/{}/hist", symbols::to_venue(symbol));
        let query = json!({ "limit": limit.unwrap_or(120) });
        let body = request::request(&self.client, &self.throttler, Method::GET, path, Some(query), None, false, 1).await?;
        Ok(parse::parse_trades(symbol, &body))
    }

    async fn fetch_ohlcv(&self, symbol: &str, timeframe: Timeframe, limit: Option<u32>) -> Result<Vec<Candle>, ExchangeError> {
        let path = format!("/v2/candles/trade:{}:{}/hist", timeframe_code(timeframe), symbols::to_venue(symbol));
        let query = json!({ "limit": limit.unwrap_or(120) });
        let body = request::request(&self.client, &self.throttler, Method::GET, path, Some(query), None, false, 1).await?;
        Ok(parse::parse_candles(&body))
    }

    async fn fetch_balance(&self) -> Result<Balances, ExchangeError> {
        let body = self.private_request("v2/auth/r/wallets", json!({}), 1).await?;
        Ok(parse::parse_balances(&body))
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, ExchangeError> {
        let signed_amount = if matches!(order.side, Side::Buy) { order.amount } else { -order.amount };
        let body = json!({
            "type": if matches!(order.r#type, OrderType::Market) { "EXCHANGE MARKET" } else { "EXCHANGE LIMIT" },
            "symbol": symbols::to_venue(&order.symbol),
            "amount": signed_amount.to_string(),
            "price": order.price.unwrap_or(0.0).to_string(),
        });
        let response = self.private_request("v2/auth/w/order/submit", body, 1).await?;
        let row = parse::unwrap_order_notification(&response);
        parse::parse_order(&order.symbol, &row)
    }

    async fn cancel_order(&self, id: &str, _symbol: &str) -> Result<(), ExchangeError> {
        let id: i64 = id.parse().map_err(|_| ExchangeError::BadRequest("Bitfinex order ids are numeric".into()))?;
        self.private_request("v2/auth/w/order/cancel", json!({ "id": id }), 1).await?;
        Ok(())
    }

    async fn fetch_order(&self, id: &str, symbol: &str) -> Result<Order, ExchangeError> {
        let numeric_id: i64 = id.parse().map_err(|_| ExchangeError::BadRequest("Bitfinex order ids are numeric".into()))?;
        let body = self.private_request("v2/auth/r/orders/hist", json!({ "id": [numeric_id] }), 1).await?;
        let row = body
            .as_array()
            .and_then(|rows| rows.first())
            .ok_or_else(|| ExchangeError::OrderNotFound(id.to_string()))?;
        parse::parse_order(symbol, row)
    }

    async fn fetch_open_orders(&self, symbol: Option<&str>) -> Result<Vec<Order>, ExchangeError> {
        let path = match symbol {
            Some(symbol) => format!("v2/auth/r/orders/{}", symbols::to_venue(symbol)),
            None => "v2/auth/r/orders".to_string(),
        };
        let body = request::request(&self.client, &self.throttler, Method::POST, path, None, Some(json!({})), true, 1).await?;
        body.as_array()
            .into_iter()
            .flatten()
            .map(|row| {
                let venue_symbol = row.as_array().and_then(|r| r.get(3)).and_then(Value::as_str).unwrap_or_default();
                parse::parse_order(symbol.unwrap_or(venue_symbol), row)
            })
            .collect()
    }

    async fn fetch_my_trades(&self, symbol: Option<&str>, limit: Option<u32>) -> Result<Vec<MyTrade>, ExchangeError> {
        let path = match symbol {
            Some(symbol) => format!("v2/auth/r/trades/{}/hist", symbols::to_venue(symbol)),
            None => "v2/auth/r/trades/hist".to_string(),
        };
        let query = json!({ "limit": limit.unwrap_or(100) });
        let body = request::request(&self.client, &self.throttler, Method::GET, path, Some(query), None, true, 1).await?;
        Ok(body
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|row| {
                let venue_symbol = row.as_array().and_then(|r| r.get(1)).and_then(Value::as_str).unwrap_or_default();
                parse::parse_my_trade(symbol.unwrap_or(venue_symbol), row)
            })
            .collect())
    }

    async fn watch_trades(&self, symbol: &str) -> Result<StreamRx<Trade>, ExchangeError> {
        let venue_symbol = symbols::to_venue(symbol);
        let url = url::Url::parse(ws::WS_URL).expect("static bitfinex ws url is valid");
        let client = self.ws.get_or_connect(&url, ws::ping_strategy()).await.map_err(ExchangeError::NetworkError)?;

        client
            .send(&json!({ "event": "subscribe", "channel": "trades", "symbol": venue_symbol }))
            .await
            .map_err(ExchangeError::NetworkError)?;

        let (tx, rx) = mpsc_unbounded::<Trade>();
        self.trade_senders.lock().expect("trade_senders mutex poisoned").insert(venue_symbol.clone(), tx);

        let chan_symbols = self.chan_symbols.clone();
        let trade_senders = self.trade_senders.clone();
        client
            .register(
                "*",
                Arc::new(move |text: &str| {
                    let Ok(value) = serde_json::from_str::<Value>(text) else { return };

                    if let Some(event) = value.get("event").and_then(Value::as_str) {
                        if event == "subscribed" && value.get("channel").and_then(Value::as_str) == Some("trades") {
                            if let (Some(chan_id), Some(symbol)) = (value.get("chanId").and_then(Value::as_u64), value.get("symbol").and_then(Value::as_str)) {
                                chan_symbols.lock().expect("chan_symbols mutex poisoned").insert(chan_id, symbol.to_string());
                            }
                        }
                        return;
                    }

                    let Some(frame) = value.as_array() else { return };
                    let Some(chan_id) = frame.first().and_then(Value::as_u64) else { return };
                    let Some(symbol) = chan_symbols.lock().expect("chan_symbols mutex poisoned").get(&chan_id).cloned() else { return };
                    let Some(tx) = trade_senders.lock().expect("trade_senders mutex poisoned").get(&symbol).cloned() else { return };

                    match frame.get(1) {
                        Some(Value::String(kind)) if kind == "te" => {
                            if let Some(trade) = parse_stream_trade(&symbol, frame.get(2).unwrap_or(&Value::Null)) {
                                let _ = tx.tx.send(trade);
                            }
                        }
                        Some(Value::Array(snapshot)) => {
                            for row in snapshot {
                                if let Some(trade) = parse_stream_trade(&symbol, row) {
                                    let _ = tx.tx.send(trade);
                                }
                            }
                        }
                        _ => {}
                    }
                }),
            )
            .await;
        Ok(rx)
    }

    async fn close_all_ws(&self) {
        self.ws.close_all().await;
        self.chan_symbols.lock().expect("chan_symbols mutex poisoned").clear();
        self.trade_senders.lock().expect("trade_senders mutex poisoned").clear();
    }
}

fn parse_stream_trade(symbol: &str, row: &Value) -> Option<Trade> {
    use spotlink_integration::helpers::parse_optional_f64;
    let array = row.as_array()?;
    let amount = parse_optional_f64(array.get(2))?;
    Some(Trade {
        id: array.first()?.as_i64()?.to_string(),
        symbol: symbol.to_string(),
        timestamp: array.get(1)?.as_i64()?,
        price: parse_optional_f64(array.get(3))?,
        amount: amount.abs(),
        side: Side::from_signed_amount(amount),
        is_buyer_maker: None,
        r#type: None,
    })
}
