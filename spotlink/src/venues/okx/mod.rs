pub mod error;
pub mod parse;
pub mod sign;
pub mod symbols;
pub mod ws;

use crate::capability::Capabilities;
use crate::config::ExchangeConfig;
use crate::error::ExchangeError;
use crate::exchange::{Exchange, NewOrder, OrderAmendment};
use crate::market_cache::MarketCache;
use crate::request::{self, SignedRestClient};
use crate::ws_registry::WsRegistry;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use spotlink_instrument::exchange::ExchangeId;
use spotlink_instrument::model::balance::Balances;
use spotlink_instrument::model::candle::{Candle, Timeframe};
use spotlink_instrument::model::fee_schedule::TradingFee;
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

const BASE_URL: &str = "https://www.okx.com";

pub struct Okx {
    client: SignedRestClient<sign::OkxSigner>,
    throttler: Throttler,
    markets: MarketCache,
    ws: WsRegistry,
}

fn timeframe_code(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::M1 => "1m",
        Timeframe::M5 => "5m",
        Timeframe::M15 => "15m",
        Timeframe::M30 => "30m",
        Timeframe::H1 => "1H",
        Timeframe::H4 => "4H",
        Timeframe::D1 => "1D",
        Timeframe::W1 => "1W",
    }
}

impl Okx {
    pub fn new(config: ExchangeConfig) -> Self {
        let passphrase = config.passphrase.clone().unwrap_or_default();
        let signer = sign::OkxSigner::new(config.api_key.clone(), config.secret.clone(), passphrase);
        let client = request::build_client(BASE_URL, signer, Arc::new(error::validate));
        Self {
            client,
            throttler: Throttler::new(20, 5.0, Duration::from_secs(2)),
            markets: MarketCache::new(),
            ws: WsRegistry::new(),
        }
    }
}

#[async_trait]
impl Exchange for Okx {
    fn id(&self) -> ExchangeId {
        ExchangeId::Okx
    }

    fn capabilities(&self) -> Capabilities {
        let mut capabilities = Capabilities::full();
        capabilities.fetch_avg_price = false;
        capabilities.test_order = false;
        capabilities.cancel_all_orders = false;
        capabilities
    }

    async fn fetch_time(&self) -> Result<i64, ExchangeError> {
        let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v5/public/time", None, None, false, 1).await?;
        body.get("data")
            .and_then(Value::as_array)
            .and_then(|rows| rows.first())
            .and_then(|row| row.get("ts"))
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| ExchangeError::BadRequest("okx: missing ts in server time response".into()))
    }

    async fn fetch_trading_fees(&self, symbol: Option<&str>) -> Result<Vec<TradingFee>, ExchangeError> {
        let mut query = json!({ "instType": "SPOT" });
        if let Some(symbol) = symbol {
            query["instId"] = json!(symbols::to_venue(symbol));
        }
        let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v5/account/trade-fee", Some(query), None, true, 1).await?;
        Ok(body
            .get("data")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .map(|row| TradingFee {
                symbol: row.get("instId").and_then(Value::as_str).map(String::from),
                maker: row.get("maker").and_then(Value::as_str).and_then(|s| s.parse::<f64>().ok()).map(f64::abs).unwrap_or(0.0),
                taker: row.get("taker").and_then(Value::as_str).and_then(|s| s.parse::<f64>().ok()).map(f64::abs).unwrap_or(0.0),
            })
            .collect())
    }

    async fn amend_order(&self, id: &str, symbol: &str, amendment: OrderAmendment) -> Result<Order, ExchangeError> {
        let body = json!({
            "instId": symbols::to_venue(symbol),
            "ordId": id,
            "newSz": amendment.amount.map(|a| a.to_string()),
            "newPx": amendment.price.map(|p| p.to_string()),
        });
        request::request(&self.client, &self.throttler, Method::POST, "/api/v5/trade/amend-order", None, Some(body), true, 1).await?;
        self.fetch_order(id, symbol).await
    }

    async fn fetch_closed_orders(&self, symbol: Option<&str>, limit: Option<u32>) -> Result<Vec<Order>, ExchangeError> {
        let mut query = json!({ "instType": "SPOT", "limit": limit.unwrap_or(100) });
        if let Some(symbol) = symbol {
            query["instId"] = json!(symbols::to_venue(symbol));
        }
        let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v5/trade/orders-history", Some(query), None, true, 1).await?;
        body.get("data")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .map(|row| {
                let symbol = row.get("instId").and_then(Value::as_str).unwrap_or_default();
                parse::parse_order(symbol, row)
            })
            .collect()
    }

    async fn load_markets(&self, force_reload: bool) -> Result<Arc<HashMap<String, Market>>, ExchangeError> {
        self.markets
            .load_markets(force_reload, || async {
                let query = json!({ "instType": "SPOT" });
                let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v5/public/instruments", Some(query), None, false, 1).await?;
                let mut map = HashMap::new();
                for row in body.get("data").and_then(Value::as_array).into_iter().flatten() {
                    let (Some(id), Some(base), Some(quote)) = (
                        row.get("instId").and_then(Value::as_str),
                        row.get("baseCcy").and_then(Value::as_str),
                        row.get("quoteCcy").and_then(Value::as_str),
                    ) else { continue };
                    let mut market = Market::new(ExchangeId::Okx, id, base, quote);
                    market.active = row.get("state").and_then(Value::as_str) == Some("live");
                    map.insert(market.symbol.clone(), market);
                }
                Ok::<_, ExchangeError>(map)
            })
            .await
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError> {
        let query = json!({ "instId": symbols::to_venue(symbol) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v5/market/ticker", Some(query), None, false, 1).await?;
        Ok(parse::parse_ticker(symbol, &body))
    }

    async fn fetch_order_book(&self, symbol: &str, limit: Option<u32>) -> Result<OrderBook, ExchangeError> {
        let query = json!({ "instId": symbols::to_venue(symbol), "sz": limit.unwrap_or(100) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v5/market/books", Some(query), None, false, 1).await?;
        Ok(parse::parse_order_book(symbol, &body))
    }

    async fn fetch_trades(&self, symbol: &str, limit: Option<u32>) -> Result<Vec<Trade>, ExchangeError> {
        let query = json!({ "instId": symbols::to_venue(symbol), "limit": limit.unwrap_or(100) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v5/market/trades", Some(query), None, false, 1).await?;
        Ok(parse::parse_trades(symbol, &body))
    }

    async fn fetch_ohlcv(&self, symbol: &str, timeframe: Timeframe, limit: Option<u32>) -> Result<Vec<Candle>, ExchangeError> {
        let query = json!({
            "instId": symbols::to_venue(symbol),
            "bar": timeframe_code(timeframe),
            "limit": limit.unwrap_or(100),
        });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v5/market/candles", Some(query), None, false, 1).await?;
        Ok(parse::parse_candles(&body))
    }

    async fn fetch_balance(&self) -> Result<Balances, ExchangeError> {
        let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v5/account/balance", None, None, true, 1).await?;
        Ok(parse::parse_balances(&body))
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, ExchangeError> {
        let body = json!({
            "instId": symbols::to_venue(&order.symbol),
            "tdMode": "cash",
            "side": if matches!(order.side, Side::Buy) { "buy" } else { "sell" },
            "ordType": if matches!(order.r#type, OrderType::Market) { "market" } else { "limit" },
            "sz": order.amount.to_string(),
            "px": order.price.map(|p| p.to_string()),
            "clOrdId": order.client_order_id,
        });
        let response = request::request(&self.client, &self.throttler, Method::POST, "/api/v5/trade/order", None, Some(body), true, 1).await?;
        let row = response
            .get("data")
            .and_then(Value::as_array)
            .and_then(|rows| rows.first())
            .ok_or_else(|| ExchangeError::BadRequest("OKX order response carried no data".into()))?;
        parse::parse_order(&order.symbol, row)
    }

    async fn cancel_order(&self, id: &str, symbol: &str) -> Result<(), ExchangeError> {
        let body = json!({ "instId": symbols::to_venue(symbol), "ordId": id });
        request::request(&self.client, &self.throttler, Method::POST, "/api/v5/trade/cancel-order", None, Some(body), true, 1).await?;
        Ok(())
    }

    async fn fetch_order(&self, id: &str, symbol: &str) -> Result<Order, ExchangeError> {
        let query = json!({ "instId": symbols::to_venue(symbol), "ordId": id });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v5/trade/order", Some(query), None, true, 1).await?;
        let row = body
            .get("data")
            .and_then(Value::as_array)
            .and_then(|rows| rows.first())
            .ok_or_else(|| ExchangeError::OrderNotFound(id.to_string()))?;
        parse::parse_order(symbol, row)
    }

    async fn fetch_open_orders(&self, symbol: Option<&str>) -> Result<Vec<Order>, ExchangeError> {
        let mut query = json!({ "instType": "SPOT" });
        if let Some(symbol) = symbol {
            query["instId"] = json!(symbols::to_venue(symbol));
        }
        let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v5/trade/orders-pending", Some(query), None, true, 1).await?;
        body.get("data")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .map(|row| {
                let symbol = row.get("instId").and_then(Value::as_str).unwrap_or_default();
                parse::parse_order(symbol, row)
            })
            .collect()
    }

    async fn fetch_my_trades(&self, symbol: Option<&str>, limit: Option<u32>) -> Result<Vec<MyTrade>, ExchangeError> {
        let mut query = json!({ "instType": "SPOT", "limit": limit.unwrap_or(100) });
        if let Some(symbol) = symbol {
            query["instId"] = json!(symbols::to_venue(symbol));
        }
        let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v5/trade/fills", Some(query), None, true, 1).await?;
        Ok(body
            .get("data")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|row| {
                let symbol = row.get("instId").and_then(Value::as_str).unwrap_or_default();
                parse::parse_my_trade(symbol, row)
            })
            .collect())
    }

    async fn watch_trades(&self, symbol: &str) -> Result<StreamRx<Trade>, ExchangeError> {
        let venue_symbol = symbols::to_venue(symbol);
        let url = url::Url::parse(ws::WS_URL).expect("static okx ws url is valid");
        let client = self.ws.get_or_connect(&url, ws::ping_strategy()).await.map_err(ExchangeError::NetworkError)?;

        client
            .send(&json!({ "op": "subscribe", "args": [ws::trade_arg(&venue_symbol)] }))
            .await
            .map_err(ExchangeError::NetworkError)?;

        let (tx, rx) = mpsc_unbounded::<Trade>();
        let symbol = symbol.to_string();
        client
            .register(
                ws::channel_key(&venue_symbol),
                Arc::new(move |text: &str| {
                    let Ok(value) = serde_json::from_str::<Value>(text) else { return };
                    for row in value.get("data").and_then(Value::as_array).into_iter().flatten() {
                        if let Some(trade) = parse_stream_trade(&symbol, row) {
                            let _ = tx.tx.send(trade);
                        }
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

fn parse_stream_trade(symbol: &str, row: &Value) -> Option<Trade> {
    use spotlink_integration::helpers::parse_optional_f64;
    Some(Trade {
        id: row.get("tradeId")?.as_str()?.to_string(),
        symbol: symbol.to_string(),
        timestamp: row.get("ts").and_then(Value::as_str).and_then(|s| s.parse().ok())?,
        price: parse_optional_f64(row.get("px"))?,
        amount: parse_optional_f64(row.get("sz"))?,
        side: match row.get("side").and_then(Value::as_str) {
            Some("sell") => Side::Sell,
            _ => Side::Buy,
        },
        is_buyer_maker: None,
        r#type: None,
    })
}
