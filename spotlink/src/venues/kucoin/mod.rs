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
use spotlink_instrument::model::fee_schedule::TradingFee;
use spotlink_instrument::model::market::Market;
use spotlink_instrument::model::order::{Order, OrderType};
use spotlink_instrument::model::order_book::OrderBook;
use spotlink_instrument::model::ticker::Ticker;
use spotlink_instrument::model::trade::{MyTrade, Side, Trade};
use spotlink_integration::channel::{mpsc_unbounded, StreamRx};
use spotlink_integration::helpers::now_ms;
use spotlink_integration::rate_limit::Throttler;
use std::collections::HashMap;
use std::sync::Arc;

const BASE_URL: &str = "https://api.kucoin.com";

pub struct Kucoin {
    client: SignedRestClient<sign::KucoinSigner>,
    throttler: Throttler,
    markets: MarketCache,
    ws: WsRegistry,
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

impl Kucoin {
    pub fn new(config: ExchangeConfig) -> Self {
        let passphrase = config.passphrase.clone().unwrap_or_default();
        let signer = sign::KucoinSigner::new(config.api_key, config.secret, passphrase);
        let client = request::build_client(BASE_URL, signer, Arc::new(error::validate));
        Self {
            client,
            throttler: Throttler::new(30, 3.0, std::time::Duration::from_secs(1)),
            markets: MarketCache::new(),
            ws: WsRegistry::new(),
        }
    }

    async fn private_request(&self, method: Method, path: impl Into<std::borrow::Cow<'static, str>>, query: Option<Value>, body: Option<Value>, weight: u32) -> Result<Value, ExchangeError> {
        request::request(&self.client, &self.throttler, method, path, query, body, true, weight).await
    }
}

#[async_trait]
impl Exchange for Kucoin {
    fn id(&self) -> ExchangeId {
        ExchangeId::Kucoin
    }

    fn capabilities(&self) -> Capabilities {
        let mut capabilities = Capabilities::full();
        capabilities.fetch_avg_price = false;
        capabilities.test_order = false;
        capabilities.amend_order = false;
        capabilities
    }

    async fn fetch_time(&self) -> Result<i64, ExchangeError> {
        let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v1/timestamp", None, None, false, 1).await?;
        body.get("data")
            .and_then(Value::as_i64)
            .ok_or_else(|| ExchangeError::BadRequest("kucoin: missing data in timestamp response".into()))
    }

    async fn fetch_trading_fees(&self, symbol: Option<&str>) -> Result<Vec<TradingFee>, ExchangeError> {
        let mut query = json!({});
        if let Some(symbol) = symbol {
            query["symbols"] = json!(symbols::to_venue(symbol));
        }
        let body = self.private_request(Method::GET, "/api/v1/trade-fees", Some(query), None, 2).await?;
        Ok(body
            .get("data")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .map(|row| TradingFee {
                symbol: row.get("symbol").and_then(Value::as_str).map(String::from),
                maker: row.get("makerFeeRate").and_then(Value::as_str).and_then(|s| s.parse().ok()).unwrap_or(0.0),
                taker: row.get("takerFeeRate").and_then(Value::as_str).and_then(|s| s.parse().ok()).unwrap_or(0.0),
            })
            .collect())
    }

    async fn cancel_all_orders(&self, symbol: Option<&str>) -> Result<(), ExchangeError> {
        let mut query = json!({});
        if let Some(symbol) = symbol {
            query["symbol"] = json!(symbols::to_venue(symbol));
        }
        self.private_request(Method::DELETE, "/api/v1/orders", Some(query), None, 3).await?;
        Ok(())
    }

    async fn fetch_closed_orders(&self, symbol: Option<&str>, limit: Option<u32>) -> Result<Vec<Order>, ExchangeError> {
        let mut query = json!({ "status": "done", "pageSize": limit.unwrap_or(50) });
        if let Some(symbol) = symbol {
            query["symbol"] = json!(symbols::to_venue(symbol));
        }
        let body = self.private_request(Method::GET, "/api/v1/orders", Some(query), None, 6).await?;
        body.get("data")
            .and_then(|d| d.get("items"))
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .map(parse::parse_order)
            .collect()
    }

    async fn load_markets(&self, force_reload: bool) -> Result<Arc<HashMap<String, Market>>, ExchangeError> {
        self.markets
            .load_markets(force_reload, || async {
                let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v1/symbols", None, None, false, 1).await?;
                let mut map = HashMap::new();
                for row in body.get("data").and_then(Value::as_array).into_iter().flatten() {
                    let (Some(id), Some(base), Some(quote)) = (
                        row.get("symbol").and_then(Value::as_str),
                        row.get("baseCurrency").and_then(Value::as_str),
                        row.get("quoteCurrency").and_then(Value::as_str),
                    ) else {
                        continue;
                    };
                    let market = Market::new(ExchangeId::Kucoin, id, base, quote);
                    map.insert(market.symbol.clone(), market);
                }
                Ok::<_, ExchangeError>(map)
            })
            .await
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError> {
        let query = json!({ "symbol": symbols::to_venue(symbol) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v1/market/orderbook/level1", Some(query), None, false, 1).await?;
        Ok(parse::parse_ticker(symbol, &body))
    }

    async fn fetch_order_book(&self, symbol: &str, _limit: Option<u32>) -> Result<OrderBook, ExchangeError> {
        let query = json!({ "symbol": symbols::to_venue(symbol) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v1/market/orderbook/level2_20", Some(query), None, false, 2).await?;
        Ok(parse::parse_order_book(symbol, &body))
    }

    async fn fetch_trades(&self, symbol: &str, _limit: Option<u32>) -> Result<Vec<Trade>, ExchangeError> {
        let query = json!({ "symbol": symbols::to_venue(symbol) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v1/market/histories", Some(query), None, false, 1).await?;
        Ok(parse::parse_trades(symbol, &body))
    }

    async fn fetch_ohlcv(&self, symbol: &str, timeframe: Timeframe, _limit: Option<u32>) -> Result<Vec<Candle>, ExchangeError> {
        let query = json!({ "symbol": symbols::to_venue(symbol), "type": timeframe_code(timeframe) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v1/market/candles", Some(query), None, false, 2).await?;
        Ok(parse::parse_candles(&body))
    }

    async fn fetch_balance(&self) -> Result<Balances, ExchangeError> {
        let body = self.private_request(Method::GET, "/api/v1/accounts", None, None, 2).await?;
        Ok(parse::parse_balances(&body))
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, ExchangeError> {
        let mut body = json!({
            "clientOid": now_ms().to_string(),
            "symbol": symbols::to_venue(&order.symbol),
            "side": if matches!(order.side, Side::Buy) { "buy" } else { "sell" },
            "type": if matches!(order.r#type, OrderType::Market) { "market" } else { "limit" },
            "size": order.amount.to_string(),
        });
        if let Some(price) = order.price {
            body["price"] = json!(price.to_string());
        }
        let response = self.private_request(Method::POST, "/api/v1/orders", None, Some(body), 2).await?;
        let id = response
            .get("data")
            .and_then(|d| d.get("orderId"))
            .and_then(Value::as_str)
            .ok_or_else(|| ExchangeError::BadRequest("KuCoin order response carried no orderId".into()))?
            .to_string();
        self.fetch_order(&id, &order.symbol).await
    }

    async fn cancel_order(&self, id: &str, _symbol: &str) -> Result<(), ExchangeError> {
        self.private_request(Method::DELETE, format!("/api/v1/orders/{id}"), None, None, 3).await?;
        Ok(())
    }

    async fn fetch_order(&self, id: &str, _symbol: &str) -> Result<Order, ExchangeError> {
        let body = self.private_request(Method::GET, format!("/api/v1/orders/{id}"), None, None, 2).await?;
        let row = body.get("data").ok_or_else(|| ExchangeError::OrderNotFound(id.to_string()))?;
        parse::parse_order(row)
    }

    async fn fetch_open_orders(&self, symbol: Option<&str>) -> Result<Vec<Order>, ExchangeError> {
        let mut query = json!({ "status": "active" });
        if let Some(symbol) = symbol {
            query["symbol"] = json!(symbols::to_venue(symbol));
        }
        let body = self.private_request(Method::GET, "/api/v1/orders", Some(query), None, 6).await?;
        body.get("data")
            .and_then(|d| d.get("items"))
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .map(parse::parse_order)
            .collect()
    }

    async fn fetch_my_trades(&self, symbol: Option<&str>, _limit: Option<u32>) -> Result<Vec<MyTrade>, ExchangeError> {
        let mut query = json!({});
        if let Some(symbol) = symbol {
            query["symbol"] = json!(symbols::to_venue(symbol));
        }
        let body = self.private_request(Method::GET, "/api/v1/fills", Some(query), None, 2).await?;
        Ok(body
            .get("data")
            .and_then(|d| d.get("items"))
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(parse::parse_my_trade)
            .collect())
    }

    async fn watch_trades(&self, symbol: &str) -> Result<StreamRx<Trade>, ExchangeError> {
        let venue_symbol = symbols::to_venue(symbol);
        let bullet = request::request(&self.client, &self.throttler, Method::POST, "/api/v1/bullet-public", None, None, false, 1).await?;
        let data = bullet.get("data");
        let token = data.and_then(|d| d.get("token")).and_then(Value::as_str).unwrap_or_default();
        let endpoint = data
            .and_then(|d| d.get("instanceServers"))
            .and_then(Value::as_array)
            .and_then(|servers| servers.first())
            .and_then(|server| server.get("endpoint"))
            .and_then(Value::as_str)
            .unwrap_or(ws::WS_URL);
        let connect_id = now_ms();
        let url = url::Url::parse(&format!("{endpoint}?token={token}&connectId={connect_id}")).map_err(|e| ExchangeError::BadRequest(e.to_string()))?;
        let client = self.ws.get_or_connect(&url, ws::ping_strategy()).await.map_err(ExchangeError::NetworkError)?;

        let topic = ws::trade_topic(&venue_symbol);
        client
            .send(&json!({ "id": connect_id, "type": "subscribe", "topic": topic, "privateChannel": false, "response": true }))
            .await
            .map_err(ExchangeError::NetworkError)?;

        let (tx, rx) = mpsc_unbounded::<Trade>();
        let symbol = symbol.to_string();
        client
            .register(
                topic,
                Arc::new(move |text: &str| {
                    let Ok(value) = serde_json::from_str::<Value>(text) else { return };
                    let Some(data) = value.get("data") else { return };
                    let Some(trade) = parse_stream_trade(&symbol, data) else { return };
                    let _ = tx.tx.send(trade);
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
        id: row.get("sequence").and_then(Value::as_str)?.to_string(),
        symbol: symbol.to_string(),
        timestamp: row.get("time").and_then(Value::as_str)?.parse::<i64>().ok()? / 1_000_000,
        price: parse_optional_f64(row.get("price"))?,
        amount: parse_optional_f64(row.get("size"))?,
        side: match row.get("side").and_then(Value::as_str) {
            Some("sell") => Side::Sell,
            _ => Side::Buy,
        },
        is_buyer_maker: None,
        r#type: None,
    })
}
