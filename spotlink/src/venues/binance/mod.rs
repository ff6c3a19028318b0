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
use spotlink_instrument::model::fee_schedule::TradingFee;
use spotlink_instrument::model::market::Market;
use spotlink_instrument::model::order::{Order, OrderType};
use spotlink_instrument::model::order_book::OrderBook;
use spotlink_instrument::model::ticker::Ticker;
use spotlink_instrument::model::trade::{MyTrade, Trade};
use spotlink_integration::channel::{mpsc_unbounded, StreamRx};
use spotlink_integration::rate_limit::Throttler;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const BASE_URL: &str = "https://api.binance.com";

pub struct Binance {
    client: BaseRestClient,
    throttler: Throttler,
    markets: MarketCache,
    ws: WsRegistry,
    signer: sign::BinanceSigner,
    has_credentials: bool,
}

impl Binance {
    pub fn new(config: ExchangeConfig) -> Self {
        let signer = sign::BinanceSigner::new(config.api_key.clone(), config.secret.clone());
        let client = request::build_client_with_headers(BASE_URL, signer.api_key_header(), Arc::new(error::validate));
        Self {
            client,
            throttler: Throttler::new(1200, 1.0, Duration::from_secs(60)),
            markets: MarketCache::new(),
            ws: WsRegistry::new(),
            has_credentials: config.has_credentials(),
            signer,
        }
    }

    fn sign(&self, query: &mut Value) -> Result<(), ExchangeError> {
        if !self.has_credentials {
            return Err(ExchangeError::AuthenticationError(
                "binance: missing api_key/secret for a signed request".into(),
            ));
        }
        self.signer.apply(query);
        Ok(())
    }
}

#[async_trait]
impl Exchange for Binance {
    fn id(&self) -> ExchangeId {
        ExchangeId::Binance
    }

    fn capabilities(&self) -> Capabilities {
        let mut capabilities = Capabilities::full();
        capabilities.amend_order = false;
        capabilities
    }

    async fn fetch_time(&self) -> Result<i64, ExchangeError> {
        let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v3/time", None, None, false, 1).await?;
        body.get("serverTime")
            .and_then(Value::as_i64)
            .ok_or_else(|| ExchangeError::BadRequest("binance: missing serverTime in response".into()))
    }

    async fn fetch_avg_price(&self, symbol: &str) -> Result<f64, ExchangeError> {
        let query = json!({ "symbol": symbols::to_venue(symbol) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v3/avgPrice", Some(query), None, false, 1).await?;
        body.get("price")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| ExchangeError::BadRequest("binance: missing price in avgPrice response".into()))
    }

    async fn fetch_trading_fees(&self, symbol: Option<&str>) -> Result<Vec<TradingFee>, ExchangeError> {
        let mut query = json!({});
        if let Some(symbol) = symbol {
            query["symbol"] = json!(symbols::to_venue(symbol));
        }
        self.sign(&mut query)?;
        let body = request::request(&self.client, &self.throttler, Method::GET, "/sapi/v1/asset/tradeFee", Some(query), None, true, 1).await?;
        Ok(body
            .as_array()
            .into_iter()
            .flatten()
            .map(|row| TradingFee {
                symbol: row.get("symbol").and_then(Value::as_str).map(String::from),
                maker: row.get("makerCommission").and_then(Value::as_str).and_then(|s| s.parse().ok()).unwrap_or(0.0),
                taker: row.get("takerCommission").and_then(Value::as_str).and_then(|s| s.parse().ok()).unwrap_or(0.0),
            })
            .collect())
    }

    async fn test_order(&self, order: NewOrder) -> Result<(), ExchangeError> {
        let mut query = json!({
            "symbol": symbols::to_venue(&order.symbol),
            "side": if matches!(order.side, spotlink_instrument::model::trade::Side::Buy) { "BUY" } else { "SELL" },
            "type": if matches!(order.r#type, OrderType::Market) { "MARKET" } else { "LIMIT" },
            "quantity": order.amount,
        });
        if let Some(price) = order.price {
            query["price"] = json!(price);
            query["timeInForce"] = json!("GTC");
        }
        self.sign(&mut query)?;
        request::request(&self.client, &self.throttler, Method::POST, "/api/v3/order/test", Some(query), None, true, 1).await?;
        Ok(())
    }

    async fn cancel_all_orders(&self, symbol: Option<&str>) -> Result<(), ExchangeError> {
        let symbol = symbol.ok_or_else(|| ExchangeError::BadRequest("binance requires a symbol to cancel all orders".into()))?;
        let mut query = json!({ "symbol": symbols::to_venue(symbol) });
        self.sign(&mut query)?;
        request::request(&self.client, &self.throttler, Method::DELETE, "/api/v3/openOrders", Some(query), None, true, 1).await?;
        Ok(())
    }

    async fn fetch_closed_orders(&self, symbol: Option<&str>, limit: Option<u32>) -> Result<Vec<Order>, ExchangeError> {
        let symbol = symbol.ok_or_else(|| ExchangeError::BadRequest("binance requires a symbol to fetch order history".into()))?;
        let mut query = json!({ "symbol": symbols::to_venue(symbol), "limit": limit.unwrap_or(500) });
        self.sign(&mut query)?;
        let body = request::request(&self.client, &self.throttler, Method::GET, "/api/v3/allOrders", Some(query), None, true, 10).await?;
        body.as_array()
            .into_iter()
            .flatten()
            .map(|row| parse::parse_order(symbol, row))
            .collect::<Result<Vec<_>, _>>()
            .map(|orders| orders.into_iter().filter(|order| order.status.is_terminal()).collect())
    }

    async fn load_markets(&self, force_reload: bool) -> Result<Arc<HashMap<String, Market>>, ExchangeError> {
        self.markets
            .load_markets(force_reload, || async {
                let body = request::request(
                    &self.client,
                    &self.throttler,
                    Method::GET,
                    "/api/v3/exchangeInfo",
                    None,
                    None,
                    false,
                    10,
                )
                .await?;
                let mut map = HashMap::new();
                for row in body.get("symbols").and_then(Value::as_array).into_iter().flatten() {
                    let (Some(id), Some(base), Some(quote)) = (
                        row.get("symbol").and_then(Value::as_str),
                        row.get("baseAsset").and_then(Value::as_str),
                        row.get("quoteAsset").and_then(Value::as_str),
                    ) else {
                        continue;
                    };
                    let mut market = Market::new(ExchangeId::Binance, id, base, quote);
                    market.active = row.get("status").and_then(Value::as_str) == Some("TRADING");
                    map.insert(market.symbol.clone(), market);
                }
                Ok::<_, ExchangeError>(map)
            })
            .await
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError> {
        let venue_symbol = symbols::to_venue(symbol);
        let query = json!({ "symbol": venue_symbol });
        let body = request::request(
            &self.client,
            &self.throttler,
            Method::GET,
            "/api/v3/ticker/24hr",
            Some(query),
            None,
            false,
            1,
        )
        .await?;
        Ok(parse::parse_ticker(symbol, &body))
    }

    async fn fetch_order_book(&self, symbol: &str, limit: Option<u32>) -> Result<OrderBook, ExchangeError> {
        let query = json!({ "symbol": symbols::to_venue(symbol), "limit": limit.unwrap_or(100) });
        let body = request::request(
            &self.client,
            &self.throttler,
            Method::GET,
            "/api/v3/depth",
            Some(query),
            None,
            false,
            1,
        )
        .await?;
        Ok(parse::parse_order_book(symbol, &body))
    }

    async fn fetch_trades(&self, symbol: &str, limit: Option<u32>) -> Result<Vec<Trade>, ExchangeError> {
        let query = json!({ "symbol": symbols::to_venue(symbol), "limit": limit.unwrap_or(500) });
        let body = request::request(
            &self.client,
            &self.throttler,
            Method::GET,
            "/api/v3/trades",
            Some(query),
            None,
            false,
            1,
        )
        .await?;
        Ok(parse::parse_trades(symbol, &body))
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: Option<u32>,
    ) -> Result<Vec<Candle>, ExchangeError> {
        let query = json!({
            "symbol": symbols::to_venue(symbol),
            "interval": timeframe.as_str(),
            "limit": limit.unwrap_or(500),
        });
        let body = request::request(
            &self.client,
            &self.throttler,
            Method::GET,
            "/api/v3/klines",
            Some(query),
            None,
            false,
            1,
        )
        .await?;
        Ok(parse::parse_candles(&body))
    }

    async fn fetch_balance(&self) -> Result<Balances, ExchangeError> {
        let mut query = json!({});
        self.sign(&mut query)?;
        let body = request::request(
            &self.client,
            &self.throttler,
            Method::GET,
            "/api/v3/account",
            Some(query),
            None,
            true,
            10,
        )
        .await?;
        Ok(parse::parse_balances(&body))
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, ExchangeError> {
        let mut query = json!({
            "symbol": symbols::to_venue(&order.symbol),
            "side": if matches!(order.side, spotlink_instrument::model::trade::Side::Buy) { "BUY" } else { "SELL" },
            "type": if matches!(order.r#type, OrderType::Market) { "MARKET" } else { "LIMIT" },
            "quantity": order.amount,
        });
        if let Some(price) = order.price {
            query["price"] = json!(price);
            query["timeInForce"] = json!("GTC");
        }
        if let Some(client_id) = &order.client_order_id {
            query["newClientOrderId"] = json!(client_id);
        }
        self.sign(&mut query)?;
        let body = request::request(
            &self.client,
            &self.throttler,
            Method::POST,
            "/api/v3/order",
            Some(query),
            None,
            true,
            1,
        )
        .await?;
        parse::parse_order(&order.symbol, &body)
    }

    async fn cancel_order(&self, id: &str, symbol: &str) -> Result<(), ExchangeError> {
        let mut query = json!({ "symbol": symbols::to_venue(symbol), "orderId": id });
        self.sign(&mut query)?;
        request::request(
            &self.client,
            &self.throttler,
            Method::DELETE,
            "/api/v3/order",
            Some(query),
            None,
            true,
            1,
        )
        .await?;
        Ok(())
    }

    async fn fetch_order(&self, id: &str, symbol: &str) -> Result<Order, ExchangeError> {
        let mut query = json!({ "symbol": symbols::to_venue(symbol), "orderId": id });
        self.sign(&mut query)?;
        let body = request::request(
            &self.client,
            &self.throttler,
            Method::GET,
            "/api/v3/order",
            Some(query),
            None,
            true,
            2,
        )
        .await?;
        parse::parse_order(symbol, &body)
    }

    async fn fetch_open_orders(&self, symbol: Option<&str>) -> Result<Vec<Order>, ExchangeError> {
        let mut query = json!({});
        if let Some(symbol) = symbol {
            query["symbol"] = json!(symbols::to_venue(symbol));
        }
        self.sign(&mut query)?;
        let body = request::request(
            &self.client,
            &self.throttler,
            Method::GET,
            "/api/v3/openOrders",
            Some(query),
            None,
            true,
            3,
        )
        .await?;
        let rows = body.as_array().cloned().unwrap_or_default();
        rows.iter()
            .map(|row| {
                let symbol = row.get("symbol").and_then(Value::as_str).unwrap_or_default();
                parse::parse_order(symbol, row)
            })
            .collect()
    }

    async fn fetch_my_trades(
        &self,
        symbol: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<MyTrade>, ExchangeError> {
        let Some(symbol) = symbol else {
            return Err(ExchangeError::BadRequest("binance requires a symbol to fetch trades".into()));
        };
        let mut query = json!({ "symbol": symbols::to_venue(symbol), "limit": limit.unwrap_or(500) });
        self.sign(&mut query)?;
        let body = request::request(
            &self.client,
            &self.throttler,
            Method::GET,
            "/api/v3/myTrades",
            Some(query),
            None,
            true,
            10,
        )
        .await?;
        Ok(body
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|row| parse::parse_my_trade(symbol, row))
            .collect())
    }

    async fn watch_trades(&self, symbol: &str) -> Result<StreamRx<Trade>, ExchangeError> {
        let venue_symbol = symbols::to_venue(symbol);
        let channel = ws::trade_channel(&venue_symbol);
        let url = ws::combined_stream_url(&[channel.clone()]);
        let client = self
            .ws
            .get_or_connect(&url, ws::ping_strategy())
            .await
            .map_err(ExchangeError::NetworkError)?;

        let (tx, rx) = mpsc_unbounded::<Trade>();
        let symbol = symbol.to_string();
        client
            .register(
                channel,
                Arc::new(move |text: &str| {
                    let Ok(value) = serde_json::from_str::<Value>(text) else { return };
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
    use spotlink_instrument::model::trade::Side;
    use spotlink_integration::helpers::parse_optional_f64;
    Some(Trade {
        id: data.get("t")?.to_string(),
        symbol: symbol.to_string(),
        timestamp: data.get("T").and_then(Value::as_i64)?,
        price: parse_optional_f64(data.get("p"))?,
        amount: parse_optional_f64(data.get("q"))?,
        side: if data.get("m").and_then(Value::as_bool).unwrap_or(false) {
            Side::Sell
        } else {
            Side::Buy
        },
        is_buyer_maker: data.get("m").and_then(Value::as_bool),
        r#type: None,
    })
}
