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
use spotlink_integration::rate_limit::Throttler;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const BASE_URL: &str = "https://api.bybit.com";

pub struct Bybit {
    client: SignedRestClient<sign::BybitSigner>,
    throttler: Throttler,
    markets: MarketCache,
    ws: WsRegistry,
    category: String,
}

fn timeframe_code(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::M1 => "1",
        Timeframe::M5 => "5",
        Timeframe::M15 => "15",
        Timeframe::M30 => "30",
        Timeframe::H1 => "60",
        Timeframe::H4 => "240",
        Timeframe::D1 => "D",
        Timeframe::W1 => "W",
    }
}

impl Bybit {
    pub fn new(config: ExchangeConfig) -> Self {
        let signer = sign::BybitSigner::new(config.api_key.clone(), config.secret.clone());
        let client = request::build_client(BASE_URL, signer, Arc::new(error::validate));
        Self {
            client,
            throttler: Throttler::new(600, 10.0, Duration::from_secs(1)),
            markets: MarketCache::new(),
            ws: WsRegistry::new(),
            category: config.options.category,
        }
    }
}

#[async_trait]
impl Exchange for Bybit {
    fn id(&self) -> ExchangeId {
        ExchangeId::Bybit
    }

    fn capabilities(&self) -> Capabilities {
        let mut capabilities = Capabilities::full();
        capabilities.fetch_avg_price = false;
        capabilities.test_order = false;
        capabilities.amend_order = false;
        capabilities
    }

    async fn fetch_time(&self) -> Result<i64, ExchangeError> {
        let body = request::request(&self.client, &self.throttler, Method::GET, "/v5/market/time", None, None, false, 1).await?;
        body.get("result")
            .and_then(|r| r.get("timeSecond"))
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<i64>().ok())
            .map(|secs| secs * 1000)
            .ok_or_else(|| ExchangeError::BadRequest("bybit: missing timeSecond in server time response".into()))
    }

    async fn fetch_trading_fees(&self, symbol: Option<&str>) -> Result<Vec<TradingFee>, ExchangeError> {
        let mut query = json!({ "category": self.category });
        if let Some(symbol) = symbol {
            query["symbol"] = json!(symbols::to_venue(symbol));
        }
        let body = request::request(&self.client, &self.throttler, Method::GET, "/v5/account/fee-rate", Some(query), None, true, 1).await?;
        Ok(body
            .get("result")
            .and_then(|r| r.get("list"))
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
        let mut body = json!({ "category": self.category });
        if let Some(symbol) = symbol {
            body["symbol"] = json!(symbols::to_venue(symbol));
        }
        request::request(&self.client, &self.throttler, Method::POST, "/v5/order/cancel-all", None, Some(body), true, 1).await?;
        Ok(())
    }

    async fn fetch_closed_orders(&self, symbol: Option<&str>, limit: Option<u32>) -> Result<Vec<Order>, ExchangeError> {
        let mut query = json!({ "category": self.category, "limit": limit.unwrap_or(50) });
        if let Some(symbol) = symbol {
            query["symbol"] = json!(symbols::to_venue(symbol));
        }
        let body = request::request(&self.client, &self.throttler, Method::GET, "/v5/order/history", Some(query), None, true, 1).await?;
        let rows = body.get("result").and_then(|r| r.get("list")).and_then(Value::as_array).cloned().unwrap_or_default();
        rows.iter()
            .map(|row| {
                let symbol = row.get("symbol").and_then(Value::as_str).unwrap_or_default();
                parse::parse_order(symbol, row)
            })
            .collect()
    }

    async fn load_markets(&self, force_reload: bool) -> Result<Arc<HashMap<String, Market>>, ExchangeError> {
        self.markets
            .load_markets(force_reload, || async {
                let query = json!({ "category": self.category });
                let body = request::request(&self.client, &self.throttler, Method::GET, "/v5/market/instruments-info", Some(query), None, false, 1).await?;
                let mut map = HashMap::new();
                for row in body.get("result").and_then(|r| r.get("list")).and_then(Value::as_array).into_iter().flatten() {
                    let (Some(id), Some(base), Some(quote)) = (
                        row.get("symbol").and_then(Value::as_str),
                        row.get("baseCoin").and_then(Value::as_str),
                        row.get("quoteCoin").and_then(Value::as_str),
                    ) else { continue };
                    let mut market = Market::new(ExchangeId::Bybit, id, base, quote);
                    market.active = row.get("status").and_then(Value::as_str) == Some("Trading");
                    map.insert(market.symbol.clone(), market);
                }
                Ok::<_, ExchangeError>(map)
            })
            .await
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError> {
        let query = json!({ "category": self.category, "symbol": symbols::to_venue(symbol) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/v5/market/tickers", Some(query), None, false, 1).await?;
        Ok(parse::parse_ticker(symbol, &body))
    }

    async fn fetch_order_book(&self, symbol: &str, limit: Option<u32>) -> Result<OrderBook, ExchangeError> {
        let query = json!({ "category": self.category, "symbol": symbols::to_venue(symbol), "limit": limit.unwrap_or(50) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/v5/market/orderbook", Some(query), None, false, 1).await?;
        Ok(parse::parse_order_book(symbol, &body))
    }

    async fn fetch_trades(&self, symbol: &str, limit: Option<u32>) -> Result<Vec<Trade>, ExchangeError> {
        let query = json!({ "category": self.category, "symbol": symbols::to_venue(symbol), "limit": limit.unwrap_or(60) });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/v5/market/recent-trade", Some(query), None, false, 1).await?;
        Ok(parse::parse_trades(symbol, &body))
    }

    async fn fetch_ohlcv(&self, symbol: &str, timeframe: Timeframe, limit: Option<u32>) -> Result<Vec<Candle>, ExchangeError> {
        let query = json!({
            "category": self.category,
            "symbol": symbols::to_venue(symbol),
            "interval": timeframe_code(timeframe),
            "limit": limit.unwrap_or(200),
        });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/v5/market/kline", Some(query), None, false, 1).await?;
        Ok(parse::parse_candles(&body))
    }

    async fn fetch_balance(&self) -> Result<Balances, ExchangeError> {
        let query = json!({ "accountType": "UNIFIED" });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/v5/account/wallet-balance", Some(query), None, true, 1).await?;
        Ok(parse::parse_balances(&body))
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, ExchangeError> {
        let body = json!({
            "category": self.category,
            "symbol": symbols::to_venue(&order.symbol),
            "side": if matches!(order.side, Side::Buy) { "Buy" } else { "Sell" },
            "orderType": if matches!(order.r#type, OrderType::Market) { "Market" } else { "Limit" },
            "qty": order.amount.to_string(),
            "price": order.price.map(|p| p.to_string()),
            "orderLinkId": order.client_order_id,
        });
        let response = request::request(&self.client, &self.throttler, Method::POST, "/v5/order/create", None, Some(body), true, 1).await?;
        let result = response.get("result").cloned().unwrap_or(response);
        parse::parse_order(&order.symbol, &result)
    }

    async fn cancel_order(&self, id: &str, symbol: &str) -> Result<(), ExchangeError> {
        let body = json!({ "category": self.category, "symbol": symbols::to_venue(symbol), "orderId": id });
        request::request(&self.client, &self.throttler, Method::POST, "/v5/order/cancel", None, Some(body), true, 1).await?;
        Ok(())
    }

    async fn fetch_order(&self, id: &str, symbol: &str) -> Result<Order, ExchangeError> {
        let query = json!({ "category": self.category, "symbol": symbols::to_venue(symbol), "orderId": id });
        let body = request::request(&self.client, &self.throttler, Method::GET, "/v5/order/realtime", Some(query), None, true, 1).await?;
        let row = body
            .get("result")
            .and_then(|r| r.get("list"))
            .and_then(Value::as_array)
            .and_then(|rows| rows.first())
            .cloned()
            .ok_or_else(|| ExchangeError::OrderNotFound(id.to_string()))?;
        parse::parse_order(symbol, &row)
    }

    async fn fetch_open_orders(&self, symbol: Option<&str>) -> Result<Vec<Order>, ExchangeError> {
        let mut query = json!({ "category": self.category });
        if let Some(symbol) = symbol {
            query["symbol"] = json!(symbols::to_venue(symbol));
        }
        let body = request::request(&self.client, &self.throttler, Method::GET, "/v5/order/realtime", Some(query), None, true, 1).await?;
        let rows = body.get("result").and_then(|r| r.get("list")).and_then(Value::as_array).cloned().unwrap_or_default();
        rows.iter()
            .map(|row| {
                let symbol = row.get("symbol").and_then(Value::as_str).unwrap_or_default();
                parse::parse_order(symbol, row)
            })
            .collect()
    }

    async fn fetch_my_trades(&self, symbol: Option<&str>, limit: Option<u32>) -> Result<Vec<MyTrade>, ExchangeError> {
        let mut query = json!({ "category": self.category, "limit": limit.unwrap_or(50) });
        if let Some(symbol) = symbol {
            query["symbol"] = json!(symbols::to_venue(symbol));
        }
        let body = request::request(&self.client, &self.throttler, Method::GET, "/v5/execution/list", Some(query), None, true, 1).await?;
        let rows = body.get("result").and_then(|r| r.get("list")).and_then(Value::as_array).cloned().unwrap_or_default();
        Ok(rows
            .iter()
            .filter_map(|row| {
                let symbol = row.get("symbol").and_then(Value::as_str).unwrap_or_default();
                parse::parse_my_trade(symbol, row)
            })
            .collect())
    }

    async fn watch_trades(&self, symbol: &str) -> Result<StreamRx<Trade>, ExchangeError> {
        let venue_symbol = symbols::to_venue(symbol);
        let url = url::Url::parse(ws::WS_URL).expect("static bybit ws url is valid");
        let client = self.ws.get_or_connect(&url, ws::ping_strategy()).await.map_err(ExchangeError::NetworkError)?;

        let topic = ws::trade_topic(&venue_symbol);
        client.send(&json!({ "op": "subscribe", "args": [topic.clone()] })).await.map_err(ExchangeError::NetworkError)?;

        let (tx, rx) = mpsc_unbounded::<Trade>();
        let symbol = symbol.to_string();
        client
            .register(
                topic,
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
        id: row.get("i")?.as_str()?.to_string(),
        symbol: symbol.to_string(),
        timestamp: row.get("T").and_then(Value::as_i64)?,
        price: parse_optional_f64(row.get("p"))?,
        amount: parse_optional_f64(row.get("v"))?,
        side: match row.get("S").and_then(Value::as_str) {
            Some("Sell") => Side::Sell,
            _ => Side::Buy,
        },
        is_buyer_maker: None,
        r#type: None,
    })
}
