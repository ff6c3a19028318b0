//! The unified `Exchange` trait (spec §4): one façade every venue adapter implements, replacing
//! the dynamic `has.*`/method-presence dispatch of the source with a typed surface gated by
//! [`Capabilities`] (spec §9 redesign flag).

use crate::capability::Capabilities;
use crate::error::ExchangeError;
use async_trait::async_trait;
use spotlink_instrument::exchange::ExchangeId;
use spotlink_instrument::model::balance::Balances;
use spotlink_instrument::model::book_ticker::BookTicker;
use spotlink_instrument::model::candle::{Candle, Timeframe};
use spotlink_instrument::model::fee_schedule::TradingFee;
use spotlink_instrument::model::market::Market;
use spotlink_instrument::model::order::{Order, OrderType, TimeInForce};
use spotlink_instrument::model::order_book::OrderBook;
use spotlink_instrument::model::ticker::Ticker;
use spotlink_instrument::model::trade::{MyTrade, Side, Trade};
use spotlink_integration::channel::StreamRx;
use std::collections::HashMap;
use std::sync::Arc;

/// Parameters accepted by [`Exchange::create_order`] (spec §4.5).
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub symbol: String,
    pub r#type: OrderType,
    pub side: Side,
    pub amount: f64,
    pub price: Option<f64>,
    pub time_in_force: Option<TimeInForce>,
    pub client_order_id: Option<String>,
}

impl NewOrder {
    pub fn market(symbol: impl Into<String>, side: Side, amount: f64) -> Self {
        Self {
            symbol: symbol.into(),
            r#type: OrderType::Market,
            side,
            amount,
            price: None,
            time_in_force: None,
            client_order_id: None,
        }
    }

    pub fn limit(symbol: impl Into<String>, side: Side, amount: f64, price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            r#type: OrderType::Limit,
            side,
            amount,
            price: Some(price),
            time_in_force: None,
            client_order_id: None,
        }
    }
}

/// Parameters accepted by [`Exchange::amend_order`]: an in-place revision of a resting order's
/// price and/or amount, where the venue supports it (spec §6 `amend_order`).
#[derive(Debug, Clone, Default)]
pub struct OrderAmendment {
    pub amount: Option<f64>,
    pub price: Option<f64>,
}

/// The surface every venue adapter implements (spec §4). Operations outside an adapter's
/// [`Capabilities`] return [`ExchangeError::NotSupported`] rather than being absent at compile
/// time, since the trait is the common contract a caller programs against regardless of venue.
#[async_trait]
pub trait Exchange: Send + Sync {
    fn id(&self) -> ExchangeId;

    fn capabilities(&self) -> Capabilities;

    async fn load_markets(&self, force_reload: bool) -> Result<Arc<HashMap<String, Market>>, ExchangeError>;

    /// Look up one loaded market, loading the venue's market map first if it isn't cached yet.
    /// Fails with [`ExchangeError::BadSymbol`] when the symbol isn't one of the venue's markets
    /// (spec §4.4/§6 `market(symbol)`).
    async fn market(&self, symbol: &str) -> Result<Market, ExchangeError> {
        let markets = self.load_markets(false).await?;
        markets
            .get(symbol)
            .cloned()
            .ok_or_else(|| ExchangeError::BadSymbol(symbol.to_string()))
    }

    /// Venue server time, in milliseconds since the epoch (spec §6 `fetch_time`).
    async fn fetch_time(&self) -> Result<i64, ExchangeError> {
        Err(ExchangeError::NotSupported("fetch_time"))
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError>;

    /// Batch ticker fetch (spec §6 `fetch_tickers`). Defaults to one [`Exchange::fetch_ticker`]
    /// call per symbol against the loaded market map when `symbols` is `None`; a venue with a
    /// true batch endpoint should override this rather than pay the per-symbol round-trip cost.
    async fn fetch_tickers(&self, symbols: Option<&[String]>) -> Result<HashMap<String, Ticker>, ExchangeError> {
        let symbols = match symbols {
            Some(symbols) => symbols.to_vec(),
            None => self.load_markets(false).await?.keys().cloned().collect(),
        };
        let mut out = HashMap::with_capacity(symbols.len());
        for symbol in symbols {
            let ticker = self.fetch_ticker(&symbol).await?;
            out.insert(symbol, ticker);
        }
        Ok(out)
    }

    async fn fetch_order_book(&self, symbol: &str, limit: Option<u32>) -> Result<OrderBook, ExchangeError>;

    /// Best bid/ask only (spec §6 `fetch_book_ticker`). Defaults to the top level of
    /// [`Exchange::fetch_order_book`]; a venue exposing a dedicated lighter-weight endpoint
    /// should override this instead of paying the full order-book fetch cost.
    async fn fetch_book_ticker(&self, symbol: &str) -> Result<BookTicker, ExchangeError> {
        let book = self.fetch_order_book(symbol, Some(1)).await?;
        let bid = book.bids.first().ok_or_else(|| ExchangeError::BadRequest(format!("{symbol} has no bid levels")))?;
        let ask = book.asks.first().ok_or_else(|| ExchangeError::BadRequest(format!("{symbol} has no ask levels")))?;
        Ok(BookTicker {
            timestamp: book.timestamp,
            bid: bid[0],
            bid_volume: Some(bid[1]),
            ask: ask[0],
            ask_volume: Some(ask[1]),
        })
    }

    /// Last traded price only (spec §6 `fetch_price`). Defaults to
    /// [`Exchange::fetch_ticker`]'s `last` field.
    async fn fetch_price(&self, symbol: &str) -> Result<f64, ExchangeError> {
        self.fetch_ticker(symbol)
            .await?
            .last
            .ok_or_else(|| ExchangeError::BadRequest(format!("{symbol} ticker has no last price")))
    }

    /// Volume-weighted average price over the venue's own lookback window (spec §6
    /// `fetch_avg_price`). No generic derivation from other unified shapes exists — every venue
    /// that supports this has a dedicated endpoint, so there is no default beyond `NotSupported`.
    async fn fetch_avg_price(&self, symbol: &str) -> Result<f64, ExchangeError> {
        let _ = symbol;
        Err(ExchangeError::NotSupported("fetch_avg_price"))
    }

    async fn fetch_trades(&self, symbol: &str, limit: Option<u32>) -> Result<Vec<Trade>, ExchangeError>;

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: Option<u32>,
    ) -> Result<Vec<Candle>, ExchangeError>;

    async fn fetch_balance(&self) -> Result<Balances, ExchangeError>;

    /// Maker/taker commission schedule (spec §6 `fetch_trading_fees`), scoped to one symbol when
    /// given, the whole account's schedule otherwise.
    async fn fetch_trading_fees(&self, symbol: Option<&str>) -> Result<Vec<TradingFee>, ExchangeError> {
        let _ = symbol;
        Err(ExchangeError::NotSupported("fetch_trading_fees"))
    }

    /// Effective commission rate for one symbol (spec §6 `fetch_commission`). Defaults to the
    /// matching entry from [`Exchange::fetch_trading_fees`]; a venue whose commission endpoint
    /// differs from its fee-schedule endpoint should override this directly.
    async fn fetch_commission(&self, symbol: &str) -> Result<TradingFee, ExchangeError> {
        self.fetch_trading_fees(Some(symbol))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ExchangeError::NotSupported("fetch_commission"))
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, ExchangeError>;

    /// Convenience wrapper over [`Exchange::create_order`] for a limit order (spec §6
    /// `create_limit_order`).
    async fn create_limit_order(
        &self,
        symbol: &str,
        side: Side,
        amount: f64,
        price: f64,
    ) -> Result<Order, ExchangeError> {
        self.create_order(NewOrder::limit(symbol, side, amount, price)).await
    }

    /// Convenience wrapper over [`Exchange::create_order`] for a market order (spec §6
    /// `create_market_order`).
    async fn create_market_order(&self, symbol: &str, side: Side, amount: f64) -> Result<Order, ExchangeError> {
        self.create_order(NewOrder::market(symbol, side, amount)).await
    }

    /// Validate an order against the venue's dry-run/test endpoint without resting it on the
    /// order book (spec §6 `test_order`). Not every venue exposes one.
    async fn test_order(&self, order: NewOrder) -> Result<(), ExchangeError> {
        let _ = order;
        Err(ExchangeError::NotSupported("test_order"))
    }

    async fn cancel_order(&self, id: &str, symbol: &str) -> Result<(), ExchangeError>;

    /// Cancel every open order, optionally scoped to one symbol (spec §6 `cancel_all_orders`).
    async fn cancel_all_orders(&self, symbol: Option<&str>) -> Result<(), ExchangeError> {
        let _ = symbol;
        Err(ExchangeError::NotSupported("cancel_all_orders"))
    }

    /// Revise a resting order's price and/or amount in place, where the venue supports it
    /// without a cancel/replace round trip (spec §6 `amend_order`).
    async fn amend_order(&self, id: &str, symbol: &str, amendment: OrderAmendment) -> Result<Order, ExchangeError> {
        let _ = (id, symbol, amendment);
        Err(ExchangeError::NotSupported("amend_order"))
    }

    async fn fetch_order(&self, id: &str, symbol: &str) -> Result<Order, ExchangeError>;

    async fn fetch_open_orders(&self, symbol: Option<&str>) -> Result<Vec<Order>, ExchangeError>;

    /// Terminal (filled/canceled/rejected/expired) orders, optionally scoped to one symbol (spec
    /// §6 `fetch_closed_orders`).
    async fn fetch_closed_orders(&self, symbol: Option<&str>, limit: Option<u32>) -> Result<Vec<Order>, ExchangeError> {
        let _ = (symbol, limit);
        Err(ExchangeError::NotSupported("fetch_closed_orders"))
    }

    async fn fetch_my_trades(
        &self,
        symbol: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<MyTrade>, ExchangeError>;

    async fn watch_ticker(&self, symbol: &str) -> Result<StreamRx<Ticker>, ExchangeError> {
        let _ = symbol;
        Err(ExchangeError::NotSupported("watch_ticker"))
    }

    /// Streaming best bid/ask (spec §6 `watch_book_ticker`), the live counterpart of
    /// [`Exchange::fetch_book_ticker`].
    async fn watch_book_ticker(&self, symbol: &str) -> Result<StreamRx<BookTicker>, ExchangeError> {
        let _ = symbol;
        Err(ExchangeError::NotSupported("watch_book_ticker"))
    }

    async fn watch_order_book(&self, symbol: &str) -> Result<StreamRx<OrderBook>, ExchangeError> {
        let _ = symbol;
        Err(ExchangeError::NotSupported("watch_order_book"))
    }

    async fn watch_trades(&self, symbol: &str) -> Result<StreamRx<Trade>, ExchangeError> {
        let _ = symbol;
        Err(ExchangeError::NotSupported("watch_trades"))
    }

    async fn watch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<StreamRx<Candle>, ExchangeError> {
        let _ = (symbol, timeframe);
        Err(ExchangeError::NotSupported("watch_ohlcv"))
    }

    async fn watch_orders(&self) -> Result<StreamRx<Order>, ExchangeError> {
        Err(ExchangeError::NotSupported("watch_orders"))
    }

    /// Streaming balance updates (spec §6 `watch_balance`).
    async fn watch_balance(&self) -> Result<StreamRx<Balances>, ExchangeError> {
        Err(ExchangeError::NotSupported("watch_balance"))
    }

    /// Tear down every open WebSocket connection this adapter holds (spec §4.6).
    async fn close_all_ws(&self);
}
