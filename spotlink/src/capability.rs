//! Typed capability gating (spec §4.7, §9 redesign flag): replaces a dynamic `has.*` dispatch
//! table with a fixed struct of booleans every adapter fills in once at construction. Calling an
//! operation a venue doesn't support returns [`crate::error::ExchangeError::NotSupported`] rather
//! than panicking or silently returning an empty result.

/// One flag per operation family in the unified `Exchange` surface (spec §4).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct Capabilities {
    pub fetch_markets: bool,
    pub fetch_time: bool,
    pub fetch_ticker: bool,
    pub fetch_tickers: bool,
    pub fetch_order_book: bool,
    pub fetch_book_ticker: bool,
    pub fetch_price: bool,
    pub fetch_avg_price: bool,
    pub fetch_trades: bool,
    pub fetch_ohlcv: bool,
    pub fetch_balance: bool,
    pub fetch_trading_fees: bool,
    pub fetch_commission: bool,
    pub create_order: bool,
    pub test_order: bool,
    pub cancel_order: bool,
    pub cancel_all_orders: bool,
    pub amend_order: bool,
    pub fetch_order: bool,
    pub fetch_open_orders: bool,
    pub fetch_closed_orders: bool,
    pub fetch_my_trades: bool,
    pub watch_ticker: bool,
    pub watch_book_ticker: bool,
    pub watch_order_book: bool,
    pub watch_trades: bool,
    pub watch_ohlcv: bool,
    pub watch_orders: bool,
    pub watch_balance: bool,
}

impl Capabilities {
    /// Every adapter in this crate implements the full public-data surface plus order management;
    /// venues differ in the streaming subset (spec §4.6 per-venue channel tables) and in which of
    /// the newer §6 operations (`fetch_time`, `cancel_all_orders`, `amend_order`, ...) their REST
    /// API actually exposes, so this is the common baseline each venue's constructor starts from
    /// and narrows.
    pub const fn full() -> Self {
        Self {
            fetch_markets: true,
            fetch_time: true,
            fetch_ticker: true,
            fetch_tickers: true,
            fetch_order_book: true,
            fetch_book_ticker: true,
            fetch_price: true,
            fetch_avg_price: true,
            fetch_trades: true,
            fetch_ohlcv: true,
            fetch_balance: true,
            fetch_trading_fees: true,
            fetch_commission: true,
            create_order: true,
            test_order: true,
            cancel_order: true,
            cancel_all_orders: true,
            amend_order: true,
            fetch_order: true,
            fetch_open_orders: true,
            fetch_closed_orders: true,
            fetch_my_trades: true,
            watch_ticker: true,
            watch_book_ticker: true,
            watch_order_book: true,
            watch_trades: true,
            watch_ohlcv: true,
            watch_orders: true,
            watch_balance: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_enables_every_flag() {
        let capabilities = Capabilities::full();
        assert!(capabilities.create_order);
        assert!(capabilities.watch_ohlcv);
    }
}
