/// `"BTC/USDT"` -> `"BTCUSDT"` (spec §4.5): identical shape to Binance.
pub fn to_venue(symbol: &str) -> String {
    symbol.replace('/', "").to_uppercase()
}
