//! Binance trades concatenated, unseparated symbols (`BTCUSDT`) with no case folding beyond
//! upper-case (spec §4.5 symbol table).

/// `"BTC/USDT"` -> `"BTCUSDT"`.
pub fn to_venue(symbol: &str) -> String {
    symbol.replace('/', "").to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_separator_and_upcases() {
        assert_eq!(to_venue("btc/usdt"), "BTCUSDT");
    }
}
