/// `BTC/USDT` -> `BTC-USDT` (spec §4.1): OKX separates base/quote with a dash.
pub fn to_venue(symbol: &str) -> String {
    symbol.replace('/', "-").to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashes_replace_the_slash() {
        assert_eq!(to_venue("btc/usdt"), "BTC-USDT");
    }
}
