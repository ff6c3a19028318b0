/// KuCoin joins base/quote with a hyphen and uppercases both sides (spec §4.1): `"BTC/USDT"` →
/// `"BTC-USDT"`.
pub fn to_venue(symbol: &str) -> String {
    let (base, quote) = symbol.split_once('/').unwrap_or((symbol, ""));
    format!("{}-{}", base.to_uppercase(), quote.to_uppercase())
}

/// Reverses [`to_venue`] for ids KuCoin returns that aren't already in `markets_by_id`.
pub fn from_venue(venue_symbol: &str) -> String {
    venue_symbol.replace('-', "/").to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hyphen_joins_base_and_quote() {
        assert_eq!(to_venue("btc/usdt"), "BTC-USDT");
    }

    #[test]
    fn from_venue_reverses_the_hyphen() {
        assert_eq!(from_venue("ETH-USDT"), "ETH/USDT");
    }
}
