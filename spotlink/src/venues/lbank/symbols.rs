/// LBank joins base/quote with an underscore, lowercased (spec §4.1): `"BTC/USDT"` →
/// `"btc_usdt"`.
pub fn to_venue(symbol: &str) -> String {
    let (base, quote) = symbol.split_once('/').unwrap_or((symbol, ""));
    format!("{}_{}", base.to_lowercase(), quote.to_lowercase())
}

pub fn from_venue(venue_symbol: &str) -> String {
    venue_symbol.replace('_', "/").to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underscore_joins_lowercase_base_and_quote() {
        assert_eq!(to_venue("BTC/USDT"), "btc_usdt");
    }

    #[test]
    fn from_venue_reverses_and_uppercases() {
        assert_eq!(from_venue("eth_usdt"), "ETH/USDT");
    }
}
