/// Bittrex market symbols are hyphen-joined, uppercase, base before quote: `"BTC/USD"` →
/// `"BTC-USD"`.
pub fn to_venue(symbol: &str) -> String {
    let (base, quote) = symbol.split_once('/').unwrap_or((symbol, ""));
    format!("{}-{}", base.to_uppercase(), quote.to_uppercase())
}

pub fn from_venue(venue_symbol: &str) -> String {
    venue_symbol.replace('-', "/").to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hyphen_joins_base_and_quote() {
        assert_eq!(to_venue("BTC/USD"), "BTC-USD");
        assert_eq!(from_venue("BTC-USD"), "BTC/USD");
    }
}
