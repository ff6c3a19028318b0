/// Pionex market symbols are underscore-joined, uppercase, base before quote: `"BTC/USDT"` →
/// `"BTC_USDT"`.
pub fn to_venue(symbol: &str) -> String {
    let (base, quote) = symbol.split_once('/').unwrap_or((symbol, ""));
    format!("{}_{}", base.to_uppercase(), quote.to_uppercase())
}

pub fn from_venue(venue_symbol: &str) -> String {
    venue_symbol.replace('_', "/").to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underscore_joins_base_and_quote() {
        assert_eq!(to_venue("BTC/USDT"), "BTC_USDT");
        assert_eq!(from_venue("BTC_USDT"), "BTC/USDT");
    }
}
