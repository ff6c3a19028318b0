/// Bitstamp concatenates base/quote lowercased with no separator (spec §4.1): `"BTC/USD"` →
/// `"btcusd"`.
pub fn to_venue(symbol: &str) -> String {
    let (base, quote) = symbol.split_once('/').unwrap_or((symbol, ""));
    format!("{}{}", base.to_lowercase(), quote.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenates_lowercase_with_no_separator() {
        assert_eq!(to_venue("BTC/USD"), "btcusd");
    }
}
