/// Bitforex market symbols are `coin-{quote}-{base}`, lowercase: `"BTC/USDT"` →
/// `"coin-usdt-btc"`.
pub fn to_venue(symbol: &str) -> String {
    let (base, quote) = symbol.split_once('/').unwrap_or((symbol, ""));
    format!("coin-{}-{}", quote.to_lowercase(), base.to_lowercase())
}

pub fn from_venue(venue_symbol: &str) -> Option<String> {
    let rest = venue_symbol.strip_prefix("coin-")?;
    let (quote, base) = rest.split_once('-')?;
    Some(format!("{}/{}", base.to_uppercase(), quote.to_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_with_coin_and_swaps_quote_before_base() {
        assert_eq!(to_venue("BTC/USDT"), "coin-usdt-btc");
        assert_eq!(from_venue("coin-usdt-btc"), Some("BTC/USDT".to_string()));
    }
}
