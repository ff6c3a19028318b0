/// Kraken aliases `BTC` to `XBT` in its own pair codes (spec §4.4); REST accepts the alt name
/// directly (`XBTUSD`) without the legacy `X`/`Z` prefixes `AssetPairs` reports.
fn alias(asset: &str) -> String {
    match asset.to_uppercase().as_str() {
        "BTC" => "XBT".to_string(),
        other => other.to_string(),
    }
}

pub fn to_venue(symbol: &str) -> String {
    let (base, quote) = symbol.split_once('/').unwrap_or((symbol, ""));
    format!("{}{}", alias(base), alias(quote))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn btc_is_aliased_to_xbt() {
        assert_eq!(to_venue("BTC/USD"), "XBTUSD");
    }

    #[test]
    fn non_aliased_assets_pass_through() {
        assert_eq!(to_venue("ETH/USD"), "ETHUSD");
    }
}
