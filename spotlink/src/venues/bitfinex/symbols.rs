/// Bitfinex prefixes every trading symbol with `t` and drops the separator for 3-letter codes
/// (`tBTCUSD`); longer codes keep a colon (`tDOGE:USD`) (spec §4.1).
pub fn to_venue(symbol: &str) -> String {
    let (base, quote) = symbol.split_once('/').unwrap_or((symbol, ""));
    let base = base.to_uppercase();
    let quote = quote.to_uppercase();
    if base.len() == 3 && quote.len() == 3 {
        format!("t{base}{quote}")
    } else {
        format!("t{base}:{quote}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_letter_codes_are_concatenated() {
        assert_eq!(to_venue("BTC/USD"), "tBTCUSD");
    }

    #[test]
    fn longer_codes_keep_a_colon() {
        assert_eq!(to_venue("DOGE/USD"), "tDOGE:USD");
    }
}
