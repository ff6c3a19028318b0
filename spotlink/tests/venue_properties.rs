//! Cross-venue properties (spec §8): signature determinism across signing dialects, symbol
//! translation round-trips, unified-model invariants fed with venue-shaped input, and
//! capability defaults. Per-venue parser/error-mapping edge cases live beside the code under
//! `spotlink/src/venues/<venue>/`; this file only covers behavior that spans more than one
//! module.

use reqwest::Method;
use serde_json::json;
use spotlink::capability::Capabilities;
use spotlink::venues::{bitfinex, bybit, kraken, okx, pionex};
use spotlink_instrument::model::candle::ensure_ascending;
use spotlink_instrument::model::order::{Order, OrderStatus, OrderType};
use spotlink_instrument::model::order_book::OrderBook;
use spotlink_instrument::model::trade::Side;
use spotlink_integration::protocol::http::private::Signer;

/// Every dynamic `Signer` impl must be a pure function of its inputs at a fixed instant: signing
/// the same method/path/query/body twice must not itself perturb the result (nonces/timestamps
/// aside, which these signers source from the caller-supplied query/body, not generated inside
/// `sign`).
#[test]
fn okx_signature_is_base64_and_deterministic_for_fixed_inputs() {
    let signer = okx::sign::OkxSigner::new("key".into(), "secret".into(), "pass".into());
    let first = signer.sign(&Method::GET, "/api/v5/account/balance", "ccy=BTC", "").unwrap();
    let second = signer.sign(&Method::GET, "/api/v5/account/balance", "ccy=BTC", "").unwrap();

    let sig = |parts: &spotlink_integration::protocol::http::private::SignedParts| {
        parts
            .headers
            .iter()
            .find(|(name, _)| name.as_str() == "ok-access-sign")
            .map(|(_, value)| value.to_str().unwrap().to_string())
            .unwrap()
    };

    // Base64 over a 32-byte HMAC-SHA256 digest is 44 characters (with padding).
    assert_eq!(sig(&first).len(), 44);
    // The signature is keyed off the OK-ACCESS-TIMESTAMP header, which both calls regenerate
    // independently, so only the envelope shape (not byte equality) is guaranteed here.
    assert_eq!(sig(&first).len(), sig(&second).len());
}

#[test]
fn bybit_signature_differs_between_get_and_post_payload_source() {
    let signer = bybit::sign::BybitSigner::new("key".into(), "secret".into());
    let get_parts = signer.sign(&Method::GET, "/v5/market/tickers", "category=spot", "").unwrap();
    let post_parts = signer.sign(&Method::POST, "/v5/order/create", "", r#"{"symbol":"BTCUSDT"}"#).unwrap();

    let find = |parts: &spotlink_integration::protocol::http::private::SignedParts, key: &str| {
        parts.headers.iter().any(|(name, _)| name.as_str() == key)
    };
    assert!(find(&get_parts, "x-bapi-api-key"));
    assert!(find(&post_parts, "x-bapi-api-key"));
}

#[test]
fn kraken_signature_reads_nonce_back_out_of_the_signed_body() {
    let signer = kraken::sign::KrakenSigner::new("key".into(), "c2VjcmV0");
    let mut body = json!({"pair": "XBTUSD"});
    signer.apply(&mut body);
    let body_str = serde_json::to_string(&body).unwrap();

    // Signing twice over the same already-nonced body string must be deterministic: the nonce
    // lives inside `body_str` itself now, not regenerated inside `sign`.
    let first = signer.sign(&Method::POST, "/0/private/AddOrder", "", &body_str).unwrap();
    let second = signer.sign(&Method::POST, "/0/private/AddOrder", "", &body_str).unwrap();
    assert_eq!(first.headers, second.headers);
}

#[test]
fn pionex_signature_is_pure_function_of_its_inputs() {
    let signer = pionex::sign::PionexSigner::new("key".into(), "secret".into());
    let first = signer.sign(&Method::GET, "/api/v1/account/balances", "timestamp=1700000000000", "").unwrap();
    let second = signer.sign(&Method::GET, "/api/v1/account/balances", "timestamp=1700000000000", "").unwrap();
    assert_eq!(first.headers, second.headers);
}

/// OKX's WebSocket dispatch key is synthesized as `"{channel}:{instId}"` from a nested `arg`
/// object rather than read off a flat top-level field (spec §4.6) — covered here since the
/// synthesis itself lives in the shared dispatcher, exercised through the OKX dialect module.
#[test]
fn okx_trade_channel_key_embeds_both_channel_and_symbol() {
    let key = okx::ws::channel_key("BTC-USDT");
    assert!(key.contains("trades"));
    assert!(key.contains("BTC-USDT"));
}

/// Candles arriving out of order (or duplicated) from a venue must come out strictly ascending
/// and deduplicated by timestamp (spec §8 round-trip law) regardless of which venue produced
/// them; exercised here through Bitfinex's parser, which is fed naturally-reversed rows.
#[test]
fn bitfinex_candles_are_reordered_ascending() {
    let body = json!([
        [3_i64, 101.0, 102.0, 103.0, 100.0, 10.0],
        [1_i64, 99.0, 100.0, 101.0, 98.0, 5.0],
        [2_i64, 100.0, 101.0, 102.0, 99.0, 7.0],
    ]);
    let candles = bitfinex::parse::parse_candles(&body);
    let timestamps: Vec<f64> = candles.iter().map(|c| c[0]).collect();
    assert_eq!(timestamps, vec![1.0, 2.0, 3.0]);
}

#[test]
fn ensure_ascending_dedupes_repeated_timestamps() {
    let candles = vec![[1.0, 0.0, 0.0, 0.0, 0.0, 0.0], [1.0, 1.0, 1.0, 1.0, 1.0, 1.0], [2.0, 0.0, 0.0, 0.0, 0.0, 0.0]];
    let result = ensure_ascending(candles);
    assert_eq!(result.len(), 2);
}

/// An order book built from venue rows that include a crossed bid/ask pair and a zero-quantity
/// level must come out with the zero level stripped and both sides correctly ordered, regardless
/// of which venue's raw rows fed it (spec §8 property 4).
#[test]
fn order_book_construction_strips_and_sorts_across_any_venue_shape() {
    let book = OrderBook::new(
        "BTC/USDT",
        1_700_000_000_000,
        Some(42),
        vec![[100.5, 1.0], [100.0, 0.0], [101.0, 2.0]],
        vec![[102.0, 1.0], [101.5, 0.0], [103.0, 0.5]],
    );
    assert_eq!(book.bids, vec![[101.0, 2.0], [100.5, 1.0]]);
    assert_eq!(book.asks, vec![[102.0, 1.0], [103.0, 0.5]]);
    assert_eq!(book.nonce, Some(42));
}

/// Every adapter's `create_order` must route a market order's quantity through the unified
/// `Order` invariants the same way regardless of venue: filled clamped to amount, average only
/// populated once both filled and cost are positive (spec §8 property 2).
#[test]
fn order_invariants_hold_for_over_reported_fill() {
    let order = Order::new(
        "123",
        "BTC/USDT",
        OrderType::Market,
        Side::Buy,
        None,
        0.5,
        10.0,
        300.0,
        OrderStatus::Filled,
        1_700_000_000_000,
    );
    assert_eq!(order.filled, 0.5);
    assert_eq!(order.remaining, 0.0);
    assert_eq!(order.average, Some(600.0));
}

#[test]
fn capabilities_full_enables_every_operation_new_adapters_start_from() {
    let capabilities = Capabilities::full();
    assert!(capabilities.fetch_markets);
    assert!(capabilities.watch_trades);
    assert!(capabilities.create_order);
}
