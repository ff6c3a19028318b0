//! Low-level framework shared by every Spotlink venue adapter: cryptographic primitives, pure
//! helpers, the transport-level error taxonomy, a token-bucket throttler, and the Http/WebSocket
//! protocol contracts (spec §2, §4.1-§4.3, §4.6).

/// Cryptographic primitives: HMAC-SHA256/384/512, SHA256/512, MD5, base64 & hex encodings
/// (spec §4.2).
pub mod crypto;

/// Transport-level error taxonomy (spec §7, `SocketError` layer).
pub mod error;

/// Numeric/string coercion, query serialisation, ISO-8601 <-> epoch-ms, deep merge, sleep
/// (spec §9).
pub mod helpers;

/// Token-bucket rate limiter (spec §4.3).
pub mod rate_limit;

/// Http REST and WebSocket protocol contracts (spec §4.1, §4.6).
pub mod protocol;

/// Channel primitives used for event emission and `watch_*` streaming (spec §6).
pub mod channel;

/// Marks an error as unrecoverable for a channel sender, e.g. a disconnected
/// [`channel::StreamRx`] (used by [`channel::StreamTx`]'s `Sink` impl).
pub trait Unrecoverable {
    fn is_unrecoverable(&self) -> bool;
}
