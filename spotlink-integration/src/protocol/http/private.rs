use super::{BuildStrategy, rest::RestRequest};
use crate::error::SocketError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// Venue-specific signing logic invoked by [`RequestSigner`] for every signed [`RestRequest`]
/// (spec §4.2). Each venue adapter provides exactly one implementation of this trait.
///
/// `sign` receives the request path, method and already-serialised query/body strings, and
/// returns the headers to attach. Venues that carry their signature in the query string itself
/// (Pionex, Bitforex) add it as an extra field on their `QueryParams` type rather than rewriting
/// the URL here, keeping this contract uniform across the signing dialects in spec §4.2.
pub trait Signer {
    fn sign(
        &self,
        method: &reqwest::Method,
        path: &str,
        query: &str,
        body: &str,
    ) -> Result<SignedParts, SocketError>;
}

#[derive(Debug, Clone, Default)]
pub struct SignedParts {
    pub headers: Vec<(HeaderName, HeaderValue)>,
}

/// [`BuildStrategy`] that signs every [`RestRequest`] via a configured [`Signer`] before
/// building the final [`reqwest::Request`].
#[derive(Debug, Clone)]
pub struct RequestSigner<S> {
    signer: S,
}

impl<S> RequestSigner<S> {
    pub fn new(signer: S) -> Self {
        Self { signer }
    }
}

impl<S> BuildStrategy for RequestSigner<S>
where
    S: Signer,
{
    fn build<Request>(
        &self,
        request: &Request,
        mut builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Request, SocketError>
    where
        Request: RestRequest,
    {
        if !request.is_signed() {
            return builder.build().map_err(SocketError::from);
        }

        let method = request.method();
        let query = request
            .query_params()
            .map(|q| serde_urlencoded::to_string(q))
            .transpose()?
            .unwrap_or_default();
        let body = request
            .body()
            .map(serde_json::to_string)
            .transpose()?
            .unwrap_or_default();

        let signed = self.signer.sign(&method, &request.path(), &query, &body)?;

        let mut headers = HeaderMap::new();
        for (name, value) in signed.headers {
            headers.insert(name, value);
        }
        builder = builder.headers(headers);

        builder.build().map_err(SocketError::from)
    }
}
