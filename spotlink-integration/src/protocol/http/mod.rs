use crate::error::SocketError;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::error;

/// Defines an abstract [`rest::RestRequest`] that can be executed by a fully configurable
/// [`rest::RestClient`].
pub mod rest;

/// Defines a configurable [`private::RequestSigner`] that signs Http [`rest::RestRequest`]s
/// using venue-specific logic (spec §4.2). A request whose [`rest::RestRequest::is_signed`]
/// returns `false` passes through unsigned, so every venue uses a single [`private::RequestSigner`]
/// as its [`BuildStrategy`] regardless of whether a given request is public or private.
pub mod private;

/// [`rest::RestRequest`] build strategy for the venue being interacted with.
pub trait BuildStrategy {
    /// Use a [`rest::RestRequest`] and [`reqwest::RequestBuilder`] to construct a
    /// [`reqwest::Request`] ready for dispatch. Any signing happens here.
    fn build<Request>(
        &self,
        request: &Request,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Request, SocketError>
    where
        Request: rest::RestRequest;
}

/// Parses a `reqwest::Response`'s status and body into either `Response` or a venue-specific
/// error, implementing spec §4.1 steps 6-7 (classify Http status / unwrap envelope).
pub trait HttpParser {
    type ApiError: DeserializeOwned;
    type OutputError: From<SocketError>;

    /// Attempt to deserialise a successful (2xx) payload, falling back to the venue's error
    /// envelope shape if that fails.
    fn parse<Response>(
        &self,
        status: StatusCode,
        payload: &[u8],
    ) -> Result<Response, Self::OutputError>
    where
        Response: DeserializeOwned,
    {
        let parse_ok_error = match serde_json::from_slice::<Response>(payload) {
            Ok(response) => return Ok(response),
            Err(serde_error) => serde_error,
        };

        let parse_api_error_error = match serde_json::from_slice::<Self::ApiError>(payload) {
            Ok(api_error) => return Err(self.parse_api_error(status, api_error)),
            Err(serde_error) => serde_error,
        };

        error!(
            status_code = ?status,
            ?parse_ok_error,
            ?parse_api_error_error,
            response_body = %String::from_utf8_lossy(payload),
            "error deserializing Http response"
        );

        Err(Self::OutputError::from(SocketError::DeserialiseBinary {
            error: parse_ok_error,
            payload: payload.to_vec(),
        }))
    }

    /// Map a deserialised venue error envelope, plus the Http status it arrived with, onto the
    /// venue's output error type (spec §4.1 step 6 / §7).
    fn parse_api_error(&self, status: StatusCode, error: Self::ApiError) -> Self::OutputError;
}
