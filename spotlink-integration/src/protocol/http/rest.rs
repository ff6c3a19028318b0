use super::{BuildStrategy, HttpParser};
use crate::error::SocketError;
use reqwest::Method;
use serde::{Serialize, de::DeserializeOwned};
use std::{borrow::Cow, time::Duration};

const DEFAULT_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Http REST request that can be executed by a [`RestClient`].
///
/// Mirrors spec §4.1: a request carries enough information for the base pipeline to compose a
/// URL and body without needing to know venue specifics beyond what is encoded here.
pub trait RestRequest {
    /// Expected response type if this request succeeds.
    type Response: DeserializeOwned;

    /// Serialisable query parameters type - use `()` if not required.
    type QueryParams: Serialize;

    /// Serialisable body type - use `()` if not required.
    type Body: Serialize;

    /// Path to the resource, relative to the adapter's base URL.
    fn path(&self) -> Cow<'static, str>;

    fn method(&self) -> Method;

    fn query_params(&self) -> Option<&Self::QueryParams> {
        None
    }

    fn body(&self) -> Option<&Self::Body> {
        None
    }

    /// `true` when this request must be signed (spec §4.1 step 2).
    fn is_signed(&self) -> bool {
        false
    }

    /// Relative weight consumed from the throttler for this request (spec §4.1 step 1).
    fn weight(&self) -> u32 {
        1
    }

    fn timeout() -> Duration {
        DEFAULT_HTTP_REQUEST_TIMEOUT
    }
}

/// Thin wrapper over [`reqwest::Client`] that executes a [`RestRequest`] against a base URL,
/// applying a [`BuildStrategy`] for signing/headers and an [`HttpParser`] for response handling.
///
/// This is the transport the base request pipeline (spec §4.1 steps 3-4) dispatches through;
/// rate limiting (step 1) and envelope unwrapping (steps 6-7) live one layer up in the venue
/// adapter, since they require venue-specific knowledge this client is deliberately ignorant of.
#[derive(Debug, Clone)]
pub struct RestClient<Strategy, Parser> {
    http_client: reqwest::Client,
    base_url: String,
    build_strategy: Strategy,
    parser: Parser,
}

impl<Strategy, Parser> RestClient<Strategy, Parser>
where
    Strategy: BuildStrategy,
    Parser: HttpParser,
{
    pub fn new(base_url: impl Into<String>, build_strategy: Strategy, parser: Parser) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.into(),
            build_strategy,
            parser,
        }
    }

    /// Execute `request`, returning the raw status and bytes so the caller can run venue-specific
    /// unwrapping/error-mapping on top (spec §4.1 steps 5-7).
    pub async fn execute_raw<Request>(
        &self,
        request: Request,
    ) -> Result<(reqwest::StatusCode, reqwest::header::HeaderMap, Vec<u8>), SocketError>
    where
        Request: RestRequest,
    {
        let url = format!("{}{}", self.base_url, request.path());
        let mut builder = self
            .http_client
            .request(request.method(), url)
            .timeout(Request::timeout());

        if let Some(query) = request.query_params() {
            builder = builder.query(query);
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let built = self.build_strategy.build(&request, builder)?;

        let response = self
            .http_client
            .execute(built)
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    SocketError::HttpTimeout(Request::timeout())
                } else {
                    SocketError::HttpBuild(error)
                }
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?.to_vec();
        Ok((status, headers, bytes))
    }

    /// As [`Self::execute_raw`], but immediately parses the response via the configured
    /// [`HttpParser`] - convenient for venues whose success envelope is the bare `Response`.
    pub async fn execute<Request>(&self, request: Request) -> Result<Request::Response, Parser::OutputError>
    where
        Request: RestRequest,
    {
        let (status, _headers, bytes) = self.execute_raw(request).await?;
        self.parser.parse::<Request::Response>(status, &bytes)
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }
}
