//! HTTP client for the legal-assistant backend.
//!
//! The backend exposes three endpoints: session creation, session clear,
//! and a streamed query whose response body is one continuous UTF-8
//! document split across arbitrary byte frames.

use std::env;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use url::Url;

use crate::client_logger::ClientLogger;
use crate::decode;
use crate::error::{Error, Result};
use crate::observability;
use crate::types::{QueryRequest, SessionId, SessionResponse};

const DEFAULT_BASE_URL: &str = "http://localhost:8000/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A lazy, finite stream of decoded answer chunks.
pub type AnswerStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Abstraction over the backend operations the controller depends on.
///
/// [`Kodeks`] is the production implementation; tests substitute scripted
/// backends to exercise the controller without a network.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Creates a new server-side conversation session.
    async fn create_session(&self) -> Result<SessionId>;

    /// Resets the server-held history for a session.
    async fn clear_session(&self, session: &SessionId) -> Result<()>;

    /// Submits a query and returns the streamed answer.
    async fn query_stream(
        &self,
        query: &str,
        session: Option<&SessionId>,
    ) -> Result<AnswerStream>;
}

/// Client for the legal-assistant backend.
#[derive(Clone)]
pub struct Kodeks {
    client: ReqwestClient,
    base_url: String,
    timeout: Duration,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl std::fmt::Debug for Kodeks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kodeks")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Kodeks {
    /// Create a new client.
    ///
    /// The base URL can be provided directly or read from the
    /// KODEKS_BASE_URL environment variable; it defaults to the local
    /// development backend.
    pub fn new(base_url: Option<String>) -> Result<Self> {
        Self::with_options(base_url, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = base_url
            .or_else(|| env::var("KODEKS_BASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = if base_url.ends_with('/') {
            base_url
        } else {
            format!("{base_url}/")
        };
        Url::parse(&base_url)?;

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
            logger: None,
        })
    }

    /// Attaches a logger that captures client operations.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Returns the base URL this client targets.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    /// Map a reqwest transport failure to our Error type.
    fn map_request_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {e}"),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {e}"), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
        }
    }

    /// Process a non-success response and convert it to our Error type.
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {e}"),
                    Some(Box::new(e)),
                );
            }
        };
        let message = if body.is_empty() {
            format!("HTTP status {status_code}")
        } else {
            body
        };

        match status_code {
            400 => Error::bad_request(message),
            404 => Error::not_found(message),
            408 => Error::timeout(message, None),
            500 => Error::internal_server(message),
            502..=504 => Error::service_unavailable(message),
            _ => Error::api(status_code, message),
        }
    }
}

#[async_trait::async_trait]
impl Backend for Kodeks {
    /// Create a new conversation session on the server.
    async fn create_session(&self) -> Result<SessionId> {
        let url = format!("{}session/new", self.base_url);

        let response = self
            .client
            .post(&url)
            .headers(self.default_headers())
            .send()
            .await
            .map_err(|e| {
                observability::SESSION_CREATE_ERRORS.click();
                self.map_request_error(e)
            })?;

        if !response.status().is_success() {
            observability::SESSION_CREATE_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }

        let parsed = response.json::<SessionResponse>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse session response: {e}"),
                Some(Box::new(e)),
            )
        })?;

        observability::SESSION_CREATES.click();
        if let Some(logger) = &self.logger {
            logger.log_session_created(&parsed.session_id);
        }
        Ok(parsed.session_id)
    }

    /// Ask the server to reset the history held for a session.
    async fn clear_session(&self, session: &SessionId) -> Result<()> {
        let url = format!("{}session/{}/clear", self.base_url, session);

        let response = self
            .client
            .post(&url)
            .headers(self.default_headers())
            .send()
            .await
            .map_err(|e| {
                observability::SESSION_CLEAR_ERRORS.click();
                self.map_request_error(e)
            })?;

        if !response.status().is_success() {
            observability::SESSION_CLEAR_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }

        observability::SESSION_CLEARS.click();
        if let Some(logger) = &self.logger {
            logger.log_session_cleared(session);
        }
        Ok(())
    }

    /// Submit a query and return the streamed answer as decoded chunks.
    ///
    /// The response body carries no framing: the whole stream is one
    /// continuous text document split arbitrarily across byte frames, so
    /// it is routed through the stateful decoder.
    async fn query_stream(
        &self,
        query: &str,
        session: Option<&SessionId>,
    ) -> Result<AnswerStream> {
        let url = format!("{}query/stream", self.base_url);
        let body = QueryRequest {
            query: query.to_string(),
            session_id: session.cloned(),
        };

        observability::QUERY_REQUESTS.click();
        if let Some(logger) = &self.logger {
            logger.log_query(query);
        }
        let start = std::time::Instant::now();

        let response = self
            .client
            .post(&url)
            .headers(self.default_headers())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                observability::QUERY_REQUEST_ERRORS.click();
                self.map_request_error(e)
            })?;

        observability::QUERY_DURATION.add(start.elapsed().as_secs_f64());

        if !response.status().is_success() {
            observability::QUERY_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }

        let chunks = decode::text_chunks(response.bytes_stream());
        let logger = self.logger.clone();
        let logged = chunks.map(move |chunk| {
            if let (Some(logger), Ok(text)) = (&logger, &chunk) {
                logger.log_chunk(text);
            }
            chunk
        });

        Ok(Box::pin(logged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation_defaults() {
        let client = Kodeks::with_options(Some("http://example.com".to_string()), None).unwrap();
        // The base URL gains a trailing slash so endpoint joins are uniform.
        assert_eq!(client.base_url(), "http://example.com/");
        assert_eq!(client.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn client_creation_custom_timeout() {
        let client = Kodeks::with_options(
            Some("http://localhost:9000/".to_string()),
            Some(Duration::from_secs(5)),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:9000/");
        assert_eq!(client.timeout, Duration::from_secs(5));
    }

    #[test]
    fn invalid_base_url_rejected() {
        let err = Kodeks::new(Some("not a url".to_string())).unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }
}
