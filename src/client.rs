use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::{Stream, StreamExt};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, redirect};
use serde::Deserialize;
use url::Url;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_MISSING_LOCATION, CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS,
};
use crate::sse::{SseMessage, process_sse};
use crate::types::{StreamEvent, StreamRequest};

/// Endpoint that starts a streamed response for a hosted integration.
pub const DEFAULT_ENDPOINT: &str = "https://api.gooey.ai/v3/integrations/stream/";

/// A subscription to a response stream.  Dropping it closes the connection.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<SseMessage>> + Send>>;

/// The two network steps of an exchange.
///
/// [`Gooey`] talks to the real service; tests substitute scripted transports.
#[async_trait::async_trait]
pub trait StreamTransport: Send + Sync {
    /// Start a streamed response.
    ///
    /// Returns the location of the event stream, or `None` if the service
    /// answered without one.
    async fn start_stream(&self, request: &StreamRequest) -> Result<Option<String>>;

    /// Open the event stream at `location`.
    async fn subscribe(&self, location: &str) -> Result<EventStream>;
}

#[async_trait::async_trait]
impl<T: StreamTransport + ?Sized> StreamTransport for Arc<T> {
    async fn start_stream(&self, request: &StreamRequest) -> Result<Option<String>> {
        (**self).start_stream(request).await
    }

    async fn subscribe(&self, location: &str) -> Result<EventStream> {
        (**self).subscribe(location).await
    }
}

/// Client for the Gooey.AI streaming integrations API.
#[derive(Clone)]
pub struct Gooey {
    client: ReqwestClient,
    endpoint: Url,
    timeout: Option<Duration>,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl std::fmt::Debug for Gooey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gooey")
            .field("endpoint", &self.endpoint.as_str())
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

impl Gooey {
    /// Create a client for the default endpoint with no timeout.
    pub fn new() -> Result<Self> {
        Self::with_options(None, None)
    }

    /// Create a new client with custom settings.
    ///
    /// The timeout, if any, bounds the whole request including the body, so
    /// it also cuts long streams short.
    pub fn with_options(endpoint: Option<&str>, timeout: Option<Duration>) -> Result<Self> {
        let endpoint = Url::parse(endpoint.unwrap_or(DEFAULT_ENDPOINT))?;
        let mut builder = ReqwestClient::builder().redirect(redirect::Policy::none());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {}", e),
                Some(Box::new(e)),
            )
        })?;

        Ok(Self {
            client,
            endpoint,
            timeout,
            logger: None,
        })
    }

    /// Attach a logger that sees every request and stream event.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The endpoint requests are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
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

    fn map_send_error(&self, e: reqwest::Error) -> Error {
        CLIENT_REQUEST_ERRORS.click();
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                self.timeout.map(|t| t.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }

    /// Resolve the `Location` header of `response` against the endpoint.
    fn stream_location(&self, response: &Response) -> Result<Option<Url>> {
        let Some(location) = response.headers().get(header::LOCATION) else {
            return Ok(None);
        };
        let location = location.to_str().map_err(|e| {
            Error::encoding(
                format!("Location header is not valid text: {e}"),
                Some(Box::new(e)),
            )
        })?;
        if location.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(self.endpoint.join(location.trim())?))
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        CLIENT_REQUEST_ERRORS.click();
        let status_code = response.status().as_u16();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        #[derive(Deserialize)]
        struct ErrorResponse {
            detail: serde_json::Value,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let error_message = match serde_json::from_str::<ErrorResponse>(&error_body) {
            Ok(ErrorResponse {
                detail: serde_json::Value::String(detail),
            }) => detail,
            Ok(ErrorResponse { detail }) => detail.to_string(),
            Err(_) => error_body,
        };

        match status_code {
            400 | 422 => Error::bad_request(error_message),
            401 => Error::authentication(error_message),
            403 => Error::permission(error_message),
            404 => Error::not_found(error_message),
            429 => Error::rate_limit(error_message, retry_after),
            500 => Error::internal_server(error_message),
            502..=504 => Error::service_unavailable(error_message, retry_after),
            _ => Error::api(status_code, error_message),
        }
    }
}

#[async_trait::async_trait]
impl StreamTransport for Gooey {
    async fn start_stream(&self, request: &StreamRequest) -> Result<Option<String>> {
        if let Some(logger) = &self.logger {
            logger.log_request(request);
        }
        CLIENT_REQUESTS.click();
        let start = Instant::now();

        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(self.default_headers())
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        match self.stream_location(&response)? {
            Some(location) => {
                if let Some(logger) = &self.logger {
                    logger.log_stream_location(location.as_str());
                }
                Ok(Some(location.into()))
            }
            None if !response.status().is_success() && !response.status().is_redirection() => {
                Err(Self::process_error_response(response).await)
            }
            None => {
                CLIENT_MISSING_LOCATION.click();
                Ok(None)
            }
        }
    }

    async fn subscribe(&self, location: &str) -> Result<EventStream> {
        let url = self.endpoint.join(location)?;
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, HeaderValue::from_static("text/event-stream"))
            .header(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        let logger = self.logger.clone().filter(|l| l.logs_stream_events());
        let events = process_sse(response.bytes_stream());
        if let Some(logger) = logger {
            Ok(Box::pin(events.inspect(move |message| {
                if let Ok(message) = message {
                    logger.log_stream_event(&StreamEvent::parse(&message.data));
                }
            })))
        } else {
            Ok(Box::pin(events))
        }
    }
}
