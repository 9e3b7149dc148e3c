//! The transport to APNs: one authenticated HTTP/2 session

use crate::certificate::Certificate;
use crate::error::Error;
use crate::response::Response;
use async_trait::async_trait;
use http::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::StatusCode;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as HttpClient;
use hyper_util::rt::TokioExecutor;
use std::convert::Infallible;
use std::time::Duration;
use tokio::time::timeout;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;
const DEFAULT_POOL_IDLE_TIMEOUT_SECS: u64 = 600;

type HyperConnector = HttpsConnector<HttpConnector>;

/// A session with APNs, closed until opened.
///
/// The [`Client`](crate::Client) opens and closes it around
/// [`connect`](crate::Client::connect) and posts every notification through
/// it. Errors from any of the operations are handed to the caller unchanged.
#[async_trait]
pub trait Connection: Send {
    async fn open(&mut self) -> Result<(), Error>;

    async fn close(&mut self) -> Result<(), Error>;

    /// Drops the session at once, without waiting on anything. Used when a
    /// scoped [`connect`](crate::Client::connect) is abandoned before it could
    /// close the connection.
    fn reset(&mut self);

    fn is_open(&self) -> bool;

    /// Sends a `POST` to `path`, relative to the URI of the connection.
    async fn post(&mut self, path: &str, headers: HeaderMap, body: Vec<u8>) -> Result<Response, Error>;
}

/// The TLS client identity of a connection.
#[derive(Debug, Clone)]
pub enum Identity {
    /// A parsed certificate with its key.
    Certificate(Certificate),
    /// PEM data holding both the certificate and the private key.
    Pem(Vec<u8>),
}

impl From<Certificate> for Identity {
    fn from(certificate: Certificate) -> Self {
        Identity::Certificate(certificate)
    }
}

impl From<&Certificate> for Identity {
    fn from(certificate: &Certificate) -> Self {
        Identity::Certificate(certificate.clone())
    }
}

impl From<Vec<u8>> for Identity {
    fn from(pem: Vec<u8>) -> Self {
        Identity::Pem(pem)
    }
}

impl From<&[u8]> for Identity {
    fn from(pem: &[u8]) -> Self {
        Identity::Pem(pem.to_vec())
    }
}

/// Timeouts of an [`HttpConnection`].
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    /// The timeout of the HTTP requests
    pub request_timeout_secs: Option<u64>,
    /// The timeout for idle sockets being kept alive
    pub pool_idle_timeout_secs: Option<u64>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            request_timeout_secs: Some(DEFAULT_REQUEST_TIMEOUT_SECS),
            pool_idle_timeout_secs: Some(DEFAULT_POOL_IDLE_TIMEOUT_SECS),
        }
    }
}

impl ConnectionOptions {
    pub fn with_request_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = Some(seconds);
        self
    }

    pub fn with_pool_idle_timeout(mut self, seconds: u64) -> Self {
        self.pool_idle_timeout_secs = Some(seconds);
        self
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS))
    }
}

/// An HTTP/2 connection to APNs authenticated with a client certificate.
///
/// The TLS configuration is built when the connection is created, so a bad
/// certificate or key is reported before anything is sent.
#[derive(Debug)]
pub struct HttpConnection {
    uri: String,
    certificate: Certificate,
    tls: rustls::ClientConfig,
    options: ConnectionOptions,
    http_client: Option<HttpClient<HyperConnector, BoxBody<Bytes, Infallible>>>,
}

impl HttpConnection {
    pub fn new<S, I>(uri: S, identity: I, options: ConnectionOptions) -> Result<HttpConnection, Error>
    where
        S: Into<String>,
        I: Into<Identity>,
    {
        let certificate = match identity.into() {
            Identity::Certificate(certificate) => certificate,
            Identity::Pem(pem) => Certificate::from_pem(&pem)?,
        };

        let tls = certificate.client_config()?;

        Ok(HttpConnection {
            uri: uri.into(),
            certificate,
            tls,
            options,
            http_client: None,
        })
    }

    /// The base URI requests are sent to.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The certificate presented to APNs.
    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    fn build_request(
        &self,
        path: &str,
        headers: HeaderMap,
        body: Vec<u8>,
    ) -> Result<hyper::Request<BoxBody<Bytes, Infallible>>, Error> {
        let mut builder = hyper::Request::builder()
            .uri(format!("{}{}", self.uri, path))
            .method("POST")
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_LENGTH, format!("{}", body.len()).as_bytes());

        if let Some(request_headers) = builder.headers_mut() {
            request_headers.extend(headers);
        }

        let request_body = Full::from(body).boxed();
        builder.body(request_body).map_err(Error::BuildRequestError)
    }
}

#[async_trait]
impl Connection for HttpConnection {
    async fn open(&mut self) -> Result<(), Error> {
        if self.http_client.is_some() {
            return Ok(());
        }

        #[cfg(feature = "tracing")]
        ::tracing::debug!(uri = %self.uri, "opening APNs connection");

        let connector = HttpsConnectorBuilder::new()
            .with_tls_config(self.tls.clone())
            .https_only()
            .enable_http2()
            .build();

        let http_client = HttpClient::builder(TokioExecutor::new())
            .pool_idle_timeout(self.options.pool_idle_timeout_secs.map(Duration::from_secs))
            .http2_only(true)
            .build(connector);

        self.http_client = Some(http_client);

        Ok(())
    }

    async fn close(&mut self) -> Result<(), Error> {
        if self.http_client.take().is_some() {
            #[cfg(feature = "tracing")]
            ::tracing::debug!(uri = %self.uri, "closed APNs connection");
        }

        Ok(())
    }

    fn reset(&mut self) {
        if self.http_client.take().is_some() {
            #[cfg(feature = "tracing")]
            ::tracing::debug!(uri = %self.uri, "dropped APNs connection");
        }
    }

    fn is_open(&self) -> bool {
        self.http_client.is_some()
    }

    async fn post(&mut self, path: &str, headers: HeaderMap, body: Vec<u8>) -> Result<Response, Error> {
        let Some(http_client) = self.http_client.as_ref() else {
            return Err(Error::ConnectionClosed);
        };

        let request = self.build_request(path, headers, body)?;
        let request_timeout = self.options.request_timeout();

        #[cfg(feature = "tracing")]
        ::tracing::trace!(path, "posting notification");

        let Ok(response_result) = timeout(request_timeout, http_client.request(request)).await else {
            return Err(Error::RequestTimeout(request_timeout.as_secs()));
        };

        let response = response_result?;

        let apns_id = response
            .headers()
            .get("apns-id")
            .and_then(|s| s.to_str().ok())
            .map(String::from);

        match response.status() {
            StatusCode::OK => Ok(Response {
                apns_id,
                error: None,
                code: response.status().as_u16(),
            }),
            status => {
                let body = response.into_body().collect().await?;

                Err(Error::ResponseError(Response {
                    apns_id,
                    error: serde_json::from_slice(&body.to_bytes()).ok(),
                    code: status.as_u16(),
                }))
            }
        }
    }
}
