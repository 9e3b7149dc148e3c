//! Error and result module

use crate::response::Response;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// User request or Apple response JSON data was faulty.
    #[error("Error serializing to JSON: {0}")]
    SerializeError(#[from] serde_json::Error),

    /// A problem connecting to APNs servers.
    #[error("Error connecting to APNs: {0}")]
    ConnectionError(#[from] hyper_util::client::legacy::Error),

    /// Couldn't read the body of an APNs response.
    #[error("Error reading the APNs response: {0}")]
    ResponseBodyError(#[from] hyper::Error),

    /// Couldn't turn the notification into a valid HTTP request, e.g. the
    /// topic contains bytes not allowed in a header.
    #[error("Failed to construct HTTP request: {0}")]
    BuildRequestError(#[source] http::Error),

    /// APNs couldn't accept the notification. Contains
    /// [Response](crate::response::Response) with additional information.
    #[error(
        "Notification was not accepted by APNs (reason: {})",
        .0.error
            .as_ref()
            .map(|e| e.reason.to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    )]
    ResponseError(Response),

    /// No response from APNs in the configured time.
    #[error("The request timed out after {0} s")]
    RequestTimeout(u64),

    /// Invalid values given to a
    /// [Notification](crate::notification::Notification).
    #[error("Invalid options for APNs payload: {0}")]
    InvalidOptions(String),

    /// Error reading the certificate or private key.
    #[error("Error in reading a certificate file: {0}")]
    ReadError(#[from] io::Error),

    /// The client certificate or key was rejected when building the TLS
    /// configuration.
    #[error("Unable to construct TLS config: {0}")]
    Tls(#[from] rustls::Error),

    /// The input did not contain a usable certificate and private key.
    #[error("Invalid certificate: {0}")]
    InvalidCertificate(String),

    /// A notification was posted before opening the connection.
    #[error("The connection to APNs is not open")]
    ConnectionClosed,

    /// Unable to decode a PKCS#12 archive.
    #[cfg(feature = "openssl")]
    #[error("Error decoding the certificate archive: {0}")]
    Pkcs12Error(#[from] openssl::error::ErrorStack),
}
