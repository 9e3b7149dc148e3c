//! The APNs response types

use serde::Deserialize;
use std::fmt;

/// The response data from APNs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// If the notification was not successful, has the body content from APNs.
    pub error: Option<ErrorBody>,

    /// The `apns-id` value from the request. If no value was included in the
    /// request, the server creates a new UUID and returns it in this header.
    pub apns_id: Option<String>,

    /// The HTTP response code.
    ///
    /// * 200 Success
    /// * 400 Bad request
    /// * 403 There was an error with the certificate.
    /// * 405 The request used a bad :method value. Only POST requests are supported.
    /// * 410 The device token is no longer active for the topic.
    /// * 413 The notification payload was too large.
    /// * 429 The server received too many requests for the same device token.
    /// * 500 Internal server error
    /// * 503 The server is shutting down and unavailable.
    pub code: u16,
}

/// The response body from APNs. Only available for errors.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    /// The error indicating the reason for the failure.
    pub reason: ErrorReason,

    /// If the value of the `code` is 410, this is the last time at which APNs
    /// confirmed that the device token was no longer valid for the topic.
    pub timestamp: Option<u64>,
}

/// A description what went wrong with the push notification.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum ErrorReason {
    /// The collapse identifier exceeds the maximum allowed size.
    BadCollapseId,

    /// The specified device token was bad. Verify that the request contains a
    /// valid token and that the token matches the environment.
    BadDeviceToken,

    /// The `apns-expiration` value is bad.
    BadExpirationDate,

    /// The `apns-id` value is bad.
    BadMessageId,

    /// The `apns-priority` value is bad.
    BadPriority,

    /// The `apns-topic` was invalid.
    BadTopic,

    /// The device token does not match the specified topic.
    DeviceTokenNotForTopic,

    /// One or more headers were repeated.
    DuplicateHeaders,

    /// Idle time out.
    IdleTimeout,

    /// The device token is not specified in the request path.
    MissingDeviceToken,

    /// The `apns-topic` header of the request was not specified and was
    /// required. The `apns-topic` header is mandatory when the client is
    /// connected using a certificate that supports multiple topics.
    MissingTopic,

    /// The message payload was empty.
    PayloadEmpty,

    /// Pushing to this topic is not allowed.
    TopicDisallowed,

    /// The certificate was bad.
    BadCertificate,

    /// The client certificate was for the wrong environment.
    BadCertificateEnvironment,

    /// The provider token is stale and a new token should be generated.
    ExpiredProviderToken,

    /// The specified action is not allowed.
    Forbidden,

    /// The provider token is not valid or the token signature could not be
    /// verified.
    InvalidProviderToken,

    /// No provider certificate was used to connect to APNs and Authorization
    /// header was missing or no provider token was specified.
    MissingProviderToken,

    /// The request contained a bad `path` value.
    BadPath,

    /// The specified `method` was not `POST`.
    MethodNotAllowed,

    /// The device token is inactive for the specified topic.
    Unregistered,

    /// The message payload was too large. The maximum payload size is 4096
    /// bytes.
    PayloadTooLarge,

    /// The provider token is being updated too often.
    TooManyProviderTokenUpdates,

    /// Too many requests were made consecutively to the same device token.
    TooManyRequests,

    /// An internal server error occurred.
    InternalServerError,

    /// The service is unavailable.
    ServiceUnavailable,

    /// The server is shutting down.
    Shutdown,
}

impl fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorReason::BadCollapseId => "The collapse identifier exceeds the maximum allowed size",
            ErrorReason::BadDeviceToken => "The specified device token was bad",
            ErrorReason::BadExpirationDate => "The apns-expiration value is bad",
            ErrorReason::BadMessageId => "The apns-id value is bad",
            ErrorReason::BadPriority => "The apns-priority value is bad",
            ErrorReason::BadTopic => "The apns-topic was invalid",
            ErrorReason::DeviceTokenNotForTopic => "The device token does not match the specified topic",
            ErrorReason::DuplicateHeaders => "One or more headers were repeated",
            ErrorReason::IdleTimeout => "Idle time out",
            ErrorReason::MissingDeviceToken => "The device token is not specified in the request path",
            ErrorReason::MissingTopic => "The apns-topic header of the request was not specified and was required",
            ErrorReason::PayloadEmpty => "The message payload was empty",
            ErrorReason::TopicDisallowed => "Pushing to this topic is not allowed",
            ErrorReason::BadCertificate => "The certificate was bad",
            ErrorReason::BadCertificateEnvironment => "The client certificate was for the wrong environment",
            ErrorReason::ExpiredProviderToken => "The provider token is stale and a new token should be generated",
            ErrorReason::Forbidden => "The specified action is not allowed",
            ErrorReason::InvalidProviderToken => "The provider token is not valid",
            ErrorReason::MissingProviderToken => "No provider certificate or provider token was specified",
            ErrorReason::BadPath => "The request contained a bad path value",
            ErrorReason::MethodNotAllowed => "The specified method was not POST",
            ErrorReason::Unregistered => "The device token is inactive for the specified topic",
            ErrorReason::PayloadTooLarge => "The message payload was too large",
            ErrorReason::TooManyProviderTokenUpdates => "The provider token is being updated too often",
            ErrorReason::TooManyRequests => "Too many requests were made consecutively to the same device token",
            ErrorReason::InternalServerError => "An internal server error occurred",
            ErrorReason::ServiceUnavailable => "The service is unavailable",
            ErrorReason::Shutdown => "The server is shutting down",
        };

        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_with_timestamp() {
        let body: ErrorBody = serde_json::from_str(r#"{"reason":"Unregistered","timestamp":1454402113}"#).unwrap();

        assert_eq!(ErrorReason::Unregistered, body.reason);
        assert_eq!(Some(1454402113), body.timestamp);
    }

    #[test]
    fn test_error_body_without_timestamp() {
        let body: ErrorBody = serde_json::from_str(r#"{"reason":"BadDeviceToken"}"#).unwrap();

        assert_eq!(ErrorReason::BadDeviceToken, body.reason);
        assert_eq!(None, body.timestamp);
    }

    #[test]
    fn test_unknown_reason_is_rejected() {
        let body = serde_json::from_str::<ErrorBody>(r#"{"reason":"NotARealReason"}"#);

        assert!(body.is_err());
    }
}
