//! Turns a [`Notification`] into the path, headers and body of an APNs request

use crate::error::Error;
use crate::notification::Notification;
use http::header::{HeaderMap, HeaderValue};
use serde::Serialize;

/// The parts of a single request to APNs, relative to the service URI.
#[derive(Debug, Clone)]
pub struct Request {
    /// `/3/device/<token>`
    pub path: String,
    /// The `apns-*` headers of the notification.
    pub headers: HeaderMap,
    /// The JSON encoded payload.
    pub body: Vec<u8>,
}

#[derive(Serialize)]
struct Body<'a, P> {
    aps: &'a P,
}

/// Builds the request for `notification`.
///
/// `apns-id` and `apns-priority` are only present if set in the
/// notification, `apns-expiration` is always present and is `0` if no
/// expiration is set. `apns-topic` uses the topic of the notification,
/// `default_topic` if that is missing, and is left out if both are missing.
pub fn build_request<P>(notification: &Notification<P>, default_topic: Option<&str>) -> Result<Request, Error>
where
    P: Serialize,
{
    let path = format!("/3/device/{}", notification.token());

    let mut headers = HeaderMap::new();

    if let Some(apns_id) = notification.formatted_id() {
        headers.insert("apns-id", header_value(apns_id)?);
    }

    headers.insert("apns-expiration", HeaderValue::from(notification.formatted_expiration()));

    if let Some(apns_priority) = notification.priority {
        headers.insert("apns-priority", header_value(apns_priority.to_string())?);
    }

    if let Some(apns_topic) = notification.topic.as_deref().or(default_topic) {
        headers.insert("apns-topic", header_value(apns_topic)?);
    }

    let body = serde_json::to_vec(&Body {
        aps: &notification.payload,
    })?;

    Ok(Request { path, headers, body })
}

fn header_value<S>(value: S) -> Result<HeaderValue, Error>
where
    S: AsRef<str>,
{
    HeaderValue::from_str(value.as_ref()).map_err(|e| Error::BuildRequestError(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::Priority;
    use serde_json::json;
    use std::time::{Duration, UNIX_EPOCH};

    fn notification() -> Notification {
        Notification::new("some-device-token", json!({ "alert": "Push it real good." }))
            .unwrap()
            .with_id(42)
            .with_expiration(UNIX_EPOCH + Duration::from_secs(1_454_402_113))
            .with_priority(Priority::High)
            .with_topic("com.example.MockAPNS.voip")
    }

    fn bare_notification() -> Notification {
        Notification::new("some-device-token", json!({ "alert": "Push it real good." })).unwrap()
    }

    #[test]
    fn test_request_path() {
        let request = build_request(&notification(), None).unwrap();

        assert_eq!("/3/device/some-device-token", request.path);
    }

    #[test]
    fn test_request_path_uses_token_verbatim() {
        let notification = Notification::new("a_test_id", json!({})).unwrap();
        let request = build_request(&notification, None).unwrap();

        assert_eq!("/3/device/a_test_id", request.path);
    }

    #[test]
    fn test_request_body() {
        let request = build_request(&notification(), None).unwrap();
        let body = String::from_utf8(request.body).unwrap();

        assert_eq!(r#"{"aps":{"alert":"Push it real good."}}"#, body);
    }

    #[test]
    fn test_request_body_with_a_struct_payload() {
        #[derive(Serialize)]
        struct Alert {
            alert: &'static str,
            badge: u32,
        }

        let notification = Notification::new(
            "a_test_id",
            Alert {
                alert: "kulli",
                badge: 420,
            },
        )
        .unwrap();

        let request = build_request(&notification, None).unwrap();
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();

        assert_eq!(json!({ "aps": { "alert": "kulli", "badge": 420 } }), body);
    }

    #[test]
    fn test_request_with_an_apns_id() {
        let request = build_request(&notification(), None).unwrap();

        assert_eq!("0000000000000000000000000000002a", request.headers["apns-id"]);
    }

    #[test]
    fn test_request_with_default_apns_id() {
        let request = build_request(&bare_notification(), None).unwrap();

        assert!(!request.headers.contains_key("apns-id"));
    }

    #[test]
    fn test_request_with_an_apns_expiration() {
        let request = build_request(&notification(), None).unwrap();

        assert_eq!("1454402113", request.headers["apns-expiration"]);
    }

    #[test]
    fn test_request_with_default_apns_expiration() {
        let request = build_request(&bare_notification(), None).unwrap();

        assert_eq!("0", request.headers["apns-expiration"]);
    }

    #[test]
    fn test_request_with_high_priority() {
        let request = build_request(&notification(), None).unwrap();

        assert_eq!("10", request.headers["apns-priority"]);
    }

    #[test]
    fn test_request_with_normal_priority() {
        let notification = bare_notification().with_priority(Priority::Normal);
        let request = build_request(&notification, None).unwrap();

        assert_eq!("5", request.headers["apns-priority"]);
    }

    #[test]
    fn test_request_with_default_priority() {
        let request = build_request(&bare_notification(), None).unwrap();

        assert!(!request.headers.contains_key("apns-priority"));
    }

    #[test]
    fn test_request_with_an_apns_topic() {
        let request = build_request(&notification(), Some("com.example.MockAPNS")).unwrap();

        assert_eq!("com.example.MockAPNS.voip", request.headers["apns-topic"]);
    }

    #[test]
    fn test_request_with_the_default_topic() {
        let request = build_request(&bare_notification(), Some("com.example.MockAPNS")).unwrap();

        assert_eq!("com.example.MockAPNS", request.headers["apns-topic"]);
    }

    #[test]
    fn test_request_without_any_topic() {
        let request = build_request(&bare_notification(), None).unwrap();

        assert!(!request.headers.contains_key("apns-topic"));
    }

    #[test]
    fn test_request_with_all_options_cleared() {
        let mut notification = notification();
        notification.id = None;
        notification.expiration = None;
        notification.priority = None;
        notification.topic = None;

        let request = build_request(&notification, Some("com.example.MockAPNS")).unwrap();

        assert_eq!(2, request.headers.len());
        assert_eq!("0", request.headers["apns-expiration"]);
        assert_eq!("com.example.MockAPNS", request.headers["apns-topic"]);
    }

    #[test]
    fn test_request_invalid_topic() {
        let notification = bare_notification().with_topic("\r\n");
        let request = build_request(&notification, None);

        assert!(matches!(request, Err(Error::BuildRequestError(_))));
    }
}
