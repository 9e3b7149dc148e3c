//! The notification to be delivered to a single device.

use crate::error::Error;
use serde::Serialize;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// The Remote Notification.
///
/// Holds the payload, the receiving device token and the optional settings
/// that end up as request headers. Nothing is formatted up front; the request
/// is built from the current field values when the notification is sent.
///
/// # Example
///
/// ```rust
/// # use lowdown::{Notification, Priority};
/// # use serde_json::json;
/// # fn main() {
/// let notification = Notification::new("some-device-token", json!({ "alert": "Hi there" }))
///     .unwrap()
///     .with_id(42)
///     .with_priority(Priority::High)
///     .with_topic("com.example.MockAPNS");
///
/// assert_eq!("0000000000000000000000000000002a", notification.formatted_id().unwrap());
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Notification<P = serde_json::Value> {
    token: String,

    /// The content of the `aps` dictionary, sent as is.
    pub payload: P,

    /// Identifies the notification. APNs uses this value to identify the
    /// notification to your server if there is an error sending it.
    pub id: Option<u64>,

    /// The date when the notification is no longer valid and can be discarded.
    /// If not set, APNs treats the notification as if it expires immediately
    /// and does not store the notification or attempt to redeliver it.
    pub expiration: Option<SystemTime>,

    /// The priority of the notification. If `None`, the APNs server sets the
    /// priority to High.
    pub priority: Option<Priority>,

    /// The topic of the remote notification, which is typically the bundle ID
    /// for your app. Falls back to the default topic of the client.
    pub topic: Option<String>,
}

impl<P> Notification<P>
where
    P: Serialize,
{
    /// Creates a notification for the given device token. The token must not
    /// be empty.
    pub fn new<S>(token: S, payload: P) -> Result<Self, Error>
    where
        S: Into<String>,
    {
        let token = token.into();

        if token.is_empty() {
            return Err(Error::InvalidOptions(String::from("The device token must not be empty.")));
        }

        Ok(Notification {
            token,
            payload,
            id: None,
            expiration: None,
            priority: None,
            topic: None,
        })
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_expiration(mut self, expiration: SystemTime) -> Self {
        self.expiration = Some(expiration);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_topic<S>(mut self, topic: S) -> Self
    where
        S: Into<String>,
    {
        self.topic = Some(topic.into());
        self
    }

    /// The device token of the receiving device.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The identifier as 32 lowercase, zero-padded hexadecimal digits.
    pub fn formatted_id(&self) -> Option<String> {
        self.id.map(|id| format!("{:032x}", id))
    }

    /// The expiration as UNIX epoch seconds, `0` if not set.
    pub fn formatted_expiration(&self) -> u64 {
        self.expiration
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map(|duration| duration.as_secs())
            .unwrap_or(0)
    }
}

/// The importance how fast to bring the notification for the user.
///
/// Only the values APNs accepts (10, 5 and 1) can be expressed. An arbitrary
/// integer priority is not representable; APNs would reject it with
/// `BadPriority` anyway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Send the push message immediately. Notifications with this priority must
    /// trigger an alert, sound, or badge on the target device.
    High,

    /// Send the push message at a time that takes into account power
    /// considerations for the device. Notifications with this priority might be
    /// grouped and delivered in bursts.
    Normal,

    /// Prioritize the device's power considerations over all other factors and
    /// prevent awakening the device.
    Low,
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> u8 {
        match priority {
            Priority::High => 10,
            Priority::Normal => 5,
            Priority::Low => 1,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_empty_token() {
        let notification = Notification::new("", json!({}));

        assert!(matches!(notification, Err(Error::InvalidOptions(_))));
    }

    #[test]
    fn test_formatted_id() {
        let notification = Notification::new("a_test_id", json!({})).unwrap().with_id(42);

        assert_eq!(Some("0000000000000000000000000000002a".to_string()), notification.formatted_id());
    }

    #[test]
    fn test_formatted_id_max() {
        let notification = Notification::new("a_test_id", json!({})).unwrap().with_id(u64::MAX);

        assert_eq!(Some("0000000000000000ffffffffffffffff".to_string()), notification.formatted_id());
    }

    #[test]
    fn test_without_id() {
        let notification = Notification::new("a_test_id", json!({})).unwrap();

        assert_eq!(None, notification.formatted_id());
    }

    #[test]
    fn test_formatted_expiration() {
        let expiration = UNIX_EPOCH + Duration::from_secs(1_454_402_113);
        let notification = Notification::new("a_test_id", json!({}))
            .unwrap()
            .with_expiration(expiration);

        assert_eq!(1_454_402_113, notification.formatted_expiration());
    }

    #[test]
    fn test_formatted_expiration_default() {
        let notification = Notification::new("a_test_id", json!({})).unwrap();

        assert_eq!(0, notification.formatted_expiration());
    }

    #[test]
    fn test_priority_display() {
        assert_eq!("10", Priority::High.to_string());
        assert_eq!("5", Priority::Normal.to_string());
        assert_eq!("1", Priority::Low.to_string());
    }

    #[test]
    fn test_priority_values() {
        let values: Vec<u8> = [Priority::High, Priority::Normal, Priority::Low]
            .into_iter()
            .map(u8::from)
            .collect();

        assert_eq!(vec![10, 5, 1], values);
    }
}
