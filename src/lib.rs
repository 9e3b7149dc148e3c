//! # Lowdown
//!
//! An asynchronous client for the Apple Push Notification service, connecting
//! over HTTP/2 and authenticating with a client certificate.
//!
//! A [Client](client/struct.Client.html) owns one connection. The
//! notifications sent through it are turned into requests against
//! `/3/device/<token>` with the `apns-*` headers of the
//! [Notification](notification/struct.Notification.html) and the payload
//! under the `aps` key of the JSON body.
//!
//! When created from a Universal Certificate, the client uses the app topic
//! embedded in the certificate for every notification without a topic of its
//! own.
//!
//! ## Example
//!
//! ```no_run
//! use lowdown::{Certificate, Client, Notification, Priority};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), lowdown::Error> {
//! // The certificate and the private key in one PEM file
//! let certificate = Certificate::from_pem(&std::fs::read("/path/to/certificate.pem")?)?;
//!
//! // `true` for the production environment
//! let mut client = Client::production(false, certificate)?;
//!
//! let notification = Notification::new("device-token", json!({ "alert": "Hi there!" }))?
//!     .with_priority(Priority::High);
//!
//! client
//!     .connect(|client| {
//!         Box::pin(async move {
//!             let response = client.send_notification(&notification).await?;
//!             println!("Sent: {:?}", response);
//!             Ok::<_, lowdown::Error>(())
//!         })
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod certificate;
pub mod client;
pub mod connection;
pub mod error;
pub mod notification;
pub mod request;
pub mod response;

pub use crate::certificate::Certificate;
pub use crate::client::{Client, ConnectFuture, Endpoint};
pub use crate::connection::{Connection, ConnectionOptions, HttpConnection, Identity};
pub use crate::error::Error;
pub use crate::notification::{Notification, Priority};
pub use crate::request::{build_request, Request};
pub use crate::response::{ErrorBody, ErrorReason, Response};
