//! The client module for sending notifications over a connection

use crate::connection::{Connection, ConnectionOptions, HttpConnection, Identity};
use crate::error::Error;
use crate::notification::Notification;
use crate::request::build_request;
use crate::response::Response;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// The future returned by the callback of [`Client::connect`].
pub type ConnectFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, Error>> + Send + 'a>>;

/// The APNs service endpoint to connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// The production environment (api.push.apple.com)
    Production,
    /// The development/test environment (api.development.push.apple.com)
    Development,
}

impl Endpoint {
    /// The base URI of the service.
    pub fn uri(&self) -> String {
        format!("https://{}:443", self)
    }
}

impl From<bool> for Endpoint {
    /// `true` selects [`Endpoint::Production`].
    fn from(production: bool) -> Self {
        if production {
            Endpoint::Production
        } else {
            Endpoint::Development
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let host = match self {
            Endpoint::Production => "api.push.apple.com",
            Endpoint::Development => "api.development.push.apple.com",
        };

        write!(f, "{}", host)
    }
}

/// Sends notifications to APNs over a single connection.
///
/// The connection belongs to this client alone. The client does not
/// synchronize access to it: concurrent senders should each have their own
/// client, or share one behind a mutex.
///
/// # Example
///
/// ```no_run
/// # use lowdown::{Certificate, Client, Notification};
/// # use serde_json::json;
/// # async fn run() -> Result<(), lowdown::Error> {
/// let certificate = Certificate::from_pem(&std::fs::read("/path/to/certificate.pem")?)?;
/// let mut client = Client::production(false, certificate)?;
///
/// let notification = Notification::new("device-token", json!({ "alert": "Hi there!" }))?;
///
/// let response = client
///     .connect(|client| Box::pin(async move { client.send_notification(&notification).await }))
///     .await?;
///
/// println!("{:?}", response);
/// # Ok(())
/// # }
/// ```
pub struct Client<C = HttpConnection> {
    connection: C,
    default_topic: Option<String>,
}

impl<C> fmt::Debug for Client<C>
where
    C: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("connection", &self.connection)
            .field("default_topic", &self.default_topic)
            .finish()
    }
}

impl Client<HttpConnection> {
    /// Connects to the production environment if `production` is true, and to
    /// the development environment otherwise.
    pub fn production<I>(production: bool, identity: I) -> Result<Self, Error>
    where
        I: Into<Identity>,
    {
        Self::with_endpoint(Endpoint::from(production), identity)
    }

    pub fn with_endpoint<I>(endpoint: Endpoint, identity: I) -> Result<Self, Error>
    where
        I: Into<Identity>,
    {
        Self::with_uri(endpoint.uri(), identity)
    }

    pub fn with_uri<S, I>(uri: S, identity: I) -> Result<Self, Error>
    where
        S: Into<String>,
        I: Into<Identity>,
    {
        Self::with_options(uri, identity, ConnectionOptions::default())
    }

    /// The default topic is taken from the certificate if `identity` is a
    /// Universal Certificate. Raw PEM data is not inspected and leaves the
    /// client without a default topic.
    pub fn with_options<S, I>(uri: S, identity: I, options: ConnectionOptions) -> Result<Self, Error>
    where
        S: Into<String>,
        I: Into<Identity>,
    {
        let identity = identity.into();

        let default_topic = match &identity {
            Identity::Certificate(certificate) => certificate.default_topic(),
            Identity::Pem(_) => None,
        };

        let connection = HttpConnection::new(uri, identity, options)?;

        Ok(Self::new(connection, default_topic))
    }
}

impl<C> Client<C>
where
    C: Connection,
{
    pub fn new(connection: C, default_topic: Option<String>) -> Self {
        Client {
            connection,
            default_topic,
        }
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.connection
    }

    /// The topic used for notifications that don't set one.
    pub fn default_topic(&self) -> Option<&str> {
        self.default_topic.as_deref()
    }

    /// Opens the connection, runs `f` with the client and closes the
    /// connection again, whether `f` succeeds or not.
    ///
    /// If both `f` and closing fail, the error of `f` is returned. If the
    /// returned future is dropped before it completes, the connection is
    /// [reset](Connection::reset).
    #[cfg_attr(feature = "tracing", ::tracing::instrument(skip_all))]
    pub async fn connect<F, T>(&mut self, f: F) -> Result<T, Error>
    where
        F: for<'a> FnOnce(&'a mut Client<C>) -> ConnectFuture<'a, T>,
    {
        let mut guard = ResetGuard {
            client: self,
            armed: true,
        };

        guard.client.connection.open().await?;

        let result = f(&mut *guard.client).await;
        let closed = guard.client.connection.close().await;

        guard.armed = false;

        match (result, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), _) => Err(e),
        }
    }

    /// Sends a notification over the already opened connection.
    ///
    /// The notification's topic falls back to the default topic of the
    /// client. See [ErrorReason](crate::response::ErrorReason) for the
    /// possible rejections by APNs.
    #[cfg_attr(feature = "tracing", ::tracing::instrument(skip_all, fields(token = notification.token())))]
    pub async fn send_notification<P>(&mut self, notification: &Notification<P>) -> Result<Response, Error>
    where
        P: Serialize,
    {
        let request = build_request(notification, self.default_topic.as_deref())?;

        self.connection
            .post(&request.path, request.headers, request.body)
            .await
    }
}

/// Resets the connection unless disarmed, so a cancelled `connect` doesn't
/// leave it open.
struct ResetGuard<'c, C: Connection> {
    client: &'c mut Client<C>,
    armed: bool,
}

impl<C: Connection> Drop for ResetGuard<'_, C> {
    fn drop(&mut self) {
        if self.armed {
            #[cfg(feature = "tracing")]
            ::tracing::debug!("connect abandoned, resetting the connection");

            self.client.connection.reset();
        }
    }
}
