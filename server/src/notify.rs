//! Out-of-band delivery of messages by email and SMS.
//!
//! Delivery is fire-and-forget: callers never wait for the messaging service
//! and never see its failures. Outcomes are logged only.

use std::time::Duration;

use reqwest::Client;
use tokio::runtime::Handle;

/// Path of the email endpoint on the messaging service.
const EMAIL_PATH: &str = "envio-correo";
/// Path of the SMS endpoint on the messaging service.
const SMS_PATH: &str = "sms";
/// Upper bound on a single delivery request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends messages to people.
///
/// Implementations must return immediately and must never log message
/// bodies, which may carry credentials.
pub trait Notifier: Send + Sync {
    fn send_email(&self, destination: &str, subject: &str, body: &str);
    fn send_sms(&self, phone: &str, body: &str);
}

/// Notifier calling an HTTP messaging service with GET requests.
pub struct HttpNotifier {
    client: Client,
    base_url: String,
}

impl HttpNotifier {
    /// Create a notifier for the messaging service at `base_url`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a notifier with a preconfigured client.
    #[must_use]
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Issue a GET in the background. The query holds the message, so the
    /// URL is stripped from any logged error.
    fn dispatch(&self, channel: &'static str, path: &str, query: &[(&'static str, String)]) {
        let Ok(handle) = Handle::try_current() else {
            tracing::warn!(channel, "notification dropped: no async runtime");
            return;
        };

        let request = self.client.get(self.endpoint(path)).query(query);
        handle.spawn(async move {
            match request.send().await {
                Ok(response) => {
                    tracing::debug!(channel, status = %response.status(), "notification delivered");
                }
                Err(e) => {
                    tracing::warn!(channel, error = %e.without_url(), "notification failed");
                }
            }
        });
    }
}

impl Notifier for HttpNotifier {
    fn send_email(&self, destination: &str, subject: &str, body: &str) {
        self.dispatch(
            "email",
            EMAIL_PATH,
            &[
                ("correo_destino", destination.to_string()),
                ("asunto", subject.to_string()),
                ("contenido", body.to_string()),
            ],
        );
    }

    fn send_sms(&self, phone: &str, body: &str) {
        self.dispatch(
            "sms",
            SMS_PATH,
            &[("telefono", phone.to_string()), ("mensaje", body.to_string())],
        );
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_url() {
        let notifier = HttpNotifier::with_client(Client::new(), "http://127.0.0.1:5000/");

        assert_eq!(
            notifier.endpoint(EMAIL_PATH),
            "http://127.0.0.1:5000/envio-correo"
        );
        assert_eq!(notifier.endpoint(SMS_PATH), "http://127.0.0.1:5000/sms");
    }

    #[test]
    fn test_send_without_runtime_returns_immediately() {
        let notifier = HttpNotifier::with_client(Client::new(), "http://127.0.0.1:9");

        notifier.send_email("ana@example.com", "subject", "body");
        notifier.send_sms("3001234567", "body");
    }

    #[tokio::test]
    async fn test_send_does_not_wait_for_delivery() {
        // Nothing listens on the discard port; the request fails in the background.
        let notifier = HttpNotifier::new("http://127.0.0.1:9").expect("client");

        notifier.send_email("ana@example.com", "subject", "body");
        notifier.send_sms("3001234567", "body");
    }
}
