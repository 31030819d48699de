//! ntfy publisher.
//!
//! Sends one plain-text POST per notification. There is no retry here; a
//! failure goes back to the webhook handler, which answers Stripe with a 5xx so
//! Stripe redelivers the event.

use std::sync::Arc;

use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::{NtfyAuth, NtfyConfig};
use crate::notify::Notification;

/// Icon shown next to every notification.
pub const ICON_URL: &str = "https://play-lh.googleusercontent.com/2PS6w7uBztfuMys5fgodNkTwTOE6bLVB2cJYbu5GHlARAK36FzO5bUfMDP9cEJk__cE";

/// Appended to the body of events from the Stripe test environment.
pub const TEST_MODE_SUFFIX: &str = " [test mode]";

/// Errors returned by [`NtfyClient::dispatch`].
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("ntfy returned unexpected status code {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    #[error("ntfy request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Client for the configured ntfy topic.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct NtfyClient {
    client: Client,
    config: Arc<NtfyConfig>,
}

impl NtfyClient {
    /// Build a client with its own connection pool.
    pub fn new(config: NtfyConfig) -> Result<Self, DispatchError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self::with_client(builder.build()?, config))
    }

    /// Use an existing `reqwest` client.
    pub fn with_client(client: Client, config: NtfyConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }

    /// Publish a notification.
    ///
    /// Anything but `200 OK` is an error carrying the status and response body.
    pub async fn dispatch(
        &self,
        live_mode: bool,
        notification: &Notification,
    ) -> Result<(), DispatchError> {
        let body = message_body(live_mode, &notification.body);

        let mut request = self
            .client
            .post(self.config.url.clone())
            .header("Content-Type", "text/plain")
            .header("Markdown", "yes")
            .header("Title", notification.title.as_str())
            .header("Icon", ICON_URL);

        if let Some(click_url) = &notification.click_url {
            request = request.header("Click", click_url.as_str());
        }

        request = match &self.config.auth {
            NtfyAuth::Bearer(token) => request.bearer_auth(token),
            NtfyAuth::Basic { username, password } => request.basic_auth(username, Some(password)),
            NtfyAuth::None => request,
        };

        let response = match request.body(body).send().await {
            Ok(resp) => resp,
            Err(e) => {
                if e.is_timeout() {
                    error!(error = %e, "ntfy_publish_timeout");
                } else if e.is_connect() {
                    error!(error = %e, "ntfy_publish_connect_error");
                } else {
                    error!(error = %e, "ntfy_publish_error");
                }
                return Err(DispatchError::Transport(e));
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_else(|e| {
                warn!(error = %e, "ntfy_response_body_unreadable");
                String::new()
            });

            error!(
                status_code = status.as_u16(),
                response_body = %body,
                "ntfy_publish_rejected"
            );

            return Err(DispatchError::UnexpectedStatus { status, body });
        }

        info!(
            status_code = status.as_u16(),
            title = %notification.title,
            auth = self.config.auth.scheme(),
            live_mode = live_mode,
            "ntfy_publish_complete"
        );

        Ok(())
    }
}

/// The transmitted body, marked when the event came from test mode.
fn message_body(live_mode: bool, body: &str) -> String {
    if live_mode {
        body.to_string()
    } else {
        format!("{}{}", body, TEST_MODE_SUFFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;
    use wiremock::matchers::{body_string, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notification(click_url: Option<&str>) -> Notification {
        Notification {
            title: "💰 Payment Succeeded".to_string(),
            body: "Received $10.50".to_string(),
            click_url: click_url.map(str::to_string),
        }
    }

    fn client_for(server: &MockServer, auth: NtfyAuth) -> NtfyClient {
        let config = NtfyConfig {
            url: Url::parse(&format!("{}/stripe", server.uri())).unwrap(),
            auth,
            timeout: None,
        };
        NtfyClient::new(config).unwrap()
    }

    async fn received_requests(server: &MockServer) -> Vec<wiremock::Request> {
        server.received_requests().await.unwrap()
    }

    #[test]
    fn test_message_body_test_mode() {
        assert_eq!(message_body(true, "Received $1.00"), "Received $1.00");
        assert_eq!(
            message_body(false, "Received $1.00"),
            "Received $1.00 [test mode]"
        );
    }

    #[tokio::test]
    async fn test_dispatch_sets_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/stripe"))
            .and(header("Content-Type", "text/plain"))
            .and(header("Markdown", "yes"))
            .and(header("Icon", ICON_URL))
            .and(header("Click", "https://dashboard.stripe.com/payments/pi_1"))
            .and(body_string("Received $10.50"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, NtfyAuth::None);
        client
            .dispatch(true, &notification(Some("https://dashboard.stripe.com/payments/pi_1")))
            .await
            .unwrap();

        let requests = received_requests(&server).await;
        let title = requests[0].headers.get("Title").unwrap();
        assert_eq!(title.as_bytes(), "💰 Payment Succeeded".as_bytes());
        assert!(requests[0].headers.get("Authorization").is_none());
    }

    #[tokio::test]
    async fn test_dispatch_without_click_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client_for(&server, NtfyAuth::None);
        client.dispatch(true, &notification(None)).await.unwrap();

        let requests = received_requests(&server).await;
        assert!(requests[0].headers.get("Click").is_none());
    }

    #[tokio::test]
    async fn test_dispatch_appends_test_mode_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string("Received $10.50 [test mode]"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, NtfyAuth::None);
        client.dispatch(false, &notification(None)).await.unwrap();
    }

    #[tokio::test]
    async fn test_dispatch_bearer_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("Authorization", "Bearer tk_123"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, NtfyAuth::Bearer("tk_123".to_string()));
        client.dispatch(true, &notification(None)).await.unwrap();
    }

    #[tokio::test]
    async fn test_dispatch_basic_auth() {
        let server = MockServer::start().await;
        // base64("user:pass")
        Mock::given(method("POST"))
            .and(header("Authorization", "Basic dXNlcjpwYXNz"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let auth = NtfyAuth::Basic {
            username: "user".to_string(),
            password: "pass".to_string(),
        };
        let client = client_for(&server, auth);
        client.dispatch(true, &notification(None)).await.unwrap();
    }

    #[tokio::test]
    async fn test_dispatch_bearer_wins_over_basic() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header_exists("Authorization"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let auth = NtfyAuth::from_parts(
            Some("tk_123".to_string()),
            Some("user".to_string()),
            Some("pass".to_string()),
        );
        let client = client_for(&server, auth);
        client.dispatch(true, &notification(None)).await.unwrap();

        let requests = received_requests(&server).await;
        let auth = requests[0].headers.get("Authorization").unwrap();
        assert_eq!(auth.to_str().unwrap(), "Bearer tk_123");
    }

    #[tokio::test]
    async fn test_dispatch_non_ok_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("topic is on fire"))
            .mount(&server)
            .await;

        let client = client_for(&server, NtfyAuth::None);
        let err = client.dispatch(true, &notification(None)).await.unwrap_err();

        match err {
            DispatchError::UnexpectedStatus { status, body } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "topic is on fire");
            }
            other => panic!("expected UnexpectedStatus, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dispatch_other_success_codes_are_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let client = client_for(&server, NtfyAuth::None);
        let err = client.dispatch(true, &notification(None)).await.unwrap_err();

        assert!(matches!(
            err,
            DispatchError::UnexpectedStatus { status, .. } if status == StatusCode::ACCEPTED
        ));
    }

    #[tokio::test]
    async fn test_dispatch_connection_refused() {
        // Bind then drop to get a port nothing listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = NtfyConfig {
            url: Url::parse(&format!("http://127.0.0.1:{}/stripe", port)).unwrap(),
            auth: NtfyAuth::None,
            timeout: None,
        };

        let client = NtfyClient::new(config).unwrap();
        let err = client.dispatch(true, &notification(None)).await.unwrap_err();

        assert!(matches!(err, DispatchError::Transport(_)));
    }
}
