//! Mail transport adapters.
//!
//! [`HttpMailTransport`] posts messages as JSON to a transactional mail API.
//! [`LogMailTransport`] only logs them and is meant for local development.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::domain::EmailAddress;
use crate::domain::ports::{MailMessage, MailTransport, MailTransportError};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const PREVIEW_CHAR_LIMIT: usize = 160;

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Transport posting messages to an HTTP mail API with a bearer key.
pub struct HttpMailTransport {
    client: Client,
    endpoint: Url,
    api_key: Zeroizing<String>,
    sender: EmailAddress,
}

impl HttpMailTransport {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: Url,
        api_key: impl Into<String>,
        sender: EmailAddress,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key: Zeroizing::new(api_key.into()),
            sender,
        })
    }
}

#[async_trait]
impl MailTransport for HttpMailTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), MailTransportError> {
        let request = SendRequest {
            from: self.sender.as_ref(),
            to: message.to.as_ref(),
            subject: &message.subject,
            text: &message.body,
        };
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|error| MailTransportError::unavailable(error.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.bytes().await.unwrap_or_default();
        let error = map_status_error(status, body.as_ref());
        warn!(status = status.as_u16(), kind = error.kind(), "mail API refused message");
        Err(error)
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> MailTransportError {
    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview: String = compact.chars().take(PREVIEW_CHAR_LIMIT).collect();
    let message = if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {preview}", status.as_u16())
    };
    match status {
        StatusCode::TOO_MANY_REQUESTS | StatusCode::REQUEST_TIMEOUT => {
            MailTransportError::unavailable(message)
        }
        _ if status.is_client_error() => MailTransportError::rejected(message),
        _ => MailTransportError::unavailable(message),
    }
}

/// Transport that writes messages to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailTransport;

#[async_trait]
impl MailTransport for LogMailTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), MailTransportError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "mail transport not configured; logging message"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(StatusCode::BAD_REQUEST, "rejected")]
    #[case(StatusCode::UNPROCESSABLE_ENTITY, "rejected")]
    #[case(StatusCode::TOO_MANY_REQUESTS, "unavailable")]
    #[case(StatusCode::BAD_GATEWAY, "unavailable")]
    fn statuses_map_to_transport_errors(#[case] status: StatusCode, #[case] kind: &str) {
        assert_eq!(map_status_error(status, b"{}").kind(), kind);
    }

    #[test]
    fn status_errors_carry_a_compact_preview() {
        let error = map_status_error(StatusCode::BAD_REQUEST, b"invalid   recipient\n");
        assert_eq!(
            error.to_string(),
            "mail transport rejected message: status 400: invalid recipient"
        );
    }

    #[tokio::test]
    async fn log_transport_always_succeeds() {
        let message = MailMessage {
            to: EmailAddress::new("a@x.com").expect("email"),
            subject: "hi".into(),
            body: "123456".into(),
        };
        LogMailTransport.send(&message).await.expect("logged");
    }
}
