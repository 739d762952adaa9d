//! Port for outbound email delivery.

use async_trait::async_trait;

use crate::domain::EmailAddress;

use super::define_port_error;

define_port_error! {
    /// Errors raised by mail transports.
    pub enum MailTransportError {
        /// The transport could not be reached or timed out.
        Unavailable { message: String } => "mail transport unavailable: {message}",
        /// The transport refused the message.
        Rejected { message: String } => "mail transport rejected message: {message}",
    }
}

/// Plain-text message addressed to a single recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: EmailAddress,
    pub subject: String,
    pub body: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<(), MailTransportError>;
}
