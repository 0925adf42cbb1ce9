//! Transactional email send.

use tracing::instrument;

use super::types::EmailMessage;
use super::{PlatformClient, PlatformError};

/// Acknowledgement returned by the email endpoint.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct EmailReceipt {
    pub id: String,
}

impl PlatformClient {
    /// Send a transactional email through the platform.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; callers sending confirmation
    /// mail treat this as non-blocking and retry without the attachment.
    #[instrument(skip(self, message), fields(to = %message.to, subject = %message.subject))]
    pub async fn send_email(&self, message: &EmailMessage) -> Result<EmailReceipt, PlatformError> {
        self.post_json("/emails", message).await
    }
}
