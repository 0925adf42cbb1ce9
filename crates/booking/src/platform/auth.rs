//! Customer authentication against the platform API.
//!
//! The booking service never stores credentials; it exchanges them for a
//! bearer token which is held in the customer's session store.

use tracing::instrument;

use super::types::{AuthSession, Credentials, Registration, UserProfile};
use super::{PlatformClient, PlatformError};

impl PlatformClient {
    /// Log a customer in, exchanging credentials for a session token.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Api` with status 401 for bad credentials.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthSession, PlatformError> {
        self.post_json("/auth/login", credentials).await
    }

    /// Register a new customer account.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Api` with status 409 for an existing email.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(
        &self,
        registration: &Registration,
    ) -> Result<AuthSession, PlatformError> {
        self.post_json("/auth/register", registration).await
    }

    /// Fetch the profile belonging to a customer token.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Api` with status 401 for an expired token.
    #[instrument(skip(self, token))]
    pub async fn get_current_user(&self, token: &str) -> Result<UserProfile, PlatformError> {
        self.get_json_as("/auth/me", token).await
    }
}
