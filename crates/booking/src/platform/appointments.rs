//! Appointment resource operations.

use tracing::instrument;

use super::types::{Appointment, NewAppointment};
use super::{PlatformClient, PlatformError};

impl PlatformClient {
    /// Create an appointment for a paid order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the slot is no longer free.
    #[instrument(skip(self, appointment), fields(order_id = %appointment.order_id))]
    pub async fn create_appointment(
        &self,
        appointment: &NewAppointment,
    ) -> Result<Appointment, PlatformError> {
        self.post_json("/appointments", appointment).await
    }
}
