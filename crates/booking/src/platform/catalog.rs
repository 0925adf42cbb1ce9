//! Catalog and schedule lookups (cached).

use fernhill_core::ServiceSlug;
use tracing::{debug, instrument};

use crate::schedule::ScheduleDef;

use super::cache::{CacheKey, CacheValue};
use super::types::{Medicine, Service};
use super::{PlatformClient, PlatformError};

impl PlatformClient {
    /// List all bookable services.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    #[instrument(skip(self))]
    pub async fn get_services(&self) -> Result<Vec<Service>, PlatformError> {
        let key = CacheKey::Services;
        if let Some(CacheValue::Services(services)) = self.cache_get(&key).await {
            debug!("services cache hit");
            return Ok(services);
        }

        let services: Vec<Service> = self.get_json("/services").await?;
        self.cache_put(key, CacheValue::Services(services.clone()))
            .await;
        Ok(services)
    }

    /// Get a single service by slug.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::NotFound` for an unknown slug.
    #[instrument(skip(self))]
    pub async fn get_service(&self, slug: &ServiceSlug) -> Result<Service, PlatformError> {
        let key = CacheKey::Service(slug.clone());
        if let Some(CacheValue::Service(service)) = self.cache_get(&key).await {
            debug!("service cache hit");
            return Ok(*service);
        }

        let service: Service = self.get_json(&format!("/services/{slug}")).await?;
        self.cache_put(key, CacheValue::Service(Box::new(service.clone())))
            .await;
        Ok(service)
    }

    /// List the medicines available under a service.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    #[instrument(skip(self))]
    pub async fn get_medicines(&self, slug: &ServiceSlug) -> Result<Vec<Medicine>, PlatformError> {
        let key = CacheKey::Medicines(slug.clone());
        if let Some(CacheValue::Medicines(medicines)) = self.cache_get(&key).await {
            debug!("medicines cache hit");
            return Ok(medicines);
        }

        let medicines: Vec<Medicine> = self.get_json(&format!("/services/{slug}/medicines")).await?;
        self.cache_put(key, CacheValue::Medicines(medicines.clone()))
            .await;
        Ok(medicines)
    }

    /// Get the appointment schedule definition for a service.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::NotFound` if the service has no schedule.
    #[instrument(skip(self))]
    pub async fn get_schedule(&self, slug: &ServiceSlug) -> Result<ScheduleDef, PlatformError> {
        let key = CacheKey::Schedule(slug.clone());
        if let Some(CacheValue::Schedule(schedule)) = self.cache_get(&key).await {
            debug!("schedule cache hit");
            return Ok(*schedule);
        }

        let schedule: ScheduleDef = self.get_json(&format!("/services/{slug}/schedule")).await?;
        self.cache_put(key, CacheValue::Schedule(Box::new(schedule.clone())))
            .await;
        Ok(schedule)
    }
}
