//! Cache types for platform API responses.

use fernhill_core::ServiceSlug;

use crate::platform::types::{Medicine, Service};
use crate::schedule::ScheduleDef;

/// Cache key for catalog and schedule lookups.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Services,
    Service(ServiceSlug),
    Medicines(ServiceSlug),
    Schedule(ServiceSlug),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Services(Vec<Service>),
    Service(Box<Service>),
    Medicines(Vec<Medicine>),
    Schedule(Box<ScheduleDef>),
}
