pub mod foursquare;
pub mod google_places;
pub mod openstreetmap;
pub mod yelp;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    configuration::ApiKeySettings,
    domain::{NormalizedLead, SearchParams},
    services::normalizer::passthrough_lead,
};

pub use foursquare::Foursquare;
pub use google_places::GooglePlaces;
pub use openstreetmap::OpenStreetMap;
pub use yelp::Yelp;

/// Provider ids a safe-mode job is allowed to source from.
pub const SAFE_MODE_ALLOWLIST: [&str; 2] = ["google_places", "openstreetmap"];

/// Capability contract every lead-data source implements.
///
/// `search` is required. `normalize` defaults to the canonical pass-through
/// (items already in the lead schema survive, everything else is dropped);
/// adapters with their own payload shape override it and return `None` for
/// items they judge not to be leads. `enrich` defaults to identity.
#[async_trait]
pub trait LeadProvider: Send + Sync {
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    async fn search(&self, params: &SearchParams) -> anyhow::Result<Vec<Value>>;

    fn normalize(&self, raw: &Value) -> Option<NormalizedLead> {
        passthrough_lead(raw)
    }

    async fn enrich(&self, lead: NormalizedLead) -> anyhow::Result<NormalizedLead> {
        Ok(lead)
    }
}

struct Registration {
    provider: Arc<dyn LeadProvider>,
    enabled: bool,
}

/// Immutable provider set, built once at startup and passed by reference.
/// Registration order is load-bearing: aggregation and therefore dedup
/// priority follow it.
pub struct ProviderRegistry {
    registrations: Vec<Registration>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        ProviderRegistry {
            registrations: vec![],
        }
    }

    /// Standard lineup: credentialed providers are registered disabled when
    /// their key is missing; Nominatim needs no credential.
    pub fn from_configuration(api_keys: &ApiKeySettings) -> Self {
        let mut registry = ProviderRegistry::new();
        registry.register(
            Arc::new(GooglePlaces::new(
                api_keys.google_places.clone().unwrap_or_default(),
            )),
            api_keys.google_places.is_some(),
        );
        registry.register(
            Arc::new(Yelp::new(api_keys.yelp.clone().unwrap_or_default())),
            api_keys.yelp.is_some(),
        );
        registry.register(
            Arc::new(Foursquare::new(
                api_keys.foursquare.clone().unwrap_or_default(),
            )),
            api_keys.foursquare.is_some(),
        );
        registry.register(Arc::new(OpenStreetMap::new()), true);
        registry
    }

    pub fn register(&mut self, provider: Arc<dyn LeadProvider>, enabled: bool) {
        self.registrations.push(Registration { provider, enabled });
    }

    /// Unknown ids return `None`; they are not an error.
    pub fn get(&self, id: &str) -> Option<Arc<dyn LeadProvider>> {
        self.registrations
            .iter()
            .find(|r| r.provider.id() == id)
            .map(|r| r.provider.clone())
    }

    /// Enabled providers in registration order.
    pub fn list_enabled(&self) -> Vec<Arc<dyn LeadProvider>> {
        self.registrations
            .iter()
            .filter(|r| r.enabled)
            .map(|r| r.provider.clone())
            .collect()
    }

    /// Enabled set, intersected with the safe-mode allowlist when the job
    /// asks for compliance-restricted sourcing.
    pub fn active_providers(&self, safe_mode: bool) -> Vec<Arc<dyn LeadProvider>> {
        self.list_enabled()
            .into_iter()
            .filter(|p| !safe_mode || SAFE_MODE_ALLOWLIST.contains(&p.id()))
            .collect()
    }
}
