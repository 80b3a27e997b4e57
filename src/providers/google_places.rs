use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Address, NormalizedLead, SearchParams};

use super::LeadProvider;

pub struct GooglePlaces {
    client: Client,
    api_key: String,
    url: String,
}

#[derive(Serialize)]
struct TextSearchQuery {
    query: String,
    key: String,
}

#[derive(Deserialize)]
struct Place {
    name: String,
    formatted_address: Option<String>,
    place_id: Option<String>,
    types: Option<Vec<String>>,
}

impl GooglePlaces {
    pub fn new(api_key: String) -> Self {
        GooglePlaces {
            client: Client::new(),
            api_key,
            url: "https://maps.googleapis.com/maps/api/place/textsearch/json".to_string(),
        }
    }
}

#[async_trait]
impl LeadProvider for GooglePlaces {
    fn id(&self) -> &'static str {
        "google_places"
    }

    fn name(&self) -> &'static str {
        "Google Places"
    }

    async fn search(&self, params: &SearchParams) -> anyhow::Result<Vec<Value>> {
        let location = params.location_hint();
        let query = if location.is_empty() {
            params.keyword.clone()
        } else {
            format!("{} in {}", params.keyword, location)
        };

        let body: Value = self
            .client
            .get(self.url.clone())
            .query(&TextSearchQuery {
                query,
                key: self.api_key.clone(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(status) = body.get("status").and_then(Value::as_str) {
            if status != "OK" && status != "ZERO_RESULTS" {
                anyhow::bail!("google places returned status {}", status);
            }
        }

        Ok(body
            .get("results")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    fn normalize(&self, raw: &Value) -> Option<NormalizedLead> {
        let place: Place = serde_json::from_value(raw.clone()).ok()?;
        if place.name.trim().is_empty() {
            return None;
        }

        let source_url = place
            .place_id
            .as_deref()
            .map(|id| format!("https://www.google.com/maps/place/?q=place_id:{}", id));
        let industry = place
            .types
            .as_ref()
            .and_then(|t| t.first())
            .map(|t| t.replace('_', " "));

        Some(NormalizedLead {
            business_name: place.name,
            address: Address {
                line1: place.formatted_address,
                ..Address::default()
            },
            source: self.id().to_string(),
            source_url,
            industry,
            raw: Some(raw.clone()),
            ..NormalizedLead::default()
        })
    }
}
