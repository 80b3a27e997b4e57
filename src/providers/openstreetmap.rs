use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{Address, NormalizedLead, SearchParams};

use super::LeadProvider;

const MAX_LIMIT: u32 = 40;
// Nominatim requires an identifying agent on every request.
const USER_AGENT: &str = "prospect/0.1 (lead sourcing)";

/// Nominatim search. No credential, so this provider is always enabled.
pub struct OpenStreetMap {
    client: Client,
    url: String,
}

#[derive(Deserialize)]
struct NominatimPlace {
    display_name: String,
    osm_type: Option<String>,
    osm_id: Option<i64>,
    importance: Option<f64>,
    #[serde(rename = "type")]
    place_type: Option<String>,
    address: Option<NominatimAddress>,
}

#[derive(Deserialize)]
struct NominatimAddress {
    road: Option<String>,
    house_number: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
}

impl OpenStreetMap {
    pub fn new() -> Self {
        OpenStreetMap {
            client: Client::new(),
            url: "https://nominatim.openstreetmap.org/search".to_string(),
        }
    }
}

impl Default for OpenStreetMap {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LeadProvider for OpenStreetMap {
    fn id(&self) -> &'static str {
        "openstreetmap"
    }

    fn name(&self) -> &'static str {
        "OpenStreetMap Nominatim"
    }

    async fn search(&self, params: &SearchParams) -> anyhow::Result<Vec<Value>> {
        let location = params.location_hint();
        let q = if location.is_empty() {
            params.keyword.clone()
        } else {
            format!("{} {}", params.keyword, location)
        };

        let body: Value = self
            .client
            .get(self.url.clone())
            .header("User-Agent", USER_AGENT)
            .query(&[
                ("q", q),
                ("format", "jsonv2".to_string()),
                ("addressdetails", "1".to_string()),
                ("limit", params.limit.min(MAX_LIMIT).to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        // The happy path is a bare array; anything else coerces to empty.
        Ok(body.as_array().cloned().unwrap_or_default())
    }

    fn normalize(&self, raw: &Value) -> Option<NormalizedLead> {
        let place: NominatimPlace = serde_json::from_value(raw.clone()).ok()?;

        // display_name is "Name, Road, City, ..."; the leading segment is
        // the closest thing Nominatim has to a business name.
        let business_name = place
            .display_name
            .split(',')
            .next()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        if business_name.is_empty() {
            return None;
        }

        let source_url = match (place.osm_type.as_deref(), place.osm_id) {
            (Some(osm_type), Some(osm_id)) => Some(format!(
                "https://www.openstreetmap.org/{}/{}",
                osm_type, osm_id
            )),
            _ => None,
        };

        let address = place
            .address
            .map(|a| Address {
                line1: match (&a.house_number, &a.road) {
                    (Some(n), Some(r)) => Some(format!("{} {}", n, r)),
                    (None, Some(r)) => Some(r.clone()),
                    _ => None,
                },
                city: a.city.or(a.town).or(a.village),
                state: a.state,
                postal_code: a.postcode,
                country: a.country,
                ..Address::default()
            })
            .unwrap_or_default();

        Some(NormalizedLead {
            business_name,
            address,
            source: self.id().to_string(),
            source_url,
            industry: place.place_type.map(|t| t.replace('_', " ")),
            // importance is already a 0-1 fraction.
            confidence: place.importance.map(|i| i.clamp(0.0, 1.0)),
            raw: Some(raw.clone()),
            ..NormalizedLead::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_nominatim_result() {
        let provider = OpenStreetMap::new();
        let raw = json!({
            "osm_type": "node",
            "osm_id": 240109189,
            "display_name": "Smile Studio, 14, High Street, Oxford, England, OX1 4DB, United Kingdom",
            "type": "dentist",
            "importance": 0.42,
            "address": {
                "house_number": "14",
                "road": "High Street",
                "city": "Oxford",
                "state": "England",
                "postcode": "OX1 4DB",
                "country": "United Kingdom"
            }
        });

        let lead = provider.normalize(&raw).unwrap();
        assert_eq!(lead.business_name, "Smile Studio");
        assert_eq!(lead.source, "openstreetmap");
        assert_eq!(lead.confidence, Some(0.42));
        assert_eq!(lead.industry.as_deref(), Some("dentist"));
        assert_eq!(lead.address.line1.as_deref(), Some("14 High Street"));
        assert_eq!(lead.address.city.as_deref(), Some("Oxford"));
        assert_eq!(
            lead.source_url.as_deref(),
            Some("https://www.openstreetmap.org/node/240109189")
        );
    }

    #[test]
    fn town_falls_back_when_city_missing() {
        let provider = OpenStreetMap::new();
        let raw = json!({
            "display_name": "Corner Bakery, Low Road",
            "address": {"town": "Abingdon"}
        });
        let lead = provider.normalize(&raw).unwrap();
        assert_eq!(lead.address.city.as_deref(), Some("Abingdon"));
    }
}
