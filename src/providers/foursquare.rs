use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{Address, NormalizedLead, SearchParams};

use super::LeadProvider;

const MAX_LIMIT: u32 = 50;

pub struct Foursquare {
    client: Client,
    api_key: String,
    url: String,
}

#[derive(Deserialize)]
struct FsqPlace {
    name: String,
    link: Option<String>,
    tel: Option<String>,
    website: Option<String>,
    categories: Option<Vec<FsqCategory>>,
    location: Option<FsqLocation>,
}

#[derive(Deserialize)]
struct FsqCategory {
    name: String,
}

#[derive(Deserialize)]
struct FsqLocation {
    address: Option<String>,
    locality: Option<String>,
    region: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
}

impl Foursquare {
    pub fn new(api_key: String) -> Self {
        Foursquare {
            client: Client::new(),
            api_key,
            url: "https://api.foursquare.com/v3/places/search".to_string(),
        }
    }
}

#[async_trait]
impl LeadProvider for Foursquare {
    fn id(&self) -> &'static str {
        "foursquare"
    }

    fn name(&self) -> &'static str {
        "Foursquare Places"
    }

    async fn search(&self, params: &SearchParams) -> anyhow::Result<Vec<Value>> {
        let mut query: Vec<(&str, String)> = vec![
            ("query", params.keyword.clone()),
            ("limit", params.limit.min(MAX_LIMIT).to_string()),
            (
                "fields",
                "name,link,tel,website,categories,location".to_string(),
            ),
        ];
        let location = params.location_hint();
        if !location.is_empty() {
            query.push(("near", location));
        }

        let body: Value = self
            .client
            .get(self.url.clone())
            .header("Authorization", self.api_key.clone())
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(body
            .get("results")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    fn normalize(&self, raw: &Value) -> Option<NormalizedLead> {
        let place: FsqPlace = serde_json::from_value(raw.clone()).ok()?;
        if place.name.trim().is_empty() {
            return None;
        }

        let address = place
            .location
            .map(|loc| Address {
                line1: loc.address,
                city: loc.locality,
                state: loc.region,
                postal_code: loc.postcode,
                country: loc.country,
                ..Address::default()
            })
            .unwrap_or_default();

        Some(NormalizedLead {
            business_name: place.name,
            website: place.website.filter(|w| !w.is_empty()),
            phone: place.tel.filter(|t| !t.is_empty()),
            address,
            source: self.id().to_string(),
            source_url: place
                .link
                .map(|l| format!("https://api.foursquare.com{}", l)),
            industry: place
                .categories
                .as_ref()
                .and_then(|c| c.first())
                .map(|c| c.name.clone()),
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
    fn normalizes_places_result() {
        let provider = Foursquare::new("test-key".to_string());
        let raw = json!({
            "name": "Riverside Dental",
            "link": "/v3/places/4b3a",
            "tel": "(555) 987-6543",
            "website": "https://riversidedental.example",
            "categories": [{"id": 15014, "name": "Dentist"}],
            "location": {
                "address": "9 River Rd",
                "locality": "Portland",
                "region": "OR",
                "postcode": "97201",
                "country": "US"
            }
        });

        let lead = provider.normalize(&raw).unwrap();
        assert_eq!(lead.business_name, "Riverside Dental");
        assert_eq!(lead.source, "foursquare");
        assert_eq!(lead.website.as_deref(), Some("https://riversidedental.example"));
        assert_eq!(lead.phone.as_deref(), Some("(555) 987-6543"));
        assert_eq!(lead.industry.as_deref(), Some("Dentist"));
        assert_eq!(
            lead.source_url.as_deref(),
            Some("https://api.foursquare.com/v3/places/4b3a")
        );
        assert_eq!(lead.address.state.as_deref(), Some("OR"));
    }

    #[test]
    fn rejects_unparsable_items() {
        let provider = Foursquare::new("test-key".to_string());
        assert!(provider.normalize(&json!("just a string")).is_none());
        assert!(provider.normalize(&json!({"tel": "555"})).is_none());
    }
}
