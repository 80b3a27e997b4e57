use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{Address, NormalizedLead, SearchParams};

use super::LeadProvider;

// Yelp rejects limits above this.
const MAX_LIMIT: u32 = 50;

pub struct Yelp {
    client: Client,
    api_key: String,
    url: String,
}

#[derive(Deserialize)]
struct Business {
    name: String,
    url: Option<String>,
    phone: Option<String>,
    rating: Option<f64>,
    categories: Option<Vec<Category>>,
    location: Option<Location>,
}

#[derive(Deserialize)]
struct Category {
    title: String,
}

#[derive(Deserialize)]
struct Location {
    address1: Option<String>,
    address2: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip_code: Option<String>,
    country: Option<String>,
}

impl Yelp {
    pub fn new(api_key: String) -> Self {
        Yelp {
            client: Client::new(),
            api_key,
            url: "https://api.yelp.com/v3/businesses/search".to_string(),
        }
    }
}

#[async_trait]
impl LeadProvider for Yelp {
    fn id(&self) -> &'static str {
        "yelp"
    }

    fn name(&self) -> &'static str {
        "Yelp Fusion"
    }

    async fn search(&self, params: &SearchParams) -> anyhow::Result<Vec<Value>> {
        let mut query: Vec<(&str, String)> = vec![
            ("term", params.keyword.clone()),
            ("limit", params.limit.min(MAX_LIMIT).to_string()),
        ];
        let location = params.location_hint();
        if !location.is_empty() {
            query.push(("location", location));
        }

        let body: Value = self
            .client
            .get(self.url.clone())
            .bearer_auth(self.api_key.clone())
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(body
            .get("businesses")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    fn normalize(&self, raw: &Value) -> Option<NormalizedLead> {
        let business: Business = serde_json::from_value(raw.clone()).ok()?;
        if business.name.trim().is_empty() {
            return None;
        }

        let address = business
            .location
            .map(|loc| Address {
                line1: loc.address1,
                line2: loc.address2,
                city: loc.city,
                state: loc.state,
                postal_code: loc.zip_code,
                country: loc.country,
            })
            .unwrap_or_default();

        Some(NormalizedLead {
            business_name: business.name,
            phone: business.phone.filter(|p| !p.is_empty()),
            address,
            source: self.id().to_string(),
            source_url: business.url,
            industry: business
                .categories
                .as_ref()
                .and_then(|c| c.first())
                .map(|c| c.title.clone()),
            // Ratings arrive on a 0-5 scale.
            confidence: business.rating.map(|r| (r / 5.0).clamp(0.0, 1.0)),
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
    fn normalizes_fusion_business() {
        let provider = Yelp::new("test-key".to_string());
        let raw = json!({
            "name": "Bright Smile Dental",
            "url": "https://www.yelp.com/biz/bright-smile-dental",
            "phone": "+15551234567",
            "rating": 4.0,
            "categories": [{"alias": "dentists", "title": "Dentists"}],
            "location": {
                "address1": "500 Oak Ave",
                "address2": "",
                "city": "Austin",
                "state": "TX",
                "zip_code": "78701",
                "country": "US"
            }
        });

        let lead = provider.normalize(&raw).unwrap();
        assert_eq!(lead.business_name, "Bright Smile Dental");
        assert_eq!(lead.source, "yelp");
        assert_eq!(lead.phone.as_deref(), Some("+15551234567"));
        assert_eq!(lead.industry.as_deref(), Some("Dentists"));
        assert_eq!(lead.address.city.as_deref(), Some("Austin"));
        assert_eq!(lead.confidence, Some(0.8));
    }

    #[test]
    fn empty_phone_becomes_none() {
        let provider = Yelp::new("test-key".to_string());
        let raw = json!({"name": "Quiet Cafe", "phone": ""});
        let lead = provider.normalize(&raw).unwrap();
        assert_eq!(lead.phone, None);
        assert_eq!(lead.confidence, None);
    }
}
