use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Search brief driving one aggregation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    pub keyword: String,
    pub context: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub limit: u32,
}

impl SearchParams {
    /// "city, state, country" with missing parts skipped. Empty when no geo
    /// filter was set.
    pub fn location_hint(&self) -> String {
        [&self.city, &self.state, &self.country]
            .into_iter()
            .flatten()
            .cloned()
            .collect::<Vec<String>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Canonical lead schema every provider payload is mapped into.
///
/// `confidence` is always on the 0..=1 scale; adapters rescale whatever
/// their source reports. `raw` keeps the untouched provider payload for
/// traceability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NormalizedLead {
    pub business_name: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Address,
    pub source: String,
    pub source_url: Option<String>,
    pub industry: Option<String>,
    pub confidence: Option<f64>,
    pub notes: Option<String>,
    pub raw: Option<Value>,
}

impl NormalizedLead {
    pub fn push_note(&mut self, note: &str) {
        match &mut self.notes {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(note);
            }
            None => self.notes = Some(note.to_string()),
        }
    }
}
