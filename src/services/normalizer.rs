use serde_json::Value;

use crate::{domain::NormalizedLead, providers::LeadProvider};

/// Pass-through mapping for providers without their own `normalize` hook:
/// items already in the canonical shape survive untouched, everything else
/// is silently dropped. Requires a non-empty businessName and source.
pub fn passthrough_lead(raw: &Value) -> Option<NormalizedLead> {
    let lead: NormalizedLead = serde_json::from_value(raw.clone()).ok()?;
    if lead.business_name.trim().is_empty() || lead.source.trim().is_empty() {
        return None;
    }
    Some(lead)
}

/// Maps one provider's raw batch into canonical leads, defaulting each
/// lead's source to the originating provider id when the hook left it empty.
pub fn normalize_provider_results(
    provider: &dyn LeadProvider,
    raw_results: &[Value],
) -> Vec<NormalizedLead> {
    raw_results
        .iter()
        .filter_map(|raw| provider.normalize(raw))
        .map(|mut lead| {
            if lead.source.trim().is_empty() {
                lead.source = provider.id().to_string();
            }
            lead
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SearchParams;
    use async_trait::async_trait;
    use serde_json::json;

    struct PassthroughProvider;

    #[async_trait]
    impl LeadProvider for PassthroughProvider {
        fn id(&self) -> &'static str {
            "passthrough"
        }
        fn name(&self) -> &'static str {
            "Passthrough"
        }
        async fn search(&self, _params: &SearchParams) -> anyhow::Result<Vec<Value>> {
            Ok(vec![])
        }
    }

    #[test]
    fn passthrough_keeps_canonical_items_and_drops_the_rest() {
        let raw = vec![
            json!({"businessName": "Acme Dental", "source": "passthrough", "phone": "5551234"}),
            json!({"businessName": "", "source": "passthrough"}),
            json!({"website": "https://no-name.example"}),
            json!(42),
        ];
        let leads = normalize_provider_results(&PassthroughProvider, &raw);
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].business_name, "Acme Dental");
        assert_eq!(leads[0].phone.as_deref(), Some("5551234"));
    }

    #[test]
    fn passthrough_is_idempotent_on_canonical_input() {
        let raw = vec![
            json!({
                "businessName": "Acme Dental",
                "website": "https://acme-dental.com",
                "source": "passthrough",
                "confidence": 0.9
            }),
            json!({"businessName": "Oak Clinic", "source": "passthrough"}),
        ];
        let once = normalize_provider_results(&PassthroughProvider, &raw);
        let reserialized: Vec<Value> = once
            .iter()
            .map(|l| serde_json::to_value(l).unwrap())
            .collect();
        let twice = normalize_provider_results(&PassthroughProvider, &reserialized);
        assert_eq!(once, twice);
    }

    #[test]
    fn missing_source_defaults_to_provider_id() {
        struct NamedOnly;

        #[async_trait]
        impl LeadProvider for NamedOnly {
            fn id(&self) -> &'static str {
                "named_only"
            }
            fn name(&self) -> &'static str {
                "Named Only"
            }
            async fn search(&self, _params: &SearchParams) -> anyhow::Result<Vec<Value>> {
                Ok(vec![])
            }
            fn normalize(&self, raw: &Value) -> Option<NormalizedLead> {
                let name = raw.get("n")?.as_str()?;
                Some(NormalizedLead {
                    business_name: name.to_string(),
                    ..NormalizedLead::default()
                })
            }
        }

        let leads = normalize_provider_results(&NamedOnly, &[json!({"n": "Acme"})]);
        assert_eq!(leads[0].source, "named_only");
    }
}
