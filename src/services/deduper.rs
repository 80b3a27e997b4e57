use std::collections::HashSet;

use url::Url;

use crate::domain::NormalizedLead;

/// Collapses leads describing the same business, first-seen wins. A lead is
/// a duplicate when any of its identity keys was already claimed; discarded
/// duplicates still register their remaining keys, so a lead sharing a
/// domain with one record and a phone with another bridges the two. Field
/// values are never merged. Leads with no identity key at all are dropped.
pub fn dedupe(leads: Vec<NormalizedLead>) -> Vec<NormalizedLead> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut survivors: Vec<NormalizedLead> = vec![];

    for lead in leads {
        let keys = identity_keys(&lead);
        if keys.is_empty() {
            continue;
        }
        let duplicate = keys.iter().any(|k| seen.contains(k));
        for key in keys {
            seen.insert(key);
        }
        if !duplicate {
            survivors.push(lead);
        }
    }

    survivors
}

/// Identity keys: website domain and digits-only phone. Leads carrying
/// neither fall back to their strongest name key (name+city, name+state,
/// bare name); a name alone never merges a lead that has a real contact
/// identity, since distinct businesses can share a name and city. Exact
/// matching only; near-duplicates with different spelling will not merge.
pub fn identity_keys(lead: &NormalizedLead) -> Vec<String> {
    let mut keys = vec![];

    if let Some(domain) = lead.website.as_deref().and_then(website_domain) {
        keys.push(format!("domain:{}", domain));
    }
    if let Some(phone) = lead.phone.as_deref() {
        let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
        if !digits.is_empty() {
            keys.push(format!("phone:{}", digits));
        }
    }
    if !keys.is_empty() {
        return keys;
    }

    let name = lead.business_name.trim().to_lowercase();
    if !name.is_empty() {
        if let Some(city) = lead.address.city.as_deref().filter(|c| !c.trim().is_empty()) {
            keys.push(format!("name:{}|city:{}", name, city.trim().to_lowercase()));
        } else if let Some(state) = lead
            .address
            .state
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        {
            keys.push(format!("name:{}|state:{}", name, state.trim().to_lowercase()));
        } else {
            keys.push(format!("name:{}", name));
        }
    }

    keys
}

/// Scheme-agnostic host with any `www.` prefix stripped. Bare domains
/// without a scheme are accepted too.
pub fn website_domain(website: &str) -> Option<String> {
    let website = website.trim();
    if website.is_empty() {
        return None;
    }
    let with_scheme = if website.contains("://") {
        website.to_string()
    } else {
        format!("https://{}", website)
    };
    let host = Url::parse(&with_scheme).ok()?.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Address;

    fn lead(name: &str) -> NormalizedLead {
        NormalizedLead {
            business_name: name.to_string(),
            source: "test".to_string(),
            ..NormalizedLead::default()
        }
    }

    #[test]
    fn domain_and_phone_keys_chain_across_records() {
        let a = NormalizedLead {
            website: Some("https://acme.com".to_string()),
            ..lead("Acme")
        };
        let b = NormalizedLead {
            website: Some("http://www.acme.com".to_string()),
            phone: Some("555-1111".to_string()),
            ..lead("Acme Inc")
        };
        let c = NormalizedLead {
            phone: Some("5551111".to_string()),
            ..lead("Acme Incorporated")
        };

        let survivors = dedupe(vec![a, b, c]);
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].business_name, "Acme");
    }

    #[test]
    fn first_seen_wins_and_no_two_survivors_share_a_key() {
        let leads = vec![
            NormalizedLead {
                website: Some("https://one.example".to_string()),
                ..lead("First")
            },
            NormalizedLead {
                website: Some("https://one.example/about".to_string()),
                ..lead("Second")
            },
            NormalizedLead {
                phone: Some("(555) 222-3333".to_string()),
                ..lead("Third")
            },
        ];

        let before = leads.len();
        let survivors = dedupe(leads);
        assert!(survivors.len() <= before);
        assert_eq!(survivors.len(), 2);
        assert_eq!(survivors[0].business_name, "First");

        let mut all_keys = vec![];
        for s in &survivors {
            all_keys.extend(identity_keys(s));
        }
        let unique: HashSet<&String> = all_keys.iter().collect();
        assert_eq!(unique.len(), all_keys.len());
    }

    #[test]
    fn name_keys_fall_back_through_city_then_state() {
        let with_city = NormalizedLead {
            address: Address {
                city: Some("Austin".to_string()),
                state: Some("TX".to_string()),
                ..Address::default()
            },
            ..lead("Acme")
        };
        assert_eq!(identity_keys(&with_city), vec!["name:acme|city:austin"]);

        let with_state = NormalizedLead {
            address: Address {
                state: Some("TX".to_string()),
                ..Address::default()
            },
            ..lead("Acme")
        };
        assert_eq!(identity_keys(&with_state), vec!["name:acme|state:tx"]);

        assert_eq!(identity_keys(&lead("Acme")), vec!["name:acme"]);
    }

    #[test]
    fn exact_matching_does_not_merge_casing_variants_on_different_keys() {
        // Same name, different cities: distinct identities.
        let austin = NormalizedLead {
            address: Address {
                city: Some("Austin".to_string()),
                ..Address::default()
            },
            ..lead("Acme")
        };
        let dallas = NormalizedLead {
            address: Address {
                city: Some("Dallas".to_string()),
                ..Address::default()
            },
            ..lead("Acme")
        };
        assert_eq!(dedupe(vec![austin, dallas]).len(), 2);
    }

    #[test]
    fn shared_name_and_city_never_merge_leads_with_distinct_domains() {
        let austin_location = Address {
            city: Some("Austin".to_string()),
            ..Address::default()
        };
        let a = NormalizedLead {
            website: Some("https://acme-austin.com".to_string()),
            address: austin_location.clone(),
            ..lead("Acme Dental")
        };
        let b = NormalizedLead {
            website: Some("https://acme-dental-two.com".to_string()),
            address: austin_location,
            ..lead("Acme Dental")
        };
        assert_eq!(dedupe(vec![a, b]).len(), 2);
    }

    #[test]
    fn leads_without_any_identity_are_dropped() {
        let anonymous = lead("   ");
        assert!(dedupe(vec![anonymous]).is_empty());
    }

    #[test]
    fn bare_domains_without_scheme_normalize() {
        let a = NormalizedLead {
            website: Some("acme-dental.com".to_string()),
            ..lead("Acme Dental")
        };
        let b = NormalizedLead {
            website: Some("https://www.acme-dental.com".to_string()),
            ..lead("Acme Dental LLC")
        };
        assert_eq!(dedupe(vec![a, b]).len(), 1);
    }
}
