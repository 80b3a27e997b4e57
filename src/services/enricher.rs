use async_openai::{
    config::OpenAIConfig,
    types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::{NormalizedLead, SearchParams};

const MODEL: &str = "gpt-4o-mini";
const MAX_TOKENS: u32 = 300;

/// Fields the inference call may supply. Null fields preserve the original.
#[derive(Debug, Default, Deserialize)]
pub struct EnrichmentFields {
    pub industry: Option<String>,
    pub confidence: Option<f64>,
    pub notes: Option<String>,
}

/// Inference seam. The pipeline only sees this trait, so tests can swap in
/// a local double the same way they swap the store.
#[async_trait]
pub trait LeadEnricher: Send + Sync {
    async fn enrich(
        &self,
        lead: NormalizedLead,
        params: &SearchParams,
    ) -> anyhow::Result<NormalizedLead>;
}

pub struct Enricher {
    client: Client<OpenAIConfig>,
}

impl Enricher {
    pub fn new(api_key: String) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Enricher {
            client: Client::with_config(config),
        }
    }
}

#[async_trait]
impl LeadEnricher for Enricher {
    /// One inference call for one lead. Callers drive this sequentially.
    async fn enrich(
        &self,
        lead: NormalizedLead,
        params: &SearchParams,
    ) -> anyhow::Result<NormalizedLead> {
        let prompt = build_prompt(&lead, params);

        let request = CreateChatCompletionRequestArgs::default()
            .model(MODEL)
            .messages([ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()?
                .into()])
            .max_tokens(MAX_TOKENS)
            .build()?;

        let response = self.client.chat().create(request).await?;
        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("no content in enrichment response"))?;

        let fields = parse_enrichment(&content);
        Ok(apply_enrichment(lead, fields))
    }
}

fn build_prompt(lead: &NormalizedLead, params: &SearchParams) -> String {
    let mut prompt = format!(
        "You are qualifying business leads for the search \"{}\".",
        params.keyword
    );
    if let Some(context) = &params.context {
        prompt.push_str(&format!(" Additional context: {}.", context));
    }
    prompt.push_str(&format!(
        "\nBusiness: {}\nWebsite: {}\nKnown industry: {}\n",
        lead.business_name,
        lead.website.as_deref().unwrap_or("unknown"),
        lead.industry.as_deref().unwrap_or("unknown"),
    ));
    prompt.push_str(
        "Reply with a single JSON object with keys industry (string or null), \
         confidence (number 0-1 or null) and notes (string or null). \
         No other text.",
    );
    prompt
}

/// Tolerates models that wrap the object in prose or a code fence.
fn parse_enrichment(content: &str) -> EnrichmentFields {
    let trimmed = content.trim();
    if let Ok(fields) = serde_json::from_str(trimmed) {
        return fields;
    }
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(fields) = serde_json::from_str(&trimmed[start..=end]) {
                return fields;
            }
        }
    }
    log::warn!("unparsable enrichment response: {}", trimmed);
    EnrichmentFields::default()
}

/// Merge rule: non-null response fields replace, null preserves. Only
/// industry, confidence and notes are ever touched.
pub fn apply_enrichment(mut lead: NormalizedLead, fields: EnrichmentFields) -> NormalizedLead {
    if let Some(industry) = fields.industry {
        lead.industry = Some(industry);
    }
    if let Some(confidence) = fields.confidence {
        lead.confidence = Some(unify_confidence(confidence));
    }
    if let Some(notes) = fields.notes {
        lead.push_note(&notes);
    }
    lead
}

/// Values above 1 are treated as 0-100 percentages; everything lands in
/// [0, 1].
pub fn unify_confidence(value: f64) -> f64 {
    if value > 1.0 {
        (value / 100.0).clamp(0.0, 1.0)
    } else {
        value.clamp(0.0, 1.0)
    }
}
