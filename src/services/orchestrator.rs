use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    dal::JobStore,
    domain::{AuditAction, AuditRecord, JobStatus, LeadJob, NormalizedLead, RunSummary},
    providers::{LeadProvider, ProviderRegistry},
    services::{
        audit_logger::AuditLogger,
        deduper,
        enricher::LeadEnricher,
        normalizer,
        rate_limiter::RateLimiter,
    },
};

const PROVIDER_CONCURRENCY: usize = 4;
const RUN_COST: u32 = 1;

const PROGRESS_STARTED: i32 = 5;
const PROGRESS_AGGREGATED: i32 = 45;
const PROGRESS_PERSISTING: i32 = 80;
const PROGRESS_DONE: i32 = 100;

#[derive(Debug, Error)]
pub enum SearchJobError {
    #[error("job {0} not found")]
    JobNotFound(Uuid),
    #[error("caller is not allowed to run this job")]
    Unauthorized,
    #[error("account is not eligible to source leads")]
    Ineligible,
    #[error("lead sourcing is disabled by the compliance kill switch")]
    ComplianceBlocked,
    #[error("rate limit exceeded, try again later")]
    RateLimited,
    #[error("provider {provider} failed: {source}")]
    Provider {
        provider: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("enrichment failed: {0}")]
    Enrichment(#[source] anyhow::Error),
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Caller identity as resolved by the invoking layer. Authentication itself
/// lives outside this core.
#[derive(Debug, Clone, Copy)]
pub struct RunCaller {
    pub user_id: Uuid,
    pub is_admin: bool,
    pub account_eligible: bool,
}

/// Drives one end-to-end run and owns the single failure boundary. Built
/// once at startup; every collaborator is passed in, nothing is global.
pub struct SearchPipeline {
    registry: ProviderRegistry,
    enricher: Option<Arc<dyn LeadEnricher>>,
    rate_limiter: RateLimiter,
    audit: AuditLogger,
    store: Arc<dyn JobStore>,
    kill_switch: bool,
}

impl SearchPipeline {
    pub fn new(
        registry: ProviderRegistry,
        enricher: Option<Arc<dyn LeadEnricher>>,
        rate_limiter: RateLimiter,
        store: Arc<dyn JobStore>,
        kill_switch: bool,
    ) -> Self {
        let audit = AuditLogger::new(store.clone());
        SearchPipeline {
            registry,
            enricher,
            rate_limiter,
            audit,
            store,
            kill_switch,
        }
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    /// One run: gates, fan-out, normalize, dedupe, cap, enrich, persist.
    /// Everything after the gates funnels through one boundary that leaves
    /// the job terminal and writes exactly one summarizing audit record.
    pub async fn run(&self, job_id: Uuid, caller: &RunCaller) -> Result<RunSummary, SearchJobError> {
        let job = self
            .store
            .fetch_job(job_id)
            .await?
            .ok_or(SearchJobError::JobNotFound(job_id))?;

        // Gates, in order, before any state change.
        if !caller.is_admin && caller.user_id != job.user_id {
            return Err(SearchJobError::Unauthorized);
        }
        if !caller.account_eligible {
            return Err(SearchJobError::Ineligible);
        }
        if self.kill_switch {
            self.audit
                .log(AuditRecord {
                    user_id: Some(job.user_id),
                    job_id: Some(job.id),
                    ..AuditRecord::new(AuditAction::Blocked)
                })
                .await;
            return Err(SearchJobError::ComplianceBlocked);
        }

        let decision = self.rate_limiter.consume(&job.user_id.to_string(), RUN_COST);
        if !decision.allowed {
            self.audit
                .log(AuditRecord {
                    user_id: Some(job.user_id),
                    job_id: Some(job.id),
                    meta: Some(json!({ "remaining": decision.remaining })),
                    ..AuditRecord::new(AuditAction::RateLimited)
                })
                .await;
            return Err(SearchJobError::RateLimited);
        }

        let mut provider_requests: u32 = 0;
        match self.execute(&job, &mut provider_requests).await {
            Ok(summary) => {
                self.audit
                    .log(AuditRecord {
                        user_id: Some(job.user_id),
                        job_id: Some(job.id),
                        count: Some(summary.inserted_count as i64),
                        meta: Some(json!({
                            "found": summary.total_found,
                            "inserted": summary.inserted_count,
                        })),
                        ..AuditRecord::new(AuditAction::Completed)
                    })
                    .await;
                Ok(summary)
            }
            Err(err) => {
                if let Err(e) = self
                    .store
                    .update_run_state(job.id, JobStatus::Failed, 0)
                    .await
                {
                    log::error!("could not mark job {} FAILED: {:?}", job.id, e);
                }
                self.audit
                    .log(AuditRecord {
                        user_id: Some(job.user_id),
                        job_id: Some(job.id),
                        count: Some(provider_requests as i64),
                        meta: Some(json!({ "error": err.to_string() })),
                        ..AuditRecord::new(AuditAction::Failed)
                    })
                    .await;
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        job: &LeadJob,
        provider_requests: &mut u32,
    ) -> Result<RunSummary, SearchJobError> {
        self.store
            .update_run_state(job.id, JobStatus::Running, PROGRESS_STARTED)
            .await?;

        let params = job.search_params();
        let active = self.registry.active_providers(job.safe_mode);
        log::info!(
            "job {}: querying {} providers for {:?}",
            job.id,
            active.len(),
            params.keyword
        );

        // Bounded fan-out. `buffered` yields in input order, so aggregation
        // follows registration order and first-seen-wins dedup keeps
        // favoring earlier-registered providers.
        let outcomes: Vec<(Arc<dyn LeadProvider>, anyhow::Result<Vec<Value>>)> =
            stream::iter(active.into_iter().map(|provider| {
                let params = params.clone();
                async move {
                    let result = provider.search(&params).await;
                    (provider, result)
                }
            }))
            .buffered(PROVIDER_CONCURRENCY)
            .collect()
            .await;

        // Every active provider was queried by the time the stream drains.
        *provider_requests = outcomes.len() as u32;

        // Any captured failure fails the whole run.
        let mut aggregated: Vec<(Arc<dyn LeadProvider>, Vec<Value>)> = vec![];
        let mut total_found: u64 = 0;
        for (provider, outcome) in outcomes {
            match outcome {
                Ok(raw) => {
                    log::info!("job {}: {} returned {} items", job.id, provider.id(), raw.len());
                    total_found += raw.len() as u64;
                    aggregated.push((provider, raw));
                }
                Err(source) => {
                    return Err(SearchJobError::Provider {
                        provider: provider.id().to_string(),
                        source,
                    })
                }
            }
        }

        self.store
            .update_run_state(job.id, JobStatus::Running, PROGRESS_AGGREGATED)
            .await?;

        let mut leads: Vec<NormalizedLead> = vec![];
        for (provider, raw) in &aggregated {
            leads.extend(normalizer::normalize_provider_results(provider.as_ref(), raw));
        }

        let mut leads = deduper::dedupe(leads);
        leads.truncate(job.leads_target as usize);

        if let Some(enricher) = &self.enricher {
            let mut enriched = Vec::with_capacity(leads.len());
            for lead in leads {
                // Source provider's own hook first, then the inference call.
                let lead = match self.registry.get(&lead.source) {
                    Some(provider) => provider
                        .enrich(lead)
                        .await
                        .map_err(SearchJobError::Enrichment)?,
                    None => lead,
                };
                let lead = enricher
                    .enrich(lead, &params)
                    .await
                    .map_err(SearchJobError::Enrichment)?;
                enriched.push(lead);
            }
            leads = enriched;
        }

        backfill_email_guesses(&mut leads);

        self.store
            .update_run_state(job.id, JobStatus::Running, PROGRESS_PERSISTING)
            .await?;
        let inserted = self.store.insert_lead_results(job.id, &leads).await?;
        self.store
            .update_run_state(job.id, JobStatus::Completed, PROGRESS_DONE)
            .await?;

        log::info!(
            "job {}: completed, {} found, {} inserted",
            job.id,
            total_found,
            inserted
        );
        Ok(RunSummary {
            inserted_count: inserted,
            total_found,
        })
    }
}

/// Leads with a website but no email get an `info@<domain>` guess, marked
/// unverified in the notes.
fn backfill_email_guesses(leads: &mut [NormalizedLead]) {
    for lead in leads.iter_mut() {
        if lead.email.is_some() {
            continue;
        }
        if let Some(domain) = lead.website.as_deref().and_then(deduper::website_domain) {
            lead.email = Some(format!("info@{}", domain));
            lead.push_note("email is an unverified guess from the website domain");
        }
    }
}
