pub mod audit_db;
pub mod job_db;
pub mod lead_result_db;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{AuditRecord, JobStatus, LeadJob, LeadResult, NormalizedLead};

/// Persistence seam for the pipeline. Production uses Postgres; tests run
/// against an in-memory fake.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn fetch_job(&self, job_id: Uuid) -> anyhow::Result<Option<LeadJob>>;

    async fn create_job(&self, job: &LeadJob) -> anyhow::Result<()>;

    async fn update_run_state(
        &self,
        job_id: Uuid,
        status: JobStatus,
        progress: i32,
    ) -> anyhow::Result<()>;

    /// Bulk insert, one transaction. The pipeline calls this exactly once
    /// per successful run and never updates or deletes the rows afterwards.
    async fn insert_lead_results(
        &self,
        job_id: Uuid,
        leads: &[NormalizedLead],
    ) -> anyhow::Result<u64>;

    async fn fetch_results(&self, job_id: Uuid) -> anyhow::Result<Vec<LeadResult>>;

    async fn append_audit(&self, record: AuditRecord) -> anyhow::Result<()>;
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn fetch_job(&self, job_id: Uuid) -> anyhow::Result<Option<LeadJob>> {
        job_db::fetch_job(job_id, &self.pool).await
    }

    async fn create_job(&self, job: &LeadJob) -> anyhow::Result<()> {
        job_db::insert_job(job, &self.pool).await
    }

    async fn update_run_state(
        &self,
        job_id: Uuid,
        status: JobStatus,
        progress: i32,
    ) -> anyhow::Result<()> {
        job_db::update_run_state(job_id, status, progress, &self.pool).await
    }

    async fn insert_lead_results(
        &self,
        job_id: Uuid,
        leads: &[NormalizedLead],
    ) -> anyhow::Result<u64> {
        lead_result_db::insert_lead_results(job_id, leads, &self.pool).await
    }

    async fn fetch_results(&self, job_id: Uuid) -> anyhow::Result<Vec<LeadResult>> {
        lead_result_db::fetch_results(job_id, &self.pool).await
    }

    async fn append_audit(&self, record: AuditRecord) -> anyhow::Result<()> {
        audit_db::insert_audit(record, &self.pool).await
    }
}
