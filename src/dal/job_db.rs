use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{JobStatus, LeadJob};

#[derive(sqlx::FromRow)]
struct LeadJobRow {
    id: Uuid,
    user_id: Uuid,
    keyword: String,
    context: Option<String>,
    country: Option<String>,
    state: Option<String>,
    city: Option<String>,
    industry: Option<String>,
    size: Option<String>,
    leads_target: i32,
    safe_mode: bool,
    status: String,
    progress: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LeadJobRow {
    fn into_job(self) -> anyhow::Result<LeadJob> {
        let status = JobStatus::parse(&self.status)
            .with_context(|| format!("unknown job status {:?} for job {}", self.status, self.id))?;
        Ok(LeadJob {
            id: self.id,
            user_id: self.user_id,
            keyword: self.keyword,
            context: self.context,
            country: self.country,
            state: self.state,
            city: self.city,
            industry: self.industry,
            size: self.size,
            leads_target: self.leads_target.max(0) as u32,
            safe_mode: self.safe_mode,
            status,
            progress: self.progress,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub async fn fetch_job(job_id: Uuid, pool: &PgPool) -> anyhow::Result<Option<LeadJob>> {
    let row: Option<LeadJobRow> = sqlx::query_as(
        r#"
        select
            id, user_id, keyword, context, country, state, city,
            industry, size, leads_target, safe_mode, status, progress,
            created_at, updated_at
        from
            lead_job
        where
            id = $1
        "#,
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await?;

    row.map(LeadJobRow::into_job).transpose()
}

pub async fn insert_job(job: &LeadJob, pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        insert into lead_job
            (id, user_id, keyword, context, country, state, city,
             industry, size, leads_target, safe_mode, status, progress,
             created_at, updated_at)
        values
            ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        "#,
    )
    .bind(job.id)
    .bind(job.user_id)
    .bind(&job.keyword)
    .bind(&job.context)
    .bind(&job.country)
    .bind(&job.state)
    .bind(&job.city)
    .bind(&job.industry)
    .bind(&job.size)
    .bind(job.leads_target as i32)
    .bind(job.safe_mode)
    .bind(job.status.as_str())
    .bind(job.progress)
    .bind(job.created_at)
    .bind(job.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn update_run_state(
    job_id: Uuid,
    status: JobStatus,
    progress: i32,
    pool: &PgPool,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        update lead_job set
            status = $2,
            progress = $3,
            updated_at = now()
        where
            id = $1
        "#,
    )
    .bind(job_id)
    .bind(status.as_str())
    .bind(progress)
    .execute(pool)
    .await?;

    Ok(())
}
