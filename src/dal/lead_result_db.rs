use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::domain::{Address, LeadResult, NormalizedLead};

/// One transaction, one multi-row insert. Never called twice for the same
/// successful run.
pub async fn insert_lead_results(
    job_id: Uuid,
    leads: &[NormalizedLead],
    pool: &PgPool,
) -> anyhow::Result<u64> {
    if leads.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;

    let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
        "insert into lead_result \
         (id, job_id, business_name, website, phone, email, \
          address_line1, address_line2, city, state, postal_code, country, \
          source, source_url, industry, confidence, notes, raw, hidden, archived) ",
    );
    builder.push_values(leads.iter(), |mut b, lead| {
        b.push_bind(Uuid::new_v4())
            .push_bind(job_id)
            .push_bind(&lead.business_name)
            .push_bind(&lead.website)
            .push_bind(&lead.phone)
            .push_bind(&lead.email)
            .push_bind(&lead.address.line1)
            .push_bind(&lead.address.line2)
            .push_bind(&lead.address.city)
            .push_bind(&lead.address.state)
            .push_bind(&lead.address.postal_code)
            .push_bind(&lead.address.country)
            .push_bind(&lead.source)
            .push_bind(&lead.source_url)
            .push_bind(&lead.industry)
            .push_bind(lead.confidence)
            .push_bind(&lead.notes)
            .push_bind(&lead.raw)
            .push_bind(false)
            .push_bind(false);
    });

    let result = builder.build().execute(&mut *tx).await?;
    tx.commit().await?;

    Ok(result.rows_affected())
}

#[derive(sqlx::FromRow)]
struct LeadResultRow {
    id: Uuid,
    job_id: Uuid,
    business_name: String,
    website: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    address_line1: Option<String>,
    address_line2: Option<String>,
    city: Option<String>,
    state: Option<String>,
    postal_code: Option<String>,
    country: Option<String>,
    source: String,
    source_url: Option<String>,
    industry: Option<String>,
    confidence: Option<f64>,
    notes: Option<String>,
    raw: Option<Value>,
    hidden: bool,
    archived: bool,
    created_at: DateTime<Utc>,
}

impl From<LeadResultRow> for LeadResult {
    fn from(row: LeadResultRow) -> Self {
        LeadResult {
            id: row.id,
            job_id: row.job_id,
            lead: NormalizedLead {
                business_name: row.business_name,
                website: row.website,
                phone: row.phone,
                email: row.email,
                address: Address {
                    line1: row.address_line1,
                    line2: row.address_line2,
                    city: row.city,
                    state: row.state,
                    postal_code: row.postal_code,
                    country: row.country,
                },
                source: row.source,
                source_url: row.source_url,
                industry: row.industry,
                confidence: row.confidence,
                notes: row.notes,
                raw: row.raw,
            },
            hidden: row.hidden,
            archived: row.archived,
            created_at: row.created_at,
        }
    }
}

pub async fn fetch_results(job_id: Uuid, pool: &PgPool) -> anyhow::Result<Vec<LeadResult>> {
    let rows: Vec<LeadResultRow> = sqlx::query_as(
        r#"
        select
            id, job_id, business_name, website, phone, email,
            address_line1, address_line2, city, state, postal_code, country,
            source, source_url, industry, confidence, notes, raw,
            hidden, archived, created_at
        from
            lead_result
        where
            job_id = $1
        order by
            created_at
        "#,
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(LeadResult::from).collect())
}
