use sqlx::PgPool;

use crate::domain::AuditRecord;

pub async fn insert_audit(record: AuditRecord, pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        insert into audit_log
            (id, user_id, job_id, action, provider_id, count, meta, created_at)
        values
            ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(record.id)
    .bind(record.user_id)
    .bind(record.job_id)
    .bind(record.action.as_str())
    .bind(&record.provider_id)
    .bind(record.count)
    .bind(&record.meta)
    .bind(record.created_at)
    .execute(pool)
    .await?;

    Ok(())
}
