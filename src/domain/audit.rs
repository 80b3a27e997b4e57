use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Blocked,
    RateLimited,
    Completed,
    Failed,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Blocked => "blocked",
            AuditAction::RateLimited => "rate_limited",
            AuditAction::Completed => "completed",
            AuditAction::Failed => "failed",
        }
    }
}

/// Immutable record of one pipeline lifecycle event.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub job_id: Option<Uuid>,
    pub action: AuditAction,
    pub provider_id: Option<String>,
    pub count: Option<i64>,
    pub meta: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(action: AuditAction) -> Self {
        AuditRecord {
            id: Uuid::new_v4(),
            user_id: None,
            job_id: None,
            action,
            provider_id: None,
            count: None,
            meta: None,
            created_at: Utc::now(),
        }
    }
}
