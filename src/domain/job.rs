use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::lead::{NormalizedLead, SearchParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "QUEUED",
            JobStatus::Running => "RUNNING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }

    pub fn parse(value: &str) -> Option<JobStatus> {
        match value {
            "QUEUED" => Some(JobStatus::Queued),
            "RUNNING" => Some(JobStatus::Running),
            "COMPLETED" => Some(JobStatus::Completed),
            "FAILED" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

/// One persisted search brief plus its run state.
#[derive(Debug, Clone, Serialize)]
pub struct LeadJob {
    pub id: Uuid,
    pub user_id: Uuid,
    pub keyword: String,
    pub context: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub leads_target: u32,
    pub safe_mode: bool,
    pub status: JobStatus,
    pub progress: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LeadJob {
    pub fn search_params(&self) -> SearchParams {
        SearchParams {
            keyword: self.keyword.clone(),
            context: self.context.clone(),
            country: self.country.clone(),
            state: self.state.clone(),
            city: self.city.clone(),
            industry: self.industry.clone(),
            size: self.size.clone(),
            limit: self.leads_target,
        }
    }
}

/// A lead as persisted for one job. `hidden`/`archived` belong to the UI
/// layer; the pipeline writes them false and never touches the row again.
#[derive(Debug, Clone, Serialize)]
pub struct LeadResult {
    pub id: Uuid,
    pub job_id: Uuid,
    pub lead: NormalizedLead,
    pub hidden: bool,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
}

/// What one successful run reports back to the caller.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub inserted_count: u64,
    pub total_found: u64,
}
