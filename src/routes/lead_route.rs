use actix_web::{get, http::StatusCode, post, web, HttpRequest, HttpResponse, ResponseError};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    dal::JobStore,
    domain::{JobStatus, LeadJob},
    services::{RunCaller, SearchJobError, SearchPipeline},
};

/// Transport mapping for the pipeline's error surface. The pipeline itself
/// only reports variants; status codes are this layer's concern.
impl ResponseError for SearchJobError {
    fn status_code(&self) -> StatusCode {
        match self {
            SearchJobError::JobNotFound(_) => StatusCode::NOT_FOUND,
            SearchJobError::Unauthorized
            | SearchJobError::Ineligible
            | SearchJobError::ComplianceBlocked => StatusCode::FORBIDDEN,
            SearchJobError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            SearchJobError::Provider { .. } | SearchJobError::Enrichment(_) => {
                StatusCode::BAD_GATEWAY
            }
            SearchJobError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Authentication is an external collaborator; until it fronts this
/// service, the resolved caller arrives in headers.
fn caller_from_headers(req: &HttpRequest) -> Result<RunCaller, actix_web::Error> {
    let user_id = req
        .headers()
        .get("X-User-Id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or_else(|| actix_web::error::ErrorUnauthorized("missing or invalid X-User-Id"))?;

    let flag = |name: &str, default: bool| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(default)
    };

    Ok(RunCaller {
        user_id,
        is_admin: flag("X-Admin", false),
        account_eligible: flag("X-Eligible", true),
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobBody {
    keyword: String,
    context: Option<String>,
    country: Option<String>,
    state: Option<String>,
    city: Option<String>,
    industry: Option<String>,
    size: Option<String>,
    leads_target: u32,
    #[serde(default)]
    safe_mode: bool,
}

#[post("/jobs")]
async fn create_job(
    pipeline: web::Data<SearchPipeline>,
    body: web::Json<CreateJobBody>,
    req: HttpRequest,
) -> Result<HttpResponse, actix_web::Error> {
    let caller = caller_from_headers(&req)?;
    let body = body.into_inner();

    if body.keyword.trim().is_empty() || body.leads_target == 0 {
        return Ok(HttpResponse::BadRequest().body("keyword and a positive leadsTarget required"));
    }

    let now = Utc::now();
    let job = LeadJob {
        id: Uuid::new_v4(),
        user_id: caller.user_id,
        keyword: body.keyword,
        context: body.context,
        country: body.country,
        state: body.state,
        city: body.city,
        industry: body.industry,
        size: body.size,
        leads_target: body.leads_target,
        safe_mode: body.safe_mode,
        status: JobStatus::Queued,
        progress: 0,
        created_at: now,
        updated_at: now,
    };

    pipeline
        .store()
        .create_job(&job)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::Created().json(job))
}

#[post("/jobs/{job_id}/run")]
async fn run_job(
    pipeline: web::Data<SearchPipeline>,
    path: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<HttpResponse, actix_web::Error> {
    let caller = caller_from_headers(&req)?;
    let summary = pipeline.run(path.into_inner(), &caller).await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[get("/jobs/{job_id}")]
async fn get_job(
    pipeline: web::Data<SearchPipeline>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, actix_web::Error> {
    let job = pipeline
        .store()
        .fetch_job(path.into_inner())
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    match job {
        Some(job) => Ok(HttpResponse::Ok().json(job)),
        None => Ok(HttpResponse::NotFound().finish()),
    }
}

#[get("/jobs/{job_id}/results")]
async fn list_results(
    pipeline: web::Data<SearchPipeline>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, actix_web::Error> {
    let results = pipeline
        .store()
        .fetch_results(path.into_inner())
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;
    Ok(HttpResponse::Ok().json(results))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_variants_map_to_transport_codes() {
        assert_eq!(
            SearchJobError::JobNotFound(Uuid::new_v4()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            SearchJobError::Unauthorized.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            SearchJobError::RateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            SearchJobError::Provider {
                provider: "yelp".to_string(),
                source: anyhow::anyhow!("boom"),
            }
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            SearchJobError::Storage(anyhow::anyhow!("db down")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
