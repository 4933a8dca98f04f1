use actix_web::{get, http::header, web, HttpRequest, HttpResponse};
use url::Url;

use crate::badge;
use crate::build_status::{resolve, BuildStatus};
use crate::error::{format_error_chain, AppError, AppResult};
use crate::metrics;
use crate::web::AppState;

/// Last non-empty segment of the part of the path after the route prefix
pub fn identifier(tail: &str) -> Option<&str> {
    tail.rsplit('/').find(|s| !s.is_empty())
}

/// Status for a request path; upstream failures become INTERNAL_ERROR and a
/// missing tag becomes STATUS_UNKNOWN so a badge can always be drawn.
async fn status_for(state: &AppState, tail: &str) -> BuildStatus {
    let Some(tag) = identifier(tail) else {
        log::error!("no tag specified in {:?}", tail);
        return BuildStatus::StatusUnknown;
    };

    match state.source.list_records(tag).await {
        Ok(records) => {
            let status = resolve(&records);
            log::info!("tag {} resolved to {}", tag, status);
            status
        }
        Err(e) => {
            log::error!("list builds for tag {}: {}", tag, format_error_chain(&e));
            metrics::record_upstream_failure();
            BuildStatus::InternalError
        }
    }
}

fn found(location: &Url) -> HttpResponse {
    HttpResponse::Found()
        .append_header((header::LOCATION, location.as_str()))
        .finish()
}

/// Redirect to a badge image for the latest conclusive build
#[get("/i/{tail:.*}")]
pub async fn badge_image(
    req: HttpRequest,
    tail: web::Path<String>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let status = status_for(&state, &tail).await;
    metrics::record_badge("image", &status);

    let url = badge::present(&status).image_url(&state.config.badge_url, req.query_string())?;
    Ok(found(&url))
}

/// Shields.io endpoint badge JSON for the latest conclusive build
#[get("/r/{tail:.*}")]
pub async fn badge_json(tail: web::Path<String>, state: web::Data<AppState>) -> HttpResponse {
    let status = status_for(&state, &tail).await;
    metrics::record_badge("json", &status);

    HttpResponse::Ok()
        .content_type("application/json")
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .json(badge::present(&status).document())
}

/// Redirect to the Cloud Build history page filtered to the tag
#[get("/l/{tail:.*}")]
pub async fn build_log(
    tail: web::Path<String>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let tag = identifier(&tail)
        .ok_or_else(|| AppError::InvalidInput(format!("no tag specified in {:?}", tail.as_str())))?;

    log::info!("tag {} redirected to build history", tag);
    Ok(found(&console_url(&state.config.console_url, &state.config.project, tag)?))
}

pub fn console_url(console: &Url, project: &str, tag: &str) -> AppResult<Url> {
    let mut url = console.join("cloud-build/builds")?;
    url.query_pairs_mut()
        .append_pair("project", project)
        .append_pair("query", &format!("tags=\"{}\"", tag));
    Ok(url)
}
