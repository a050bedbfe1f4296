// src/web/handlers/search_handlers.rs
use crate::app_log;
use crate::auth::AuthenticatedUser;
use crate::database::DatabaseConfig;
use crate::web::services::{self, SearchError};
use crate::web::types::{ApiError, SearchRequest, SearchResponse};
use rocket::serde::json::Json;
use rocket::State;

pub async fn search_jobs_handler(
    request: Json<SearchRequest>,
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<SearchResponse>, ApiError> {
    if let Err(message) = request.validate() {
        app_log!(warn, "Rejected search payload from {}: {}", auth.email(), message);
        return Err(ApiError::BadRequest(message));
    }

    let pool = db_config.pool().map_err(|e| {
        app_log!(error, "Database connection failed: {}", e);
        ApiError::Internal("Database error occurred".to_string())
    })?;

    app_log!(
        info,
        "Search '{}' in '{}' requested by {} ({}/{} searches used)",
        request.job_title,
        request.location,
        auth.email(),
        auth.profile().searches_used,
        auth.profile().total_searches_allowed
    );

    match services::run_job_search(pool, auth.profile(), &request).await {
        Ok(outcome) => Ok(Json(SearchResponse {
            success: true,
            message: "Job search completed".to_string(),
            results: outcome.results,
            search_id: outcome.search.id,
        })),
        Err(SearchError::SubscriptionInactive) => Err(ApiError::Forbidden(
            "Subscription is not active".to_string(),
        )),
        Err(SearchError::QuotaExceeded) => Err(ApiError::Forbidden(
            "Search limit reached. Please upgrade your plan.".to_string(),
        )),
        Err(SearchError::Database(e)) => {
            app_log!(error, "Search failed for {}: {}", auth.email(), e);
            Err(ApiError::Internal(
                "Failed to complete job search".to_string(),
            ))
        }
    }
}
