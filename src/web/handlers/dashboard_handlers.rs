// src/web/handlers/dashboard_handlers.rs
use crate::app_log;
use crate::auth::AuthenticatedUser;
use crate::database::{
    DatabaseConfig, SavedJobRepository, SavedSearchRepository, SearchResult,
    SearchResultRepository,
};
use crate::export;
use crate::stats;
use crate::web::types::{
    ApiError, CsvDownload, DashboardResponse, ProfileSummary, SavedSearchSummary,
    SearchParamsSummary, UsageSummary,
};
use rocket::serde::json::Json;
use rocket::State;
use sqlx::SqlitePool;

fn pool<'a>(db_config: &'a State<DatabaseConfig>) -> Result<&'a SqlitePool, ApiError> {
    db_config.pool().map_err(|e| {
        app_log!(error, "Database connection failed: {}", e);
        ApiError::Internal("Database error occurred".to_string())
    })
}

/// Recomputed from the rows on every request; nothing is cached.
pub async fn dashboard_handler(
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let pool = pool(db_config)?;

    let jobs = SavedJobRepository::new(pool)
        .list_for_user(auth.user_id())
        .await
        .map_err(|e| {
            app_log!(error, "Failed to load saved jobs: {}", e);
            ApiError::Internal("Failed to load dashboard".to_string())
        })?;

    let profile = auth.profile();

    Ok(Json(DashboardResponse {
        profile: ProfileSummary::from(profile),
        total_jobs: jobs.len() as i64,
        status_counts: stats::status_distribution(&jobs),
        usage: UsageSummary {
            searches_used: profile.searches_used,
            total_searches_allowed: profile.total_searches_allowed,
            percent: stats::usage_percent(profile.searches_used, profile.total_searches_allowed),
        },
    }))
}

pub async fn list_searches_handler(
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<Vec<SavedSearchSummary>>, ApiError> {
    let pool = pool(db_config)?;

    let searches = SavedSearchRepository::new(pool)
        .list_for_user(auth.user_id())
        .await
        .map_err(|e| {
            app_log!(error, "Failed to list saved searches: {}", e);
            ApiError::Internal("Failed to list saved searches".to_string())
        })?;

    let counts = SearchResultRepository::new(pool)
        .counts_by_search(auth.user_id())
        .await
        .map_err(|e| {
            app_log!(error, "Failed to count search results: {}", e);
            ApiError::Internal("Failed to list saved searches".to_string())
        })?;

    let summaries = searches
        .into_iter()
        .map(|search| SavedSearchSummary {
            results: counts.get(&search.id).copied().unwrap_or(0),
            name: search.name.clone(),
            job_title: search.job_title.clone(),
            location: search.location.clone(),
            date: search.created_at,
            params: SearchParamsSummary {
                job_title: search.job_title,
                location: search.location,
                visa_only: search.visa_only,
                remote: search.remote,
            },
            id: search.id,
        })
        .collect();

    Ok(Json(summaries))
}

pub async fn search_results_handler(
    search_id: String,
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<Vec<SearchResult>>, ApiError> {
    let pool = pool(db_config)?;

    let results = load_results(pool, &search_id, auth.user_id()).await?;
    Ok(Json(results))
}

pub async fn export_search_results_handler(
    search_id: String,
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<CsvDownload, ApiError> {
    let pool = pool(db_config)?;

    let results = load_results(pool, &search_id, auth.user_id()).await?;

    let csv = export::search_results_csv(&results).map_err(|e| {
        app_log!(error, "CSV serialization failed: {}", e);
        ApiError::Internal("Failed to export search results".to_string())
    })?;

    Ok(match csv {
        Some(data) => CsvDownload::File {
            data,
            filename: export::export_filename("search_results"),
        },
        None => CsvDownload::Empty,
    })
}

async fn load_results(
    pool: &SqlitePool,
    search_id: &str,
    user_id: &str,
) -> Result<Vec<SearchResult>, ApiError> {
    let search = SavedSearchRepository::new(pool)
        .find_for_user(search_id, user_id)
        .await
        .map_err(|e| {
            app_log!(error, "Failed to load saved search: {}", e);
            ApiError::Internal("Failed to load search results".to_string())
        })?;

    if search.is_none() {
        return Err(ApiError::NotFound("Search not found".to_string()));
    }

    SearchResultRepository::new(pool)
        .list_for_search(search_id, user_id)
        .await
        .map_err(|e| {
            app_log!(error, "Failed to load search results: {}", e);
            ApiError::Internal("Failed to load search results".to_string())
        })
}
