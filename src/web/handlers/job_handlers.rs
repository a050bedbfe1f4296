// src/web/handlers/job_handlers.rs
use crate::app_log;
use crate::auth::AuthenticatedUser;
use crate::database::{DatabaseConfig, JobStatus, NewSavedJob, SavedJob, SavedJobRepository};
use crate::export;
use crate::web::types::{
    ActionResponse, ApiError, CsvDownload, SaveJobRequest, StatusUpdateResponse,
    UpdateNotesRequest, UpdateStatusRequest,
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

pub async fn save_job_handler(
    request: Json<SaveJobRequest>,
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<SavedJob>, ApiError> {
    let pool = pool(db_config)?;
    let repo = SavedJobRepository::new(pool);

    let job = repo
        .create(
            auth.user_id(),
            NewSavedJob {
                job_title: &request.title,
                company: &request.company,
                location: &request.location,
                description: request.description.as_deref().unwrap_or(""),
                job_type: request.job_type.as_deref().unwrap_or(""),
                visa_sponsored: request.visa_sponsored.unwrap_or(true),
                remote: request.remote.unwrap_or(false),
                url: request.url.as_deref().unwrap_or(""),
                date_posted: request.posted_date,
            },
        )
        .await
        .map_err(|e| {
            app_log!(error, "Failed to save job for {}: {}", auth.email(), e);
            ApiError::Internal("Failed to save job".to_string())
        })?;

    app_log!(
        info,
        "User {} saved job '{}' at {}",
        auth.email(),
        job.job_title,
        job.company
    );

    Ok(Json(job))
}

pub async fn list_jobs_handler(
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<Vec<SavedJob>>, ApiError> {
    let pool = pool(db_config)?;

    let jobs = SavedJobRepository::new(pool)
        .list_for_user(auth.user_id())
        .await
        .map_err(|e| {
            app_log!(error, "Failed to list saved jobs: {}", e);
            ApiError::Internal("Failed to list saved jobs".to_string())
        })?;

    Ok(Json(jobs))
}

pub async fn update_job_status_handler(
    job_id: String,
    request: Json<UpdateStatusRequest>,
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<StatusUpdateResponse>, ApiError> {
    let status: JobStatus = request
        .status
        .parse()
        .map_err(|e: anyhow::Error| ApiError::BadRequest(e.to_string()))?;

    let pool = pool(db_config)?;

    let updated = SavedJobRepository::new(pool)
        .update_status(&job_id, auth.user_id(), status)
        .await
        .map_err(|e| {
            app_log!(error, "Failed to update job status: {}", e);
            ApiError::Internal("Failed to update job status".to_string())
        })?;

    if !updated {
        return Err(ApiError::NotFound("Job not found".to_string()));
    }

    app_log!(
        info,
        "User {} moved job {} to {}",
        auth.email(),
        job_id,
        status
    );

    Ok(Json(StatusUpdateResponse { job_id, status }))
}

pub async fn update_job_notes_handler(
    job_id: String,
    request: Json<UpdateNotesRequest>,
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<ActionResponse>, ApiError> {
    let pool = pool(db_config)?;

    let updated = SavedJobRepository::new(pool)
        .update_notes(&job_id, auth.user_id(), &request.notes)
        .await
        .map_err(|e| {
            app_log!(error, "Failed to update job notes: {}", e);
            ApiError::Internal("Failed to update job notes".to_string())
        })?;

    if !updated {
        return Err(ApiError::NotFound("Job not found".to_string()));
    }

    Ok(Json(ActionResponse {
        success: true,
        message: "Notes updated".to_string(),
    }))
}

pub async fn delete_job_handler(
    job_id: String,
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<ActionResponse>, ApiError> {
    let pool = pool(db_config)?;

    let deleted = SavedJobRepository::new(pool)
        .delete(&job_id, auth.user_id())
        .await
        .map_err(|e| {
            app_log!(error, "Failed to delete saved job: {}", e);
            ApiError::Internal("Failed to delete saved job".to_string())
        })?;

    if !deleted {
        return Err(ApiError::NotFound("Job not found".to_string()));
    }

    app_log!(info, "User {} deleted saved job {}", auth.email(), job_id);

    Ok(Json(ActionResponse {
        success: true,
        message: "Job deleted".to_string(),
    }))
}

pub async fn export_jobs_handler(
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<CsvDownload, ApiError> {
    let pool = pool(db_config)?;

    let jobs = SavedJobRepository::new(pool)
        .list_for_user(auth.user_id())
        .await
        .map_err(|e| {
            app_log!(error, "Failed to load jobs for export: {}", e);
            ApiError::Internal("Failed to export saved jobs".to_string())
        })?;

    let csv = export::saved_jobs_csv(&jobs).map_err(|e| {
        app_log!(error, "CSV serialization failed: {}", e);
        ApiError::Internal("Failed to export saved jobs".to_string())
    })?;

    Ok(match csv {
        Some(data) => CsvDownload::File {
            data,
            filename: export::export_filename("saved_jobs"),
        },
        None => CsvDownload::Empty,
    })
}
