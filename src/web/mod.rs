// src/web/mod.rs

pub mod handlers;
pub mod services;
pub mod types;

pub use handlers::*;
pub use types::*;

use crate::auth::{AuthConfig, AuthenticatedUser, OptionalAuth};
use crate::database::{DatabaseConfig, SavedJob, SearchResult};
use crate::environment::EnvironmentConfig;
use anyhow::Result;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{catchers, delete, get, options, patch, post, routes, Request, Response, State};
use tracing::{error, info};

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PATCH, DELETE, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

// API Routes

#[post("/search", data = "<request>")]
pub async fn search_jobs(
    request: Json<SearchRequest>,
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<SearchResponse>, ApiError> {
    handlers::search_jobs_handler(request, auth, db_config).await
}

#[post("/jobs", data = "<request>")]
pub async fn save_job(
    request: Json<SaveJobRequest>,
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<SavedJob>, ApiError> {
    handlers::save_job_handler(request, auth, db_config).await
}

#[get("/jobs")]
pub async fn list_jobs(
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<Vec<SavedJob>>, ApiError> {
    handlers::list_jobs_handler(auth, db_config).await
}

#[get("/jobs/export")]
pub async fn export_jobs(
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<CsvDownload, ApiError> {
    handlers::export_jobs_handler(auth, db_config).await
}

#[patch("/jobs/<job_id>/status", data = "<request>")]
pub async fn update_job_status(
    job_id: String,
    request: Json<UpdateStatusRequest>,
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<StatusUpdateResponse>, ApiError> {
    handlers::update_job_status_handler(job_id, request, auth, db_config).await
}

#[patch("/jobs/<job_id>/notes", data = "<request>")]
pub async fn update_job_notes(
    job_id: String,
    request: Json<UpdateNotesRequest>,
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<ActionResponse>, ApiError> {
    handlers::update_job_notes_handler(job_id, request, auth, db_config).await
}

#[delete("/jobs/<job_id>")]
pub async fn delete_job(
    job_id: String,
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<ActionResponse>, ApiError> {
    handlers::delete_job_handler(job_id, auth, db_config).await
}

#[get("/searches")]
pub async fn list_searches(
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<Vec<SavedSearchSummary>>, ApiError> {
    handlers::list_searches_handler(auth, db_config).await
}

#[get("/searches/<search_id>/results")]
pub async fn search_results(
    search_id: String,
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<Vec<SearchResult>>, ApiError> {
    handlers::search_results_handler(search_id, auth, db_config).await
}

#[get("/searches/<search_id>/export")]
pub async fn export_search_results(
    search_id: String,
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<CsvDownload, ApiError> {
    handlers::export_search_results_handler(search_id, auth, db_config).await
}

#[get("/dashboard")]
pub async fn dashboard(
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<DashboardResponse>, ApiError> {
    handlers::dashboard_handler(auth, db_config).await
}

#[get("/me")]
pub async fn get_current_user(auth: AuthenticatedUser) -> Json<UserInfo> {
    handlers::get_current_user_handler(auth).await
}

#[get("/me", rank = 2)]
pub async fn get_current_user_error() -> ApiError {
    handlers::get_current_user_error_handler().await
}

#[get("/health")]
pub async fn health(auth: OptionalAuth) -> Json<&'static str> {
    handlers::health_handler(auth).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers

#[rocket::catch(400)]
pub fn bad_request() -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "Invalid request format".to_string(),
    })
}

#[rocket::catch(401)]
pub fn unauthorized() -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "Unauthorized".to_string(),
    })
}

#[rocket::catch(404)]
pub fn not_found() -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "Not found".to_string(),
    })
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "Internal server error".to_string(),
    })
}

// Main server start function
pub async fn start_web_server(config: EnvironmentConfig, port: u16) -> Result<()> {
    let mut db_config = DatabaseConfig::new(config.database_path.clone());

    if let Err(e) = db_config.init_pool().await {
        error!("Failed to initialize database: {}", e);
        return Err(e);
    }

    if let Err(e) = db_config.migrate().await {
        error!("Failed to run database migrations: {}", e);
        return Err(e);
    }

    let mut auth_config = AuthConfig::new(config.auth.clone());

    if let Err(e) = auth_config.update_signing_keys().await {
        error!("Failed to fetch identity provider keys: {}", e);
        return Err(e);
    }

    info!("Starting VisaHunt job search API server");
    info!("Database: {}", db_config.database_path.display());

    let figment = rocket::Config::figment().merge(("port", port));

    let _rocket = rocket::custom(figment)
        .attach(Cors)
        .manage(auth_config)
        .manage(db_config)
        .register(
            "/api",
            catchers![bad_request, unauthorized, not_found, internal_error],
        )
        .mount(
            "/api",
            routes![
                search_jobs,
                save_job,
                list_jobs,
                export_jobs,
                update_job_status,
                update_job_notes,
                delete_job,
                list_searches,
                search_results,
                export_search_results,
                dashboard,
                get_current_user,
                get_current_user_error,
                health,
                options,
            ],
        )
        .launch()
        .await;

    Ok(())
}
