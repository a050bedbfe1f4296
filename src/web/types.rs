// src/web/types.rs
use crate::database::{JobStatus, Profile, SearchResult};
use chrono::{DateTime, Utc};
use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder};
use rocket::serde::{Deserialize, Serialize};
use rocket::{Request, Response};
use std::collections::HashMap;

/// Search invocation payload, camelCase on the wire.
#[derive(Debug, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct SearchRequest {
    #[serde(rename = "jobTitle")]
    pub job_title: String,
    pub location: String,
    #[serde(rename = "jobUrls", default)]
    pub job_urls: Vec<String>,
    #[serde(rename = "visaOnly", default = "default_true")]
    pub visa_only: bool,
    #[serde(default)]
    pub remote: bool,
    #[serde(rename = "fullTime", default = "default_true")]
    pub full_time: bool,
    #[serde(rename = "partTime", default)]
    pub part_time: bool,
}

fn default_true() -> bool {
    true
}

impl SearchRequest {
    /// Mirror of the form schema: short titles/locations and malformed source
    /// URLs never reach the pipeline. Length is checked on the raw value,
    /// whitespace included, as the submitting form does.
    pub fn validate(&self) -> Result<(), String> {
        if self.job_title.len() < 2 {
            return Err("Job title must be at least 2 characters".to_string());
        }
        if self.location.len() < 2 {
            return Err("Location must be at least 2 characters".to_string());
        }
        for url in &self.job_urls {
            if url.trim().is_empty() {
                continue;
            }
            if reqwest::Url::parse(url).is_err() {
                return Err(format!("Must be a valid URL: {}", url));
            }
        }
        Ok(())
    }

    /// Source URLs with blank entries dropped.
    pub fn cleaned_urls(&self) -> Vec<String> {
        self.job_urls
            .iter()
            .filter(|url| !url.trim().is_empty())
            .cloned()
            .collect()
    }
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct SearchResponse {
    pub success: bool,
    pub message: String,
    pub results: Vec<SearchResult>,
    pub search_id: String,
}

/// Save-job payload, matching the client mutation shape.
#[derive(Debug, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct SaveJobRequest {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: Option<String>,
    #[serde(rename = "jobType")]
    pub job_type: Option<String>,
    #[serde(rename = "visaSponsored")]
    pub visa_sponsored: Option<bool>,
    pub remote: Option<bool>,
    pub url: Option<String>,
    #[serde(rename = "postedDate")]
    pub posted_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct UpdateNotesRequest {
    pub notes: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StatusUpdateResponse {
    #[serde(rename = "jobId")]
    pub job_id: String,
    pub status: JobStatus,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct SearchParamsSummary {
    #[serde(rename = "jobTitle")]
    pub job_title: String,
    pub location: String,
    #[serde(rename = "visaOnly")]
    pub visa_only: bool,
    pub remote: bool,
}

/// One saved search with its result count, as the dashboard lists them.
#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct SavedSearchSummary {
    pub id: String,
    pub name: String,
    pub job_title: String,
    pub location: String,
    pub results: i64,
    pub date: DateTime<Utc>,
    pub params: SearchParamsSummary,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ProfileSummary {
    pub subscription_tier: String,
    pub subscription_status: String,
    pub searches_used: i64,
    pub total_searches_allowed: i64,
}

impl From<&Profile> for ProfileSummary {
    fn from(profile: &Profile) -> Self {
        Self {
            subscription_tier: profile.subscription_tier.clone(),
            subscription_status: profile.subscription_status.clone(),
            searches_used: profile.searches_used,
            total_searches_allowed: profile.total_searches_allowed,
        }
    }
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct UsageSummary {
    pub searches_used: i64,
    pub total_searches_allowed: i64,
    pub percent: f64,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DashboardResponse {
    pub profile: ProfileSummary,
    pub total_jobs: i64,
    pub status_counts: HashMap<String, i64>,
    pub usage: UsageSummary,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct UserInfo {
    pub uid: String,
    pub email: String,
    pub name: Option<String>,
    pub subscription_tier: String,
}

/// Wire error body: `{"error": "..."}` with the matching status code.
#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    Forbidden(String),
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::Unauthorized(_) => Status::Unauthorized,
            ApiError::Forbidden(_) => Status::Forbidden,
            ApiError::BadRequest(_) => Status::BadRequest,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::Internal(_) => Status::InternalServerError,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Internal(msg) => msg,
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let body = serde_json::to_vec(&ErrorBody {
            error: self.message().to_string(),
        })
        .map_err(|_| Status::InternalServerError)?;

        Response::build()
            .status(self.status())
            .header(ContentType::JSON)
            .sized_body(body.len(), std::io::Cursor::new(body))
            .ok()
    }
}

/// CSV attachment, or nothing at all when the exported list is empty.
pub enum CsvDownload {
    File { data: Vec<u8>, filename: String },
    Empty,
}

impl<'r> Responder<'r, 'static> for CsvDownload {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        match self {
            CsvDownload::File { data, filename } => Response::build()
                .header(ContentType::CSV)
                .raw_header(
                    "Content-Disposition",
                    format!("attachment; filename=\"{}\"", filename),
                )
                .sized_body(data.len(), std::io::Cursor::new(data))
                .ok(),
            CsvDownload::Empty => Response::build().status(Status::NoContent).ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_from(json: &str) -> SearchRequest {
        serde_json::from_str(json).expect("valid request JSON")
    }

    #[test]
    fn test_defaults_from_minimal_payload() {
        let request = request_from(r#"{"jobTitle": "Engineer", "location": "Berlin"}"#);
        assert!(request.visa_only);
        assert!(!request.remote);
        assert!(request.full_time);
        assert!(!request.part_time);
        assert!(request.job_urls.is_empty());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_short_title_and_location_rejected() {
        let request = request_from(r#"{"jobTitle": "E", "location": "Berlin"}"#);
        assert!(request.validate().unwrap_err().contains("Job title"));

        let request = request_from(r#"{"jobTitle": "Engineer", "location": "B"}"#);
        assert!(request.validate().unwrap_err().contains("Location"));

        // Whitespace counts toward the length, as in the submitting form
        let request = request_from(r#"{"jobTitle": "Engineer", "location": " B "}"#);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_url_entries_validated_and_blank_ones_dropped() {
        let request = request_from(
            r#"{"jobTitle": "Engineer", "location": "Berlin",
                "jobUrls": ["https://example.com/board", "", "  "]}"#,
        );
        assert!(request.validate().is_ok());
        assert_eq!(request.cleaned_urls(), vec!["https://example.com/board"]);

        let request = request_from(
            r#"{"jobTitle": "Engineer", "location": "Berlin", "jobUrls": ["not a url"]}"#,
        );
        assert!(request.validate().is_err());
    }
}
