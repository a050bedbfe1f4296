// src/database.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

/// Searches granted to a profile created on first login.
pub const DEFAULT_FREE_SEARCHES: i64 = 3;

/// Application pipeline label on a saved job. Stored as TEXT; any label may
/// follow any other label, there is no enforced transition graph.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
pub enum JobStatus {
    Saved,
    Applied,
    Interview,
    Offer,
    Rejected,
}

impl JobStatus {
    pub const ALL: [JobStatus; 5] = [
        JobStatus::Saved,
        JobStatus::Applied,
        JobStatus::Interview,
        JobStatus::Offer,
        JobStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Saved => "Saved",
            JobStatus::Applied => "Applied",
            JobStatus::Interview => "Interview",
            JobStatus::Offer => "Offer",
            JobStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Saved" => Ok(JobStatus::Saved),
            "Applied" => Ok(JobStatus::Applied),
            "Interview" => Ok(JobStatus::Interview),
            "Offer" => Ok(JobStatus::Offer),
            "Rejected" => Ok(JobStatus::Rejected),
            other => anyhow::bail!(
                "Unknown job status: {}. Use Saved, Applied, Interview, Offer or Rejected",
                other
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    /// Identity provider subject claim.
    pub id: String,
    pub email: String,
    pub subscription_tier: String,
    pub subscription_status: String,
    pub searches_used: i64,
    pub total_searches_allowed: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_active(&self) -> bool {
        self.subscription_status == "active"
    }

    pub fn quota_exhausted(&self) -> bool {
        self.searches_used >= self.total_searches_allowed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SavedSearch {
    pub id: String,
    pub user_id: String,
    pub job_title: String,
    pub location: String,
    pub visa_only: bool,
    pub remote: bool,
    pub full_time: bool,
    pub part_time: bool,
    /// Source URLs, JSON-encoded array.
    pub job_urls: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_run: DateTime<Utc>,
}

impl SavedSearch {
    pub fn urls(&self) -> Vec<String> {
        serde_json::from_str(&self.job_urls).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SearchResult {
    pub id: String,
    pub user_id: String,
    pub search_id: String,
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub job_type: String,
    pub visa_sponsored: bool,
    pub remote: bool,
    pub url: String,
    pub date_posted: DateTime<Utc>,
    pub date_found: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SavedJob {
    pub id: String,
    pub user_id: String,
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub job_type: String,
    pub visa_sponsored: bool,
    pub remote: bool,
    pub url: String,
    pub date_posted: Option<DateTime<Utc>>,
    pub date_saved: DateTime<Utc>,
    pub notes: String,
    pub status: JobStatus,
}

#[derive(Debug)]
pub struct DatabaseConfig {
    pub database_path: PathBuf,
    pub pool: Option<SqlitePool>,
}

impl DatabaseConfig {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            database_path,
            pool: None,
        }
    }

    /// Initialize the database connection pool
    pub async fn init_pool(&mut self) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.database_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create database directory")?;
        }

        let database_url = format!("sqlite:{}?mode=rwc", self.database_path.display());

        let pool = SqlitePool::connect(&database_url)
            .await
            .context("Failed to connect to SQLite database")?;
        self.pool = Some(pool);

        info!("Database connection pool initialized: {}", database_url);
        Ok(())
    }

    /// Get the database pool
    pub fn pool(&self) -> Result<&SqlitePool> {
        self.pool.as_ref().ok_or_else(|| {
            anyhow::anyhow!("Database pool not initialized. Call init_pool() first.")
        })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        run_migrations(self.pool()?).await
    }
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL,
            subscription_tier TEXT NOT NULL DEFAULT 'free',
            subscription_status TEXT NOT NULL DEFAULT 'active',
            searches_used INTEGER NOT NULL DEFAULT 0,
            total_searches_allowed INTEGER NOT NULL DEFAULT 3,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_profiles_email
        ON profiles(email);
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS saved_searches (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            job_title TEXT NOT NULL DEFAULT '',
            location TEXT NOT NULL DEFAULT '',
            visa_only BOOLEAN NOT NULL DEFAULT TRUE,
            remote BOOLEAN NOT NULL DEFAULT FALSE,
            full_time BOOLEAN NOT NULL DEFAULT TRUE,
            part_time BOOLEAN NOT NULL DEFAULT FALSE,
            job_urls TEXT NOT NULL DEFAULT '[]',
            name TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            last_run TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_saved_searches_user
        ON saved_searches(user_id);
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS search_results (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            search_id TEXT NOT NULL REFERENCES saved_searches(id),
            job_title TEXT NOT NULL,
            company TEXT NOT NULL,
            location TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            job_type TEXT NOT NULL DEFAULT '',
            visa_sponsored BOOLEAN NOT NULL DEFAULT TRUE,
            remote BOOLEAN NOT NULL DEFAULT FALSE,
            url TEXT NOT NULL DEFAULT '',
            date_posted TEXT NOT NULL,
            date_found TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_search_results_search
        ON search_results(search_id);
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_search_results_user
        ON search_results(user_id);
        "#,
    )
    .execute(pool)
    .await?;

    // No uniqueness on (user_id, url): saving the same listing twice
    // intentionally produces two independent rows.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS saved_jobs (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            job_title TEXT NOT NULL,
            company TEXT NOT NULL,
            location TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            job_type TEXT NOT NULL DEFAULT '',
            visa_sponsored BOOLEAN NOT NULL DEFAULT TRUE,
            remote BOOLEAN NOT NULL DEFAULT FALSE,
            url TEXT NOT NULL DEFAULT '',
            date_posted TEXT,
            date_saved TEXT NOT NULL,
            notes TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'Saved'
                CHECK (status IN ('Saved', 'Applied', 'Interview', 'Offer', 'Rejected'))
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_saved_jobs_user
        ON saved_jobs(user_id);
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database migrations completed successfully");
    Ok(())
}

pub struct ProfileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProfileRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, email, subscription_tier, subscription_status,
                   searches_used, total_searches_allowed, created_at, updated_at
            FROM profiles
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(profile)
    }

    /// Fetch the profile for an authenticated identity, creating it with
    /// free-tier defaults on first login.
    pub async fn get_or_create(&self, id: &str, email: &str) -> Result<Profile> {
        if let Some(profile) = self.find_by_id(id).await? {
            return Ok(profile);
        }

        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO profiles
                (id, email, subscription_tier, subscription_status,
                 searches_used, total_searches_allowed, created_at, updated_at)
            VALUES (?, ?, 'free', 'active', 0, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(DEFAULT_FREE_SEARCHES)
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await?;

        info!("Created free-tier profile for: {}", email);

        Ok(Profile {
            id: id.to_string(),
            email: email.to_string(),
            subscription_tier: "free".to_string(),
            subscription_status: "active".to_string(),
            searches_used: 0,
            total_searches_allowed: DEFAULT_FREE_SEARCHES,
            created_at: now,
            updated_at: now,
        })
    }

    /// Set searches_used to one past the value read earlier in the request.
    /// Deliberately a read-then-write, not an atomic increment: two searches
    /// racing past the quota check can both land on the same counter value.
    pub async fn record_search_use(&self, id: &str, searches_used_before: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE profiles
            SET searches_used = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(searches_used_before + 1)
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    pub async fn set_plan(&self, email: &str, tier: &str, allowed: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET subscription_tier = ?, total_searches_allowed = ?, updated_at = ?
            WHERE email = ?
            "#,
        )
        .bind(tier)
        .bind(allowed)
        .bind(Utc::now())
        .bind(email)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn set_subscription_status(&self, email: &str, status: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET subscription_status = ?, updated_at = ?
            WHERE email = ?
            "#,
        )
        .bind(status)
        .bind(Utc::now())
        .bind(email)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Reset the monthly usage counter.
    pub async fn reset_usage(&self, email: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET searches_used = 0, updated_at = ?
            WHERE email = ?
            "#,
        )
        .bind(Utc::now())
        .bind(email)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_all(&self) -> Result<Vec<Profile>> {
        let profiles = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, email, subscription_tier, subscription_status,
                   searches_used, total_searches_allowed, created_at, updated_at
            FROM profiles
            ORDER BY email ASC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(profiles)
    }
}

/// Query parameters of one search invocation, as persisted.
pub struct NewSavedSearch<'a> {
    pub job_title: &'a str,
    pub location: &'a str,
    pub visa_only: bool,
    pub remote: bool,
    pub full_time: bool,
    pub part_time: bool,
    pub job_urls: &'a [String],
}

pub struct SavedSearchRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SavedSearchRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: &str, search: NewSavedSearch<'_>) -> Result<SavedSearch> {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();

        let title = if search.job_title.is_empty() {
            "Jobs"
        } else {
            search.job_title
        };
        let location = if search.location.is_empty() {
            "Anywhere"
        } else {
            search.location
        };
        let name = format!("{} in {}", title, location);

        let job_urls = serde_json::to_string(search.job_urls)?;

        sqlx::query(
            r#"
            INSERT INTO saved_searches
                (id, user_id, job_title, location, visa_only, remote,
                 full_time, part_time, job_urls, name, created_at, last_run)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(search.job_title)
        .bind(search.location)
        .bind(search.visa_only)
        .bind(search.remote)
        .bind(search.full_time)
        .bind(search.part_time)
        .bind(&job_urls)
        .bind(&name)
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(SavedSearch {
            id,
            user_id: user_id.to_string(),
            job_title: search.job_title.to_string(),
            location: search.location.to_string(),
            visa_only: search.visa_only,
            remote: search.remote,
            full_time: search.full_time,
            part_time: search.part_time,
            job_urls,
            name,
            created_at: now,
            last_run: now,
        })
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<SavedSearch>> {
        let searches = sqlx::query_as::<_, SavedSearch>(
            r#"
            SELECT id, user_id, job_title, location, visa_only, remote,
                   full_time, part_time, job_urls, name, created_at, last_run
            FROM saved_searches
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(searches)
    }

    pub async fn find_for_user(&self, id: &str, user_id: &str) -> Result<Option<SavedSearch>> {
        let search = sqlx::query_as::<_, SavedSearch>(
            r#"
            SELECT id, user_id, job_title, location, visa_only, remote,
                   full_time, part_time, job_urls, name, created_at, last_run
            FROM saved_searches
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(search)
    }
}

pub struct SearchResultRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SearchResultRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, result: &SearchResult) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO search_results
                (id, user_id, search_id, job_title, company, location,
                 description, job_type, visa_sponsored, remote, url,
                 date_posted, date_found)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&result.id)
        .bind(&result.user_id)
        .bind(&result.search_id)
        .bind(&result.job_title)
        .bind(&result.company)
        .bind(&result.location)
        .bind(&result.description)
        .bind(&result.job_type)
        .bind(result.visa_sponsored)
        .bind(result.remote)
        .bind(&result.url)
        .bind(result.date_posted)
        .bind(result.date_found)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_for_search(
        &self,
        search_id: &str,
        user_id: &str,
    ) -> Result<Vec<SearchResult>> {
        let results = sqlx::query_as::<_, SearchResult>(
            r#"
            SELECT id, user_id, search_id, job_title, company, location,
                   description, job_type, visa_sponsored, remote, url,
                   date_posted, date_found
            FROM search_results
            WHERE search_id = ? AND user_id = ?
            ORDER BY date_found DESC
            "#,
        )
        .bind(search_id)
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(results)
    }

    /// Result count per saved search, for the dashboard listing.
    pub async fn counts_by_search(&self, user_id: &str) -> Result<HashMap<String, i64>> {
        let rows = sqlx::query(
            r#"
            SELECT search_id, COUNT(*) AS result_count
            FROM search_results
            WHERE user_id = ?
            GROUP BY search_id
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let mut counts = HashMap::new();
        for row in rows {
            counts.insert(row.try_get("search_id")?, row.try_get("result_count")?);
        }

        Ok(counts)
    }
}

/// Displayable attributes of a job a user wants to track.
pub struct NewSavedJob<'a> {
    pub job_title: &'a str,
    pub company: &'a str,
    pub location: &'a str,
    pub description: &'a str,
    pub job_type: &'a str,
    pub visa_sponsored: bool,
    pub remote: bool,
    pub url: &'a str,
    pub date_posted: Option<DateTime<Utc>>,
}

pub struct SavedJobRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SavedJobRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new tracked job. No duplicate check: saving the same listing
    /// twice produces two independent rows.
    pub async fn create(&self, user_id: &str, job: NewSavedJob<'_>) -> Result<SavedJob> {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO saved_jobs
                (id, user_id, job_title, company, location, description,
                 job_type, visa_sponsored, remote, url, date_posted,
                 date_saved, notes, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, '', 'Saved')
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(job.job_title)
        .bind(job.company)
        .bind(job.location)
        .bind(job.description)
        .bind(job.job_type)
        .bind(job.visa_sponsored)
        .bind(job.remote)
        .bind(job.url)
        .bind(job.date_posted)
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(SavedJob {
            id,
            user_id: user_id.to_string(),
            job_title: job.job_title.to_string(),
            company: job.company.to_string(),
            location: job.location.to_string(),
            description: job.description.to_string(),
            job_type: job.job_type.to_string(),
            visa_sponsored: job.visa_sponsored,
            remote: job.remote,
            url: job.url.to_string(),
            date_posted: job.date_posted,
            date_saved: now,
            notes: String::new(),
            status: JobStatus::Saved,
        })
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<SavedJob>> {
        let jobs = sqlx::query_as::<_, SavedJob>(
            r#"
            SELECT id, user_id, job_title, company, location, description,
                   job_type, visa_sponsored, remote, url, date_posted,
                   date_saved, notes, status
            FROM saved_jobs
            WHERE user_id = ?
            ORDER BY date_saved DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(jobs)
    }

    pub async fn find_for_user(&self, id: &str, user_id: &str) -> Result<Option<SavedJob>> {
        let job = sqlx::query_as::<_, SavedJob>(
            r#"
            SELECT id, user_id, job_title, company, location, description,
                   job_type, visa_sponsored, remote, url, date_posted,
                   date_saved, notes, status
            FROM saved_jobs
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(job)
    }

    pub async fn update_status(&self, id: &str, user_id: &str, status: JobStatus) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE saved_jobs
            SET status = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(status)
        .bind(id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn update_notes(&self, id: &str, user_id: &str, notes: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE saved_jobs
            SET notes = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(notes)
        .bind(id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: &str, user_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM saved_jobs
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    pub(crate) async fn test_pool() -> SqlitePool {
        // One connection: each pooled connection would otherwise get its own
        // in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory database");
        run_migrations(&pool).await.expect("migrations");
        pool
    }

    fn sample_job<'a>() -> NewSavedJob<'a> {
        NewSavedJob {
            job_title: "Backend Developer",
            company: "InnovateX",
            location: "Berlin, Germany",
            description: "Join our backend team to build scalable APIs.",
            job_type: "Full-time",
            visa_sponsored: true,
            remote: false,
            url: "https://example.com/job2",
            date_posted: None,
        }
    }

    #[tokio::test]
    async fn test_profile_get_or_create_defaults() {
        let pool = test_pool().await;
        let repo = ProfileRepository::new(&pool);

        let profile = repo.get_or_create("uid-1", "a@example.com").await.unwrap();
        assert_eq!(profile.subscription_tier, "free");
        assert_eq!(profile.subscription_status, "active");
        assert_eq!(profile.searches_used, 0);
        assert_eq!(profile.total_searches_allowed, DEFAULT_FREE_SEARCHES);

        // Second call returns the same row, not a new one
        let again = repo.get_or_create("uid-1", "a@example.com").await.unwrap();
        assert_eq!(again.id, profile.id);
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_record_search_use_is_read_then_write() {
        let pool = test_pool().await;
        let repo = ProfileRepository::new(&pool);

        let profile = repo.get_or_create("uid-1", "a@example.com").await.unwrap();
        repo.record_search_use(&profile.id, profile.searches_used)
            .await
            .unwrap();

        let after = repo.find_by_id("uid-1").await.unwrap().unwrap();
        assert_eq!(after.searches_used, 1);

        // A stale read value overwrites rather than increments
        repo.record_search_use(&profile.id, profile.searches_used)
            .await
            .unwrap();
        let after = repo.find_by_id("uid-1").await.unwrap().unwrap();
        assert_eq!(after.searches_used, 1);
    }

    #[tokio::test]
    async fn test_saving_identical_job_twice_creates_two_rows() {
        let pool = test_pool().await;
        let repo = SavedJobRepository::new(&pool);

        let first = repo.create("uid-1", sample_job()).await.unwrap();
        let second = repo.create("uid-1", sample_job()).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(repo.list_for_user("uid-1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_status_update_scoped_to_owner() {
        let pool = test_pool().await;
        let repo = SavedJobRepository::new(&pool);

        let job = repo.create("uid-1", sample_job()).await.unwrap();
        assert_eq!(job.status, JobStatus::Saved);

        // Any label may follow any other label
        assert!(repo
            .update_status(&job.id, "uid-1", JobStatus::Offer)
            .await
            .unwrap());
        assert!(repo
            .update_status(&job.id, "uid-1", JobStatus::Saved)
            .await
            .unwrap());

        // Another user cannot touch the row
        assert!(!repo
            .update_status(&job.id, "uid-2", JobStatus::Rejected)
            .await
            .unwrap());

        let current = repo.find_for_user(&job.id, "uid-1").await.unwrap().unwrap();
        assert_eq!(current.status, JobStatus::Saved);
    }

    #[tokio::test]
    async fn test_notes_update_scoped_to_owner() {
        let pool = test_pool().await;
        let repo = SavedJobRepository::new(&pool);

        let job = repo.create("uid-1", sample_job()).await.unwrap();

        assert!(!repo
            .update_notes(&job.id, "uid-2", "mine now")
            .await
            .unwrap());
        assert!(!repo.update_notes("missing", "uid-1", "ghost").await.unwrap());
        assert!(repo
            .update_notes(&job.id, "uid-1", "phone screen Friday")
            .await
            .unwrap());

        let current = repo.find_for_user(&job.id, "uid-1").await.unwrap().unwrap();
        assert_eq!(current.notes, "phone screen Friday");
    }

    #[tokio::test]
    async fn test_delete_scoped_to_owner() {
        let pool = test_pool().await;
        let repo = SavedJobRepository::new(&pool);

        let job = repo.create("uid-1", sample_job()).await.unwrap();

        // A foreign delete attempt leaves the row in place
        assert!(!repo.delete(&job.id, "uid-2").await.unwrap());
        assert!(repo.find_for_user(&job.id, "uid-1").await.unwrap().is_some());

        assert!(!repo.delete("missing", "uid-1").await.unwrap());

        assert!(repo.delete(&job.id, "uid-1").await.unwrap());
        assert!(repo.find_for_user(&job.id, "uid-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_counts_by_search() {
        let pool = test_pool().await;
        let searches = SavedSearchRepository::new(&pool);
        let results = SearchResultRepository::new(&pool);

        let search = searches
            .create(
                "uid-1",
                NewSavedSearch {
                    job_title: "Engineer",
                    location: "Berlin",
                    visa_only: true,
                    remote: false,
                    full_time: true,
                    part_time: false,
                    job_urls: &[],
                },
            )
            .await
            .unwrap();

        assert_eq!(search.name, "Engineer in Berlin");

        for listing in crate::listings::mock_listings("Engineer", "Berlin", false) {
            results
                .insert(&listing.into_search_result("uid-1", &search.id))
                .await
                .unwrap();
        }

        let counts = results.counts_by_search("uid-1").await.unwrap();
        assert_eq!(counts.get(&search.id), Some(&3));
    }

    #[tokio::test]
    async fn test_empty_title_and_location_fall_back_in_name() {
        let pool = test_pool().await;
        let searches = SavedSearchRepository::new(&pool);

        let search = searches
            .create(
                "uid-1",
                NewSavedSearch {
                    job_title: "",
                    location: "",
                    visa_only: true,
                    remote: false,
                    full_time: true,
                    part_time: false,
                    job_urls: &["https://example.com/board".to_string()],
                },
            )
            .await
            .unwrap();

        assert_eq!(search.name, "Jobs in Anywhere");
        assert_eq!(search.urls(), vec!["https://example.com/board"]);
    }
}
