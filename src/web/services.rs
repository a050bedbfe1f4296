// src/web/services.rs
use crate::app_log;
use crate::database::{
    NewSavedSearch, Profile, ProfileRepository, SavedSearch, SavedSearchRepository, SearchResult,
    SearchResultRepository,
};
use crate::listings;
use crate::web::types::SearchRequest;
use sqlx::SqlitePool;

pub struct SearchOutcome {
    pub search: SavedSearch,
    pub results: Vec<SearchResult>,
}

#[derive(Debug)]
pub enum SearchError {
    /// Subscription status is anything other than active.
    SubscriptionInactive,
    /// Monthly search allowance is used up.
    QuotaExceeded,
    Database(anyhow::Error),
}

impl From<anyhow::Error> for SearchError {
    fn from(e: anyhow::Error) -> Self {
        SearchError::Database(e)
    }
}

/// Run one quota-gated search for an already-authenticated profile.
///
/// The entitlement check uses the profile as read at authentication time and
/// the final usage write sets the counter to that read value plus one. The
/// saved-search insert, the result inserts and the counter update run as
/// separate statements with no transaction: a mid-sequence failure leaves
/// earlier writes in place.
pub async fn run_job_search(
    pool: &SqlitePool,
    profile: &Profile,
    request: &SearchRequest,
) -> Result<SearchOutcome, SearchError> {
    if !profile.is_active() {
        return Err(SearchError::SubscriptionInactive);
    }

    if profile.quota_exhausted() {
        return Err(SearchError::QuotaExceeded);
    }

    let job_urls = request.cleaned_urls();

    let search = SavedSearchRepository::new(pool)
        .create(
            &profile.id,
            NewSavedSearch {
                job_title: &request.job_title,
                location: &request.location,
                visa_only: request.visa_only,
                remote: request.remote,
                full_time: request.full_time,
                part_time: request.part_time,
                job_urls: &job_urls,
            },
        )
        .await?;

    let result_repo = SearchResultRepository::new(pool);
    let mut results = Vec::new();
    for listing in listings::mock_listings(&request.job_title, &request.location, request.remote) {
        let result = listing.into_search_result(&profile.id, &search.id);
        result_repo.insert(&result).await?;
        results.push(result);
    }

    // A lost counter update under-counts usage but never fails the search
    if let Err(e) = ProfileRepository::new(pool)
        .record_search_use(&profile.id, profile.searches_used)
        .await
    {
        app_log!(error, "Failed to update searches_used: {}", e);
    }

    app_log!(
        info,
        "Search '{}' completed for {} with {} results",
        search.name,
        profile.email,
        results.len()
    );

    Ok(SearchOutcome { search, results })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::tests::test_pool;
    use crate::database::SavedJobRepository;

    fn engineer_in_berlin() -> SearchRequest {
        SearchRequest {
            job_title: "Engineer".to_string(),
            location: "Berlin".to_string(),
            job_urls: vec![],
            visa_only: true,
            remote: false,
            full_time: true,
            part_time: false,
        }
    }

    async fn profile_with_usage(
        pool: &SqlitePool,
        used: i64,
        allowed: i64,
        status: &str,
    ) -> Profile {
        let repo = ProfileRepository::new(pool);
        repo.get_or_create("uid-1", "a@example.com").await.unwrap();
        sqlx::query(
            "UPDATE profiles SET searches_used = ?, total_searches_allowed = ?, \
             subscription_status = ? WHERE id = 'uid-1'",
        )
        .bind(used)
        .bind(allowed)
        .bind(status)
        .execute(pool)
        .await
        .unwrap();
        repo.find_by_id("uid-1").await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_quota_exhausted_rejects_without_writes() {
        let pool = test_pool().await;
        let profile = profile_with_usage(&pool, 3, 3, "active").await;

        let err = run_job_search(&pool, &profile, &engineer_in_berlin())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SearchError::QuotaExceeded));

        let searches = SavedSearchRepository::new(&pool)
            .list_for_user("uid-1")
            .await
            .unwrap();
        assert!(searches.is_empty());
        assert!(SearchResultRepository::new(&pool)
            .counts_by_search("uid-1")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_inactive_subscription_rejected_despite_remaining_quota() {
        let pool = test_pool().await;
        let profile = profile_with_usage(&pool, 0, 10, "canceled").await;

        let err = run_job_search(&pool, &profile, &engineer_in_berlin())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SearchError::SubscriptionInactive));

        let searches = SavedSearchRepository::new(&pool)
            .list_for_user("uid-1")
            .await
            .unwrap();
        assert!(searches.is_empty());
    }

    #[tokio::test]
    async fn test_successful_search_persists_one_search_and_all_results() {
        let pool = test_pool().await;
        let profile = profile_with_usage(&pool, 0, 3, "active").await;

        let outcome = run_job_search(&pool, &profile, &engineer_in_berlin())
            .await
            .unwrap();
        assert_eq!(outcome.results.len(), 3);
        assert_eq!(outcome.search.name, "Engineer in Berlin");

        let searches = SavedSearchRepository::new(&pool)
            .list_for_user("uid-1")
            .await
            .unwrap();
        assert_eq!(searches.len(), 1);

        let persisted = SearchResultRepository::new(&pool)
            .list_for_search(&outcome.search.id, "uid-1")
            .await
            .unwrap();
        assert_eq!(persisted.len(), outcome.results.len());

        let after = ProfileRepository::new(&pool)
            .find_by_id("uid-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.searches_used, 1);
    }

    #[tokio::test]
    async fn test_last_allowed_search_succeeds_then_next_is_rejected() {
        let pool = test_pool().await;
        let profile = profile_with_usage(&pool, 9, 10, "active").await;

        run_job_search(&pool, &profile, &engineer_in_berlin())
            .await
            .unwrap();

        let repo = ProfileRepository::new(&pool);
        let after = repo.find_by_id("uid-1").await.unwrap().unwrap();
        assert_eq!(after.searches_used, 10);

        let err = run_job_search(&pool, &after, &engineer_in_berlin())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SearchError::QuotaExceeded));
    }

    #[tokio::test]
    async fn test_search_results_stay_disconnected_from_saved_jobs() {
        let pool = test_pool().await;
        let profile = profile_with_usage(&pool, 0, 3, "active").await;

        let outcome = run_job_search(&pool, &profile, &engineer_in_berlin())
            .await
            .unwrap();

        // Saving a result copies its attributes into a brand new row
        let jobs = SavedJobRepository::new(&pool);
        let result = &outcome.results[0];
        let saved = jobs
            .create(
                "uid-1",
                crate::database::NewSavedJob {
                    job_title: &result.job_title,
                    company: &result.company,
                    location: &result.location,
                    description: &result.description,
                    job_type: &result.job_type,
                    visa_sponsored: result.visa_sponsored,
                    remote: result.remote,
                    url: &result.url,
                    date_posted: Some(result.date_posted),
                },
            )
            .await
            .unwrap();

        assert_ne!(saved.id, result.id);
        assert_eq!(saved.job_title, result.job_title);
    }
}
