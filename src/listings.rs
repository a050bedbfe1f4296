// src/listings.rs
//
// Stand-in for the job board crawler. A real implementation would fetch and
// classify listings from the submitted source URLs; until that exists the
// search pipeline fabricates a fixed set of sponsored listings tagged with
// the submitted criteria.

use crate::database::SearchResult;
use chrono::Utc;
use uuid::Uuid;

/// One fabricated listing, not yet tied to a user or search.
#[derive(Debug, Clone)]
pub struct MockListing {
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub job_type: String,
    pub visa_sponsored: bool,
    pub remote: bool,
    pub url: String,
}

impl MockListing {
    pub fn into_search_result(self, user_id: &str, search_id: &str) -> SearchResult {
        let now = Utc::now();
        SearchResult {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            search_id: search_id.to_string(),
            job_title: self.job_title,
            company: self.company,
            location: self.location,
            description: self.description,
            job_type: self.job_type,
            visa_sponsored: self.visa_sponsored,
            remote: self.remote,
            url: self.url,
            date_posted: now,
            date_found: now,
        }
    }
}

fn fallback<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() {
        default
    } else {
        value
    }
}

/// Fabricate the fixed result set for one search invocation. Every listing
/// is visa sponsored; the third one takes the submitted title and is always
/// remote.
pub fn mock_listings(job_title: &str, location: &str, remote: bool) -> Vec<MockListing> {
    vec![
        MockListing {
            job_title: "Senior Software Engineer".to_string(),
            company: "GlobalTech Solutions".to_string(),
            location: fallback(location, "Remote").to_string(),
            description: "We're looking for a senior software engineer with experience in \
                          cloud technologies. Visa sponsorship available."
                .to_string(),
            job_type: "Full-time".to_string(),
            visa_sponsored: true,
            remote,
            url: "https://example.com/job1".to_string(),
        },
        MockListing {
            job_title: "Backend Developer".to_string(),
            company: "InnovateX".to_string(),
            location: fallback(location, "Berlin, Germany").to_string(),
            description: "Join our backend team to build scalable APIs. Work permit \
                          sponsorship for qualified candidates."
                .to_string(),
            job_type: "Full-time".to_string(),
            visa_sponsored: true,
            remote,
            url: "https://example.com/job2".to_string(),
        },
        MockListing {
            job_title: fallback(job_title, "Full Stack Developer").to_string(),
            company: "TechVision Inc".to_string(),
            location: fallback(location, "Toronto, Canada").to_string(),
            description: "Full stack developer position with visa sponsorship for the \
                          right candidate."
                .to_string(),
            job_type: "Full-time".to_string(),
            visa_sponsored: true,
            remote: true,
            url: "https://example.com/job3".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_sponsored_listings() {
        let listings = mock_listings("Engineer", "Berlin", false);
        assert_eq!(listings.len(), 3);
        assert!(listings.iter().all(|l| l.visa_sponsored));
        assert!(listings.iter().all(|l| l.location == "Berlin"));
    }

    #[test]
    fn test_submitted_title_lands_on_third_listing() {
        let listings = mock_listings("Data Engineer", "", true);
        assert_eq!(listings[0].job_title, "Senior Software Engineer");
        assert_eq!(listings[2].job_title, "Data Engineer");
        assert_eq!(listings[2].company, "TechVision Inc");
    }

    #[test]
    fn test_location_fallbacks_when_blank() {
        let listings = mock_listings("", "  ", false);
        assert_eq!(listings[0].location, "Remote");
        assert_eq!(listings[1].location, "Berlin, Germany");
        assert_eq!(listings[2].location, "Toronto, Canada");
        assert_eq!(listings[2].job_title, "Full Stack Developer");
    }

    #[test]
    fn test_remote_flag_propagates_except_third() {
        let listings = mock_listings("Engineer", "Berlin", false);
        assert!(!listings[0].remote);
        assert!(!listings[1].remote);
        // The third listing is advertised as remote regardless
        assert!(listings[2].remote);
    }
}
