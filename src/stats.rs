// src/stats.rs
//
// Read-only dashboard projections. Nothing here is persisted; every view
// recomputes from the rows it is handed.

use crate::database::{JobStatus, SavedJob};
use std::collections::HashMap;

/// Count saved jobs per status label. Every label appears in the map, with
/// zero when no job carries it, so the sum of values always equals the job
/// count.
pub fn status_distribution(jobs: &[SavedJob]) -> HashMap<String, i64> {
    let mut counts: HashMap<String, i64> = JobStatus::ALL
        .iter()
        .map(|status| (status.to_string(), 0))
        .collect();

    for job in jobs {
        *counts.entry(job.status.to_string()).or_insert(0) += 1;
    }

    counts
}

/// Usage ratio as a percentage. A zero allowance reads as fully used.
pub fn usage_percent(searches_used: i64, total_searches_allowed: i64) -> f64 {
    if total_searches_allowed <= 0 {
        return 100.0;
    }
    (searches_used as f64 / total_searches_allowed as f64) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn job_with_status(status: JobStatus) -> SavedJob {
        SavedJob {
            id: format!("job-{}", status),
            user_id: "uid-1".to_string(),
            job_title: "Backend Developer".to_string(),
            company: "InnovateX".to_string(),
            location: "Berlin, Germany".to_string(),
            description: String::new(),
            job_type: "Full-time".to_string(),
            visa_sponsored: true,
            remote: false,
            url: "https://example.com/job2".to_string(),
            date_posted: None,
            date_saved: Utc::now(),
            notes: String::new(),
            status,
        }
    }

    #[test]
    fn test_counts_sum_to_total() {
        let jobs = vec![
            job_with_status(JobStatus::Saved),
            job_with_status(JobStatus::Saved),
            job_with_status(JobStatus::Applied),
            job_with_status(JobStatus::Offer),
            job_with_status(JobStatus::Rejected),
        ];

        let counts = status_distribution(&jobs);
        assert_eq!(counts.values().sum::<i64>(), jobs.len() as i64);
        assert_eq!(counts["Saved"], 2);
        assert_eq!(counts["Applied"], 1);
        assert_eq!(counts["Interview"], 0);
    }

    #[test]
    fn test_every_label_present_for_empty_input() {
        let counts = status_distribution(&[]);
        assert_eq!(counts.len(), 5);
        assert!(counts.values().all(|&count| count == 0));
    }

    #[test]
    fn test_usage_percent() {
        assert_eq!(usage_percent(0, 10), 0.0);
        assert_eq!(usage_percent(9, 10), 90.0);
        assert_eq!(usage_percent(10, 10), 100.0);
        // Over-quota counters from racing searches still render
        assert_eq!(usage_percent(11, 10), 110.0);
        assert_eq!(usage_percent(5, 0), 100.0);
    }
}
