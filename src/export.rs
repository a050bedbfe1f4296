// src/export.rs
use crate::database::{SavedJob, SearchResult};
use anyhow::{Context, Result};
use chrono::Utc;

/// Attachment filename stamped with the current date.
pub fn export_filename(prefix: &str) -> String {
    format!("{}_{}.csv", prefix, Utc::now().format("%Y-%m-%d"))
}

/// Serialize saved jobs for download. An empty list produces no payload at
/// all, matching the "nothing to download" edge case.
pub fn saved_jobs_csv(jobs: &[SavedJob]) -> Result<Option<Vec<u8>>> {
    if jobs.is_empty() {
        return Ok(None);
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Job Title",
        "Company",
        "Location",
        "Status",
        "Date Saved",
        "Application URL",
    ])?;

    for job in jobs {
        writer.write_record([
            job.job_title.as_str(),
            job.company.as_str(),
            job.location.as_str(),
            job.status.as_str(),
            &job.date_saved.format("%Y-%m-%d").to_string(),
            job.url.as_str(),
        ])?;
    }

    writer.flush()?;
    let data = writer
        .into_inner()
        .context("Failed to finish CSV export")?;

    Ok(Some(data))
}

/// Serialize the results of one saved search for download.
pub fn search_results_csv(results: &[SearchResult]) -> Result<Option<Vec<u8>>> {
    if results.is_empty() {
        return Ok(None);
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Job Title",
        "Company",
        "Location",
        "Job Type",
        "Visa Sponsored",
        "Remote",
        "URL",
        "Date Posted",
    ])?;

    for result in results {
        writer.write_record([
            result.job_title.as_str(),
            result.company.as_str(),
            result.location.as_str(),
            result.job_type.as_str(),
            if result.visa_sponsored { "Yes" } else { "No" },
            if result.remote { "Yes" } else { "No" },
            result.url.as_str(),
            &result.date_posted.format("%Y-%m-%d").to_string(),
        ])?;
    }

    writer.flush()?;
    let data = writer
        .into_inner()
        .context("Failed to finish CSV export")?;

    Ok(Some(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::JobStatus;
    use chrono::TimeZone;

    fn sample_job(company: &str) -> SavedJob {
        SavedJob {
            id: "job-1".to_string(),
            user_id: "uid-1".to_string(),
            job_title: "Backend Developer".to_string(),
            company: company.to_string(),
            location: "Berlin, Germany".to_string(),
            description: String::new(),
            job_type: "Full-time".to_string(),
            visa_sponsored: true,
            remote: false,
            url: "https://example.com/job2".to_string(),
            date_posted: None,
            date_saved: Utc.with_ymd_and_hms(2025, 4, 5, 12, 0, 0).unwrap(),
            notes: String::new(),
            status: JobStatus::Applied,
        }
    }

    #[test]
    fn test_empty_list_produces_no_payload() {
        assert!(saved_jobs_csv(&[]).unwrap().is_none());
        assert!(search_results_csv(&[]).unwrap().is_none());
    }

    #[test]
    fn test_header_plus_one_line_per_job() {
        let jobs = vec![sample_job("InnovateX"), sample_job("GlobalTech")];
        let data = saved_jobs_csv(&jobs).unwrap().unwrap();
        let text = String::from_utf8(data).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Job Title,Company,Location,Status,Date Saved,Application URL"
        );
        assert!(lines[1].contains("Applied"));
        assert!(lines[1].contains("2025-04-05"));
    }

    #[test]
    fn test_comma_containing_fields_are_quoted() {
        let jobs = vec![sample_job("Acme, Inc")];
        let data = saved_jobs_csv(&jobs).unwrap().unwrap();
        let text = String::from_utf8(data).unwrap();

        assert!(text.contains("\"Acme, Inc\""));
        assert!(text.contains("\"Berlin, Germany\""));
    }

    #[test]
    fn test_filename_is_date_stamped() {
        let name = export_filename("saved_jobs");
        assert!(name.starts_with("saved_jobs_"));
        assert!(name.ends_with(".csv"));
        assert_eq!(name.len(), "saved_jobs_2025-04-05.csv".len());
    }
}
