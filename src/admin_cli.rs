// src/admin_cli.rs
use crate::app_log;
use crate::database::{DatabaseConfig, ProfileRepository};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Searches per month granted by each subscription tier. "pro" is sold as
/// unlimited; the counter still needs a ceiling.
pub fn tier_allowance(tier: &str) -> Option<i64> {
    match tier {
        "free" => Some(3),
        "starter" => Some(20),
        "pro" => Some(1000),
        _ => None,
    }
}

#[derive(Parser)]
#[command(name = "admin")]
#[command(about = "Manage user plans for the VisaHunt job search API")]
pub struct AdminCli {
    #[command(subcommand)]
    pub command: AdminCommand,

    #[arg(long, default_value = "data/visahunt.db")]
    pub database_path: PathBuf,
}

#[derive(Subcommand)]
pub enum AdminCommand {
    /// List all user profiles with tier, status and usage
    List,
    /// Set a user's subscription tier (free, starter or pro)
    SetPlan { email: String, tier: String },
    /// Set a user's subscription status (active or inactive)
    SetStatus { email: String, status: String },
    /// Reset a user's monthly search counter
    ResetUsage { email: String },
    /// Import plan assignments from a CSV file (email,tier)
    Import { csv_file: PathBuf },
    /// Initialize the database
    Init,
}

pub async fn handle_admin_command(cli: AdminCli) -> Result<()> {
    // Initialize database
    let mut db_config = DatabaseConfig::new(cli.database_path.clone());
    db_config.init_pool().await?;
    db_config.migrate().await?;

    let pool = db_config.pool()?;
    let profiles = ProfileRepository::new(pool);

    match cli.command {
        AdminCommand::List => match profiles.list_all().await {
            Ok(all) => {
                if all.is_empty() {
                    app_log!(info, "No profiles found.");
                } else {
                    app_log!(
                        info,
                        "{:<30} {:<10} {:<10} {:<12} {:<20}",
                        "Email",
                        "Tier",
                        "Status",
                        "Usage",
                        "Created"
                    );
                    app_log!(info, "{}", "-".repeat(82));

                    for profile in all {
                        app_log!(
                            info,
                            "{:<30} {:<10} {:<10} {:<12} {:<20}",
                            profile.email,
                            profile.subscription_tier,
                            profile.subscription_status,
                            format!(
                                "{}/{}",
                                profile.searches_used, profile.total_searches_allowed
                            ),
                            profile.created_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
            }
            Err(e) => {
                app_log!(error, "Failed to list profiles: {}", e);
                app_log!(info, "❌ Error: {}", e);
            }
        },

        AdminCommand::SetPlan { email, tier } => {
            let Some(allowed) = tier_allowance(&tier) else {
                app_log!(info, "❌ Unknown tier '{}'. Use free, starter or pro", tier);
                return Ok(());
            };

            match profiles.set_plan(&email, &tier, allowed).await {
                Ok(true) => {
                    app_log!(info, "✅ Plan updated for {}:", email);
                    app_log!(info, "   Tier: {}", tier);
                    app_log!(info, "   Searches per month: {}", allowed);
                }
                Ok(false) => {
                    app_log!(info, "❌ No profile found for email: {}", email);
                }
                Err(e) => {
                    app_log!(error, "Failed to set plan: {}", e);
                    app_log!(info, "❌ Error: {}", e);
                }
            }
        }

        AdminCommand::SetStatus { email, status } => {
            if status != "active" && status != "inactive" {
                app_log!(info, "❌ Unknown status '{}'. Use active or inactive", status);
                return Ok(());
            }

            match profiles.set_subscription_status(&email, &status).await {
                Ok(true) => {
                    app_log!(info, "✅ Subscription status for {} set to: {}", email, status);
                }
                Ok(false) => {
                    app_log!(info, "❌ No profile found for email: {}", email);
                }
                Err(e) => {
                    app_log!(error, "Failed to set status: {}", e);
                    app_log!(info, "❌ Error: {}", e);
                }
            }
        }

        AdminCommand::ResetUsage { email } => match profiles.reset_usage(&email).await {
            Ok(true) => {
                app_log!(info, "✅ Search counter reset for: {}", email);
            }
            Ok(false) => {
                app_log!(info, "❌ No profile found for email: {}", email);
            }
            Err(e) => {
                app_log!(error, "Failed to reset usage: {}", e);
                app_log!(info, "❌ Error: {}", e);
            }
        },

        AdminCommand::Import { csv_file } => {
            if !csv_file.exists() {
                app_log!(info, "❌ CSV file not found: {}", csv_file.display());
                return Ok(());
            }

            let content = tokio::fs::read_to_string(&csv_file).await?;
            let mut reader = csv::Reader::from_reader(content.as_bytes());

            let mut success_count = 0;
            let mut error_count = 0;

            for result in reader.records() {
                match result {
                    Ok(record) => {
                        let email = record.get(0).unwrap_or("").trim();
                        let tier = record.get(1).unwrap_or("").trim();

                        if email.is_empty() || tier.is_empty() {
                            error_count += 1;
                            app_log!(info, "⚠️  Skipping record without email or tier");
                            continue;
                        }

                        let Some(allowed) = tier_allowance(tier) else {
                            error_count += 1;
                            app_log!(info, "⚠️  Skipping {}: unknown tier '{}'", email, tier);
                            continue;
                        };

                        match profiles.set_plan(email, tier, allowed).await {
                            Ok(true) => {
                                success_count += 1;
                                app_log!(info, "✅ Updated: {} -> {}", email, tier);
                            }
                            Ok(false) => {
                                error_count += 1;
                                app_log!(info, "⚠️  Skipped (no profile): {}", email);
                            }
                            Err(e) => {
                                error_count += 1;
                                app_log!(info, "❌ Failed to update {}: {}", email, e);
                            }
                        }
                    }
                    Err(e) => {
                        error_count += 1;
                        app_log!(info, "❌ CSV parsing error: {}", e);
                    }
                }
            }

            app_log!(info, "\nImport completed:");
            app_log!(info, "  ✅ Success: {}", success_count);
            app_log!(info, "  ❌ Errors:  {}", error_count);
        }

        AdminCommand::Init => {
            app_log!(
                info,
                "✅ Database initialized at: {}",
                cli.database_path.display()
            );
            app_log!(
                info,
                "   Tables created: profiles, saved_searches, search_results, saved_jobs"
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_allowances() {
        assert_eq!(tier_allowance("free"), Some(3));
        assert_eq!(tier_allowance("starter"), Some(20));
        assert_eq!(tier_allowance("pro"), Some(1000));
        assert_eq!(tier_allowance("enterprise"), None);
    }
}
