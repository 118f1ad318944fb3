//! Output formatting for the CLI adapter.
//!
//! Every report comes in two shapes: structured JSON for programmatic
//! consumption and colored human-readable terminal output. The display layer
//! is presentation glue only; all semantics live in the query engine, the
//! snapshot store and the profile registry.

use colored::Colorize;
use serde::Serialize;

use crate::models::{
    CleanupReport, PeakReport, PredictionStats, PredictionStatus, RateStats, Snapshot,
    SummaryStats,
};
use crate::profiles::ProfileListing;
use crate::query::HistoryResponse;

pub struct ReportDisplay {
    json_output: bool,
    json_pretty: bool,
}

impl ReportDisplay {
    pub fn new(json_output: bool, json_pretty: bool) -> Self {
        Self {
            json_output,
            json_pretty,
        }
    }

    fn print_json<T: Serialize>(&self, value: &T) -> bool {
        if !self.json_output {
            return false;
        }
        let encoded = if self.json_pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        match encoded {
            Ok(json_str) => println!("{}", json_str),
            Err(e) => eprintln!("Error serializing output to JSON: {}", e),
        }
        true
    }

    pub fn display_current(&self, profile: &str, snapshot: &Snapshot) {
        if self.print_json(snapshot) {
            return;
        }

        println!("\n{}", format!("Current usage — {}", profile).bright_white().bold());
        println!("  {} {}", "collected:".bright_black(), snapshot.timestamp);
        println!(
            "  {} {}",
            "tokens used:".bright_black(),
            snapshot.tokens_used.to_string().bright_green().bold()
        );
        println!(
            "  {} {}",
            "model calls:".bright_black(),
            snapshot.model_calls.to_string().bright_white()
        );
        println!(
            "  {} {}",
            "mcp calls:".bright_black(),
            snapshot.mcp_calls.to_string().bright_white()
        );
        println!(
            "  {} {} token / {} time",
            "quota:".bright_black(),
            format!("{:.1}%", snapshot.token_quota_percent).bright_yellow(),
            format!("{:.1}%", snapshot.time_quota_percent).bright_yellow()
        );
        if !snapshot.mcp_tool_breakdown.is_empty() {
            println!("  {}", "mcp tools:".bright_black());
            let mut tools: Vec<_> = snapshot.mcp_tool_breakdown.iter().collect();
            tools.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
            for (tool, count) in tools {
                println!("    {}: {}", tool.bright_cyan(), count);
            }
        }
        println!();
    }

    pub fn display_history(&self, profile: &str, range: &str, response: &HistoryResponse) {
        if self.print_json(response) {
            return;
        }

        match response {
            HistoryResponse::Entries(points) => {
                println!(
                    "\n{} ({} points, last {})",
                    format!("History — {}", profile).bright_white().bold(),
                    points.len().to_string().bright_white(),
                    range.bright_cyan()
                );
                for point in points {
                    let marker = match point.source {
                        crate::models::PointSource::Raw => " ".normal(),
                        crate::models::PointSource::Summary => "≈".bright_black(),
                    };
                    println!(
                        "  {}{}  {} tokens, {} calls, {}",
                        marker,
                        point.timestamp,
                        point.tokens_used.to_string().bright_green(),
                        point.model_calls.to_string().bright_white(),
                        format!("{:.1}%", point.token_quota_percent).bright_yellow()
                    );
                }
                println!();
            }
            HistoryResponse::Stats(stats) => self.display_summary_stats(profile, range, stats),
        }
    }

    fn display_summary_stats(&self, profile: &str, range: &str, stats: &SummaryStats) {
        println!(
            "\n{} (last {})",
            format!("Usage summary — {}", profile).bright_white().bold(),
            range.bright_cyan()
        );
        println!(
            "  {} {} ({} over the period)",
            "tokens:".bright_black(),
            stats.total_tokens.to_string().bright_green().bold(),
            format!("{:+.1}%", stats.token_growth_percent).bright_yellow()
        );
        println!(
            "  {} {} ({} over the period)",
            "model calls:".bright_black(),
            stats.total_model_calls.to_string().bright_white(),
            format!("{:+.1}%", stats.call_growth_percent).bright_yellow()
        );
        println!(
            "  {} {} token / {} time",
            "quota:".bright_black(),
            format!("{:.1}%", stats.token_quota_percent).bright_yellow(),
            format!("{:.1}%", stats.time_quota_percent).bright_yellow()
        );
        println!(
            "  {} {} entries, {} → {}\n",
            "window:".bright_black(),
            stats.entry_count,
            stats.period_start,
            stats.period_end
        );
    }

    pub fn display_rates(&self, profile: &str, rates: &RateStats) {
        if self.print_json(rates) {
            return;
        }

        println!("\n{}", format!("Usage rates — {}", profile).bright_white().bold());
        println!(
            "  {} {}",
            "tokens/hour:".bright_black(),
            format!("{:.0}", rates.tokens_per_hour).bright_green().bold()
        );
        println!(
            "  {} {}",
            "calls/hour:".bright_black(),
            format!("{:.1}", rates.calls_per_hour).bright_white()
        );
        println!(
            "  {} {}",
            "avg tokens/call:".bright_black(),
            format!("{:.0}", rates.avg_tokens_per_call).bright_white()
        );
        println!(
            "  {} {:.2}h across {} samples\n",
            "window:".bright_black(),
            rates.elapsed_hours,
            rates.sample_count
        );
    }

    pub fn display_prediction(&self, profile: &str, prediction: &PredictionStats) {
        if self.print_json(prediction) {
            return;
        }

        println!("\n{}", format!("Quota forecast — {}", profile).bright_white().bold());
        match prediction.status {
            PredictionStatus::NotDepleting => {
                println!(
                    "  {} quota is flat or resetting ({:+.2}%/h), no exhaustion expected\n",
                    "✅".green(),
                    prediction.percent_per_hour
                );
            }
            status => {
                let hours = prediction.hours_until_exhausted.unwrap_or_default();
                let eta = format!("~{}h until exhaustion", hours);
                let eta = match status {
                    PredictionStatus::Warning => eta.bright_red().bold(),
                    _ => eta.bright_green(),
                };
                println!(
                    "  {} at {} ({:+.2}%/h from {:.1}%)\n",
                    if status == PredictionStatus::Warning {
                        "⚠️".yellow()
                    } else {
                        "✅".green()
                    },
                    eta,
                    prediction.percent_per_hour,
                    prediction.current_percent
                );
            }
        }
    }

    pub fn display_insights(&self, profile: &str, report: &PeakReport) {
        if self.print_json(report) {
            return;
        }

        println!(
            "\n{} (last {})",
            format!("Usage insights — {}", profile).bright_white().bold(),
            report.range.bright_cyan()
        );
        println!(
            "  {} {} ({} tokens, {} calls)",
            "peak hour:".bright_black(),
            report.peak_hour.label.bright_cyan().bold(),
            report.peak_hour.tokens.to_string().bright_green(),
            report.peak_hour.model_calls
        );
        println!(
            "  {} {} ({} tokens, {} calls)",
            "peak day:".bright_black(),
            report.peak_day.label.bright_cyan().bold(),
            report.peak_day.tokens.to_string().bright_green(),
            report.peak_day.model_calls
        );
        println!("  {}", "by hour:".bright_black());
        for bucket in &report.hourly {
            println!(
                "    {}  {} tokens ({} samples)",
                bucket.label.bright_cyan(),
                bucket.tokens,
                bucket.samples
            );
        }
        println!("  {}", "by day:".bright_black());
        for bucket in &report.daily {
            println!(
                "    {}  {} tokens ({} samples)",
                bucket.label.bright_cyan(),
                bucket.tokens,
                bucket.samples
            );
        }
        println!();
    }

    pub fn display_cleanup(&self, profile: &str, report: &CleanupReport) {
        if self.print_json(report) {
            return;
        }

        println!(
            "\n{} archived {} snapshots into hourly summaries, trimmed {} from the raw log\n",
            format!("Cleanup — {}:", profile).bright_white().bold(),
            report.archived.to_string().bright_green(),
            report.trimmed.to_string().bright_yellow()
        );
    }

    pub fn display_profiles(&self, listings: &[ProfileListing]) {
        if self.print_json(&listings) {
            return;
        }

        println!("\n{}", "Profiles".bright_white().bold());
        for listing in listings {
            let marker = if listing.active {
                "●".bright_green()
            } else {
                "○".bright_black()
            };
            let name = if listing.active {
                listing.name.bright_white().bold()
            } else {
                listing.name.normal()
            };
            match &listing.base_url {
                Some(url) => println!("  {} {} ({})", marker, name, url.bright_black()),
                None => println!("  {} {}", marker, name),
            }
        }
        println!();
    }
}
