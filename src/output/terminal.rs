// Colored terminal output for the `check` and `trending` commands.
//
// This module handles all terminal-specific formatting. The main.rs command
// handlers delegate here.

use colored::Colorize;

use super::truncate_chars;
use crate::moderation::verdict::{ModerationVerdict, Severity};
use crate::quality::QualityAssessment;
use crate::trends::TrendingResponse;

/// Display the quality verdict for a piece of content.
pub fn display_quality(assessment: &QualityAssessment) {
    let verdict = if assessment.allowed {
        "PASS".green().bold()
    } else {
        "REJECT".red().bold()
    };
    println!(
        "\n{} quality {} / 100",
        verdict,
        colorize_score(assessment.score)
    );

    println!(
        "  {:<14} {:>3}  {}",
        "Coherence".dimmed(),
        assessment.coherence_score,
        flag(assessment.is_coherent)
    );
    if let (Some(is_action), Some(confidence)) =
        (assessment.is_action, assessment.action_confidence)
    {
        println!(
            "  {:<14} {:>3}  {}",
            "Action".dimmed(),
            confidence,
            flag(is_action)
        );
    }
    println!(
        "  {:<14} {:>3}  {}",
        "Spam".dimmed(),
        assessment.spam_confidence,
        flag(!assessment.is_spam)
    );

    for issue in &assessment.issues {
        println!("  {} {}", "-".yellow(), issue);
    }
    if let Some(ref suggestion) = assessment.suggestion {
        println!("  {}", suggestion.dimmed());
    }
}

/// Display the moderation verdict.
pub fn display_moderation(verdict: &ModerationVerdict) {
    match verdict {
        ModerationVerdict::Allowed => {
            println!("\n{} moderation", "PASS".green().bold());
        }
        ModerationVerdict::Blocked {
            blocked_by,
            severity,
            reason,
            message,
        } => {
            println!(
                "\n{} moderation ({} rule, {} severity)",
                "BLOCK".red().bold(),
                blocked_by,
                colorize_severity(*severity)
            );
            println!("  {:<14} {}", "Reason".dimmed(), reason);
            println!("  {}", message);
        }
    }
}

/// Display a trending sample.
pub fn display_trending(response: &TrendingResponse) {
    if response.posts.is_empty() {
        println!("No trending items right now. Every source came back empty.");
        return;
    }

    let mut origin = if response.cached {
        format!("cached, {}s old", response.cache_age.unwrap_or(0))
    } else {
        "fresh".to_string()
    };
    if response.stale == Some(true) {
        origin.push_str(", stale");
    }
    println!(
        "\n{}",
        format!(
            "=== Trending ({} of {}, {origin}) ===",
            response.posts.len(),
            response.pool_size
        )
        .bold()
    );
    println!();

    for ghost in &response.posts {
        println!(
            "  {:>9}  {:<14} {}",
            format_count(ghost.estimated_count),
            ghost.source.dimmed(),
            truncate_chars(&ghost.content, 80)
        );
    }
    println!();
}

fn flag(ok: bool) -> colored::ColoredString {
    if ok {
        "ok".green()
    } else {
        "fail".red()
    }
}

fn colorize_score(score: u8) -> colored::ColoredString {
    let s = score.to_string();
    match score {
        80.. => s.green(),
        60..=79 => s.yellow(),
        _ => s.red(),
    }
}

fn colorize_severity(severity: Severity) -> colored::ColoredString {
    let s = severity.to_string();
    match severity {
        Severity::Critical => s.red().bold(),
        Severity::High => s.red(),
        Severity::Medium => s.yellow(),
        Severity::Low => s.normal(),
    }
}

/// 1234567 -> "1.2M", 48200 -> "48.2K".
fn format_count(n: u64) -> String {
    match n {
        1_000_000.. => format!("{:.1}M", n as f64 / 1_000_000.0),
        1_000.. => format!("{:.1}K", n as f64 / 1_000.0),
        _ => n.to_string(),
    }
}
