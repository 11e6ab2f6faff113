//! End-of-run console output.

use cliprank_pipeline::{EndpointHealth, JobReport, Pipeline};

/// Print the human-readable job summary.
pub fn print_report(report: &JobReport, requested: usize) {
    println!();
    println!("{}", "=".repeat(60));
    println!("PROCESSING COMPLETE");
    println!("{}", "=".repeat(60));
    println!("Video:          {}", report.media_id);
    println!("Windows scored: {}", report.windows_considered);
    println!(
        "Clips produced: {} of {} requested",
        report.produced(),
        requested
    );
    if report.failed() > 0 {
        println!("Clips failed:   {}", report.failed());
    }
    if report.degraded_windows > 0 {
        println!("Windows with failed grading: {}", report.degraded_windows);
    }

    if !report.outcomes.is_empty() {
        println!();
        for outcome in &report.outcomes {
            let clip = &outcome.clip;
            match &outcome.file_path {
                Some(path) => {
                    println!(
                        "  {}. {} (score {:.3})",
                        clip.rank,
                        path.display(),
                        clip.final_score
                    );
                }
                None => {
                    println!(
                        "  {}. FAILED: {} (score {:.3})",
                        clip.rank,
                        outcome.error.as_deref().unwrap_or("unknown"),
                        clip.final_score
                    );
                }
            }
            println!(
                "     {:.1}s - {:.1}s | cogency {} | {}",
                clip.window.start,
                clip.window.end,
                clip.grade.cogency,
                truncate(&clip.window.text, 80)
            );
        }
    }

    println!();
    println!("Job log: {}", report.log_path.display());
}

/// Print per-endpoint health status lines.
pub fn print_health(pipeline: &Pipeline, health: EndpointHealth) {
    let config = pipeline.config();
    println!();
    println!("cliprank health check");
    println!("{}", "-".repeat(40));
    println!(
        "transcription ({}): {}",
        config.whisper_server_url,
        status(health.asr_healthy)
    );
    println!(
        "chat          ({}): {}",
        config.chat_server_url,
        status(health.chat_healthy)
    );
    println!("{}", "-".repeat(40));
    println!(
        "overall: {}",
        status(health.all_healthy())
    );
}

fn status(healthy: bool) -> &'static str {
    if healthy {
        "healthy"
    } else {
        "UNHEALTHY"
    }
}

fn truncate(s: &str, max: usize) -> String {
    let collapsed = s.replace(['\n', '\r'], " ");
    if collapsed.chars().count() <= max {
        collapsed
    } else {
        let head: String = collapsed.chars().take(max).collect();
        format!("{}...", head)
    }
}
