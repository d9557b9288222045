//! Progress bar and end-of-run summary.

use darkroom_core::BatchSummary;
use indicatif::{ProgressBar, ProgressStyle};

/// Create a progress bar over the discovered photos.
pub fn create_progress_bar(total: u64, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after a batch run.
pub fn print_summary(summary: &BatchSummary) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Processed:    {:>8}", summary.processed);
    if summary.skipped > 0 {
        eprintln!("    Skipped:      {:>8}", summary.skipped);
    }
    if summary.timed_out > 0 {
        eprintln!("    Timed out:    {:>8}", summary.timed_out);
    }
    eprintln!("    Written:      {:>8}", summary.variants_written);
    eprintln!("    Unchanged:    {:>8}", summary.variants_unchanged);
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", summary.discovered);
    eprintln!("    Duration:     {:>7.1}s", summary.elapsed.as_secs_f64());
    eprintln!("    Rate:         {:>7.1} photos/sec", summary.rate());
    eprintln!("    Manifest:     {}", summary.manifest_path.display());
    eprintln!("  ====================================");
}
