//! Terminal output for the albumsync CLI

use albumsync_sync::{format_duration, StatusEvent, SyncPhase};
use albumsync_types::{ItemFailure, SyncStats};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Notice printed before a dry run starts
pub const DRY_RUN_NOTE: &str =
    "NOTE: Dryrun mode, no changes will be made to local files or Flickr photos.";

/// Spinner shown while both sides are being listed
pub fn create_spinner(quiet: bool) -> Option<ProgressBar> {
    if quiet {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("Connecting...");
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

/// Whether the listing spinner should stop at this phase
fn ends_listing(phase: SyncPhase) -> bool {
    matches!(
        phase,
        SyncPhase::Transferring | SyncPhase::Pruning | SyncPhase::Completed | SyncPhase::Failed
    )
}

/// Styled narration line for an event, `None` for bookkeeping events
pub fn narration_line(event: &StatusEvent) -> Option<String> {
    if !event.is_narration() {
        return None;
    }

    let line = event.to_string();
    let styled = match event {
        StatusEvent::Failed(_) => style(line).red().to_string(),
        StatusEvent::SkippingNonImage { .. } | StatusEvent::UploadRejected { .. } => {
            style(line).yellow().to_string()
        }
        StatusEvent::CreatingAlbum { .. } => style(line).cyan().to_string(),
        _ => line,
    };
    Some(styled)
}

/// Render one event, keeping the spinner out of the way of printed lines
pub fn render_event(event: &StatusEvent, spinner: Option<&ProgressBar>) {
    if let StatusEvent::PhaseChanged(phase) = event {
        if let Some(pb) = spinner {
            if ends_listing(*phase) {
                pb.finish_and_clear();
            } else {
                pb.set_message(format!("{}...", phase));
            }
        }
        return;
    }

    let Some(line) = narration_line(event) else {
        return;
    };
    let print = || {
        if matches!(event, StatusEvent::Failed(_)) {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    };
    match spinner {
        Some(pb) if !pb.is_finished() => pb.suspend(print),
        _ => print(),
    }
}

/// Print the per-operation counts of a run
pub fn print_summary(stats: &SyncStats, dry_run: bool) {
    println!();
    let title = if dry_run {
        "Sync Summary (dry run):"
    } else {
        "Sync Summary:"
    };
    println!("{}", style(title).bold().underlined());
    println!("  Uploaded: {}", style(stats.uploaded).green());
    println!("  Downloaded: {}", style(stats.downloaded).green());
    println!("  Deleted from local: {}", style(stats.deleted_local).green());
    println!("  Deleted from album: {}", style(stats.deleted_remote).green());
    println!("  Skipped: {}", style(stats.skipped).yellow());
    println!(
        "  Failed: {}",
        if stats.failed > 0 {
            style(stats.failed).red()
        } else {
            style(stats.failed).green()
        }
    );
    println!(
        "  Duration: {}",
        style(format_duration(stats.duration)).blue()
    );
}

/// Print every collected failure to stderr
pub fn print_failures(failures: &[ItemFailure]) {
    if failures.is_empty() {
        return;
    }
    eprintln!();
    eprintln!(
        "{} {} operation(s) failed:",
        style("✗").red().bold(),
        failures.len()
    );
    for failure in failures {
        eprintln!("  • {}", failure);
    }
}
