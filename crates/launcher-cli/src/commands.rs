//! Subcommand implementations.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use launcher_updater::{Platform, UpdateContext, UpdateDecision, UpdateError, Updater};

/// Print the launcher version and the platform it was built for.
pub fn run_version(updater: &Updater) {
    let platform = updater.platform();
    println!("ddalab-launcher {}", updater.current_version());
    println!("Platform: {} ({})", platform.display_name(), platform.token());
}

/// Report whether a newer release is available.
pub async fn run_check_update(updater: &Updater, ctx: &UpdateContext) -> Result<()> {
    let decision = updater
        .check_for_updates(ctx)
        .await
        .context("update check failed")?;
    print_decision(&decision, updater.platform());
    Ok(())
}

/// Check for, confirm and install the latest release.
pub async fn run_self_update(updater: &Updater, ctx: &UpdateContext, assume_yes: bool) -> Result<()> {
    let decision = updater
        .check_for_updates(ctx)
        .await
        .context("update check failed")?;

    if !decision.has_update {
        println!(
            "ddalab-launcher {} is up to date (latest: {}).",
            decision.current_version, decision.latest_version
        );
        return Ok(());
    }
    print_decision(&decision, updater.platform());
    if !decision.can_install() {
        return Ok(());
    }

    if !assume_yes && !confirm(&format!("Install {}?", decision.latest_version))? {
        println!("Update cancelled.");
        return Ok(());
    }

    let outcome = updater
        .perform_update(ctx, &decision.download_url)
        .await
        .context("update failed")?;
    println!("{}", outcome.restart_instructions());
    Ok(())
}

/// Render an error chain for the terminal, preferring the updater's own
/// user-facing message when there is one.
pub fn describe_error(error: &anyhow::Error) -> String {
    match error.downcast_ref::<UpdateError>() {
        Some(update_error) => format!("{error}: {}", update_error.user_message()),
        None => format!("{error:#}"),
    }
}

fn print_decision(decision: &UpdateDecision, platform: Platform) {
    println!("Current version: {}", decision.current_version);
    println!("Latest version:  {}", decision.latest_version);
    if let Some(published) = decision.published_at {
        println!("Published:       {}", published.format("%Y-%m-%d"));
    }

    if !decision.has_update {
        println!("You are running the latest version.");
        return;
    }

    if decision.has_installable_asset() {
        println!("Download size:   {}", decision.human_size());
    } else {
        println!(
            "No download is available for {} in this release.",
            platform.display_name()
        );
    }
    if !decision.release_notes.trim().is_empty() {
        println!();
        println!("Release notes:");
        println!("{}", decision.release_notes.trim());
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("failed to read confirmation")?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
