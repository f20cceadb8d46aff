//! Migrate command.

use std::time::Duration;

use anyhow::Context;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use crate::config::MigrationConfig;
use crate::services::{MigrationEvent, Migrator, Stage};
use crate::utils::redact_url_password;

fn stage_spinner(stage: Stage) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(format!("Migrating {}...", stage.label()));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Migrate a Joomla database into Cyclope.
pub async fn cmd_migrate(config: &MigrationConfig) -> anyhow::Result<()> {
    println!(
        "{} Migrating {}",
        style("→").cyan(),
        redact_url_password(&config.source_url())
    );
    println!(
        "  {} into {}",
        style("→").dim(),
        redact_url_password(&config.target_url)
    );

    let migrator = Migrator::connect(config).await?;

    let (event_tx, mut event_rx) = mpsc::channel::<MigrationEvent>(100);

    // Spawn event handler for UI
    let event_handler = tokio::spawn(async move {
        let mut spinner: Option<ProgressBar> = None;
        while let Some(event) = event_rx.recv().await {
            match event {
                MigrationEvent::StageStarted { stage } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }
                    spinner = Some(stage_spinner(stage));
                }
                MigrationEvent::SiteDomainSet { domain } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }
                    println!("{} Site domain: {}", style("✓").green(), domain);
                }
                MigrationEvent::DuplicatesResolved { categories } => {
                    let message = format!(
                        "{} {} categories share a title, renamed before retrying",
                        style("!").yellow(),
                        categories
                    );
                    match &spinner {
                        Some(pb) => pb.println(message),
                        None => println!("{}", message),
                    }
                }
                MigrationEvent::StageCompleted { stage, total } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }
                    println!(
                        "{} {:<16} {}",
                        style("✓").green(),
                        format!("{}:", stage.label()),
                        style(total).bold()
                    );
                }
                MigrationEvent::Complete(report) => {
                    println!(
                        "{} Migration complete: {} articles in {} categories",
                        style("✓").green(),
                        report.articles,
                        report.categories
                    );
                }
            }
        }
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }
    });

    let result = migrator.run(event_tx).await;

    // Wait for event handler to finish
    let _ = event_handler.await;

    // Reported once, by main's anyhow error
    result.context("Migration failed")?;
    Ok(())
}
