use anyhow::Result;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use subgen::cli::{ArtifactCommands, Cli, Commands};
use subgen::config::Config;
use subgen::jobs::{JobEvent, JobRequest, Orchestrator};
use subgen::store::ArtifactStore;
use subgen::{models, utils};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose { "subgen=debug" } else { "subgen=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;

    let store = Arc::new(ArtifactStore::new(&config.data_dir()?)?);
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let orchestrator = Orchestrator::new(config.clone(), store, events_tx);

    match cli.command {
        Commands::Transcribe {
            audio,
            output,
            format,
            language,
            model,
            density,
        } => {
            let missing = utils::check_dependencies(&config.engine.binary).await;
            if !missing.is_empty() {
                eprintln!("⚠️  Dependency check warnings:");
                for dep in missing {
                    eprintln!("   • {}", dep);
                }
                eprintln!("   (Continuing anyway - the engine may still be available)");
            }

            let request = JobRequest {
                audio_path: audio,
                output_path: output,
                language: language.unwrap_or_else(|| config.engine.default_language.clone()),
                model: model.unwrap_or_else(|| config.engine.default_model.clone()),
                format: format.map(Into::into).unwrap_or(config.app.default_format),
                density: density.map(Into::into).unwrap_or(config.app.default_density),
            };

            let ui = spawn_progress_ui(events_rx, cli.quiet);

            let handle = orchestrator.start_job(request).await?;
            let completion = handle.wait().await?;

            // Close the event channel so the UI task drains and exits
            drop(orchestrator);
            let _ = ui.await;

            println!(
                "{} {} ({} cues)",
                style("Subtitle saved to:").green(),
                completion.artifact.path.display(),
                completion.preview.len()
            );
        }
        Commands::Artifacts { command } => match command {
            ArtifactCommands::List => {
                let artifacts = orchestrator.list_artifacts().await;
                if artifacts.is_empty() {
                    println!("No generated subtitles in the catalog yet.");
                }
                for record in artifacts {
                    let marker = if record.exists {
                        style("✓").green()
                    } else {
                        style("✗ missing").red()
                    };
                    println!(
                        "{}  {}  [{}] {} ({}, {}) {}",
                        record.id,
                        record.file_name,
                        record.format,
                        record.path.display(),
                        record.language,
                        record.created_at.format("%Y-%m-%d %H:%M"),
                        marker
                    );
                }
            }
            ArtifactCommands::Rename { id, new_name } => {
                let updated = orchestrator.rename_artifact(&id, &new_name).await?;
                println!("Renamed to: {}", updated.path.display());
            }
            ArtifactCommands::Delete { id } => {
                orchestrator.delete_artifact(&id).await?;
                println!("Deleted artifact {}", id);
            }
            ArtifactCommands::Open { id } => {
                orchestrator.open_artifact(&id).await?;
            }
            ArtifactCommands::Reveal { id } => {
                orchestrator.reveal_artifact(&id).await?;
            }
        },
        Commands::Models => {
            println!("Available models:");
            for model in models::list_models() {
                println!("  • {:<10} {} (~{} MB)", model.id, model.name, model.size_mb);
            }
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                config.save()?;
                println!("Configuration written.");
            }
        }
    }

    Ok(())
}

/// Drive a spinner from the orchestrator's progress events
fn spawn_progress_ui(
    mut events: mpsc::UnboundedReceiver<JobEvent>,
    quiet: bool,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let spinner = if quiet {
            ProgressBar::hidden()
        } else {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap(),
            );
            spinner.enable_steady_tick(std::time::Duration::from_millis(120));
            spinner
        };

        while let Some(event) = events.recv().await {
            match event {
                JobEvent::Progress { phase, message, .. } => {
                    spinner.set_message(format!("[{}] {}", phase, message));
                }
                JobEvent::Done { .. } => {
                    spinner.finish_with_message("Transcription complete");
                }
                JobEvent::Error { error, .. } => {
                    spinner.finish_with_message(format!("Failed: {}", error.message));
                }
                JobEvent::ArtifactsChanged { .. } => {}
            }
        }
    })
}
