mod args;
mod dataset;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use log::{error, info};
use serde_json::Value;

use liftsync_sync_client::{
    AutoSync, SyncApiClient, SyncOutcome, SyncSession, SyncSeverity, SyncStatusSink,
};

use args::{Cli, Commands};
use dataset::FileDataset;

fn print_status(message: &str, severity: SyncSeverity) {
    match severity {
        SyncSeverity::Warning | SyncSeverity::Error => {
            eprintln!("[{}] {}", severity.as_str(), message)
        }
        SyncSeverity::Success | SyncSeverity::Info => {
            println!("[{}] {}", severity.as_str(), message)
        }
    }
}

fn build_session(cli: &Cli, dataset: Arc<FileDataset>) -> anyhow::Result<Arc<SyncSession>> {
    let Some(server) = cli.server.as_deref() else {
        bail!("no server configured; pass --server or set LIFTSYNC_URL");
    };
    let api_key = cli.api_key.as_deref().unwrap_or_default();
    let client = SyncApiClient::new(server, api_key)?;
    let status: Arc<dyn SyncStatusSink> = Arc::new(print_status);
    Ok(Arc::new(SyncSession::new(
        client,
        cli.user.clone(),
        dataset,
        status,
    )))
}

async fn run(cli: Cli) -> anyhow::Result<SyncOutcome> {
    let dataset = Arc::new(FileDataset::open(&cli.data)?);
    let session = build_session(&cli, Arc::clone(&dataset))?;

    let outcome = match &cli.command {
        Commands::Test => {
            let online = session.test_connectivity().await;
            println!(
                "{} is {}",
                session.client().endpoint(),
                if online { "online" } else { "unreachable" }
            );
            SyncOutcome::from_success(online)
        }
        Commands::Pull => session.initialize().await,
        Commands::Push => {
            session.test_connectivity().await;
            session.save().await
        }
        Commands::Sync => session.sync_now().await,
        Commands::Import { file } => {
            let content = std::fs::read_to_string(file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let data: Value = serde_json::from_str(&content)
                .with_context(|| format!("{} is not valid JSON", file.display()))?;
            dataset.set(data)?;
            session.test_connectivity().await;
            session.persist_locally_then_sync().await
        }
        Commands::Stats => {
            let response = session.client().stats().await?;
            for (user, stats) in &response.stats {
                println!(
                    "{:<20} {:>6} sessions  last update {}",
                    user, stats.total_sessions, stats.last_update
                );
            }
            SyncOutcome::from_success(response.success)
        }
        Commands::Backup { output } => {
            let bytes = session.client().download_backup().await?;
            let path = output.clone().unwrap_or_else(|| {
                PathBuf::from(format!(
                    "liftsync-backup-{}.json",
                    chrono::Utc::now().format("%Y-%m-%d")
                ))
            });
            std::fs::write(&path, &bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Saved {} bytes to {}", bytes.len(), path.display());
            SyncOutcome::Completed
        }
        Commands::Watch { interval } => {
            session.initialize().await;
            let auto_sync = AutoSync::new(Duration::from_secs((*interval).max(1)));
            auto_sync.start(Arc::clone(&session)).await;
            info!("Watching {}, press Ctrl-C to stop", dataset.path().display());

            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for Ctrl-C")?;
            auto_sync.stop().await;
            // Final push of the file as it stands on disk.
            session.save().await
        }
    };
    Ok(outcome)
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(outcome) if outcome.is_success() => ExitCode::SUCCESS,
        Ok(outcome) => {
            info!("Finished with outcome {:?}", outcome);
            ExitCode::FAILURE
        }
        Err(err) => {
            error!("{:#}", err);
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
