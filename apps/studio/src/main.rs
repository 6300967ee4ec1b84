use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    DeploymentOrchestrator, DeploymentStatus, LogKind, ProjectView, StudioClient,
    TextSpliceCompositor,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod args;

use args::{Args, Command};

const PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    let client = StudioClient::new(args.server_url);

    match args.command {
        Command::Generate { prompt, json } => generate(&client, &prompt.join(" "), json).await,
        Command::Files { collapsed } => files(&client, collapsed).await,
        Command::Preview { file, out } => preview(&client, file.as_deref(), out).await,
        Command::Publish {
            path,
            countdown_secs,
            deadline_secs,
        } => {
            publish(
                client,
                &path,
                Duration::from_secs(countdown_secs),
                Duration::from_secs(deadline_secs),
            )
            .await
        }
    }
}

async fn generate(client: &StudioClient, prompt: &str, json: bool) -> Result<()> {
    info!(server = client.server_url(), "sending prompt");
    let response = client
        .generate(prompt)
        .await
        .context("generation request failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let mut view = ProjectView::new();
    view.push_log(LogKind::User, prompt);
    view.apply_output(&response.data);
    for entry in view.log() {
        let label = match entry.kind {
            LogKind::User => "you",
            LogKind::Command => "$",
            LogKind::Result => "=>",
            LogKind::Ai => "ai",
        };
        println!("[{}] {label} {}", entry.timestamp.format("%H:%M:%S"), entry.content);
    }
    if let Some(url) = response.deployed_url {
        println!("Site published at: {url}");
    }
    println!("{} file(s) written", view.tree().file_count());
    Ok(())
}

async fn load_view(client: &StudioClient) -> Result<ProjectView> {
    let entries = client.list_files().await.context("listing files failed")?;
    let mut view = ProjectView::new();
    view.hydrate(&entries)
        .context("server listing does not form a tree")?;
    Ok(view)
}

async fn files(client: &StudioClient, collapsed: bool) -> Result<()> {
    let mut view = load_view(client).await?;
    if view.tree().is_empty() {
        println!("(no files yet)");
        return Ok(());
    }
    if !collapsed {
        let tree = view.tree().clone();
        view.expanded_mut().expand_all(&tree);
    }
    print!("{}", view.tree().render(view.expanded()));
    Ok(())
}

async fn preview(
    client: &StudioClient,
    file: Option<&str>,
    out: Option<std::path::PathBuf>,
) -> Result<()> {
    let mut view = load_view(client).await?;
    if let Some(path) = file {
        anyhow::ensure!(view.select(path), "no such file: {path}");
    }
    let document = view.preview(&TextSpliceCompositor);
    anyhow::ensure!(!document.is_empty(), "the project has no HTML file to preview");

    match out {
        Some(path) => {
            std::fs::write(&path, &document)
                .with_context(|| format!("failed to write preview to '{}'", path.display()))?;
            println!("Preview written to {}", path.display());
        }
        None => println!("{document}"),
    }
    Ok(())
}

async fn publish(
    client: StudioClient,
    path: &str,
    countdown: Duration,
    deadline: Duration,
) -> Result<()> {
    let orchestrator = Arc::new(
        DeploymentOrchestrator::new(Arc::new(client))
            .with_countdown(countdown)
            .with_deadline(deadline),
    );

    let running = {
        let orchestrator = orchestrator.clone();
        let path = path.to_string();
        tokio::spawn(async move { orchestrator.publish(Some(&path)).await })
    };
    tokio::pin!(running);

    println!("Publishing... this usually takes about a minute. Do not publish again until it finishes.");
    let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
    ticker.tick().await;
    let outcome = loop {
        tokio::select! {
            joined = &mut running => break joined.context("publish task panicked")?,
            _ = ticker.tick() => {
                let snapshot = orchestrator.snapshot().await;
                if snapshot.status == DeploymentStatus::CountingDown {
                    println!("  ~{}s remaining", snapshot.remaining.as_secs());
                }
            }
        }
    };

    let url = outcome.context("publish failed")?;
    println!("Site published at: {url}");
    Ok(())
}
