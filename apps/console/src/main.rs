mod config;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Result};
use clap::Parser;
use client_core::{
    hooks::{MissingDialogController, TracingNotifier},
    ConnectionState, LocalPushChannel, Orchestrator, OrchestratorConfig, Repository,
    RepositoryRegistry, RestRepository,
};
use futures::future::join_all;
use shared::{router::RouterStateSnapshot, view::ViewMode};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Drives one navigation against a collection API and prints the emitted events as JSON lines.
#[derive(Parser, Debug)]
struct Args {
    /// Router URL, e.g. `/discovery/People?collection=persons&facets=type`.
    url: String,
    /// Settings file; defaults to `console.toml` when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    api_base_url: Option<String>,
    /// Value of the `view` route parameter.
    #[arg(long)]
    view: Option<String>,
    /// Collection carried by the route's data instead of the query string.
    #[arg(long)]
    route_collection: Option<String>,
    /// How long to keep printing events after the navigation completes.
    #[arg(long, default_value_t = 2000)]
    linger_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = config::load_settings(args.config.as_deref())?;
    if let Some(api_base_url) = args.api_base_url {
        settings.api_base_url = api_base_url;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut snapshot = RouterStateSnapshot::parse(&args.url);
    if let Some(view) = args.view {
        snapshot = snapshot.with_param("view", view);
    }
    if let Some(collection) = args.route_collection {
        snapshot = snapshot.with_route_collection(collection);
    }

    let registry = build_registry(&settings);
    if let Some(collection) = snapshot.collection_name() {
        if !registry.contains(collection) {
            bail!("collection `{collection}` is not configured");
        }
    }

    let orchestrator = Orchestrator::new_with_dependencies(
        registry,
        Arc::new(LocalPushChannel::new()),
        ConnectionState::new(true),
        Arc::new(TracingNotifier),
        Arc::new(MissingDialogController),
        OrchestratorConfig {
            readiness_timeout: settings.readiness_timeout(),
        },
    );

    let mut events = orchestrator.subscribe_events();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(err) => warn!("unprintable event: {err}"),
                },
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event printer lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    join_all(orchestrator.start()).await;
    match orchestrator.navigate(snapshot) {
        Some(handle) => {
            handle.await?;
        }
        None => info!("route names no collection; nothing to load"),
    }

    tokio::time::sleep(Duration::from_millis(args.linger_ms)).await;
    printer.abort();
    Ok(())
}

fn build_registry(settings: &config::Settings) -> RepositoryRegistry {
    let http = reqwest::Client::new();
    let mut names: Vec<String> = ViewMode::ALL
        .into_iter()
        .map(|mode| mode.collection_name().to_string())
        .collect();
    for name in &settings.collections {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }

    RepositoryRegistry::from_table(names.into_iter().map(|name| {
        let repository: Arc<dyn Repository> = Arc::new(RestRepository::with_client(
            http.clone(),
            settings.api_base_url.clone(),
            name.clone(),
        ));
        (name, repository)
    }))
}
