use anyhow::{Context, Result};
use lea::cli::{AppConfig, Args, ConfigDiscovery, ExecutionMode, RunConfig};
use lea::job::NewJob;
use lea::llm::{ProviderKind, RetryExecutor};
use lea::orchestrator::{Orchestrator, ProviderRegistry};
use lea::storage::JsonFileStorage;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "lea=debug" } else { "lea=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(lea::env::vars::RUST_LOG)
                .unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mode = match args.mode() {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = run(mode, &args).await {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(mode: ExecutionMode, args: &Args) -> Result<()> {
    if let ExecutionMode::ShowConfig = mode {
        ConfigDiscovery::show_discovery_info();
        return Ok(());
    }

    let config = ConfigDiscovery::load(args.config.as_deref()).context("loading configuration")?;

    if let ExecutionMode::Providers = mode {
        show_providers(&config);
        return Ok(());
    }

    let orchestrator = build_orchestrator(&config, args.data_dir.as_deref()).await?;

    match mode {
        ExecutionMode::Run(run_config) => run_job(&orchestrator, run_config).await,
        ExecutionMode::Status(job_id) => print_json(&orchestrator.get_status(job_id).await?),
        ExecutionMode::Results(job_id) => print_json(&orchestrator.get_results(job_id).await?),
        ExecutionMode::Analytics(job_id) => {
            print_json(&orchestrator.get_analytics(job_id).await?)
        }
        ExecutionMode::List { limit, offset } => {
            print_json(&orchestrator.list_jobs(limit, offset).await?)
        }
        ExecutionMode::Providers | ExecutionMode::ShowConfig => Ok(()),
    }
}

async fn build_orchestrator(config: &AppConfig, data_dir: Option<&Path>) -> Result<Orchestrator> {
    let data_dir = config.data_dir(data_dir);
    let storage = JsonFileStorage::open(&data_dir)
        .await
        .with_context(|| format!("opening data directory {}", data_dir.display()))?;
    info!("Using data directory: {}", data_dir.display());

    let registry = ProviderRegistry::from_config(&config.providers, config.request_timeout());
    Ok(Orchestrator::new(
        registry,
        Arc::new(storage),
        RetryExecutor::new(config.retry.clone()),
        config.query_options.clone(),
    ))
}

async fn run_job(orchestrator: &Orchestrator, run_config: RunConfig) -> Result<()> {
    if orchestrator.registry().is_empty() {
        eprintln!(
            "Warning: no provider has a usable API key; set one of {}",
            ProviderKind::ALL
                .iter()
                .map(|k| k.api_key_env_var())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    let mut new_job = NewJob::new(run_config.prompt, run_config.category)
        .with_providers(run_config.providers)
        .with_tags(run_config.tags);
    if let Some(user_id) = run_config.user_id {
        new_job = new_job.with_user(user_id);
    }

    let job = orchestrator.submit_and_process(new_job).await?;
    info!(job_id = %job.id, status = %job.status, "job finished");
    print_json(&orchestrator.get_results(job.id).await?)
}

fn show_providers(config: &AppConfig) {
    println!("Configured providers:");
    for kind in ProviderKind::ALL {
        let provider = config.providers.get(kind);
        let status = if provider.usable_api_key().is_some() {
            "✓ AVAILABLE"
        } else {
            "✗ NO API KEY"
        };
        println!(
            "  {:<11} {:<32} {}",
            kind.as_str(),
            provider.model_or_default(kind),
            status
        );
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
