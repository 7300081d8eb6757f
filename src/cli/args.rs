//! Command line argument parsing
//!
//! Subcommands:
//! - `run`: Submit a prompt and process it against the configured providers
//! - `status`, `results`, `analytics`: Inspect a stored job
//! - `list`: List stored jobs, newest first
//! - `providers`: Show which providers are configured and usable
//! - `show-config`: Show configuration discovery information

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, PartialEq)]
pub enum ExecutionMode {
    Run(RunConfig),
    Status(Uuid),
    Results(Uuid),
    Analytics(Uuid),
    List { limit: usize, offset: usize },
    Providers,
    ShowConfig,
}

#[derive(Debug, PartialEq)]
pub struct RunConfig {
    pub prompt: String,
    pub category: String,
    /// Empty means every available provider
    pub providers: Vec<String>,
    pub tags: Vec<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Parser)]
#[command(name = "lea")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fan a prompt out to several LLM providers and compare the answers")]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path (skips discovery)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding stored jobs
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Submit a prompt and wait for every provider to answer
    Run {
        /// Prompt sent to every provider
        prompt: String,
        /// Category selecting the domain-term dictionary
        #[arg(long = "category", default_value = "technical")]
        category: String,
        /// Provider to query (repeatable); defaults to all available
        #[arg(short = 'p', long = "provider", value_name = "NAME")]
        providers: Vec<String>,
        /// Tag attached to the job (repeatable)
        #[arg(short = 't', long = "tag", value_name = "TAG")]
        tags: Vec<String>,
        /// Submitting user
        #[arg(long = "user")]
        user: Option<String>,
    },
    /// Show the status of a job
    Status { job_id: Uuid },
    /// Show answers and metrics of a job
    Results { job_id: Uuid },
    /// Show response statistics of a job
    Analytics { job_id: Uuid },
    /// List stored jobs
    List {
        #[arg(long = "limit", default_value_t = 20)]
        limit: usize,
        #[arg(long = "offset", default_value_t = 0)]
        offset: usize,
    },
    /// Show configured providers and whether they are usable
    Providers,
    /// Show configuration discovery information
    ShowConfig,
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }

    pub fn mode(&self) -> Result<ExecutionMode, String> {
        match &self.command {
            Some(Commands::Run {
                prompt,
                category,
                providers,
                tags,
                user,
            }) => {
                if prompt.trim().is_empty() {
                    return Err("Prompt must not be empty".to_string());
                }
                Ok(ExecutionMode::Run(RunConfig {
                    prompt: prompt.clone(),
                    category: category.clone(),
                    providers: providers
                        .iter()
                        .map(|p| p.trim().to_lowercase())
                        .filter(|p| !p.is_empty())
                        .collect(),
                    tags: tags.clone(),
                    user_id: user.clone(),
                }))
            }
            Some(Commands::Status { job_id }) => Ok(ExecutionMode::Status(*job_id)),
            Some(Commands::Results { job_id }) => Ok(ExecutionMode::Results(*job_id)),
            Some(Commands::Analytics { job_id }) => Ok(ExecutionMode::Analytics(*job_id)),
            Some(Commands::List { limit, offset }) => Ok(ExecutionMode::List {
                limit: *limit,
                offset: *offset,
            }),
            Some(Commands::Providers) => Ok(ExecutionMode::Providers),
            Some(Commands::ShowConfig) => Ok(ExecutionMode::ShowConfig),
            None => {
                Err("No command specified. Use 'lea --help' to see available commands.".to_string())
            }
        }
    }
}
