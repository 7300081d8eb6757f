//! Environment constants and path utilities for the evaluation agent.
//!
//! Directory names, file names and environment variables used across the
//! crate live here so storage and configuration agree on one layout.

use std::path::{Path, PathBuf};

/// Main application directory name (hidden directory like .git)
pub const LEA_DIR_NAME: &str = ".lea";

/// Configuration file name inside the application directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Stand-alone configuration file name in the working directory
pub const ROOT_CONFIG_FILE_NAME: &str = "lea.toml";

/// System-wide configuration directory
pub const SYSTEM_CONFIG_DIR: &str = "/etc/lea";

/// Data directory name within .lea
pub const DATA_DIR_NAME: &str = "data";

/// Job storage layout
pub mod storage {
    /// Jobs directory name within the data directory
    pub const JOBS_DIR_NAME: &str = "jobs";

    pub const JOB_FILE_NAME: &str = "job.json";

    pub const ANSWERS_FILE_NAME: &str = "answers.json";

    pub const METRICS_FILE_NAME: &str = "metrics.json";

    /// Suffix of files being written before the atomic rename
    pub const TEMP_SUFFIX: &str = "tmp";
}

/// Environment variables read at startup
pub mod vars {
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
    pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
    pub const PERPLEXITY_API_KEY: &str = "PERPLEXITY_API_KEY";

    /// Standard tracing filter override
    pub const RUST_LOG: &str = "RUST_LOG";
}

/// Build the main .lea directory path from a workspace root
pub fn lea_dir_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(LEA_DIR_NAME)
}

/// Default data directory for a workspace
pub fn default_data_dir_path(workspace_root: &Path) -> PathBuf {
    lea_dir_path(workspace_root).join(DATA_DIR_NAME)
}

/// Build the jobs directory path from a data directory
pub fn jobs_dir_path(data_dir: &Path) -> PathBuf {
    data_dir.join(storage::JOBS_DIR_NAME)
}

/// Build a specific job directory path
pub fn job_dir_path(data_dir: &Path, job_id: &str) -> PathBuf {
    jobs_dir_path(data_dir).join(job_id)
}

pub fn job_file_path(data_dir: &Path, job_id: &str) -> PathBuf {
    job_dir_path(data_dir, job_id).join(storage::JOB_FILE_NAME)
}

pub fn answers_file_path(data_dir: &Path, job_id: &str) -> PathBuf {
    job_dir_path(data_dir, job_id).join(storage::ANSWERS_FILE_NAME)
}

pub fn metrics_file_path(data_dir: &Path, job_id: &str) -> PathBuf {
    job_dir_path(data_dir, job_id).join(storage::METRICS_FILE_NAME)
}

/// Build config file path in user's home directory
pub fn user_config_file_path(home_dir: &Path) -> PathBuf {
    home_dir.join(LEA_DIR_NAME).join(CONFIG_FILE_NAME)
}

/// Build local config file path in current directory
pub fn local_config_file_path(current_dir: &Path) -> PathBuf {
    current_dir.join(LEA_DIR_NAME).join(CONFIG_FILE_NAME)
}

/// Build the stand-alone config file path in current directory
pub fn root_config_file_path(current_dir: &Path) -> PathBuf {
    current_dir.join(ROOT_CONFIG_FILE_NAME)
}

pub fn system_config_file_path() -> PathBuf {
    Path::new(SYSTEM_CONFIG_DIR).join(CONFIG_FILE_NAME)
}
