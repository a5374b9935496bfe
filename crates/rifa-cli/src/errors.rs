use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Could not find rifa project root.\nExpected to find 'rifa.yml'.\nHint: Run 'rifa init' to create a new project.")]
    ProjectRootNotFound,

    #[error("Failed to load configuration file: {path}\n{source}")]
    ConfigLoadError {
        path: PathBuf,
        source: anyhow::Error,
    },

    #[error("Configuration file already exists: {path}")]
    ConfigExists { path: PathBuf },

    #[error("No campaign given.\nHint: Pass --campaign or set 'campaign' in rifa.yml")]
    CampaignRequired,

    #[error("No draws recorded for campaign '{campaign}'")]
    NoDraws { campaign: String },

    #[error("Draw {sequence} not found for campaign '{campaign}'")]
    DrawNotFound { campaign: String, sequence: u32 },

    #[error("Draw verification failed: {reason}")]
    VerificationFailed { reason: String },
}
