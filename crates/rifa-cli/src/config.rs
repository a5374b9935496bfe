use crate::errors::CliError;
use anyhow::Result;
use rifa_core::ShortfallPolicy;
use rifa_store::TicketCodeFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "rifa.yml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Campaign used when no --campaign flag is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign: Option<String>,
    /// Ticket store snapshot, relative to the project root
    #[serde(default = "default_data_file")]
    pub data_file: String,
    #[serde(default)]
    pub tickets: TicketCodeFormat,
    #[serde(default)]
    pub draw: DrawDefaults,
}

fn default_data_file() -> String {
    "rifa.json".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            campaign: None,
            data_file: default_data_file(),
            tickets: TicketCodeFormat::default(),
            draw: DrawDefaults::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DrawDefaults {
    #[serde(default = "default_winners")]
    pub winners: usize,
    #[serde(default)]
    pub shortfall: ShortfallPolicy,
    /// Include the seed in published draw records
    #[serde(default = "default_disclose_seed")]
    pub disclose_seed: bool,
}

fn default_winners() -> usize {
    1
}

fn default_disclose_seed() -> bool {
    true
}

impl Default for DrawDefaults {
    fn default() -> Self {
        Self {
            winners: default_winners(),
            shortfall: ShortfallPolicy::default(),
            disclose_seed: default_disclose_seed(),
        }
    }
}

impl Config {
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE);
        let content =
            std::fs::read_to_string(&config_path).map_err(|e| CliError::ConfigLoadError {
                path: config_path.clone(),
                source: e.into(),
            })?;

        serde_yaml::from_str(&content).map_err(|e| {
            CliError::ConfigLoadError {
                path: config_path,
                source: e.into(),
            }
            .into()
        })
    }

    /// Write a default configuration for `campaign` into `project_dir`.
    pub fn init(project_dir: &Path, campaign: Option<String>) -> Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE);
        if config_path.exists() {
            return Err(CliError::ConfigExists { path: config_path }.into());
        }

        let config = Config {
            campaign,
            ..Config::default()
        };
        std::fs::create_dir_all(project_dir)?;
        std::fs::write(&config_path, serde_yaml::to_string(&config)?)?;
        Ok(config)
    }

    /// Absolute path of the ticket store snapshot.
    pub fn data_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.data_file)
    }

    /// Campaign to operate on
    ///
    /// **Precedence**: command line flag > rifa.yml
    pub fn resolve_campaign(&self, flag: Option<String>) -> Result<String> {
        flag.or_else(|| self.campaign.clone())
            .ok_or_else(|| CliError::CampaignRequired.into())
    }
}

/// Find the rifa project root by looking for rifa.yml
pub fn find_project_root(start_dir: &Path) -> Result<PathBuf> {
    let mut current = start_dir.to_path_buf();

    // Walk up max 5 levels
    for _ in 0..5 {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }

        if let Some(parent) = current.parent() {
            current = parent.to_path_buf();
        } else {
            break;
        }
    }

    Err(CliError::ProjectRootNotFound.into())
}
