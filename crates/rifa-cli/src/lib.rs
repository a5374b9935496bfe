pub mod config;
pub mod errors;
pub mod seed;

pub use config::{find_project_root, Config, DrawDefaults, CONFIG_FILE};
pub use errors::CliError;
pub use seed::generate_seed;
