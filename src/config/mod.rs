//! Configuration loading and validation

mod schema;

pub use schema::*;

use std::path::Path;

use anyhow::Result;

/// Load configuration from a YAML file.
pub fn load_config(path: &Path) -> Result<SondeConfig> {
    let contents = std::fs::read_to_string(path)?;
    let config: SondeConfig = serde_yaml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}
