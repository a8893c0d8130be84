use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::EtlError;
use crate::resolver::ResolutionMode;

pub const HUMAN_TAXON: &str = "9606";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub taxon: Option<String>,
    #[serde(default)]
    pub resolution: Option<ResolutionMode>,
    #[serde(default)]
    pub symbol_dictionary: Option<PathBuf>,
    #[serde(default)]
    pub gene_list: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub taxon: String,
    pub resolution: ResolutionMode,
    pub symbol_dictionary: Option<PathBuf>,
    pub gene_list: Option<PathBuf>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the run configuration. The default config file is optional:
    /// without it every setting takes its default, while an explicitly
    /// named file must exist and parse.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, EtlError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from("storm-etl.json"),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| EtlError::ConfigRead(config_path.clone()))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|err| EtlError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, EtlError> {
        Ok(ResolvedConfig {
            taxon: config.taxon.unwrap_or_else(|| HUMAN_TAXON.to_string()),
            resolution: config.resolution.unwrap_or(ResolutionMode::Passthrough),
            symbol_dictionary: config.symbol_dictionary,
            gene_list: config.gene_list,
        })
    }
}
