//! file: core/src/config.rs
//! description: optimizer configuration.
//!
//! `OptConfig` selects which passes the fixed-point driver runs, how many
//! rounds it may take and whether each pass reports its changes. It is read
//! from a JSON file; every field has a default so `{}` is a valid config.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{GraphoptErrorExt, InvalidInputError};

const ISSUER: &str = "graphopt.config";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassKind {
    Cse,
    Dde,
}

impl PassKind {
    pub fn from_name(name: &str) -> Option<PassKind> {
        match name.trim() {
            "cse" => Some(PassKind::Cse),
            "dde" => Some(PassKind::Dde),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CseConfig {
    #[serde(default = "default_true")]
    pub report_changes: bool,
}

impl Default for CseConfig {
    fn default() -> Self {
        CseConfig { report_changes: true }
    }
}

/// Dead data elimination reports "no change" unless `report_changes` is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DdeConfig {
    #[serde(default)]
    pub report_changes: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptConfig {
    #[serde(default = "default_passes")]
    pub passes: Vec<PassKind>,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default)]
    pub cse: CseConfig,
    #[serde(default)]
    pub dde: DdeConfig,
}

fn default_true() -> bool {
    true
}

fn default_passes() -> Vec<PassKind> {
    vec![PassKind::Cse, PassKind::Dde]
}

fn default_max_iterations() -> usize {
    16
}

impl Default for OptConfig {
    fn default() -> Self {
        OptConfig {
            passes: default_passes(),
            max_iterations: default_max_iterations(),
            cse: CseConfig::default(),
            dde: DdeConfig::default(),
        }
    }
}

impl OptConfig {
    /// Load a config from a JSON file path and validate it.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<OptConfig, Box<dyn GraphoptErrorExt>> {
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            let msg = format!("read config {}: {}", path.as_ref().display(), e);
            InvalidInputError::new(msg, ISSUER).boxed()
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<OptConfig, Box<dyn GraphoptErrorExt>> {
        let cfg: OptConfig = serde_json::from_str(raw)
            .map_err(|e| InvalidInputError::new(format!("parse config: {}", e), ISSUER).boxed())?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), Box<dyn GraphoptErrorExt>> {
        if self.passes.is_empty() {
            return Err(InvalidInputError::new("pass list is empty", ISSUER).boxed());
        }
        if self.max_iterations == 0 {
            return Err(InvalidInputError::new("max_iterations must be at least 1", ISSUER).boxed());
        }
        Ok(())
    }

    /// Parse a comma separated pass list such as `"cse,dde"`.
    pub fn parse_pass_list(list: &str) -> Result<Vec<PassKind>, Box<dyn GraphoptErrorExt>> {
        let mut out = Vec::new();
        for name in list.split(',').filter(|s| !s.trim().is_empty()) {
            match PassKind::from_name(name) {
                Some(p) => out.push(p),
                None => {
                    let msg = format!("unknown pass '{}'", name.trim());
                    return Err(InvalidInputError::new(msg, ISSUER).boxed());
                }
            }
        }
        if out.is_empty() {
            return Err(InvalidInputError::new("pass list is empty", ISSUER).boxed());
        }
        Ok(out)
    }
}
