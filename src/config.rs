use std::env;
use std::path::PathBuf;

use crate::error::{GuardError, Result};
use crate::replacement::{ReplacementMap, DEFAULT_FALLBACK, DEFAULT_MAX_DEPTH};

pub const MAX_DEPTH_ENV_VAR: &str = "DIET_GUARD_MAX_DEPTH";
pub const FALLBACK_ENV_VAR: &str = "DIET_GUARD_FALLBACK";
pub const REPLACEMENTS_ENV_VAR: &str = "DIET_GUARD_REPLACEMENTS";

/// Settings for one rewrite run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteConfig {
    pub max_depth: usize,
    pub fallback: String,
    /// CSV replacement table; the built-in table is used when unset.
    pub replacement_table: Option<PathBuf>,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            fallback: DEFAULT_FALLBACK.to_string(),
            replacement_table: None,
        }
    }
}

impl RewriteConfig {
    /// Reads `.env` (if present) and then the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup. Unset variables
    /// keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(MAX_DEPTH_ENV_VAR) {
            config.max_depth = raw.trim().parse().map_err(|_| GuardError::InvalidConfig {
                key: MAX_DEPTH_ENV_VAR.to_string(),
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = lookup(FALLBACK_ENV_VAR) {
            if raw.trim().is_empty() {
                return Err(GuardError::InvalidConfig {
                    key: FALLBACK_ENV_VAR.to_string(),
                    value: raw,
                });
            }
            config.fallback = raw.trim().to_string();
        }
        if let Some(raw) = lookup(REPLACEMENTS_ENV_VAR).filter(|p| !p.trim().is_empty()) {
            config.replacement_table = Some(PathBuf::from(raw.trim()));
        }

        Ok(config)
    }

    /// The configured replacement table with the configured fallback.
    pub fn load_replacement_map(&self) -> Result<ReplacementMap> {
        let map = match &self.replacement_table {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading replacement table");
                ReplacementMap::from_csv_path(path)?
            }
            None => ReplacementMap::builtin(),
        };
        Ok(map.with_fallback(&self.fallback))
    }
}
