//! Configuration file parsing for `tether.toml`.
//!
//! ```rust
//! use tether_query::config::TetherConfig;
//!
//! let config = TetherConfig::from_str(r#"
//!     [relations]
//!     key_suffix = "Id"
//! "#).unwrap();
//! assert_eq!(config.relations.key_suffix, "Id");
//! assert_eq!(config.relations.primary_key, "id");
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};

/// Main configuration structure for `tether.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TetherConfig {
    /// Relation binding defaults.
    #[serde(default)]
    pub relations: RelationsConfig,

    /// Debug/logging settings.
    #[serde(default)]
    pub debug: DebugConfig,
}

impl TetherConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> QueryResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            QueryError::configuration(format!("cannot read {}: {}", path.display(), e))
                .with_source(e)
        })?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> QueryResult<Self> {
        let expanded = expand_env_vars(content);

        toml::from_str(&expanded)
            .map_err(|e| QueryError::configuration(e.to_string()).with_source(e))
    }
}

/// Defaults applied when binding relations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RelationsConfig {
    /// Suffix appended to a relation's field name to derive its key.
    #[serde(default = "default_key_suffix")]
    pub key_suffix: String,

    /// Primary key assumed for models that do not declare one.
    #[serde(default = "default_primary_key")]
    pub primary_key: String,

    /// Treat a relation without an explicit `default` flag as alternate.
    #[serde(default)]
    pub alternate_by_default: bool,
}

impl Default for RelationsConfig {
    fn default() -> Self {
        Self {
            key_suffix: default_key_suffix(),
            primary_key: default_primary_key(),
            alternate_by_default: false,
        }
    }
}

fn default_key_suffix() -> String {
    "_id".to_string()
}

fn default_primary_key() -> String {
    "id".to_string()
}

/// Debug/logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugConfig {
    /// Log every batch query at info level.
    #[serde(default)]
    pub log_batches: bool,

    /// Slow batch query threshold in milliseconds.
    #[serde(default = "default_slow_batch_threshold")]
    pub slow_batch_threshold: u64,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_batches: false,
            slow_batch_threshold: default_slow_batch_threshold(),
        }
    }
}

fn default_slow_batch_threshold() -> u64 {
    1000
}

/// Replace `${VAR}` references with environment values; unknown variables are left as-is.
fn expand_env_vars(content: &str) -> String {
    let Ok(re) = regex_lite::Regex::new(r"\$\{([^}]+)\}") else {
        return content.to_string();
    };

    let mut result = content.to_string();
    for cap in re.captures_iter(content) {
        if let Ok(value) = std::env::var(&cap[1]) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_default_config() {
        let config = TetherConfig::default();
        assert_eq!(config.relations.key_suffix, "_id");
        assert_eq!(config.relations.primary_key, "id");
        assert!(!config.relations.alternate_by_default);
        assert_eq!(config.debug.slow_batch_threshold, 1000);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [relations]
            key_suffix = "_ref"
            primary_key = "_id"
            alternate_by_default = true

            [debug]
            log_batches = true
            slow_batch_threshold = 250
        "#;

        let config = TetherConfig::from_str(toml).unwrap();
        assert_eq!(config.relations.key_suffix, "_ref");
        assert_eq!(config.relations.primary_key, "_id");
        assert!(config.relations.alternate_by_default);
        assert!(config.debug.log_batches);
        assert_eq!(config.debug.slow_batch_threshold, 250);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let err = TetherConfig::from_str("[relations]\npluralize = false\n").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfiguration);
    }

    #[test]
    fn test_env_var_expansion() {
        // SAFETY: Test runs in isolation
        unsafe {
            std::env::set_var("TETHER_TEST_PK", "uuid");
        }

        let config = TetherConfig::from_str("[relations]\nprimary_key = \"${TETHER_TEST_PK}\"\n")
            .unwrap();
        assert_eq!(config.relations.primary_key, "uuid");
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tether.toml");
        std::fs::write(&path, "[debug]\nlog_batches = true\n").unwrap();

        let config = TetherConfig::from_file(&path).unwrap();
        assert!(config.debug.log_batches);

        let missing = TetherConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert_eq!(missing.code, ErrorCode::InvalidConfiguration);
    }
}
