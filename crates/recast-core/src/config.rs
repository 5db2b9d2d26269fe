//! Engine configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Separator used by the `list` aggregate when joining values.
    pub list_separator: String,

    /// Key separator `flatten` uses when the step does not name one.
    pub flatten_separator: String,

    /// Pattern for `format` date fields that do not carry their own.
    pub default_date_format: String,

    /// Upper bound on the number of steps a pipeline document may declare.
    pub max_steps: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            list_separator: ", ".to_string(),
            flatten_separator: ".".to_string(),
            default_date_format: "YYYY-MM-DD".to_string(),
            max_steps: 1000,
        }
    }
}

impl EngineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `RECAST_LIST_SEPARATOR`: separator for the `list` aggregate
    /// - `RECAST_FLATTEN_SEPARATOR`: default `flatten` separator
    /// - `RECAST_DATE_FORMAT`: default date pattern for `format`
    /// - `RECAST_MAX_STEPS`: maximum steps per pipeline
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("RECAST_LIST_SEPARATOR") {
            cfg.list_separator = s;
        }

        if let Ok(s) = std::env::var("RECAST_FLATTEN_SEPARATOR") {
            if !s.is_empty() {
                cfg.flatten_separator = s;
            }
        }

        if let Ok(s) = std::env::var("RECAST_DATE_FORMAT") {
            if !s.is_empty() {
                cfg.default_date_format = s;
            }
        }

        if let Ok(s) = std::env::var("RECAST_MAX_STEPS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_steps = v;
            }
        }

        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_documents_keep_defaults() {
        let cfg: EngineConfig = serde_json::from_str(r#"{"list_separator": "|"}"#).unwrap();
        assert_eq!(cfg.list_separator, "|");
        assert_eq!(cfg.flatten_separator, ".");
        assert_eq!(cfg.max_steps, 1000);
    }
}
