use thiserror::Error;

const TABLE_NAME_VAR: &str = "BOOKMARKS_TABLE_NAME";
const ROUTE_PREFIX_VAR: &str = "BOOKMARKS_ROUTE_PREFIX";

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
    #[error("{var} must start with '/', got {value:?}")]
    InvalidPrefix { var: &'static str, value: String },
}

/// Settings read once at process start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Config {
    pub table_name: String,
    /// Prepended to every route template, e.g. `/rb`. Empty when unset.
    pub route_prefix: String,
}

impl Config {
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let table_name = lookup(TABLE_NAME_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing(TABLE_NAME_VAR))?;

        let route_prefix = match lookup(ROUTE_PREFIX_VAR).map(|v| v.trim().to_string()) {
            None => String::new(),
            Some(v) if v.is_empty() => String::new(),
            Some(v) if !v.starts_with('/') => {
                return Err(ConfigError::InvalidPrefix {
                    var: ROUTE_PREFIX_VAR,
                    value: v,
                })
            }
            Some(v) => v.trim_end_matches('/').to_string(),
        };

        Ok(Self {
            table_name,
            route_prefix,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_should_require_table_name() {
        assert_eq!(
            Config::from_lookup(lookup(&[])),
            Err(ConfigError::Missing(TABLE_NAME_VAR))
        );
        assert_eq!(
            Config::from_lookup(lookup(&[(TABLE_NAME_VAR, "  ")])),
            Err(ConfigError::Missing(TABLE_NAME_VAR))
        );
    }

    #[test]
    fn test_should_default_to_empty_prefix() {
        let config = Config::from_lookup(lookup(&[(TABLE_NAME_VAR, "bookmarks")])).unwrap();
        assert_eq!(config.table_name, "bookmarks");
        assert_eq!(config.route_prefix, "");
    }

    #[test]
    fn test_should_trim_trailing_slash_from_prefix() {
        let config = Config::from_lookup(lookup(&[
            (TABLE_NAME_VAR, "bookmarks"),
            (ROUTE_PREFIX_VAR, "/rb/"),
        ]))
        .unwrap();
        assert_eq!(config.route_prefix, "/rb");
    }

    #[test]
    fn test_should_reject_relative_prefix() {
        let err = Config::from_lookup(lookup(&[
            (TABLE_NAME_VAR, "bookmarks"),
            (ROUTE_PREFIX_VAR, "rb"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPrefix { .. }));
    }
}
