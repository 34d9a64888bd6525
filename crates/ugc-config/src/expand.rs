//! Environment variable expansion for configuration strings.
//!
//! Supports:
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

use crate::ConfigError;

/// Expand environment variable references in a string.
///
/// Returns the original string unchanged if no `${}` patterns are present.
/// Bare `$VAR` syntax is not expanded (only `${VAR}` with braces).
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    expand_with(value, field, |var| std::env::var(var).ok())
}

/// Expand `${}` references using `lookup` to resolve variables.
fn expand_with(
    value: &str,
    field: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, LookupError> {
        lookup(var).map(Some).ok_or_else(|| LookupError {
            var_name: var.to_owned(),
        })
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{0}}} not set", e.cause.var_name),
    })
}

/// Error returned when environment variable lookup fails.
struct LookupError {
    var_name: String,
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |var: &str| vars.get(var).cloned()
    }

    #[test]
    fn test_expand_simple_var() {
        let result = expand_with("${UGC_APP_ID}", "item.app_id", env(&[("UGC_APP_ID", "480")]));
        assert_eq!(result.unwrap(), "480");
    }

    #[test]
    fn test_expand_with_default_uses_value() {
        let result = expand_with(
            "${UGC_LANG:-english}",
            "item.language",
            env(&[("UGC_LANG", "french")]),
        );
        assert_eq!(result.unwrap(), "french");
    }

    #[test]
    fn test_expand_with_default_uses_default() {
        let result = expand_with("${UGC_LANG:-english}", "item.language", env(&[]));
        assert_eq!(result.unwrap(), "english");
    }

    #[test]
    fn test_expand_with_empty_default() {
        let result = expand_with("${UGC_WORKSHOP_ID:-}", "item.workshop_id", env(&[]));
        assert_eq!(result.unwrap(), "");
    }

    #[test]
    fn test_expand_missing_var_error() {
        let err = expand_with("${MISSING_APP}", "item.app_id", env(&[])).unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("MISSING_APP"));
        assert!(err.to_string().contains("item.app_id"));
    }

    #[test]
    fn test_expand_literal_unchanged() {
        let result = expand_with("123456", "item.app_id", env(&[]));
        assert_eq!(result.unwrap(), "123456");
    }

    #[test]
    fn test_bare_dollar_not_expanded() {
        let result = expand_with("$VAR", "item.language", env(&[("VAR", "x")]));
        assert_eq!(result.unwrap(), "$VAR");
    }

    #[test]
    fn test_expand_env_reads_process_environment() {
        // PATH is set in every test environment.
        let result = expand_env("${PATH}", "test.field").unwrap();
        assert!(!result.is_empty());
    }
}
