//! Environment variable helpers.
//!
//! Platform credentials (`CLOUDFLARE_API_TOKEN`, `SANITY_MANAGEMENT_TOKEN`, ...) are often
//! exported empty by deployment tooling, so a blank value counts as unset everywhere here.

use crate::error::{Result, UtilsError};
use std::str::FromStr;

/// Trimmed value of `key`, `None` when unset or blank.
pub fn get_env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Like [`get_env_opt`] but a missing value is an error.
pub fn require_env(key: &str) -> Result<String> {
    get_env_opt(key).ok_or_else(|| UtilsError::MissingEnv(key.to_string()))
}

/// Parse `key` when it is set; a value that does not parse is an error.
pub fn parse_env<T: FromStr>(key: &str) -> Result<Option<T>> {
    match get_env_opt(key) {
        None => Ok(None),
        Some(value) => value.parse::<T>().map(Some).map_err(|_| UtilsError::InvalidEnv {
            key: key.to_string(),
            value,
            expected: std::any::type_name::<T>(),
        }),
    }
}

/// Parsed value of `key`, or `default` when unset or unparsable.
pub fn get_env_parse_or<T: FromStr>(key: &str, default: T) -> T {
    match parse_env(key) {
        Ok(Some(value)) => value,
        Ok(None) => default,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring environment override");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_blank_counts_as_unset() {
        env::set_var("AWEMA_TEST_BLANK_VAR", "   ");
        assert_eq!(get_env_opt("AWEMA_TEST_BLANK_VAR"), None);
        assert!(matches!(
            require_env("AWEMA_TEST_BLANK_VAR"),
            Err(UtilsError::MissingEnv(_))
        ));
        env::remove_var("AWEMA_TEST_BLANK_VAR");
    }

    #[test]
    fn test_values_are_trimmed() {
        env::set_var("AWEMA_TEST_TRIM_VAR", " zone-42 ");
        assert_eq!(get_env_opt("AWEMA_TEST_TRIM_VAR"), Some("zone-42".to_string()));
        assert_eq!(require_env("AWEMA_TEST_TRIM_VAR").unwrap(), "zone-42");
        env::remove_var("AWEMA_TEST_TRIM_VAR");
    }

    #[test]
    fn test_parse_env() {
        env::set_var("AWEMA_TEST_PORT", "8081");
        env::set_var("AWEMA_TEST_BAD_PORT", "huit");

        assert_eq!(parse_env::<u16>("AWEMA_TEST_PORT").unwrap(), Some(8081));
        assert_eq!(parse_env::<u16>("AWEMA_TEST_UNSET_PORT").unwrap(), None);
        let err = parse_env::<u16>("AWEMA_TEST_BAD_PORT").unwrap_err();
        assert!(err.to_string().contains("AWEMA_TEST_BAD_PORT"));

        assert_eq!(get_env_parse_or("AWEMA_TEST_BAD_PORT", 3000u16), 3000);
        assert_eq!(get_env_parse_or("AWEMA_TEST_PORT", 3000u16), 8081);

        env::remove_var("AWEMA_TEST_PORT");
        env::remove_var("AWEMA_TEST_BAD_PORT");
    }
}
