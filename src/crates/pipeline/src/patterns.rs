//! Process-wide cache of compiled regular expressions.

use crate::{PipelineError, Result};
use dashmap::DashMap;
use regex::Regex;
use std::sync::OnceLock;

/// Registrable domain name, e.g. `dupont-plomberie.fr`
pub const DOMAIN: &str = r"^[a-zA-Z0-9][a-zA-Z0-9-]{1,61}[a-zA-Z0-9]\.[a-zA-Z]{2,}$";

/// `{{PLACEHOLDER}}` markers left in templates
pub const MUSTACHE: &str = r"\{\{[^}]+\}\}";

fn cache() -> &'static DashMap<&'static str, Regex> {
    static CACHE: OnceLock<DashMap<&'static str, Regex>> = OnceLock::new();
    CACHE.get_or_init(DashMap::new)
}

/// Compile `pattern` once and hand out cheap clones afterwards.
pub fn regex(pattern: &'static str) -> Result<Regex> {
    if let Some(re) = cache().get(pattern) {
        return Ok(re.clone());
    }
    let re = Regex::new(pattern)
        .map_err(|e| PipelineError::General(format!("invalid pattern {}: {}", pattern, e)))?;
    cache().insert(pattern, re.clone());
    Ok(re)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_regex() {
        let a = regex(r"\{\{[A-Z_]+\}\}").unwrap();
        let b = regex(r"\{\{[A-Z_]+\}\}").unwrap();
        assert!(a.is_match("{{BUSINESS_NAME}}"));
        assert_eq!(a.as_str(), b.as_str());
        assert!(regex(r"(unclosed").is_err());
    }
}
