//! Environment variable helpers
//!
//! Configuration types take an [`EnvLookup`] instead of reading the process
//! environment directly, so tests can feed them a plain map.

use std::str::FromStr;

/// Function used to look up a configuration variable by name
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Read a variable from the process environment.
///
/// Blank values are treated as unset.
pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Lookup backed by the process environment
pub fn process_env() -> impl Fn(&str) -> Option<String> {
    env_var
}

/// Parse an optional variable, reporting the variable name on failure
pub fn parse_var<T>(lookup: EnvLookup<'_>, name: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("{name}={raw:?}: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_var_present() {
        let lookup = lookup_from(&[("TIMEOUT", " 15 ")]);
        let value: Option<u64> = parse_var(&lookup, "TIMEOUT").unwrap();
        assert_eq!(value, Some(15));
    }

    #[test]
    fn test_parse_var_missing() {
        let lookup = lookup_from(&[]);
        let value: Option<u64> = parse_var(&lookup, "TIMEOUT").unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_parse_var_invalid_names_variable() {
        let lookup = lookup_from(&[("TIMEOUT", "soon")]);
        let err = parse_var::<u64>(&lookup, "TIMEOUT").unwrap_err();
        assert!(err.starts_with("TIMEOUT="));
    }
}
