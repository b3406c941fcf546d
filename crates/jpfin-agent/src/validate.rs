//! Input validation
//!
//! Every public operation validates its parameters here before building any
//! task. Validators return the normalized value.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{AgentError, Result};

type Pattern = LazyLock<std::result::Result<Regex, regex::Error>>;

static STOCK_CODE: Pattern = LazyLock::new(|| Regex::new(r"^[0-9]{4}$"));
static ENTITY_ID: Pattern = LazyLock::new(|| Regex::new(r"^E[0-9]{5}$"));
static PERIOD: Pattern = LazyLock::new(|| Regex::new(r"^[0-9]{4}$"));
static BOJ_SERIES: Pattern = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+'[A-Za-z0-9_@.$-]+$"));

fn is_match(pattern: &Pattern, value: &str) -> Result<bool> {
    pattern
        .as_ref()
        .map(|re| re.is_match(value))
        .map_err(|e| AgentError::Config(format!("invalid validation pattern: {e}")))
}

const MAX_KEYWORD_CHARS: usize = 100;

/// Four-digit TSE securities code, e.g. "7203"
pub fn stock_code(code: &str) -> Result<String> {
    let code = code.trim();
    if is_match(&STOCK_CODE, code)? {
        Ok(code.to_string())
    } else {
        Err(AgentError::validation(format!(
            "stock code must be 4 digits, got {code:?}"
        )))
    }
}

/// EDINET entity code, e.g. "E02144"
pub fn entity_id(id: &str) -> Result<String> {
    let id = id.trim().to_ascii_uppercase();
    if is_match(&ENTITY_ID, &id)? {
        Ok(id)
    } else {
        Err(AgentError::validation(format!(
            "EDINET code must be 'E' followed by 5 digits, got {id:?}"
        )))
    }
}

/// Fiscal period year, e.g. "2025"
pub fn period(period: &str) -> Result<String> {
    let period = period.trim();
    if is_match(&PERIOD, period)? {
        Ok(period.to_string())
    } else {
        Err(AgentError::validation(format!(
            "period must be a 4-digit year, got {period:?}"
        )))
    }
}

/// Non-empty search keyword
pub fn keyword(keyword: &str) -> Result<String> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Err(AgentError::validation("keyword must not be empty"));
    }
    if keyword.chars().count() > MAX_KEYWORD_CHARS {
        return Err(AgentError::validation(format!(
            "keyword must be at most {MAX_KEYWORD_CHARS} characters"
        )));
    }
    Ok(keyword.to_string())
}

/// BOJ series in `DB'CODE` form, e.g. "FM01'STRDCLUCON"
pub fn boj_series(series: &str) -> Result<String> {
    let series = series.trim();
    if is_match(&BOJ_SERIES, series)? {
        Ok(series.to_string())
    } else {
        Err(AgentError::validation(format!(
            "BOJ series must look like DB'CODE, got {series:?}"
        )))
    }
}

/// Watchlist of 1..=`max` codes, duplicates removed keeping first occurrence
pub fn watchlist<S: AsRef<str>>(codes: &[S], max: usize) -> Result<Vec<String>> {
    if codes.is_empty() {
        return Err(AgentError::validation(
            "watchlist must contain at least one stock code",
        ));
    }

    let mut unique: Vec<String> = Vec::with_capacity(codes.len());
    for code in codes {
        let code = stock_code(code.as_ref())?;
        if !unique.contains(&code) {
            unique.push(code);
        }
    }

    if unique.len() > max {
        return Err(AgentError::validation(format!(
            "watchlist holds at most {max} codes, got {}",
            unique.len()
        )));
    }

    Ok(unique)
}
