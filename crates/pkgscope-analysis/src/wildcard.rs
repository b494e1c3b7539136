//! Wildcard name patterns.
//!
//! `*` matches any run of characters; everything else is literal. A pattern
//! without `*` matches anywhere in the name. Matching ignores case and must
//! cover the whole name.

use regex::{Regex, RegexBuilder};

use crate::error::{AnalysisError, Result};

/// Longest pattern accepted.
pub const MAX_PATTERN_LENGTH: usize = 512;

/// Compiled regex size limit; keeps pathological patterns bounded.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

#[derive(Debug, Clone)]
pub struct Wildcard {
    source: String,
    regex: Regex,
}

impl Wildcard {
    pub fn parse(pattern: &str) -> Result<Self> {
        let trimmed = pattern.trim();
        if trimmed.chars().count() > MAX_PATTERN_LENGTH {
            return Err(AnalysisError::InvalidPattern {
                pattern: trimmed.chars().take(32).collect::<String>() + "...",
                detail: format!("longer than {MAX_PATTERN_LENGTH} characters"),
            });
        }

        let effective = if trimmed.contains('*') {
            trimmed.to_string()
        } else {
            format!("*{trimmed}*")
        };
        let body = effective
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let regex = RegexBuilder::new(&format!("^{body}$"))
            .case_insensitive(true)
            .size_limit(REGEX_SIZE_LIMIT)
            .build()
            .map_err(|e| AnalysisError::InvalidPattern {
                pattern: trimmed.to_string(),
                detail: e.to_string(),
            })?;
        Ok(Wildcard {
            source: trimmed.to_string(),
            regex,
        })
    }

    /// `None` for an absent or blank pattern, which matches everything.
    pub fn parse_optional(pattern: Option<&str>) -> Result<Option<Self>> {
        match pattern.map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => Wildcard::parse(p).map(Some),
            None => Ok(None),
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}
