//! Malicious URL screening.
//!
//! The engine only depends on the [`UrlFilter`] trait, so the keyword
//! heuristic below can be replaced by a reputation lookup without touching it.
//! Matching is advisory: a clean result is not a guarantee.

use regex::{RegexSet, RegexSetBuilder};

/// Patterns rejected by default. Matched case-insensitively anywhere in the URL.
pub const DEFAULT_PATTERNS: &[&str] = &[
    r"malware",
    r"phishing",
    r"ransomware",
    r"trojan",
    r"keylogger",
    r"spyware",
    r"botnet",
    r"free-?bitcoin",
    r"verify-?your-?account",
];

/// Policy deciding whether a URL may be shortened.
#[cfg_attr(test, mockall::automock)]
pub trait UrlFilter: Send + Sync {
    /// Returns true if the URL should be rejected.
    fn is_malicious(&self, url: &str) -> bool;
}

/// Keyword denylist backed by a compiled [`RegexSet`].
#[derive(Debug, Clone)]
pub struct KeywordDenylist {
    patterns: RegexSet,
}

impl KeywordDenylist {
    /// Builds a denylist from the given patterns.
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] if any pattern does not compile.
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = RegexSetBuilder::new(patterns)
            .case_insensitive(true)
            .build()?;

        Ok(Self { patterns })
    }

    /// Builds the default denylist extended with `extra` patterns.
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] if any extra pattern does not compile.
    pub fn with_defaults(extra: &[String]) -> Result<Self, regex::Error> {
        let all = DEFAULT_PATTERNS
            .iter()
            .map(|p| p.to_string())
            .chain(extra.iter().cloned());

        Self::new(all)
    }
}

impl Default for KeywordDenylist {
    fn default() -> Self {
        Self {
            patterns: RegexSetBuilder::new(DEFAULT_PATTERNS)
                .case_insensitive(true)
                .build()
                .expect("default denylist patterns are valid"),
        }
    }
}

impl UrlFilter for KeywordDenylist {
    fn is_malicious(&self, url: &str) -> bool {
        self.patterns.is_match(url)
    }
}
