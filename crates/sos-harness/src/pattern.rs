//! Patterns matched against accumulated output.
//!
//! Every pattern is a compiled regular expression. Plain strings are
//! compiled as regexes, so `"[uk]sh>"` matches both `ush>` and `ksh>`;
//! use [`Pattern::literal`] to match text verbatim.

use std::fmt;

use regex::Regex;

use crate::error::Result;

/// Prompt waited for after each command (user or kernel shell).
pub const DEFAULT_PROMPT: &str = "[uk]sh>";

/// Prompt that signals the target finished booting.
pub const READY_PROMPT: &str = "ush>";

/// Delimiter the kernel prints after a fault report.
pub const FAULT_REPORT_MARKER: &str = "END OF FAULT REPORT";

/// A compiled pattern together with its source text.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile a regular expression.
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            source: pattern.to_string(),
            regex: Regex::new(pattern)?,
        })
    }

    /// Match `text` verbatim.
    ///
    /// Infallible: [`regex::escape`] output is always a valid regex, and
    /// the default size limits are far above any console text.
    #[must_use]
    pub fn literal(text: &str) -> Self {
        let escaped = regex::escape(text);
        Self {
            source: text.to_string(),
            // Only an escaping bug in `regex` itself could make this fail.
            regex: Regex::new(&escaped).expect("escaped literal is a valid regex"),
        }
    }

    /// Get the source pattern.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Get the compiled regex.
    #[must_use]
    pub const fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Check whether the pattern occurs anywhere in `text`.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Find the first occurrence in `text`.
    #[must_use]
    pub fn find<'t>(&self, text: &'t str) -> Option<regex::Match<'t>> {
        self.regex.find(text)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.source)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        Self {
            source: regex.as_str().to_string(),
            regex,
        }
    }
}

/// Conversion into a [`Pattern`], compiling strings as regexes.
pub trait IntoPattern {
    /// Perform the conversion.
    fn into_pattern(self) -> Result<Pattern>;
}

impl IntoPattern for Pattern {
    fn into_pattern(self) -> Result<Pattern> {
        Ok(self)
    }
}

impl IntoPattern for &Pattern {
    fn into_pattern(self) -> Result<Pattern> {
        Ok(self.clone())
    }
}

impl IntoPattern for Regex {
    fn into_pattern(self) -> Result<Pattern> {
        Ok(Pattern::from(self))
    }
}

impl IntoPattern for &str {
    fn into_pattern(self) -> Result<Pattern> {
        Pattern::new(self)
    }
}

impl IntoPattern for String {
    fn into_pattern(self) -> Result<Pattern> {
        Pattern::new(&self)
    }
}

impl IntoPattern for &String {
    fn into_pattern(self) -> Result<Pattern> {
        Pattern::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prompt_matches_both_shells() {
        let prompt = Pattern::new(DEFAULT_PROMPT).unwrap();
        assert!(prompt.is_match("file1\nush> "));
        assert!(prompt.is_match("ksh> "));
        assert!(!prompt.is_match("sh> "));
    }

    #[test]
    fn literal_escapes_metacharacters() {
        let pattern = Pattern::literal("[uk]sh>");
        assert!(pattern.is_match("prompt [uk]sh> here"));
        assert!(!pattern.is_match("ush>"));
        assert_eq!(pattern.as_str(), "[uk]sh>");
    }

    #[test]
    fn literal_accepts_any_text() {
        // Every regex metacharacter, plus text that would not compile as a regex.
        for text in [r"\.+*?()|[]{}^$#&-~", "[unclosed", "(", r"\", "a{2,1}", ""] {
            let pattern = Pattern::literal(text);
            assert!(pattern.is_match(&format!("before {text} after")), "{text:?}");
            assert_eq!(pattern.as_str(), text);
        }
    }

    #[test]
    fn invalid_regex() {
        let err = "[unclosed".into_pattern().unwrap_err();
        assert!(err.to_string().contains("invalid pattern"));
    }

    #[test]
    fn precompiled_regex() {
        let pattern = Regex::new(r"pid=\d+").unwrap().into_pattern().unwrap();
        assert_eq!(pattern.as_str(), r"pid=\d+");
        assert_eq!(pattern.find("spawned pid=42\n").unwrap().as_str(), "pid=42");
    }
}
