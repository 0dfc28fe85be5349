//! Matcher construction for command echo and prompt boundaries.
//!
//! Commands and the prompt marker are literal text, so they are escaped
//! before being embedded in a pattern. Both matchers are anchored to the
//! whole buffer and capture in dotall mode, since command output spans
//! lines.

use regex::Regex;

use crate::error::PatternError;

/// Regex metacharacters that must be escaped when embedding literal text.
const METACHARACTERS: &[char] = &[
    '{', '}', '^', '.', '$', '|', '(', ')', '[', ']', '*', '+', '?', '/', '\\',
];

/// Insert a backslash before each regex metacharacter in `text`.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if METACHARACTERS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// A compiled pattern plus the literal text it was built from.
///
/// Two matchers take part in a command execution: the command-echo matcher,
/// built fresh per command, and the prompt-boundary matcher, cached on the
/// session since the marker never changes.
#[derive(Debug, Clone)]
pub struct Matcher {
    regex: Regex,
    literal: String,
}

impl Matcher {
    /// Matcher that strips a command's own echo: start of buffer, optional
    /// surrounding whitespace around the literal command, then everything
    /// remaining as the capture.
    pub fn command(command: &str) -> Result<Self, PatternError> {
        let pattern = format!(r"(?s)^\s*{}\s*(.*)", escape(command));
        Ok(Self {
            regex: Regex::new(&pattern)?,
            literal: command.to_string(),
        })
    }

    /// Matcher that detects command completion: everything from the start
    /// of the buffer (the capture) up to the literal prompt marker and
    /// optional trailing whitespace at the end of the buffer.
    pub fn prompt(marker: &str) -> Result<Self, PatternError> {
        let pattern = format!(r"(?s)^(.*)\s*{}\s*$", escape(marker));
        Ok(Self {
            regex: Regex::new(&pattern)?,
            literal: marker.to_string(),
        })
    }

    /// Apply the matcher, returning the first capture group on a match.
    pub fn apply(&self, haystack: &str) -> Option<String> {
        self.regex
            .captures(haystack)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// The literal text this matcher was built from.
    pub fn literal(&self) -> &str {
        &self.literal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_metacharacters() {
        assert_eq!(escape("a.b*c"), r"a\.b\*c");
        assert_eq!(escape("[PEXPECT]$"), r"\[PEXPECT\]\$");
        assert_eq!(escape("plain text"), "plain text");
        assert_eq!(escape(r"a/b\c"), r"a\/b\\c");
    }

    #[test]
    fn test_command_matcher_strips_echo() {
        let matcher = Matcher::command("ls -la").unwrap();
        let captured = matcher.apply("  ls -la   file1\nfile2").unwrap();
        assert_eq!(captured, "file1\nfile2");
    }

    #[test]
    fn test_command_matcher_requires_echo() {
        let matcher = Matcher::command("ls -la").unwrap();
        assert!(matcher.apply("file1\nfile2").is_none());
    }

    #[test]
    fn test_prompt_matcher_captures_output() {
        let matcher = Matcher::prompt("[PEXPECT]$").unwrap();
        let captured = matcher.apply("file1\nfile2\n[PEXPECT]$ ").unwrap();
        assert_eq!(captured.trim(), "file1\nfile2");
    }

    #[test]
    fn test_prompt_matcher_no_marker() {
        let matcher = Matcher::prompt("[PEXPECT]$").unwrap();
        assert!(matcher.apply("still running...\n").is_none());
    }

    #[test]
    fn test_prompt_matcher_escaped_command_text() {
        // A command full of metacharacters must not break the pattern.
        let matcher = Matcher::command("grep -E '^a.*b$' /tmp/f").unwrap();
        assert!(matcher.apply("grep -E '^a.*b$' /tmp/f\nmatch").is_some());
    }

    #[test]
    fn test_whitespace_classes_compile_and_span_crlf() {
        // Both patterns lean on \s; construction must succeed and the
        // class must absorb carriage returns as well as newlines.
        let matcher = Matcher::prompt("[PEXPECT]$").unwrap();
        let captured = matcher.apply("out\r\n[PEXPECT]$ \r\n").unwrap();
        assert_eq!(captured.trim(), "out");

        let matcher = Matcher::command("pwd").unwrap();
        assert_eq!(matcher.apply("pwd\r\n/root").unwrap(), "/root");
    }

    #[test]
    fn test_literal_preserved() {
        let matcher = Matcher::prompt("[PEXPECT]$").unwrap();
        assert_eq!(matcher.literal(), "[PEXPECT]$");
    }
}
