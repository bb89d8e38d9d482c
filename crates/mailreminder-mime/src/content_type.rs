//! MIME content type handling.

use crate::error::{Error, Result};
use std::fmt;

/// MIME content type with parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (e.g., "text", "multipart"), lowercased.
    pub main_type: String,
    /// Subtype (e.g., "plain", "report"), lowercased.
    pub sub_type: String,
    /// Parameters in declaration order; names lowercased.
    pub parameters: Vec<(String, String)>,
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into().to_ascii_lowercase(),
            sub_type: sub_type.into().to_ascii_lowercase(),
            parameters: Vec::new(),
        }
    }

    /// Creates a `text/plain; charset=utf-8` content type.
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text", "plain").with_parameter("charset", "utf-8")
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters
            .push((key.into().to_ascii_lowercase(), value.into()));
        self
    }

    /// Returns a parameter value by (case-insensitive) name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameter("boundary")
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type == "multipart"
    }

    /// Checks if this is `text/plain`.
    #[must_use]
    pub fn is_text_plain(&self) -> bool {
        self.main_type == "text" && self.sub_type == "plain"
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2="quoted value"`
    ///
    /// # Errors
    ///
    /// Returns an error if the `type/subtype` part is missing or malformed.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = split_parameters(s).into_iter();

        let type_str = parts.next().unwrap_or_default();
        let (main_type, sub_type) = type_str
            .trim()
            .split_once('/')
            .filter(|(m, s)| !m.trim().is_empty() && !s.trim().is_empty())
            .ok_or_else(|| Error::InvalidContentType(s.to_string()))?;

        let mut content_type = Self::new(main_type.trim(), sub_type.trim());

        for param in parts {
            if let Some((key, value)) = param.split_once('=') {
                let value = value.trim();
                let value = value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(value);
                content_type = content_type.with_parameter(key.trim(), value);
            }
        }

        Ok(content_type)
    }
}

/// Splits on `;` outside of double quotes.
fn split_parameters(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in s.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ';' if !in_quotes => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current);
    }

    parts
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.sub_type)?;
        for (key, value) in &self.parameters {
            write!(f, "; {key}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let ct = ContentType::parse("text/plain").unwrap();
        assert!(ct.is_text_plain());
        assert!(ct.parameters.is_empty());
    }

    #[test]
    fn test_parse_case_insensitive() {
        let ct = ContentType::parse("Text/PLAIN; Charset=UTF-8").unwrap();
        assert!(ct.is_text_plain());
        assert_eq!(ct.parameter("charset"), Some("UTF-8"));
    }

    #[test]
    fn test_parse_quoted_boundary_with_semicolon() {
        let ct =
            ContentType::parse("multipart/report; report-type=delivery-status; boundary=\"a;b\"")
                .unwrap();
        assert!(ct.is_multipart());
        assert_eq!(ct.boundary(), Some("a;b"));
        assert_eq!(ct.parameter("report-type"), Some("delivery-status"));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(ContentType::parse("").is_err());
        assert!(ContentType::parse("textplain").is_err());
        assert!(ContentType::parse("text/").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ContentType::text_plain().to_string(),
            "text/plain; charset=utf-8"
        );
    }
}
