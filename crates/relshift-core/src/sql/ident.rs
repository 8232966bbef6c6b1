//! Validated identifiers and column types.
//!
//! Table and column names come straight from configuration and end up inside
//! SQL text, so they are checked against an allow-list before any statement
//! is built.

use crate::error::MigrationError;

/// Longest identifier accepted (MySQL's limit, which is the tighter one).
pub const MAX_IDENT_LEN: usize = 64;

/// A table or column name that is safe to interpolate into SQL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident(String);

impl Ident {
    /// Validate a name: an ASCII letter or `_`, followed by ASCII
    /// alphanumerics or `_`.
    pub fn new(value: impl Into<String>) -> Result<Self, MigrationError> {
        let value = value.into();
        let reason = if value.is_empty() {
            Some("identifier is empty")
        } else if value.len() > MAX_IDENT_LEN {
            Some("identifier is longer than 64 characters")
        } else if !value
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        {
            Some("identifier must start with a letter or underscore")
        } else if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            Some("identifier may only contain letters, digits and underscores")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(MigrationError::InvalidIdentifier { value, reason }),
            None => Ok(Self(value)),
        }
    }

    /// The raw name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix this name, re-validating the result.
    pub fn with_prefix(&self, prefix: &str) -> Result<Self, MigrationError> {
        Self::new(format!("{}{}", prefix, self.0))
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A column type as written in configuration, e.g. `INT` or `Varchar(255)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnType(String);

impl ColumnType {
    /// Integer type used for has_one foreign keys.
    pub const DEFAULT: &'static str = "INT";

    /// Validate a column type. Letters, digits, `_`, spaces, parentheses and
    /// commas are accepted; quotes and statement separators are not.
    pub fn new(value: impl Into<String>) -> Result<Self, MigrationError> {
        let value = value.into();
        let trimmed = value.trim();

        let reason = if trimmed.is_empty() {
            Some("column type is empty")
        } else if !trimmed.starts_with(|c: char| c.is_ascii_alphabetic()) {
            Some("column type must start with a letter")
        } else if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | '(' | ')' | ','))
        {
            Some("column type contains disallowed characters")
        } else if trimmed.matches('(').count() != trimmed.matches(')').count() {
            Some("column type has unbalanced parentheses")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(MigrationError::InvalidIdentifier { value, reason }),
            None => Ok(Self(trimmed.to_string())),
        }
    }

    /// The type text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ColumnType {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
