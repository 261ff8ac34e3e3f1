//! SQL identifier checks
//!
//! Table and column names end up spliced into SQL text, so every name the
//! PostgreSQL backend touches goes through [`SqlIdentifier`] first.

use std::fmt;
use thiserror::Error;

/// PostgreSQL truncates identifiers beyond this length
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("identifier cannot be empty")]
    Empty,
    #[error("identifier '{name}' is {length} characters long (max 63)")]
    TooLong { name: String, length: usize },
    #[error("identifier '{0}' must start with a letter or underscore")]
    InvalidStart(String),
    #[error("identifier '{0}' may only contain ASCII letters, digits and underscores")]
    InvalidCharacters(String),
    #[error("identifier '{0}' is a reserved SQL keyword")]
    Reserved(String),
}

/// What an identifier names; only used for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    Table,
    Column,
}

const RESERVED: &[&str] = &[
    "ALL", "ALTER", "AND", "ANY", "ARRAY", "AS", "ASC", "BETWEEN", "BY", "CASE", "CHECK",
    "COLUMN", "CONSTRAINT", "CREATE", "CROSS", "DEFAULT", "DELETE", "DESC", "DISTINCT", "DROP",
    "ELSE", "END", "EXCEPT", "EXISTS", "FALSE", "FETCH", "FOR", "FOREIGN", "FROM", "FULL",
    "GRANT", "GROUP", "HAVING", "IN", "INNER", "INSERT", "INTERSECT", "INTO", "IS", "JOIN",
    "LEFT", "LIKE", "ILIKE", "LIMIT", "NOT", "NULL", "OFFSET", "ON", "OR", "ORDER", "OUTER",
    "PRIMARY", "REFERENCES", "RETURNING", "RIGHT", "SELECT", "SET", "TABLE", "THEN", "TO",
    "TRUE", "UNION", "UNIQUE", "UPDATE", "USING", "VALUES", "WHEN", "WHERE", "WITH",
];

/// A table or column name that is safe to splice into generated SQL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SqlIdentifier {
    name: String,
    kind: IdentifierKind,
}

impl SqlIdentifier {
    pub fn table(name: &str) -> Result<Self, IdentifierError> {
        Self::parse(name, IdentifierKind::Table)
    }

    pub fn column(name: &str) -> Result<Self, IdentifierError> {
        Self::parse(name, IdentifierKind::Column)
    }

    pub fn parse(name: &str, kind: IdentifierKind) -> Result<Self, IdentifierError> {
        check(name)?;
        Ok(Self {
            name: name.to_string(),
            kind,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> IdentifierKind {
        self.kind
    }
}

impl fmt::Display for SqlIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

fn check(name: &str) -> Result<(), IdentifierError> {
    let mut chars = name.chars();
    let first = chars.next().ok_or(IdentifierError::Empty)?;

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(IdentifierError::TooLong {
            name: name.to_string(),
            length: name.len(),
        });
    }
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(IdentifierError::InvalidStart(name.to_string()));
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(IdentifierError::InvalidCharacters(name.to_string()));
    }
    if is_reserved(name) {
        return Err(IdentifierError::Reserved(name.to_string()));
    }

    Ok(())
}

pub fn is_reserved(name: &str) -> bool {
    RESERVED
        .iter()
        .any(|keyword| keyword.eq_ignore_ascii_case(name))
}

/// Whether `name` would pass validation
pub fn is_valid(name: &str) -> bool {
    check(name).is_ok()
}
