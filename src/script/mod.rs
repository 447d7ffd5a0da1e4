//! SQL scripts and statement splitting
//!
//! A [`SqlScript`] is built once from raw text and the lexical rules of a
//! dialect. Its statements are in source order and are meant to be executed
//! one at a time by the caller.

mod splitter;
mod statement;

pub use splitter::split_statements;
pub use statement::SqlStatement;

use strum_macros::Display;
use thiserror::Error;

use crate::dialect::Dialect;
use crate::dialect::rules::LexicalRules;

/// A lexical construct that must be closed before the script ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Construct {
    #[strum(serialize = "block comment")]
    BlockComment,
    #[strum(serialize = "quoted string")]
    QuotedString,
    #[strum(serialize = "dollar-quoted string")]
    DollarQuotedString,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("Unterminated {construct} starting at line {line}")]
    UnterminatedConstruct { construct: Construct, line: usize },
}

/// A migration script split into executable statements.
#[derive(Debug, Clone)]
pub struct SqlScript {
    source: String,
    statements: Vec<SqlStatement>,
    dialect: String,
}

impl SqlScript {
    /// Split `source` with the lexical rules of `dialect`.
    pub fn parse(source: &str, dialect: &dyn Dialect) -> Result<Self, ScriptError> {
        Self::with_rules(source, dialect.lexical_rules(), dialect.type_name())
    }

    /// Split `source` with explicit rules, recording `dialect` as the name of
    /// the handler the rules came from.
    pub fn with_rules(
        source: &str,
        rules: &LexicalRules,
        dialect: impl Into<String>,
    ) -> Result<Self, ScriptError> {
        let dialect = dialect.into();
        let statements = split_statements(source, rules)?;
        tracing::debug!(
            dialect = %dialect,
            statements = statements.len(),
            "parsed SQL script"
        );
        Ok(Self {
            source: source.to_string(),
            statements,
            dialect,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn statements(&self) -> &[SqlStatement] {
        &self.statements
    }

    /// Type name of the dialect handler whose rules split this script.
    pub fn dialect(&self) -> &str {
        &self.dialect
    }

    pub fn into_statements(self) -> Vec<SqlStatement> {
        self.statements
    }
}
