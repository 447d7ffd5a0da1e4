use serde::Serialize;

/// One executable SQL statement extracted from a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqlStatement {
    /// 1-based line on which the statement's first SQL token appears.
    line_number: usize,
    /// Statement text without its delimiter or surrounding whitespace.
    sql: String,
}

impl SqlStatement {
    pub fn new(line_number: usize, sql: impl Into<String>) -> Self {
        Self {
            line_number,
            sql: sql.into(),
        }
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }
}
