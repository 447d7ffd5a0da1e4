//! Built-in dialect handlers, one per supported database product.

use strum_macros::{EnumIter, EnumString, IntoStaticStr};

use crate::connection::Connection;
use crate::dialect::registry::DialectConstructor;
use crate::dialect::rules::{
    BlockComment, Delimiter, LexicalRules, LineComment, ProceduralBlocks, QuoteEscape,
    QuoteRule,
};
use crate::dialect::{ConstructError, Dialect, quote_with};

/// Natively supported database products.
///
/// The string form is the handler type name, which is also the identifier
/// custom overrides use to refer to a built-in handler.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr,
)]
pub enum Vendor {
    #[strum(serialize = "DerbyDialect")]
    Derby,
    #[strum(serialize = "H2Dialect")]
    H2,
    #[strum(serialize = "HsqlDialect")]
    Hsql,
    #[strum(serialize = "SqlServerDialect")]
    SqlServer,
    #[strum(serialize = "MySqlDialect")]
    MySql,
    #[strum(serialize = "OracleDialect")]
    Oracle,
    #[strum(serialize = "PostgreSqlDialect")]
    PostgreSql,
    #[strum(serialize = "Db2Dialect")]
    Db2,
}

macro_rules! builtin_constructor {
    ($vendor:path) => {{
        fn construct<'c>(
            connection: &'c dyn Connection,
        ) -> Result<Box<dyn Dialect + 'c>, ConstructError> {
            Ok(Box::new(BuiltinDialect::new($vendor, connection)))
        }
        construct as DialectConstructor
    }};
}

impl Vendor {
    /// Prefix of the product identity this vendor is registered under.
    pub fn match_key(self) -> &'static str {
        match self {
            Vendor::Derby => "Apache Derby",
            Vendor::H2 => "H2",
            Vendor::Hsql => "HSQL Database Engine",
            Vendor::SqlServer => "Microsoft SQL Server",
            Vendor::MySql => "MySQL",
            Vendor::Oracle => "Oracle",
            Vendor::PostgreSql => "PostgreSQL",
            Vendor::Db2 => "DB2",
        }
    }

    pub fn type_name(self) -> &'static str {
        self.into()
    }

    pub fn lexical_rules(self) -> LexicalRules {
        let ansi = LexicalRules::ansi();
        match self {
            Vendor::Derby | Vendor::Hsql | Vendor::Db2 => ansi,
            Vendor::H2 => LexicalRules {
                line_comments: vec![LineComment::new("--"), LineComment::new("//")],
                dollar_quotes: true,
                ..ansi
            },
            Vendor::SqlServer => LexicalRules {
                block_comment: Some(BlockComment::c_style(true)),
                quotes: vec![
                    QuoteRule::doubled('\''),
                    QuoteRule::doubled('"'),
                    QuoteRule {
                        open: '[',
                        close: ']',
                        escape: QuoteEscape::Doubled,
                    },
                ],
                delimiter: Delimiter::new("GO", true),
                ..ansi
            },
            Vendor::MySql => LexicalRules {
                line_comments: vec![LineComment::spaced("--"), LineComment::new("#")],
                quotes: vec![
                    QuoteRule {
                        open: '\'',
                        close: '\'',
                        escape: QuoteEscape::DoubledOrBackslash,
                    },
                    QuoteRule {
                        open: '"',
                        close: '"',
                        escape: QuoteEscape::DoubledOrBackslash,
                    },
                    QuoteRule::doubled('`'),
                ],
                delimiter_directive: true,
                ..ansi
            },
            Vendor::Oracle => LexicalRules {
                procedural_blocks: ProceduralBlocks::OraclePlSql,
                ..ansi
            },
            Vendor::PostgreSql => LexicalRules {
                block_comment: Some(BlockComment::c_style(true)),
                dollar_quotes: true,
                ..ansi
            },
        }
    }

    /// Whether DDL statements take part in transactions.
    pub fn supports_ddl_transactions(self) -> bool {
        match self {
            Vendor::Derby | Vendor::SqlServer | Vendor::PostgreSql | Vendor::Db2 => true,
            Vendor::H2 | Vendor::Hsql | Vendor::MySql | Vendor::Oracle => false,
        }
    }

    pub fn quote_identifier(self, identifier: &str) -> String {
        match self {
            Vendor::MySql => quote_with(identifier, '`', '`'),
            Vendor::SqlServer => quote_with(identifier, '[', ']'),
            _ => quote_with(identifier, '"', '"'),
        }
    }

    pub fn constructor(self) -> DialectConstructor {
        match self {
            Vendor::Derby => builtin_constructor!(Vendor::Derby),
            Vendor::H2 => builtin_constructor!(Vendor::H2),
            Vendor::Hsql => builtin_constructor!(Vendor::Hsql),
            Vendor::SqlServer => builtin_constructor!(Vendor::SqlServer),
            Vendor::MySql => builtin_constructor!(Vendor::MySql),
            Vendor::Oracle => builtin_constructor!(Vendor::Oracle),
            Vendor::PostgreSql => builtin_constructor!(Vendor::PostgreSql),
            Vendor::Db2 => builtin_constructor!(Vendor::Db2),
        }
    }
}

/// Handler for a built-in vendor.
///
/// Custom handlers reuse a vendor's behavior by holding a `BuiltinDialect`
/// and delegating to it.
pub struct BuiltinDialect<'c> {
    vendor: Vendor,
    rules: LexicalRules,
    connection: Option<&'c dyn Connection>,
}

impl<'c> BuiltinDialect<'c> {
    pub fn new(vendor: Vendor, connection: &'c dyn Connection) -> Self {
        Self {
            vendor,
            rules: vendor.lexical_rules(),
            connection: Some(connection),
        }
    }

    /// A handler with no connection, for splitting scripts offline.
    pub fn detached(vendor: Vendor) -> BuiltinDialect<'static> {
        BuiltinDialect {
            vendor,
            rules: vendor.lexical_rules(),
            connection: None,
        }
    }

    /// Replace the vendor's lexical rules.
    pub fn with_rules(mut self, rules: LexicalRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn vendor(&self) -> Vendor {
        self.vendor
    }
}

impl Dialect for BuiltinDialect<'_> {
    fn type_name(&self) -> &str {
        self.vendor.type_name()
    }

    fn lexical_rules(&self) -> &LexicalRules {
        &self.rules
    }

    fn connection(&self) -> Option<&dyn Connection> {
        self.connection
    }

    fn supports_ddl_transactions(&self) -> bool {
        self.vendor.supports_ddl_transactions()
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        self.vendor.quote_identifier(identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::MetadataSnapshot;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    fn statements(vendor: Vendor, source: &str) -> Vec<(usize, String)> {
        BuiltinDialect::detached(vendor)
            .parse_script(source)
            .expect("split failed")
            .statements()
            .iter()
            .map(|s| (s.line_number(), s.sql().to_string()))
            .collect()
    }

    #[test]
    fn test_type_name_round_trips() {
        for vendor in Vendor::iter() {
            assert_eq!(Vendor::from_str(vendor.type_name()), Ok(vendor));
        }
        assert!(Vendor::from_str("no.such.Type").is_err());
    }

    #[test]
    fn test_constructor_binds_connection() {
        let conn = MetadataSnapshot::new("PostgreSQL", 12, 0);
        let dialect = (Vendor::PostgreSql.constructor())(&conn).expect("construct");
        assert_eq!(dialect.type_name(), "PostgreSqlDialect");
        assert!(dialect.connection().is_some());
        assert!(dialect.supports_ddl_transactions());
    }

    #[test]
    fn test_detached_has_no_connection() {
        assert!(BuiltinDialect::detached(Vendor::H2).connection().is_none());
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(Vendor::PostgreSql.quote_identifier("my\"table"), "\"my\"\"table\"");
        assert_eq!(Vendor::MySql.quote_identifier("orders"), "`orders`");
        assert_eq!(Vendor::SqlServer.quote_identifier("a]b"), "[a]]b]");
    }

    #[test]
    fn test_ddl_transaction_support() {
        assert!(Vendor::Derby.supports_ddl_transactions());
        assert!(!Vendor::MySql.supports_ddl_transactions());
        assert!(!Vendor::Oracle.supports_ddl_transactions());
    }

    #[test]
    fn test_sqlserver_inline_comments() {
        let source = "CREATE TABLE t (id INT) --This works\nGO\n-- This works\nINSERT INTO t VALUES (1)\nGO\nINSERT INTO t VALUES (2) /* GO */\nGO\nSELECT [col]]name] FROM t -- This works\n";
        assert_eq!(
            statements(Vendor::SqlServer, source),
            vec![
                (1, "CREATE TABLE t (id INT) --This works\n".to_string()),
                (4, "-- This works\nINSERT INTO t VALUES (1)".to_string()),
                (6, "INSERT INTO t VALUES (2) /* GO */".to_string()),
                (8, "SELECT [col]]name] FROM t -- This works\n".to_string()),
            ]
        );
    }

    #[test]
    fn test_mysql_hash_comment_and_backslash() {
        let source = "# setup\nINSERT INTO t VALUES ('O\\'Reilly; Inc');\nSELECT `a;b` FROM t;";
        assert_eq!(
            statements(Vendor::MySql, source),
            vec![
                (2, "# setup\nINSERT INTO t VALUES ('O\\'Reilly; Inc')".to_string()),
                (3, "SELECT `a;b` FROM t".to_string()),
            ]
        );
    }

    #[test]
    fn test_postgres_function_body() {
        let source = "CREATE FUNCTION inc(i int) RETURNS int AS $$\n  SELECT i + 1;\n$$ LANGUAGE sql;\n/* outer /* inner */ ; */\nSELECT inc(1);";
        assert_eq!(
            statements(Vendor::PostgreSql, source),
            vec![
                (
                    1,
                    "CREATE FUNCTION inc(i int) RETURNS int AS $$\n  SELECT i + 1;\n$$ LANGUAGE sql"
                        .to_string()
                ),
                (5, "/* outer /* inner */ ; */\nSELECT inc(1)".to_string()),
            ]
        );
    }

    #[test]
    fn test_mysql_dash_comment_needs_space() {
        let source = "SELECT 1--1;\nSELECT 2; -- trailing\nSELECT 3;";
        assert_eq!(
            statements(Vendor::MySql, source),
            vec![
                (1, "SELECT 1--1".to_string()),
                (2, "SELECT 2".to_string()),
                (3, "SELECT 3".to_string()),
            ]
        );
    }

    #[test]
    fn test_oracle_slash_after_plain_statement() {
        let source = "SELECT 1 FROM dual\n/\nCOMMIT;";
        assert_eq!(
            statements(Vendor::Oracle, source),
            vec![(1, "SELECT 1 FROM dual".to_string()), (3, "COMMIT".to_string())]
        );
    }

    #[test]
    fn test_h2_slash_comment() {
        let source = "// note; not a statement\nCREATE TABLE t (id INT);";
        assert_eq!(
            statements(Vendor::H2, source),
            vec![(2, "// note; not a statement\nCREATE TABLE t (id INT)".to_string())]
        );
    }

    #[test]
    fn test_oracle_package_body() {
        let source = "CREATE OR REPLACE PACKAGE BODY pkg AS\n  PROCEDURE p IS BEGIN NULL; END;\nEND pkg;\n/\nCOMMIT;";
        assert_eq!(
            statements(Vendor::Oracle, source),
            vec![
                (
                    1,
                    "CREATE OR REPLACE PACKAGE BODY pkg AS\n  PROCEDURE p IS BEGIN NULL; END;\nEND pkg;"
                        .to_string()
                ),
                (5, "COMMIT".to_string()),
            ]
        );
    }

    #[test]
    fn test_with_rules_overrides_splitting_only() {
        let rules = LexicalRules {
            delimiter: Delimiter::new("$$", false),
            ..Vendor::Derby.lexical_rules()
        };
        let dialect = BuiltinDialect::detached(Vendor::Derby).with_rules(rules);
        let script = dialect.parse_script("select 1; select 2$$select 3").unwrap();
        assert_eq!(script.statements().len(), 2);
        assert_eq!(dialect.type_name(), "DerbyDialect");
    }
}
