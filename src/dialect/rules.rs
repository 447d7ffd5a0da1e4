//! Lexical rules that drive script splitting.
//!
//! A [`LexicalRules`] value is plain data: comment markers, quote rules and
//! the statement delimiter of one database product. Custom dialects reuse a
//! built-in vendor's rules by cloning them and adjusting fields.

use std::fmt;

/// Statement delimiter.
///
/// Matching is ASCII case-insensitive so that `GO` and `go` both terminate
/// a SQL Server batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiter {
    text: String,
    alone_on_line: bool,
}

impl Delimiter {
    /// Create a delimiter. When `alone_on_line` is set, the delimiter only
    /// matches if nothing but whitespace surrounds it on its line.
    pub fn new(text: impl Into<String>, alone_on_line: bool) -> Self {
        Self {
            text: text.into(),
            alone_on_line,
        }
    }

    /// The ANSI `;` delimiter.
    pub fn semicolon() -> Self {
        Self::new(";", false)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn alone_on_line(&self) -> bool {
        self.alone_on_line
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Self::semicolon()
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// How a closing quote character is escaped inside a quoted section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteEscape {
    /// `'it''s'`
    Doubled,
    /// `'it\'s'`
    Backslash,
    /// Either of the above (MySQL).
    DoubledOrBackslash,
}

impl QuoteEscape {
    pub fn allows_doubling(self) -> bool {
        matches!(self, Self::Doubled | Self::DoubledOrBackslash)
    }

    pub fn allows_backslash(self) -> bool {
        matches!(self, Self::Backslash | Self::DoubledOrBackslash)
    }
}

/// A quoted section: string literal or quoted identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteRule {
    pub open: char,
    pub close: char,
    pub escape: QuoteEscape,
}

impl QuoteRule {
    /// Quote opened and closed by the same character, escaped by doubling it.
    pub const fn doubled(quote: char) -> Self {
        Self {
            open: quote,
            close: quote,
            escape: QuoteEscape::Doubled,
        }
    }
}

/// A comment marker that runs to the end of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineComment {
    pub marker: &'static str,
    /// Only a comment when followed by whitespace, a control character or the
    /// end of input (MySQL `-- `).
    pub needs_space: bool,
}

impl LineComment {
    pub const fn new(marker: &'static str) -> Self {
        Self {
            marker,
            needs_space: false,
        }
    }

    pub const fn spaced(marker: &'static str) -> Self {
        Self {
            marker,
            needs_space: true,
        }
    }

    /// Whether a comment starts at the beginning of `text`.
    pub fn starts(&self, text: &str) -> bool {
        match text.strip_prefix(self.marker) {
            Some(after) => {
                !self.needs_space
                    || after
                        .chars()
                        .next()
                        .is_none_or(|c| c.is_whitespace() || c.is_control())
            }
            None => false,
        }
    }
}

/// Block comment markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockComment {
    pub open: &'static str,
    pub close: &'static str,
    /// Whether an open marker inside a comment starts a nested comment.
    pub nested: bool,
}

impl BlockComment {
    /// C-style `/* ... */`.
    pub const fn c_style(nested: bool) -> Self {
        Self {
            open: "/*",
            close: "*/",
            nested,
        }
    }
}

/// Statements whose body contains the regular delimiter and therefore need a
/// dedicated terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProceduralBlocks {
    #[default]
    None,
    /// Oracle PL/SQL: anonymous blocks and stored program units end with `/`
    /// alone on a line.
    OraclePlSql,
}

impl ProceduralBlocks {
    /// The delimiter terminating a procedural block.
    pub fn terminator(self) -> Option<Delimiter> {
        match self {
            Self::None => None,
            Self::OraclePlSql => Some(Delimiter::new("/", true)),
        }
    }

    /// Delimiter for a statement whose leading keywords are `head`, if the
    /// statement is a procedural block.
    ///
    /// `head` holds upper-cased words separated by single spaces, with
    /// comments and quoted sections removed.
    pub fn block_delimiter(self, head: &str) -> Option<Delimiter> {
        match self {
            Self::None => None,
            Self::OraclePlSql if is_plsql_block(head) => self.terminator(),
            Self::OraclePlSql => None,
        }
    }
}

fn is_plsql_block(head: &str) -> bool {
    let mut words = head.split_whitespace();
    match words.next() {
        Some("DECLARE" | "BEGIN") => true,
        Some("CREATE") => {
            let mut next = words.next();
            if next == Some("OR") {
                if words.next() != Some("REPLACE") {
                    return false;
                }
                next = words.next();
            }
            matches!(
                next,
                Some("FUNCTION" | "PROCEDURE" | "PACKAGE" | "TRIGGER" | "TYPE")
            )
        }
        _ => false,
    }
}

/// The lexical rule set of one database product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexicalRules {
    pub line_comments: Vec<LineComment>,
    pub block_comment: Option<BlockComment>,
    pub quotes: Vec<QuoteRule>,
    /// PostgreSQL-style `$tag$ ... $tag$` bodies.
    pub dollar_quotes: bool,
    /// Delimiter in effect at the start of every script.
    pub delimiter: Delimiter,
    /// Whether a `DELIMITER <text>` line may change the delimiter mid-script.
    pub delimiter_directive: bool,
    pub procedural_blocks: ProceduralBlocks,
}

impl LexicalRules {
    /// ANSI SQL: `--` and `/* */` comments, `'` strings and `"` identifiers
    /// escaped by doubling, `;` delimiter.
    pub fn ansi() -> Self {
        Self {
            line_comments: vec![LineComment::new("--")],
            block_comment: Some(BlockComment::c_style(false)),
            quotes: vec![QuoteRule::doubled('\''), QuoteRule::doubled('"')],
            dollar_quotes: false,
            delimiter: Delimiter::semicolon(),
            delimiter_directive: false,
            procedural_blocks: ProceduralBlocks::None,
        }
    }

    /// The line comment starting at the beginning of `text`, if any.
    pub(crate) fn line_comment_at(&self, text: &str) -> Option<&LineComment> {
        self.line_comments.iter().find(|comment| comment.starts(text))
    }

    pub(crate) fn quote_opened_by(&self, c: char) -> Option<QuoteRule> {
        self.quotes.iter().copied().find(|q| q.open == c)
    }
}

impl Default for LexicalRules {
    fn default() -> Self {
        Self::ansi()
    }
}
