//! Lexical state machine that splits script text into statements.
//!
//! The scan runs once, left to right. Statement text is sliced straight out of
//! the source so that comments and quoting survive byte for byte; only the
//! delimiter and the whitespace at statement boundaries are dropped. A
//! statement ending in a line comment keeps the newline that closes it, so
//! appending a delimiter never comments the delimiter out.
//!
//! Comments following a delimiter on the same line are dropped along with it.

use crate::dialect::rules::{BlockComment, Delimiter, LexicalRules, QuoteRule};
use crate::script::{Construct, ScriptError, SqlStatement};

/// Upper bound on the leading keywords kept for procedural-block detection.
const HEAD_CAPACITY: usize = 64;

const DELIMITER_DIRECTIVE: &str = "DELIMITER";

const BYTE_ORDER_MARK: char = '\u{feff}';

#[derive(Debug, Clone, Copy)]
enum Mode<'a> {
    Normal,
    LineComment,
    BlockComment {
        markers: &'a BlockComment,
        depth: usize,
        opened_at: usize,
    },
    Quoted {
        rule: QuoteRule,
        opened_at: usize,
    },
    DollarQuoted {
        tag: &'a str,
        opened_at: usize,
    },
}

/// Split `source` into statements according to `rules`.
///
/// Line numbers are 1-based and count every `\n`, including those inside
/// comments and quoted sections. A trailing statement without a delimiter is
/// still emitted. Sections that hold only whitespace and comments are not.
pub fn split_statements(
    source: &str,
    rules: &LexicalRules,
) -> Result<Vec<SqlStatement>, ScriptError> {
    Splitter::new(source, rules).run()
}

struct Splitter<'a> {
    source: &'a str,
    rules: &'a LexicalRules,
    pos: usize,
    line: usize,
    line_start: usize,
    mode: Mode<'a>,
    delimiter: Delimiter,
    statement_start: usize,
    /// Line of the first significant character of the pending statement.
    first_line: Option<usize>,
    /// The last thing consumed in the pending statement was a line comment.
    ends_in_line_comment: bool,
    head: String,
    statements: Vec<SqlStatement>,
}

impl<'a> Splitter<'a> {
    fn new(source: &'a str, rules: &'a LexicalRules) -> Self {
        let start = if source.starts_with(BYTE_ORDER_MARK) {
            BYTE_ORDER_MARK.len_utf8()
        } else {
            0
        };
        Self {
            source,
            rules,
            pos: start,
            line: 1,
            line_start: start,
            mode: Mode::Normal,
            delimiter: rules.delimiter.clone(),
            statement_start: start,
            first_line: None,
            ends_in_line_comment: false,
            head: String::new(),
            statements: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<SqlStatement>, ScriptError> {
        while let Some(c) = self.peek() {
            match self.mode {
                Mode::Normal => self.step_normal(c),
                Mode::LineComment => {
                    if c == '\n' {
                        self.mode = Mode::Normal;
                    } else {
                        self.bump();
                    }
                }
                Mode::BlockComment {
                    markers,
                    depth,
                    opened_at,
                } => self.step_block_comment(markers, depth, opened_at),
                Mode::Quoted { rule, .. } => self.step_quoted(c, rule),
                Mode::DollarQuoted { tag, .. } => {
                    if self.rest().starts_with(tag) {
                        self.advance(tag.len());
                        self.mode = Mode::Normal;
                    } else {
                        self.bump();
                    }
                }
            }
        }

        match self.mode {
            Mode::BlockComment { opened_at, .. } => Err(ScriptError::UnterminatedConstruct {
                construct: Construct::BlockComment,
                line: opened_at,
            }),
            Mode::Quoted { opened_at, .. } => Err(ScriptError::UnterminatedConstruct {
                construct: Construct::QuotedString,
                line: opened_at,
            }),
            Mode::DollarQuoted { opened_at, .. } => Err(ScriptError::UnterminatedConstruct {
                construct: Construct::DollarQuotedString,
                line: opened_at,
            }),
            Mode::Normal | Mode::LineComment => {
                self.finish_statement(self.source.len());
                Ok(self.statements)
            }
        }
    }

    fn step_normal(&mut self, c: char) {
        let rules = self.rules;
        let rest = self.rest();

        if let Some(comment) = rules.line_comment_at(rest) {
            self.push_head(' ');
            self.ends_in_line_comment = true;
            self.advance(comment.marker.len());
            self.mode = Mode::LineComment;
            return;
        }

        if let Some(markers) = &rules.block_comment {
            if rest.starts_with(markers.open) {
                self.push_head(' ');
                self.ends_in_line_comment = false;
                self.mode = Mode::BlockComment {
                    markers,
                    depth: 1,
                    opened_at: self.line,
                };
                self.advance(markers.open.len());
                return;
            }
        }

        if rules.delimiter_directive && self.first_line.is_none() && self.delimiter_directive() {
            return;
        }

        if rules.dollar_quotes && c == '$' {
            if let Some(tag) = self.dollar_tag() {
                self.mark_significant();
                self.push_head(' ');
                self.mode = Mode::DollarQuoted {
                    tag,
                    opened_at: self.line,
                };
                self.advance(tag.len());
                return;
            }
        }

        if let Some(rule) = rules.quote_opened_by(c) {
            self.mark_significant();
            self.push_head(' ');
            self.mode = Mode::Quoted {
                rule,
                opened_at: self.line,
            };
            self.bump();
            return;
        }

        if self.at_delimiter() {
            return;
        }

        if !c.is_whitespace() {
            self.mark_significant();
        }
        self.push_head(c);
        self.bump();
    }

    fn step_block_comment(&mut self, markers: &'a BlockComment, depth: usize, opened_at: usize) {
        let rest = self.rest();
        if rest.starts_with(markers.close) {
            self.advance(markers.close.len());
            self.mode = if depth > 1 {
                Mode::BlockComment {
                    markers,
                    depth: depth - 1,
                    opened_at,
                }
            } else {
                Mode::Normal
            };
        } else if markers.nested && rest.starts_with(markers.open) {
            self.advance(markers.open.len());
            self.mode = Mode::BlockComment {
                markers,
                depth: depth + 1,
                opened_at,
            };
        } else {
            self.bump();
        }
    }

    fn step_quoted(&mut self, c: char, rule: QuoteRule) {
        if c == '\\' && rule.escape.allows_backslash() {
            self.bump();
            self.bump();
            return;
        }
        self.bump();
        if c == rule.close {
            if rule.escape.allows_doubling() && self.peek() == Some(rule.close) {
                self.bump();
            } else {
                self.mode = Mode::Normal;
            }
        }
    }

    /// Handle a `DELIMITER <text>` line. Returns false if the input at the
    /// cursor is not a directive.
    fn delimiter_directive(&mut self) -> bool {
        let rest = self.rest();
        let is_keyword = rest
            .get(..DELIMITER_DIRECTIVE.len())
            .is_some_and(|word| word.eq_ignore_ascii_case(DELIMITER_DIRECTIVE));
        if !is_keyword {
            return false;
        }
        let line_len = rest.find('\n').unwrap_or(rest.len());
        let argument = &rest[DELIMITER_DIRECTIVE.len()..line_len];
        if !argument.starts_with([' ', '\t']) {
            return false;
        }
        let text = argument.trim();
        if text.is_empty() {
            return false;
        }

        tracing::debug!(delimiter = text, line = self.line, "delimiter changed");
        self.delimiter = Delimiter::new(text, false);
        self.advance(line_len);
        self.statement_start = self.pos;
        true
    }

    /// Returns the `$tag$` opening a dollar-quoted body at the cursor.
    fn dollar_tag(&self) -> Option<&'a str> {
        let preceded_by_word = self.source[..self.pos]
            .chars()
            .next_back()
            .is_some_and(is_word_char);
        if preceded_by_word {
            return None;
        }
        let rest = self.rest();
        let body = &rest[1..];
        let tag_len = body.find(|c: char| !is_word_char(c))?;
        if !body[tag_len..].starts_with('$') || body.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }
        Some(&rest[..tag_len + 2])
    }

    /// Terminate the pending statement if a delimiter starts at the cursor.
    fn at_delimiter(&mut self) -> bool {
        let blocks = self.rules.procedural_blocks;
        let matched = match blocks.block_delimiter(&self.head) {
            Some(block) => self.match_delimiter(&block),
            None => self.match_delimiter(&self.delimiter).or_else(|| {
                blocks
                    .terminator()
                    .and_then(|terminator| self.match_delimiter(&terminator))
            }),
        };
        let Some(len) = matched else {
            return false;
        };

        let end = self.pos;
        self.advance(len);
        self.finish_statement(end);
        self.skip_comment_tail();
        self.statement_start = self.pos;
        true
    }

    /// Consume the rest of the line if it holds only whitespace and comments.
    fn skip_comment_tail(&mut self) {
        let rest = self.rest();
        let line = &rest[..rest.find('\n').map_or(rest.len(), |i| i + 1)];
        if is_comment_tail(line, self.rules) {
            self.advance(line.len());
        }
    }

    /// Length of `delimiter` if it matches at the cursor.
    fn match_delimiter(&self, delimiter: &Delimiter) -> Option<usize> {
        let text = delimiter.text();
        let candidate = self.source.get(self.pos..self.pos + text.len())?;
        if text.is_empty() || !candidate.eq_ignore_ascii_case(text) {
            return None;
        }
        if delimiter.alone_on_line() {
            let before = &self.source[self.line_start..self.pos];
            let after = &self.source[self.pos + text.len()..];
            let after = &after[..after.find('\n').unwrap_or(after.len())];
            if !before.trim().is_empty() || !after.trim().is_empty() {
                return None;
            }
        }
        Some(text.len())
    }

    fn finish_statement(&mut self, end: usize) {
        if let Some(line) = self.first_line.take() {
            let mut sql = self.source[self.statement_start..end].trim().to_string();
            if self.ends_in_line_comment {
                sql.push('\n');
            }
            self.statements.push(SqlStatement::new(line, sql));
        }
        self.ends_in_line_comment = false;
        self.head.clear();
    }

    fn mark_significant(&mut self) {
        self.ends_in_line_comment = false;
        if self.first_line.is_none() {
            self.first_line = Some(self.line);
        }
    }

    fn push_head(&mut self, c: char) {
        if self.head.len() >= HEAD_CAPACITY {
            return;
        }
        if is_word_char(c) {
            self.head.extend(c.to_uppercase());
        } else if !self.head.is_empty() && !self.head.ends_with(' ') {
            self.head.push(' ');
        }
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.line_start = self.pos;
        }
        Some(c)
    }

    fn advance(&mut self, len: usize) {
        let target = self.pos + len;
        while self.pos < target && self.bump().is_some() {}
    }
}

/// Whether `line` consists of whitespace, complete block comments and at most
/// one trailing line comment.
fn is_comment_tail(line: &str, rules: &LexicalRules) -> bool {
    let mut rest = line;
    loop {
        rest = rest.trim_start();
        if rest.is_empty() || rules.line_comment_at(rest).is_some() {
            return true;
        }
        let Some(markers) = &rules.block_comment else {
            return false;
        };
        let Some(body) = rest.strip_prefix(markers.open) else {
            return false;
        };
        match body.find(markers.close) {
            Some(close) if !markers.nested || !body[..close].contains(markers.open) => {
                rest = &body[close + markers.close.len()..];
            }
            _ => return false,
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
