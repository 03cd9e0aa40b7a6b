// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Statement classification and table filtering.
//!
//! The table name is found by token position. The offsets match the
//! statements mysqldump writes (`DROP TABLE IF EXISTS `t`;`,
//! `INSERT INTO `t` VALUES ...`, `LOCK TABLES `t` WRITE;`); other spellings,
//! such as `CREATE TABLE IF NOT EXISTS`, pick up the wrong token.
//!
//! The kind comes from the very first token of the line. A line starting
//! with whitespace or a comment is a continuation, whatever follows.

use crate::config::{unquote_identifier, RuleSet};
use crate::tokenizer::{Token, Tokenizer};

/// Statement kind, from the first token of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Create,
    Drop,
    Insert,
    Lock,
    Unlock,
    /// Anything else; only meaningful while a CREATE statement is open.
    Continuation,
}

/// One input line with its kind and the table it references, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementLine<'a> {
    pub text: &'a str,
    pub kind: StatementKind,
    /// The table token exactly as written, quotes included.
    pub table: Option<String>,
}

// Enough tokens for the longest prefix we look at: DROP TABLE IF EXISTS `t`
const HEAD_TOKENS: usize = 5;

pub fn classify(line: &str) -> StatementLine<'_> {
    let mut tokens = Tokenizer::new(line);
    let first = tokens.next();
    let kind = match &first {
        Some(t) if t.is_keyword("CREATE") => StatementKind::Create,
        Some(t) if t.is_keyword("DROP") => StatementKind::Drop,
        Some(t) if t.is_keyword("INSERT") => StatementKind::Insert,
        Some(t) if t.is_keyword("LOCK") => StatementKind::Lock,
        Some(t) if t.is_keyword("UNLOCK") => StatementKind::Unlock,
        _ => StatementKind::Continuation,
    };

    let head: Vec<Token> = first
        .into_iter()
        .chain(tokens)
        .filter(|t| !t.is_whitespace())
        .take(HEAD_TOKENS)
        .collect();
    let third_is = |keyword: &str| head.get(2).map_or(false, |t| t.is_keyword(keyword));
    let table_index = match kind {
        StatementKind::Drop if third_is("IF") => Some(4),
        StatementKind::Insert if third_is("INTO") => Some(3),
        StatementKind::Create | StatementKind::Drop | StatementKind::Insert | StatementKind::Lock => {
            Some(2)
        }
        StatementKind::Unlock | StatementKind::Continuation => None,
    };

    StatementLine {
        text: line,
        kind,
        table: table_index
            .and_then(|ix| head.get(ix))
            .map(|t| t.to_string()),
    }
}

/// Decides which tables make it into the output.
#[derive(Debug, Clone, Copy)]
pub struct TableFilter<'a> {
    rules: &'a RuleSet,
    only_table: Option<&'a str>,
}

impl<'a> TableFilter<'a> {
    pub fn new(rules: &'a RuleSet, only_table: Option<&'a str>) -> Self {
        TableFilter { rules, only_table }
    }

    /// True if lines referencing `table` (quoted, as in the dump) are dropped.
    pub fn exclude(&self, table: &str) -> bool {
        if let Some(only) = self.only_table {
            if unquote_identifier(table) != Some(only) {
                return true;
            }
        }
        self.rules.is_excluded(table)
    }
}
