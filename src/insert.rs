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

//! INSERT statement rewriter
//!
//! MySQL escapes quotes inside strings with a backslash, SQLite doubles
//! them. For image tables the value list is also split into fields and the
//! blob column is swapped for the name of the file it was written to.

use crate::blob::BlobStore;
use crate::config::ImageTableSpec;
use crate::error::{ColumnRole, RowIssue};
use crate::tokenizer::{Token, Tokenizer};
use std::borrow::Cow;

/// Stands in for an escaped quote while fields are split on quotes.
const QUOTE_MARKER: char = '\u{E000}';
const DOUBLED_QUOTE: &str = "''";

const DEFAULT_YEAR: &str = "0000";
const DEFAULT_PLAN: &str = "0";

/// Output of one INSERT line.
#[derive(Debug)]
pub struct RewrittenInsert {
    pub text: String,
    pub issues: Vec<RowIssue>,
}

/// Replace each backslash-escaped quote with `replacement`. Other backslash
/// pairs are copied through as they are, so `\\'` keeps its quote.
pub fn replace_escaped_quotes<'a>(line: &'a str, replacement: &str) -> Cow<'a, str> {
    if !line.contains("\\'") {
        return Cow::Borrowed(line);
    }
    let mut out = String::with_capacity(line.len() + 16);
    let mut chars = line.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\'') => out.push_str(replacement),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    Cow::Owned(out)
}

/// Rewrite an INSERT line. `table` is the quoted table name; `image` is set
/// when the table has a blob column to extract.
pub fn rewrite_insert(
    line: &str,
    table: &str,
    image: Option<&ImageTableSpec>,
    blobs: &mut BlobStore,
) -> RewrittenInsert {
    let spec = match image {
        Some(spec) => spec,
        None => {
            let mut text = replace_escaped_quotes(line, DOUBLED_QUOTE).into_owned();
            text.push('\n');
            return RewrittenInsert {
                text,
                issues: Vec::new(),
            };
        }
    };

    let mut marker = [0u8; 4];
    let protected = replace_escaped_quotes(line, QUOTE_MARKER.encode_utf8(&mut marker));
    let head_end = match value_list_start(&protected) {
        Some(pos) => pos,
        None => {
            let mut text = replace_escaped_quotes(line, DOUBLED_QUOTE).into_owned();
            text.push('\n');
            return RewrittenInsert {
                text,
                issues: vec![RowIssue::MissingValueList {
                    table: table.to_string(),
                }],
            };
        }
    };

    let mut issues = Vec::new();
    let mut text = String::with_capacity(line.len() / 2 + 64);
    text.push_str(&restore_quotes(&protected[..head_end]));

    for (n, row) in split_rows(&protected[head_end..]).iter().enumerate() {
        if n > 0 {
            text.push(',');
        }
        text.push('(');
        text.push_str(&rewrite_row(row, table, spec, blobs, &mut issues).join(","));
        text.push(')');
    }
    text.push_str(";\n");

    RewrittenInsert { text, issues }
}

/// Byte offset of the opening parenthesis of the value list: the first `(`
/// after the `VALUES` keyword. Identifiers are single tokens, so a table or
/// column named `VALUES` is not mistaken for the keyword.
fn value_list_start(line: &str) -> Option<usize> {
    let mut offset = 0;
    let mut after_values = false;
    for token in Tokenizer::new(line) {
        if after_values && token == Token::LParen {
            return Some(offset);
        }
        after_values |= token.is_keyword("VALUES");
        offset += token.to_string().len();
    }
    None
}

/// Split `(a,b),(c,d);` into rows of fields. A field is either quoted or
/// runs to the next comma or closing parenthesis outside quotes.
fn split_rows(values: &str) -> Vec<Vec<&str>> {
    let mut rows = Vec::new();
    let mut fields = Vec::new();
    let mut in_row = false;
    let mut in_quote = false;
    let mut start = 0;

    for (pos, ch) in values.char_indices() {
        if in_quote {
            in_quote = ch != '\'';
            continue;
        }
        match ch {
            '\'' if in_row => in_quote = true,
            '(' if !in_row => {
                in_row = true;
                start = pos + 1;
            }
            ',' if in_row => {
                fields.push(&values[start..pos]);
                start = pos + 1;
            }
            ')' if in_row => {
                fields.push(&values[start..pos]);
                rows.push(std::mem::take(&mut fields));
                in_row = false;
            }
            _ => {}
        }
    }
    if in_row {
        fields.push(&values[start..]);
        rows.push(fields);
    }
    rows
}

fn rewrite_row(
    fields: &[&str],
    table: &str,
    spec: &ImageTableSpec,
    blobs: &mut BlobStore,
    issues: &mut Vec<RowIssue>,
) -> Vec<String> {
    let year = fields
        .get(spec.year_column)
        .and_then(|field| field.get(1..5))
        .unwrap_or(DEFAULT_YEAR);
    let plan = fields
        .get(spec.plan_column)
        .copied()
        .filter(|field| !field.is_empty())
        .unwrap_or(DEFAULT_PLAN);

    for (role, column) in [
        (ColumnRole::Year, spec.year_column),
        (ColumnRole::Plan, spec.plan_column),
        (ColumnRole::Blob, spec.blob_column),
    ] {
        if column >= fields.len() {
            issues.push(RowIssue::ColumnOutOfRange {
                table: table.to_string(),
                role,
                column,
                fields: fields.len(),
            });
        }
    }

    fields
        .iter()
        .enumerate()
        .map(|(column, field)| {
            if column != spec.blob_column {
                return restore_quotes(field);
            }
            let digits = match field.strip_prefix("0x").or_else(|| field.strip_prefix("0X")) {
                Some(digits) => digits,
                None => {
                    if *field != "NULL" {
                        issues.push(RowIssue::NotHexLiteral {
                            table: table.to_string(),
                            column,
                        });
                    }
                    return restore_quotes(field);
                }
            };
            match blobs.store(digits, year, plan) {
                Ok(filename) => quote_literal(&filename),
                Err(source) => {
                    issues.push(RowIssue::Blob {
                        table: table.to_string(),
                        source,
                    });
                    DOUBLED_QUOTE.to_string()
                }
            }
        })
        .collect()
}

fn restore_quotes(field: &str) -> String {
    field.replace(QUOTE_MARKER, DOUBLED_QUOTE)
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', DOUBLED_QUOTE))
}
