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

//! MySQL mysqldump to SQLite script converter
//!
//! This crate reads a mysqldump file line by line and writes an SQLite
//! script. Whole tables can be left out, MySQL-only words are stripped from
//! CREATE statements, and blob columns of selected tables are written out
//! to image files, the INSERT getting the file name instead of the hex.
//!
//! ```rust
//! use mysqldump_sqlite::{Converter, RuleSet, RunConfig};
//!
//! # fn main() -> Result<(), mysqldump_sqlite::ConvertError> {
//! let rules = RuleSet::builtin()?;
//! let run = RunConfig::default();
//!
//! let dump = "CREATE TABLE `t` (\n  `id` int(10) unsigned NOT NULL,\n  PRIMARY KEY (`id`)\n) ENGINE=InnoDB;\n";
//! let mut sql = Vec::new();
//! let report = Converter::new(&rules, &run).run(dump.as_bytes(), &mut sql)?;
//!
//! assert_eq!(String::from_utf8_lossy(&sql), "CREATE TABLE `t` ( `id` int ( 10 ) ) ;\n");
//! assert_eq!(report.lines_read, 4);
//! # Ok(())
//! # }
//! ```
//!

#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod blob;
mod classifier;
mod config;
mod converter;
mod create;
mod error;
mod insert;
mod reader;
mod tokenizer;
mod transaction;

pub use blob::{decode_hex, render_filename, BlobStore};
pub use classifier::{classify, StatementKind, StatementLine, TableFilter};
pub use config::{ImageTableSpec, RuleSet, RunConfig, TransactionMode};
pub use converter::{convert_files, Converter, Flow, RewriterState, RunReport};
pub use create::CreateRewriter;
pub use error::{BlobError, ColumnRole, ConvertError, ConvertResult, LineIssue, RowIssue};
pub use insert::{rewrite_insert, RewrittenInsert};
pub use reader::LineReader;
pub use tokenizer::{Token, Tokenizer, Whitespace, Word};
pub use transaction::TransactionWrapper;
