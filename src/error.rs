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

//! Error types.
//!
//! [`ConvertError`] stops a run before or while reading lines. [`RowIssue`]
//! and [`BlobError`] are per-line problems: the offending value gets a safe
//! placeholder, the issue lands in the run report and the run carries on.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal conversion error.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("can't open input {path}: {source}")]
    OpenInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("can't create output {path}: {source}")]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("can't read rule file {path}: {source}")]
    ReadRules {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid rule document: {0}")]
    ParseRules(#[from] serde_yaml::Error),

    /// The rule document does not carry `FlagOK: true`.
    #[error("configuration not good, please fix and try again")]
    RulesNotOk,

    #[error("line {line} is longer than the maximum line size of {limit} bytes")]
    LineTooLong { line: u64, limit: usize },

    #[error("line {line}: can't decode input: {message}")]
    Read { line: u64, message: String },

    #[error("write failed: {0}")]
    Io(#[from] io::Error),
}

/// Result alias for fatal conversion errors.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Failure to turn a hex digit run into an image file.
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("odd number of hex digits ({0})")]
    OddLength(usize),

    #[error("invalid hex digit {digit:?} at offset {offset}")]
    InvalidDigit { digit: char, offset: usize },

    #[error("can't write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Which configured column of an image table a [`RowIssue`] is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Blob,
    Year,
    Plan,
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            ColumnRole::Blob => "blob",
            ColumnRole::Year => "year",
            ColumnRole::Plan => "plan",
        })
    }
}

/// A recoverable problem found while rewriting one line.
#[derive(Debug, Error)]
pub enum RowIssue {
    #[error("{role} column {column} of {table} is out of range, row has {fields} fields")]
    ColumnOutOfRange {
        table: String,
        role: ColumnRole,
        column: usize,
        fields: usize,
    },

    #[error("no value list found in INSERT into {table}")]
    MissingValueList { table: String },

    #[error("blob column {column} of {table} is not a hex literal")]
    NotHexLiteral { table: String, column: usize },

    #[error("blob of {table}: {source}")]
    Blob {
        table: String,
        #[source]
        source: BlobError,
    },
}

/// A [`RowIssue`] tagged with the 1-based input line it came from.
#[derive(Debug)]
pub struct LineIssue {
    pub line: u64,
    pub issue: RowIssue,
}

impl fmt::Display for LineIssue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.issue)
    }
}
