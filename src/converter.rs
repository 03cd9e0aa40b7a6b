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

//! Conversion driver
//!
//! Lines are handled strictly in input order: the CREATE rewriter, the
//! transaction wrapper and the blob serial number all carry state from one
//! line to the next in a single [`RewriterState`].

use crate::blob::BlobStore;
use crate::classifier::{classify, StatementKind, TableFilter};
use crate::config::{RuleSet, RunConfig};
use crate::create::CreateRewriter;
use crate::error::{ConvertError, ConvertResult, LineIssue};
use crate::insert::rewrite_insert;
use crate::reader::LineReader;
use crate::transaction::TransactionWrapper;
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};

/// The per-run mutable state, threaded through every line.
#[derive(Debug)]
pub struct RewriterState {
    pub create: CreateRewriter,
    pub transaction: TransactionWrapper,
    pub blobs: BlobStore,
}

impl RewriterState {
    pub fn new(rules: &RuleSet, run: &RunConfig) -> Self {
        RewriterState {
            create: CreateRewriter::new(),
            transaction: TransactionWrapper::new(run.transaction),
            blobs: BlobStore::new(
                &run.image_dir,
                rules.filename_template.as_str(),
                run.first_image_number,
            ),
        }
    }
}

/// What the operator needs to know once the run is over.
#[derive(Debug, Default)]
pub struct RunReport {
    pub lines_read: u64,
    pub lines_excluded: u64,
    pub inserts_processed: usize,
    pub images_stored: u64,
    /// Pass this as the first image number of the next run.
    pub next_image_number: u64,
    pub stopped_at_insert_limit: bool,
    pub issues: Vec<LineIssue>,
}

/// Whether to keep reading after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub struct Converter<'a> {
    rules: &'a RuleSet,
    filter: TableFilter<'a>,
    max_inserts: Option<usize>,
    max_line_bytes: usize,
    state: RewriterState,
    report: RunReport,
}

impl<'a> Converter<'a> {
    pub fn new(rules: &'a RuleSet, run: &'a RunConfig) -> Self {
        Converter {
            rules,
            filter: TableFilter::new(rules, run.only_table.as_deref()),
            max_inserts: run.max_inserts.filter(|&max| max > 0),
            max_line_bytes: run.max_line_bytes,
            state: RewriterState::new(rules, run),
            report: RunReport::default(),
        }
    }

    pub fn state(&self) -> &RewriterState {
        &self.state
    }

    /// Convert `input` into `output`, line by line.
    pub fn run<R: BufRead, W: Write>(self, input: R, output: W) -> ConvertResult<RunReport> {
        self.rules.validate()?;
        self.convert(input, output)
    }

    fn convert<R: BufRead, W: Write>(mut self, input: R, mut output: W) -> ConvertResult<RunReport> {
        let mut reader = LineReader::new(input, self.max_line_bytes);

        self.begin(&mut output)?;
        while let Some((number, line)) = reader.next_line()? {
            if self.process_line(number, line, &mut output)? == Flow::Stop {
                info!("Stopping after {} inserts", self.report.inserts_processed);
                break;
            }
        }
        self.finish(&mut output)
    }

    pub fn begin<W: Write>(&mut self, output: &mut W) -> ConvertResult<()> {
        if let Some(text) = self.state.transaction.begin_run() {
            output.write_all(text.as_bytes())?;
        }
        Ok(())
    }

    /// Handle one input line. `number` is its 1-based position in the input.
    pub fn process_line<W: Write>(
        &mut self,
        number: u64,
        line: &str,
        output: &mut W,
    ) -> ConvertResult<Flow> {
        self.report.lines_read += 1;
        let statement = classify(line);

        if let Some(table) = &statement.table {
            if self.filter.exclude(table) {
                if statement.kind == StatementKind::Create {
                    debug!("Dropping {}", table);
                }
                self.report.lines_excluded += 1;
                return Ok(Flow::Continue);
            }
        }

        match statement.kind {
            StatementKind::Create => {
                if let Some(table) = &statement.table {
                    debug!("Creating {}", table);
                }
                self.state.create.start();
                let text = self.state.create.rewrite_line(line, self.rules);
                output.write_all(text.as_bytes())?;
            }
            StatementKind::Drop => {
                output.write_all(line.as_bytes())?;
                output.write_all(b"\n")?;
            }
            StatementKind::Insert => {
                let table = statement.table.as_deref().unwrap_or_default();
                let image = self.rules.image_table(table);
                let rewritten = rewrite_insert(line, table, image, &mut self.state.blobs);
                output.write_all(rewritten.text.as_bytes())?;
                for issue in rewritten.issues {
                    let issue = LineIssue {
                        line: number,
                        issue,
                    };
                    warn!("{}", issue);
                    self.report.issues.push(issue);
                }

                self.report.inserts_processed += 1;
                if let Some(max) = self.max_inserts {
                    if self.report.inserts_processed >= max {
                        self.report.stopped_at_insert_limit = true;
                        return Ok(Flow::Stop);
                    }
                }
            }
            StatementKind::Lock => {
                if let Some(text) = self.state.transaction.lock() {
                    output.write_all(text.as_bytes())?;
                }
            }
            StatementKind::Unlock => {
                if let Some(text) = self.state.transaction.unlock() {
                    output.write_all(text.as_bytes())?;
                }
            }
            StatementKind::Continuation => {
                if self.state.create.is_open() {
                    let text = self.state.create.rewrite_line(line, self.rules);
                    output.write_all(text.as_bytes())?;
                }
            }
        }
        Ok(Flow::Continue)
    }

    /// Close any open transaction, flush, and hand back the report.
    pub fn finish<W: Write>(mut self, output: &mut W) -> ConvertResult<RunReport> {
        if let Some(text) = self.state.transaction.finish() {
            output.write_all(text.as_bytes())?;
        }
        output.flush()?;

        self.report.images_stored = self.state.blobs.stored();
        self.report.next_image_number = self.state.blobs.next_number();
        info!(
            "Processed {} lines, {} inserts, {} issues",
            self.report.lines_read,
            self.report.inserts_processed,
            self.report.issues.len()
        );
        Ok(self.report)
    }
}

/// Convert the files named in `run`.
pub fn convert_files(rules: &RuleSet, run: &RunConfig) -> ConvertResult<RunReport> {
    rules.validate()?;
    let input = File::open(&run.input).map_err(|source| ConvertError::OpenInput {
        path: run.input.clone(),
        source,
    })?;
    let output = File::create(&run.output).map_err(|source| ConvertError::CreateOutput {
        path: run.output.clone(),
        source,
    })?;
    info!("Converting {} into {}", run.input.display(), run.output.display());

    Converter::new(rules, run).convert(BufReader::new(input), BufWriter::new(output))
}
