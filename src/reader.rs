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

//! Bounded line reader.

use crate::error::{ConvertError, ConvertResult};
use std::io::BufRead;
use utf8_chars::BufReadCharsExt;

/// Reads UTF-8 lines one at a time, refusing any line longer than a limit.
pub struct LineReader<R> {
    reader: R,
    max_bytes: usize,
    line_number: u64,
    line: String,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(reader: R, max_bytes: usize) -> Self {
        LineReader {
            reader,
            max_bytes,
            line_number: 0,
            line: String::new(),
        }
    }

    /// The next line with its 1-based number, without the line ending.
    pub fn next_line(&mut self) -> ConvertResult<Option<(u64, &str)>> {
        self.line.clear();
        let number = self.line_number + 1;
        let mut bytes = 0;
        let mut read_any = false;

        for ch in self.reader.chars() {
            let ch = ch.map_err(|e| ConvertError::Read {
                line: number,
                message: e.to_string(),
            })?;
            read_any = true;
            if ch == '\n' {
                break;
            }
            bytes += ch.len_utf8();
            if bytes > self.max_bytes {
                return Err(ConvertError::LineTooLong {
                    line: number,
                    limit: self.max_bytes,
                });
            }
            self.line.push(ch);
        }

        if !read_any {
            return Ok(None);
        }
        self.line_number = number;
        if self.line.ends_with('\r') {
            self.line.pop();
        }
        Ok(Some((number, &self.line)))
    }
}
