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

//! BEGIN/COMMIT placement.

use crate::config::TransactionMode;

pub const BEGIN: &str = "BEGIN TRANSACTION;\n";
pub const COMMIT: &str = "COMMIT;\n";

/// Tracks whether the output currently has a transaction open.
///
/// Every method returns the text to emit, if any. Committing is idempotent:
/// with no transaction open there is nothing to commit.
#[derive(Debug)]
pub struct TransactionWrapper {
    mode: TransactionMode,
    open: bool,
}

impl TransactionWrapper {
    pub fn new(mode: TransactionMode) -> Self {
        TransactionWrapper { mode, open: false }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Before the first line.
    pub fn begin_run(&mut self) -> Option<&'static str> {
        match self.mode {
            TransactionMode::Single => self.begin(),
            _ => None,
        }
    }

    /// On `LOCK TABLES`.
    pub fn lock(&mut self) -> Option<&'static str> {
        match self.mode {
            TransactionMode::PerTable => self.begin(),
            _ => None,
        }
    }

    /// On `UNLOCK TABLES`.
    pub fn unlock(&mut self) -> Option<&'static str> {
        match self.mode {
            TransactionMode::PerTable => self.commit(),
            _ => None,
        }
    }

    /// After the last line, or when the run stops early.
    pub fn finish(&mut self) -> Option<&'static str> {
        self.commit()
    }

    fn begin(&mut self) -> Option<&'static str> {
        if self.open {
            return None;
        }
        self.open = true;
        Some(BEGIN)
    }

    fn commit(&mut self) -> Option<&'static str> {
        if !self.open {
            return None;
        }
        self.open = false;
        Some(COMMIT)
    }
}
