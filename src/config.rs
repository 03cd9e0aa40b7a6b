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

//! Rule set and run configuration.

use crate::error::{ConvertError, ConvertResult};
use log::{debug, info};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_RULES: &str = include_str!("default_rules.yaml");

/// Placeholder replaced, in order, by year, plan and serial number.
pub const FILENAME_PLACEHOLDER: &str = "%v";

fn default_filename_template() -> String {
    "y%v-p%v-i%v.jpg".to_string()
}

/// A table whose blob column is written out to files.
///
/// Column indices are 0-based positions within a row of the INSERT value list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageTableSpec {
    #[serde(rename = "name")]
    pub table: String,
    #[serde(rename = "ix")]
    pub blob_column: usize,
    #[serde(rename = "year")]
    pub year_column: usize,
    #[serde(rename = "plan")]
    pub plan_column: usize,
}

/// Conversion rules. Never changes once a run has started.
///
/// Table names are given bare; they match backtick-quoted identifiers in the
/// dump.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSet {
    #[serde(rename = "DropTables", default)]
    pub excluded_tables: HashSet<String>,
    #[serde(rename = "DropWords", default)]
    pub drop_words: HashSet<String>,
    #[serde(rename = "SkipWords", default)]
    pub skip_words: HashSet<String>,
    #[serde(rename = "SkipClauses", default)]
    pub skip_clauses: HashSet<String>,
    #[serde(rename = "ExtractImageTables", default)]
    pub image_tables: Vec<ImageTableSpec>,
    #[serde(rename = "ImageFilename", default = "default_filename_template")]
    pub filename_template: String,
    #[serde(rename = "FlagOK", default)]
    pub ok: bool,
}

impl RuleSet {
    /// The built-in rules: generic MySQL words with no SQLite equivalent,
    /// no excluded tables and no image tables.
    pub fn builtin() -> ConvertResult<RuleSet> {
        RuleSet::from_yaml_str(DEFAULT_RULES)
    }

    pub fn from_yaml_str(document: &str) -> ConvertResult<RuleSet> {
        Ok(serde_yaml::from_str(document)?)
    }

    /// Load a rule document from a YAML file.
    pub fn load(path: &Path) -> ConvertResult<RuleSet> {
        let content = fs::read_to_string(path).map_err(|source| ConvertError::ReadRules {
            path: path.to_path_buf(),
            source,
        })?;
        let rules = RuleSet::from_yaml_str(&content)?;
        info!(
            "Loaded rules from {}: {} excluded tables, {} image tables",
            path.display(),
            rules.excluded_tables.len(),
            rules.image_tables.len()
        );
        Ok(rules)
    }

    /// Refuse to run on a rule document that isn't flagged OK.
    pub fn validate(&self) -> ConvertResult<()> {
        if !self.ok {
            debug!("{:?}", self);
            return Err(ConvertError::RulesNotOk);
        }
        Ok(())
    }

    /// Image-table descriptor for a quoted table name as it appears in the dump.
    pub fn image_table(&self, quoted_table: &str) -> Option<&ImageTableSpec> {
        let name = unquote_identifier(quoted_table)?;
        self.image_tables.iter().find(|spec| spec.table == name)
    }

    pub fn is_excluded(&self, quoted_table: &str) -> bool {
        unquote_identifier(quoted_table)
            .map(|name| self.excluded_tables.contains(name))
            .unwrap_or(false)
    }
}

/// Strip the backticks from a MySQL quoted identifier. Bare names give `None`:
/// configured names only match identifiers quoted the way mysqldump quotes them.
pub fn unquote_identifier(token: &str) -> Option<&str> {
    token.strip_prefix('`')?.strip_suffix('`')
}

/// Where BEGIN/COMMIT go in the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TransactionMode {
    /// No transaction statements
    #[default]
    None,
    /// One transaction around the whole script
    Single,
    /// One transaction per LOCK TABLES / UNLOCK TABLES span
    PerTable,
}

/// Everything a run needs besides the rules.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Longest accepted input line, in bytes.
    pub max_line_bytes: usize,
    /// Stop after this many INSERT statements have been processed. `Some(0)`
    /// means no limit.
    pub max_inserts: Option<usize>,
    /// Only convert this table (bare name).
    pub only_table: Option<String>,
    pub transaction: TransactionMode,
    pub image_dir: PathBuf,
    pub first_image_number: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            input: PathBuf::new(),
            output: PathBuf::from("sqlite.sql"),
            max_line_bytes: 4000 * 1024,
            max_inserts: None,
            only_table: None,
            transaction: TransactionMode::default(),
            image_dir: PathBuf::from("images"),
            first_image_number: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matches::assert_matches;

    #[test]
    fn test_builtin_rules() {
        let rules = RuleSet::builtin().unwrap();
        assert!(rules.ok);
        assert!(rules.drop_words.contains("unsigned"));
        assert!(rules.drop_words.contains("NULL"));
        assert!(rules.skip_words.contains("DEFAULT"));
        assert!(rules.skip_clauses.contains("KEY"));
        assert!(rules.excluded_tables.is_empty());
        assert_eq!(rules.filename_template, "y%v-p%v-i%v.jpg");
        assert!(rules.validate().is_ok());
    }

    #[test]
    fn test_commented_flow_lists() {
        let rules = RuleSet::from_yaml_str(
            r#"
DropTables: [archiveddocs,   # don't care
             "switchboard items"]
DropWords: [unsigned]
ExtractImageTables: [{ "name":"tcustomerdocs", "ix":4, "year":2, "plan": 1 }]
FlagOK: true
"#,
        )
        .unwrap();
        assert!(rules.excluded_tables.contains("switchboard items"));
        assert!(rules.skip_words.is_empty());
        assert_eq!(
            rules.image_tables,
            vec![ImageTableSpec {
                table: "tcustomerdocs".to_string(),
                blob_column: 4,
                year_column: 2,
                plan_column: 1,
            }]
        );
        assert_eq!(rules.filename_template, default_filename_template());
    }

    #[test]
    fn test_not_ok_is_rejected() {
        let rules = RuleSet::from_yaml_str("DropWords: [unsigned]\n").unwrap();
        assert_matches!(rules.validate(), Err(ConvertError::RulesNotOk));
    }

    #[test]
    fn test_run_defaults() {
        let run = RunConfig::default();
        assert_eq!(run.transaction, TransactionMode::None);
        assert_eq!(run.max_line_bytes, 4000 * 1024);
        assert_eq!(run.first_image_number, 1);
    }

    #[test]
    fn test_bad_document() {
        assert_matches!(
            RuleSet::from_yaml_str("ExtractImageTables: [{ name: t, ix: nope }]"),
            Err(ConvertError::ParseRules(_))
        );
    }

    #[test]
    fn test_table_lookup_needs_backticks() {
        let rules = RuleSet::from_yaml_str(
            "DropTables: [tmp]\nExtractImageTables: [{ name: docs, ix: 1, year: 2, plan: 3 }]\n",
        )
        .unwrap();
        assert!(rules.is_excluded("`tmp`"));
        assert!(!rules.is_excluded("tmp"));
        assert!(!rules.is_excluded("`tmp2`"));
        assert_eq!(rules.image_table("`docs`").map(|s| s.blob_column), Some(1));
        assert!(rules.image_table("docs").is_none());
    }
}
