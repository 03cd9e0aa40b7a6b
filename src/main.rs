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

use clap::Parser;
use log::{debug, error, Level};
use mysqldump_sqlite::{convert_files, ConvertError, RuleSet, RunConfig, TransactionMode};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mysqldump-sqlite")]
#[command(version)]
#[command(about = "Convert a mysqldump file into an SQLite script", long_about = None)]
struct Cli {
    /// The input SQL file
    #[arg(long = "in")]
    input: PathBuf,

    /// The output SQL file
    #[arg(long = "out", default_value = "sqlite.sql")]
    output: PathBuf,

    /// Maximum line size in 1024 byte chunks
    #[arg(long = "bk", default_value_t = 4000)]
    buffer_kib: usize,

    /// Max number of INSERTs to process, 0 for no limit
    #[arg(long = "max")]
    max_inserts: Option<usize>,

    /// Only process this table
    #[arg(long = "table")]
    only_table: Option<String>,

    /// Where to put BEGIN/COMMIT
    #[arg(long = "trans", value_enum, default_value = "none")]
    transaction: TransactionMode,

    /// Folder to write image files
    #[arg(long = "images", default_value = "images")]
    image_dir: PathBuf,

    /// First number to use for image files
    #[arg(long = "imgnum", default_value_t = 1)]
    first_image_number: u64,

    /// File containing YAML configuration
    #[arg(long = "cfg")]
    config: Option<PathBuf>,

    /// Show more messages
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::Debug } else { Level::Info };
    if let Err(e) = simple_logger::init_with_level(level) {
        eprintln!("can't set up logging: {}", e);
    }

    if let Err(e) = run(cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), ConvertError> {
    println!(
        "{} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let rules = match &cli.config {
        Some(path) => RuleSet::load(path)?,
        None => RuleSet::builtin()?,
    };
    debug!("{:?}", rules);

    let run = RunConfig {
        input: cli.input,
        output: cli.output,
        max_line_bytes: cli.buffer_kib * 1024,
        max_inserts: cli.max_inserts,
        only_table: cli.only_table,
        transaction: cli.transaction,
        image_dir: cli.image_dir,
        first_image_number: cli.first_image_number,
    };
    let report = convert_files(&rules, &run)?;

    if !report.issues.is_empty() {
        println!("{} rows needed a placeholder, see the warnings above", report.issues.len());
    }
    if report.stopped_at_insert_limit {
        println!("Stopped after {} inserts", report.inserts_processed);
    }
    if report.images_stored > 0 {
        println!("{} images stored in {}", report.images_stored, run.image_dir.display());
        println!("Next time use --imgnum {}", report.next_image_number);
    }
    println!("All done");
    Ok(())
}
