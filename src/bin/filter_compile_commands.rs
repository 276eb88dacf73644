use anyhow::Context;
use build_tools::compdb::{self, FilterRules, FilterSummary};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;

#[derive(Parser)]
#[command(name = "filter-compile-commands", version)]
#[command(about = "Keep only the project's own compilation units in a compile_commands.json", long_about = None)]
struct Cli {
    /// Compilation database to read.
    input: PathBuf,

    /// Where to write the filtered database (overwritten).
    output: PathBuf,

    /// Project source root; kept files live under its include directories.
    source_dir: PathBuf,

    /// JSON file with filter rules (include_dirs, exclude_patterns, case_insensitive).
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Include directory relative to source_dir; replaces the defaults (src, app).
    #[arg(long = "include-dir", value_name = "DIR")]
    include_dirs: Vec<String>,

    /// Path substring that excludes an entry; replaces the default patterns.
    #[arg(long = "exclude", value_name = "PATTERN")]
    excludes: Vec<String>,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    // Usage errors exit 1, like every other failure of this tool.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    build_tools::logging::init(cli.verbose);

    match run(&cli) {
        Ok(summary) => {
            println!(
                "Filtered {} -> {} compilation units",
                summary.total, summary.kept
            );
            if summary.kept == 0 {
                warn!(
                    source_dir = %cli.source_dir.display(),
                    "no compilation units kept; is the source directory right?"
                );
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {:?}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> build_tools::Result<FilterSummary> {
    // 1) Rules: defaults, then the rules file, then command-line overrides.
    let mut rules = match &cli.rules {
        Some(path) => FilterRules::from_path(path)?,
        None => FilterRules::default(),
    };
    if !cli.include_dirs.is_empty() {
        rules.include_dirs = cli.include_dirs.clone();
    }
    if !cli.excludes.is_empty() {
        rules.exclude_patterns = cli.excludes.clone();
    }

    // 2) Compare against an absolute source root.
    let source_dir = std::path::absolute(&cli.source_dir)
        .with_context(|| format!("resolve source directory {}", cli.source_dir.display()))?;

    // 3) Filter.
    compdb::filter_file(&cli.input, &cli.output, &source_dir, &rules)
}
