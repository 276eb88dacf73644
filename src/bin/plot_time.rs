use build_tools::render::{self, FigureConfig};
use build_tools::timing::{ColumnSelection, TableOptions, TimingReport, TimingTable};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "plot-time", version)]
#[command(about = "Box plot and summary table for a timing log", long_about = None)]
struct Cli {
    /// Timing log: comma-separated, one column per measured section.
    log: PathBuf,

    /// Output image; `.svg` writes SVG, other extensions a bitmap.
    #[arg(short = 'o', long, default_value = "time.png")]
    out: PathBuf,

    #[arg(long, default_value_t = 1000)]
    dpi: u32,

    /// Figure width in inches.
    #[arg(long, default_value_t = 6.4)]
    width: f64,

    /// Figure height in inches.
    #[arg(long, default_value_t = 4.8)]
    height: f64,

    /// Treat the last column as data instead of a line-terminator artifact.
    #[arg(long)]
    keep_last_column: bool,

    /// Zero-based position of a further column to ignore (repeatable).
    #[arg(long = "drop-column", value_name = "POS")]
    drop_columns: Vec<usize>,

    /// TrueType font used for labels.
    #[arg(long)]
    font: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> build_tools::Result<()> {
    let cli = Cli::parse();
    build_tools::logging::init(cli.verbose);

    // 1) Parse the log.
    let options = TableOptions {
        selection: ColumnSelection {
            drop_trailing: !cli.keep_last_column,
            drop_positions: cli.drop_columns,
        },
        ..TableOptions::default()
    };
    let table = TimingTable::from_path(&cli.log, &options)?;

    // 2) Aggregate.
    let report = TimingReport::from_table(&table)?;

    // 3) Render.
    let figure = FigureConfig {
        output: cli.out,
        width_in: cli.width,
        height_in: cli.height,
        dpi: cli.dpi,
        font: cli.font,
    };
    render::render_report(&report, &figure)?;
    println!("Wrote {}", figure.output.display());

    Ok(())
}
