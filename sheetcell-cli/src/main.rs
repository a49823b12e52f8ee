use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use sheetcell::{AccessMode, CellAccessor, CellRange, ReaderConfig};
use std::path::PathBuf;

mod formatter;
mod logger;

#[derive(Parser)]
#[command(name = "sheetcell")]
#[command(about = "Read cells, ranges and runs from Excel/ODS workbooks, local or on S3", long_about = None)]
#[command(version)]
struct Cli {
    /// Workbook path or s3://bucket/key URI
    #[arg(value_name = "LOCATOR")]
    locator: String,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Sheet to read (defaults to the first sheet)
    #[arg(short, long, global = true)]
    sheet: Option<String>,

    /// Access strategy, overriding the configuration
    #[arg(short, long, value_enum, global = true)]
    mode: Option<ModeArg>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human", global = true)]
    format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List sheet names
    Sheets,
    /// Read one cell
    Cell {
        /// Cell address, e.g. B2
        address: String,
    },
    /// Read a rectangular range, given as `A1 C3` or `A1:C3`
    Range {
        start: String,
        end: Option<String>,
    },
    /// Report whether a cell is blank, null or N/A
    Blank { address: String },
    /// Show value, blank flag and data type of a cell
    Check { address: String },
    /// Read a column downward until the first empty cell
    Column {
        /// Column letters, e.g. C
        column: String,
        /// First row (1-based)
        #[arg(long)]
        start: Option<u32>,
        /// Last row; blanks do not stop the scan when given
        #[arg(long)]
        end: Option<u32>,
    },
    /// Read a row rightward until the first empty cell
    Row {
        /// Row number (1-based)
        row: u32,
        /// First column letters
        #[arg(long)]
        start: Option<String>,
        /// Last column letters; blanks do not stop the scan when given
        #[arg(long)]
        end: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Convert cells on each read
    Direct,
    /// Convert the whole sheet up front
    Table,
}

impl From<ModeArg> for AccessMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Direct => AccessMode::Direct,
            ModeArg::Table => AccessMode::Table,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON output for scripting
    Json,
}

fn load_config(path: Option<&PathBuf>) -> Result<ReaderConfig> {
    if let Some(config_path) = path {
        return ReaderConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()));
    }

    // Try the default config in the current directory if it exists
    let default_config_path = PathBuf::from("sheetcell.toml");
    if default_config_path.exists() {
        ReaderConfig::from_file(&default_config_path).with_context(|| {
            format!(
                "Failed to load config from {}",
                default_config_path.display()
            )
        })
    } else {
        Ok(ReaderConfig::default())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let mut config = load_config(cli.config.as_ref())?;
    if let Some(mode) = cli.mode {
        config = config.with_mode(mode.into());
    }

    let mut accessor = CellAccessor::open_with(config, &cli.locator, cli.sheet.as_deref())
        .with_context(|| format!("Failed to open {}", cli.locator))?;
    let format = cli.format;

    match &cli.command {
        Command::Sheets => {
            formatter::print_sheets(format, accessor.sheet_names()?, accessor.sheet_name()?)?;
        }
        Command::Cell { address } => {
            let value = accessor.read_cell(address)?;
            formatter::print_cell(format, address, &value)?;
        }
        Command::Range { start, end } => {
            let range = match end {
                Some(end) => CellRange::from_addresses(start, end)?,
                None => CellRange::parse(start)?,
            };
            let values =
                accessor.read_range(&range.start().to_string(), &range.end().to_string())?;
            formatter::print_range(format, &range, &values)?;
        }
        Command::Blank { address } => {
            let blank = accessor.is_cell_blank(address)?;
            formatter::print_blank(format, address, blank)?;
        }
        Command::Check { address } => {
            let check = accessor.check_cell(address)?;
            formatter::print_check(format, &check)?;
        }
        Command::Column { column, start, end } => {
            let records = accessor
                .scan_column(column, *start, *end)
                .with_context(|| format!("Failed to scan column {}", column))?;
            formatter::print_records(format, &format!("Column {}", column), &records)?;
        }
        Command::Row { row, start, end } => {
            let records = accessor
                .scan_row(*row, start.as_deref(), end.as_deref())
                .with_context(|| format!("Failed to scan row {}", row))?;
            formatter::print_records(format, &format!("Row {}", row), &records)?;
        }
    }

    accessor.close();
    Ok(())
}
