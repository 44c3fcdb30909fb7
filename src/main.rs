//! Tabula - spreadsheet formula engine CLI

mod config;

use anyhow::{Context, Result, bail};
use std::env;
use std::path::PathBuf;
use tabula_core::{Spreadsheet, load_spreadsheet, save_spreadsheet};
use tabula_engine::engine::{CellAddress, RecalcMode, Recalculator, display_value, evaluate};
use tracing_subscriber::EnvFilter;

fn print_usage() {
    eprintln!("Usage: tabula [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FILE]                    Spreadsheet document to open (.json)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -s, --set <CELL=INPUT>    Set a cell from input (can be repeated)");
    eprintln!("  --copy <FROM> <TO>        Copy a cell, shifting relative references");
    eprintln!("  --fill <FROM> <RANGE>     Copy a cell into every cell of a range");
    eprintln!("  -e, --eval <FORMULA>      Evaluate a formula against the sheet");
    eprintln!("  -p, --print               Print non-empty cells");
    eprintln!("  -o, --output <FILE>       Save the document as JSON");
    eprintln!("  --recalc <direct|full>    Recalculation mode (default: direct)");
    eprintln!("  --recalc-all              Recalculate every formula cell");
    eprintln!("  --config <FILE>           Read configuration from FILE");
    eprintln!("  -h, --help                Print help");
}

/// One command-line operation; operations run in the order given.
#[derive(Debug, PartialEq)]
enum Operation {
    Set { cell: String, input: String },
    Copy { from: String, to: String },
    Fill { from: String, range: String },
    Eval(String),
    Print,
    RecalcAll,
    Save(PathBuf),
}

#[derive(Debug, Default)]
struct Options {
    file_path: Option<PathBuf>,
    config_file: Option<PathBuf>,
    recalc: Option<RecalcMode>,
    operations: Vec<Operation>,
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let options = match parse_args(&args) {
        Ok(Some(options)) => options,
        Ok(None) => {
            print_usage();
            return;
        }
        Err(msg) => {
            eprintln!("Error: {}", msg);
            print_usage();
            std::process::exit(1);
        }
    };

    let (config, warnings) = config::load_config(options.config_file.as_deref());
    init_tracing(config.log_level.as_deref());
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }

    let mode = options.recalc.or(config.recalc).unwrap_or_default();
    if let Err(e) = run(options, Recalculator::new(mode)) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Parse the command line. `Ok(None)` means help was requested.
fn parse_args(args: &[String]) -> Result<Option<Options>, String> {
    let mut options = Options::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => return Ok(None),
            "-s" | "--set" => {
                let assignment = next_value(args, &mut i, "--set")?;
                let Some((cell, input)) = assignment.split_once('=') else {
                    return Err(format!("--set expects CELL=INPUT, got {}", assignment));
                };
                options.operations.push(Operation::Set {
                    cell: cell.trim().to_string(),
                    input: input.to_string(),
                });
            }
            "--copy" => {
                let from = next_value(args, &mut i, "--copy")?;
                let to = next_value(args, &mut i, "--copy")?;
                options.operations.push(Operation::Copy { from, to });
            }
            "--fill" => {
                let from = next_value(args, &mut i, "--fill")?;
                let range = next_value(args, &mut i, "--fill")?;
                options.operations.push(Operation::Fill { from, range });
            }
            "-e" | "--eval" => {
                let formula = next_value(args, &mut i, "--eval")?;
                options.operations.push(Operation::Eval(formula));
            }
            "-p" | "--print" => options.operations.push(Operation::Print),
            "--recalc-all" => options.operations.push(Operation::RecalcAll),
            "-o" | "--output" => {
                let path = next_value(args, &mut i, "--output")?;
                options.operations.push(Operation::Save(PathBuf::from(path)));
            }
            "--recalc" => {
                let mode = next_value(args, &mut i, "--recalc")?;
                options.recalc = Some(mode.parse()?);
            }
            "--config" => {
                let path = next_value(args, &mut i, "--config")?;
                options.config_file = Some(PathBuf::from(path));
            }
            arg if arg.starts_with('-') && arg.len() > 1 => {
                return Err(format!("Unknown option: {}", arg));
            }
            arg => {
                if options.file_path.is_some() {
                    return Err(format!("Unexpected argument: {}", arg));
                }
                options.file_path = Some(PathBuf::from(arg));
            }
        }
        i += 1;
    }

    Ok(Some(options))
}

fn next_value(args: &[String], i: &mut usize, name: &str) -> Result<String, String> {
    *i += 1;
    args.get(*i)
        .cloned()
        .ok_or_else(|| format!("{} requires a value", name))
}

/// `RUST_LOG` wins, then the configured level, then `warn`. Logs go to stderr.
fn init_tracing(config_level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config_level.unwrap_or("warn")))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(options: Options, recalc: Recalculator) -> Result<()> {
    let mut doc = match &options.file_path {
        Some(path) if path.exists() => load_spreadsheet(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        _ => Spreadsheet::new(1),
    };
    tracing::debug!(mode = %recalc.mode, cells = doc.data.len(), "document ready");

    for op in options.operations {
        match op {
            Operation::Set { cell, input } => {
                require_cell(&cell)?;
                doc.set_input(&cell, &input, &recalc);
            }
            Operation::Copy { from, to } => {
                require_cell(&from)?;
                require_cell(&to)?;
                doc.copy_cell(&from, &to, &recalc);
            }
            Operation::Fill { from, range } => {
                require_cell(&from)?;
                doc.fill(&from, &range, &recalc)
                    .with_context(|| format!("failed to fill {}", range))?;
            }
            Operation::Eval(formula) => println!("{}", evaluate(&formula, &doc.data)),
            Operation::Print => {
                for (id, cell) in doc.non_empty_cells() {
                    println!("{}: {}", id, display_value(cell));
                }
            }
            Operation::RecalcAll => doc.recalculate(&recalc),
            Operation::Save(path) => {
                save_spreadsheet(&path, &doc)
                    .with_context(|| format!("failed to save {}", path.display()))?;
                eprintln!("Saved to {}", path.display());
            }
        }
    }
    Ok(())
}

fn require_cell(id: &str) -> Result<()> {
    if CellAddress::parse(id.trim()).is_none() {
        bail!("invalid cell reference: {}", id);
    }
    Ok(())
}
