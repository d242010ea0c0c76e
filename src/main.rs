//! Cellbook - headless spreadsheet workbooks from the command line

mod config;
mod logger;

use anyhow::{Context, bail};
use cellbook_core::Document;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

fn print_usage() {
    eprintln!("Usage: cellbook [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FILE]                    Workbook file to open (.json)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -s, --set <REF=INPUT>     Write a cell before output (can be repeated)");
    eprintln!("  -c, --command <FORMULA>   Evaluate a formula against the active sheet");
    eprintln!("  --sheet <NAME>            Make the named sheet active");
    eprintln!("  --csv <FILE>              Export the active sheet's raw input as CSV");
    eprintln!("  --import <FILE>           Import a CSV file at A1 of the active sheet");
    eprintln!("  --save <FILE>             Save the workbook as JSON");
    eprintln!("  --config <FILE>           Load settings from a TOML file");
    eprintln!("  --no-config               Ignore the user config file");
    eprintln!("  -v, --verbose             Log debug output to stderr");
    eprintln!("  -h, --help                Print help");
}

#[derive(Debug, Default)]
struct Options {
    file_path: Option<PathBuf>,
    assignments: Vec<String>,
    command: Option<String>,
    sheet: Option<String>,
    csv_file: Option<PathBuf>,
    import_file: Option<PathBuf>,
    save_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
    no_config: bool,
    verbose: bool,
}

/// Advance to the value following a flag, or exit with an error.
fn next_value(args: &[String], i: &mut usize, flag: &str, what: &str) -> String {
    *i += 1;
    if *i >= args.len() {
        eprintln!("Error: {} requires {}", flag, what);
        std::process::exit(1);
    }
    args[*i].to_string()
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let mut opts = Options::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "-s" | "--set" => {
                let assignment = next_value(&args, &mut i, "--set", "REF=INPUT");
                opts.assignments.push(assignment);
            }
            "-c" | "--command" => {
                opts.command = Some(next_value(&args, &mut i, "--command", "a formula"));
            }
            "--sheet" => {
                opts.sheet = Some(next_value(&args, &mut i, "--sheet", "a sheet name"));
            }
            "--csv" => {
                let path = next_value(&args, &mut i, "--csv", "a file path");
                opts.csv_file = Some(PathBuf::from(path));
            }
            "--import" => {
                let path = next_value(&args, &mut i, "--import", "a file path");
                opts.import_file = Some(PathBuf::from(path));
            }
            "--save" => {
                let path = next_value(&args, &mut i, "--save", "a file path");
                opts.save_file = Some(PathBuf::from(path));
            }
            "--config" => {
                let path = next_value(&args, &mut i, "--config", "a file path");
                opts.config_file = Some(PathBuf::from(path));
            }
            "--no-config" => opts.no_config = true,
            "-v" | "--verbose" => opts.verbose = true,
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage();
                std::process::exit(1);
            }
            arg => {
                if opts.file_path.is_none() {
                    opts.file_path = Some(PathBuf::from(arg));
                } else {
                    eprintln!("Error: Unexpected argument: {}", arg);
                    print_usage();
                    std::process::exit(1);
                }
            }
        }
        i += 1;
    }

    match run(opts) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run(opts: Options) -> anyhow::Result<i32> {
    let (settings, warnings) = if opts.no_config {
        (Default::default(), Vec::new())
    } else {
        config::load_settings(opts.config_file.as_deref())
    };
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }

    let level = if opts.verbose {
        LevelFilter::DEBUG
    } else {
        logger::parse_level(&settings.log_level).unwrap_or(LevelFilter::WARN)
    };
    logger::init(level)?;

    let mut doc = Document::with_file(opts.file_path.clone(), settings).with_context(|| {
        match &opts.file_path {
            Some(path) => format!("failed to open {}", path.display()),
            None => "failed to create workbook".to_string(),
        }
    })?;

    if let Some(name) = &opts.sheet {
        doc.set_active_sheet_by_name(name)?;
    }
    if let Some(path) = &opts.import_file {
        let count = doc
            .import_csv_file(path)
            .with_context(|| format!("failed to import {}", path.display()))?;
        log::info!("imported {} cells from {}", count, path.display());
    }
    for assignment in &opts.assignments {
        let Some((name, input)) = assignment.split_once('=') else {
            bail!("--set expects REF=INPUT, got '{}'", assignment);
        };
        doc.write_named(name.trim(), input)
            .with_context(|| format!("failed to set {}", name.trim()))?;
    }

    let cyclic = doc.sheets_with_cycles();
    if !cyclic.is_empty() {
        log::warn!("circular references in: {}", cyclic.join(", "));
    }

    let mut code = 0;
    let mut printed = false;
    if let Some(formula) = &opts.command {
        let value = doc.evaluate_expression(formula);
        println!("{}", value.display());
        if value.is_error() {
            code = 1;
        }
        printed = true;
    }
    if let Some(path) = &opts.csv_file {
        doc.write_csv_file(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("Exported to {}", path.display());
        printed = true;
    }
    if let Some(path) = &opts.save_file {
        doc.save_as(path)
            .with_context(|| format!("failed to save {}", path.display()))?;
        eprintln!("Saved to {}", path.display());
        printed = true;
    }
    if !printed {
        print!("{}", doc.export_visible_csv());
    }
    Ok(code)
}
