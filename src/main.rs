//! Bootstrap configuration merge CLI
//!
//! Entry point for the `bootcfg` command-line tool.

use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::Parser;

use bootcfg::{Pipeline, PipelineConfig};

#[derive(Parser)]
#[command(name = "bootcfg")]
#[command(about = "Merge bootstrap fragments into an appliance settings file", version)]
struct Cli {
    /// Settings format of the target file: xml or keyvalue
    data_structure: String,

    /// Directory scanned for bootstrap fragment files
    bootstrap_directory: PathBuf,

    /// Configuration file updated in place
    config_to_update: PathBuf,

    /// Back the target up first; any non-empty value enables it
    backup_flag: String,

    /// Verbose progress output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{}", err);
            return;
        }
        Err(err) => {
            // Callers expect the usage text on stdout and exit code 1 when
            // the argument list is wrong.
            println!("{}", err);
            process::exit(1);
        }
    };

    let verbose = cli.verbose;
    let pipeline = Pipeline::new(PipelineConfig {
        format: cli.data_structure,
        bootstrap_dir: cli.bootstrap_directory,
        target: cli.config_to_update,
        backup: !cli.backup_flag.is_empty(),
        verbose,
    });

    match pipeline.run() {
        Ok(report) => {
            if verbose {
                eprintln!("Applied {} fragment(s)", report.fragments.len());
            }
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(1);
        }
    }
}
