//! `ivmp` command line entry point
//!
//! Parses arguments, installs logging and delegates to the commands.

use clap::Parser as ClapParser;
use instrumenter::RewriteStatus;
use ivmp_cli::{inspect, localize, logging, rewrite, Cli, CliResult, Command, LocalizeOptions, Manifest};
use std::error::Error;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Command::Rewrite { backup_dir } => {
            let manifest = Manifest::load(&cli.manifest)?;
            for outcome in rewrite(&manifest, backup_dir.as_deref())? {
                match outcome.status {
                    RewriteStatus::UpToDate => println!("{}: up to date", outcome.module),
                    RewriteStatus::Rewritten { sites, restored } => println!(
                        "{}: rewrote {} sites{}",
                        outcome.module,
                        sites,
                        if restored { " (restored stale copy)" } else { "" }
                    ),
                }
            }
        }
        Command::Localize {
            backup_dir,
            step_limit,
            filter,
            output,
            skip_rewrite,
        } => {
            let manifest = Manifest::load(&cli.manifest)?;
            let options = LocalizeOptions {
                backup_dir,
                step_limit,
                filter,
                output,
                skip_rewrite,
            };
            let report = localize(&manifest, &options)?;
            println!("{}", report.summary());
        }
        Command::Inspect { files, dir } => {
            for summary in inspect(&files, dir.as_deref())? {
                println!("{}", summary.describe());
            }
        }
    }
    Ok(())
}
