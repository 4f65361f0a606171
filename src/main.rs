use clap::Parser;
use std::process;
use tabular_stats::cli::{self, Args};

fn main() {
    let args = Args::parse();

    if let Err(error) = cli::setup_logging(&args) {
        eprintln!("Warning: {error:#}");
    }

    let outcome = match cli::run(&args) {
        Ok(outcome) => outcome,
        Err(error) => {
            eprintln!("Error: {error:#}");
            process::exit(1);
        }
    };

    match cli::render(&outcome.report, args.compact) {
        Ok(rendered) => println!("{rendered}"),
        Err(error) => {
            eprintln!("Error: {error:#}");
            process::exit(1);
        }
    }

    if !outcome.failures.is_empty() {
        for (path, error) in &outcome.failures {
            eprintln!("Error: {}: {error}", path.display());
        }
        process::exit(1);
    }
}
