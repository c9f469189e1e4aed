// plans10x/src/main.rs

use anyhow::Result;
use clap::Parser;
use plans10x::convert_dir;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "plans10x")]
#[command(about = "Convert X4 station construction plans for the 10x_modules extension", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory containing the original construction plan XML files
    source_dir: PathBuf,

    /// Directory where the converted plans are written (created if absent)
    dest_dir: PathBuf,
}

fn entrypoint() -> Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    convert_dir(&cli.source_dir, &cli.dest_dir)?;
    Ok(())
}

fn main() -> ExitCode {
    match entrypoint() {
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}
