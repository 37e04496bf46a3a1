mod config;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::filter::EnvFilter;

use vmasm::disasm::print_listing;
use vmasm::{AsmError, Assembler};

use crate::config::{Config, load_config};

#[derive(Parser)]
#[command(name = "vmasm", version, about = "Assembler for VM bytecode modules")]
struct Cli {
    /// Assembly source to read
    input: PathBuf,

    /// Module file to write
    output: PathBuf,

    /// Print a listing of the assembled module
    #[arg(long)]
    listing: bool,

    /// Also write a postcard snapshot of the module here
    #[arg(long, value_name = "PATH")]
    ir: Option<PathBuf>,

    /// Configuration file (defaults to ./vmasm.toml when present)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli, &config) {
        eprintln!("error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli, config: &Config) -> Result<(), AsmError> {
    let module = Assembler::new().assemble_file(&cli.input, &cli.output)?;

    if cli.listing || config.output.listing {
        print_listing(&module);
    }

    if let Some(path) = cli.ir.or_else(|| config.output.ir.clone()) {
        let snapshot = module.to_snapshot()?;
        std::fs::write(&path, snapshot).map_err(|e| AsmError::file_access(&path, e))?;
        tracing::debug!(target: "vmasm", path = %path.display(), "wrote snapshot");
    }

    Ok(())
}
