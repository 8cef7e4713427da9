use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use erdot::config::load_config;
use erdot::types::TypeRegistry;
use erdot::{ErdotError, Pipeline};

/// Convert an ER model to a Graphviz dot file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the JSON model file
    input: PathBuf,

    /// Output file (default: <input>.dot)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn default_output(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".dot");
    PathBuf::from(name)
}

fn run(args: &Args) -> Result<(), ErdotError> {
    let config = load_config(args.config.as_deref())?;
    let pipeline = Pipeline::new(TypeRegistry::builtin(), config);

    let source = fs::read_to_string(&args.input)?;
    let model = pipeline.load(&source)?;

    let output = args.output.clone().unwrap_or_else(|| default_output(&args.input));
    info!(output:? = output; "Generating dot file for model");
    pipeline.export(&model, &output)?;
    info!("To convert to PDF run 'dot -Tpdf -O {}'", output.display());
    Ok(())
}

fn main() {
    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using 'warn' instead.", args.log_level);
        LevelFilter::Warn
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();
    debug!(args:?; "Parsed arguments");

    if let Err(e) = run(&args) {
        error!("{}", e);
        process::exit(1);
    }
}
