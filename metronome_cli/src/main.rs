//! Command-line interface for Metronome
//!
//! # Usage
//!
//! ```bash
//! # Assign enzymes from an OrthoMCL group table
//! metronome enzyme-assignment --input groups.tsv --output enzymes.json
//!
//! # Extract reactions from KEGG and a MetaCyc model file
//! metronome data-mining --enzymes enzymes.json --database kegg \
//!     --model-file metacyc=metacyc.xml --output-dir models --model-name mtb
//!
//! # Merge the extracted models using MetaNetX
//! metronome merging --enzymes enzymes.json --directory models --model-name mtb
//! ```

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::{ArgAction, Parser, Subcommand};
use log::{error, info, LevelFilter};
use metronome_core::configuration::Configuration;
use metronome_core::extraction::ExtractionArgs;
use metronome_core::io::rest::{BlockingClient, RestClient};
use metronome_core::pipeline::{assign_enzymes, load_enzymes, merge_networks, mine_reactions, save_enzymes};

#[derive(Parser)]
#[command(author, version, about = "Draft reconstruction of metabolic networks", long_about = None)]
struct Cli {
    /// Log more details, repeat for even more
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON file overriding the default endpoints and file layout
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assign enzymes to the input sequences
    EnzymeAssignment {
        /// Assignment method to use
        #[arg(short, long, default_value = "orthomcl")]
        method: String,

        /// Tab separated `protein \t group` table
        #[arg(short, long)]
        input: PathBuf,

        /// Where to store the assigned enzymes (JSON)
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Mine the reactions of the assigned enzymes
    DataMining {
        /// Assigned enzymes written by enzyme-assignment
        #[arg(short, long)]
        enzymes: PathBuf,

        /// Database to query, may be repeated (every database if neither this nor a model file is given)
        #[arg(short, long = "database")]
        databases: Vec<String>,

        /// Model file source and file, as `source=path`, may be repeated
        #[arg(short = 'f', long = "model-file", value_parser = parse_model_file)]
        model_files: Vec<(String, PathBuf)>,

        /// Directory the extracted models are written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Name of the model, used as prefix of the written files
        #[arg(short = 'n', long)]
        model_name: String,
    },
    /// Merge the reactions of every data mining source using MetaNetX
    Merging {
        /// Assigned enzymes written by enzyme-assignment
        #[arg(short, long)]
        enzymes: PathBuf,

        /// Directory holding the extracted models
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,

        /// Name of the model, used as prefix of the written file
        #[arg(short = 'n', long)]
        model_name: String,
    },
}

fn parse_model_file(value: &str) -> Result<(String, PathBuf), String> {
    match value.split_once('=') {
        Some((source, path)) if !source.is_empty() && !path.is_empty() => {
            Ok((source.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected `source=path`, found {:?}", value)),
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if let Some(config) = &cli.config {
        Configuration::from_json_file(config)?.install();
    }
    let client: Rc<dyn RestClient> = Rc::new(BlockingClient::new()?);

    match cli.command {
        Commands::EnzymeAssignment {
            method,
            input,
            output,
        } => {
            let enzymes = assign_enzymes(&method, &input, client)?;
            save_enzymes(&enzymes, &output)?;
            info!("Wrote {} enzyme numbers to {}", enzymes.len(), output.display());
        }
        Commands::DataMining {
            enzymes,
            databases,
            model_files,
            output_dir,
            model_name,
        } => {
            let args = ExtractionArgs::new(Rc::new(load_enzymes(&enzymes)?), client);
            for path in mine_reactions(&args, &databases, &model_files, &output_dir, &model_name)? {
                info!("Wrote {}", path.display());
            }
        }
        Commands::Merging {
            enzymes,
            directory,
            model_name,
        } => {
            let enzymes = Rc::new(load_enzymes(&enzymes)?);
            let path = merge_networks(&enzymes, client.as_ref(), &directory, &model_name)?;
            info!("Wrote {}", path.display());
        }
    }
    Ok(())
}

pub fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
    info!("Executing METRONOME version {}", env!("CARGO_PKG_VERSION"));

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
