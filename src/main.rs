//! Tessera CLI
//!
//! Usage:
//!   tessera [OPTIONS] <MANIFEST>
//!
//! Options:
//!   -s, --set <PATH=VALUE>  Set a data path after mounting (repeatable)
//!   -v, --verbose           More log output (repeatable)
//!   -q, --quiet             Only log errors
//!   -h, --help              Print help

mod logging;

use std::path::PathBuf;

use clap::Parser;

use tessera::component::ComponentError;
use tessera::manifest::parse_value;
use tessera::{render_manifest_file, Error, ManifestError, Value};

#[derive(Parser)]
#[command(name = "tessera")]
#[command(about = "Render a reactive component manifest to HTML")]
struct Cli {
    /// Component manifest (TOML)
    manifest: PathBuf,

    /// Set PATH to VALUE after mounting; VALUE is read as TOML, else as a string
    #[arg(short, long = "set", value_name = "PATH=VALUE")]
    sets: Vec<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(cli.verbose, cli.quiet) {
        eprintln!("{}", e);
    }

    let sets = match parse_sets(&cli.sets) {
        Ok(sets) => sets,
        Err(bad) => {
            eprintln!("Error: expected PATH=VALUE, got '{}'", bad);
            std::process::exit(1);
        }
    };

    match render_manifest_file(&cli.manifest, &sets) {
        Ok(html) => {
            println!("{}", html);
        }
        Err(Error::Manifest(ManifestError::Component(ComponentError::Markup {
            error,
            template,
        }))) => {
            let filename = cli.manifest.display().to_string();
            eprintln!("{}", error.format(&template, &filename));
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Split `PATH=VALUE` arguments, returning the first malformed one on error
fn parse_sets(raw: &[String]) -> Result<Vec<(String, Value)>, String> {
    raw.iter()
        .map(|arg| match arg.split_once('=') {
            Some((path, value)) if !path.trim().is_empty() => {
                Ok((path.trim().to_string(), parse_value(value.trim())))
            }
            _ => Err(arg.clone()),
        })
        .collect()
}
