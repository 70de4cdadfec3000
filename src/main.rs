//! sproc - stored-procedure payload tool
//!
//! Encodes arguments into the armored text a stored-procedure endpoint
//! expects, and decodes armored responses back into JSON.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use config::Config;
use sproc_codec::ArmorMode;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sproc")]
#[command(about = "Encode and decode stored-procedure payloads")]
#[command(version)]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long, env = "SPROC_CONFIG")]
    config: Option<PathBuf>,

    /// Reject unknown armor symbols instead of reading them as zero
    #[arg(long)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serialize arguments and armor them
    Encode {
        /// JSON array of arguments, a single JSON value, or @file.json
        args: String,
    },

    /// Unarmor and decode a payload into JSON
    Decode {
        /// Armored text
        text: String,

        /// Do not treat a `_fail_` response as an error
        #[arg(long)]
        raw: bool,
    },

    /// Armor raw bytes
    Pack {
        /// Hex-encoded bytes
        hex: String,
    },

    /// Unarmor text into raw bytes
    Unpack {
        /// Armored text
        text: String,
    },

    /// Show the request a stored-procedure call would send
    Request {
        /// Procedure name
        #[arg(short, long)]
        function: String,

        /// Module (script) that defines the procedure
        #[arg(short, long)]
        module: String,

        /// Session root URL
        #[arg(short, long, default_value = "http://localhost:10035")]
        root: String,

        /// Arguments, one JSON value each (or @file.json)
        args: Vec<String>,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {}", "Config error".red(), e);
            std::process::exit(2);
        }
    };
    if cli.strict {
        config.codec.armor_mode = ArmorMode::Strict;
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(
        armor_mode = ?config.codec.armor_mode,
        max_depth = config.codec.max_depth,
        "configuration loaded"
    );

    match commands::execute(cli.command, &config) {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    }
}
