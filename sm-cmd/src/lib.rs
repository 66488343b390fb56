//! Command implementations for the StateMod binary output CLI.
//!
//! Provides subcommands to inspect a binary output file's header and
//! directories and to extract time series as CSV.

use clap::Subcommand;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

pub mod inspect;
pub mod read;

#[derive(Subcommand)]
pub enum Command {
    /// Show the decoded header: version, period, counts and geometry
    Info {
        /// Binary output file (.b43, .b49, .b44, .b50, .b42, .b65)
        file: PathBuf,

        /// Print as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List every station in the file as CSV
    Stations {
        /// Binary output file
        file: PathBuf,
    },

    /// List parameter names and units as CSV
    Parameters {
        /// Binary output file
        file: PathBuf,

        /// Show names as stored, without duplicate-name corrections
        #[arg(long)]
        original: bool,
    },

    /// Extract time series matching an identifier pattern as CSV
    Read {
        /// Binary output file
        file: PathBuf,

        /// Identifier pattern, e.g. "08*.StateMod.Total_Supply" or "res1-2"
        #[arg(short = 't', long)]
        tsid: String,

        /// First date to read (YYYY-MM or YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// Last date to read (YYYY-MM or YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Only read these parameters (repeatable)
        #[arg(long)]
        include: Vec<String>,

        /// Skip these parameters (repeatable)
        #[arg(long)]
        exclude: Vec<String>,

        /// Match parameters by their stored names
        #[arg(long)]
        original: bool,

        /// Output CSV path; stdout when omitted
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// List every time series identifier the file can serve
    List {
        /// Binary output file
        file: PathBuf,
    },
}

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Info { file, json } => inspect::run_info(&file, json, &mut io::stdout().lock()),
        Command::Stations { file } => inspect::run_stations(&file, io::stdout().lock()),
        Command::Parameters { file, original } => {
            inspect::run_parameters(&file, original, io::stdout().lock())
        }
        Command::Read {
            file,
            tsid,
            start,
            end,
            include,
            exclude,
            original,
            output,
        } => {
            let options = read::ReadOptions {
                tsid,
                start,
                end,
                include,
                exclude,
                original,
            };
            read::run_read(&file, &options, open_output(output.as_deref())?)
        }
        Command::List { file } => read::run_list(&file, &mut io::stdout().lock()),
    }
}

/// Buffered file at `path`, or stdout.
fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    })
}
