//! CLI argument definitions for `typecol`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "typecol",
    version,
    about = "Normalize and inspect documents for typed JSON columns",
    long_about = "Normalize structural JSON documents against a typed column schema.\n\n\
                  Applies defaults and coercions the way a typed column assignment does,\n\
                  and prints the canonical JSON that would be stored."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the canonical stored form of a document.
    Normalize(NormalizeArgs),

    /// List the fields of a schema.
    Fields(FieldsArgs),
}

#[derive(Parser)]
pub struct NormalizeArgs {
    /// JSON schema file.
    #[arg(long = "schema", value_name = "FILE")]
    pub schema: PathBuf,

    /// Input document (reads stdin when omitted).
    #[arg(long = "input", value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Print on a single line.
    #[arg(long = "compact")]
    pub compact: bool,
}

#[derive(Parser)]
pub struct FieldsArgs {
    /// JSON schema file.
    #[arg(long = "schema", value_name = "FILE")]
    pub schema: PathBuf,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
