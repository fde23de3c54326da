use std::path::PathBuf;

use clap::Parser;

/// lnkscope - dump the contents of Windows Shell Link (.lnk) files
#[derive(Debug, Parser)]
#[command(name = "lnkscope", version, about, long_about = None)]
pub struct Cli {
    /// Show more fields (debug-level detail).
    #[arg(short = 'a', long = "all")]
    pub all: bool,

    /// Emit YAML on stdout (the default when no emitter is chosen).
    #[arg(short = 'y', long = "yaml")]
    pub yaml: bool,

    /// Emit flat tab-separated rows on stdout.
    #[arg(short = 'g', long = "list")]
    pub list: bool,

    /// Decode non-Unicode strings with this codepage. The value is a
    /// unique prefix of the codepage label, e.g. "1252" or "932".
    #[arg(short = 'c', long = "codepage", value_name = "NAME")]
    pub codepage: Option<String>,

    /// Enable verbose (debug-level) logging output.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Shell link files to parse.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,
}
