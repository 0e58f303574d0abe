//! Command-line surface of `cargo xtask`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (rustc ",
    env!("VERGEN_RUSTC_SEMVER"),
    ", built ",
    env!("VERGEN_BUILD_TIMESTAMP"),
    ")"
);

/// Development tasks for the classy workspace
#[derive(Parser, Debug)]
#[command(name = "xtask")]
#[command(about = "Inspect and build the classy extension outside of cargo build scripts")]
#[command(version, long_version = LONG_VERSION)]
pub struct Cli {
    /// CLASS checkout to use instead of `CLASS_DIR`
    #[arg(long, global = true)]
    pub class_dir: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is unset
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the CLASS version read from include/common.h
    Version,

    /// Check whether the compiler can link libmvec
    Probe,

    /// Resolve and print the full extension configuration
    Config {
        /// C source compiled into the extension
        #[arg(long)]
        source: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Compile and link the extension as a loadable module
    BuildExt {
        /// Directory receiving objects and the linked module
        #[arg(long)]
        out_dir: PathBuf,

        /// C source compiled into the extension
        #[arg(long)]
        source: Option<PathBuf>,

        /// Target triple (defaults to the triple xtask was built for)
        #[arg(long)]
        target: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
