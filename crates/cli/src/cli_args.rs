//! Command-line argument parsing.
//!
//! This module defines the command-line interface structure of the `cg`
//! binary using the `clap` crate.

use clap::{Parser, Subcommand};

/// Command-line arguments for the cmdgraph CLI tool.
///
/// # Examples
///
/// ```rust
/// use clap::Parser;
/// use cmdgraph_cli::cli_args::{Args, Mode};
///
/// let args = Args::parse_from(["cg", "usage"]);
/// assert_eq!(args.mode, Mode::Usage { args: vec![] });
/// ```
#[derive(Parser, Debug)] // requires `derive` feature
#[command(term_width = 0)] // Just to make testing across clap features easier
pub struct Args {
    /// Path to the command grammar YAML.
    ///
    /// If not provided, defaults to `~/.cmdgraph/commands.yml`.
    #[arg(long = "config", short = 'c')]
    pub config_path: Option<String>,

    /// Path to the file that stores the arguments of the last run.
    ///
    /// If not provided, defaults to `~/.cmdgraph/last_args.yml`.
    #[arg(long, short = 'l')]
    pub last_args_path: Option<String>,

    /// Skip saving the arguments of this run for `rerun`.
    #[arg(long, short = 's', action)]
    pub skip_save: bool,

    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Runs the command selected by the arguments.
    Execute {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Prints completion suggestions for a shell completion line, one per line.
    Autocomplete {
        /// The full line being completed, including the command name.
        comp_line: String,

        /// Arguments placed in front of the completion line's words.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        passthrough: Vec<String>,
    },

    /// Prints the usage of the command selected by the arguments.
    Usage {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Runs the arguments of the last successful run again.
    Rerun,
}
