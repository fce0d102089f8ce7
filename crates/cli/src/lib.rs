//! cmdgraph CLI Library
//!
//! This crate provides the `cg` command-line tool, which turns a YAML command
//! grammar into a [`cmdgraph_core`] graph and executes, completes or
//! describes it.
//!
//! # Architecture
//!
//! - [`cli_args`]: Command-line argument parsing
//! - [`file_handling`]: Loading and validating the grammar, persisting the last run
//! - [`grammar`]: Compiling a grammar into a command graph
//! - [`runner`]: Running the graph in each mode
//!
//! # Examples
//!
//! ```bash
//! # Run a command from the grammar
//! cg execute deploy service api web
//!
//! # Shell completion, e.g. from `complete -C`
//! cg autocomplete "cg deploy se"
//!
//! # Usage for the whole grammar or one command
//! cg usage
//! cg usage deploy
//!
//! # Run the last successful arguments again
//! cg rerun
//! ```

pub mod cli_args;
pub mod command_definitions;
pub mod config;
pub mod error;
pub mod file_handling;
pub mod grammar;
pub mod runner;
