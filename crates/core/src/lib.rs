//! cmdgraph Core Library
//!
//! This crate provides a command-graph framework for building command line
//! tools. A program's grammar is expressed as a graph of [`node::Node`]s,
//! each pairing a [`node::Processor`] (what happens at the node) with an
//! optional [`node::Edge`] (where to go next). The same graph drives three
//! engines:
//!
//! - **Execute**: consumes arguments, fills a [`data::Data`] store and runs
//!   the queued executors once every token was consumed
//! - **Autocomplete**: produces shell completion suggestions for a
//!   `COMP_LINE`
//! - **Usage**: renders the help text as a tree of subcommand branches
//!
//! # Examples
//!
//! ```
//! use std::rc::Rc;
//!
//! use cmdgraph_core::argument::Argument;
//! use cmdgraph_core::branch::BranchNode;
//! use cmdgraph_core::execute::execute;
//! use cmdgraph_core::input::Input;
//! use cmdgraph_core::node::ExecutorProcessor;
//! use cmdgraph_core::output::BufferedOutput;
//! use cmdgraph_core::serial_nodes;
//!
//! let greet = serial_nodes![
//!     Argument::<String>::new("NAME", "Who to greet"),
//!     ExecutorProcessor::new(|output, data| {
//!         output.stdout(&format!("Hello, {}!", data.string("NAME")));
//!         Ok(())
//!     }),
//! ];
//! let root = BranchNode::new([("greet", greet)]).build();
//!
//! let mut output = BufferedOutput::new();
//! execute(&root, &mut Input::parse_args(&["greet", "you"]), &mut output)?;
//! assert_eq!(output.stdout_lines(), ["Hello, you!"]);
//! # Ok::<(), cmdgraph_core::error::Error>(())
//! ```

pub mod argument;
pub mod branch;
pub mod complete;
pub mod data;
pub mod error;
pub mod execute;
pub mod flag;
pub mod history;
pub mod input;
pub mod node;
pub mod output;
pub mod shell;
pub mod usage;
pub mod validator;
pub mod value;

pub use error::{Error, Result};
