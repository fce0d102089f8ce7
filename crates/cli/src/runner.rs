//! Running the compiled grammar in each of the CLI modes.

use std::rc::Rc;

use cmdgraph_core::complete::autocomplete;
use cmdgraph_core::data::Data;
use cmdgraph_core::execute::execute_with;
use cmdgraph_core::history::RecordNode;
use cmdgraph_core::input::Input;
use cmdgraph_core::node::Node;
use cmdgraph_core::output::Output;
use cmdgraph_core::shell::CommandRunner;
use cmdgraph_core::usage::{get_usage, get_usage_for, Usage};
use log::{debug, info, warn};

use crate::cli_args::{Args, Mode};
use crate::command_definitions::{GrammarDefinition, LastArgs};
use crate::error::Result;
use crate::file_handling::{get_command_definitions, get_last_args, write_last_args};
use crate::grammar::GraphBuilder;
use crate::config;

/// Data key the consumed arguments of a run are recorded under.
const HISTORY_KEY: &str = "__cmdgraph_history";

pub struct App {
    root: Rc<Node>,
    last_args_path: String,
    skip_save: bool,
}

impl App {
    /// # Errors
    ///
    /// Returns an error when the grammar cannot be compiled.
    pub fn new(
        grammar: &GrammarDefinition,
        runner: Rc<dyn CommandRunner>,
        shell: &str,
        last_args_path: &str,
    ) -> Result<Self> {
        let graph = GraphBuilder::new(runner, shell).build(grammar)?;
        Ok(Self::from_graph(graph, last_args_path))
    }

    /// Runs an already built graph, recording the arguments it consumes.
    pub fn from_graph(graph: Rc<Node>, last_args_path: &str) -> Self {
        Self {
            root: RecordNode::new(HISTORY_KEY, graph).build(),
            last_args_path: last_args_path.to_string(),
            skip_save: false,
        }
    }

    #[must_use]
    pub fn skip_save(mut self, skip_save: bool) -> Self {
        self.skip_save = skip_save;
        self
    }

    /// Runs one CLI mode. Engine errors are written to `output` before they
    /// are returned.
    ///
    /// # Errors
    ///
    /// Returns the engine error of the mode, or a file error from reading or
    /// writing the last arguments.
    pub fn run(&self, mode: &Mode, output: &mut dyn Output) -> Result<()> {
        match mode {
            Mode::Execute { args } => self.execute(Input::parse_args(args), output),
            Mode::Rerun => self.rerun(output),
            Mode::Autocomplete {
                comp_line,
                passthrough,
            } => {
                let suggestions = autocomplete(&self.root, comp_line, passthrough)
                    .map_err(|e| output.err(e))?;
                for suggestion in suggestions {
                    output.stdout(&suggestion);
                }
                Ok(())
            }
            Mode::Usage { args } => {
                let usage = get_usage_for(&self.root, &mut Input::parse_args(args))
                    .map_err(|e| output.err(e))?;
                output.stdout(&usage.to_string());
                Ok(())
            }
        }
    }

    fn rerun(&self, output: &mut dyn Output) -> Result<()> {
        let Some(last_args) = get_last_args(&self.last_args_path)? else {
            warn!("Rerun was requested, but there are no previous arguments!");
            return Ok(());
        };

        info!("Rerunning {:?}", last_args.args);
        let mut input = Input::default();
        input.push_front(last_args.args);
        self.execute(input, output)
    }

    fn execute(&self, mut input: Input, output: &mut dyn Output) -> Result<()> {
        let mut data = Data::new();
        let exec = match execute_with(&self.root, &mut input, output, &mut data) {
            Ok(exec) => exec,
            Err(e) => {
                if e.is_usage_error() {
                    output.stderr(&self.usage_after_error(&input).to_string());
                }
                return Err(e.into());
            }
        };
        for line in &exec.executable {
            output.stdout(line);
        }

        if self.skip_save {
            info!("Skipping save was specified. Not (over)writing last args.");
            return Ok(());
        }
        let last_args = LastArgs {
            args: data.string_list(HISTORY_KEY).to_vec(),
        };
        write_last_args(&self.last_args_path, &last_args)
    }

    /// Usage of the deepest branch the consumed tokens selected, falling back
    /// to the whole graph.
    fn usage_after_error(&self, input: &Input) -> Usage {
        let mut path = Input::default();
        path.push_front(input.consumed_since(0));
        get_usage_for(&self.root, &mut path)
            .or_else(|e| {
                debug!("Falling back to full usage: {e}");
                get_usage(&self.root)
            })
            .unwrap_or_default()
    }
}

/// Loads the configured grammar and runs the requested mode.
///
/// # Errors
///
/// Returns grammar loading errors and the errors of [`App::run`].
pub fn run(args: &Args, runner: Rc<dyn CommandRunner>, output: &mut dyn Output) -> Result<()> {
    let config_path = config::get_config_path(args.config_path.as_deref());
    debug!("Config path: `{config_path}`");
    let grammar = get_command_definitions(&config_path)?;

    let last_args_path = config::get_last_args_path(args.last_args_path.as_deref());
    App::new(&grammar, runner, &config::get_shell(), &last_args_path)?
        .skip_save(args.skip_save)
        .run(&args.mode, output)
}
