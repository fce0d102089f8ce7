//! Compiling a YAML grammar into a command graph.
//!
//! Each command becomes a branch of its parent's [`BranchNode`]. A command's
//! own chain is its description, a [`FlagProcessor`] for its flags, one
//! [`Argument`] per declared argument and, when it has a `command`, an
//! executor rendering and running that command. Commands with sub-commands
//! branch on them, using their own chain as the branch default.

use std::rc::Rc;

use cmdgraph_core::argument::{Argument, Operator};
use cmdgraph_core::branch::BranchNode;
use cmdgraph_core::complete::SimpleCompleter;
use cmdgraph_core::data::Data;
use cmdgraph_core::flag::{BoolFlag, Flag, FlagProcessor};
use cmdgraph_core::input::UNBOUNDED;
use cmdgraph_core::node::{serial_nodes, serial_nodes_to, Description, ExecutorProcessor, Node, Processor};
use cmdgraph_core::output::Output;
use cmdgraph_core::shell::{template_context, CommandRunner, ShellInvocation};
use cmdgraph_core::validator::in_list;
use itertools::Itertools;
use leon::Template;
use log::info;

use crate::command_definitions::{
    ArgumentDefinition, ArgumentType, CommandDefinition, FlagDefinition, GrammarDefinition,
};
use crate::config::expand_working_directory;
use crate::error::{Error, Result};

/// Compiles grammars, running leaf commands through `runner` with `shell`.
pub struct GraphBuilder {
    runner: Rc<dyn CommandRunner>,
    shell: String,
}

impl GraphBuilder {
    pub fn new(runner: Rc<dyn CommandRunner>, shell: &str) -> Self {
        Self {
            runner,
            shell: shell.to_string(),
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidDefault`] for defaults that do not convert to
    /// their declared type, and template errors from command templates.
    pub fn build(&self, grammar: &GrammarDefinition) -> Result<Rc<Node>> {
        let branch = self.branch(&grammar.commands, None)?;
        let description = grammar.description.clone().unwrap_or_default();
        Ok(serial_nodes_to(branch, vec![Rc::new(Description::new(description))]))
    }

    fn branch(&self, commands: &[CommandDefinition], default: Option<Rc<Node>>) -> Result<Rc<Node>> {
        let mut branches = Vec::with_capacity(commands.len());
        for command in commands {
            let key = std::iter::once(&command.id).chain(&command.synonyms).join(" ");
            branches.push((key, self.command(command)?));
        }

        let mut branch = BranchNode::new(branches);
        if let Some(default) = default {
            branch = branch.with_default(default);
        }
        Ok(branch.build())
    }

    fn command(&self, command: &CommandDefinition) -> Result<Rc<Node>> {
        let description: Rc<dyn Processor> =
            Rc::new(Description::new(command.description.clone().unwrap_or_default()));

        if command.commands.is_empty() {
            let mut processors = vec![description];
            processors.extend(self.own_chain(command)?);
            return Ok(serial_nodes(processors));
        }

        let default = match &command.command {
            Some(_) => Some(serial_nodes(self.own_chain(command)?)),
            None => None,
        };
        let branch = self.branch(&command.commands, default)?;
        Ok(serial_nodes_to(branch, vec![description]))
    }

    fn own_chain(&self, command: &CommandDefinition) -> Result<Vec<Rc<dyn Processor>>> {
        let mut processors: Vec<Rc<dyn Processor>> = Vec::new();

        if !command.flags.is_empty() {
            let mut flags = FlagProcessor::new();
            for definition in &command.flags {
                flags = add_flag(flags, command, definition)?;
            }
            processors.push(Rc::new(flags));
        }

        for definition in &command.arguments {
            processors.push(argument_processor(command, definition)?);
        }

        if let Some(words) = &command.command {
            processors.push(Rc::new(self.executor(command, words)));
        }
        Ok(processors)
    }

    fn executor(&self, command: &CommandDefinition, words: &[String]) -> ExecutorProcessor {
        let runner = Rc::clone(&self.runner);
        let shell = self.shell.clone();
        let words = words.to_vec();
        let declared: Vec<String> = command
            .arguments
            .iter()
            .map(|argument| argument.name.clone())
            .chain(command.flags.iter().map(|flag| flag.name.clone()))
            .collect();
        let working_directory = expand_working_directory(command.working_directory.as_deref());
        let environment = command.environment.clone().unwrap_or_default();

        ExecutorProcessor::new(move |_output: &mut dyn Output, data: &Data| {
            let script = render_command(&words, &declared, data)?;
            info!("Executing command: {script}");

            let mut invocation = ShellInvocation::interactive_shell(&shell, &script);
            invocation.working_directory.clone_from(&working_directory);
            invocation.environment.clone_from(&environment);
            runner.status(&invocation)
        })
    }
}

/// Renders each word of a command template and joins them with spaces.
/// Declared names with no stored value render as empty strings.
pub fn render_command(
    words: &[String],
    declared: &[String],
    data: &Data,
) -> cmdgraph_core::Result<String> {
    let mut context = template_context(data);
    for name in declared {
        context.entry(name.clone()).or_default();
    }

    let mut rendered = Vec::with_capacity(words.len());
    for word in words {
        rendered.push(Template::parse(word)?.render(&context)?);
    }
    Ok(rendered.join(" "))
}

fn parse_default<T: Operator>(command: &CommandDefinition, name: &str, values: &[String]) -> Result<T> {
    T::from_args(values).map_err(|_| Error::InvalidDefault {
        command: command.id.clone(),
        name: name.to_string(),
        default: values.join(" "),
    })
}

fn single<T: Operator>(command: &CommandDefinition, definition: &ArgumentDefinition) -> Result<Argument<T>> {
    let description = definition.description.as_deref().unwrap_or_default();
    let mut argument = if definition.optional {
        Argument::optional(&definition.name, description)
    } else {
        Argument::new(&definition.name, description)
    };

    if let Some(default) = &definition.default {
        argument = argument.with_default(parse_default(
            command,
            &definition.name,
            std::slice::from_ref(default),
        )?);
    }
    if let Some(choices) = &definition.choices {
        argument = argument.with_completer(SimpleCompleter::new(choices.clone()));
    }
    Ok(argument)
}

fn list<T: Operator>(command: &CommandDefinition, definition: &ArgumentDefinition) -> Result<Argument<T>> {
    let optional = if definition.unbounded {
        UNBOUNDED
    } else {
        definition.optional_count.unwrap_or(0)
    };
    let mut argument = Argument::list(
        &definition.name,
        definition.description.as_deref().unwrap_or_default(),
        definition.min.unwrap_or(0),
        optional,
    );

    if let Some(default) = &definition.default {
        let values: Vec<String> = default.split_whitespace().map(ToString::to_string).collect();
        argument = argument.with_default(parse_default(command, &definition.name, &values)?);
    }
    if let Some(choices) = &definition.choices {
        argument = argument.with_completer(SimpleCompleter::new(choices.clone()).distinct());
    }
    Ok(argument)
}

fn argument_processor(
    command: &CommandDefinition,
    definition: &ArgumentDefinition,
) -> Result<Rc<dyn Processor>> {
    let processor: Rc<dyn Processor> = match (definition.kind, definition.is_list()) {
        (ArgumentType::String, false) => {
            let mut argument = single::<String>(command, definition)?;
            if let Some(choices) = &definition.choices {
                argument = argument.with_validator(in_list(choices.iter().cloned()));
            }
            Rc::new(argument)
        }
        (ArgumentType::String, true) => Rc::new(list::<Vec<String>>(command, definition)?),
        (ArgumentType::Int, false) => Rc::new(single::<i64>(command, definition)?),
        (ArgumentType::Int, true) => Rc::new(list::<Vec<i64>>(command, definition)?),
        (ArgumentType::Float, false) => Rc::new(single::<f64>(command, definition)?),
        (ArgumentType::Float, true) => Rc::new(list::<Vec<f64>>(command, definition)?),
        (ArgumentType::Bool, false) => Rc::new(single::<bool>(command, definition)?),
        (ArgumentType::Bool, true) => {
            return Err(Error::BoolList(command.id.clone(), definition.name.clone()))
        }
    };
    Ok(processor)
}

fn value_flag<T: Operator>(command: &CommandDefinition, definition: &FlagDefinition) -> Result<Flag<T>> {
    let mut flag = Flag::new(
        &definition.name,
        definition.short,
        definition.description.as_deref().unwrap_or_default(),
    );
    if let Some(default) = &definition.default {
        flag = flag.with_default(parse_default(
            command,
            &definition.name,
            std::slice::from_ref(default),
        )?);
    }
    if let Some(choices) = &definition.choices {
        flag = flag.with_completer(SimpleCompleter::new(choices.clone()));
    }
    Ok(flag)
}

fn add_flag(
    flags: FlagProcessor,
    command: &CommandDefinition,
    definition: &FlagDefinition,
) -> Result<FlagProcessor> {
    Ok(match definition.kind {
        ArgumentType::Bool => flags.with_flag(BoolFlag::new(
            &definition.name,
            definition.short,
            definition.description.as_deref().unwrap_or_default(),
        )),
        ArgumentType::String => flags.with_flag(value_flag::<String>(command, definition)?),
        ArgumentType::Int => flags.with_flag(value_flag::<i64>(command, definition)?),
        ArgumentType::Float => flags.with_flag(value_flag::<f64>(command, definition)?),
    })
}
