//! Running templated shell commands.
//!
//! Subprocesses are launched through a [`CommandRunner`] so the graph can be
//! exercised without spawning anything.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::process::{Command, Stdio};
use std::rc::Rc;

use indexmap::IndexMap;
use leon::Template;
use log::{debug, info};

use crate::complete::Completion;
use crate::data::Data;
use crate::error::{Error, Result};
use crate::execute::ExecuteData;
use crate::input::Input;
use crate::node::Processor;
use crate::output::Output;
use crate::usage::Usage;

/// Default shell to use for command execution
pub const DEFAULT_SHELL: &str = "/bin/bash";

/// A fully rendered subprocess launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub working_directory: Option<String>,
    pub environment: IndexMap<String, String>,
}

impl ShellInvocation {
    /// `shell -c script`.
    pub fn shell(shell: &str, script: &str) -> Self {
        Self {
            program: shell.to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            working_directory: None,
            environment: IndexMap::new(),
        }
    }

    /// `shell -i -c script`, which makes the shell read its rc files first.
    pub fn interactive_shell(shell: &str, script: &str) -> Self {
        let mut invocation = Self::shell(shell, script);
        invocation.args.insert(0, "-i".to_string());
        invocation
    }

    /// The script passed to the shell, or the whole command line.
    pub fn script(&self) -> String {
        match self.args.iter().position(|arg| arg == "-c") {
            Some(i) => self.args[i + 1..].join(" "),
            None => self.to_string(),
        }
    }
}

impl Display for ShellInvocation {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.program)?;
        for arg in &self.args {
            write!(formatter, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

pub trait CommandRunner {
    /// Runs the invocation capturing its output.
    fn output(&self, invocation: &ShellInvocation) -> Result<CommandOutput>;

    /// Runs the invocation attached to the current terminal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SubProcessExit`] on a non-success exit code.
    fn status(&self, invocation: &ShellInvocation) -> Result<()>;
}

/// Spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn command(invocation: &ShellInvocation) -> Command {
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(working_directory) = &invocation.working_directory {
            command.current_dir(shellexpand::tilde(working_directory).as_ref());
        }
        if !invocation.environment.is_empty() {
            info!("Executing with environment variables: {:?}", invocation.environment);
            command.envs(&invocation.environment);
        }
        command
    }
}

impl CommandRunner for SystemRunner {
    fn output(&self, invocation: &ShellInvocation) -> Result<CommandOutput> {
        debug!("Capturing output of `{invocation}`");
        let output = Self::command(invocation).stdin(Stdio::null()).output()?;
        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            success: output.status.success(),
        })
    }

    fn status(&self, invocation: &ShellInvocation) -> Result<()> {
        info!("Running `{invocation}`");
        let subprocess_exit_success = Self::command(invocation)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()?
            .wait()?
            .success();

        if subprocess_exit_success {
            Ok(())
        } else {
            Err(Error::SubProcessExit(invocation.script()))
        }
    }
}

/// The string form of every value in `data`, keyed like the store.
pub fn template_context(data: &Data) -> HashMap<String, String> {
    data.iter()
        .map(|(key, value)| (key.clone(), value.to_string()))
        .collect()
}

/// Renders each `{name}` placeholder in `template` with the value stored
/// under `name`.
///
/// # Errors
///
/// Fails on malformed templates and on placeholders with no stored value.
pub fn render(template: &str, data: &Data) -> Result<String> {
    let context = template_context(data);
    Ok(Template::parse(template)?.render(&context)?)
}

/// Runs a templated script and stores its trimmed, non-empty stdout lines
/// under `key`.
pub struct ShellCommand {
    key: String,
    script: String,
    shell: String,
    working_directory: Option<String>,
    environment: IndexMap<String, String>,
    runner: Rc<dyn CommandRunner>,
}

impl ShellCommand {
    /// # Errors
    ///
    /// Returns [`Error::Parse`] when `script` is not a valid template.
    pub fn new(key: &str, script: &str, runner: Rc<dyn CommandRunner>) -> Result<Self> {
        Template::parse(script)?;
        Ok(Self {
            key: key.to_string(),
            script: script.to_string(),
            shell: DEFAULT_SHELL.to_string(),
            working_directory: None,
            environment: IndexMap::new(),
            runner,
        })
    }

    #[must_use]
    pub fn with_shell(mut self, shell: &str) -> Self {
        self.shell = shell.to_string();
        self
    }

    #[must_use]
    pub fn with_working_directory(mut self, working_directory: &str) -> Self {
        self.working_directory = Some(working_directory.to_string());
        self
    }

    #[must_use]
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.environment.insert(key.to_string(), value.to_string());
        self
    }

    fn invocation(&self, data: &Data) -> Result<ShellInvocation> {
        let mut invocation = ShellInvocation::shell(&self.shell, &render(&self.script, data)?);
        invocation.working_directory.clone_from(&self.working_directory);
        invocation.environment.clone_from(&self.environment);
        Ok(invocation)
    }
}

impl Processor for ShellCommand {
    fn execute(
        &self,
        _input: &mut Input,
        output: &mut dyn Output,
        data: &mut Data,
        _exec: &mut ExecuteData,
    ) -> Result<()> {
        let invocation = self.invocation(data)?;
        let result = self.runner.output(&invocation)?;
        for line in result.stderr.lines() {
            output.stderr(line);
        }
        if !result.success {
            return Err(Error::SubProcessExit(invocation.script()));
        }

        let lines: Vec<String> = result
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToString::to_string)
            .collect();
        debug!("`{}` produced {} line(s)", invocation.script(), lines.len());
        data.set(&self.key, lines);
        Ok(())
    }

    /// Commands only run during execution, including the silent execution
    /// of a deferred completion graph.
    fn complete(&self, _input: &mut Input, _data: &mut Data) -> Result<Option<Completion>> {
        Ok(None)
    }

    fn usage(&self, _input: &mut Input, _data: &mut Data, _usage: &mut Usage) -> Result<()> {
        Ok(())
    }
}
