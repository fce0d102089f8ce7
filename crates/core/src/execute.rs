//! The execution engine.

use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use log::debug;

use crate::data::Data;
use crate::error::Result;
use crate::input::Input;
use crate::node::Node;
use crate::output::Output;

/// Work queued during traversal, run only after the whole graph was walked
/// with every token consumed.
pub type Executor = Box<dyn FnOnce(&mut dyn Output, &Data) -> Result<()>>;

#[derive(Default)]
pub struct ExecuteData {
    executors: Vec<Executor>,
    /// Shell lines for a calling shell integration to evaluate after the run.
    pub executable: Vec<String>,
}

impl ExecuteData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_executor(&mut self, f: impl FnOnce(&mut dyn Output, &Data) -> Result<()> + 'static) {
        self.executors.push(Box::new(f));
    }

    pub fn pending_executors(&self) -> usize {
        self.executors.len()
    }

    /// Runs the queued executors in insertion order, stopping at the first
    /// failure.
    pub fn run_executors(&mut self, output: &mut dyn Output, data: &Data) -> Result<()> {
        for executor in std::mem::take(&mut self.executors) {
            executor(output, data)?;
        }
        Ok(())
    }
}

impl Debug for ExecuteData {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ExecuteData")
            .field("executors", &self.executors.len())
            .field("executable", &self.executable)
            .finish()
    }
}

/// Executes the graph rooted at `root` against `input`.
///
/// # Errors
///
/// Returns the first processor error, an extra-args error when tokens are
/// left over, or the first executor error. Every error is also written to
/// `output`. No executor runs unless the traversal fully succeeded.
pub fn execute(root: &Rc<Node>, input: &mut Input, output: &mut dyn Output) -> Result<ExecuteData> {
    let mut data = Data::new();
    execute_with(root, input, output, &mut data)
}

/// Like [`execute`], but populates a caller-owned [`Data`].
pub fn execute_with(
    root: &Rc<Node>,
    input: &mut Input,
    output: &mut dyn Output,
    data: &mut Data,
) -> Result<ExecuteData> {
    let mut exec = ExecuteData::new();

    if let Err(e) = walk(root, input, output, data, &mut exec) {
        return Err(output.err(e));
    }

    if let Err(e) = input.check_for_extra_args_error() {
        return Err(output.err(e));
    }

    debug!("Graph walked, running {} executor(s)", exec.pending_executors());
    if let Err(e) = exec.run_executors(output, data) {
        return Err(output.err(e));
    }

    Ok(exec)
}

/// Walks execute processors from `root` until an edge yields no node.
pub(crate) fn walk(
    root: &Rc<Node>,
    input: &mut Input,
    output: &mut dyn Output,
    data: &mut Data,
    exec: &mut ExecuteData,
) -> Result<()> {
    let mut node = Rc::clone(root);
    loop {
        node.processor.execute(input, output, data, exec)?;
        if let Some(err) = output.take_termination() {
            debug!("Output requested termination");
            return Err(err);
        }

        match node.next(input, data)? {
            Some(next) => node = next,
            None => return Ok(()),
        }
    }
}
