//! Recording the exact tokens a sub-graph consumed.

use std::rc::Rc;

use log::debug;

use crate::complete::{complete_graph, Completion};
use crate::data::Data;
use crate::error::Result;
use crate::execute::{walk, ExecuteData};
use crate::input::Input;
use crate::node::{Edge, Node, Processor};
use crate::output::Output;
use crate::usage::{walk_usage, Usage};

/// Runs a wrapped graph and stores the tokens it consumed (after any
/// in-place transformation) as a string list under `key`.
///
/// Usage rendering skips the recording and documents the wrapped graph
/// followed by whatever comes after it.
pub struct RecordNode {
    key: String,
    inner: Rc<Node>,
    next: Option<Rc<Node>>,
}

impl RecordNode {
    pub fn new(key: &str, inner: Rc<Node>) -> Self {
        Self {
            key: key.to_string(),
            inner,
            next: None,
        }
    }

    /// Continues to `next` once the wrapped graph finishes.
    #[must_use]
    pub fn then(mut self, next: Rc<Node>) -> Self {
        self.next = Some(next);
        self
    }

    pub fn build(self) -> Rc<Node> {
        let record = Rc::new(self);
        Node::new(record.clone(), Some(record as Rc<dyn Edge>))
    }
}

impl Processor for RecordNode {
    fn execute(
        &self,
        input: &mut Input,
        output: &mut dyn Output,
        data: &mut Data,
        exec: &mut ExecuteData,
    ) -> Result<()> {
        let snapshot = input.snapshot();
        walk(&self.inner, input, output, data, exec)?;

        let consumed = input.consumed_since(snapshot);
        debug!("Recorded {} token(s) under `{}`", consumed.len(), self.key);
        data.set(&self.key, consumed);
        Ok(())
    }

    fn complete(&self, input: &mut Input, data: &mut Data) -> Result<Option<Completion>> {
        complete_graph(&self.inner, input, data, false)
    }

    fn usage(&self, input: &mut Input, data: &mut Data, usage: &mut Usage) -> Result<()> {
        walk_usage(&self.inner, input, data, usage)
    }
}

impl Edge for RecordNode {
    fn next(&self, _input: &mut Input, _data: &mut Data) -> Result<Option<Rc<Node>>> {
        Ok(self.next.clone())
    }

    fn usage_next(&self, _input: &mut Input, _data: &mut Data) -> Result<Option<Rc<Node>>> {
        Ok(self.next.clone())
    }
}
