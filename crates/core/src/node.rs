//! The command graph: nodes pairing behavior ([`Processor`]) with routing
//! ([`Edge`]).

use std::rc::Rc;

use crate::complete::Completion;
use crate::data::Data;
use crate::error::Result;
use crate::execute::ExecuteData;
use crate::input::Input;
use crate::output::Output;
use crate::usage::Usage;

/// Behavior run at a node by each of the three engines.
pub trait Processor {
    fn execute(
        &self,
        input: &mut Input,
        output: &mut dyn Output,
        data: &mut Data,
        exec: &mut ExecuteData,
    ) -> Result<()>;

    /// Returns a completion when this processor owns the token being typed,
    /// which ends the completion walk.
    fn complete(&self, input: &mut Input, data: &mut Data) -> Result<Option<Completion>>;

    fn usage(&self, input: &mut Input, data: &mut Data, usage: &mut Usage) -> Result<()>;
}

/// Routing out of a node.
///
/// Execution and completion follow [`Edge::next`]; usage rendering follows
/// [`Edge::usage_next`], which lets wrapper nodes document the graph they wrap
/// without running their own logic.
pub trait Edge {
    fn next(&self, input: &mut Input, data: &mut Data) -> Result<Option<Rc<Node>>>;

    fn usage_next(&self, input: &mut Input, data: &mut Data) -> Result<Option<Rc<Node>>>;
}

pub struct Node {
    pub processor: Rc<dyn Processor>,
    pub edge: Option<Rc<dyn Edge>>,
}

impl Node {
    pub fn new(processor: Rc<dyn Processor>, edge: Option<Rc<dyn Edge>>) -> Rc<Self> {
        Rc::new(Self { processor, edge })
    }

    pub fn next(&self, input: &mut Input, data: &mut Data) -> Result<Option<Rc<Node>>> {
        match &self.edge {
            Some(edge) => edge.next(input, data),
            None => Ok(None),
        }
    }

    pub fn usage_next(&self, input: &mut Input, data: &mut Data) -> Result<Option<Rc<Node>>> {
        match &self.edge {
            Some(edge) => edge.usage_next(input, data),
            None => Ok(None),
        }
    }
}

/// An edge that always routes to the same node in every mode.
pub struct SimpleEdge(pub Rc<Node>);

impl Edge for SimpleEdge {
    fn next(&self, _input: &mut Input, _data: &mut Data) -> Result<Option<Rc<Node>>> {
        Ok(Some(Rc::clone(&self.0)))
    }

    fn usage_next(&self, _input: &mut Input, _data: &mut Data) -> Result<Option<Rc<Node>>> {
        Ok(Some(Rc::clone(&self.0)))
    }
}

/// Chains `processors` into a straight line of nodes.
pub fn serial_nodes(processors: Vec<Rc<dyn Processor>>) -> Rc<Node> {
    build_chain(None, processors)
}

/// Chains `processors` into a straight line of nodes ending in `next`.
pub fn serial_nodes_to(next: Rc<Node>, processors: Vec<Rc<dyn Processor>>) -> Rc<Node> {
    if processors.is_empty() {
        return next;
    }
    build_chain(Some(next), processors)
}

fn build_chain(next: Option<Rc<Node>>, processors: Vec<Rc<dyn Processor>>) -> Rc<Node> {
    let mut processors = processors.into_iter().rev();
    let Some(last) = processors.next() else {
        return Node::new(Rc::new(Description::default()), None);
    };

    let mut node = Node::new(last, next.map(simple_edge));
    for processor in processors {
        node = Node::new(processor, Some(simple_edge(node)));
    }
    node
}

fn simple_edge(node: Rc<Node>) -> Rc<dyn Edge> {
    Rc::new(SimpleEdge(node))
}

/// Builds a node chain from processor expressions.
///
/// `serial_nodes![a, b]` chains `a` then `b`; `serial_nodes![a, b => node]`
/// continues into an existing node afterwards.
#[macro_export]
macro_rules! serial_nodes {
    ($($processor:expr),+ $(,)? => $next:expr) => {
        $crate::node::serial_nodes_to(
            $next,
            vec![$(::std::rc::Rc::new($processor) as ::std::rc::Rc<dyn $crate::node::Processor>),+],
        )
    };
    ($($processor:expr),* $(,)?) => {
        $crate::node::serial_nodes(
            vec![$(::std::rc::Rc::new($processor) as ::std::rc::Rc<dyn $crate::node::Processor>),*],
        )
    };
}

/// Contributes a description to the usage text and does nothing otherwise.
#[derive(Debug, Clone, Default)]
pub struct Description(pub String);

impl Description {
    pub fn new(description: impl Into<String>) -> Self {
        Self(description.into())
    }
}

impl Processor for Description {
    fn execute(
        &self,
        _input: &mut Input,
        _output: &mut dyn Output,
        _data: &mut Data,
        _exec: &mut ExecuteData,
    ) -> Result<()> {
        Ok(())
    }

    fn complete(&self, _input: &mut Input, _data: &mut Data) -> Result<Option<Completion>> {
        Ok(None)
    }

    fn usage(&self, _input: &mut Input, _data: &mut Data, usage: &mut Usage) -> Result<()> {
        if !self.0.is_empty() {
            usage.set_description(&self.0);
        }
        Ok(())
    }
}

type ExecuteFn = Box<dyn Fn(&mut Input, &mut dyn Output, &mut Data, &mut ExecuteData) -> Result<()>>;
type CompleteFn = Box<dyn Fn(&mut Input, &mut Data) -> Result<Option<Completion>>>;

/// A processor built from closures. Missing closures do nothing.
#[derive(Default)]
pub struct SimpleProcessor {
    execute: Option<ExecuteFn>,
    complete: Option<CompleteFn>,
}

impl SimpleProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_execute(
        mut self,
        f: impl Fn(&mut Input, &mut dyn Output, &mut Data, &mut ExecuteData) -> Result<()> + 'static,
    ) -> Self {
        self.execute = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_complete(
        mut self,
        f: impl Fn(&mut Input, &mut Data) -> Result<Option<Completion>> + 'static,
    ) -> Self {
        self.complete = Some(Box::new(f));
        self
    }
}

impl Processor for SimpleProcessor {
    fn execute(
        &self,
        input: &mut Input,
        output: &mut dyn Output,
        data: &mut Data,
        exec: &mut ExecuteData,
    ) -> Result<()> {
        match &self.execute {
            Some(f) => f(input, output, data, exec),
            None => Ok(()),
        }
    }

    fn complete(&self, input: &mut Input, data: &mut Data) -> Result<Option<Completion>> {
        match &self.complete {
            Some(f) => f(input, data),
            None => Ok(None),
        }
    }

    fn usage(&self, _input: &mut Input, _data: &mut Data, _usage: &mut Usage) -> Result<()> {
        Ok(())
    }
}

type ExecutorFn = Rc<dyn Fn(&mut dyn Output, &Data) -> Result<()>>;

/// Queues `f` to run once the whole graph has been walked successfully.
pub struct ExecutorProcessor {
    f: ExecutorFn,
}

impl ExecutorProcessor {
    pub fn new(f: impl Fn(&mut dyn Output, &Data) -> Result<()> + 'static) -> Self {
        Self { f: Rc::new(f) }
    }
}

impl Processor for ExecutorProcessor {
    fn execute(
        &self,
        _input: &mut Input,
        _output: &mut dyn Output,
        _data: &mut Data,
        exec: &mut ExecuteData,
    ) -> Result<()> {
        let f = Rc::clone(&self.f);
        exec.add_executor(move |output, data| f(output, data));
        Ok(())
    }

    fn complete(&self, _input: &mut Input, _data: &mut Data) -> Result<Option<Completion>> {
        Ok(None)
    }

    fn usage(&self, _input: &mut Input, _data: &mut Data, _usage: &mut Usage) -> Result<()> {
        Ok(())
    }
}
