//! Fan-out on a branching token.

use std::collections::HashMap;
use std::iter;
use std::rc::Rc;

use indexmap::IndexMap;
use itertools::Itertools;
use log::debug;

use crate::complete::{complete_graph, Completion};
use crate::data::Data;
use crate::error::{Error, Result};
use crate::execute::ExecuteData;
use crate::input::Input;
use crate::node::{Edge, Node, Processor};
use crate::output::Output;
use crate::usage::{walk_usage, Usage, SYMBOLS_SECTION};

const BRANCH_SYMBOL: &str = "<";

/// Routes to a child graph selected by the next token.
///
/// Branch keys may declare inline synonyms (`"name syn1 syn2"`); extra
/// synonyms can be registered with [`BranchNode::with_synonym`].
#[derive(Default)]
pub struct BranchNode {
    branches: IndexMap<String, Rc<Node>>,
    synonyms: HashMap<String, String>,
    default: Option<Rc<Node>>,
    hide_usage: bool,
}

impl BranchNode {
    pub fn new<I, K>(branches: I) -> Self
    where
        I: IntoIterator<Item = (K, Rc<Node>)>,
        K: Into<String>,
    {
        Self {
            branches: branches
                .into_iter()
                .map(|(key, node)| (key.into(), node))
                .collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_default(mut self, default: Rc<Node>) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub fn with_synonym(mut self, synonym: impl Into<String>, branch: impl Into<String>) -> Self {
        self.synonyms.insert(synonym.into(), branch.into());
        self
    }

    /// Keeps branch subsections out of the rendered usage.
    #[must_use]
    pub fn hide_usage(mut self) -> Self {
        self.hide_usage = true;
        self
    }

    pub fn build(self) -> Rc<Node> {
        let branch = Rc::new(self);
        Node::new(branch.clone(), Some(branch as Rc<dyn Edge>))
    }

    /// Canonical branch names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.branches
            .keys()
            .filter_map(|key| key.split_whitespace().next())
            .map(ToString::to_string)
            .sorted()
            .collect()
    }

    fn aliases(&self, key: &str) -> (String, Vec<String>) {
        let mut parts = key.split_whitespace().map(ToString::to_string);
        let name = parts.next().unwrap_or_default();
        let explicit = self
            .synonyms
            .iter()
            .filter(|(_, branch)| **branch == name)
            .map(|(synonym, _)| synonym.clone())
            .sorted();
        let aliases = parts.chain(explicit).collect();
        (name, aliases)
    }

    fn default_or_error(&self) -> Result<Rc<Node>> {
        self.default
            .clone()
            .ok_or_else(|| Error::Branching(self.names()))
    }

    /// Picks the child graph for the next token, consuming it on a match.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Branching`] when nothing matches and there is no
    /// default.
    pub fn resolve(&self, input: &mut Input) -> Result<Rc<Node>> {
        let Some(token) = input.peek() else {
            return self.default_or_error();
        };
        let canonical = self
            .synonyms
            .get(token)
            .map_or(token, String::as_str)
            .to_string();

        let matched = self
            .branches
            .iter()
            .find(|(key, _)| key.split_whitespace().any(|name| name == canonical))
            .map(|(_, node)| Rc::clone(node));

        match matched {
            Some(node) => {
                debug!("Taking branch `{canonical}`");
                input.pop();
                Ok(node)
            }
            None => self.default_or_error(),
        }
    }
}

impl Processor for BranchNode {
    fn execute(
        &self,
        _input: &mut Input,
        _output: &mut dyn Output,
        _data: &mut Data,
        _exec: &mut ExecuteData,
    ) -> Result<()> {
        Ok(())
    }

    fn complete(&self, input: &mut Input, data: &mut Data) -> Result<Option<Completion>> {
        if input.num_remaining() > 1 {
            return Ok(None);
        }

        let Some(default) = &self.default else {
            return Ok(Some(Completion::suggest(self.names())));
        };
        match complete_graph(default, input, data, false)? {
            Some(mut completion) => {
                completion.suggestions.extend(self.names());
                Ok(Some(completion))
            }
            None => Ok(Some(Completion::suggest(self.names()))),
        }
    }

    fn usage(&self, input: &mut Input, data: &mut Data, usage: &mut Usage) -> Result<()> {
        if !input.fully_processed() {
            return Ok(());
        }

        if let Some(default) = &self.default {
            walk_usage(default, input, data, usage)?;
        }
        if self.hide_usage || self.branches.is_empty() {
            return Ok(());
        }

        usage.add_token(BRANCH_SYMBOL);
        usage.add_section_entry(SYMBOLS_SECTION, BRANCH_SYMBOL, ["Start of subcommand branches"]);

        for (key, node) in self
            .branches
            .iter()
            .map(|(key, node)| (self.aliases(key), node))
            .sorted_by(|((a, _), _), ((b, _), _)| a.cmp(b))
        {
            let (name, aliases) = key;
            let label = if aliases.is_empty() {
                name
            } else {
                format!("[{}]", iter::once(name).chain(aliases).join("|"))
            };

            let mut subsection = Usage::new();
            subsection.add_token(label);
            walk_usage(node, &mut Input::default(), &mut Data::new(), &mut subsection)?;
            usage.add_subsection(subsection);
        }
        Ok(())
    }
}

impl Edge for BranchNode {
    fn next(&self, input: &mut Input, _data: &mut Data) -> Result<Option<Rc<Node>>> {
        self.resolve(input).map(Some)
    }

    /// Stops once the branch has rendered all of its subsections.
    fn usage_next(&self, input: &mut Input, _data: &mut Data) -> Result<Option<Rc<Node>>> {
        if input.fully_processed() {
            return Ok(None);
        }
        self.resolve(input).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complete::autocomplete;
    use crate::execute::execute_with;
    use crate::node::{Description, SimpleProcessor};
    use crate::output::BufferedOutput;
    use crate::serial_nodes;
    use crate::usage::{get_usage, get_usage_for};

    fn marker(route: &'static str) -> Rc<Node> {
        serial_nodes![SimpleProcessor::new().on_execute(move |_input, _output, data, _exec| {
            data.set("route", route);
            Ok(())
        })]
    }

    fn pop_n_into(key: &'static str, n: usize) -> Rc<Node> {
        serial_nodes![SimpleProcessor::new().on_execute(move |input, _output, data, _exec| {
            let (values, enough) = input.pop_n(n, 0, None);
            let values: Vec<String> = values.into_iter().map(|v| v.clone()).collect();
            if !enough {
                return Err(Error::not_enough_args(key, n, values.len()));
            }
            data.set(key, values);
            Ok(())
        })]
    }

    fn run(root: &Rc<Node>, args: &[&str]) -> (Result<ExecuteData>, Data, Input) {
        let mut input = Input::parse_args(args);
        let mut data = Data::new();
        let mut output = BufferedOutput::new();
        let result = execute_with(root, &mut input, &mut output, &mut data);
        (result, data, input)
    }

    #[test]
    fn test_inline_synonym_routes_to_branch() {
        let root = BranchNode::new([("a", marker("A")), ("b x y", marker("B"))])
            .with_default(marker("D"))
            .build();

        let (result, data, _) = run(&root, &["x"]);
        result.unwrap();
        assert_eq!(data.string("route"), "B");

        let (result, data, _) = run(&root, &["a"]);
        result.unwrap();
        assert_eq!(data.string("route"), "A");
    }

    #[test]
    fn test_unmatched_without_default_lists_sorted_names() {
        let root = BranchNode::new([("b x y", marker("B")), ("a", marker("A"))]).build();

        let (result, _, _) = run(&root, &["z"]);
        let err = result.unwrap_err();
        assert!(matches!(err, Error::Branching(ref names) if names == &["a", "b"]));
    }

    #[test]
    fn test_missing_token_uses_default_or_fails() {
        let with_default = BranchNode::new([("a", marker("A"))])
            .with_default(marker("D"))
            .build();
        let (result, data, _) = run(&with_default, &[]);
        result.unwrap();
        assert_eq!(data.string("route"), "D");

        let without_default = BranchNode::new([("a", marker("A"))]).build();
        let (result, _, _) = run(&without_default, &[]);
        assert!(matches!(result.unwrap_err(), Error::Branching(_)));
    }

    #[test]
    fn test_explicit_synonym() {
        let root = BranchNode::new([("remove", marker("R"))])
            .with_synonym("rm", "remove")
            .build();
        let (result, data, _) = run(&root, &["rm"]);
        result.unwrap();
        assert_eq!(data.string("route"), "R");
    }

    #[test]
    fn test_branch_consumes_all_args_of_selected_child() {
        let root = BranchNode::new([("b", pop_n_into("two", 2))])
            .with_default(pop_n_into("one", 1))
            .build();

        let (result, data, input) = run(&root, &["b", "SARG", "SARG"]);
        result.unwrap();
        assert_eq!(data.string_list("two"), ["SARG", "SARG"]);
        assert!(!data.has("one"));
        assert!(input.remaining().is_empty());
    }

    #[test]
    fn test_unmatched_token_falls_through_to_default() {
        let root = BranchNode::new([("b", pop_n_into("two", 2))])
            .with_default(pop_n_into("one", 1))
            .build();

        let (result, data, _) = run(&root, &["c"]);
        result.unwrap();
        assert_eq!(data.string_list("one"), ["c"]);
    }

    #[test]
    fn test_complete_branch_names() {
        let root = BranchNode::new([("beta", marker("B")), ("alpha al", marker("A")), ("bravo", marker("V"))])
            .build();

        assert_eq!(
            autocomplete(&root, "cmd ", &[] as &[&str]).unwrap(),
            vec!["alpha", "beta", "bravo"]
        );
        assert_eq!(
            autocomplete(&root, "cmd b", &[] as &[&str]).unwrap(),
            vec!["beta", "bravo"]
        );
    }

    #[test]
    fn test_complete_merges_default_suggestions() {
        let default = serial_nodes![SimpleProcessor::new()
            .on_complete(|_input, _data| Ok(Some(Completion::suggest(["default-value"]))))];
        let root = BranchNode::new([("dir", marker("D"))])
            .with_default(default)
            .build();

        assert_eq!(
            autocomplete(&root, "cmd d", &[] as &[&str]).unwrap(),
            vec!["default-value", "dir"]
        );
    }

    #[test]
    fn test_complete_descends_into_branch() {
        let inner = serial_nodes![SimpleProcessor::new()
            .on_complete(|_input, _data| Ok(Some(Completion::suggest(["inside"]))))];
        let root = BranchNode::new([("go", inner)]).build();

        assert_eq!(
            autocomplete(&root, "cmd go ", &[] as &[&str]).unwrap(),
            vec!["inside"]
        );
    }

    #[test]
    fn test_usage_renders_subsections() {
        let add = serial_nodes![Description::new("Adds an item")];
        let remove = serial_nodes![Description::new("Removes an item")];
        let root = serial_nodes![
            Description::new("Manage items")
            => BranchNode::new([("add", add), ("remove rm", remove)]).build()
        ];

        let expected = [
            "Manage items",
            "<",
            "│",
            "├── add",
            "│   Adds an item",
            "│",
            "└── [remove|rm]",
            "    Removes an item",
            "",
            "Symbols:",
            "  <: Start of subcommand branches",
        ]
        .join("\n");
        assert_eq!(get_usage(&root).unwrap().to_string(), expected);
    }

    #[test]
    fn test_usage_for_branch_path() {
        let add = serial_nodes![Description::new("Adds an item")];
        let root = BranchNode::new([("add", add)]).build();

        let usage = get_usage_for(&root, &mut Input::parse_args(&["add"])).unwrap();
        assert_eq!(usage.description(), Some("Adds an item"));
        assert!(usage.subsections().is_empty());

        let err = get_usage_for(&root, &mut Input::parse_args(&["nope"])).unwrap_err();
        assert!(matches!(err, Error::Branching(_)));
    }

    #[test]
    fn test_hidden_usage_only_shows_default() {
        let default = serial_nodes![Description::new("Default behavior")];
        let root = BranchNode::new([("secret", marker("S"))])
            .with_default(default)
            .hide_usage()
            .build();

        let usage = get_usage(&root).unwrap();
        assert!(usage.subsections().is_empty());
        assert_eq!(usage.description(), Some("Default behavior"));
    }
}
