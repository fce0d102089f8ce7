//! The completion engine.

use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use log::debug;

use crate::data::Data;
use crate::error::Result;
use crate::execute::{walk, ExecuteData};
use crate::input::Input;
use crate::node::Node;
use crate::output::DiscardOutput;

type DeferredFn = Box<dyn FnOnce(&Data) -> Result<Option<Completion>>>;

/// A sub-graph executed (silently) before the real suggestions are computed
/// from the data it produced.
pub struct DeferredCompletion {
    pub graph: Rc<Node>,
    pub then: DeferredFn,
}

/// The result of a completion step.
#[derive(Default)]
pub struct Completion {
    pub suggestions: Vec<String>,
    pub case_insensitive: bool,
    /// Return suggestions as-is instead of filtering by the typed prefix.
    pub ignore_filter: bool,
    /// Drop suggestions already supplied to the same list argument.
    pub distinct: bool,
    pub deferred: Option<DeferredCompletion>,
}

impl Completion {
    pub fn suggest<I, S>(suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suggestions: suggestions.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn deferred(
        graph: Rc<Node>,
        then: impl FnOnce(&Data) -> Result<Option<Completion>> + 'static,
    ) -> Self {
        Self {
            deferred: Some(DeferredCompletion {
                graph,
                then: Box::new(then),
            }),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    #[must_use]
    pub fn ignore_filter(mut self) -> Self {
        self.ignore_filter = true;
        self
    }

    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Filters, orders and shell-escapes the suggestions for the token being
    /// completed in `input`.
    pub fn process(self, input: &Input) -> Vec<String> {
        let typed = input.last_value().unwrap_or("");
        let mut suggestions = self.suggestions;

        if !self.ignore_filter {
            if self.case_insensitive {
                let typed = typed.to_lowercase();
                suggestions.retain(|s| s.to_lowercase().starts_with(&typed));
            } else {
                suggestions.retain(|s| s.starts_with(typed));
            }
        }

        suggestions.sort();
        suggestions.dedup();

        if input.delimiter().is_none() {
            for suggestion in &mut suggestions {
                *suggestion = suggestion.replace(' ', "\\ ");
            }
        }
        suggestions
    }
}

impl Debug for Completion {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Completion")
            .field("suggestions", &self.suggestions)
            .field("case_insensitive", &self.case_insensitive)
            .field("ignore_filter", &self.ignore_filter)
            .field("distinct", &self.distinct)
            .field("deferred", &self.deferred.is_some())
            .finish()
    }
}

/// Produces suggestions for the value an argument is being given.
pub trait Completer {
    fn complete(&self, value: &str, data: &Data) -> Result<Option<Completion>>;
}

impl<F> Completer for F
where
    F: Fn(&str, &Data) -> Result<Option<Completion>>,
{
    fn complete(&self, value: &str, data: &Data) -> Result<Option<Completion>> {
        self(value, data)
    }
}

/// Suggests a fixed list of values.
#[derive(Debug, Clone, Default)]
pub struct SimpleCompleter {
    suggestions: Vec<String>,
    distinct: bool,
}

impl SimpleCompleter {
    pub fn new<I, S>(suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suggestions: suggestions.into_iter().map(Into::into).collect(),
            distinct: false,
        }
    }

    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }
}

impl Completer for SimpleCompleter {
    fn complete(&self, _value: &str, _data: &Data) -> Result<Option<Completion>> {
        let mut completion = Completion::suggest(self.suggestions.iter().cloned());
        completion.distinct = self.distinct;
        Ok(Some(completion))
    }
}

/// Computes autocomplete suggestions for a shell completion line.
///
/// # Errors
///
/// Returns the first error produced by a processor's completion.
pub fn autocomplete<S: AsRef<str>>(
    root: &Rc<Node>,
    comp_line: &str,
    passthrough: &[S],
) -> Result<Vec<String>> {
    let mut input = Input::parse_comp_line(comp_line, passthrough);
    let mut data = Data::new();
    let completion = complete_graph(root, &mut input, &mut data, true)?;
    Ok(completion.map(|c| c.process(&input)).unwrap_or_default())
}

/// Walks completion processors from `root`, stopping at the first completion.
///
/// `check_extra_args` is disabled for nested walks, which leave trailing
/// tokens for the enclosing context.
pub(crate) fn complete_graph(
    root: &Rc<Node>,
    input: &mut Input,
    data: &mut Data,
    check_extra_args: bool,
) -> Result<Option<Completion>> {
    let mut node = Rc::clone(root);
    loop {
        if let Some(completion) = node.processor.complete(input, data)? {
            return resolve_deferred(completion, input, data).map(Some);
        }

        match node.next(input, data)? {
            Some(next) => node = next,
            None => break,
        }
    }

    if check_extra_args {
        input.check_for_extra_args_error()?;
    }
    Ok(None)
}

fn resolve_deferred(mut completion: Completion, input: &mut Input, data: &mut Data) -> Result<Completion> {
    let Some(deferred) = completion.deferred.take() else {
        return Ok(completion);
    };

    debug!("Running deferred completion graph");
    let mut sink = DiscardOutput::default();
    let mut exec = ExecuteData::new();
    walk(&deferred.graph, input, &mut sink, data, &mut exec)?;
    exec.run_executors(&mut sink, data)?;

    Ok((deferred.then)(data)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::error::Error;
    use crate::node::SimpleProcessor;
    use crate::serial_nodes;

    fn input_with_last(line: &str) -> Input {
        Input::parse_comp_line(line, &[] as &[&str])
    }

    #[test]
    fn test_process_filters_sorts_and_dedups() {
        let completion = Completion::suggest(["beta", "alpha", "apple", "alpha"]);
        assert_eq!(completion.process(&input_with_last("cmd a")), vec!["alpha", "apple"]);
    }

    #[test]
    fn test_process_case_insensitive() {
        let completion = Completion::suggest(["Apple", "avocado", "Banana"]).case_insensitive();
        assert_eq!(completion.process(&input_with_last("cmd A")), vec!["Apple", "avocado"]);
    }

    #[test]
    fn test_process_ignore_filter() {
        let completion = Completion::suggest(["b", "a"]).ignore_filter();
        assert_eq!(completion.process(&input_with_last("cmd z")), vec!["a", "b"]);
    }

    #[test]
    fn test_process_escapes_spaces_outside_quotes() {
        let completion = Completion::suggest(["one two"]);
        assert_eq!(completion.process(&input_with_last("cmd o")), vec!["one\\ two"]);

        let completion = Completion::suggest(["one two"]);
        assert_eq!(completion.process(&input_with_last("cmd \"o")), vec!["one two"]);
    }

    #[test]
    fn test_first_completion_short_circuits() {
        let visited = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&visited);
        let root = serial_nodes![
            SimpleProcessor::new()
                .on_complete(|_input, _data| Ok(Some(Completion::suggest(["one", "two"])))),
            SimpleProcessor::new().on_complete(move |_input, _data| {
                *flag.borrow_mut() = true;
                Ok(None)
            }),
        ];

        let suggestions = autocomplete(&root, "cmd ", &[] as &[&str]).unwrap();
        assert_eq!(suggestions, vec!["one", "two"]);
        assert!(!*visited.borrow());
    }

    #[test]
    fn test_completion_error_is_returned() {
        let root = serial_nodes![SimpleProcessor::new()
            .on_complete(|_input, _data| Err(Error::processor("no completions")))];
        let err = autocomplete(&root, "cmd ", &[] as &[&str]).unwrap_err();
        assert_eq!(err.to_string(), "no completions");
    }

    #[test]
    fn test_no_completion_with_leftover_tokens_is_extra_args() {
        let root = serial_nodes![SimpleProcessor::new()];
        let err = autocomplete(&root, "cmd a ", &[] as &[&str]).unwrap_err();
        assert!(matches!(err, Error::ExtraArgs(_)));

        let suggestions = autocomplete(&root, "cmd", &[] as &[&str]).unwrap();
        assert!(suggestions.is_empty());
    }

    #[test]
    fn test_deferred_completion_runs_sub_graph_silently() {
        let sub_graph = serial_nodes![SimpleProcessor::new().on_execute(
            |_input, output, data, exec| {
                output.stdout("should never be seen");
                output.stderr("nor this");
                data.set("fruits", vec!["apple".to_string(), "banana".to_string()]);
                exec.add_executor(|output, _data| {
                    output.stdout("executor output is discarded too");
                    Ok(())
                });
                Ok(())
            }
        )];

        let root = serial_nodes![SimpleProcessor::new().on_complete(move |_input, _data| {
            Ok(Some(Completion::deferred(Rc::clone(&sub_graph), |data| {
                Ok(Some(Completion::suggest(data.string_list("fruits").iter().cloned())))
            })))
        })];

        let suggestions = autocomplete(&root, "cmd b", &[] as &[&str]).unwrap();
        assert_eq!(suggestions, vec!["banana"]);
    }

    #[test]
    fn test_simple_completer() {
        let completer = SimpleCompleter::new(["x", "y"]).distinct();
        let completion = completer.complete("", &Data::new()).unwrap().unwrap();
        assert_eq!(completion.suggestions, vec!["x", "y"]);
        assert!(completion.distinct);
    }
}
