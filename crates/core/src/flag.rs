//! Named flags that may appear anywhere among the remaining tokens.
//!
//! A [`FlagProcessor`] scans the whole input with the cursor's soft offset,
//! consuming `--name`, `-s` and grouped `-abc` tokens (with their values) and
//! skipping over everything else, so positional arguments processed later
//! never see a flag.

use log::debug;

use crate::argument::{Argument, Operator};
use crate::complete::{Completer, Completion};
use crate::data::Data;
use crate::error::Result;
use crate::execute::ExecuteData;
use crate::input::Input;
use crate::node::Processor;
use crate::output::Output;
use crate::usage::{Usage, FLAGS_SECTION, FLAG_PREFIX_WIDTH};
use crate::validator::Validator;

/// A flag as seen by [`FlagProcessor`].
pub trait AnyFlag {
    fn name(&self) -> &str;

    fn short(&self) -> Option<char>;

    /// Flags without values may be grouped (`-abc`).
    fn is_bool(&self) -> bool;

    /// Handles an occurrence whose flag token was already popped, popping
    /// any values from the read position.
    fn consume(&self, input: &mut Input, data: &mut Data) -> Result<()>;

    /// Like [`AnyFlag::consume`], but returns the completion when the flag's
    /// values run into the token being typed.
    fn complete(&self, input: &mut Input, data: &mut Data) -> Result<Option<Completion>>;

    fn store_default(&self, data: &mut Data);

    /// Description lines for the "Flags" section.
    fn usage_details(&self) -> Vec<String>;
}

/// A flag carrying one or more typed values.
#[derive(Debug)]
pub struct Flag<T: Operator> {
    argument: Argument<T>,
    short: Option<char>,
}

impl<T: Operator> Flag<T> {
    pub fn new(name: &str, short: Option<char>, description: &str) -> Self {
        Self {
            argument: Argument::new(name, description),
            short,
        }
    }

    pub fn list(name: &str, short: Option<char>, description: &str, min: usize, optional: usize) -> Self {
        Self {
            argument: Argument::list(name, description, min, optional),
            short,
        }
    }

    #[must_use]
    pub fn with_default(mut self, default: T) -> Self {
        self.argument = self.argument.with_default(default);
        self
    }

    #[must_use]
    pub fn with_validator(mut self, validator: Validator<T>) -> Self {
        self.argument = self.argument.with_validator(validator);
        self
    }

    #[must_use]
    pub fn with_completer(mut self, completer: impl Completer + 'static) -> Self {
        self.argument = self.argument.with_completer(completer);
        self
    }

    #[must_use]
    pub fn with_transformer(mut self, transformer: impl Fn(&str) -> Result<String> + 'static) -> Self {
        self.argument = self.argument.with_transformer(transformer);
        self
    }
}

impl<T: Operator> AnyFlag for Flag<T> {
    fn name(&self) -> &str {
        self.argument.name()
    }

    fn short(&self) -> Option<char> {
        self.short
    }

    fn is_bool(&self) -> bool {
        false
    }

    fn consume(&self, input: &mut Input, data: &mut Data) -> Result<()> {
        self.argument.consume(input, data)
    }

    fn complete(&self, input: &mut Input, data: &mut Data) -> Result<Option<Completion>> {
        Processor::complete(&self.argument, input, data)
    }

    fn store_default(&self, data: &mut Data) {
        self.argument.store_default(data);
    }

    fn usage_details(&self) -> Vec<String> {
        self.argument.usage_details()
    }
}

/// A flag that is `true` when present and `false` otherwise.
#[derive(Debug, Clone)]
pub struct BoolFlag {
    name: String,
    short: Option<char>,
    description: String,
}

impl BoolFlag {
    pub fn new(name: &str, short: Option<char>, description: &str) -> Self {
        Self {
            name: name.to_string(),
            short,
            description: description.to_string(),
        }
    }
}

impl AnyFlag for BoolFlag {
    fn name(&self) -> &str {
        &self.name
    }

    fn short(&self) -> Option<char> {
        self.short
    }

    fn is_bool(&self) -> bool {
        true
    }

    fn consume(&self, _input: &mut Input, data: &mut Data) -> Result<()> {
        data.set(&self.name, true);
        Ok(())
    }

    fn complete(&self, input: &mut Input, data: &mut Data) -> Result<Option<Completion>> {
        self.consume(input, data)?;
        Ok(None)
    }

    fn store_default(&self, data: &mut Data) {
        data.set(&self.name, false);
    }

    fn usage_details(&self) -> Vec<String> {
        if self.description.is_empty() {
            Vec::new()
        } else {
            vec![self.description.clone()]
        }
    }
}

enum Matched {
    Flag(usize),
    Group(Vec<usize>),
}

/// Processes every flag it owns, wherever it appears in the remaining input.
#[derive(Default)]
pub struct FlagProcessor {
    flags: Vec<Box<dyn AnyFlag>>,
}

impl FlagProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_flag(mut self, flag: impl AnyFlag + 'static) -> Self {
        self.flags.push(Box::new(flag));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    fn position(&self, accept: impl Fn(&dyn AnyFlag) -> bool) -> Option<usize> {
        self.flags.iter().position(|flag| accept(flag.as_ref()))
    }

    fn find(&self, token: &str) -> Option<Matched> {
        if let Some(name) = token.strip_prefix("--") {
            return self.position(|flag| flag.name() == name).map(Matched::Flag);
        }

        let shorts = token.strip_prefix('-')?;
        let mut chars = shorts.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => self.position(|flag| flag.short() == Some(c)).map(Matched::Flag),
            (Some(_), Some(_)) => shorts
                .chars()
                .map(|c| self.position(|flag| flag.is_bool() && flag.short() == Some(c)))
                .collect::<Option<Vec<_>>>()
                .map(Matched::Group),
            _ => None,
        }
    }

    fn unused_names(&self, given: &[bool]) -> Vec<String> {
        let mut names = Vec::new();
        for (flag, _) in self.flags.iter().zip(given).filter(|(_, given)| !**given) {
            names.push(format!("--{}", flag.name()));
            if let Some(short) = flag.short() {
                names.push(format!("-{short}"));
            }
        }
        names
    }

    fn finish(&self, input: &mut Input, data: &mut Data, given: &[bool]) {
        input.reset_offset();
        for (flag, _) in self.flags.iter().zip(given).filter(|(_, given)| !**given) {
            flag.store_default(data);
        }
    }
}

impl Processor for FlagProcessor {
    fn execute(
        &self,
        input: &mut Input,
        _output: &mut dyn Output,
        data: &mut Data,
        _exec: &mut ExecuteData,
    ) -> Result<()> {
        let mut given = vec![false; self.flags.len()];
        while let Some(token) = input.peek().map(ToString::to_string) {
            let indices = match self.find(&token) {
                None => {
                    input.skip();
                    continue;
                }
                Some(Matched::Flag(i)) => vec![i],
                Some(Matched::Group(indices)) => indices,
            };

            debug!("Processing flag token `{token}`");
            input.pop();
            for i in indices {
                self.flags[i].consume(input, data)?;
                given[i] = true;
            }
        }

        self.finish(input, data, &given);
        Ok(())
    }

    fn complete(&self, input: &mut Input, data: &mut Data) -> Result<Option<Completion>> {
        let mut given = vec![false; self.flags.len()];
        while let Some(token) = input.peek().map(ToString::to_string) {
            if input.peek_at(1).is_none() && token.starts_with('-') {
                input.reset_offset();
                return Ok(Some(Completion::suggest(self.unused_names(&given))));
            }

            match self.find(&token) {
                None => input.skip(),
                Some(Matched::Flag(i)) => {
                    input.pop();
                    given[i] = true;
                    if let Some(completion) = self.flags[i].complete(input, data)? {
                        input.reset_offset();
                        return Ok(Some(completion));
                    }
                }
                Some(Matched::Group(indices)) => {
                    input.pop();
                    for i in indices {
                        self.flags[i].consume(input, data)?;
                        given[i] = true;
                    }
                }
            }
        }

        self.finish(input, data, &given);
        Ok(None)
    }

    fn usage(&self, _input: &mut Input, _data: &mut Data, usage: &mut Usage) -> Result<()> {
        for flag in &self.flags {
            let (token, prefix) = match flag.short() {
                Some(short) => (format!("--{}|-{short}", flag.name()), format!("[{short}] ")),
                None => (format!("--{}", flag.name()), String::new()),
            };
            usage.add_flag(token);
            usage.add_section_entry(
                FLAGS_SECTION,
                &format!("{prefix:FLAG_PREFIX_WIDTH$}{}", flag.name()),
                flag.usage_details(),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::complete::{autocomplete, SimpleCompleter};
    use crate::error::Error;
    use crate::execute::execute_with;
    use crate::node::Node;
    use crate::output::BufferedOutput;
    use crate::serial_nodes;
    use crate::usage::get_usage;

    fn flags() -> FlagProcessor {
        FlagProcessor::new()
            .with_flag(BoolFlag::new("verbose", Some('v'), "Print more"))
            .with_flag(BoolFlag::new("quiet", Some('q'), ""))
            .with_flag(Flag::<i64>::new("count", Some('c'), "How many").with_default(1))
            .with_flag(
                Flag::<String>::new("color", None, "")
                    .with_completer(SimpleCompleter::new(["red", "green", "blue"])),
            )
    }

    fn graph() -> Rc<Node> {
        serial_nodes![flags(), Argument::<Vec<String>>::list("REST", "", 0, crate::input::UNBOUNDED)]
    }

    fn run(args: &[&str]) -> Result<Data> {
        let mut data = Data::new();
        let mut input = Input::parse_args(args);
        execute_with(&graph(), &mut input, &mut BufferedOutput::new(), &mut data)?;
        Ok(data)
    }

    #[test]
    fn test_flags_anywhere_positionals_untouched() {
        let data = run(&["a", "--count", "3", "b", "-v", "c"]).unwrap();
        assert_eq!(data.int("count"), 3);
        assert!(data.bool("verbose"));
        assert!(!data.bool("quiet"));
        assert_eq!(data.string_list("REST"), ["a", "b", "c"]);
    }

    #[test]
    fn test_defaults_for_unset_flags() {
        let data = run(&["x"]).unwrap();
        assert_eq!(data.int("count"), 1);
        assert!(!data.bool("verbose"));
        assert!(!data.has("color"));
    }

    #[test]
    fn test_grouped_short_flags() {
        let data = run(&["-vq", "x"]).unwrap();
        assert!(data.bool("verbose"));
        assert!(data.bool("quiet"));
        assert_eq!(data.string_list("REST"), ["x"]);
    }

    #[test]
    fn test_unknown_group_is_positional() {
        let data = run(&["-vz"]).unwrap();
        assert!(!data.bool("verbose"));
        assert_eq!(data.string_list("REST"), ["-vz"]);
    }

    #[test]
    fn test_flag_missing_value() {
        let err = run(&["--count"]).unwrap_err();
        assert!(matches!(err, Error::NotEnoughArgs { ref name, .. } if name == "count"));
    }

    #[test]
    fn test_complete_flag_names() {
        let suggestions = autocomplete(&graph(), "cmd -v --c", &[] as &[&str]).unwrap();
        assert_eq!(suggestions, vec!["--color", "--count"]);

        let suggestions = autocomplete(&graph(), "cmd --verbose -", &[] as &[&str]).unwrap();
        assert_eq!(
            suggestions,
            vec!["--color", "--count", "--quiet", "-c", "-q"]
        );
    }

    #[test]
    fn test_complete_flag_value() {
        let suggestions = autocomplete(&graph(), "cmd x --color g", &[] as &[&str]).unwrap();
        assert_eq!(suggestions, vec!["green"]);
    }

    #[test]
    fn test_complete_positional_after_flags() {
        let root = serial_nodes![
            flags(),
            Argument::<String>::new("FRUIT", "").with_completer(SimpleCompleter::new(["apple", "banana"])),
        ];
        let suggestions = autocomplete(&root, "cmd --color red -v b", &[] as &[&str]).unwrap();
        assert_eq!(suggestions, vec!["banana"]);
    }

    #[test]
    fn test_usage_flags_section() {
        let root = serial_nodes![flags()];
        let expected = [
            "--verbose|-v --quiet|-q --count|-c --color",
            "",
            "Flags:",
            "      color",
            "  [c] count  : How many",
            "               Default: 1",
            "  [q] quiet",
            "  [v] verbose: Print more",
        ]
        .join("\n");
        assert_eq!(get_usage(&root).unwrap().to_string(), expected);
    }
}
