//! Typed positional arguments.

use std::fmt::{Debug, Formatter};

use log::debug;

use crate::complete::{Completer, Completion};
use crate::data::Data;
use crate::error::{Error, Result};
use crate::execute::ExecuteData;
use crate::input::{Input, ListBreaker, UNBOUNDED};
use crate::node::Processor;
use crate::output::Output;
use crate::usage::{Usage, ARGUMENTS_SECTION, SYMBOLS_SECTION};
use crate::validator::Validator;
use crate::value::Value;

/// Conversion between popped tokens and a [`Value`].
pub trait Operator: Clone + 'static {
    /// Human readable type name used in conversion errors.
    const KIND: &'static str;

    /// Converts the popped tokens, returning the offending token on failure.
    fn from_args(args: &[String]) -> std::result::Result<Self, String>;

    fn into_value(self) -> Value;

    fn from_value(value: &Value) -> Self;
}

fn first(args: &[String]) -> &str {
    args.first().map_or("", String::as_str)
}

fn parse_bool(arg: &str) -> std::result::Result<bool, String> {
    match arg {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(arg.to_string()),
    }
}

impl Operator for String {
    const KIND: &'static str = "string";

    fn from_args(args: &[String]) -> std::result::Result<Self, String> {
        Ok(first(args).to_string())
    }

    fn into_value(self) -> Value {
        Value::String(self)
    }

    fn from_value(value: &Value) -> Self {
        value.as_str().to_string()
    }
}

impl Operator for Vec<String> {
    const KIND: &'static str = "string list";

    fn from_args(args: &[String]) -> std::result::Result<Self, String> {
        Ok(args.to_vec())
    }

    fn into_value(self) -> Value {
        Value::StringList(self)
    }

    fn from_value(value: &Value) -> Self {
        value.as_string_list().to_vec()
    }
}

impl Operator for i64 {
    const KIND: &'static str = "int";

    fn from_args(args: &[String]) -> std::result::Result<Self, String> {
        let arg = first(args);
        arg.parse().map_err(|_| arg.to_string())
    }

    fn into_value(self) -> Value {
        Value::Int(self)
    }

    fn from_value(value: &Value) -> Self {
        value.as_int()
    }
}

impl Operator for Vec<i64> {
    const KIND: &'static str = "int list";

    fn from_args(args: &[String]) -> std::result::Result<Self, String> {
        args.iter()
            .map(|arg| arg.parse().map_err(|_| arg.clone()))
            .collect()
    }

    fn into_value(self) -> Value {
        Value::IntList(self)
    }

    fn from_value(value: &Value) -> Self {
        value.as_int_list().to_vec()
    }
}

impl Operator for f64 {
    const KIND: &'static str = "float";

    fn from_args(args: &[String]) -> std::result::Result<Self, String> {
        let arg = first(args);
        arg.parse().map_err(|_| arg.to_string())
    }

    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: &Value) -> Self {
        value.as_float()
    }
}

impl Operator for Vec<f64> {
    const KIND: &'static str = "float list";

    fn from_args(args: &[String]) -> std::result::Result<Self, String> {
        args.iter()
            .map(|arg| arg.parse().map_err(|_| arg.clone()))
            .collect()
    }

    fn into_value(self) -> Value {
        Value::FloatList(self)
    }

    fn from_value(value: &Value) -> Self {
        value.as_float_list().to_vec()
    }
}

impl Operator for bool {
    const KIND: &'static str = "bool";

    fn from_args(args: &[String]) -> std::result::Result<Self, String> {
        parse_bool(first(args))
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: &Value) -> Self {
        value.as_bool()
    }
}

type Transformer = Box<dyn Fn(&str) -> Result<String>>;

/// Pops tokens, converts them to `T`, validates, and stores the result in
/// [`Data`] under the argument's name.
pub struct Argument<T: Operator> {
    name: String,
    description: String,
    min: usize,
    optional: usize,
    default: Option<T>,
    validators: Vec<Validator<T>>,
    completer: Option<Box<dyn Completer>>,
    transformer: Option<Transformer>,
    breaker: Option<ListBreaker>,
}

impl<T: Operator> Argument<T> {
    fn with_counts(name: &str, description: &str, min: usize, optional: usize) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            min,
            optional,
            default: None,
            validators: Vec::new(),
            completer: None,
            transformer: None,
            breaker: None,
        }
    }

    /// A required single-token argument.
    pub fn new(name: &str, description: &str) -> Self {
        Self::with_counts(name, description, 1, 0)
    }

    /// A single-token argument that may be omitted.
    pub fn optional(name: &str, description: &str) -> Self {
        Self::with_counts(name, description, 0, 1)
    }

    /// `min` required tokens followed by up to `optional` more
    /// (`optional` may be [`UNBOUNDED`]).
    pub fn list(name: &str, description: &str, min: usize, optional: usize) -> Self {
        Self::with_counts(name, description, min, optional)
    }

    #[must_use]
    pub fn with_default(mut self, default: T) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub fn with_validator(mut self, validator: Validator<T>) -> Self {
        self.validators.push(validator);
        self
    }

    #[must_use]
    pub fn with_completer(mut self, completer: impl Completer + 'static) -> Self {
        self.completer = Some(Box::new(completer));
        self
    }

    /// Rewrites each popped token in place before conversion, so snapshots
    /// and recorded history see the transformed text.
    #[must_use]
    pub fn with_transformer(mut self, transformer: impl Fn(&str) -> Result<String> + 'static) -> Self {
        self.transformer = Some(Box::new(transformer));
        self
    }

    #[must_use]
    pub fn with_breaker(mut self, breaker: ListBreaker) -> Self {
        self.breaker = Some(breaker);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub(crate) fn pop(&self, input: &mut Input, transform: bool) -> Result<(Vec<String>, bool)> {
        let (cells, enough) = input.pop_n(self.min, self.optional, self.breaker.as_ref());
        let mut values = Vec::with_capacity(cells.len());
        for cell in cells {
            if transform {
                if let Some(transformer) = &self.transformer {
                    *cell = transformer(cell)?;
                }
            }
            values.push(cell.clone());
        }
        Ok((values, enough))
    }

    pub(crate) fn convert(&self, values: &[String]) -> Result<T> {
        T::from_args(values).map_err(|value| Error::Conversion {
            name: self.name.clone(),
            value,
            kind: T::KIND,
        })
    }

    /// Converts, validates and stores `values`.
    pub(crate) fn store(&self, values: &[String], data: &mut Data) -> Result<()> {
        let value = self.convert(values)?;
        for validator in &self.validators {
            validator.validate(&self.name, &value)?;
        }
        data.set(&self.name, value.into_value());
        Ok(())
    }

    /// Pops, transforms and stores the argument's tokens from the read
    /// position.
    pub(crate) fn consume(&self, input: &mut Input, data: &mut Data) -> Result<()> {
        let (values, enough) = self.pop(input, true)?;
        if !enough {
            return Err(Error::not_enough_args(&self.name, self.min, values.len()));
        }
        if values.is_empty() {
            self.store_default(data);
            return Ok(());
        }
        debug!("Argument `{}` got {:?}", self.name, values);
        self.store(&values, data)
    }

    pub(crate) fn store_default(&self, data: &mut Data) {
        if let Some(default) = &self.default {
            data.set(&self.name, default.clone().into_value());
        }
    }

    /// Runs the completer for the token being typed.
    pub(crate) fn complete_value(&self, values: &[String], data: &mut Data) -> Result<Option<Completion>> {
        if let Ok(partial) = self.convert(values) {
            data.set(&self.name, partial.into_value());
        }

        let Some(completer) = &self.completer else {
            return Ok(Some(Completion::default()));
        };
        let typed = values.last().map_or("", String::as_str);
        let mut completion = completer.complete(typed, data)?.unwrap_or_default();
        if completion.distinct {
            let given = &values[..values.len().saturating_sub(1)];
            completion.suggestions.retain(|suggestion| !given.contains(suggestion));
        }
        Ok(Some(completion))
    }

    pub(crate) fn usage_tokens(&self) -> Vec<String> {
        let mut tokens = vec![self.name.clone(); self.min];
        if self.optional == UNBOUNDED {
            tokens.push(format!("[ {} ... ]", self.name));
        } else if self.optional > 0 {
            tokens.push(format!("[ {} ]", vec![self.name.as_str(); self.optional].join(" ")));
        }
        if let Some(symbol) = self.breaker.as_ref().and_then(ListBreaker::symbol) {
            tokens.push(symbol.to_string());
        }
        tokens
    }

    /// Description, validators and default, in the order they are rendered.
    pub(crate) fn usage_details(&self) -> Vec<String> {
        let mut details = Vec::new();
        if !self.description.is_empty() {
            details.push(self.description.clone());
        }
        details.extend(self.validators.iter().map(|v| v.usage().to_string()));
        if let Some(default) = &self.default {
            details.push(format!("Default: {}", default.clone().into_value()));
        }
        details
    }
}

impl<T: Operator> Debug for Argument<T> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Argument")
            .field("name", &self.name)
            .field("kind", &T::KIND)
            .field("min", &self.min)
            .field("optional", &self.optional)
            .field("validators", &self.validators)
            .finish_non_exhaustive()
    }
}

impl<T: Operator> Processor for Argument<T> {
    fn execute(
        &self,
        input: &mut Input,
        _output: &mut dyn Output,
        data: &mut Data,
        _exec: &mut ExecuteData,
    ) -> Result<()> {
        self.consume(input, data)
    }

    fn complete(&self, input: &mut Input, data: &mut Data) -> Result<Option<Completion>> {
        let (values, enough) = self.pop(input, false)?;
        if enough && values.is_empty() {
            self.store_default(data);
            return Ok(None);
        }
        if !enough || input.fully_processed() {
            return self.complete_value(&values, data);
        }
        self.store(&values, data)?;
        Ok(None)
    }

    fn usage(&self, _input: &mut Input, _data: &mut Data, usage: &mut Usage) -> Result<()> {
        for token in self.usage_tokens() {
            usage.add_token(token);
        }
        let details = self.usage_details();
        if !details.is_empty() {
            usage.add_section_entry(ARGUMENTS_SECTION, &self.name, details);
        }
        if let Some(symbol) = self.breaker.as_ref().and_then(ListBreaker::symbol) {
            usage.add_section_entry(SYMBOLS_SECTION, symbol, [format!("End of {} list", self.name)]);
        }
        Ok(())
    }
}
