//! The mutable, history-aware argument cursor shared by every engine.
//!
//! Tokens are stored once in `args` and never removed. Consuming a token only
//! drops its index from `remaining`, which keeps the physical order of `args`
//! identical to the logical order the grammar saw and lets snapshots be
//! reconstructed after arbitrary later consumption or insertion.

use std::collections::HashSet;
use std::fmt::{Debug, Formatter};

use log::debug;

use crate::error::{Error, Result};

/// Optional count that makes [`Input::pop_n`] collect every available token.
pub const UNBOUNDED: usize = usize::MAX;

/// Identifier returned by [`Input::snapshot`].
pub type SnapshotId = usize;

#[derive(Debug, Clone)]
struct InputArg {
    value: String,
    snapshots: HashSet<SnapshotId>,
}

impl InputArg {
    fn new(value: String) -> Self {
        Self {
            value,
            snapshots: HashSet::new(),
        }
    }
}

/// Stops list collection in [`Input::pop_n`] when the next token matches.
pub struct ListBreaker {
    predicate: Box<dyn Fn(&str) -> bool>,
    discard: bool,
    symbol: Option<String>,
}

impl ListBreaker {
    pub fn new(predicate: impl Fn(&str) -> bool + 'static) -> Self {
        Self {
            predicate: Box::new(predicate),
            discard: false,
            symbol: None,
        }
    }

    /// Breaks on (and discards) a literal delimiter token such as `;`.
    pub fn until_symbol(symbol: &str) -> Self {
        let delimiter = symbol.to_string();
        Self {
            predicate: Box::new(move |value| value == delimiter),
            discard: true,
            symbol: Some(symbol.to_string()),
        }
    }

    /// Also pops the matching token, without handing it to the caller.
    #[must_use]
    pub fn discard(mut self) -> Self {
        self.discard = true;
        self
    }

    pub fn breaks(&self, value: &str) -> bool {
        (self.predicate)(value)
    }

    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }
}

impl Debug for ListBreaker {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ListBreaker")
            .field("discard", &self.discard)
            .field("symbol", &self.symbol)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Input {
    args: Vec<InputArg>,
    remaining: Vec<usize>,
    delimiter: Option<char>,
    offset: usize,
    snapshot_count: usize,
}

impl Input {
    fn from_tokens(tokens: Vec<String>, delimiter: Option<char>) -> Self {
        Self {
            remaining: (0..tokens.len()).collect(),
            args: tokens.into_iter().map(InputArg::new).collect(),
            delimiter,
            offset: 0,
            snapshot_count: 0,
        }
    }

    /// Builds a cursor from an argument vector (without the program name).
    pub fn parse_args<S: AsRef<str>>(args: &[S]) -> Self {
        Self::from_tokens(
            args.iter().map(|arg| arg.as_ref().to_string()).collect(),
            None,
        )
    }

    /// Builds a cursor from a shell completion line.
    ///
    /// The first word (the invoked command) is dropped and `passthrough`
    /// tokens are placed in front of the rest.
    pub fn parse_comp_line<S: AsRef<str>>(line: &str, passthrough: &[S]) -> Self {
        let (words, delimiter) = split_comp_line(line);
        let tokens = passthrough
            .iter()
            .map(|arg| arg.as_ref().to_string())
            .chain(words.into_iter().skip(1))
            .collect();
        Self::from_tokens(tokens, delimiter)
    }

    /// The quote character left open at the end of a completion line.
    pub fn delimiter(&self) -> Option<char> {
        self.delimiter
    }

    pub fn num_remaining(&self) -> usize {
        self.remaining.len().saturating_sub(self.offset)
    }

    pub fn fully_processed(&self) -> bool {
        self.offset >= self.remaining.len()
    }

    pub fn remaining(&self) -> Vec<String> {
        self.remaining
            .iter()
            .map(|&idx| self.args[idx].value.clone())
            .collect()
    }

    /// Value of the most recently typed token, which is the one being
    /// completed during autocomplete.
    pub fn last_value(&self) -> Option<&str> {
        self.args.last().map(|arg| arg.value.as_str())
    }

    pub fn peek(&self) -> Option<&str> {
        self.peek_at(0)
    }

    pub fn peek_at(&self, n: usize) -> Option<&str> {
        self.remaining
            .get(self.offset + n)
            .map(|&idx| self.args[idx].value.as_str())
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Moves the soft read cursor past the next token without consuming it.
    pub fn skip(&mut self) {
        if self.offset < self.remaining.len() {
            self.offset += 1;
        }
    }

    pub fn reset_offset(&mut self) {
        self.offset = 0;
    }

    pub fn pop(&mut self) -> Option<String> {
        if self.fully_processed() {
            return None;
        }
        let idx = self.remaining.remove(self.offset);
        Some(self.args[idx].value.clone())
    }

    /// Pops `n` required tokens and up to `optional` more.
    ///
    /// Returns the popped cells, which callers may rewrite in place, and
    /// whether at least `n` tokens were available. `optional` may be
    /// [`UNBOUNDED`]. Collection stops early when `breaker` matches the next
    /// token; the matching token is also consumed when the breaker discards.
    pub fn pop_n(
        &mut self,
        n: usize,
        optional: usize,
        breaker: Option<&ListBreaker>,
    ) -> (Vec<&mut String>, bool) {
        let wanted = n.saturating_add(optional);
        let mut take = 0;
        let mut broke = false;
        while take < wanted {
            let Some(&idx) = self.remaining.get(self.offset + take) else {
                break;
            };
            if let Some(breaker) = breaker {
                if breaker.breaks(&self.args[idx].value) {
                    broke = breaker.discard;
                    break;
                }
            }
            take += 1;
        }

        let popped: Vec<usize> = self
            .remaining
            .drain(self.offset..self.offset + take)
            .collect();
        if broke {
            self.remaining.remove(self.offset);
        }

        let enough = popped.len() >= n;
        let mut cells: Vec<Option<&mut InputArg>> = self.args.iter_mut().map(Some).collect();
        let values = popped
            .iter()
            .filter_map(|&idx| cells[idx].take())
            .map(|arg| &mut arg.value)
            .collect();
        (values, enough)
    }

    /// Splices `values` in at the read position, as if they had been typed
    /// there originally.
    pub fn push_front<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<InputArg> = values
            .into_iter()
            .map(|value| InputArg::new(value.into()))
            .collect();
        if values.is_empty() {
            return;
        }

        let count = values.len();
        let position = self
            .remaining
            .get(self.offset)
            .copied()
            .unwrap_or(self.args.len());
        debug!("Pushing {count} token(s) to the front of the input at {position}");

        for idx in &mut self.remaining {
            if *idx >= position {
                *idx += count;
            }
        }
        self.args.splice(position..position, values);
        self.remaining
            .splice(self.offset..self.offset, position..position + count);
    }

    /// Records the current remaining tokens under a fresh snapshot ID.
    pub fn snapshot(&mut self) -> SnapshotId {
        let id = self.snapshot_count;
        self.snapshot_count += 1;
        for &idx in &self.remaining {
            self.args[idx].snapshots.insert(id);
        }
        id
    }

    /// The ordered token values that were remaining when `id` was taken.
    pub fn get_snapshot(&self, id: SnapshotId) -> Vec<String> {
        self.args
            .iter()
            .filter(|arg| arg.snapshots.contains(&id))
            .map(|arg| arg.value.clone())
            .collect()
    }

    /// The tokens of snapshot `id` that have been consumed since it was
    /// taken, in input order.
    pub fn consumed_since(&self, id: SnapshotId) -> Vec<String> {
        let remaining: HashSet<usize> = self.remaining.iter().copied().collect();
        self.args
            .iter()
            .enumerate()
            .filter(|(idx, arg)| arg.snapshots.contains(&id) && !remaining.contains(idx))
            .map(|(_, arg)| arg.value.clone())
            .collect()
    }

    /// Fails if any token at or after the read position was left unconsumed.
    pub fn check_for_extra_args_error(&self) -> Result<()> {
        if self.fully_processed() {
            return Ok(());
        }
        Err(Error::ExtraArgs(
            self.remaining[self.offset..]
                .iter()
                .map(|&idx| self.args[idx].value.clone())
                .collect(),
        ))
    }
}

/// Splits a completion line shell-style.
///
/// Honors single and double quotes and backslash escapes. A quote left open
/// at the end of the line is reported so suggestions can be returned raw. A
/// line ending in whitespace yields an empty trailing word, which is the word
/// the shell is asking to complete.
fn split_comp_line(line: &str) -> (Vec<String>, Option<char>) {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if let Some(open) = quote {
            if c == open {
                quote = None;
            } else if c == '\\' && open == '"' && matches!(chars.peek(), Some('"' | '\\')) {
                current.extend(chars.next());
            } else {
                current.push(c);
            }
            continue;
        }

        match c {
            ' ' | '\t' | '\n' => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\'' | '"' => {
                quote = Some(c);
                in_word = true;
            }
            '\\' => {
                in_word = true;
                current.extend(chars.next());
            }
            _ => {
                in_word = true;
                current.push(c);
            }
        }
    }

    if in_word {
        words.push(current);
    } else if line.ends_with([' ', '\t', '\n']) {
        words.push(String::new());
    }

    (words, quote)
}
