//! The usage engine and help text rendering.
//!
//! A [`Usage`] is built by walking the usage successors of a graph. Branches
//! contribute one subsection each, drawn as a tree:
//!
//! ```text
//! Manage items
//! --verbose|-v <
//! │
//! ├── add ITEM
//! │   Adds an item
//! │
//! └── [remove|rm] ITEM
//!
//! Symbols:
//!   <: Start of subcommand branches
//! ```

use std::fmt::{Display, Formatter};
use std::rc::Rc;

use indexmap::IndexMap;
use itertools::Itertools;

use crate::data::Data;
use crate::error::Result;
use crate::input::Input;
use crate::node::Node;

pub const ARGUMENTS_SECTION: &str = "Arguments";
pub const FLAGS_SECTION: &str = "Flags";
pub const SYMBOLS_SECTION: &str = "Symbols";

/// Width of the `[s] ` short-flag prefix on "Flags" section keys.
pub const FLAG_PREFIX_WIDTH: usize = 4;

type Section = IndexMap<String, Vec<String>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Usage {
    description: Option<String>,
    usage: Vec<String>,
    flags: Vec<String>,
    subsections: Vec<Usage>,
    sections: IndexMap<String, Section>,
}

impl Usage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = Some(description.to_string());
    }

    pub fn tokens(&self) -> &[String] {
        &self.usage
    }

    pub fn add_token(&mut self, token: impl Into<String>) {
        self.usage.push(token.into());
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub fn add_flag(&mut self, token: impl Into<String>) {
        self.flags.push(token.into());
    }

    pub fn subsections(&self) -> &[Usage] {
        &self.subsections
    }

    pub fn add_subsection(&mut self, subsection: Usage) {
        self.subsections.push(subsection);
    }

    /// Appends `values` to `key` in the named section.
    pub fn add_section_entry<I, S>(&mut self, section: &str, key: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sections
            .entry(section.to_string())
            .or_default()
            .entry(key.to_string())
            .or_default()
            .extend(values.into_iter().map(Into::into));
    }

    pub fn section(&self, section: &str) -> Option<&IndexMap<String, Vec<String>>> {
        self.sections.get(section)
    }

    fn render_tree(&self, lines: &mut Vec<String>, first: &str, rest: &str, root: bool) {
        let tokens = self.usage.iter().chain(&self.flags).join(" ");
        let mut own = Vec::new();
        if !(root && tokens.is_empty()) {
            own.push(tokens);
        }
        if !root {
            if let Some(description) = &self.description {
                own.extend(description.lines().map(ToString::to_string));
            }
        }

        for (i, line) in own.iter().enumerate() {
            let prefix = if i == 0 { first } else { rest };
            lines.push(format!("{prefix}{line}").trim_end().to_string());
        }

        let count = self.subsections.len();
        for (i, subsection) in self.subsections.iter().enumerate() {
            lines.push(format!("{rest}│"));
            if i + 1 == count {
                subsection.render_tree(lines, &format!("{rest}└── "), &format!("{rest}    "), false);
            } else {
                subsection.render_tree(lines, &format!("{rest}├── "), &format!("{rest}│   "), false);
            }
        }
    }

    /// Sections of this usage and every subsection, first entry wins.
    fn merged_sections(&self) -> IndexMap<String, Section> {
        let mut merged = self.sections.clone();
        for subsection in &self.subsections {
            for (name, entries) in subsection.merged_sections() {
                let section = merged.entry(name).or_default();
                for (key, values) in entries {
                    section.entry(key).or_insert(values);
                }
            }
        }
        merged
    }
}

fn section_sort_key<'a>(section: &str, key: &'a str) -> &'a str {
    if section == FLAGS_SECTION {
        key.get(FLAG_PREFIX_WIDTH..).unwrap_or(key)
    } else {
        key
    }
}

fn render_section(lines: &mut Vec<String>, name: &str, entries: &Section) {
    lines.push(format!("{name}:"));
    let width = entries.keys().map(|key| key.chars().count()).max().unwrap_or(0);

    for (key, values) in entries
        .iter()
        .sorted_by(|(a, _), (b, _)| section_sort_key(name, a).cmp(section_sort_key(name, b)))
    {
        let mut values = values.iter();
        match values.next() {
            Some(first) => lines.push(format!("  {key:<width$}: {first}")),
            None => lines.push(format!("  {key}")),
        }
        for value in values {
            lines.push(format!("  {:width$}  {value}", ""));
        }
    }
}

impl Display for Usage {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        let mut lines = Vec::new();
        if let Some(description) = &self.description {
            lines.extend(description.lines().map(ToString::to_string));
        }
        self.render_tree(&mut lines, "", "", true);

        for (name, entries) in self
            .merged_sections()
            .iter()
            .sorted_by(|(a, _), (b, _)| a.cmp(b))
        {
            lines.push(String::new());
            render_section(&mut lines, name, entries);
        }

        formatter.write_str(&lines.join("\n"))
    }
}

/// Builds the usage of the whole graph rooted at `root`.
///
/// # Errors
///
/// Returns the first error produced by a processor's usage.
pub fn get_usage(root: &Rc<Node>) -> Result<Usage> {
    get_usage_for(root, &mut Input::default())
}

/// Builds the usage of the sub-graph selected by the branch tokens in `input`.
pub fn get_usage_for(root: &Rc<Node>, input: &mut Input) -> Result<Usage> {
    let mut usage = Usage::new();
    walk_usage(root, input, &mut Data::new(), &mut usage)?;
    Ok(usage)
}

/// Walks usage processors along usage successors from `root`.
pub(crate) fn walk_usage(
    root: &Rc<Node>,
    input: &mut Input,
    data: &mut Data,
    usage: &mut Usage,
) -> Result<()> {
    let mut node = Rc::clone(root);
    loop {
        node.processor.usage(input, data, usage)?;
        match node.usage_next(input, data)? {
            Some(next) => node = next,
            None => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_tokens_and_description() {
        let mut usage = Usage::new();
        usage.set_description("Greets people");
        usage.add_token("NAME");
        usage.add_flag("--loud|-l");

        assert_eq!(usage.to_string(), "Greets people\nNAME --loud|-l");
    }

    #[test]
    fn test_render_nested_subsections() {
        let mut inner_a = Usage::new();
        inner_a.add_token("x");
        let mut inner_b = Usage::new();
        inner_b.add_token("y");

        let mut middle = Usage::new();
        middle.add_token("a");
        middle.add_token("<");
        middle.set_description("Middle");
        middle.add_subsection(inner_a);
        middle.add_subsection(inner_b);

        let mut last = Usage::new();
        last.add_token("b");

        let mut root = Usage::new();
        root.add_token("<");
        root.add_subsection(middle);
        root.add_subsection(last);

        let expected = [
            "<",
            "│",
            "├── a <",
            "│   Middle",
            "│   │",
            "│   ├── x",
            "│   │",
            "│   └── y",
            "│",
            "└── b",
        ]
        .join("\n");
        assert_eq!(root.to_string(), expected);
    }

    #[test]
    fn test_sections_are_sorted_and_aligned() {
        let mut usage = Usage::new();
        usage.add_token("SARG");
        usage.add_section_entry(SYMBOLS_SECTION, "<", ["Start of subcommand branches"]);
        usage.add_section_entry(ARGUMENTS_SECTION, "SARG", ["A string", "MinLength(3)"]);
        usage.add_section_entry(ARGUMENTS_SECTION, "A", ["First"]);

        let expected = [
            "SARG",
            "",
            "Arguments:",
            "  A   : First",
            "  SARG: A string",
            "        MinLength(3)",
            "",
            "Symbols:",
            "  <: Start of subcommand branches",
        ]
        .join("\n");
        assert_eq!(usage.to_string(), expected);
    }

    #[test]
    fn test_flags_sorted_ignoring_short_prefix() {
        let mut usage = Usage::new();
        usage.add_section_entry(FLAGS_SECTION, "[z] alpha", ["first"]);
        usage.add_section_entry(FLAGS_SECTION, "    beta", ["second"]);
        usage.add_section_entry(FLAGS_SECTION, "[a] gamma", ["third"]);

        let rendered = usage.to_string();
        let alpha = rendered.find("alpha").unwrap();
        let beta = rendered.find("beta").unwrap();
        let gamma = rendered.find("gamma").unwrap();
        assert!(alpha < beta && beta < gamma);
    }

    #[test]
    fn test_subsection_sections_merge_into_root() {
        let mut child = Usage::new();
        child.add_token("c");
        child.add_section_entry(ARGUMENTS_SECTION, "ITEM", ["An item"]);

        let mut root = Usage::new();
        root.add_subsection(child);

        let rendered = root.to_string();
        assert!(rendered.ends_with("Arguments:\n  ITEM: An item"));
    }
}
