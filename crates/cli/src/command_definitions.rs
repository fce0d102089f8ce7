//! The YAML command grammar.
//!
//! ```yaml
//! description: Everyday shortcuts
//! commands:
//!   - id: greet
//!     synonyms: [hi]
//!     description: Greet someone
//!     arguments:
//!       - name: NAME
//!         default: World
//!         optional: true
//!     flags:
//!       - name: loud
//!         short: l
//!         type: bool
//!     command: ["echo", "Hello {NAME}"]
//! ```

use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Value kinds an argument or flag may declare.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentType {
    #[default]
    String,
    Int,
    Float,
    Bool,
}

impl Display for ArgumentType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
        })
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ArgumentDefinition {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: ArgumentType,
    pub description: Option<String>,
    /// A single argument that may be omitted.
    #[serde(default)]
    pub optional: bool,
    /// Makes this a list argument with at least `min` values.
    pub min: Option<usize>,
    /// Additional values a list argument accepts.
    pub optional_count: Option<usize>,
    /// A list argument taking every remaining value.
    #[serde(default)]
    pub unbounded: bool,
    pub choices: Option<Vec<String>>,
    pub default: Option<String>,
}

impl ArgumentDefinition {
    pub fn is_list(&self) -> bool {
        self.min.is_some() || self.optional_count.is_some() || self.unbounded
    }

    /// Whether the argument can be satisfied by no tokens at all.
    pub fn is_optional(&self) -> bool {
        if self.is_list() {
            self.min.unwrap_or(0) == 0
        } else {
            self.optional
        }
    }
}

impl Display for ArgumentDefinition {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "`{}`", self.name)?;
        if let Some(description) = &self.description {
            write!(formatter, " ({description})")?;
        }
        Ok(())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FlagDefinition {
    pub name: String,
    pub short: Option<char>,
    #[serde(default, rename = "type")]
    pub kind: ArgumentType,
    pub description: Option<String>,
    pub choices: Option<Vec<String>>,
    pub default: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CommandDefinition {
    pub id: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub arguments: Vec<ArgumentDefinition>,
    #[serde(default)]
    pub flags: Vec<FlagDefinition>,
    /// Templates for each word of the shell command, joined with spaces.
    pub command: Option<Vec<String>>,
    pub working_directory: Option<String>,
    pub environment: Option<IndexMap<String, String>>,
    #[serde(default)]
    pub commands: Vec<CommandDefinition>,
}

impl Display for CommandDefinition {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.description {
            Some(description) => write!(formatter, "{} ({description})", self.id),
            None => formatter.write_str(&self.id),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GrammarDefinition {
    pub description: Option<String>,
    pub commands: Vec<CommandDefinition>,
}

/// The arguments of the last successful run, replayed by `rerun`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct LastArgs {
    pub args: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_grammar() {
        let yaml = r#"
description: Tools
commands:
  - id: git
    commands:
      - id: checkout
        synonyms: [co]
        arguments:
          - name: BRANCH
            choices: [main, dev]
        flags:
          - name: force
            short: f
            type: bool
        command: ["git", "checkout", "{BRANCH}"]
"#;
        let grammar: GrammarDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(grammar.description.as_deref(), Some("Tools"));

        let checkout = &grammar.commands[0].commands[0];
        assert_eq!(checkout.synonyms, ["co"]);
        assert_eq!(checkout.arguments[0].kind, ArgumentType::String);
        assert_eq!(checkout.flags[0].kind, ArgumentType::Bool);
        assert_eq!(checkout.flags[0].short, Some('f'));
        assert!(grammar.commands[0].command.is_none());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "commands:\n  - id: x\n    paramters: []\n";
        assert!(serde_yaml::from_str::<GrammarDefinition>(yaml).is_err());
    }

    #[test]
    fn test_argument_shapes() {
        let single = ArgumentDefinition {
            name: "A".to_string(),
            ..ArgumentDefinition::default()
        };
        assert!(!single.is_list());
        assert!(!single.is_optional());

        let list = ArgumentDefinition {
            name: "B".to_string(),
            unbounded: true,
            ..ArgumentDefinition::default()
        };
        assert!(list.is_list());
        assert!(list.is_optional());
    }

    #[test]
    fn test_display() {
        let command = CommandDefinition {
            id: "greet".to_string(),
            description: Some("Say hello".to_string()),
            ..CommandDefinition::default()
        };
        assert_eq!(command.to_string(), "greet (Say hello)");
    }
}
