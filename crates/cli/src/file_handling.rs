//! File handling and validation for cmdgraph configuration.
//!
//! This module reads the YAML command grammar (validating IDs, argument
//! declarations and command templates) and persists the arguments of the
//! last successful run.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use cmdgraph_core::argument::Operator;
use leon::Template;
use log::{debug, info};

use crate::command_definitions::{ArgumentType, CommandDefinition, GrammarDefinition, LastArgs};
use crate::error::Error::{
    EmptyId, IdWithColon, IdWithSpace, NonUniqueArgumentName, NonUniqueCommandId, NumericId,
    RequiredAfterOptional, UndeclaredTemplateKey,
};
use crate::error::{Error, Result};

fn get_reader(file_description: &str, path: &str) -> Result<File> {
    File::open(path)
        .map_err(|e| Error::io_error(file_description.to_string(), path.to_string(), e))
}

/// Reads the arguments of the last successful run.
///
/// Returns `None` if the file doesn't exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn get_last_args(last_args_path: &str) -> Result<Option<LastArgs>> {
    if !Path::new(last_args_path).exists() {
        return Ok(None);
    }

    let reader = get_reader("last args", last_args_path)?;
    serde_yaml::from_reader(reader).map(Some).map_err(|e| {
        Error::yaml_error(
            "reading".to_string(),
            "last args".to_string(),
            last_args_path.to_string(),
            e,
        )
    })
}

/// Writes the arguments of the last successful run.
///
/// # Errors
///
/// Returns an error if the file cannot be created or serialization fails.
pub fn write_last_args(path: &str, last_args: &LastArgs) -> Result<()> {
    let f = File::create(path)
        .map_err(|e| Error::io_error("last args".to_string(), path.to_string(), e))?;

    info!("Saving last args to `{path}`");
    serde_yaml::to_writer(f, last_args).map_err(|e| {
        Error::yaml_error(
            "writing".to_string(),
            "last args".to_string(),
            path.to_string(),
            e,
        )
    })
}

fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(EmptyId);
    }

    if id.contains(' ') {
        return Err(IdWithSpace(id.to_string()));
    }

    if id.contains(':') {
        return Err(IdWithColon(id.to_string()));
    }

    if id.chars().all(|c| c.is_numeric()) {
        return Err(NumericId(id.to_string()));
    }

    Ok(())
}

fn validate_default(
    command: &CommandDefinition,
    name: &str,
    kind: ArgumentType,
    is_list: bool,
    default: &str,
) -> Result<()> {
    let args: Vec<String> = if is_list {
        default.split_whitespace().map(ToString::to_string).collect()
    } else {
        vec![default.to_string()]
    };
    let valid = match (kind, is_list) {
        (ArgumentType::String, _) => true,
        (ArgumentType::Int, false) => i64::from_args(&args).is_ok(),
        (ArgumentType::Int, true) => Vec::<i64>::from_args(&args).is_ok(),
        (ArgumentType::Float, false) => f64::from_args(&args).is_ok(),
        (ArgumentType::Float, true) => Vec::<f64>::from_args(&args).is_ok(),
        (ArgumentType::Bool, _) => bool::from_args(&args).is_ok(),
    };

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidDefault {
            command: command.id.clone(),
            name: name.to_string(),
            default: default.to_string(),
        })
    }
}

/// Validates argument and flag declarations, returning the declared names.
fn validate_arguments(command: &CommandDefinition) -> Result<HashSet<String>> {
    let mut names = HashSet::new();
    let mut seen_optional = false;

    for argument in &command.arguments {
        validate_id(&argument.name)?;
        if !names.insert(argument.name.clone()) {
            return Err(NonUniqueArgumentName(command.id.clone(), argument.name.clone()));
        }

        if argument.kind == ArgumentType::Bool && argument.is_list() {
            return Err(Error::BoolList(command.id.clone(), argument.name.clone()));
        }

        if argument.is_optional() {
            seen_optional = true;
        } else if seen_optional {
            return Err(RequiredAfterOptional(command.id.clone(), argument.name.clone()));
        }

        if let Some(default) = &argument.default {
            validate_default(
                command,
                &argument.name,
                argument.kind,
                argument.is_list(),
                default,
            )?;
        }
    }

    for flag in &command.flags {
        validate_id(&flag.name)?;
        if !names.insert(flag.name.clone()) {
            return Err(NonUniqueArgumentName(command.id.clone(), flag.name.clone()));
        }

        if let Some(default) = &flag.default {
            validate_default(command, &flag.name, flag.kind, false, default)?;
        }
    }

    Ok(names)
}

fn validate_templates(command: &CommandDefinition, names: &HashSet<String>) -> Result<()> {
    let Some(words) = &command.command else {
        return Ok(());
    };

    for word in words {
        let template = Template::parse(word).map_err(|original| Error::Template {
            command: command.id.clone(),
            original,
        })?;
        let undeclared = template
            .keys()
            .map(ToString::to_string)
            .find(|key| !names.contains(key));
        if let Some(key) = undeclared {
            return Err(UndeclaredTemplateKey(command.id.clone(), key));
        }
    }

    Ok(())
}

fn validate_commands(commands: &[CommandDefinition]) -> Result<()> {
    let mut ids = HashSet::new();

    for command in commands {
        for id in std::iter::once(&command.id).chain(&command.synonyms) {
            validate_id(id)?;

            if !ids.insert(id.clone()) {
                // Found a duplicate ID
                return Err(NonUniqueCommandId(id.clone()));
            }
        }

        let names = validate_arguments(command)?;
        validate_templates(command, &names)?;
        validate_commands(&command.commands)?;
    }

    Ok(())
}

/// Parses and validates a grammar from YAML text. `path` is only used in
/// error messages.
///
/// # Errors
///
/// Returns an error when the YAML is malformed, declares no commands, or
/// fails validation.
pub fn parse_grammar(yaml: &str, path: &str) -> Result<GrammarDefinition> {
    let grammar: GrammarDefinition = serde_yaml::from_str(yaml).map_err(|e| {
        Error::yaml_error(
            "reading".to_string(),
            "config".to_string(),
            path.to_string(),
            e,
        )
    })?;

    if grammar.commands.is_empty() {
        return Err(Error::empty_command_definition(path.to_string()));
    }

    validate_commands(&grammar.commands)?;

    debug!("Loaded {} top level command(s) from `{path}`", grammar.commands.len());
    Ok(grammar)
}

/// Loads and validates the command grammar from a configuration file.
///
/// # Errors
///
/// Returns an error if:
/// - The configuration file cannot be read
/// - The YAML is malformed or doesn't match the expected structure
/// - The configuration file declares no commands
/// - Command IDs, argument names or defaults are invalid or non-unique
/// - Command templates reference undeclared arguments
///
/// # Examples
///
/// ```no_run
/// use cmdgraph_cli::file_handling::get_command_definitions;
///
/// let grammar = get_command_definitions("/home/me/.cmdgraph/commands.yml")?;
/// println!("Loaded {} commands", grammar.commands.len());
/// # Ok::<(), cmdgraph_cli::error::Error>(())
/// ```
pub fn get_command_definitions(config_path: &str) -> Result<GrammarDefinition> {
    let yaml = std::fs::read_to_string(config_path)
        .map_err(|e| Error::io_error("config".to_string(), config_path.to_string(), e))?;
    parse_grammar(&yaml, config_path)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn parse(yaml: &str) -> Result<GrammarDefinition> {
        parse_grammar(yaml, "test.yml")
    }

    #[test]
    fn test_validate_id_valid() {
        assert!(validate_id("valid_id").is_ok());
        assert!(validate_id("test123").is_ok());
        assert!(validate_id("my-command").is_ok());
        assert!(validate_id("_underscore").is_ok());
    }

    #[test]
    fn test_validate_id_invalid() {
        assert!(matches!(validate_id(""), Err(EmptyId)));
        assert!(matches!(validate_id("has space"), Err(IdWithSpace(_))));
        assert!(matches!(validate_id("has:colon"), Err(IdWithColon(_))));
        assert!(matches!(validate_id("123"), Err(NumericId(_))));
    }

    #[test]
    fn test_duplicate_sibling_ids() {
        let result = parse(
            r"
commands:
  - id: build
  - id: test
    synonyms: [build]
",
        );
        assert!(matches!(result, Err(NonUniqueCommandId(ref id)) if id == "build"));
    }

    #[test]
    fn test_same_id_in_different_branches() {
        let result = parse(
            r"
commands:
  - id: a
    commands:
      - id: run
  - id: b
    commands:
      - id: run
",
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_duplicate_argument_and_flag_name() {
        let result = parse(
            r"
commands:
  - id: greet
    arguments:
      - name: loud
    flags:
      - name: loud
        type: bool
",
        );
        assert!(matches!(result, Err(NonUniqueArgumentName(_, ref name)) if name == "loud"));
    }

    #[test]
    fn test_required_after_optional() {
        let result = parse(
            r"
commands:
  - id: copy
    arguments:
      - name: SRC
        optional: true
      - name: DST
",
        );
        assert!(matches!(result, Err(RequiredAfterOptional(_, ref name)) if name == "DST"));
    }

    #[test]
    fn test_bool_list_rejected() {
        let result = parse(
            r"
commands:
  - id: toggle
    arguments:
      - name: STATES
        type: bool
        unbounded: true
",
        );
        assert!(matches!(result, Err(Error::BoolList(_, ref name)) if name == "STATES"));
    }

    #[test]
    fn test_invalid_default() {
        let result = parse(
            r"
commands:
  - id: repeat
    flags:
      - name: times
        type: int
        default: many
",
        );
        assert!(matches!(result, Err(Error::InvalidDefault { ref default, .. }) if default == "many"));
    }

    #[test]
    fn test_list_defaults_are_split() {
        let grammar = parse(
            r#"
commands:
  - id: sum
    arguments:
      - name: NUMS
        type: int
        unbounded: true
        default: "1 2"
      - name: WEIGHTS
        type: float
        optional_count: 2
        default: "0.5 1.5"
    command: ["sum", "{NUMS}", "{WEIGHTS}"]
"#,
        );
        assert!(grammar.is_ok());

        let result = parse(
            r#"
commands:
  - id: sum
    arguments:
      - name: NUMS
        type: int
        unbounded: true
        default: "1 two"
"#,
        );
        assert!(matches!(result, Err(Error::InvalidDefault { ref default, .. }) if default == "1 two"));
    }

    #[test]
    fn test_template_keys_of_every_word_are_checked() {
        let result = parse(
            r#"
commands:
  - id: copy
    arguments:
      - name: SRC
    command: ["cp", "{SRC}", "{DST}"]
"#,
        );
        assert!(matches!(result, Err(UndeclaredTemplateKey(_, ref key)) if key == "DST"));
    }

    #[test]
    fn test_undeclared_template_key() {
        let result = parse(
            r#"
commands:
  - id: greet
    command: ["echo", "Hello {name}"]
"#,
        );
        assert!(matches!(result, Err(UndeclaredTemplateKey(_, ref key)) if key == "name"));
    }

    #[test]
    fn test_malformed_template() {
        let result = parse(
            r#"
commands:
  - id: greet
    command: ["echo {"]
"#,
        );
        assert!(matches!(result, Err(Error::Template { ref command, .. }) if command == "greet"));
    }

    #[test]
    fn test_empty_grammar() {
        assert!(matches!(
            parse("commands: []"),
            Err(Error::EmptyCommandDefinition { .. })
        ));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            parse("invalid: yaml: content: ["),
            Err(Error::Yaml { .. })
        ));
    }

    #[test]
    fn test_get_command_definitions_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(
            temp_file,
            r#"
commands:
  - id: greet
    arguments:
      - name: NAME
    command: ["echo", "Hello {{NAME}}"]
"#
        )
        .unwrap();

        let grammar = get_command_definitions(temp_file.path().to_str().unwrap()).unwrap();
        assert_eq!(grammar.commands.len(), 1);
        assert_eq!(grammar.commands[0].id, "greet");
    }

    #[test]
    fn test_get_command_definitions_file_not_found() {
        let result = get_command_definitions("/this/path/does/not/exist.yml");
        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[test]
    fn test_write_and_read_last_args() {
        let temp_file = NamedTempFile::new().unwrap();
        let temp_path = temp_file.path().to_str().unwrap();

        let last_args = LastArgs {
            args: vec!["greet".to_string(), "two words".to_string()],
        };
        write_last_args(temp_path, &last_args).unwrap();

        assert_eq!(get_last_args(temp_path).unwrap(), Some(last_args));
    }

    #[test]
    fn test_get_last_args_file_not_exists() {
        assert!(get_last_args("/this/path/does/not/exist.yml").unwrap().is_none());
    }
}
