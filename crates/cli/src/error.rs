use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Graph(#[from] cmdgraph_core::Error),

    #[error("Error {} {} file at `{}`: {}", .action, .file_description, .path, .original)]
    Yaml {
        action: String,
        file_description: String,
        path: String,
        original: serde_yaml::Error,
    },

    #[error("IO error with {} file at path `{}`: {}", .file_description, .path, .original)]
    Io {
        file_description: String,
        path: String,
        original: std::io::Error,
    },

    #[error("No commands were found in the command definition YAML. Is `{}` empty?", .path)]
    EmptyCommandDefinition { path: String },

    #[error("Found a non-unique command ID: `{}`", .0)]
    NonUniqueCommandId(String),

    #[error("Found a non-unique argument or flag name on command `{}`: `{}`", .0, .1)]
    NonUniqueArgumentName(String, String),

    #[error("Invalid command template on command `{}`: {}", .command, .original)]
    Template {
        command: String,
        original: leon::ParseError,
    },

    #[error("Command `{}` uses `{{{}}}`, which is not a declared argument or flag", .0, .1)]
    UndeclaredTemplateKey(String, String),

    #[error("Invalid default `{}` for `{}` on command `{}`", .default, .name, .command)]
    InvalidDefault {
        command: String,
        name: String,
        default: String,
    },

    #[error("Argument `{}` on command `{}` cannot be a list of bools", .1, .0)]
    BoolList(String, String),

    #[error("Required argument `{}` on command `{}` follows an optional one", .1, .0)]
    RequiredAfterOptional(String, String),

    #[error("Invalid ID: ID may not be empty")]
    EmptyId,

    #[error("Invalid ID `{}`: ID may not contain spaces", .0)]
    IdWithSpace(String),

    #[error("Invalid ID `{}`: ID may not contain a colon (reserved for future use)", .0)]
    IdWithColon(String),

    #[error("Invalid ID `{}`: ID cannot be purely numeric", .0)]
    NumericId(String),
}

impl Error {
    pub fn empty_command_definition(path: String) -> Self {
        Self::EmptyCommandDefinition { path }
    }

    pub fn yaml_error(
        action: String,
        file_description: String,
        path: String,
        original: serde_yaml::Error,
    ) -> Self {
        Self::Yaml {
            action,
            file_description,
            path,
            original,
        }
    }

    pub fn io_error(file_description: String, path: String, original: std::io::Error) -> Self {
        Self::Io {
            file_description,
            path,
            original,
        }
    }

    /// The engine error behind this one, if any.
    pub fn graph_error(&self) -> Option<&cmdgraph_core::Error> {
        match self {
            Self::Graph(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_error_is_transparent() {
        let err = Error::from(cmdgraph_core::Error::ExtraArgs(vec!["x".to_string()]));
        assert_eq!(err.to_string(), "Unprocessed extra args: [x]");
        assert!(err.graph_error().is_some_and(cmdgraph_core::Error::is_usage_error));
    }

    #[test]
    fn test_undeclared_template_key_message() {
        let err = Error::UndeclaredTemplateKey("greet".to_string(), "name".to_string());
        assert_eq!(
            err.to_string(),
            "Command `greet` uses `{name}`, which is not a declared argument or flag"
        );
    }
}
