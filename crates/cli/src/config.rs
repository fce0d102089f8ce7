//! Configuration path utilities for cmdgraph.
//!
//! This module provides functions for resolving configuration file paths
//! and expanding shell variables like `~` in paths.

use std::env;

use cmdgraph_core::shell::DEFAULT_SHELL;

/// Default path for the command grammar file
const DEFAULT_CONFIG_PATH: &str = "~/.cmdgraph/commands.yml";
/// Default path for storing the last executed arguments
const DEFAULT_LAST_ARGS_PATH: &str = "~/.cmdgraph/last_args.yml";

/// Resolves the configuration file path.
///
/// If a custom path is provided, uses that path. Otherwise, uses the default
/// configuration path. Shell expansions like `~` are resolved.
///
/// # Examples
///
/// ```
/// use cmdgraph_cli::config::get_config_path;
///
/// // Use default path
/// let default_path = get_config_path(None);
///
/// // Use custom path
/// let custom_path = get_config_path(Some("/path/to/config.yml"));
/// assert_eq!(custom_path, "/path/to/config.yml");
/// ```
pub fn get_config_path(config_path_arg: Option<&str>) -> String {
    shellexpand::tilde(config_path_arg.unwrap_or(DEFAULT_CONFIG_PATH)).to_string()
}

/// Resolves the last arguments file path, falling back to the default.
pub fn get_last_args_path(last_args_path_arg: Option<&str>) -> String {
    shellexpand::tilde(last_args_path_arg.unwrap_or(DEFAULT_LAST_ARGS_PATH)).to_string()
}

/// Expands shell variables like `~` in a working directory path.
pub fn expand_working_directory(working_directory: Option<&str>) -> Option<String> {
    working_directory.map(|working_directory| shellexpand::tilde(working_directory).to_string())
}

/// The shell leaf commands are run with: `$SHELL`, or [`DEFAULT_SHELL`].
pub fn get_shell() -> String {
    env::var("SHELL").unwrap_or_else(|_| DEFAULT_SHELL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_config_path_with_custom_path() {
        let result = get_config_path(Some("/custom/path/config.yml"));
        assert_eq!(result, "/custom/path/config.yml");
    }

    #[test]
    fn test_get_config_path_with_none() {
        let result = get_config_path(None);
        // Should expand the tilde in the default path
        assert!(result.ends_with(".cmdgraph/commands.yml"));
        assert!(!result.starts_with('~'));
    }

    #[test]
    fn test_get_last_args_path_with_tilde() {
        let result = get_last_args_path(Some("~/my-args.yml"));
        assert!(!result.starts_with('~'));
        assert!(result.ends_with("my-args.yml"));
    }

    #[test]
    fn test_get_last_args_path_with_none() {
        let result = get_last_args_path(None);
        assert!(result.ends_with("last_args.yml"));
        assert!(!result.starts_with('~'));
    }

    #[test]
    fn test_expand_working_directory() {
        let expanded = expand_working_directory(Some("~/projects/cmdgraph")).unwrap();
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("projects/cmdgraph"));

        assert_eq!(
            expand_working_directory(Some("/absolute/path")).as_deref(),
            Some("/absolute/path")
        );
        assert!(expand_working_directory(None).is_none());
    }

    #[test]
    fn test_get_shell_is_not_empty() {
        assert!(!get_shell().is_empty());
    }
}
