//! Error types for templates, the prompt store and configuration.

use std::io;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Missing value for variable '{name}'")]
    MissingBinding { name: String },

    #[error("Expected {expected} variable values, got {actual}")]
    BindingCountMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid data in {file}: {source}")]
    InvalidData {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unrecognized import file: {0}")]
    UnrecognizedImport(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Name is empty after removing disallowed characters")]
    EmptyName,

    #[error("Name '{0}' already exists at this level")]
    DuplicateName(String),

    #[error("Using a dot at the end of a name is not permitted: '{0}'")]
    TrailingDot(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("HOME is not set")]
    NoHome,
}

/// Everything a CLI subcommand or the chat session can fail with.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to access {path}: {source}")]
    File {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Terminal error: {0}")]
    Terminal(#[from] io::Error),

    #[error("Failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}
