//! Command-line interface.
//!
//! `promptdesk` with no subcommand (or `chat`) opens the terminal chat. The
//! other subcommands expose the naming, templating and library operations
//! directly and print their results to stdout.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use crate::config::{AppConfig, load_config};
use crate::error::{CliError, StoreError};
use crate::naming::{PrepareNameOptions, prepare_entity_name};
use crate::store::{PromptStore, parse_import};
use crate::variables::{Bindings, substitute, unique_variables};

/// Prompt library and chat input for the terminal.
#[derive(Debug, Parser)]
#[command(name = "promptdesk", author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Open the interactive chat (default).
    Chat,

    /// Clean a prompt or folder name the way the library stores it.
    Sanitize {
        name: String,

        /// Apply renaming rules: drop disallowed characters instead of
        /// keeping only the first line.
        #[arg(long)]
        renaming: bool,

        /// With --renaming, replace disallowed characters by spaces.
        #[arg(long)]
        spaces: bool,

        /// With --renaming, still strip trailing dots.
        #[arg(long)]
        trim_dots: bool,
    },

    /// List the distinct `{{variables}}` of a template.
    Vars { template: String },

    /// Fill a template, given inline or by stored prompt id.
    Render {
        #[arg(required_unless_present = "prompt", conflicts_with = "prompt")]
        template: Option<String>,

        /// Id of a stored prompt whose content is the template.
        #[arg(long)]
        prompt: Option<String>,

        /// Binding as NAME=VALUE; repeatable.
        #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_binding)]
        vars: Vec<(String, String)>,
    },

    /// Print every stored folder and prompt.
    List,

    /// Store a new prompt.
    Add {
        name: String,

        #[arg(long)]
        content: String,

        #[arg(long)]
        description: Option<String>,

        /// Parent folder id.
        #[arg(long)]
        folder: Option<String>,
    },

    /// Store a new prompt folder.
    AddFolder {
        name: String,

        /// Parent folder id.
        #[arg(long)]
        parent: Option<String>,
    },

    /// Rename a prompt or folder.
    Rename { id: String, name: String },

    /// Delete a prompt, or a folder with everything nested in it.
    Delete { id: String },

    /// Delete every stored prompt and folder.
    DeleteAll,

    /// Merge an export file into the library.
    Import { file: PathBuf },

    /// Write the library, or one entity with its folders, to a file.
    Export {
        file: PathBuf,

        /// Export only this prompt or folder.
        #[arg(long)]
        id: Option<String>,
    },
}

fn parse_binding(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    if name.is_empty() {
        return Err(format!("variable name is empty in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Runs a non-interactive subcommand, writing its result to `out`.
pub fn run_command(command: Commands, out: &mut impl Write) -> Result<(), CliError> {
    match command {
        Commands::Chat => Ok(()),
        Commands::Sanitize {
            name,
            renaming,
            spaces,
            trim_dots,
        } => {
            let options = PrepareNameOptions {
                for_renaming: renaming,
                replace_with_spaces: spaces,
                trim_end_dots_required: trim_dots,
            };
            write_text(out, &prepare_entity_name(&name, options))
        }
        Commands::Vars { template } => write_json(out, &unique_variables(&template)),
        Commands::Render {
            template,
            prompt,
            vars,
        } => {
            let template = match (template, prompt) {
                (Some(template), _) => template,
                (None, Some(id)) => stored_prompt_content(&open_store()?, &id)?,
                (None, None) => String::new(),
            };
            let bindings: Bindings = vars.into_iter().collect();
            write_text(out, &substitute(&template, &bindings)?)
        }
        Commands::List => {
            let store = open_store()?;
            write_json(
                out,
                &json!({
                    "folders": store.read_folders()?,
                    "prompts": store.read_prompts()?,
                }),
            )
        }
        Commands::Add {
            name,
            content,
            description,
            folder,
        } => {
            let prompt = open_store()?.add_prompt(
                &name,
                &content,
                description.as_deref(),
                folder.as_deref(),
            )?;
            write_json(out, &prompt)
        }
        Commands::AddFolder { name, parent } => {
            let folder = open_store()?.add_folder(&name, parent.as_deref())?;
            write_json(out, &folder)
        }
        Commands::Rename { id, name } => {
            let name = open_store()?.rename(&id, &name)?;
            write_json(out, &json!({ "id": id, "name": name }))
        }
        Commands::Delete { id } => write_json(out, &open_store()?.delete(&id)?),
        Commands::DeleteAll => write_json(out, &open_store()?.delete_all()?),
        Commands::Import { file } => {
            let text = read_file(&file)?;
            let data = parse_import(&text, &file.display().to_string())?;
            write_json(out, &open_store()?.import(data)?)
        }
        Commands::Export { file, id } => {
            let store = open_store()?;
            let data = match id.as_deref() {
                Some(id) => store.export_entity(id)?,
                None => store.export_all()?,
            };
            write_file(&file, &serde_json::to_string_pretty(&data)?)?;
            write_json(
                out,
                &json!({
                    "file": file.display().to_string(),
                    "prompts": data.prompts.len(),
                    "folders": data.folders.len(),
                }),
            )
        }
    }
}

pub fn open_store_from(config: &AppConfig) -> Result<PromptStore, CliError> {
    Ok(PromptStore::open(config.root_dir()?)?)
}

fn open_store() -> Result<PromptStore, CliError> {
    open_store_from(&load_config()?)
}

fn stored_prompt_content(store: &PromptStore, id: &str) -> Result<String, CliError> {
    let prompt = store
        .read_prompts()?
        .into_iter()
        .find(|prompt| prompt.id == id)
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
    Ok(prompt.content.unwrap_or_default())
}

fn read_file(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::File {
        path: path.display().to_string(),
        source,
    })
}

fn write_file(path: &Path, contents: &str) -> Result<(), CliError> {
    fs::write(path, contents).map_err(|source| CliError::File {
        path: path.display().to_string(),
        source,
    })
}

fn write_text(out: &mut impl Write, text: &str) -> Result<(), CliError> {
    writeln!(out, "{text}")?;
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
