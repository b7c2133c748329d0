use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{
    Entity, Folder, FolderType, Prompt, combine_entities, is_entity_name_on_same_level_unique,
    update_entities_folders_and_ids,
};
use crate::error::StoreError;
use crate::naming::{PrepareNameOptions, does_have_dots_in_the_end, prepare_entity_name};

pub const EXPORT_FORMAT_VERSION: u32 = 5;
const DEFAULT_PROMPT_NAME: &str = "New prompt";
const DEFAULT_FOLDER_NAME: &str = "New folder";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFile {
    pub version: u32,
    #[serde(default)]
    pub prompts: Vec<Prompt>,
    #[serde(default)]
    pub folders: Vec<Folder>,
}

/// Layout written by 1.4 and earlier: conversations, folders of both kinds
/// and prompts side by side, without a version.
#[derive(Debug, Deserialize)]
struct LegacyExportFile {
    #[serde(default)]
    folders: Vec<Folder>,
    #[serde(default)]
    prompts: Vec<Prompt>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub prompts_added: usize,
    pub folders_added: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteSummary {
    pub prompts_removed: usize,
    pub folders_removed: usize,
}

#[derive(Debug, Clone)]
pub struct PromptStore {
    root_dir: PathBuf,
    prompts_file: PathBuf,
    folders_file: PathBuf,
}

impl PromptStore {
    pub fn open(root_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root_dir = root_dir.as_ref().to_path_buf();
        fs::create_dir_all(&root_dir)?;
        let store = Self {
            prompts_file: root_dir.join("prompts.json"),
            folders_file: root_dir.join("folders.json"),
            root_dir,
        };
        store.bootstrap_files()?;
        Ok(store)
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn read_prompts(&self) -> Result<Vec<Prompt>, StoreError> {
        read_json_file(&self.prompts_file)
    }

    pub fn read_folders(&self) -> Result<Vec<Folder>, StoreError> {
        read_json_file(&self.folders_file)
    }

    pub fn add_prompt(
        &self,
        name: &str,
        content: &str,
        description: Option<&str>,
        folder_id: Option<&str>,
    ) -> Result<Prompt, StoreError> {
        let mut prompts = self.read_prompts()?;
        let folders = self.read_folders()?;
        ensure_folder_exists(&folders, folder_id)?;

        let mut prompt = Prompt {
            id: new_id(),
            name: String::new(),
            description: description.map(str::to_string),
            content: Some(content.to_string()),
            folder_id: folder_id.map(str::to_string),
        };
        prompt.name = prepare_entity_name(name, PrepareNameOptions::default());
        if prompt.name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        if !is_entity_name_on_same_level_unique(&prompt.name, &prompt, &prompts) {
            return Err(StoreError::DuplicateName(prompt.name));
        }

        prompts.push(prompt.clone());
        self.write_prompts(&prompts)?;
        tracing::info!(id = %prompt.id, name = %prompt.name, "prompt added");
        Ok(prompt)
    }

    pub fn add_folder(&self, name: &str, parent_id: Option<&str>) -> Result<Folder, StoreError> {
        let mut folders = self.read_folders()?;
        ensure_folder_exists(&folders, parent_id)?;

        let folder = Folder {
            id: new_id(),
            name: prepare_entity_name(name, PrepareNameOptions::default()),
            folder_type: FolderType::Prompt,
            folder_id: parent_id.map(str::to_string),
        };
        if folder.name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        if !is_entity_name_on_same_level_unique(&folder.name, &folder, &folders) {
            return Err(StoreError::DuplicateName(folder.name));
        }

        folders.push(folder.clone());
        self.write_folders(&folders)?;
        tracing::info!(id = %folder.id, name = %folder.name, "folder added");
        Ok(folder)
    }

    /// Renames a prompt or folder. The new name must not end with a dot and
    /// must be free among the entity's siblings.
    pub fn rename(&self, id: &str, new_name: &str) -> Result<String, StoreError> {
        let name = prepare_entity_name(new_name, PrepareNameOptions::renaming());
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        if does_have_dots_in_the_end(&name) {
            return Err(StoreError::TrailingDot(name));
        }

        let mut prompts = self.read_prompts()?;
        if let Some(idx) = prompts.iter().position(|p| p.id == id) {
            if !is_entity_name_on_same_level_unique(&name, &prompts[idx], &prompts) {
                return Err(StoreError::DuplicateName(name));
            }
            prompts[idx].name = name.clone();
            self.write_prompts(&prompts)?;
            tracing::info!(%id, %name, "prompt renamed");
            return Ok(name);
        }

        let mut folders = self.read_folders()?;
        let Some(idx) = folders.iter().position(|f| f.id == id) else {
            return Err(StoreError::NotFound(id.to_string()));
        };
        if !is_entity_name_on_same_level_unique(&name, &folders[idx], &folders) {
            return Err(StoreError::DuplicateName(name));
        }
        folders[idx].name = name.clone();
        self.write_folders(&folders)?;
        tracing::info!(%id, %name, "folder renamed");
        Ok(name)
    }

    /// Deletes a prompt, or a folder together with everything nested in it.
    pub fn delete(&self, id: &str) -> Result<DeleteSummary, StoreError> {
        let mut prompts = self.read_prompts()?;
        let before = prompts.len();
        prompts.retain(|p| p.id != id);
        if prompts.len() != before {
            self.write_prompts(&prompts)?;
            tracing::info!(%id, "prompt deleted");
            return Ok(DeleteSummary {
                prompts_removed: 1,
                folders_removed: 0,
            });
        }

        let mut folders = self.read_folders()?;
        if !folders.iter().any(|f| f.id == id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let subtree = folder_subtree_ids(&folders, id);
        let folders_before = folders.len();
        folders.retain(|f| !subtree.contains(f.id.as_str()));
        prompts.retain(|p| !p.folder_id.as_deref().is_some_and(|f| subtree.contains(f)));

        let summary = DeleteSummary {
            prompts_removed: before - prompts.len(),
            folders_removed: folders_before - folders.len(),
        };
        self.write_library(&prompts, &folders)?;
        tracing::info!(
            %id,
            prompts = summary.prompts_removed,
            folders = summary.folders_removed,
            "folder deleted"
        );
        Ok(summary)
    }

    pub fn delete_all(&self) -> Result<DeleteSummary, StoreError> {
        let summary = DeleteSummary {
            prompts_removed: self.read_prompts()?.len(),
            folders_removed: self.read_folders()?.len(),
        };
        self.write_library(&[], &[])?;
        tracing::info!(
            prompts = summary.prompts_removed,
            folders = summary.folders_removed,
            "all prompts deleted"
        );
        Ok(summary)
    }

    pub fn export_all(&self) -> Result<ExportFile, StoreError> {
        Ok(ExportFile {
            version: EXPORT_FORMAT_VERSION,
            prompts: self.read_prompts()?,
            folders: self.read_folders()?,
        })
    }

    /// Exports one prompt with its ancestor folders, or one folder with its
    /// ancestors and everything nested in it.
    pub fn export_entity(&self, id: &str) -> Result<ExportFile, StoreError> {
        let prompts = self.read_prompts()?;
        let folders = self.read_folders()?;

        if let Some(prompt) = prompts.iter().find(|p| p.id == id) {
            return Ok(ExportFile {
                version: EXPORT_FORMAT_VERSION,
                prompts: vec![prompt.clone()],
                folders: ancestor_folders(&folders, prompt.folder_id.as_deref()),
            });
        }

        let Some(folder) = folders.iter().find(|f| f.id == id) else {
            return Err(StoreError::NotFound(id.to_string()));
        };
        let subtree = folder_subtree_ids(&folders, id);
        let mut exported = ancestor_folders(&folders, folder.folder_id.as_deref());
        exported.extend(
            folders
                .iter()
                .filter(|f| subtree.contains(f.id.as_str()))
                .cloned(),
        );
        Ok(ExportFile {
            version: EXPORT_FORMAT_VERSION,
            prompts: prompts
                .iter()
                .filter(|p| p.folder_id.as_deref().is_some_and(|f| subtree.contains(f)))
                .cloned()
                .collect(),
            folders: exported,
        })
    }

    /// Merges an import into the library. Entities already present keep
    /// their stored version; folders referenced by imported entities but
    /// absent everywhere are created as placeholders.
    pub fn import(&self, data: ExportFile) -> Result<ImportSummary, StoreError> {
        let existing_prompts = self.read_prompts()?;
        let existing_folders = self.read_folders()?;

        let imported_prompts: Vec<Prompt> = data
            .prompts
            .into_iter()
            .map(|mut prompt| {
                prompt.name = imported_name(&prompt.name, DEFAULT_PROMPT_NAME);
                prompt
            })
            .collect();
        let imported_folders: Vec<Folder> = data
            .folders
            .into_iter()
            .filter(|folder| folder.folder_type == FolderType::Prompt)
            .map(|mut folder| {
                folder.name = imported_name(&folder.name, DEFAULT_FOLDER_NAME);
                folder
            })
            .collect();

        let prompts = combine_entities(&existing_prompts, &imported_prompts);
        let mut folders = update_entities_folders_and_ids(
            &prompts,
            &combine_entities(&existing_folders, &imported_folders),
            FolderType::Prompt,
            str::to_string,
        );
        // Nested placeholders may reference parents that do not exist yet.
        loop {
            let with_parents = update_entities_folders_and_ids(
                &folders,
                &folders,
                FolderType::Prompt,
                str::to_string,
            );
            if with_parents.len() == folders.len() {
                break;
            }
            folders = with_parents;
        }

        let summary = ImportSummary {
            prompts_added: prompts.len().saturating_sub(existing_prompts.len()),
            folders_added: folders.len().saturating_sub(existing_folders.len()),
        };
        self.write_library(&prompts, &folders)?;
        tracing::info!(
            prompts = summary.prompts_added,
            folders = summary.folders_added,
            "import merged"
        );
        Ok(summary)
    }

    fn write_prompts(&self, prompts: &[Prompt]) -> Result<(), StoreError> {
        write_json_file(&self.prompts_file, prompts)
    }

    fn write_folders(&self, folders: &[Folder]) -> Result<(), StoreError> {
        write_json_file(&self.folders_file, folders)
    }

    /// Both files are staged before either is replaced, so a failed write
    /// leaves the library as it was.
    fn write_library(&self, prompts: &[Prompt], folders: &[Folder]) -> Result<(), StoreError> {
        let staged_prompts = stage_json_file(&self.prompts_file, prompts)?;
        let staged_folders = match stage_json_file(&self.folders_file, folders) {
            Ok(path) => path,
            Err(err) => {
                let _ = fs::remove_file(&staged_prompts);
                return Err(err);
            }
        };
        fs::rename(&staged_folders, &self.folders_file)?;
        fs::rename(&staged_prompts, &self.prompts_file)?;
        Ok(())
    }

    fn bootstrap_files(&self) -> Result<(), StoreError> {
        if !self.prompts_file.exists() {
            fs::write(&self.prompts_file, "[]\n")?;
        }
        if !self.folders_file.exists() {
            fs::write(&self.folders_file, "[]\n")?;
        }
        Ok(())
    }
}

/// Accepts the current export layout, the 1.4 layout and a bare prompt array.
pub fn parse_import(text: &str, origin: &str) -> Result<ExportFile, StoreError> {
    let invalid = |source: serde_json::Error| StoreError::InvalidData {
        file: origin.to_string(),
        source,
    };
    let value: Value = serde_json::from_str(text).map_err(invalid)?;

    if value.is_array() {
        return Ok(ExportFile {
            version: EXPORT_FORMAT_VERSION,
            prompts: serde_json::from_value(value).map_err(invalid)?,
            folders: Vec::new(),
        });
    }
    if value.get("version").is_some() {
        return serde_json::from_value(value).map_err(invalid);
    }
    if value.get("prompts").is_some() || value.get("history").is_some() {
        let legacy: LegacyExportFile = serde_json::from_value(value).map_err(invalid)?;
        return Ok(ExportFile {
            version: EXPORT_FORMAT_VERSION,
            prompts: legacy.prompts,
            folders: legacy.folders,
        });
    }
    Err(StoreError::UnrecognizedImport(origin.to_string()))
}

fn imported_name(raw: &str, fallback: &str) -> String {
    let name = prepare_entity_name(raw, PrepareNameOptions::default());
    if name.is_empty() {
        fallback.to_string()
    } else {
        name
    }
}

fn ensure_folder_exists(folders: &[Folder], folder_id: Option<&str>) -> Result<(), StoreError> {
    match folder_id {
        Some(id) if !folders.iter().any(|f| f.id == id) => {
            Err(StoreError::NotFound(id.to_string()))
        }
        _ => Ok(()),
    }
}

fn folder_subtree_ids(folders: &[Folder], root_id: &str) -> HashSet<String> {
    let mut subtree = HashSet::from([root_id.to_string()]);
    loop {
        let before = subtree.len();
        for folder in folders {
            if folder.folder_id().is_some_and(|parent| subtree.contains(parent)) {
                subtree.insert(folder.id.clone());
            }
        }
        if subtree.len() == before {
            return subtree;
        }
    }
}

/// Ancestors of `folder_id` (inclusive), outermost first.
fn ancestor_folders(folders: &[Folder], folder_id: Option<&str>) -> Vec<Folder> {
    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    let mut current = folder_id;
    while let Some(id) = current {
        if !visited.insert(id) {
            break;
        }
        let Some(folder) = folders.iter().find(|f| f.id == id) else {
            break;
        };
        chain.push(folder.clone());
        current = folder.folder_id.as_deref();
    }
    chain.reverse();
    chain
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|source| StoreError::InvalidData {
        file: path.display().to_string(),
        source,
    })
}

fn write_json_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let staged = stage_json_file(path, value)?;
    fs::rename(&staged, path)?;
    Ok(())
}

fn stage_json_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<PathBuf, StoreError> {
    let text = serde_json::to_string_pretty(value).map_err(|source| StoreError::InvalidData {
        file: path.display().to_string(),
        source,
    })?;
    let staged = path.with_extension("json.tmp");
    if let Err(err) = fs::write(&staged, text) {
        let _ = fs::remove_file(&staged);
        return Err(err.into());
    }
    Ok(staged)
}

#[cfg(test)]
#[path = "../tests/unit/store_tests.rs"]
mod tests;
