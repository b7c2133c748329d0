use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Anything with a stable id that can live inside a folder.
pub trait Entity {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn folder_id(&self) -> Option<&str>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub folder_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderType {
    #[default]
    Prompt,
    Chat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub folder_type: FolderType,
    #[serde(default)]
    pub folder_id: Option<String>,
}

impl Entity for Prompt {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn folder_id(&self) -> Option<&str> {
        self.folder_id.as_deref()
    }
}

impl Entity for Folder {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn folder_id(&self) -> Option<&str> {
        self.folder_id.as_deref()
    }
}

/// Concatenates both lists and drops repeated ids. The first occurrence
/// wins, so entries of `primary` shadow same-id entries of `secondary`.
pub fn combine_entities<T: Entity + Clone>(primary: &[T], secondary: &[T]) -> Vec<T> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(primary.len() + secondary.len());
    primary
        .iter()
        .chain(secondary)
        .filter(|entity| seen.insert(entity.id()))
        .cloned()
        .collect()
}

/// Whether `name` is free among the siblings of `entity`, ignoring `entity`
/// itself.
pub fn is_entity_name_on_same_level_unique<T: Entity, U: Entity>(
    name: &str,
    entity: &T,
    entities: &[U],
) -> bool {
    !entities
        .iter()
        .filter(|e| e.id() != entity.id() && e.folder_id() == entity.folder_id())
        .any(|e| e.name() == name)
}

/// Placeholder folders for ids referenced by entities. Ids are treated as
/// `/`-separated paths: the last segment becomes the name and the rest the
/// parent id.
pub fn folders_from_ids<S: AsRef<str>>(ids: &[S], folder_type: FolderType) -> Vec<Folder> {
    ids.iter()
        .map(|id| {
            let id = id.as_ref();
            let (parent, name) = match id.rsplit_once('/') {
                Some((parent, name)) if !parent.is_empty() && !name.is_empty() => {
                    (Some(parent.to_string()), name)
                }
                _ => (None, id),
            };
            Folder {
                id: id.to_string(),
                name: name.to_string(),
                folder_type,
                folder_id: parent,
            }
        })
        .collect()
}

/// Remaps folder ids through `update_folder_id` and makes sure every folder
/// referenced by `entities` exists. Known folders keep their names; ids
/// with no folder get a placeholder from [`folders_from_ids`].
pub fn update_entities_folders_and_ids<T, F>(
    entities: &[T],
    folders: &[Folder],
    folder_type: FolderType,
    update_folder_id: F,
) -> Vec<Folder>
where
    T: Entity,
    F: Fn(&str) -> String,
{
    let updated_existing: Vec<Folder> = folders
        .iter()
        .map(|folder| Folder {
            id: update_folder_id(&folder.id),
            folder_id: folder.folder_id.as_deref().map(&update_folder_id),
            ..folder.clone()
        })
        .collect();

    let mut seen = HashSet::new();
    let referenced: Vec<String> = entities
        .iter()
        .filter_map(|entity| entity.folder_id())
        .map(&update_folder_id)
        .filter(|id| seen.insert(id.clone()))
        .collect();

    combine_entities(
        &updated_existing,
        &folders_from_ids(&referenced, folder_type),
    )
}

#[cfg(test)]
#[path = "../tests/unit/entity_tests.rs"]
mod tests;
