use super::*;

fn prompt(id: &str, name: &str, folder_id: Option<&str>) -> Prompt {
    Prompt {
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        content: None,
        folder_id: folder_id.map(str::to_string),
    }
}

fn folder(id: &str, name: &str, parent: Option<&str>) -> Folder {
    Folder {
        id: id.to_string(),
        name: name.to_string(),
        folder_type: FolderType::Prompt,
        folder_id: parent.map(str::to_string),
    }
}

fn ids<T: Entity>(entities: &[T]) -> Vec<&str> {
    entities.iter().map(Entity::id).collect()
}

#[test]
fn combine_prefers_primary_entries_on_id_collision() {
    let primary = vec![prompt("1", "local", None), prompt("2", "two", None)];
    let secondary = vec![prompt("1", "imported", None), prompt("3", "three", None)];

    let merged = combine_entities(&primary, &secondary);

    assert_eq!(ids(&merged), vec!["1", "2", "3"]);
    assert_eq!(merged[0].name, "local");
}

#[test]
fn combine_with_empty_secondary_is_identity() {
    let primary = vec![prompt("a", "a", None), prompt("b", "b", Some("f"))];
    assert_eq!(combine_entities(&primary, &[]), primary);
}

#[test]
fn combine_dedupes_inside_primary_as_well() {
    let primary = vec![
        prompt("a", "first", None),
        prompt("b", "b", None),
        prompt("a", "second", None),
    ];
    let merged = combine_entities(&primary, &[]);
    assert_eq!(ids(&merged), vec!["a", "b"]);
    assert_eq!(merged[0].name, "first");
}

#[test]
fn combine_leaves_inputs_untouched() {
    let primary = vec![prompt("x", "x", None)];
    let secondary = vec![prompt("x", "other", None), prompt("y", "y", None)];
    let _ = combine_entities(&primary, &secondary);
    assert_eq!(primary.len(), 1);
    assert_eq!(secondary.len(), 2);
}

#[test]
fn same_level_uniqueness_only_checks_siblings() {
    let entities = vec![
        prompt("1", "shared", Some("f1")),
        prompt("2", "shared", Some("f2")),
        prompt("3", "root", None),
    ];
    let candidate = prompt("new", "", Some("f1"));
    assert!(!is_entity_name_on_same_level_unique("shared", &candidate, &entities));
    assert!(is_entity_name_on_same_level_unique("root", &candidate, &entities));

    let root_candidate = prompt("new", "", None);
    assert!(!is_entity_name_on_same_level_unique("root", &root_candidate, &entities));
}

#[test]
fn same_level_uniqueness_ignores_the_entity_itself() {
    let entities = vec![prompt("1", "keep", None)];
    assert!(is_entity_name_on_same_level_unique("keep", &entities[0], &entities));
}

#[test]
fn folders_from_path_ids_use_last_segment_as_name() {
    let folders = folders_from_ids(&["work", "work/drafts"], FolderType::Prompt);
    assert_eq!(folders[0], folder("work", "work", None));
    assert_eq!(folders[1], folder("work/drafts", "drafts", Some("work")));
}

#[test]
fn update_folders_keeps_known_names_and_derives_missing() {
    let prompts = vec![
        prompt("p1", "one", Some("known")),
        prompt("p2", "two", Some("missing")),
        prompt("p3", "three", Some("missing")),
        prompt("p4", "four", None),
    ];
    let folders = vec![folder("known", "Known folder", None)];

    let updated =
        update_entities_folders_and_ids(&prompts, &folders, FolderType::Prompt, str::to_string);

    assert_eq!(ids(&updated), vec!["known", "missing"]);
    assert_eq!(updated[0].name, "Known folder");
    assert_eq!(updated[1].name, "missing");
}

#[test]
fn update_folders_applies_id_mapping_to_parents() {
    let folders = vec![
        folder("a", "A", None),
        folder("b", "B", Some("a")),
    ];
    let updated = update_entities_folders_and_ids(
        &Vec::<Prompt>::new(),
        &folders,
        FolderType::Prompt,
        |id| format!("new-{id}"),
    );
    assert_eq!(ids(&updated), vec!["new-a", "new-b"]);
    assert_eq!(updated[1].folder_id.as_deref(), Some("new-a"));
}

#[test]
fn prompt_serializes_with_camel_case_folder_id() {
    let json = serde_json::to_value(prompt("1", "n", Some("f"))).expect("serialize prompt");
    assert_eq!(json["folderId"], "f");
    assert!(json.get("content").is_none());
}

#[test]
fn folder_type_round_trips_through_type_key() {
    let parsed: Folder =
        serde_json::from_str(r#"{"id":"f","name":"F","type":"chat"}"#).expect("parse folder");
    assert_eq!(parsed.folder_type, FolderType::Chat);
    assert_eq!(parsed.folder_id, None);
}
