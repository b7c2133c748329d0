use super::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static TEMP_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

struct TempStore {
    store: PromptStore,
}

impl TempStore {
    fn new(prefix: &str) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!("promptdesk-{prefix}-{now}-{counter}"));
        let store = PromptStore::open(&dir).expect("open store");
        Self { store }
    }
}

impl Drop for TempStore {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(self.store.root_dir());
    }
}

fn names<T: Entity>(entities: &[T]) -> Vec<&str> {
    entities.iter().map(Entity::name).collect()
}

#[test]
fn open_bootstraps_empty_files() {
    let tmp = TempStore::new("bootstrap");
    assert!(tmp.store.read_prompts().expect("prompts").is_empty());
    assert!(tmp.store.read_folders().expect("folders").is_empty());
    assert!(tmp.store.root_dir().join("prompts.json").exists());
}

#[test]
fn add_prompt_sanitizes_name_and_persists() {
    let tmp = TempStore::new("add");
    let prompt = tmp
        .store
        .add_prompt("Daily/Standup:\nsecond line", "what is {{A}}", Some("desc"), None)
        .expect("add prompt");
    assert_eq!(prompt.name, "Daily Standup");

    let stored = tmp.store.read_prompts().expect("prompts");
    assert_eq!(stored, vec![prompt]);
}

#[test]
fn add_prompt_rejects_duplicate_sibling_names_only() {
    let tmp = TempStore::new("dup");
    let folder = tmp.store.add_folder("Work", None).expect("folder");
    tmp.store
        .add_prompt("Same", "a", None, None)
        .expect("root prompt");
    tmp.store
        .add_prompt("Same", "b", None, Some(&folder.id))
        .expect("same name in another folder is fine");

    let err = tmp
        .store
        .add_prompt("Same", "c", None, None)
        .expect_err("duplicate at root");
    assert!(matches!(err, StoreError::DuplicateName(name) if name == "Same"));
}

#[test]
fn add_prompt_requires_existing_folder_and_non_empty_name() {
    let tmp = TempStore::new("validate");
    assert!(matches!(
        tmp.store.add_prompt("x", "y", None, Some("nope")),
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        tmp.store.add_prompt("???", "y", None, None),
        Err(StoreError::EmptyName)
    ));
}

#[test]
fn rename_rejects_trailing_dot_and_duplicates() {
    let tmp = TempStore::new("rename");
    let a = tmp.store.add_prompt("A", "a", None, None).expect("a");
    tmp.store.add_prompt("B", "b", None, None).expect("b");

    assert!(matches!(
        tmp.store.rename(&a.id, "A new."),
        Err(StoreError::TrailingDot(_))
    ));
    assert!(matches!(
        tmp.store.rename(&a.id, "notes.?"),
        Err(StoreError::TrailingDot(name)) if name == "notes."
    ));
    assert_eq!(names(&tmp.store.read_prompts().expect("prompts")), vec!["A", "B"]);
    assert!(matches!(
        tmp.store.rename(&a.id, "B"),
        Err(StoreError::DuplicateName(_))
    ));
    assert_eq!(tmp.store.rename(&a.id, " A/renamed ").expect("rename"), "Arenamed");
    assert!(matches!(
        tmp.store.rename("missing", "x"),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn rename_applies_to_folders() {
    let tmp = TempStore::new("rename-folder");
    let folder = tmp.store.add_folder("Old", None).expect("folder");
    tmp.store.rename(&folder.id, "New").expect("rename folder");
    assert_eq!(names(&tmp.store.read_folders().expect("folders")), vec!["New"]);
}

#[test]
fn deleting_a_folder_removes_nested_folders_and_prompts() {
    let tmp = TempStore::new("delete");
    let top = tmp.store.add_folder("Top", None).expect("top");
    let child = tmp.store.add_folder("Child", Some(&top.id)).expect("child");
    let other = tmp.store.add_folder("Other", None).expect("other");
    tmp.store.add_prompt("in top", "x", None, Some(&top.id)).expect("p1");
    tmp.store.add_prompt("in child", "x", None, Some(&child.id)).expect("p2");
    tmp.store.add_prompt("in other", "x", None, Some(&other.id)).expect("p3");

    let summary = tmp.store.delete(&top.id).expect("delete");
    assert_eq!(
        summary,
        DeleteSummary {
            prompts_removed: 2,
            folders_removed: 2
        }
    );
    assert_eq!(names(&tmp.store.read_folders().expect("folders")), vec!["Other"]);
    assert_eq!(names(&tmp.store.read_prompts().expect("prompts")), vec!["in other"]);
}

#[test]
fn failed_folder_write_leaves_library_untouched() {
    let tmp = TempStore::new("staged-write");
    let folder = tmp.store.add_folder("Work", None).expect("folder");
    tmp.store
        .add_prompt("Inside", "x", None, Some(&folder.id))
        .expect("inside");
    fs::create_dir(tmp.store.root_dir().join("folders.json.tmp")).expect("block staging");

    assert!(matches!(tmp.store.delete(&folder.id), Err(StoreError::Io(_))));
    assert_eq!(names(&tmp.store.read_prompts().expect("prompts")), vec!["Inside"]);
    assert_eq!(names(&tmp.store.read_folders().expect("folders")), vec!["Work"]);
    assert!(!tmp.store.root_dir().join("prompts.json.tmp").exists());
}

#[test]
fn export_and_reimport_restores_everything_after_delete_all() {
    let tmp = TempStore::new("roundtrip");
    let empty = tmp.store.add_folder("Empty", None).expect("empty");
    let folder = tmp.store.add_folder("Folder", None).expect("folder");
    tmp.store.add_prompt("inside", "x", None, Some(&folder.id)).expect("inside");
    tmp.store.add_prompt("root", "test", None, None).expect("root");

    let exported = tmp.store.export_all().expect("export");
    tmp.store.delete_all().expect("delete all");
    let summary = tmp.store.import(exported.clone()).expect("import");

    assert_eq!(summary.prompts_added, 2);
    assert_eq!(summary.folders_added, 2);
    assert_eq!(tmp.store.read_prompts().expect("prompts"), exported.prompts);
    assert!(
        tmp.store
            .read_folders()
            .expect("folders")
            .iter()
            .any(|f| f.id == empty.id)
    );
}

#[test]
fn existing_prompts_stay_after_import() {
    let tmp = TempStore::new("existing");
    let local = tmp.store.add_prompt("local", "mine", None, None).expect("local");

    let mut clash = local.clone();
    clash.name = "imported copy".to_string();
    let incoming = ExportFile {
        version: EXPORT_FORMAT_VERSION,
        prompts: vec![
            clash,
            Prompt {
                id: "new-id".to_string(),
                name: "fresh".to_string(),
                description: None,
                content: Some("hi".to_string()),
                folder_id: None,
            },
        ],
        folders: Vec::new(),
    };
    let summary = tmp.store.import(incoming).expect("import");

    assert_eq!(summary.prompts_added, 1);
    assert_eq!(
        names(&tmp.store.read_prompts().expect("prompts")),
        vec!["local", "fresh"]
    );
}

#[test]
fn exporting_a_nested_prompt_carries_its_folder_chain() {
    let tmp = TempStore::new("nested");
    let l1 = tmp.store.add_folder("L1", None).expect("l1");
    let l2 = tmp.store.add_folder("L2", Some(&l1.id)).expect("l2");
    let l3 = tmp.store.add_folder("L3", Some(&l2.id)).expect("l3");
    let prompt = tmp.store.add_prompt("deep", "x", None, Some(&l3.id)).expect("deep");
    tmp.store.add_prompt("shallow", "x", None, Some(&l1.id)).expect("shallow");

    let exported = tmp.store.export_entity(&prompt.id).expect("export prompt");
    assert_eq!(names(&exported.folders), vec!["L1", "L2", "L3"]);
    assert_eq!(names(&exported.prompts), vec!["deep"]);

    tmp.store.delete(&l2.id).expect("delete l2");
    tmp.store.import(exported).expect("reimport");
    let folders = tmp.store.read_folders().expect("folders");
    assert_eq!(names(&folders), vec!["L1", "L2", "L3"]);
    let prompts = tmp.store.read_prompts().expect("prompts");
    assert!(prompts.iter().any(|p| p.id == prompt.id));
}

#[test]
fn exporting_a_folder_includes_its_subtree() {
    let tmp = TempStore::new("export-folder");
    let top = tmp.store.add_folder("Top", None).expect("top");
    let child = tmp.store.add_folder("Child", Some(&top.id)).expect("child");
    tmp.store.add_prompt("a", "x", None, Some(&child.id)).expect("a");
    tmp.store.add_prompt("b", "x", None, None).expect("b");

    let exported = tmp.store.export_entity(&child.id).expect("export folder");
    assert_eq!(names(&exported.folders), vec!["Top", "Child"]);
    assert_eq!(names(&exported.prompts), vec!["a"]);
}

#[test]
fn import_derives_missing_folders_from_prompt_references() {
    let tmp = TempStore::new("derive");
    let incoming = ExportFile {
        version: EXPORT_FORMAT_VERSION,
        prompts: vec![Prompt {
            id: "p".to_string(),
            name: "orphan".to_string(),
            description: None,
            content: None,
            folder_id: Some("team/drafts".to_string()),
        }],
        folders: Vec::new(),
    };
    tmp.store.import(incoming).expect("import");

    let folders = tmp.store.read_folders().expect("folders");
    let ids: Vec<&str> = folders.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["team/drafts", "team"]);
    assert_eq!(folders[0].name, "drafts");
}

#[test]
fn parse_import_accepts_current_legacy_and_bare_layouts() {
    let current = r#"{"version":5,"prompts":[{"id":"1","name":"n","content":"c","folderId":null}],"folders":[]}"#;
    assert_eq!(parse_import(current, "current").expect("current").prompts.len(), 1);

    let legacy = r#"{
        "history": [{"id":"c1","name":"conversation"}],
        "folders": [
            {"id":"f1","name":"Prompts 1.4","type":"prompt"},
            {"id":"f2","name":"Chats","type":"chat"}
        ],
        "prompts": [{"id":"p1","name":"old prompt","content":"hi {{A}}","folderId":"f1","model":{"id":"gpt-4"}}]
    }"#;
    let parsed = parse_import(legacy, "legacy").expect("legacy");
    assert_eq!(parsed.prompts[0].folder_id.as_deref(), Some("f1"));
    assert_eq!(parsed.folders.len(), 2);

    let bare = r#"[{"id":"p","name":"bare"}]"#;
    assert_eq!(parse_import(bare, "bare").expect("bare").prompts[0].name, "bare");
}

#[test]
fn legacy_import_keeps_only_prompt_folders() {
    let tmp = TempStore::new("legacy");
    let legacy = r#"{
        "history": [],
        "folders": [
            {"id":"f1","name":"Prompts 1.4","type":"prompt"},
            {"id":"f2","name":"Chats","type":"chat"}
        ],
        "prompts": [{"id":"p1","name":"old prompt","content":"hi","folderId":"f1"}]
    }"#;
    let parsed = parse_import(legacy, "legacy").expect("legacy");
    tmp.store.import(parsed).expect("import");
    assert_eq!(
        names(&tmp.store.read_folders().expect("folders")),
        vec!["Prompts 1.4"]
    );
}

#[test]
fn parse_import_rejects_unknown_shapes() {
    assert!(matches!(
        parse_import(r#"{"foo":1}"#, "weird.json"),
        Err(StoreError::UnrecognizedImport(origin)) if origin == "weird.json"
    ));
    assert!(matches!(
        parse_import("not json", "broken.json"),
        Err(StoreError::InvalidData { .. })
    ));
}
