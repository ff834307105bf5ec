//! Integration tests: a full editing session over history and gallery.

use pretty_assertions::assert_eq;
use stamp_core::testing::{FlakyStore, MockCanvas};
use stamp_core::{FileStore, MemoryStore, SceneEngine};
use stamp_editor::{EditorConfig, NoticeLevel, Session, SessionError, Step};
use stamp_gallery::GalleryError;

fn default_stamp() -> MockCanvas {
    let mut canvas = MockCanvas::new();
    canvas.add_circle(125.0);
    canvas.add_circle(115.0);
    canvas
}

fn session_with<S: stamp_core::KeyValueStore>(storage: S) -> Session<MockCanvas, S> {
    Session::new(default_stamp(), storage, &EditorConfig::default()).unwrap()
}

// ─── Gallery ────────────────────────────────────────────────────────────

#[test]
fn empty_name_adds_nothing() {
    let mut session = session_with(MemoryStore::new());
    let before = session.list_designs().unwrap().len();

    assert!(matches!(
        session.save_design("", "desc"),
        Err(SessionError::Gallery(GalleryError::EmptyName))
    ));
    assert_eq!(session.list_designs().unwrap().len(), before);
}

#[test]
fn deleted_design_cannot_be_loaded() {
    let mut session = session_with(MemoryStore::new());
    session.edit(|c| c.add_text("APPROVED"));

    let saved = session.save_design("Approved Stamp", "desc").unwrap();
    assert!(session.delete_design(&saved.id).unwrap());

    assert!(matches!(
        session.load_design(&saved.id),
        Err(SessionError::Gallery(GalleryError::NotFound { .. }))
    ));
    assert!(session
        .list_designs()
        .unwrap()
        .iter()
        .all(|d| d.id != saved.id));
}

#[test]
fn three_designs_survive_restart_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_with(FileStore::new(dir.path()));

    let mut names = Vec::new();
    for name in ["Approved", "Urgent", "Confidential"] {
        session.edit(|c| c.add_text(name));
        names.push(session.save_design(name, "").unwrap().name);
    }
    drop(session);

    let mut restarted = session_with(FileStore::new(dir.path()));
    let listed: Vec<String> = restarted
        .list_designs()
        .unwrap()
        .iter()
        .map(|d| d.name.clone())
        .collect();
    assert_eq!(listed, names);
}

#[test]
fn load_replaces_scene_and_is_undoable() {
    let mut session = session_with(MemoryStore::new());
    session.edit(|c| c.add_text("SAVED"));
    let saved = session.save_design("Saved", "").unwrap();

    session.edit(|c| {
        c.objects.clear();
        c.add_text("SCRATCH")
    });
    session.load_design(&saved.id).unwrap();
    assert_eq!(session.engine().texts(), vec!["SAVED"]);

    assert!(session.undo().unwrap().applied());
    assert_eq!(session.engine().texts(), vec!["SCRATCH"]);
}

#[test]
fn malformed_import_leaves_gallery_alone() {
    let mut session = session_with(MemoryStore::new());
    session.save_design("Keep", "").unwrap();
    let scene_before = session.engine().serialize_scene().unwrap();
    session.take_notices();

    assert!(matches!(
        session.import_file(b"{\"objects\": [ oops"),
        Err(SessionError::Gallery(GalleryError::Import(_)))
    ));
    assert_eq!(session.list_designs().unwrap().len(), 1);
    assert_eq!(session.engine().serialize_scene().unwrap(), scene_before);

    let notices = session.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, "Invalid stamp file");
}

#[test]
fn import_applies_document_without_saving() {
    let mut session = session_with(MemoryStore::new());
    let file = br##"{"background":"#fff","objects":[{"type":"i-text","text":"IMPORTED"}]}"##;

    let imported = session.import_file(file).unwrap();
    assert_eq!(imported.name, None);
    assert_eq!(session.engine().texts(), vec!["IMPORTED"]);
    assert!(session.can_undo());
    assert!(session.list_designs().unwrap().is_empty());
}

#[test]
fn import_rejected_by_engine_keeps_scene() {
    let mut session = session_with(MemoryStore::new());
    // Well-formed JSON the engine does not understand.
    assert!(matches!(
        session.import_file(b"[1, 2, 3]"),
        Err(SessionError::Engine(_))
    ));
    assert_eq!(session.engine().objects.len(), 2);
    assert!(!session.can_undo());
}

#[test]
fn storage_failure_keeps_design_for_session() {
    let mut storage = FlakyStore::new();
    storage.fail_writes = true;
    let mut session = session_with(storage);

    let saved = session.save_design("Offline", "").unwrap();
    let notices = session.take_notices();
    assert_eq!(notices[0].level, NoticeLevel::Warning);
    assert!(session.gallery_is_dirty());
    assert_eq!(session.list_designs().unwrap()[0].id, saved.id);

    let (_, storage) = session.into_parts();
    assert_eq!(storage.writes, 0);
}

// ─── History through the session ────────────────────────────────────────

#[test]
fn out_of_order_completion_keeps_history_on_live_scene() {
    let mut session = session_with(MemoryStore::new());

    let first = session.begin_edit();
    let second = session.begin_edit();

    // The second edit's engine work lands first.
    session.engine_mut(&second).add_text("second");
    assert_eq!(session.complete_edit(second).unwrap(), 0);
    assert_eq!(session.pending_edits(), 2);

    session.engine_mut(&first).add_text("first");
    assert_eq!(session.complete_edit(first).unwrap(), 1);
    assert_eq!(session.pending_edits(), 0);
    assert_eq!(session.history().len(), 2);

    let live = session.engine().serialize_scene().unwrap();
    assert_eq!(session.history().current().document(), &live);

    let mut top = MockCanvas::new();
    top.load_scene(&live).unwrap();
    assert_eq!(top.texts(), vec!["second", "first"]);

    assert_eq!(session.undo().unwrap(), Step::Applied { index: 0 });
    assert!(session.engine().texts().is_empty());
    assert_eq!(session.redo().unwrap(), Step::Applied { index: 1 });
    assert_eq!(session.engine().texts(), vec!["second", "first"]);
}

#[test]
fn history_is_not_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_with(FileStore::new(dir.path()));
    session.edit(|c| c.add_text("a"));
    session.save_design("A", "").unwrap();
    let (canvas, storage) = session.into_parts();

    let restarted = Session::new(canvas, storage, &EditorConfig::default()).unwrap();
    assert!(!restarted.can_undo());
    assert!(!restarted.can_redo());
}

#[test]
fn custom_history_depth() {
    let config = EditorConfig {
        history_depth: 3,
        ..Default::default()
    };
    let mut session = Session::new(default_stamp(), MemoryStore::new(), &config).unwrap();
    for i in 0..10 {
        session.edit(|c| c.add_text(&i.to_string()));
    }
    assert_eq!(session.history().len(), 3);
}
