// Editing session: the single owner of the live scene, its undo history and
// the design gallery. Every mutation goes through here.

use stamp_core::{Document, EngineError, KeyValueStore, SceneEngine};
use stamp_exchange::ImportedDesign;
use stamp_gallery::{
    builtin_templates, export_scene, ExportArtifact, ExportNaming, ExportPreset, GalleryError,
    GalleryStore, SavedDesign, StampTemplate,
};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use super::history::{History, HistoryError, Step};
use super::notice::Notice;
use super::queue::{EditQueue, EditTicket, QueueError};
use crate::config::{ConfigError, EditorConfig};

pub struct Session<E: SceneEngine, S: KeyValueStore> {
    engine: E,
    history: History,
    gallery: GalleryStore<S>,
    queue: EditQueue,
    naming: ExportNaming,
    notices: Vec<Notice>,
}

impl<E: SceneEngine, S: KeyValueStore> Session<E, S> {
    /// Start a session on the engine's current scene.
    pub fn new(engine: E, storage: S, config: &EditorConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let history = History::initialize(&engine, config.history_depth)?;
        let gallery = GalleryStore::new(storage, config.gallery.clone())?;

        info!(
            history_depth = config.history_depth,
            collection_key = %config.gallery.collection_key,
            "editing session started"
        );

        Ok(Self {
            engine,
            history,
            gallery,
            queue: EditQueue::new(),
            naming: config.export_naming.clone(),
            notices: Vec::new(),
        })
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Mutate the scene and record the result as one undo step.
    ///
    /// A scene that cannot be snapshotted is still mutated; the step is
    /// skipped and a warning notice is raised.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut E) -> R) -> R {
        let ticket = self.begin_edit();
        let out = f(&mut self.engine);
        // Failure is already logged and turned into a notice.
        let _ = self.complete_edit(ticket);
        out
    }

    /// Start an edit whose engine work finishes later.
    pub fn begin_edit(&mut self) -> EditTicket {
        self.queue.begin()
    }

    /// Engine access for an edit in flight.
    pub fn engine_mut(&mut self, _ticket: &EditTicket) -> &mut E {
        &mut self.engine
    }

    /// The edit behind `ticket` finished: snapshot the scene now and commit
    /// it once every earlier edit has settled. Returns how many snapshots
    /// reached the history.
    pub fn complete_edit(&mut self, ticket: EditTicket) -> Result<usize, SessionError> {
        match self.engine.serialize_scene() {
            Ok(doc) => {
                if let Err(e) = self.queue.complete(ticket, doc) {
                    return self.fail(e.into());
                }
                Ok(self.commit_ready(Some(ticket)))
            }
            Err(e) => {
                warn!(ticket = ticket.id(), error = %e, "edit could not be snapshotted");
                if let Err(qe) = self.queue.abandon(ticket) {
                    return self.fail(qe.into());
                }
                self.commit_ready(None);
                let err = SessionError::History(HistoryError::Serialize(e));
                self.notices
                    .push(Notice::warning(format!("Change not added to undo history: {}", err)));
                Err(err)
            }
        }
    }

    /// The edit behind `ticket` was cancelled or failed in the engine.
    pub fn abandon_edit(&mut self, ticket: EditTicket) -> Result<usize, SessionError> {
        if let Err(e) = self.queue.abandon(ticket) {
            return self.fail(e.into());
        }
        Ok(self.commit_ready(None))
    }

    fn commit_ready(&mut self, captured: Option<EditTicket>) -> usize {
        let mut ready = self.queue.drain_ready();

        // The newest entry released must match the live scene, which already
        // holds the work of every edit that finished before it was released.
        if let Some((ticket, doc)) = ready.last_mut() {
            if captured != Some(*ticket) {
                match self.engine.serialize_scene() {
                    Ok(live) => *doc = live,
                    Err(e) => warn!(
                        ticket = ticket.id(),
                        error = %e,
                        "released snapshot could not be refreshed"
                    ),
                }
            }
        }

        let mut count = 0;
        let mut previous: Option<Document> = None;
        for (ticket, doc) in ready {
            // Interleaved edits can leave identical neighbours; one step is enough.
            if previous.as_ref() == Some(&doc) {
                trace!(ticket = ticket.id(), "edit merged into the previous step");
                continue;
            }
            let cursor = self.history.push(doc.clone());
            debug!(ticket = ticket.id(), cursor, "edit committed to history");
            previous = Some(doc);
            count += 1;
        }
        count
    }

    pub fn pending_edits(&self) -> usize {
        self.queue.pending()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> Result<Step, SessionError> {
        self.ensure_idle()?;
        match self.history.undo(&mut self.engine) {
            Ok(step) => {
                if step == Step::NothingToUndo {
                    self.notices.push(Notice::info("Nothing to undo"));
                }
                Ok(step)
            }
            Err(e) => self.fail(e.into()),
        }
    }

    pub fn redo(&mut self) -> Result<Step, SessionError> {
        self.ensure_idle()?;
        match self.history.redo(&mut self.engine) {
            Ok(step) => {
                if step == Step::NothingToRedo {
                    self.notices.push(Notice::info("Nothing to redo"));
                }
                Ok(step)
            }
            Err(e) => self.fail(e.into()),
        }
    }

    /// Saved designs in save order.
    pub fn list_designs(&mut self) -> Result<&[SavedDesign], SessionError> {
        match self.gallery.list_saved() {
            Ok(designs) => Ok(designs),
            Err(e) => {
                let err = SessionError::from(e);
                self.notices.push(Notice::from_error(&err));
                Err(err)
            }
        }
    }

    /// Save the current scene to the gallery.
    pub fn save_design(
        &mut self,
        name: &str,
        description: &str,
    ) -> Result<SavedDesign, SessionError> {
        match self.gallery.save(&self.engine, name, description) {
            Ok(saved) => {
                match &saved.sync_error {
                    Some(e) => self.notices.push(Notice::warning(format!(
                        "Stamp saved for this session only: {}",
                        e
                    ))),
                    None => self.notices.push(Notice::success("Stamp saved successfully!")),
                }
                Ok(saved.into_inner())
            }
            Err(e) => self.fail(e.into()),
        }
    }

    /// Returns whether a design was removed.
    pub fn delete_design(&mut self, id: &str) -> Result<bool, SessionError> {
        match self.gallery.delete(id) {
            Ok(deleted) => {
                match &deleted.sync_error {
                    Some(e) => self.notices.push(Notice::warning(format!(
                        "Stamp deleted for this session only: {}",
                        e
                    ))),
                    None if deleted.value => self.notices.push(Notice::success("Stamp deleted!")),
                    None => {}
                }
                Ok(deleted.into_inner())
            }
            Err(e) => self.fail(e.into()),
        }
    }

    /// Replace the scene with a saved design. Undoable.
    pub fn load_design(&mut self, id: &str) -> Result<(), SessionError> {
        self.ensure_idle()?;
        let doc = match self.gallery.load(id) {
            Ok(doc) => doc,
            Err(e) => return self.fail(e.into()),
        };
        self.replace_scene(&doc)?;
        self.notices.push(Notice::success("Stamp loaded!"));
        Ok(())
    }

    /// Replace the scene with an external design file. The gallery is not
    /// touched; save explicitly to keep it.
    pub fn import_file(&mut self, bytes: &[u8]) -> Result<ImportedDesign, SessionError> {
        self.ensure_idle()?;
        let imported = match self.gallery.import_from_external_file(bytes) {
            Ok(imported) => imported,
            Err(e) => return self.fail(e.into()),
        };
        self.replace_scene(&imported.document)?;
        self.notices
            .push(Notice::success("Stamp imported successfully!"));
        Ok(imported)
    }

    fn replace_scene(&mut self, doc: &Document) -> Result<(), SessionError> {
        if let Err(e) = self.engine.load_scene(doc) {
            warn!(error = %e, "engine rejected document; scene unchanged");
            return self.fail(e.into());
        }
        if let Err(e) = self.history.record_edit(&self.engine) {
            self.notices
                .push(Notice::warning(format!("Change not added to undo history: {}", e)));
        }
        Ok(())
    }

    /// Retry persisting gallery changes that failed to write.
    pub fn flush_gallery(&mut self) -> Result<(), SessionError> {
        match self.gallery.flush() {
            Ok(()) => Ok(()),
            Err(e) => self.fail(e.into()),
        }
    }

    pub fn gallery_is_dirty(&self) -> bool {
        self.gallery.is_dirty()
    }

    pub fn set_export_naming(&mut self, naming: ExportNaming) -> Result<(), SessionError> {
        if let Err(e) = naming.validate() {
            return self.fail(e.into());
        }
        self.naming = naming;
        Ok(())
    }

    pub fn export(&mut self, preset: ExportPreset) -> Result<ExportArtifact, SessionError> {
        match export_scene(&self.engine, preset, &self.naming) {
            Ok(artifact) => {
                let label = preset.format().extension().to_uppercase();
                self.notices
                    .push(Notice::success(format!("Stamp exported as {}!", label)));
                Ok(artifact)
            }
            Err(e) => self.fail(e.into()),
        }
    }

    pub fn templates(&self) -> &'static [StampTemplate] {
        builtin_templates()
    }

    /// Notices raised since the last call, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// End the session, handing back the engine and storage.
    pub fn into_parts(self) -> (E, S) {
        info!(snapshots = self.history.len(), "editing session ended");
        (self.engine, self.gallery.into_storage())
    }

    fn ensure_idle(&mut self) -> Result<(), SessionError> {
        if self.queue.is_idle() {
            return Ok(());
        }
        let count = self.queue.pending();
        debug!(pending = count, "refusing to move history while edits are in flight");
        self.fail(SessionError::EditsPending { count })
    }

    fn fail<T>(&mut self, err: SessionError) -> Result<T, SessionError> {
        self.notices.push(Notice::from_error(&err));
        Err(err)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Gallery(#[from] GalleryError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("{count} edit(s) still in flight")]
    EditsPending { count: usize },
}
