// Undo/redo history module for the editor.
//
// Whole-scene snapshots rather than per-object inverses: the engine's objects
// are opaque to us, so the serialized document is the only thing we can diff.

use stamp_core::{Document, EngineError, SceneEngine, Snapshot};
use std::collections::VecDeque;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Snapshots kept when no depth is configured.
pub const DEFAULT_MAX_STATES: usize = 20;

/// Result of an undo or redo request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The snapshot at `index` is now live.
    Applied { index: usize },
    NothingToUndo,
    NothingToRedo,
}

impl Step {
    pub fn applied(&self) -> bool {
        matches!(self, Step::Applied { .. })
    }
}

/// Bounded linear history with a cursor.
///
/// Never empty: the first snapshot is taken at construction.
#[derive(Debug, Clone)]
pub struct History {
    states: VecDeque<Snapshot>,
    current_index: usize,
    max_states: usize,
    next_sequence: u64,
}

impl History {
    /// Start a history whose first entry is `initial`.
    pub fn new(initial: Document, max_states: usize) -> Result<Self, HistoryError> {
        if max_states == 0 {
            return Err(HistoryError::ZeroCapacity);
        }

        let mut states = VecDeque::with_capacity(max_states);
        states.push_back(Snapshot::new(0, initial));
        debug!(max_states, "history initialized");

        Ok(Self {
            states,
            current_index: 0,
            max_states,
            next_sequence: 1,
        })
    }

    /// Capture the engine's current scene as snapshot #0.
    pub fn initialize<E: SceneEngine + ?Sized>(
        engine: &E,
        max_states: usize,
    ) -> Result<Self, HistoryError> {
        let initial = engine.serialize_scene().map_err(HistoryError::Serialize)?;
        Self::new(initial, max_states)
    }

    /// Append an already serialized scene. Returns the new cursor.
    ///
    /// Anything after the cursor is discarded first. Past capacity the oldest
    /// entry is evicted.
    pub fn push(&mut self, doc: Document) -> usize {
        let discarded = self.states.len() - (self.current_index + 1);
        if discarded > 0 {
            trace!(discarded, "dropping redo branch");
        }
        self.states.truncate(self.current_index + 1);

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.states.push_back(Snapshot::new(sequence, doc));
        self.current_index = self.states.len() - 1;

        while self.states.len() > self.max_states {
            self.states.pop_front();
            self.current_index -= 1;
        }

        trace!(
            sequence,
            len = self.states.len(),
            cursor = self.current_index,
            "snapshot recorded"
        );
        self.current_index
    }

    /// Serialize the engine's scene and push it.
    ///
    /// When serialization fails the log is left exactly as it was.
    pub fn record_edit<E: SceneEngine + ?Sized>(
        &mut self,
        engine: &E,
    ) -> Result<usize, HistoryError> {
        match engine.serialize_scene() {
            Ok(doc) => Ok(self.push(doc)),
            Err(e) => {
                warn!(error = %e, "could not snapshot scene; edit not recorded");
                Err(HistoryError::Serialize(e))
            }
        }
    }

    pub fn undo<E: SceneEngine + ?Sized>(&mut self, engine: &mut E) -> Result<Step, HistoryError> {
        if !self.can_undo() {
            debug!("nothing to undo");
            return Ok(Step::NothingToUndo);
        }
        self.apply(engine, self.current_index - 1)
    }

    pub fn redo<E: SceneEngine + ?Sized>(&mut self, engine: &mut E) -> Result<Step, HistoryError> {
        if !self.can_redo() {
            debug!("nothing to redo");
            return Ok(Step::NothingToRedo);
        }
        self.apply(engine, self.current_index + 1)
    }

    // The cursor moves only after the engine accepted the snapshot.
    fn apply<E: SceneEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        index: usize,
    ) -> Result<Step, HistoryError> {
        let snapshot = &self.states[index];
        engine
            .load_scene(snapshot.document())
            .map_err(|source| {
                warn!(index, error = %source, "snapshot failed to load; history unchanged");
                HistoryError::Apply { index, source }
            })?;

        debug!(from = self.current_index, to = index, "history moved");
        self.current_index = index;
        Ok(Step::Applied { index })
    }

    pub fn can_undo(&self) -> bool {
        self.current_index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current_index + 1 < self.states.len()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn cursor(&self) -> usize {
        self.current_index
    }

    pub fn capacity(&self) -> usize {
        self.max_states
    }

    /// The snapshot the live scene corresponds to.
    pub fn current(&self) -> &Snapshot {
        &self.states[self.current_index]
    }

    /// Oldest first.
    pub fn snapshots(&self) -> impl Iterator<Item = &Snapshot> {
        self.states.iter()
    }
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history capacity must be at least 1")]
    ZeroCapacity,

    #[error("could not snapshot scene: {0}")]
    Serialize(#[source] EngineError),

    #[error("could not restore snapshot {index}: {source}")]
    Apply { index: usize, source: EngineError },
}
