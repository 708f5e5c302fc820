/// Editing session for one document.
///
/// Owns the document, its annotation set, the dirty flag and the auto-save
/// timer. Storage is reached only through the [`AnnotationBackend`] passed
/// into each call.
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::annotation::offsets::{self, Selection};
use crate::annotation::{AnnotationError, AnnotationSet, OffsetRange, Span, SpanId};
use crate::palette::Palette;
use crate::render::{self, Segment};
use crate::store::{AnnotationBackend, LoadedDocument, StoreError};

/// Dirty flag plus the time of the last successful save.
#[derive(Debug, Clone)]
pub struct AutoSave {
    interval: Duration,
    dirty: bool,
    last_saved: Instant,
}

impl AutoSave {
    #[must_use]
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            dirty: false,
            last_saved: now,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// A save is due once the state is dirty and the interval has elapsed.
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        self.dirty && now.saturating_duration_since(self.last_saved) >= self.interval
    }

    pub fn record_success(&mut self, now: Instant) {
        self.dirty = false;
        self.last_saved = now;
    }
}

/// Result of one auto-save tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing changed since the last save.
    Clean,
    /// Dirty, but the interval has not elapsed yet.
    Waiting,
    Saved,
    /// The save failed; the state stays dirty and the next tick retries.
    Failed,
}

pub struct EditorSession {
    document: LoadedDocument,
    annotations: AnnotationSet,
    palette: Arc<Palette>,
    autosave: AutoSave,
}

impl EditorSession {
    /// Load `name` from the backend. Unknown names give an empty session.
    pub fn open(
        backend: &dyn AnnotationBackend,
        name: &str,
        palette: Arc<Palette>,
        interval: Duration,
        now: Instant,
    ) -> Result<Self, StoreError> {
        let mut document = backend.load_document(name)?;
        let annotations = AnnotationSet::from_spans(std::mem::take(&mut document.annotations));
        Ok(Self {
            document,
            annotations,
            palette,
            autosave: AutoSave::new(interval, now),
        })
    }

    #[must_use]
    pub fn file(&self) -> &str {
        &self.document.file
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.document.text
    }

    #[must_use]
    pub fn annotations(&self) -> &AnnotationSet {
        &self.annotations
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.autosave.is_dirty()
    }

    #[must_use]
    pub fn segments(&self) -> Vec<Segment<'_>> {
        render::render_segments(&self.document.text, &self.annotations)
    }

    #[must_use]
    pub fn render_html(&self) -> String {
        render::render_html(&self.document.text, &self.annotations, &self.palette)
    }

    /// Tag `range` with `class`.
    pub fn annotate(&mut self, range: OffsetRange, class: &str) -> Result<SpanId, AnnotationError> {
        if !self.palette.contains(class) {
            return Err(AnnotationError::UnknownClass(class.to_string()));
        }
        let span = Span::from_document(&self.document.text, range, class)?;
        let id = self.annotations.insert(span)?;
        self.autosave.mark_dirty();
        debug!("Added {class} span {range} as {id}");
        Ok(id)
    }

    /// Resolve a selection over [`EditorSession::segments`] and tag it.
    ///
    /// `Ok(None)` means the selection was malformed and ignored.
    pub fn apply_selection(
        &mut self,
        selection: &Selection<'_>,
        class: &str,
    ) -> Result<Option<SpanId>, AnnotationError> {
        let range = offsets::resolve_selection(&self.segments(), selection);
        match range {
            Some(range) => self.annotate(range, class).map(Some),
            None => Ok(None),
        }
    }

    pub fn remove(&mut self, id: SpanId) -> Option<Span> {
        let removed = self.annotations.remove(id)?;
        self.autosave.mark_dirty();
        Some(removed)
    }

    /// Remove the first span with this class and text.
    pub fn remove_first_match(&mut self, class: &str, text: &str) -> Option<Span> {
        let removed = self.annotations.remove_first_match(class, text)?;
        self.autosave.mark_dirty();
        Some(removed)
    }

    /// Push the full span list now, regardless of the dirty flag.
    pub fn save(&mut self, backend: &dyn AnnotationBackend, now: Instant) -> Result<(), StoreError> {
        backend.save_annotations(&self.document.file, &self.annotations.to_spans())?;
        self.autosave.record_success(now);
        Ok(())
    }

    /// Interval tick: save only when dirty and the interval has elapsed.
    pub fn tick(&mut self, backend: &dyn AnnotationBackend, now: Instant) -> SyncOutcome {
        if self.document.is_empty() || !self.autosave.is_dirty() {
            return SyncOutcome::Clean;
        }
        if !self.autosave.is_due(now) {
            return SyncOutcome::Waiting;
        }
        match self.save(backend, now) {
            Ok(()) => SyncOutcome::Saved,
            Err(e) => {
                warn!("Auto-save of {} failed, will retry: {e}", self.document.file);
                SyncOutcome::Failed
            }
        }
    }

    /// Switch to another document, saving the current one first if it has
    /// any spans. If that save fails the session stays on the current
    /// document.
    pub fn switch_to(
        &mut self,
        backend: &dyn AnnotationBackend,
        name: &str,
        now: Instant,
    ) -> Result<(), StoreError> {
        if !self.document.is_empty() && !self.annotations.is_empty() {
            self.save(backend, now)?;
        }
        *self = Self::open(
            backend,
            name,
            Arc::clone(&self.palette),
            self.autosave.interval,
            now,
        )?;
        Ok(())
    }
}
