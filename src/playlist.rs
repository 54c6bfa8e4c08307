use log::debug;

use crate::media_entry::{EntryField, EntryId, EntryPatch, MediaEntry};

/// Change produced by a store mutation, drained by the owner and published
/// to observers.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Inserted {
        index: usize,
        entry: MediaEntry,
    },
    Removed {
        id: EntryId,
        index: usize,
    },
    Changed {
        index: usize,
        entry: MediaEntry,
        fields: Vec<EntryField>,
    },
}

/// Ordered playlist. Order defines previous/next navigation and display order.
/// Knows nothing about playback; the playlist manager routes removals of the
/// playing entry through its stop transition first.
#[derive(Debug, Default)]
pub struct PlaylistStore {
    entries: Vec<MediaEntry>,
    pending_events: Vec<StoreEvent>,
}

impl PlaylistStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry. Returns its index, or `None` if an entry with the
    /// same id is already present.
    pub fn add(&mut self, entry: MediaEntry) -> Option<usize> {
        if self.index_of(entry.id()).is_some() {
            debug!("PlaylistStore: Ignoring duplicate entry id {}", entry.id());
            return None;
        }
        let index = self.entries.len();
        self.entries.push(entry.clone());
        self.pending_events
            .push(StoreEvent::Inserted { index, entry });
        Some(index)
    }

    /// Removes by identity. Missing ids are a no-op.
    pub fn remove(&mut self, id: &str) -> Option<MediaEntry> {
        let index = self.index_of(id)?;
        let removed = self.entries.remove(index);
        self.pending_events.push(StoreEvent::Removed {
            id: removed.id().clone(),
            index,
        });
        Some(removed)
    }

    /// Mutates descriptive fields without touching identity or position.
    /// Returns `false` if the id is unknown.
    pub fn replace_fields_in_place(&mut self, id: &str, patch: &EntryPatch) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let fields = self.entries[index].apply_patch(patch);
        if !fields.is_empty() {
            self.pending_events.push(StoreEvent::Changed {
                index,
                entry: self.entries[index].clone(),
                fields,
            });
        }
        true
    }

    /// Sets the playing flag. Returns `true` only if the flag changed.
    pub fn set_playing(&mut self, id: &str, is_playing: bool) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        if !self.entries[index].set_playing(is_playing) {
            return false;
        }
        self.pending_events.push(StoreEvent::Changed {
            index,
            entry: self.entries[index].clone(),
            fields: vec![EntryField::IsPlaying],
        });
        true
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id() == id)
    }

    pub fn at(&self, index: usize) -> Option<&MediaEntry> {
        self.entries.get(index)
    }

    pub fn get(&self, id: &str) -> Option<&MediaEntry> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[MediaEntry] {
        &self.entries
    }

    pub fn playing_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_playing()).count()
    }

    /// Drains change events accumulated since the last call.
    pub fn take_events(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.pending_events)
    }
}
