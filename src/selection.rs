//! Selection cursor and the Add/Remove/Edit command gate.

use crate::{
    error::PlayerError,
    media_entry::{EntryId, EntryPatch, MediaEntry},
    playlist::PlaylistStore,
};

/// Placeholder data for entries created by the Add command.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntryTemplate {
    pub source_uri: String,
    pub thumbnail_uri: String,
    pub duration_label: String,
}

impl Default for NewEntryTemplate {
    fn default() -> Self {
        Self {
            source_uri: "Media/video1.mp4".to_string(),
            thumbnail_uri: "Thumbnails/video1.jpg".to_string(),
            duration_label: "00:30".to_string(),
        }
    }
}

/// Removal waiting for the user's yes/no answer.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRemoval {
    pub request_id: u64,
    pub entry_id: EntryId,
    pub title: String,
}

/// Tracks the selected entry and guards the commands that need one.
///
/// Selecting never touches playback. The Add counter lives here for the
/// lifetime of the gate and only ever grows.
#[derive(Debug)]
pub struct CommandGate {
    selected: Option<EntryId>,
    new_entry_counter: u64,
    template: NewEntryTemplate,
    pending_removal: Option<PendingRemoval>,
    next_request_id: u64,
}

impl CommandGate {
    pub fn new(template: NewEntryTemplate) -> Self {
        Self {
            selected: None,
            new_entry_counter: 1,
            template,
            pending_removal: None,
            next_request_id: 1,
        }
    }

    pub fn selected(&self) -> Option<&EntryId> {
        self.selected.as_ref()
    }

    pub fn selected_entry<'a>(&self, store: &'a PlaylistStore) -> Option<&'a MediaEntry> {
        self.selected.as_deref().and_then(|id| store.get(id))
    }

    /// Returns `true` if the selection changed.
    pub fn set_selected(&mut self, id: Option<EntryId>) -> bool {
        if self.selected == id {
            return false;
        }
        self.selected = id;
        true
    }

    pub fn can_remove_or_edit(&self) -> bool {
        self.selected.is_some()
    }

    /// Builds the next placeholder entry. The counter only advances through
    /// [`CommandGate::commit_new_entry`] once the store accepted it.
    pub fn build_new_entry(&self) -> MediaEntry {
        MediaEntry::new(
            &format!("New content {}", self.new_entry_counter),
            &self.template.source_uri,
            &self.template.thumbnail_uri,
            &self.template.duration_label,
            "Various",
            "Added statically",
        )
    }

    pub fn commit_new_entry(&mut self) {
        self.new_entry_counter += 1;
    }

    /// Starts a removal of the selected entry. The caller must ask the user
    /// and feed the answer to [`CommandGate::take_confirmed_removal`].
    pub fn begin_removal(&mut self, store: &PlaylistStore) -> Result<PendingRemoval, PlayerError> {
        let entry = self
            .selected_entry(store)
            .ok_or(PlayerError::NoSelection { action: "remove" })?;
        let pending = PendingRemoval {
            request_id: self.next_request_id,
            entry_id: entry.id().clone(),
            title: entry.title().to_string(),
        };
        self.next_request_id += 1;
        self.pending_removal = Some(pending.clone());
        Ok(pending)
    }

    /// Resolves the pending removal. Returns the entry to remove if the
    /// answer is for the current request and was "yes". Answers to older
    /// requests are ignored.
    pub fn take_confirmed_removal(&mut self, request_id: u64, accepted: bool) -> Option<EntryId> {
        match &self.pending_removal {
            Some(pending) if pending.request_id == request_id => {}
            _ => return None,
        }
        let pending = self.pending_removal.take()?;
        accepted.then_some(pending.entry_id)
    }

    /// Fixed transformation applied by the Edit command.
    pub fn edit_patch(entry: &MediaEntry) -> EntryPatch {
        EntryPatch {
            title: Some(format!("{} (edited)", entry.title())),
            artist: Some("Edited statically".to_string()),
            genre: Some("Edited".to_string()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(titles: &[&str]) -> PlaylistStore {
        let mut store = PlaylistStore::new();
        for title in titles {
            store.add(MediaEntry::new(title, "a.mp3", "", "00:10", "", ""));
        }
        store.take_events();
        store
    }

    #[test]
    fn enablement_follows_selection() {
        let store = store_with(&["a"]);
        let mut gate = CommandGate::new(NewEntryTemplate::default());
        assert!(!gate.can_remove_or_edit());

        let id = store.at(0).unwrap().id().clone();
        assert!(gate.set_selected(Some(id.clone())));
        assert!(gate.can_remove_or_edit());
        assert!(!gate.set_selected(Some(id)));

        assert!(gate.set_selected(None));
        assert!(!gate.can_remove_or_edit());
    }

    #[test]
    fn new_entry_titles_follow_committed_counter() {
        let mut gate = CommandGate::new(NewEntryTemplate::default());
        assert_eq!(gate.build_new_entry().title(), "New content 1");
        assert_eq!(gate.build_new_entry().title(), "New content 1");
        gate.commit_new_entry();
        let entry = gate.build_new_entry();
        assert_eq!(entry.title(), "New content 2");
        assert_eq!(entry.source_uri(), "Media/video1.mp4");
        assert_eq!(entry.duration_label(), "00:30");
    }

    #[test]
    fn removal_without_selection_fails() {
        let store = store_with(&["a"]);
        let mut gate = CommandGate::new(NewEntryTemplate::default());
        assert!(matches!(
            gate.begin_removal(&store),
            Err(PlayerError::NoSelection { action: "remove" })
        ));
    }

    #[test]
    fn removal_requires_matching_yes() {
        let store = store_with(&["a"]);
        let mut gate = CommandGate::new(NewEntryTemplate::default());
        let id = store.at(0).unwrap().id().clone();
        gate.set_selected(Some(id.clone()));

        let first = gate.begin_removal(&store).unwrap();
        assert_eq!(first.title, "a");
        assert_eq!(gate.take_confirmed_removal(first.request_id, false), None);
        assert_eq!(gate.take_confirmed_removal(first.request_id, true), None);

        let second = gate.begin_removal(&store).unwrap();
        assert_ne!(first.request_id, second.request_id);
        assert_eq!(gate.take_confirmed_removal(first.request_id, true), None);
        assert_eq!(
            gate.take_confirmed_removal(second.request_id, true),
            Some(id)
        );
    }

    #[test]
    fn edit_patch_marks_title_and_overwrites_metadata() {
        let entry = MediaEntry::new("Ocean Waves", "a.mp3", "", "05:20", "Relaxation", "X");
        let patch = CommandGate::edit_patch(&entry);
        assert_eq!(patch.title.as_deref(), Some("Ocean Waves (edited)"));
        assert_eq!(patch.artist.as_deref(), Some("Edited statically"));
        assert_eq!(patch.genre.as_deref(), Some("Edited"));
        assert!(patch.source_uri.is_none());
    }
}
