use std::fmt;

use uuid::Uuid;

/// Stable identity of a playlist entry. Never reused or reassigned.
pub type EntryId = String;

/// Mutable fields of a [`MediaEntry`], used in change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryField {
    Title,
    SourceUri,
    ThumbnailUri,
    DurationLabel,
    Genre,
    Artist,
    IsPlaying,
}

/// One playlist item.
///
/// The id is fixed at construction. Descriptive fields and the playing flag
/// change in place through the playlist store so that anything holding the id
/// (selection, playback session, views) stays valid.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaEntry {
    id: EntryId,
    title: String,
    source_uri: String,
    thumbnail_uri: String,
    duration_label: String,
    genre: String,
    artist: String,
    is_playing: bool,
}

impl MediaEntry {
    pub fn new(
        title: &str,
        source_uri: &str,
        thumbnail_uri: &str,
        duration_label: &str,
        genre: &str,
        artist: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            source_uri: source_uri.to_string(),
            thumbnail_uri: thumbnail_uri.to_string(),
            duration_label: duration_label.to_string(),
            genre: genre.to_string(),
            artist: artist.to_string(),
            is_playing: false,
        }
    }

    pub fn id(&self) -> &EntryId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn source_uri(&self) -> &str {
        &self.source_uri
    }

    pub fn thumbnail_uri(&self) -> &str {
        &self.thumbnail_uri
    }

    pub fn duration_label(&self) -> &str {
        &self.duration_label
    }

    pub fn genre(&self) -> &str {
        &self.genre
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Returns `true` if the flag actually changed.
    pub(crate) fn set_playing(&mut self, is_playing: bool) -> bool {
        if self.is_playing == is_playing {
            return false;
        }
        self.is_playing = is_playing;
        true
    }

    /// Applies the patch and returns the fields whose value changed.
    pub(crate) fn apply_patch(&mut self, patch: &EntryPatch) -> Vec<EntryField> {
        let mut changed = Vec::new();
        let slots = [
            (&patch.title, &mut self.title, EntryField::Title),
            (&patch.source_uri, &mut self.source_uri, EntryField::SourceUri),
            (
                &patch.thumbnail_uri,
                &mut self.thumbnail_uri,
                EntryField::ThumbnailUri,
            ),
            (
                &patch.duration_label,
                &mut self.duration_label,
                EntryField::DurationLabel,
            ),
            (&patch.genre, &mut self.genre, EntryField::Genre),
            (&patch.artist, &mut self.artist, EntryField::Artist),
        ];
        for (new_value, slot, field) in slots {
            if let Some(value) = new_value {
                if *slot != *value {
                    *slot = value.clone();
                    changed.push(field);
                }
            }
        }
        changed
    }
}

impl fmt::Display for MediaEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.title, self.artist)
    }
}

/// Partial update of descriptive fields. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPatch {
    pub title: Option<String>,
    pub source_uri: Option<String>,
    pub thumbnail_uri: Option<String>,
    pub duration_label: Option<String>,
    pub genre: Option<String>,
    pub artist: Option<String>,
}

/// Playlist shown on first start.
pub fn default_entries() -> Vec<MediaEntry> {
    vec![
        MediaEntry::new(
            "Sunrise Symphony",
            "Media/video1.mp4",
            "Thumbnails/video1.jpg",
            "03:45",
            "Ambient",
            "Nature Sounds Collective",
        ),
        MediaEntry::new(
            "Ocean Waves",
            "Media/audio1.mp3",
            "Thumbnails/audio1.jpg",
            "05:20",
            "Relaxation",
            "Relaxation Masters",
        ),
        MediaEntry::new(
            "Mountain Journey",
            "Media/video2.mp4",
            "Thumbnails/video2.jpg",
            "04:15",
            "Documentary",
            "Travel Films",
        ),
        MediaEntry::new(
            "Piano Meditation",
            "Media/audio2.mp3",
            "Thumbnails/audio2.jpg",
            "06:30",
            "Classical",
            "Classical Piano Ensemble",
        ),
        MediaEntry::new(
            "City Lights",
            "Media/video3.mp4",
            "Thumbnails/video3.jpg",
            "03:55",
            "Urban",
            "Urban Filmmakers",
        ),
    ]
}
