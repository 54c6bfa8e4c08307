//! Event-bus protocol shared by all runtime components.
//!
//! This module defines all message payloads exchanged between the playlist
//! manager, the playback engine, the position ticker and the UI.

use crate::{
    media_entry::{EntryField, EntryId, MediaEntry},
    playback::{PlayPauseIcon, TransportState},
};

/// Top-level envelope for all bus traffic.
#[derive(Debug, Clone)]
pub enum Message {
    Playlist(PlaylistMessage),
    Playback(PlaybackMessage),
    Engine(EngineMessage),
    View(ViewMessage),
}

/// Playlist and selection commands and notifications.
#[derive(Debug, Clone)]
pub enum PlaylistMessage {
    AddEntry,
    RemoveSelected,
    EditSelected,
    /// `None` clears the selection.
    SelectEntry(Option<usize>),
    ShowSelectedDetails,
    PlaylistRestored(Vec<MediaEntry>),
    EntryInserted {
        index: usize,
        entry: MediaEntry,
    },
    EntryRemoved {
        id: EntryId,
        index: usize,
    },
    EntryChanged {
        index: usize,
        entry: MediaEntry,
        fields: Vec<EntryField>,
    },
    SelectionChanged {
        selected_id: Option<EntryId>,
        selected_index: Option<usize>,
        can_remove_or_edit: bool,
    },
}

/// Transport commands, position ticks and playback notifications.
#[derive(Debug, Clone)]
pub enum PlaybackMessage {
    /// Play the entry at this playlist index (row activation).
    PlayEntry(usize),
    PlayPause,
    Stop,
    Previous,
    Next,
    /// User moved the seek control to this many seconds.
    SeekTo(f64),
    ToggleRepeat,
    ToggleShuffle,
    PositionTick {
        generation: u64,
    },
    TransportChanged {
        state: TransportState,
        icon: PlayPauseIcon,
    },
    /// `"{title} - {artist}"` of the current entry, `None` when stopped.
    NowPlayingChanged(Option<String>),
    PositionChanged(PositionDisplay),
    ModesChanged {
        repeat: bool,
        shuffle: bool,
    },
}

/// Asynchronous engine callbacks. `load_id` ties them to one `load` call.
#[derive(Debug, Clone)]
pub enum EngineMessage {
    Ready {
        load_id: u64,
        duration_secs: Option<f64>,
    },
    Fault {
        load_id: u64,
        reason: String,
    },
}

/// Notification surface and other view-originated events.
#[derive(Debug, Clone)]
pub enum ViewMessage {
    Notice(Notice),
    ConfirmationRequested {
        request_id: u64,
        title: String,
        prompt: String,
    },
    ConfirmationAnswered {
        request_id: u64,
        accepted: bool,
    },
    IconLoadFailed {
        icon: String,
        reason: String,
    },
    Shutdown,
}

/// Seek-bar and time-label values for one position update.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionDisplay {
    /// Seek-bar value.
    pub position_secs: f64,
    /// Seek-bar maximum.
    pub duration_secs: f64,
    /// Current time as `HH:MM:SS`.
    pub current: String,
    /// Total time as `HH:MM:SS`.
    pub total: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSeverity {
    Info,
    Warning,
    Error,
}

/// User-visible, non-blocking message.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub severity: NoticeSeverity,
    pub title: String,
    pub body: String,
}

impl Notice {
    pub fn info(title: &str, body: String) -> Self {
        Self {
            severity: NoticeSeverity::Info,
            title: title.to_string(),
            body,
        }
    }
}
