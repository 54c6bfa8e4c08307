//! Transport state and the playback session held by the playlist manager.

use log::debug;

use crate::media_entry::EntryId;

/// Transport classification of the playback session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Icon shown on the combined play/pause control.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayPauseIcon {
    Play,
    Pause,
}

impl TransportState {
    /// Derived from the state; never tracked separately.
    pub fn icon(self) -> PlayPauseIcon {
        match self {
            TransportState::Playing => PlayPauseIcon::Pause,
            TransportState::Stopped | TransportState::Paused => PlayPauseIcon::Play,
        }
    }
}

/// Live engine session.
///
/// `current_entry` is a key into the playlist store rather than an owned
/// entry, so it goes stale harmlessly if the entry disappears. It is set
/// exactly when the transport is not `Stopped`.
#[derive(Debug, Default)]
pub struct PlaybackSession {
    transport: TransportState,
    current_entry: Option<EntryId>,
    last_known_position_secs: f64,
    duration_secs: Option<f64>,
    load_id: u64,
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transport(&self) -> TransportState {
        self.transport
    }

    pub fn current_entry(&self) -> Option<&EntryId> {
        self.current_entry.as_ref()
    }

    pub fn is_current(&self, id: &str) -> bool {
        self.current_entry.as_deref() == Some(id)
    }

    pub fn last_known_position_secs(&self) -> f64 {
        self.last_known_position_secs
    }

    pub fn duration_secs(&self) -> Option<f64> {
        self.duration_secs
    }

    /// Binds a new entry and moves to `Playing`. Returns the load id the
    /// engine's readiness/fault callbacks must carry to be accepted.
    pub fn begin(&mut self, id: EntryId) -> u64 {
        self.load_id += 1;
        debug!(
            "PlaybackSession: {:?} -> Playing entry={} load_id={}",
            self.transport, id, self.load_id
        );
        self.current_entry = Some(id);
        self.transport = TransportState::Playing;
        self.last_known_position_secs = 0.0;
        self.duration_secs = None;
        self.load_id
    }

    pub fn is_current_load(&self, load_id: u64) -> bool {
        self.current_entry.is_some() && self.load_id == load_id
    }

    pub fn pause(&mut self) {
        if self.transport == TransportState::Playing {
            debug!("PlaybackSession: Playing -> Paused");
            self.transport = TransportState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.transport == TransportState::Paused {
            debug!("PlaybackSession: Paused -> Playing");
            self.transport = TransportState::Playing;
        }
    }

    /// Moves to `Stopped` and returns the entry that was bound, if any.
    pub fn clear(&mut self) -> Option<EntryId> {
        if self.transport != TransportState::Stopped {
            debug!("PlaybackSession: {:?} -> Stopped", self.transport);
        }
        self.transport = TransportState::Stopped;
        self.last_known_position_secs = 0.0;
        self.duration_secs = None;
        self.current_entry.take()
    }

    pub fn set_duration(&mut self, duration_secs: Option<f64>) {
        self.duration_secs = duration_secs;
    }

    pub fn record_position(&mut self, position_secs: f64) {
        self.last_known_position_secs = position_secs;
    }
}
