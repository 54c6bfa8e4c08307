use log::{debug, error, info, trace, warn};
use tokio::sync::broadcast::{error::RecvError, Receiver, Sender};

use crate::{
    engine::PlaybackEngine,
    error::{panic_payload_to_string, PlayerError},
    media_entry::EntryId,
    playback::{PlaybackSession, TransportState},
    playlist::{PlaylistStore, StoreEvent},
    position_sync::{format_hms, PositionSync},
    protocol::{
        self, EngineMessage, Message, Notice, PlaybackMessage, PlaylistMessage, PositionDisplay,
        ViewMessage,
    },
    selection::CommandGate,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Previous,
    Next,
}

// Owns the playlist, the selection, the playback session and the engine.
// Every bus message is handled to completion before the next one.
pub struct PlaylistManager {
    store: PlaylistStore,
    gate: CommandGate,
    session: PlaybackSession,
    position_sync: PositionSync,
    engine: Box<dyn PlaybackEngine>,
    bus_consumer: Receiver<Message>,
    bus_producer: Sender<Message>,
    repeat_enabled: bool,
    shuffle_enabled: bool,
    last_display: PositionDisplay,
    shutdown_requested: bool,
}

impl PlaylistManager {
    pub fn new(
        store: PlaylistStore,
        gate: CommandGate,
        engine: Box<dyn PlaybackEngine>,
        position_sync: PositionSync,
        bus_consumer: Receiver<Message>,
        bus_producer: Sender<Message>,
    ) -> Self {
        Self {
            store,
            gate,
            session: PlaybackSession::new(),
            position_sync,
            engine,
            bus_consumer,
            bus_producer,
            repeat_enabled: false,
            shuffle_enabled: false,
            last_display: PositionDisplay {
                position_secs: 0.0,
                duration_secs: 0.0,
                current: format_hms(0.0),
                total: format_hms(0.0),
            },
            shutdown_requested: false,
        }
    }

    pub fn run(&mut self) {
        self.store.take_events();
        if self.store.is_empty() {
            info!("PlaylistManager: Starting with an empty playlist");
        } else {
            info!(
                "PlaylistManager: Starting with {} entries",
                self.store.count()
            );
        }
        self.send(Message::Playlist(PlaylistMessage::PlaylistRestored(
            self.store.entries().to_vec(),
        )));
        self.broadcast_selection_changed();
        self.broadcast_transport_changed();
        self.broadcast_modes_changed();
        self.send(Message::Playback(PlaybackMessage::PositionChanged(
            self.last_display.clone(),
        )));

        loop {
            match self.bus_consumer.blocking_recv() {
                Ok(message) => {
                    self.handle_message(message);
                    if self.shutdown_requested {
                        info!("PlaylistManager: Shut down");
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("PlaylistManager: bus lagged, skipped {} messages", skipped);
                }
                Err(RecvError::Closed) => {
                    error!("PlaylistManager: bus closed");
                    break;
                }
            }
        }
    }

    /// Runs the loop. A panic is logged and turned into a `Shutdown`
    /// broadcast.
    pub fn run_guarded(&mut self) {
        let run_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| self.run()));
        if let Err(payload) = run_result {
            error!(
                "PlaylistManager thread terminated due to panic: {}",
                panic_payload_to_string(payload.as_ref())
            );
            self.position_sync.stop();
            let _ = self.bus_producer.send(Message::View(ViewMessage::Shutdown));
        }
    }

    pub fn handle_message(&mut self, message: Message) {
        match message {
            Message::Playlist(PlaylistMessage::AddEntry) => self.add_entry(),
            Message::Playlist(PlaylistMessage::RemoveSelected) => self.request_removal(),
            Message::Playlist(PlaylistMessage::EditSelected) => self.edit_selected(),
            Message::Playlist(PlaylistMessage::SelectEntry(index)) => self.select_entry(index),
            Message::Playlist(PlaylistMessage::ShowSelectedDetails) => {
                self.show_selected_details()
            }
            Message::Playback(PlaybackMessage::PlayEntry(index)) => self.play_entry_at(index),
            Message::Playback(PlaybackMessage::PlayPause) => self.play_pause(),
            Message::Playback(PlaybackMessage::Stop) => self.stop(),
            Message::Playback(PlaybackMessage::Previous) => self.navigate(Direction::Previous),
            Message::Playback(PlaybackMessage::Next) => self.navigate(Direction::Next),
            Message::Playback(PlaybackMessage::SeekTo(seconds)) => self.seek_to(seconds),
            Message::Playback(PlaybackMessage::ToggleRepeat) => {
                self.repeat_enabled = !self.repeat_enabled;
                debug!("PlaylistManager: Repeat {}", self.repeat_enabled);
                self.broadcast_modes_changed();
            }
            Message::Playback(PlaybackMessage::ToggleShuffle) => {
                self.shuffle_enabled = !self.shuffle_enabled;
                debug!("PlaylistManager: Shuffle {}", self.shuffle_enabled);
                self.broadcast_modes_changed();
            }
            Message::Playback(PlaybackMessage::PositionTick { generation }) => {
                self.on_position_tick(generation)
            }
            Message::Engine(EngineMessage::Ready {
                load_id,
                duration_secs,
            }) => self.on_engine_ready(load_id, duration_secs),
            Message::Engine(EngineMessage::Fault { load_id, reason }) => {
                self.on_engine_fault(load_id, reason)
            }
            Message::View(ViewMessage::ConfirmationAnswered {
                request_id,
                accepted,
            }) => self.on_confirmation_answered(request_id, accepted),
            Message::View(ViewMessage::IconLoadFailed { icon, reason }) => {
                self.report(PlayerError::IconLoadFault { icon, reason })
            }
            Message::View(ViewMessage::Shutdown) => self.shutdown(),
            _ => {}
        }
        self.flush_store_events();
        debug_assert!(self.store.playing_count() <= 1);
        debug_assert_eq!(
            self.position_sync.is_active(),
            self.session.transport() == TransportState::Playing
        );
    }

    fn play_entry_at(&mut self, index: usize) {
        let Some(id) = self.store.at(index).map(|entry| entry.id().clone()) else {
            debug!("PlaylistManager: play_entry_at: Index {} out of bounds", index);
            return;
        };
        self.set_selection(Some(id.clone()));
        self.start_playback(id);
    }

    fn start_playback(&mut self, id: EntryId) {
        let Some(entry) = self.store.get(&id) else {
            return;
        };
        let uri = entry.source_uri().to_string();
        let now_playing = entry.to_string();
        if uri.trim().is_empty() {
            self.report(PlayerError::LoadFault {
                uri,
                reason: "entry has no source".to_string(),
            });
            return;
        }

        if let Some(previous) = self.session.current_entry().cloned() {
            if previous != id {
                self.store.set_playing(&previous, false);
            }
        }
        self.store.set_playing(&id, true);

        let load_id = self.session.begin(id);
        debug!("PlaylistManager: Loading {} load_id={}", uri, load_id);
        self.engine.load(load_id, &uri);
        self.engine.play();
        self.position_sync.start();

        self.broadcast_transport_changed();
        self.send(Message::Playback(PlaybackMessage::NowPlayingChanged(Some(
            now_playing,
        ))));
    }

    fn play_pause(&mut self) {
        match self.session.transport() {
            TransportState::Stopped => self.report(PlayerError::NoSourceSelected),
            TransportState::Playing => {
                self.engine.pause();
                self.session.pause();
                self.position_sync.stop();
                debug!(
                    "PlaylistManager: Paused at {:.2}s of {:?}",
                    self.session.last_known_position_secs(),
                    self.session.duration_secs()
                );
                self.broadcast_transport_changed();
            }
            TransportState::Paused => {
                self.engine.play();
                self.session.resume();
                self.position_sync.start();
                self.broadcast_transport_changed();
            }
        }
    }

    fn stop(&mut self) {
        if self.session.transport() == TransportState::Stopped {
            trace!("PlaylistManager: Stop ignored, already stopped");
            return;
        }
        self.engine.stop();
        self.release_session();
    }

    // Unbinds the current entry and resets the display. Shared by Stop,
    // engine faults and shutdown.
    fn release_session(&mut self) {
        if let Some(id) = self.session.clear() {
            self.store.set_playing(&id, false);
        }
        self.position_sync.stop();

        self.last_display.position_secs = 0.0;
        self.last_display.current = format_hms(0.0);
        self.send(Message::Playback(PlaybackMessage::PositionChanged(
            self.last_display.clone(),
        )));
        self.broadcast_transport_changed();
        self.send(Message::Playback(PlaybackMessage::NowPlayingChanged(None)));
    }

    fn navigate(&mut self, direction: Direction) {
        let base = self
            .session
            .current_entry()
            .or(self.gate.selected())
            .and_then(|id| self.store.index_of(id));
        let Some(base) = base else {
            debug!("PlaylistManager: {:?} ignored, nothing to navigate from", direction);
            return;
        };
        let target = match direction {
            Direction::Previous => base.checked_sub(1),
            Direction::Next => Some(base + 1).filter(|index| *index < self.store.count()),
        };
        match target {
            Some(index) => self.play_entry_at(index),
            None => debug!(
                "PlaylistManager: {:?} ignored at index {} of {}",
                direction,
                base,
                self.store.count()
            ),
        }
    }

    fn seek_to(&mut self, seconds: f64) {
        if self.session.current_entry().is_none() {
            trace!("PlaylistManager: Seek ignored, no source loaded");
            return;
        }
        let engine_position = self.engine.position();
        if !self.position_sync.should_seek(seconds, engine_position) {
            trace!(
                "PlaylistManager: Seek to {:.2}s within threshold of {:.2}s",
                seconds,
                engine_position
            );
            return;
        }
        let target = match self.engine.duration() {
            Some(duration) => seconds.max(0.0).min(duration),
            None => seconds.max(0.0),
        };
        debug!("PlaylistManager: Seeking to {:.2}s", target);
        self.engine.set_position(target);
        self.session.record_position(target);
    }

    fn on_position_tick(&mut self, generation: u64) {
        if !self.position_sync.is_current_tick(generation) {
            return;
        }
        if self.session.current_entry().is_none() {
            return;
        }
        let Some(duration_secs) = self.engine.duration() else {
            return;
        };
        let position_secs = self.engine.position();
        self.session.record_position(position_secs);
        self.session.set_duration(Some(duration_secs));

        self.last_display = PositionDisplay {
            position_secs,
            duration_secs,
            current: format_hms(position_secs),
            total: format_hms(duration_secs),
        };
        self.send(Message::Playback(PlaybackMessage::PositionChanged(
            self.last_display.clone(),
        )));
    }

    fn on_engine_ready(&mut self, load_id: u64, duration_secs: Option<f64>) {
        if !self.session.is_current_load(load_id) {
            debug!("PlaylistManager: Ignoring stale ready load_id={}", load_id);
            return;
        }
        info!(
            "PlaylistManager: Source ready load_id={} duration={:?}",
            load_id, duration_secs
        );
        self.session.set_duration(duration_secs);
    }

    fn on_engine_fault(&mut self, load_id: u64, reason: String) {
        if !self.session.is_current_load(load_id) {
            debug!("PlaylistManager: Ignoring stale fault load_id={}", load_id);
            return;
        }
        let uri = self
            .session
            .current_entry()
            .and_then(|id| self.store.get(id))
            .map(|entry| entry.source_uri().to_string())
            .unwrap_or_default();
        self.engine.stop();
        self.release_session();
        self.report(PlayerError::LoadFault { uri, reason });
    }

    fn add_entry(&mut self) {
        let entry = self.gate.build_new_entry();
        let title = entry.title().to_string();
        if self.store.add(entry).is_none() {
            return;
        }
        self.gate.commit_new_entry();
        debug!("PlaylistManager: Added {}", title);
        self.notify(Notice::info("Add", format!("Added: {}", title)));
    }

    fn request_removal(&mut self) {
        match self.gate.begin_removal(&self.store) {
            Ok(pending) => {
                self.send(Message::View(ViewMessage::ConfirmationRequested {
                    request_id: pending.request_id,
                    title: "Confirm removal".to_string(),
                    prompt: format!("Are you sure you want to remove '{}'?", pending.title),
                }));
            }
            Err(e) => self.report(e),
        }
    }

    fn on_confirmation_answered(&mut self, request_id: u64, accepted: bool) {
        let Some(id) = self.gate.take_confirmed_removal(request_id, accepted) else {
            return;
        };
        if self.session.is_current(&id) {
            self.stop();
        }
        let Some(removed) = self.store.remove(&id) else {
            return;
        };
        // A selection made while the prompt was open survives, but its
        // index may have shifted.
        if self.gate.selected() == Some(&id) {
            self.set_selection(None);
        } else if self.gate.selected().is_some() {
            self.broadcast_selection_changed();
        }
        debug!("PlaylistManager: Removed {}", removed.title());
        self.notify(Notice::info(
            "Remove",
            format!("Removed: {}", removed.title()),
        ));
    }

    fn edit_selected(&mut self) {
        let Some(entry) = self.gate.selected_entry(&self.store) else {
            self.report(PlayerError::NoSelection { action: "edit" });
            return;
        };
        let id = entry.id().clone();
        let old_title = entry.title().to_string();
        let patch = CommandGate::edit_patch(entry);
        self.store.replace_fields_in_place(&id, &patch);

        let Some(entry) = self.store.get(&id) else {
            return;
        };
        let new_title = entry.title().to_string();
        let now_playing = entry.to_string();
        if self.session.is_current(&id) {
            self.send(Message::Playback(PlaybackMessage::NowPlayingChanged(Some(
                now_playing,
            ))));
        }
        self.notify(Notice::info(
            "Edit",
            format!("Edited: {} -> {}", old_title, new_title),
        ));
    }

    fn select_entry(&mut self, index: Option<usize>) {
        let id = match index {
            Some(index) => match self.store.at(index) {
                Some(entry) => Some(entry.id().clone()),
                None => {
                    debug!("PlaylistManager: select_entry: Index {} out of bounds", index);
                    return;
                }
            },
            None => None,
        };
        self.set_selection(id);
    }

    fn set_selection(&mut self, id: Option<EntryId>) {
        if self.gate.set_selected(id) {
            self.broadcast_selection_changed();
        }
    }

    fn show_selected_details(&mut self) {
        let Some(entry) = self.gate.selected_entry(&self.store) else {
            self.report(PlayerError::NoSelection {
                action: "show details for",
            });
            return;
        };
        let body = format!(
            "Title: {}\nArtist: {}\nGenre: {}\nDuration: {}\nSource: {}\nThumbnail: {}",
            entry.title(),
            entry.artist(),
            entry.genre(),
            entry.duration_label(),
            entry.source_uri(),
            entry.thumbnail_uri()
        );
        self.notify(Notice::info("Details", body));
    }

    fn shutdown(&mut self) {
        info!("PlaylistManager: Shutdown requested");
        self.engine.stop();
        self.engine.release();
        if self.session.transport() != TransportState::Stopped {
            self.release_session();
        }
        self.position_sync.stop();
        self.shutdown_requested = true;
    }

    fn report(&mut self, error: PlayerError) {
        warn!("PlaylistManager: {}", error);
        self.notify(error.user_notice());
    }

    fn notify(&mut self, notice: Notice) {
        self.send(Message::View(ViewMessage::Notice(notice)));
    }

    fn broadcast_transport_changed(&mut self) {
        let state = self.session.transport();
        self.send(Message::Playback(PlaybackMessage::TransportChanged {
            state,
            icon: state.icon(),
        }));
    }

    fn broadcast_selection_changed(&mut self) {
        let selected_id = self.gate.selected().cloned();
        let selected_index = selected_id
            .as_deref()
            .and_then(|id| self.store.index_of(id));
        self.send(Message::Playlist(PlaylistMessage::SelectionChanged {
            selected_id,
            selected_index,
            can_remove_or_edit: self.gate.can_remove_or_edit(),
        }));
    }

    fn broadcast_modes_changed(&mut self) {
        self.send(Message::Playback(PlaybackMessage::ModesChanged {
            repeat: self.repeat_enabled,
            shuffle: self.shuffle_enabled,
        }));
    }

    // Store changes go out before whatever notification triggered the flush
    // so observers see entry updates in mutation order.
    fn send(&mut self, message: protocol::Message) {
        self.flush_store_events();
        let _ = self.bus_producer.send(message);
    }

    fn flush_store_events(&mut self) {
        for event in self.store.take_events() {
            let message = match event {
                StoreEvent::Inserted { index, entry } => {
                    PlaylistMessage::EntryInserted { index, entry }
                }
                StoreEvent::Removed { id, index } => PlaylistMessage::EntryRemoved { id, index },
                StoreEvent::Changed {
                    index,
                    entry,
                    fields,
                } => PlaylistMessage::EntryChanged {
                    index,
                    entry,
                    fields,
                },
            };
            let _ = self.bus_producer.send(Message::Playlist(message));
        }
    }
}
