use std::{
    collections::HashMap,
    path::Path,
    time::{Duration, Instant},
};

use log::{debug, info, warn};
use tokio::sync::broadcast::Sender;

use crate::{
    media_entry::MediaEntry,
    protocol::{EngineMessage, Message},
};

/// External playback capability. Only the playlist manager talks to it.
///
/// `load` is fire-and-forget: the engine answers later with
/// `EngineMessage::Ready` or `EngineMessage::Fault` carrying the same
/// `load_id`.
pub trait PlaybackEngine: Send {
    fn load(&mut self, load_id: u64, uri: &str);
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    /// Drops the loaded source. Called once at shutdown.
    fn release(&mut self);
    fn position(&self) -> f64;
    fn set_position(&mut self, seconds: f64);
    fn duration(&self) -> Option<f64>;
}

struct LoadedSource {
    uri: String,
    duration: Option<Duration>,
}

/// Engine that plays nothing and keeps time with a monotonic clock.
/// Durations come from a catalog of entry duration labels.
pub struct ClockEngine {
    bus_sender: Sender<Message>,
    catalog: HashMap<String, Duration>,
    source: Option<LoadedSource>,
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl ClockEngine {
    pub fn new(bus_sender: Sender<Message>) -> Self {
        Self {
            bus_sender,
            catalog: HashMap::new(),
            source: None,
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn with_catalog<'a>(
        bus_sender: Sender<Message>,
        entries: impl IntoIterator<Item = &'a MediaEntry>,
    ) -> Self {
        let mut engine = Self::new(bus_sender);
        for entry in entries {
            engine.register(entry.source_uri(), entry.duration_label());
        }
        engine
    }

    /// First registration of a uri wins.
    pub fn register(&mut self, uri: &str, duration_label: &str) {
        match parse_duration_label(duration_label) {
            Some(duration) => {
                self.catalog.entry(uri.to_string()).or_insert(duration);
            }
            None => debug!(
                "ClockEngine: Unparseable duration label '{}' for {}",
                duration_label, uri
            ),
        }
    }

    fn current_position(&self) -> Duration {
        let position = match self.start_time {
            Some(start) => self.elapsed + start.elapsed(),
            None => self.elapsed,
        };
        match self.source.as_ref().and_then(|source| source.duration) {
            Some(duration) => position.min(duration),
            None => position,
        }
    }
}

impl PlaybackEngine for ClockEngine {
    fn load(&mut self, load_id: u64, uri: &str) {
        self.start_time = None;
        self.elapsed = Duration::ZERO;
        self.source = None;

        let duration = self.catalog.get(uri).copied();
        if duration.is_none() && !Path::new(uri).exists() {
            warn!("ClockEngine: Source not found: {}", uri);
            let _ = self.bus_sender.send(Message::Engine(EngineMessage::Fault {
                load_id,
                reason: "source not found".to_string(),
            }));
            return;
        }

        info!("ClockEngine: Loaded {} duration={:?}", uri, duration);
        self.source = Some(LoadedSource {
            uri: uri.to_string(),
            duration,
        });
        let _ = self.bus_sender.send(Message::Engine(EngineMessage::Ready {
            load_id,
            duration_secs: duration.map(|d| d.as_secs_f64()),
        }));
    }

    fn play(&mut self) {
        if self.source.is_some() && self.start_time.is_none() {
            self.start_time = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        self.elapsed = self.current_position();
        self.start_time = None;
    }

    fn stop(&mut self) {
        self.start_time = None;
        self.elapsed = Duration::ZERO;
    }

    fn release(&mut self) {
        self.stop();
        if let Some(source) = self.source.take() {
            debug!("ClockEngine: Released {}", source.uri);
        }
    }

    fn position(&self) -> f64 {
        self.current_position().as_secs_f64()
    }

    fn set_position(&mut self, seconds: f64) {
        if self.source.is_none() {
            return;
        }
        let mut target_secs = seconds.max(0.0);
        if let Some(duration) = self.source.as_ref().and_then(|source| source.duration) {
            target_secs = target_secs.min(duration.as_secs_f64());
        }
        let target = match Duration::try_from_secs_f64(target_secs) {
            Ok(target) => target,
            Err(e) => {
                warn!("ClockEngine: Ignoring seek to {}s: {}", seconds, e);
                return;
            }
        };
        self.elapsed = target;
        if self.start_time.is_some() {
            self.start_time = Some(Instant::now());
        }
    }

    fn duration(&self) -> Option<f64> {
        self.source
            .as_ref()
            .and_then(|source| source.duration)
            .map(|duration| duration.as_secs_f64())
    }
}

/// Parses `MM:SS` or `HH:MM:SS`.
pub fn parse_duration_label(label: &str) -> Option<Duration> {
    let parts: Vec<u64> = label
        .trim()
        .split(':')
        .map(|part| part.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;
    let seconds = match parts.as_slice() {
        [minutes, seconds] if *seconds < 60 => minutes * 60 + seconds,
        [hours, minutes, seconds] if *minutes < 60 && *seconds < 60 => {
            hours * 3600 + minutes * 60 + seconds
        }
        _ => return None,
    };
    Some(Duration::from_secs(seconds))
}
