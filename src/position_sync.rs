//! Periodic engine position polling.
//!
//! The ticker only posts `PositionTick { generation }` onto the bus; the
//! playlist manager does the actual engine read on its own thread. Every
//! start and stop bumps the generation, so a tick that was already queued
//! when the loop stopped is recognized as stale and dropped.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use log::{debug, trace};
use tokio::sync::broadcast::Sender;

use crate::protocol::{Message, PlaybackMessage};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_SEEK_THRESHOLD_SECS: f64 = 1.0;

/// Timer that delivers ticks for one generation until stopped.
pub trait TickScheduler: Send {
    fn start(&mut self, generation: u64);
    fn stop(&mut self);
}

pub struct PositionSync {
    scheduler: Box<dyn TickScheduler>,
    generation: u64,
    active: bool,
    seek_threshold_secs: f64,
}

impl PositionSync {
    pub fn new(scheduler: Box<dyn TickScheduler>, seek_threshold_secs: f64) -> Self {
        Self {
            scheduler,
            generation: 0,
            active: false,
            seek_threshold_secs: seek_threshold_secs.max(0.0),
        }
    }

    /// No-op if already running.
    pub fn start(&mut self) {
        if self.active {
            return;
        }
        self.generation += 1;
        self.active = true;
        debug!("PositionSync: start generation={}", self.generation);
        self.scheduler.start(self.generation);
    }

    /// No-op if already stopped.
    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.generation += 1;
        debug!("PositionSync: stop");
        self.scheduler.stop();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_current_tick(&self, generation: u64) -> bool {
        let current = self.active && generation == self.generation;
        if !current {
            trace!(
                "PositionSync: stale tick generation={} current={}",
                generation,
                self.generation
            );
        }
        current
    }

    /// A seek is only forwarded when the requested value diverges from the
    /// engine by more than the threshold; smaller differences are the loop's
    /// own updates echoing back from the seek control.
    pub fn should_seek(&self, requested_secs: f64, engine_secs: f64) -> bool {
        (requested_secs - engine_secs).abs() > self.seek_threshold_secs
    }
}

/// `HH:MM:SS`, truncating fractional seconds.
pub fn format_hms(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Ticker thread posting onto the bus at a fixed interval.
pub struct BusTicker {
    bus_sender: Sender<Message>,
    interval: Duration,
    running: Option<Arc<AtomicBool>>,
}

impl BusTicker {
    pub fn new(bus_sender: Sender<Message>, interval: Duration) -> Self {
        Self {
            bus_sender,
            interval,
            running: None,
        }
    }
}

impl TickScheduler for BusTicker {
    fn start(&mut self, generation: u64) {
        self.stop();
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();
        let bus_sender = self.bus_sender.clone();
        let interval = self.interval;
        let spawned = thread::Builder::new()
            .name("position-ticker".to_string())
            .spawn(move || loop {
                thread::sleep(interval);
                if !running_clone.load(Ordering::Relaxed) {
                    break;
                }
                if bus_sender
                    .send(Message::Playback(PlaybackMessage::PositionTick {
                        generation,
                    }))
                    .is_err()
                {
                    break;
                }
            });
        if let Err(e) = spawned {
            log::error!("BusTicker: failed to spawn ticker thread: {}", e);
            return;
        }
        self.running = Some(running);
    }

    fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            running.store(false, Ordering::Relaxed);
        }
    }
}

impl Drop for BusTicker {
    fn drop(&mut self) {
        self.stop();
    }
}
