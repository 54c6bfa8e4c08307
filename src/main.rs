mod config;
mod engine;
mod error;
mod media_entry;
mod playback;
mod playlist;
mod playlist_manager;
mod position_sync;
mod protocol;
mod selection;
mod ui_manager;

use std::{
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use log::{info, warn};
use tokio::sync::broadcast;

use crate::{
    config::{Config, LogLevel},
    engine::ClockEngine,
    error::panic_payload_to_string,
    playlist::PlaylistStore,
    playlist_manager::PlaylistManager,
    position_sync::{BusTicker, PositionSync},
    protocol::{Message, ViewMessage},
    selection::CommandGate,
    ui_manager::{UiManager, ViewState},
};

const LOG_LEVEL_ENV: &str = "CUEDECK_LOG";

fn load_config() -> Config {
    let Some(path) = config::config_file_path() else {
        warn!("No config directory available, using defaults");
        return Config::default();
    };
    match config::load_or_create(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!(
                "Failed to load config, using defaults. path={} error={}",
                path.display(),
                e
            );
            Config::default()
        }
    }
}

fn effective_log_level(config: &Config) -> LogLevel {
    match std::env::var(LOG_LEVEL_ENV) {
        Ok(value) => LogLevel::parse(&value).unwrap_or_else(|| {
            warn!("Ignoring unknown {}={}", LOG_LEVEL_ENV, value);
            config.logging.level
        }),
        Err(_) => config.logging.level,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Trace);
    clog.init();
    log::set_max_level(log::LevelFilter::Info);

    std::panic::set_hook(Box::new(|panic_info| {
        let current_thread = std::thread::current();
        let thread_name = current_thread.name().unwrap_or("unnamed");
        log::error!("panic in thread '{}': {}", thread_name, panic_info);
    }));

    let config = load_config();
    log::set_max_level(effective_log_level(&config).to_level_filter());

    let (bus_sender, _) = broadcast::channel(1024);

    let mut store = PlaylistStore::new();
    if config.playlist.seed_default_entries {
        for entry in media_entry::default_entries() {
            store.add(entry);
        }
    }
    let template = config.playlist.new_entry_template();

    let mut engine = ClockEngine::with_catalog(bus_sender.clone(), store.entries());
    engine.register(&template.source_uri, &template.duration_label);

    let ticker = BusTicker::new(
        bus_sender.clone(),
        Duration::from_millis(config.playback.tick_interval_ms),
    );
    let position_sync = PositionSync::new(Box::new(ticker), config.playback.seek_threshold_secs);

    // Subscribe before spawning so nothing published at startup is missed.
    let playlist_manager_bus_receiver = bus_sender.subscribe();
    let playlist_manager_bus_sender = bus_sender.clone();
    let ui_manager_bus_receiver = bus_sender.subscribe();
    let ui_manager_bus_sender = bus_sender.clone();
    let view_state = Arc::new(Mutex::new(ViewState::default()));

    let ui_view_state = view_state.clone();
    let ui_config = config.ui.clone();
    let ui_thread = thread::Builder::new()
        .name("ui-manager".to_string())
        .spawn(move || {
            let run_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                let mut ui_manager = UiManager::new(
                    ui_manager_bus_receiver,
                    ui_manager_bus_sender,
                    ui_view_state,
                    ui_config,
                );
                ui_manager.run();
            }));
            if let Err(payload) = run_result {
                log::error!(
                    "UiManager thread terminated due to panic: {}",
                    panic_payload_to_string(payload.as_ref())
                );
            }
        })?;

    let playlist_thread = thread::Builder::new()
        .name("playlist-manager".to_string())
        .spawn(move || {
            let mut playlist_manager = PlaylistManager::new(
                store,
                CommandGate::new(template),
                Box::new(engine),
                position_sync,
                playlist_manager_bus_receiver,
                playlist_manager_bus_sender,
            );
            playlist_manager.run_guarded();
        })?;

    info!("cuedeck started, type 'help' for commands");
    let console_result = ui_manager::run_console(&bus_sender, &view_state);

    let _ = bus_sender.send(Message::View(ViewMessage::Shutdown));
    if playlist_thread.join().is_err() {
        log::error!("PlaylistManager thread panicked");
    }
    if ui_thread.join().is_err() {
        log::error!("UiManager thread panicked");
    }

    console_result?;
    Ok(())
}
