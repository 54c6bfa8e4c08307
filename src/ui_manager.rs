//! Line-oriented console view.
//!
//! The render thread consumes bus notifications and prints them. The input
//! loop parses stdin lines into bus commands. Both share a small
//! [`ViewState`] mirror of what the controller last published; it is only
//! used to resolve console shorthands (current selection, pending
//! confirmation) and to answer `list`/`status` locally.

use std::{
    io::{self, BufRead},
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use log::{debug, error, warn};
use tokio::sync::broadcast::{error::RecvError, Receiver, Sender};

use crate::{
    config::UiConfig,
    media_entry::{EntryField, MediaEntry},
    playback::{PlayPauseIcon, TransportState},
    protocol::{
        Message, NoticeSeverity, PlaybackMessage, PlaylistMessage, PositionDisplay, ViewMessage,
    },
};

const HELP: &str = "\
Commands:
  list | ls            show the playlist
  status               show transport and position
  select <n> | none    select row n (1-based) or clear the selection
  play [n]             play row n, or the selected row
  pp | pause           toggle play/pause
  stop | prev | next
  seek <seconds>
  repeat | shuffle     toggle modes
  add | edit | remove
  info                 details of the selected row
  yes | no             answer a confirmation
  quit";

#[derive(Debug, Default)]
pub struct ViewState {
    rows: Vec<MediaEntry>,
    selected_index: Option<usize>,
    pending_confirmation: Option<u64>,
    transport: TransportState,
    now_playing: Option<String>,
    position: Option<PositionDisplay>,
    repeat: bool,
    shuffle: bool,
}

pub type SharedViewState = Arc<Mutex<ViewState>>;

pub fn lock_view(state: &SharedViewState) -> MutexGuard<'_, ViewState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// What a console line asks for.
#[derive(Debug, Clone)]
pub enum ConsoleCommand {
    Send(Message),
    List,
    Status,
    Help,
    Quit,
}

pub struct UiManager {
    bus_receiver: Receiver<Message>,
    bus_sender: Sender<Message>,
    state: SharedViewState,
    config: UiConfig,
}

impl UiManager {
    pub fn new(
        bus_receiver: Receiver<Message>,
        bus_sender: Sender<Message>,
        state: SharedViewState,
        config: UiConfig,
    ) -> Self {
        Self {
            bus_receiver,
            bus_sender,
            state,
            config,
        }
    }

    pub fn run(&mut self) {
        self.check_icons();
        loop {
            match self.bus_receiver.blocking_recv() {
                Ok(message) => {
                    let shutdown = matches!(message, Message::View(ViewMessage::Shutdown));
                    for line in self.apply(message) {
                        println!("{}", line);
                    }
                    if shutdown {
                        debug!("UiManager: Shut down");
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("UiManager: bus lagged, skipped {} messages", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    // Icons are decorative: a bad path is reported and the text labels are
    // used instead.
    fn check_icons(&self) {
        let icons = [&self.config.play_icon, &self.config.pause_icon];
        for icon in icons.into_iter().flatten() {
            if let Err(e) = std::fs::metadata(Path::new(icon)) {
                warn!("UiManager: Icon {} unavailable: {}", icon, e);
                let _ = self
                    .bus_sender
                    .send(Message::View(ViewMessage::IconLoadFailed {
                        icon: icon.clone(),
                        reason: e.to_string(),
                    }));
            }
        }
    }

    /// Updates the view mirror and returns the lines to print.
    pub fn apply(&mut self, message: Message) -> Vec<String> {
        let mut view = lock_view(&self.state);
        match message {
            Message::Playlist(PlaylistMessage::PlaylistRestored(entries)) => {
                view.rows = entries;
                render_rows(&view)
            }
            Message::Playlist(PlaylistMessage::EntryInserted { index, entry }) => {
                let index = index.min(view.rows.len());
                let line = format!("+ {}", render_row(&view, index, &entry));
                view.rows.insert(index, entry);
                vec![line]
            }
            Message::Playlist(PlaylistMessage::EntryRemoved { index, .. }) => {
                if index >= view.rows.len() {
                    return Vec::new();
                }
                let removed = view.rows.remove(index);
                vec![format!("- {:>3}. {}", index + 1, removed)]
            }
            Message::Playlist(PlaylistMessage::EntryChanged {
                index,
                entry,
                fields,
            }) => {
                let Some(row) = view.rows.get_mut(index) else {
                    return Vec::new();
                };
                *row = entry;
                if fields.iter().all(|field| *field == EntryField::IsPlaying) {
                    return Vec::new();
                }
                let row = view.rows[index].clone();
                vec![format!("~ {}", render_row(&view, index, &row))]
            }
            Message::Playlist(PlaylistMessage::SelectionChanged {
                selected_index,
                can_remove_or_edit,
                ..
            }) => {
                view.selected_index = selected_index;
                let selected =
                    selected_index.and_then(|index| view.rows.get(index).map(|e| (index, e)));
                match (selected, can_remove_or_edit) {
                    (Some((index, entry)), true) => {
                        vec![format!("Selected {}. {}", index + 1, entry)]
                    }
                    _ => vec!["Selection cleared, edit/remove disabled".to_string()],
                }
            }
            Message::Playback(PlaybackMessage::TransportChanged { state, icon }) => {
                view.transport = state;
                vec![format!("{} {:?}", icon_text(icon), state)]
            }
            Message::Playback(PlaybackMessage::NowPlayingChanged(label)) => {
                let line = label.as_ref().map(|label| format!("Now playing: {}", label));
                view.now_playing = label;
                line.into_iter().collect()
            }
            // Ticks arrive twice a second; shown on demand with `status`.
            Message::Playback(PlaybackMessage::PositionChanged(display)) => {
                view.position = Some(display);
                Vec::new()
            }
            Message::Playback(PlaybackMessage::ModesChanged { repeat, shuffle }) => {
                view.repeat = repeat;
                view.shuffle = shuffle;
                vec![format!(
                    "Repeat: {}, Shuffle: {}",
                    on_off(repeat),
                    on_off(shuffle)
                )]
            }
            Message::View(ViewMessage::Notice(notice)) => {
                if notice.severity == NoticeSeverity::Info && !self.config.show_notices {
                    return Vec::new();
                }
                let tag = match notice.severity {
                    NoticeSeverity::Info => "info",
                    NoticeSeverity::Warning => "warning",
                    NoticeSeverity::Error => "error",
                };
                vec![format!("[{}] {}: {}", tag, notice.title, notice.body)]
            }
            Message::View(ViewMessage::ConfirmationRequested {
                request_id,
                title,
                prompt,
            }) => {
                view.pending_confirmation = Some(request_id);
                vec![format!("{}: {} (yes/no)", title, prompt)]
            }
            Message::View(ViewMessage::ConfirmationAnswered { request_id, .. }) => {
                if view.pending_confirmation == Some(request_id) {
                    view.pending_confirmation = None;
                }
                Vec::new()
            }
            Message::View(ViewMessage::Shutdown) => vec!["Bye".to_string()],
            _ => Vec::new(),
        }
    }
}

fn icon_text(icon: PlayPauseIcon) -> &'static str {
    match icon {
        PlayPauseIcon::Play => "[>]",
        PlayPauseIcon::Pause => "[||]",
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

fn render_row(view: &ViewState, index: usize, entry: &MediaEntry) -> String {
    let marker = if entry.is_playing() {
        '>'
    } else if view.selected_index == Some(index) {
        '*'
    } else {
        ' '
    };
    format!(
        "{}{:>3}. {} [{}] {}",
        marker,
        index + 1,
        entry,
        entry.duration_label(),
        entry.genre()
    )
}

pub fn render_rows(view: &ViewState) -> Vec<String> {
    if view.rows.is_empty() {
        return vec!["(playlist is empty)".to_string()];
    }
    view.rows
        .iter()
        .enumerate()
        .map(|(index, entry)| render_row(view, index, entry))
        .collect()
}

pub fn render_status(view: &ViewState) -> String {
    let (current, total) = match &view.position {
        Some(display) => (display.current.as_str(), display.total.as_str()),
        None => ("00:00:00", "00:00:00"),
    };
    format!(
        "{} {:?} {} / {}  {}  (repeat {}, shuffle {})",
        icon_text(view.transport.icon()),
        view.transport,
        current,
        total,
        view.now_playing.as_deref().unwrap_or("-"),
        on_off(view.repeat),
        on_off(view.shuffle)
    )
}

fn parse_row(arg: Option<&str>) -> Result<usize, String> {
    let arg = arg.ok_or_else(|| "missing row number".to_string())?;
    match arg.parse::<usize>() {
        Ok(row) if row >= 1 => Ok(row - 1),
        _ => Err(format!("invalid row '{}'", arg)),
    }
}

/// Parses one console line. `Ok(None)` for blank lines.
pub fn parse_command(line: &str, view: &mut ViewState) -> Result<Option<ConsoleCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return Ok(None);
    };
    let word = word.to_ascii_lowercase();
    let arg = words.next();
    let send = |message: Message| -> Result<Option<ConsoleCommand>, String> {
        Ok(Some(ConsoleCommand::Send(message)))
    };

    match word.as_str() {
        "add" => send(Message::Playlist(PlaylistMessage::AddEntry)),
        "remove" | "rm" => send(Message::Playlist(PlaylistMessage::RemoveSelected)),
        "edit" => send(Message::Playlist(PlaylistMessage::EditSelected)),
        "info" | "details" => send(Message::Playlist(PlaylistMessage::ShowSelectedDetails)),
        "select" | "sel" => match arg {
            Some("none") => send(Message::Playlist(PlaylistMessage::SelectEntry(None))),
            other => {
                let index = parse_row(other)?;
                send(Message::Playlist(PlaylistMessage::SelectEntry(Some(index))))
            }
        },
        "play" => match (arg, view.selected_index) {
            (Some(_), _) => send(Message::Playback(PlaybackMessage::PlayEntry(parse_row(
                arg,
            )?))),
            (None, Some(index)) => send(Message::Playback(PlaybackMessage::PlayEntry(index))),
            (None, None) => send(Message::Playback(PlaybackMessage::PlayPause)),
        },
        "pp" | "pause" | "toggle" => send(Message::Playback(PlaybackMessage::PlayPause)),
        "stop" => send(Message::Playback(PlaybackMessage::Stop)),
        "prev" | "previous" => send(Message::Playback(PlaybackMessage::Previous)),
        "next" => send(Message::Playback(PlaybackMessage::Next)),
        "seek" => {
            let arg = arg.ok_or_else(|| "missing seconds".to_string())?;
            let seconds = arg
                .parse::<f64>()
                .ok()
                .filter(|seconds| seconds.is_finite())
                .ok_or_else(|| format!("invalid seconds '{}'", arg))?;
            send(Message::Playback(PlaybackMessage::SeekTo(seconds)))
        }
        "repeat" => send(Message::Playback(PlaybackMessage::ToggleRepeat)),
        "shuffle" => send(Message::Playback(PlaybackMessage::ToggleShuffle)),
        "yes" | "y" | "no" | "n" => {
            let request_id = view
                .pending_confirmation
                .take()
                .ok_or_else(|| "nothing to confirm".to_string())?;
            send(Message::View(ViewMessage::ConfirmationAnswered {
                request_id,
                accepted: word.starts_with('y'),
            }))
        }
        "list" | "ls" => Ok(Some(ConsoleCommand::List)),
        "status" => Ok(Some(ConsoleCommand::Status)),
        "help" | "?" => Ok(Some(ConsoleCommand::Help)),
        "quit" | "exit" | "q" => Ok(Some(ConsoleCommand::Quit)),
        other => Err(format!("unknown command '{}', try 'help'", other)),
    }
}

/// Reads commands from stdin until `quit` or end of input.
pub fn run_console(bus_sender: &Sender<Message>, state: &SharedViewState) -> io::Result<()> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let command = {
            let mut view = lock_view(state);
            parse_command(&line, &mut view)
        };
        match command {
            Ok(Some(ConsoleCommand::Send(message))) => {
                if bus_sender.send(message).is_err() {
                    error!("UiManager: bus closed, leaving console");
                    break;
                }
            }
            Ok(Some(ConsoleCommand::List)) => {
                for line in render_rows(&lock_view(state)) {
                    println!("{}", line);
                }
            }
            Ok(Some(ConsoleCommand::Status)) => println!("{}", render_status(&lock_view(state))),
            Ok(Some(ConsoleCommand::Help)) => println!("{}", HELP),
            Ok(Some(ConsoleCommand::Quit)) => break,
            Ok(None) => {}
            Err(message) => println!("{}", message),
        }
    }
    Ok(())
}
