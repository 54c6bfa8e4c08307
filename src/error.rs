//! Player error types.

use thiserror::Error;

use crate::protocol::{Notice, NoticeSeverity};

/// Errors raised by the player. Everything except `Config` and `Io` is
/// recovered locally and shown to the user as a notice.
#[derive(Error, Debug)]
pub enum PlayerError {
    /// Play/Pause pressed while no source is loaded.
    #[error("no file selected for playback")]
    NoSourceSelected,

    /// Remove/Edit/Details requested without a selected entry.
    #[error("no entry selected to {action}")]
    NoSelection { action: &'static str },

    /// The engine could not open a source.
    #[error("failed to load '{uri}': {reason}")]
    LoadFault { uri: String, reason: String },

    /// A decorative icon could not be loaded. Never affects transport state.
    #[error("failed to load icon '{icon}': {reason}")]
    IconLoadFault { icon: String, reason: String },

    /// Configuration could not be parsed or written.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error while touching configuration files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlayerError {
    /// Maps the error to a user-visible notice.
    pub fn user_notice(&self) -> Notice {
        let (severity, title) = match self {
            PlayerError::NoSourceSelected => (NoticeSeverity::Info, "No file selected"),
            PlayerError::NoSelection { .. } => (NoticeSeverity::Warning, "Warning"),
            PlayerError::LoadFault { .. } => (NoticeSeverity::Error, "Playback error"),
            PlayerError::IconLoadFault { .. } => (NoticeSeverity::Error, "Icon error"),
            PlayerError::Config(_) | PlayerError::Io(_) => (NoticeSeverity::Error, "Error"),
        };
        Notice {
            severity,
            title: title.to_string(),
            body: self.to_string(),
        }
    }
}

/// Best-effort text of a caught panic payload.
pub fn panic_payload_to_string(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        return (*s).to_string();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    "non-string panic payload".to_string()
}
