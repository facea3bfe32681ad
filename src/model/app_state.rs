//! Application lifecycle states.
//!
//! Transitions are decided outside the core (by whoever writes `appState` into
//! the store); the conversation only reacts to them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state published under the `appState` store key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppState {
    /// Backend is starting; nothing is paginated.
    #[default]
    Loading,
    /// Nobody is typing; history scrolls by on a timer.
    Idle,
    /// Someone is typing; the transcript shows only the live exchange.
    Interaction,
    /// Backend reported an error; pagination stops, the screen stays as is.
    Error,
    /// Shutting down; everything is released.
    Exit,
}

impl AppState {
    /// Lower-case text form stored in the snapshot.
    pub fn as_str(&self) -> &'static str {
        match self {
            AppState::Loading => "loading",
            AppState::Idle => "idle",
            AppState::Interaction => "interaction",
            AppState::Error => "error",
            AppState::Exit => "exit",
        }
    }
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text that does not name an [`AppState`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown app state '{0}'")]
pub struct UnknownAppState(pub String);

impl FromStr for AppState {
    type Err = UnknownAppState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "loading" => Ok(AppState::Loading),
            "idle" => Ok(AppState::Idle),
            "interaction" => Ok(AppState::Interaction),
            "error" => Ok(AppState::Error),
            "exit" => Ok(AppState::Exit),
            other => Err(UnknownAppState(other.to_string())),
        }
    }
}
