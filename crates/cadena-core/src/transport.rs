//! Playback transport state.

use std::fmt;

/// What happens when the player reaches the end of the source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum PlaybackMode {
    /// Start again from the beginning.
    #[default]
    Loop,
    /// Stop at the end.
    Interrupt,
}

impl PlaybackMode {
    /// Returns the other mode.
    pub fn toggled(self) -> Self {
        match self {
            PlaybackMode::Loop => PlaybackMode::Interrupt,
            PlaybackMode::Interrupt => PlaybackMode::Loop,
        }
    }

    /// Returns `true` for [`PlaybackMode::Loop`].
    pub fn is_looping(self) -> bool {
        self == PlaybackMode::Loop
    }
}

impl fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackMode::Loop => f.write_str("loop"),
            PlaybackMode::Interrupt => f.write_str("interrupt"),
        }
    }
}

/// Interactive playback state of a chain.
///
/// `Stopped → Playing` on play; back to `Stopped` on pause, on natural
/// completion in [`PlaybackMode::Interrupt`], on any routing rebuild, and
/// before an offline render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TransportState {
    /// Not playing.
    #[default]
    Stopped,
    /// Playing through the current routing.
    Playing,
}
