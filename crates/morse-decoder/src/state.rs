//! Key state tracking.
//!
//! The key is either up (`Idle`) or held (`PressPending`):
//! - Idle -> PressPending (press)
//! - PressPending -> Idle (release, yields the held interval)
//!
//! A second press while held and a release while up are protocol misuse.
//! They leave the state untouched and are reported to the caller, which
//! ignores them.

use std::fmt;

use morse_core::Timestamp;

/// Whether a press is waiting for its release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyState {
    Idle,
    PressPending,
}

impl fmt::Display for KeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyState::Idle => write!(f, "Idle"),
            KeyState::PressPending => write!(f, "PressPending"),
        }
    }
}

/// A key event that does not fit the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Misuse {
    PressWhilePending,
    ReleaseWithoutPress,
}

impl fmt::Display for Misuse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Misuse::PressWhilePending => write!(f, "press while a press is pending"),
            Misuse::ReleaseWithoutPress => write!(f, "release without a pending press"),
        }
    }
}

/// Result of feeding a press or release to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyOutcome {
    Accepted,
    Ignored(Misuse),
}

impl KeyOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, KeyOutcome::Accepted)
    }
}

/// Pending press and last release timestamps.
#[derive(Debug, Clone, Default)]
pub struct KeyTracker {
    pending_press: Option<Timestamp>,
    last_release: Option<Timestamp>,
}

impl KeyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> KeyState {
        if self.pending_press.is_some() {
            KeyState::PressPending
        } else {
            KeyState::Idle
        }
    }

    pub fn pending_press(&self) -> Option<Timestamp> {
        self.pending_press
    }

    /// Record a press.
    ///
    /// Returns how long the key was up since the previous release, or
    /// `None` for the first press.
    pub fn press(&mut self, at: Timestamp) -> Result<Option<i64>, Misuse> {
        if self.pending_press.is_some() {
            return Err(Misuse::PressWhilePending);
        }
        self.pending_press = Some(at);
        Ok(self.last_release.take().map(|release| at.millis_since(release)))
    }

    /// Record a release, returning how long the key was held.
    pub fn release(&mut self, at: Timestamp) -> Result<i64, Misuse> {
        let press = self.pending_press.take().ok_or(Misuse::ReleaseWithoutPress)?;
        self.last_release = Some(at);
        Ok(at.millis_since(press))
    }
}
