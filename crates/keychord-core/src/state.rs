//! Sequence tracking state machine
//!
//! # States
//!
//! The machine has a single piece of state, the tracked sequence: the keys
//! pressed so far, in press order, that may still complete a binding.
//!
//! ```text
//!                    KeyDown (prefix)
//!                      ┌────────┐
//!                      │        ▼
//!  ┌──────┐  KeyDown  ┌──────────┐
//!  │ IDLE │ ────────► │ TRACKING │
//!  │ [ ]  │ (prefix)  │ [k1..kn] │
//!  └──────┘           └────┬─────┘
//!     ▲                    │
//!     │  KeyDown completing a binding  -> Dispatch(handler)
//!     │  Swallow (element/window blur)
//!     │  KeyUp of a swallow-on-release key (Meta)
//!     └────────────────────┘
//! ```
//!
//! Idle and tracking are both represented by the same [`SequenceState`]
//! value; an empty sequence is idle. There is no terminal state.
//!
//! # Transitions
//!
//! - **KeyDown(key)**: the key is appended and the sequence looked up in the
//!   trie. A complete match emits [`Effect::Dispatch`] and resets to idle. A
//!   strict prefix keeps tracking. A dead path is resolved by the configured
//!   [`DeadPathPolicy`].
//! - **KeyUp(key)**: only observed. Releasing a key listed in
//!   `swallow_on_release` (the meta/command key by default) resets to idle,
//!   since its own key-up may never arrive once the OS has taken focus.
//! - **Swallow**: resets to idle unconditionally.
//!
//! The reducer is pure: [`SequenceState::reduce`] returns the next state and
//! the effect without touching the current one.

use std::fmt;
use std::str::FromStr;

use keychord_config::{DeadPathPolicy, Settings};
use serde::{Deserialize, Serialize};

use crate::error::EventParseError;
use crate::matcher::{lookup, Lookup};
use crate::trie::Trie;

/// A discrete input event fed to the state machine
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "key", rename_all = "kebab-case")]
pub enum Event {
    KeyDown(String),
    KeyUp(String),
    /// Discard the tracked sequence without dispatching anything
    Swallow,
}

impl Event {
    pub fn key(&self) -> Option<&str> {
        match self {
            Event::KeyDown(key) | Event::KeyUp(key) => Some(key),
            Event::Swallow => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::KeyDown(key) => write!(f, "down {}", quote_key(key)),
            Event::KeyUp(key) => write!(f, "up {}", quote_key(key)),
            Event::Swallow => write!(f, "swallow"),
        }
    }
}

fn quote_key(key: &str) -> String {
    if key.trim() != key || key.is_empty() {
        format!("\"{}\"", key)
    } else {
        key.to_string()
    }
}

/// Parse the script form of an event.
///
/// Accepted forms:
/// - `down <key>` / `keydown <key>`
/// - `up <key>` / `keyup <key>`
/// - `swallow`, `blur`, `window-blur`
///
/// The key is the rest of the line. Wrap it in double quotes to keep
/// surrounding whitespace (e.g. `down " "` for the space bar).
impl FromStr for Event {
    type Err = EventParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EventParseError::Empty);
        }

        let (kind, rest) = match s.split_once(char::is_whitespace) {
            Some((kind, rest)) => (kind, rest.trim()),
            None => (s, ""),
        };

        let key = || -> Result<String, EventParseError> {
            let key = rest
                .strip_prefix('"')
                .and_then(|r| r.strip_suffix('"'))
                .unwrap_or(rest);
            if key.is_empty() {
                Err(EventParseError::MissingKey(kind.to_string()))
            } else {
                Ok(key.to_string())
            }
        };

        match kind.to_lowercase().as_str() {
            "down" | "keydown" => Ok(Event::KeyDown(key()?)),
            "up" | "keyup" => Ok(Event::KeyUp(key()?)),
            "swallow" | "blur" | "window-blur" => {
                if rest.is_empty() {
                    Ok(Event::Swallow)
                } else {
                    Err(EventParseError::UnexpectedArgument {
                        kind: kind.to_string(),
                        rest: rest.to_string(),
                    })
                }
            }
            _ => Err(EventParseError::UnknownKind(kind.to_string())),
        }
    }
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// A bound sequence completed; invoke this handler with the key-down
    Dispatch { handler: String },
}

/// Result of reducing one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub state: SequenceState,
    pub effect: Option<Effect>,
}

/// The tracked sequence.
///
/// This is the engine's whole mutable state; it serializes so a host can
/// keep it wherever it keeps the rest of its runtime context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceState {
    sequence: Vec<String>,
}

impl SequenceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently tracked, in press order
    pub fn sequence(&self) -> &[String] {
        &self.sequence
    }

    pub fn is_idle(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn is_tracking(&self) -> bool {
        !self.sequence.is_empty()
    }

    /// Compute the state following `event` without modifying `self`.
    pub fn reduce(&self, event: &Event, trie: &Trie, settings: &Settings) -> Step {
        let mut state = self.clone();
        let effect = state.apply(event, trie, settings);
        Step { state, effect }
    }

    /// Apply `event` in place and return the requested effect, if any.
    pub fn apply(&mut self, event: &Event, trie: &Trie, settings: &Settings) -> Option<Effect> {
        let effect = match event {
            Event::KeyDown(key) => self.key_down(key, trie, settings.dead_path),
            Event::KeyUp(key) => {
                if settings.swallows_on_release(key) {
                    tracing::trace!("Release of '{}' swallows the sequence", key);
                    self.swallow();
                }
                None
            }
            Event::Swallow => {
                self.swallow();
                None
            }
        };

        tracing::trace!(event = %event, sequence = ?self.sequence, "reduced");
        effect
    }

    fn swallow(&mut self) {
        self.sequence.clear();
    }

    fn key_down(&mut self, key: &str, trie: &Trie, dead_path: DeadPathPolicy) -> Option<Effect> {
        self.sequence.push(key.to_string());

        match lookup(&self.sequence, trie) {
            Lookup::Complete(handler) => {
                tracing::debug!("Sequence {:?} completed '{}'", self.sequence, handler);
                let handler = handler.to_string();
                self.sequence.clear();
                Some(Effect::Dispatch { handler })
            }
            Lookup::Partial => None,
            Lookup::Dead => self.resolve_dead_path(key, trie, dead_path),
        }
    }

    fn resolve_dead_path(
        &mut self,
        key: &str,
        trie: &Trie,
        dead_path: DeadPathPolicy,
    ) -> Option<Effect> {
        match dead_path {
            DeadPathPolicy::Retain => None,
            DeadPathPolicy::Reset => {
                self.sequence.clear();
                None
            }
            DeadPathPolicy::Restart => {
                // A lone key that is already dead has nothing to restart from
                let restart = self.sequence.len() > 1;
                self.sequence.clear();
                if !restart {
                    return None;
                }

                self.sequence.push(key.to_string());
                match lookup(&self.sequence, trie) {
                    Lookup::Complete(handler) => {
                        tracing::debug!("Restarted sequence completed '{}'", handler);
                        let handler = handler.to_string();
                        self.sequence.clear();
                        Some(Effect::Dispatch { handler })
                    }
                    Lookup::Partial => None,
                    Lookup::Dead => {
                        self.sequence.clear();
                        None
                    }
                }
            }
        }
    }
}
