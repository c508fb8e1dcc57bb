//! Boundary between a host's key events and the matching core
//!
//! The [`Binder`] owns everything the pure reducer does not: the compiled
//! trie for the current key map, the live [`SequenceState`], the handler
//! callbacks and the prevent-default flag. A host forwards its native
//! key-down, key-up and blur notifications here, one at a time.
//!
//! Dispatch is a plain lookup from the handler name carried by
//! [`Effect::Dispatch`] to a registered callback. A name with no callback is
//! reported as [`Outcome::Unhandled`] and logged rather than treated as an
//! error.

use std::collections::HashMap;
use std::fmt;

use keychord_config::{KeyMap, Settings};

use crate::error::CompileError;
use crate::state::{Effect, Event, SequenceState};
use crate::trie::{compile, Trie};

/// A host key event as seen by the binder
pub trait KeyPayload {
    /// Key identifier, e.g. `"Control"` or `"k"`
    fn key(&self) -> &str;

    /// Suppress the platform's default action for this event
    fn prevent_default(&mut self);
}

/// Minimal key event for hosts without a native event type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    key: String,
    default_prevented: bool,
}

impl KeyPress {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            default_prevented: false,
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

impl KeyPayload for KeyPress {
    fn key(&self) -> &str {
        &self.key
    }

    fn prevent_default(&mut self) {
        self.default_prevented = true;
    }
}

/// What the binder did with an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A sequence completed and its handler was invoked
    Dispatched(String),
    /// A sequence completed but no callback is registered under this name
    Unhandled(String),
    /// Keys are being tracked, waiting for more key-downs
    Tracking,
    /// Nothing is tracked
    Idle,
    /// The tracked sequence was discarded
    Swallowed,
    /// The event carried no key and never reached the state machine
    Rejected,
}

type Callback<'h, P> = Box<dyn FnMut(&P) + 'h>;

/// Tracks key events against a key map and invokes bound handlers.
pub struct Binder<'h, P> {
    key_map: KeyMap,
    trie: Trie,
    settings: Settings,
    state: SequenceState,
    handlers: HashMap<String, Callback<'h, P>>,
}

impl<'h, P: KeyPayload> Binder<'h, P> {
    /// Compile `key_map` and start idle, with no handlers registered.
    pub fn new(key_map: KeyMap, settings: Settings) -> Result<Self, CompileError> {
        let trie = compile(&key_map)?;
        Ok(Self {
            key_map,
            trie,
            settings,
            state: SequenceState::new(),
            handlers: HashMap::new(),
        })
    }

    /// Register the callback invoked when a sequence bound to `handler`
    /// completes. Replaces any previous callback for that name.
    pub fn on<F>(&mut self, handler: impl Into<String>, callback: F) -> &mut Self
    where
        F: FnMut(&P) + 'h,
    {
        self.handlers.insert(handler.into(), Box::new(callback));
        self
    }

    /// Remove the callback for `handler`, returning whether one existed.
    pub fn off(&mut self, handler: &str) -> bool {
        self.handlers.remove(handler).is_some()
    }

    pub fn has_handler(&self, handler: &str) -> bool {
        self.handlers.contains_key(handler)
    }

    /// Handlers named in the key map that have no registered callback
    pub fn missing_handlers(&self) -> Vec<&str> {
        self.key_map
            .handlers()
            .filter(|h| !self.handlers.contains_key(*h))
            .collect()
    }

    /// Install a new key map.
    ///
    /// The trie is only recompiled when `key_map` differs from the current
    /// one; returns whether that happened. On error the previous key map and
    /// trie stay in effect. The tracked sequence is kept either way.
    pub fn set_key_map(&mut self, key_map: KeyMap) -> Result<bool, CompileError> {
        if key_map == self.key_map {
            return Ok(false);
        }

        self.trie = compile(&key_map)?;
        self.key_map = key_map;
        tracing::debug!("Installed key map with {} binding(s)", self.trie.len());
        Ok(true)
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn key_map(&self) -> &KeyMap {
        &self.key_map
    }

    pub fn trie(&self) -> &Trie {
        &self.trie
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &SequenceState {
        &self.state
    }

    /// Handle a native key-down.
    pub fn key_down(&mut self, payload: &mut P) -> Outcome {
        if payload.key().is_empty() {
            tracing::trace!("Rejected key-down without a key");
            return Outcome::Rejected;
        }

        let event = Event::KeyDown(payload.key().to_string());
        match self.state.apply(&event, &self.trie, &self.settings) {
            Some(Effect::Dispatch { handler }) => self.invoke(handler, payload),
            None => self.resting_outcome(),
        }
    }

    /// Handle a native key-up.
    pub fn key_up(&mut self, payload: &P) -> Outcome {
        if payload.key().is_empty() {
            tracing::trace!("Rejected key-up without a key");
            return Outcome::Rejected;
        }

        let was_tracking = self.state.is_tracking();
        let event = Event::KeyUp(payload.key().to_string());
        self.state.apply(&event, &self.trie, &self.settings);

        if was_tracking && self.state.is_idle() {
            Outcome::Swallowed
        } else {
            self.resting_outcome()
        }
    }

    /// Discard the tracked sequence.
    pub fn swallow(&mut self) -> Outcome {
        self.state.apply(&Event::Swallow, &self.trie, &self.settings);
        Outcome::Swallowed
    }

    /// The bound element lost focus.
    pub fn blur(&mut self) -> Outcome {
        tracing::trace!("Element blur");
        self.swallow()
    }

    /// The whole window lost focus.
    pub fn window_blur(&mut self) -> Outcome {
        tracing::trace!("Window blur");
        self.swallow()
    }

    /// Route a generic [`Event`], using `payload` for key events.
    ///
    /// The payload's key is what gets tracked; the key carried by `event`
    /// only selects the kind.
    pub fn dispatch(&mut self, event: &Event, payload: &mut P) -> Outcome {
        match event {
            Event::KeyDown(_) => self.key_down(payload),
            Event::KeyUp(_) => self.key_up(payload),
            Event::Swallow => self.swallow(),
        }
    }

    fn invoke(&mut self, handler: String, payload: &mut P) -> Outcome {
        match self.handlers.get_mut(&handler) {
            Some(callback) => {
                if self.settings.prevent_default {
                    payload.prevent_default();
                }
                tracing::debug!("Dispatching '{}'", handler);
                callback(&*payload);
                Outcome::Dispatched(handler)
            }
            None => {
                tracing::warn!("No handler registered for '{}'", handler);
                Outcome::Unhandled(handler)
            }
        }
    }

    fn resting_outcome(&self) -> Outcome {
        if self.state.is_tracking() {
            Outcome::Tracking
        } else {
            Outcome::Idle
        }
    }
}

impl<P> fmt::Debug for Binder<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut handlers: Vec<_> = self.handlers.keys().collect();
        handlers.sort();
        f.debug_struct("Binder")
            .field("key_map", &self.key_map)
            .field("settings", &self.settings)
            .field("state", &self.state)
            .field("handlers", &handlers)
            .finish()
    }
}
