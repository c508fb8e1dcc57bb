//! Key sequence matching engine
//!
//! Recognises strictly ordered key sequences ("chords" such as `Control`
//! then `k`) in a stream of discrete key events:
//!
//! - [`trie`] compiles a [`KeyMap`] into a prefix trie
//! - [`matcher`] looks a tracked sequence up in that trie
//! - [`state`] is the pure reducer over key-down, key-up and swallow events
//! - [`binder`] connects a host's events and callbacks to the reducer
//!
//! ```
//! use keychord_config::{KeyMap, Settings};
//! use keychord_core::{Binder, KeyPress, Outcome};
//!
//! let mut key_map = KeyMap::new();
//! key_map.bind("palette", ["Control", "k"]);
//!
//! let mut opened = 0;
//! let mut binder = Binder::new(key_map, Settings::default()).unwrap();
//! binder.on("palette", |_: &KeyPress| opened += 1);
//!
//! binder.key_down(&mut KeyPress::new("Control"));
//! let outcome = binder.key_down(&mut KeyPress::new("k"));
//! assert_eq!(outcome, Outcome::Dispatched("palette".to_string()));
//! drop(binder);
//! assert_eq!(opened, 1);
//! ```

pub mod binder;
mod error;
pub mod matcher;
pub mod state;
pub mod trie;

pub use binder::{Binder, KeyPayload, KeyPress, Outcome};
pub use error::{CompileError, EventParseError};
pub use keychord_config::{DeadPathPolicy, KeyMap, Settings, META_KEY};
pub use matcher::{find_handler, lookup, shadowed_by, Lookup};
pub use state::{Effect, Event, SequenceState, Step};
pub use trie::{compile, Trie, TrieNode};
