//! Configuration data model

use serde::{Deserialize, Serialize};

/// Key identifier that reports the platform meta/command modifier.
///
/// Its key-up is not reliably delivered (OS-level shortcuts can steal focus
/// before the release arrives), so releasing it swallows the tracked sequence.
pub const META_KEY: &str = "Meta";

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub settings: Settings,
    pub key_map: KeyMap,
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Suppress the originating event's default action on every match
    pub prevent_default: bool,
    /// What to do when a key-down leaves the tracked sequence on a dead path
    pub dead_path: DeadPathPolicy,
    /// Keys whose release discards the tracked sequence
    pub swallow_on_release: Vec<String>,
    pub log_level: LogLevel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prevent_default: false,
            dead_path: DeadPathPolicy::default(),
            swallow_on_release: vec![META_KEY.to_string()],
            log_level: LogLevel::Info,
        }
    }
}

impl Settings {
    /// Whether releasing `key` must swallow the tracked sequence.
    pub fn swallows_on_release(&self, key: &str) -> bool {
        self.swallow_on_release.iter().any(|k| k == key)
    }
}

/// Policy applied when a key-down makes the tracked sequence a dead path,
/// i.e. no longer a prefix of any binding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeadPathPolicy {
    /// Keep the stray key; nothing matches again until the next swallow
    Retain,
    /// Drop the whole sequence, including the stray key
    Reset,
    /// Start a fresh sequence from the stray key alone
    #[default]
    Restart,
}

impl std::str::FromStr for DeadPathPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "retain" => Ok(Self::Retain),
            "reset" => Ok(Self::Reset),
            "restart" => Ok(Self::Restart),
            _ => Err(format!("Unknown dead-path policy: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_filter(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

/// An ordered list of key identifiers that must be pressed in that order
pub type KeySequence = Vec<String>;

/// A handler name together with every sequence bound to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub handler: String,
    pub sequences: Vec<KeySequence>,
}

/// Mapping from handler name to one or more alternative key sequences.
///
/// Entries keep their registration order, which decides which handler owns a
/// sequence bound more than once (the later one).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyMap {
    bindings: Vec<Binding>,
}

impl KeyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `sequence` as an alternative for `handler`.
    ///
    /// A handler seen for the first time is added after all existing ones.
    pub fn bind<H, I, K>(&mut self, handler: H, sequence: I)
    where
        H: Into<String>,
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let handler = handler.into();
        let sequence: KeySequence = sequence.into_iter().map(Into::into).collect();

        match self.bindings.iter_mut().find(|b| b.handler == handler) {
            Some(binding) => binding.sequences.push(sequence),
            None => self.bindings.push(Binding {
                handler,
                sequences: vec![sequence],
            }),
        }
    }

    /// Replace every sequence of `handler`, keeping its position if it was
    /// already registered.
    pub fn insert(&mut self, handler: impl Into<String>, sequences: Vec<KeySequence>) {
        let handler = handler.into();

        match self.bindings.iter_mut().find(|b| b.handler == handler) {
            Some(binding) => binding.sequences = sequences,
            None => self.bindings.push(Binding { handler, sequences }),
        }
    }

    pub fn get(&self, handler: &str) -> Option<&[KeySequence]> {
        self.bindings
            .iter()
            .find(|b| b.handler == handler)
            .map(|b| b.sequences.as_slice())
    }

    /// Bindings in registration order
    pub fn iter(&self) -> std::slice::Iter<'_, Binding> {
        self.bindings.iter()
    }

    pub fn handlers(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|b| b.handler.as_str())
    }

    /// Number of handlers
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Total number of sequences across all handlers
    pub fn sequence_count(&self) -> usize {
        self.bindings.iter().map(|b| b.sequences.len()).sum()
    }
}

impl<'a> IntoIterator for &'a KeyMap {
    type Item = &'a Binding;
    type IntoIter = std::slice::Iter<'a, Binding>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<H: Into<String>> FromIterator<(H, Vec<KeySequence>)> for KeyMap {
    fn from_iter<T: IntoIterator<Item = (H, Vec<KeySequence>)>>(iter: T) -> Self {
        let mut key_map = KeyMap::new();
        for (handler, sequences) in iter {
            key_map.insert(handler, sequences);
        }
        key_map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(keys: &[&str]) -> KeySequence {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_bind_appends_alternatives() {
        let mut key_map = KeyMap::new();
        key_map.bind("palette", ["Control", "k"]);
        key_map.bind("palette", ["F1"]);

        assert_eq!(key_map.len(), 1);
        assert_eq!(
            key_map.get("palette"),
            Some(&[seq(&["Control", "k"]), seq(&["F1"])][..])
        );
    }

    #[test]
    fn test_registration_order_preserved() {
        let mut key_map = KeyMap::new();
        key_map.bind("b", ["b"]);
        key_map.bind("a", ["a"]);
        key_map.bind("c", ["c"]);

        let handlers: Vec<_> = key_map.handlers().collect();
        assert_eq!(handlers, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut key_map = KeyMap::new();
        key_map.bind("first", ["a"]);
        key_map.bind("second", ["b"]);
        key_map.insert("first", vec![seq(&["x", "y"])]);

        let handlers: Vec<_> = key_map.handlers().collect();
        assert_eq!(handlers, vec!["first", "second"]);
        assert_eq!(key_map.get("first"), Some(&[seq(&["x", "y"])][..]));
        assert_eq!(key_map.sequence_count(), 2);
    }

    #[test]
    fn test_from_iterator() {
        let key_map: KeyMap = vec![
            ("save", vec![seq(&["Control", "s"])]),
            ("open", vec![seq(&["Control", "o"]), seq(&["F3"])]),
        ]
        .into_iter()
        .collect();

        assert_eq!(key_map.len(), 2);
        assert_eq!(key_map.sequence_count(), 3);
        assert!(key_map.get("missing").is_none());
    }

    #[test]
    fn test_key_map_equality_tracks_content() {
        let mut a = KeyMap::new();
        a.bind("save", ["Control", "s"]);
        let mut b = a.clone();
        assert_eq!(a, b);

        b.bind("save", ["F2"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_settings_default_swallows_meta() {
        let settings = Settings::default();
        assert!(settings.swallows_on_release(META_KEY));
        assert!(!settings.swallows_on_release("Control"));
        assert!(!settings.prevent_default);
        assert_eq!(settings.dead_path, DeadPathPolicy::Restart);
    }

    #[test]
    fn test_dead_path_policy_from_str() {
        assert_eq!("retain".parse(), Ok(DeadPathPolicy::Retain));
        assert_eq!("RESET".parse(), Ok(DeadPathPolicy::Reset));
        assert_eq!("Restart".parse(), Ok(DeadPathPolicy::Restart));
        assert!("nope".parse::<DeadPathPolicy>().is_err());
    }

    #[test]
    fn test_log_level_from_str() {
        assert_eq!("warning".parse(), Ok(LogLevel::Warn));
        assert_eq!("DEBUG".parse(), Ok(LogLevel::Debug));
        assert_eq!(LogLevel::Trace.as_filter(), "trace");
        assert!("loud".parse::<LogLevel>().is_err());
    }
}
