//! Sequence lookup against a compiled trie

use crate::trie::{Trie, TrieNode};

/// Where a tracked sequence lands in the trie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'t> {
    /// The sequence ends exactly on a terminal node
    Complete(&'t str),
    /// The sequence is a strict prefix of at least one binding
    Partial,
    /// No binding starts with this sequence
    Dead,
}

impl<'t> Lookup<'t> {
    pub fn handler(self) -> Option<&'t str> {
        match self {
            Lookup::Complete(handler) => Some(handler),
            Lookup::Partial | Lookup::Dead => None,
        }
    }
}

fn walk<'t, K: AsRef<str>>(sequence: &[K], trie: &'t Trie) -> Option<&'t TrieNode> {
    let mut node = trie.root();
    for key in sequence {
        node = node.child(key.as_ref())?;
    }
    Some(node)
}

/// Walk `sequence` from the root of `trie`.
///
/// Stops at the first key without a matching edge. An empty sequence is a
/// prefix of everything and reports [`Lookup::Partial`].
pub fn lookup<'t, K: AsRef<str>>(sequence: &[K], trie: &'t Trie) -> Lookup<'t> {
    match walk(sequence, trie) {
        None => Lookup::Dead,
        Some(node) => match node.handler() {
            Some(handler) => Lookup::Complete(handler),
            None => Lookup::Partial,
        },
    }
}

/// Handler bound to exactly `sequence`, if any.
pub fn find_handler<'t, K: AsRef<str>>(sequence: &[K], trie: &'t Trie) -> Option<&'t str> {
    lookup(sequence, trie).handler()
}

/// Handler that fires instead of `handler` when `sequence` is typed.
///
/// A sequence is shadowed when one of its strict prefixes is itself bound
/// (matching fires as soon as that prefix completes), or when a later
/// registration took the exact sequence over.
pub fn shadowed_by<'t, K: AsRef<str>>(
    sequence: &[K],
    trie: &'t Trie,
    handler: &str,
) -> Option<&'t str> {
    let mut node = trie.root();
    for (i, key) in sequence.iter().enumerate() {
        node = node.child(key.as_ref())?;
        let last = i + 1 == sequence.len();
        match node.handler() {
            Some(owner) if !last => return Some(owner),
            Some(owner) if owner != handler => return Some(owner),
            _ => {}
        }
    }
    None
}
