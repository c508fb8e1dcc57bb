//! Prefix trie compiled from a key map
//!
//! Every bound sequence is a path from the root; the node reached by its last
//! key is terminal and carries the owning handler name. Sequences that share
//! a prefix share nodes up to the point where they diverge, which keeps the
//! per-keystroke lookup proportional to the tracked sequence length rather
//! than to the number of bindings.
//!
//! ```text
//!   ["Control", "k"] -> palette        (root)
//!   ["Control", "s"] -> save             │ Control
//!   ["F1"]           -> help             ├──────────► ( ) ─ k ─► (palette)
//!                                        │                └ s ─► (save)
//!                                        │ F1
//!                                        └──────────► (help)
//! ```
//!
//! When two handlers bind the exact same sequence, the one registered later
//! in the key map owns it.

use std::collections::HashMap;

use keychord_config::KeyMap;

use crate::error::CompileError;

/// A node of the compiled trie
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrieNode {
    children: HashMap<String, TrieNode>,
    handler: Option<String>,
}

impl TrieNode {
    /// Follow the edge labelled `key`, if any
    pub fn child(&self, key: &str) -> Option<&TrieNode> {
        self.children.get(key)
    }

    /// Handler owning the sequence that ends at this node
    pub fn handler(&self) -> Option<&str> {
        self.handler.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        self.handler.is_some()
    }

    /// Whether any longer sequence continues through this node
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    fn child_or_insert(&mut self, key: &str) -> &mut TrieNode {
        self.children.entry(key.to_string()).or_default()
    }
}

/// Compiled, immutable view of a [`KeyMap`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trie {
    root: TrieNode,
    bindings: usize,
}

impl Trie {
    pub fn root(&self) -> &TrieNode {
        &self.root
    }

    /// Number of distinct sequences with a terminal handler
    pub fn len(&self) -> usize {
        self.bindings
    }

    pub fn is_empty(&self) -> bool {
        self.bindings == 0
    }
}

/// Compile a key map into a prefix trie.
///
/// Rejects empty handler names, handlers without sequences, empty sequences
/// and empty key identifiers. Handlers are visited in registration order, so
/// a sequence bound by several handlers ends up owned by the last of them.
pub fn compile(key_map: &KeyMap) -> Result<Trie, CompileError> {
    let mut trie = Trie::default();

    for binding in key_map {
        if binding.handler.is_empty() {
            return Err(CompileError::EmptyHandler);
        }
        if binding.sequences.is_empty() {
            return Err(CompileError::NoSequences {
                handler: binding.handler.clone(),
            });
        }

        for sequence in &binding.sequences {
            if sequence.is_empty() {
                return Err(CompileError::EmptySequence {
                    handler: binding.handler.clone(),
                });
            }

            let mut node = &mut trie.root;
            for (position, key) in sequence.iter().enumerate() {
                if key.is_empty() {
                    return Err(CompileError::EmptyKey {
                        handler: binding.handler.clone(),
                        position,
                    });
                }
                node = node.child_or_insert(key);
            }

            match node.handler.replace(binding.handler.clone()) {
                None => trie.bindings += 1,
                Some(previous) if previous == binding.handler => {
                    tracing::debug!(
                        "Sequence {:?} bound twice to '{}'",
                        sequence,
                        binding.handler
                    );
                }
                Some(previous) => {
                    tracing::warn!(
                        "Sequence {:?} of '{}' overrides the same sequence of '{}'",
                        sequence,
                        binding.handler,
                        previous
                    );
                }
            }
        }
    }

    tracing::debug!(
        "Compiled {} binding(s) from {} handler(s)",
        trie.bindings,
        key_map.len()
    );

    Ok(trie)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    fn walk<'a>(trie: &'a Trie, keys: &[&str]) -> Option<&'a TrieNode> {
        keys.iter().try_fold(trie.root(), |node, key| node.child(key))
    }

    #[test]
    fn test_compile_empty_key_map() {
        let trie = compile(&KeyMap::new()).unwrap();
        assert!(trie.is_empty());
        assert!(!trie.root().has_children());
        assert!(!trie.root().is_terminal());
    }

    #[test]
    fn test_compile_single_sequence() {
        let mut key_map = KeyMap::new();
        key_map.bind("save", ["Control", "s"]);

        let trie = compile(&key_map).unwrap();
        assert_eq!(trie.len(), 1);

        let control = walk(&trie, &["Control"]).expect("Control edge");
        assert!(!control.is_terminal());
        assert!(control.has_children());

        let s = walk(&trie, &["Control", "s"]).expect("Control s path");
        assert_eq!(s.handler(), Some("save"));
        assert!(!s.has_children());
    }

    #[test]
    fn test_shared_prefix_shares_nodes() {
        let mut key_map = KeyMap::new();
        key_map.bind("h1", ["a", "b"]);
        key_map.bind("h2", ["a", "c"]);

        let trie = compile(&key_map).unwrap();
        assert_eq!(trie.len(), 2);
        assert_eq!(trie.root().children.len(), 1, "both sequences share 'a'");

        let a = walk(&trie, &["a"]).unwrap();
        assert_eq!(a.children.len(), 2);
        assert_eq!(a.child("b").and_then(TrieNode::handler), Some("h1"));
        assert_eq!(a.child("c").and_then(TrieNode::handler), Some("h2"));
    }

    #[test]
    fn test_alternative_sequences_for_one_handler() {
        let mut key_map = KeyMap::new();
        key_map.bind("palette", ["Control", "k"]);
        key_map.bind("palette", ["F1"]);

        let trie = compile(&key_map).unwrap();
        assert_eq!(trie.len(), 2);
        assert_eq!(walk(&trie, &["F1"]).and_then(TrieNode::handler), Some("palette"));
        assert_eq!(
            walk(&trie, &["Control", "k"]).and_then(TrieNode::handler),
            Some("palette")
        );
    }

    #[test]
    fn test_duplicate_sequence_last_registration_wins() {
        let mut key_map = KeyMap::new();
        key_map.bind("first", ["Control", "x"]);
        key_map.bind("second", ["Control", "x"]);

        let trie = compile(&key_map).unwrap();
        assert_eq!(trie.len(), 1, "duplicate sequence is a single binding");
        assert_eq!(
            walk(&trie, &["Control", "x"]).and_then(TrieNode::handler),
            Some("second")
        );

        // Reversing registration order flips the owner
        let mut reversed = KeyMap::new();
        reversed.bind("second", ["Control", "x"]);
        reversed.bind("first", ["Control", "x"]);

        let trie = compile(&reversed).unwrap();
        assert_eq!(
            walk(&trie, &["Control", "x"]).and_then(TrieNode::handler),
            Some("first")
        );
    }

    #[test]
    fn test_same_sequence_twice_for_same_handler() {
        let mut key_map = KeyMap::new();
        key_map.bind("save", ["Control", "s"]);
        key_map.bind("save", ["Control", "s"]);

        let trie = compile(&key_map).unwrap();
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn test_prefix_and_longer_sequence_coexist() {
        let mut key_map = KeyMap::new();
        key_map.bind("short", ["g"]);
        key_map.bind("long", ["g", "g"]);

        let trie = compile(&key_map).unwrap();
        let g = walk(&trie, &["g"]).unwrap();
        assert_eq!(g.handler(), Some("short"));
        assert!(g.has_children());
        assert_eq!(g.child("g").and_then(TrieNode::handler), Some("long"));
    }

    #[test]
    fn test_reject_empty_sequence() {
        let mut key_map = KeyMap::new();
        key_map.bind("save", ["Control", "s"]);
        key_map.insert("broken", vec![Vec::new()]);

        assert_eq!(
            compile(&key_map),
            Err(CompileError::EmptySequence {
                handler: "broken".to_string()
            })
        );
    }

    #[test]
    fn test_reject_handler_without_sequences() {
        let mut key_map = KeyMap::new();
        key_map.insert("idle", Vec::new());

        assert_eq!(
            compile(&key_map),
            Err(CompileError::NoSequences {
                handler: "idle".to_string()
            })
        );
    }

    #[test]
    fn test_reject_empty_key() {
        let mut key_map = KeyMap::new();
        key_map.insert("save", vec![seq(&["Control", ""])]);

        assert_eq!(
            compile(&key_map),
            Err(CompileError::EmptyKey {
                handler: "save".to_string(),
                position: 1
            })
        );
    }

    #[test]
    fn test_reject_empty_handler() {
        let mut key_map = KeyMap::new();
        key_map.bind("", ["a"]);

        assert_eq!(compile(&key_map), Err(CompileError::EmptyHandler));
    }

    #[test]
    fn test_compile_is_deterministic() {
        let mut key_map = KeyMap::new();
        key_map.bind("palette", ["Control", "k", "p"]);
        key_map.bind("save", ["Control", "s"]);
        key_map.bind("help", ["F1"]);
        key_map.bind("palette", ["F2"]);

        assert_eq!(compile(&key_map).unwrap(), compile(&key_map).unwrap());
        assert_eq!(compile(&key_map).unwrap(), compile(&key_map.clone()).unwrap());
    }
}
