//! Error types for key map compilation and event parsing

use miette::Diagnostic;
use thiserror::Error;

/// A key map that cannot be compiled into a trie
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum CompileError {
    #[error("Handler name must not be empty")]
    #[diagnostic(code(keychord::compile::empty_handler))]
    EmptyHandler,

    /// The handler has an entry in the key map but no sequence at all
    #[error("Handler '{handler}' is not bound to any key sequence")]
    #[diagnostic(code(keychord::compile::no_sequences))]
    NoSequences { handler: String },

    /// A sequence without keys would register a terminal at the trie root
    #[error("Handler '{handler}' is bound to an empty key sequence")]
    #[diagnostic(code(keychord::compile::empty_sequence))]
    EmptySequence { handler: String },

    #[error("Handler '{handler}' has an empty key identifier at position {position}")]
    #[diagnostic(code(keychord::compile::empty_key))]
    EmptyKey { handler: String, position: usize },
}

/// A line of an event script that does not describe an event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventParseError {
    #[error("empty event")]
    Empty,

    #[error("unknown event kind '{0}' (expected down, up, swallow, blur or window-blur)")]
    UnknownKind(String),

    #[error("'{0}' event requires a key")]
    MissingKey(String),

    #[error("'{kind}' event takes no arguments, got '{rest}'")]
    UnexpectedArgument { kind: String, rest: String },
}
