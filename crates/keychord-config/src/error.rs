use miette::{Diagnostic, LabeledSpan};
use thiserror::Error;

/// Source location of an offending config item (line and column are 1-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
    pub len: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize, offset: usize, len: usize) -> Self {
        Self {
            line,
            column,
            offset,
            len,
        }
    }
}

/// A key argument in a keymap block that is not a usable key identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidKeyInfo {
    /// Handler the sequence belongs to
    pub handler: String,
    /// Rendered value of the rejected entry
    pub key: String,
    pub reason: &'static str,
    pub location: SourceLocation,
}

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("Failed to parse KDL")]
    #[diagnostic(code(keychord::config::parse_error))]
    ParseError {
        #[source_code]
        src: String,
        #[label("here")]
        span: miette::SourceSpan,
        #[source]
        source: kdl::KdlError,
    },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(keychord::config::invalid))]
    Invalid { message: String },

    #[error("Handler '{handler}' is bound to an empty key sequence")]
    #[diagnostic(
        code(keychord::config::empty_sequence),
        help("list the keys of the sequence as arguments, e.g. `save \"Control\" \"s\"`")
    )]
    EmptySequence {
        #[source_code]
        src: String,
        #[label("no keys")]
        span: miette::SourceSpan,
        handler: String,
    },

    #[error("Found {} invalid key(s) in keymap", .invalid_keys.len())]
    #[diagnostic(
        code(keychord::config::invalid_keys),
        help("key identifiers must be non-empty strings, e.g. \"Control\" or \"k\"")
    )]
    InvalidKeys {
        #[source_code]
        src: String,
        #[label(collection)]
        labels: Vec<LabeledSpan>,
        invalid_keys: Vec<InvalidKeyInfo>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub(crate) fn invalid_keys(src: &str, invalid_keys: Vec<InvalidKeyInfo>) -> Self {
        let labels = invalid_keys
            .iter()
            .map(|info| {
                LabeledSpan::new(
                    Some(format!("{} ({})", info.reason, info.handler)),
                    info.location.offset,
                    info.location.len,
                )
            })
            .collect();

        ConfigError::InvalidKeys {
            src: src.to_string(),
            labels,
            invalid_keys,
        }
    }
}
