//! KDL configuration parser

use std::path::Path;

use crate::error::{ConfigError, InvalidKeyInfo, SourceLocation};
use crate::model::*;

/// Extract source location from a KDL node's name span
fn get_node_location(node: &kdl::KdlNode, source: &str) -> SourceLocation {
    let span = node.name().span();
    let offset = span.offset();
    let len = span.len();

    let (line, column) = offset_to_line_col(source, offset);

    SourceLocation::new(line, column, offset, len)
}

/// Extract source location from a KDL entry (a key argument)
fn get_entry_location(entry: &kdl::KdlEntry, source: &str) -> SourceLocation {
    let span = entry.span();
    let offset = span.offset();
    let len = span.len();

    let (line, column) = offset_to_line_col(source, offset);

    SourceLocation::new(line, column, offset, len)
}

/// Convert byte offset to line and column (1-indexed)
fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;

    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Parse a configuration file from the given path
pub fn parse_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config_str(&content)
}

/// Parse configuration from a string
pub fn parse_config_str(content: &str) -> Result<Config, ConfigError> {
    let doc: kdl::KdlDocument = content.parse().map_err(|e: kdl::KdlError| {
        // kdl reports spans with its own miette version
        let offset = e.span.offset();
        let len = e.span.len();
        let span = miette::SourceSpan::from((offset, len));
        ConfigError::ParseError {
            src: content.to_string(),
            span,
            source: e,
        }
    })?;

    let mut config = Config::default();

    for node in doc.nodes() {
        match node.name().value() {
            "settings" => {
                config.settings = parse_settings(node)?;
            }
            "keymap" => {
                parse_keymap(node, content, &mut config.key_map)?;
            }
            name => {
                tracing::warn!("Unknown top-level node: {}", name);
            }
        }
    }

    tracing::debug!(
        "Parsed keymap with {} handler(s), {} sequence(s)",
        config.key_map.len(),
        config.key_map.sequence_count()
    );

    Ok(config)
}

fn parse_settings(node: &kdl::KdlNode) -> Result<Settings, ConfigError> {
    let mut settings = Settings::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "prevent-default" => {
                    // A bare `prevent-default` node enables the flag
                    settings.prevent_default = match child.entries().first() {
                        None => true,
                        Some(entry) => entry.value().as_bool().ok_or_else(|| {
                            ConfigError::Invalid {
                                message: format!(
                                    "prevent-default expects true or false, got {}",
                                    entry.value()
                                ),
                            }
                        })?,
                    };
                }
                "dead-path" => {
                    if let Some(val) = first_string(child) {
                        settings.dead_path = val
                            .parse()
                            .map_err(|e| ConfigError::Invalid { message: e })?;
                    }
                }
                "swallow-on-release" => {
                    // An empty node disables the release policy entirely
                    settings.swallow_on_release = child
                        .entries()
                        .iter()
                        .filter_map(|e| e.value().as_string())
                        .filter(|k| !k.is_empty())
                        .map(|k| k.to_string())
                        .collect();
                }
                "log-level" => {
                    if let Some(val) = first_string(child) {
                        settings.log_level = val
                            .parse()
                            .map_err(|e| ConfigError::Invalid { message: e })?;
                    }
                }
                name => {
                    tracing::warn!("Unknown settings option: {}", name);
                }
            }
        }
    }

    Ok(settings)
}

fn first_string(node: &kdl::KdlNode) -> Option<&str> {
    node.entries().first().and_then(|e| e.value().as_string())
}

/// Parse a `keymap` block into `key_map`.
///
/// Every child node binds one sequence: the node name is the handler, its
/// arguments are the keys in order. Repeating a handler adds an alternative.
fn parse_keymap(
    node: &kdl::KdlNode,
    source: &str,
    key_map: &mut KeyMap,
) -> Result<(), ConfigError> {
    let mut invalid_keys = Vec::new();

    let Some(children) = node.children() else {
        return Ok(());
    };

    for child in children.nodes() {
        let handler = child.name().value().to_string();

        if child.entries().is_empty() {
            let location = get_node_location(child, source);
            return Err(ConfigError::EmptySequence {
                src: source.to_string(),
                span: miette::SourceSpan::from((location.offset, location.len)),
                handler,
            });
        }

        if child.children().is_some() {
            tracing::warn!("Ignoring children of keymap entry '{}'", handler);
        }

        let mut sequence = Vec::with_capacity(child.entries().len());
        for entry in child.entries() {
            let reason = if entry.name().is_some() {
                Some("properties are not allowed")
            } else {
                match entry.value().as_string() {
                    Some("") => Some("empty key"),
                    Some(key) => {
                        sequence.push(key.to_string());
                        None
                    }
                    None => Some("key must be a string"),
                }
            };

            if let Some(reason) = reason {
                invalid_keys.push(InvalidKeyInfo {
                    handler: handler.clone(),
                    key: entry.to_string().trim().to_string(),
                    reason,
                    location: get_entry_location(entry, source),
                });
            }
        }

        key_map.bind(handler, sequence);
    }

    if !invalid_keys.is_empty() {
        return Err(ConfigError::invalid_keys(source, invalid_keys));
    }

    Ok(())
}
