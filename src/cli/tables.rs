//! Plain-text tables for `mosaic handlers` and `mosaic languages`

use std::fmt::Write;

use crate::config::{ParserConfig, TokenPattern};
use crate::registry::HandlerRegistry;

fn describe_pattern(pattern: &TokenPattern) -> String {
    match &pattern.value {
        Some(value) => format!("{}={:?}@{}", pattern.kind, value, pattern.offset),
        None => format!("{}@{}", pattern.kind, pattern.offset),
    }
}

/// Handlers in dispatch order, then fallbacks in fallback order.
pub fn handler_table(config: &ParserConfig) -> String {
    let registry = HandlerRegistry::from_config(config);
    let mut out = String::new();
    let _ = writeln!(out, "{:<16} {:<14} {:>8} {:>6}  PATTERNS", "NAME", "CONSTRUCT", "PRIORITY", "ORDER");

    let primaries = registry.all().into_iter().filter(|h| !h.config().fallback);
    for handler in primaries {
        let c = handler.config();
        let patterns: Vec<String> = c.patterns.iter().map(describe_pattern).collect();
        let _ = writeln!(
            out,
            "{:<16} {:<14} {:>8} {:>6}  {}{}",
            c.name,
            c.construct.to_string(),
            c.priority,
            c.order,
            patterns.join(" | "),
            if c.enabled { "" } else { "  (disabled)" }
        );
    }

    for handler in registry.fallbacks() {
        let c = handler.config();
        let _ = writeln!(
            out,
            "{:<16} {:<14} {:>8} {:>6}  fallback (priority {})",
            c.name,
            c.construct.to_string(),
            c.priority,
            c.order,
            c.fallback_priority.unwrap_or(config.default_fallback_priority)
        );
    }
    out
}

pub fn language_table(config: &ParserConfig) -> String {
    let mut out = String::new();
    for language in &config.languages {
        let _ = write!(out, "{}", language.name);
        if !language.aliases.is_empty() {
            let _ = write!(out, " (aliases: {})", language.aliases.join(", "));
        }
        if !language.code_blocks {
            let _ = write!(out, " [no code blocks]");
        }
        out.push('\n');
    }
    out
}
