// SPDX-License-Identifier: (MIT OR Apache-2.0)

use serde::Deserialize;

/// Lexer settings, usually read from the tool's configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LexerConfig {
    /// Expand tabs to this width before lexing. `None` keeps tabs as is.
    pub tab_width: Option<usize>,
    /// Accept Octave's `!` and `!=` operators.
    pub octave: bool,
}

impl Default for LexerConfig {
    fn default() -> Self {
        Self {
            tab_width: Some(4),
            octave: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: LexerConfig = serde_json::from_str(r#"{"octave": true}"#).unwrap();
        assert_eq!(config.tab_width, Some(4));
        assert!(config.octave);
    }

    #[test]
    fn tab_expansion_can_be_disabled() {
        let config: LexerConfig = serde_json::from_str(r#"{"tab_width": null}"#).unwrap();
        assert_eq!(config.tab_width, None);
    }
}
