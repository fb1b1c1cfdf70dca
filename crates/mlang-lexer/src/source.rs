// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Source text for one compilation unit.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mlang_ast::LineMap;
use tracing::debug;

use crate::config::LexerConfig;

/// How the bytes of a file were decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    /// The file was not valid UTF-8 and was read as ISO-8859-1.
    Latin1,
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The text handed to the lexer, with tabs already expanded according
/// to the configuration. Token spans and columns refer to this text.
#[derive(Debug, Clone)]
pub struct SourceText {
    name: Arc<str>,
    text: String,
    encoding: Encoding,
    tabs_expanded: bool,
    lines: LineMap,
}

impl SourceText {
    /// Read a file from disk.
    pub fn load(path: impl AsRef<Path>, config: &LexerConfig) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_bytes(path.to_string_lossy().as_ref(), bytes, config))
    }

    /// Decode raw bytes: UTF-8 when valid, Latin-1 otherwise.
    pub fn from_bytes(name: &str, bytes: Vec<u8>, config: &LexerConfig) -> Self {
        let (text, encoding) = match String::from_utf8(bytes) {
            Ok(text) => (text, Encoding::Utf8),
            Err(err) => (
                err.into_bytes().iter().map(|&b| b as char).collect(),
                Encoding::Latin1,
            ),
        };
        Self::build(name, text, encoding, config)
    }

    /// Code that did not come from a file of its own, such as a block
    /// extracted from a model. `name` is only used in diagnostics.
    pub fn from_string(name: &str, text: impl Into<String>, config: &LexerConfig) -> Self {
        Self::build(name, text.into(), Encoding::Utf8, config)
    }

    fn build(name: &str, text: String, encoding: Encoding, config: &LexerConfig) -> Self {
        let mut text = match text.strip_prefix('\u{feff}') {
            Some(rest) => rest.to_string(),
            None => text,
        };
        let mut tabs_expanded = false;
        if let Some(width) = config.tab_width.filter(|&w| w > 0) {
            if text.contains('\t') {
                text = expand_tabs(&text, width);
                tabs_expanded = true;
            }
        }
        debug!(
            file = name,
            bytes = text.len(),
            ?encoding,
            tabs_expanded,
            "source loaded"
        );
        let lines = LineMap::new(&text);
        Self {
            name: Arc::from(name),
            text,
            encoding,
            tabs_expanded,
            lines,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn tabs_expanded(&self) -> bool {
        self.tabs_expanded
    }

    /// Text of a 1-based line, without its line break.
    pub fn line(&self, line: u32) -> Option<&str> {
        self.lines.line_text(&self.text, line)
    }

    pub fn line_count(&self) -> u32 {
        self.lines.line_count()
    }

    /// 1-based line and 0-based column of a byte offset.
    pub fn line_col(&self, offset: usize) -> (u32, u32) {
        self.lines.line_col(&self.text, offset)
    }
}

/// Replace each tab with spaces up to the next multiple of `width`.
pub fn expand_tabs(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut column = 0;
    for c in text.chars() {
        match c {
            '\t' => {
                let pad = width - column % width;
                out.extend(std::iter::repeat(' ').take(pad));
                column += pad;
            }
            '\n' => {
                out.push(c);
                column = 0;
            }
            _ => {
                out.push(c);
                column += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabs_expand_to_next_stop() {
        assert_eq!(expand_tabs("\tx", 4), "    x");
        assert_eq!(expand_tabs("ab\tc", 4), "ab  c");
        assert_eq!(expand_tabs("abcd\tc\n\ty", 4), "abcd    c\n    y");
    }

    #[test]
    fn tab_width_none_keeps_tabs() {
        let config = LexerConfig {
            tab_width: None,
            ..LexerConfig::default()
        };
        let src = SourceText::from_string("t.m", "\tx = 1;", &config);
        assert_eq!(src.text(), "\tx = 1;");
        assert!(!src.tabs_expanded());
    }

    #[test]
    fn bom_is_stripped() {
        let src = SourceText::from_string("t.m", "\u{feff}x", &LexerConfig::default());
        assert_eq!(src.text(), "x");
    }

    #[test]
    fn invalid_utf8_falls_back_to_latin1() {
        let bytes = b"% caf\xe9\nx = 1;".to_vec();
        let src = SourceText::from_bytes("t.m", bytes, &LexerConfig::default());
        assert_eq!(src.encoding(), Encoding::Latin1);
        assert_eq!(src.line(1), Some("% café"));
        assert_eq!(src.line(2), Some("x = 1;"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = SourceText::load("/nonexistent/dir/f.m", &LexerConfig::default()).unwrap_err();
        assert!(err.to_string().starts_with("cannot read /nonexistent/dir/f.m"));
    }
}
