// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Source location tracking.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// A byte range in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Line-start offsets of a source text, for byte offset to line/column
/// lookups after lexing.
#[derive(Debug, Clone)]
pub struct LineMap {
    /// line_starts[0] is always 0.
    line_starts: Vec<usize>,
}

impl LineMap {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        LineMap { line_starts }
    }

    /// 1-based line and 0-based character column of a byte offset.
    pub fn line_col(&self, source: &str, offset: usize) -> (u32, u32) {
        let idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let start = self.line_starts[idx];
        let col = source
            .get(start..offset.min(source.len()))
            .map_or(0, |prefix| prefix.chars().count());
        (idx as u32 + 1, col as u32)
    }

    /// Text of a 1-based line without its line break.
    pub fn line_text<'a>(&self, source: &'a str, line: u32) -> Option<&'a str> {
        let idx = (line as usize).checked_sub(1)?;
        let start = *self.line_starts.get(idx)?;
        let end = self
            .line_starts
            .get(idx + 1)
            .map_or(source.len(), |&s| s - 1);
        let text = source.get(start..end)?;
        Some(text.strip_suffix('\r').unwrap_or(text))
    }

    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }
}

/// An inclusive, 0-based column range on a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Columns {
    start: u32,
    end: u32,
}

impl Columns {
    /// Panics if `end < start`.
    pub fn new(start: u32, end: u32) -> Self {
        assert!(end >= start, "column range {start}..{end} is reversed");
        Self { start, end }
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    /// Number of columns covered (at least 1).
    pub fn width(&self) -> u32 {
        self.end - self.start + 1
    }
}

/// A 1-based line and a 0-based column on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// Where something lives in a file.
///
/// `line` and `columns` describe the first line. A location that runs onto
/// later lines, such as a statement continued with `...`, also carries the
/// position of its last column in `end`.
///
/// Immutable once built. Ordering is lexicographic on
/// (filename, line, first column, last column, end); missing components
/// sort first.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Location {
    filename: Arc<str>,
    line: Option<u32>,
    columns: Option<Columns>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    end: Option<Position>,
    #[cfg_attr(feature = "serde", serde(skip))]
    context: Option<Arc<str>>,
}

impl Location {
    /// A location covering a whole file.
    pub fn file(filename: impl Into<Arc<str>>) -> Self {
        Self {
            filename: filename.into(),
            line: None,
            columns: None,
            end: None,
            context: None,
        }
    }

    /// A location on a 1-based line.
    pub fn line(filename: impl Into<Arc<str>>, line: u32) -> Self {
        Self {
            line: Some(line),
            ..Self::file(filename)
        }
    }

    /// A location on a 1-based line covering an inclusive column range.
    pub fn span(filename: impl Into<Arc<str>>, line: u32, columns: Columns) -> Self {
        Self {
            line: Some(line),
            columns: Some(columns),
            ..Self::file(filename)
        }
    }

    /// Attach a copy of the source line, used when rendering diagnostics.
    pub fn with_context(mut self, context: Arc<str>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn line_number(&self) -> Option<u32> {
        self.line
    }

    pub fn columns(&self) -> Option<Columns> {
        self.columns
    }

    pub fn col_start(&self) -> Option<u32> {
        self.columns.map(|c| c.start)
    }

    pub fn col_end(&self) -> Option<u32> {
        self.columns.map(|c| c.end)
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Last line covered. Differs from [`line_number`](Self::line_number)
    /// only for locations spanning several lines.
    pub fn end_line(&self) -> Option<u32> {
        self.end.map(|p| p.line).or(self.line)
    }

    /// Last column covered, on [`end_line`](Self::end_line).
    pub fn end_column(&self) -> Option<u32> {
        self.end.map(|p| p.column).or_else(|| self.col_end())
    }

    pub fn is_multiline(&self) -> bool {
        self.end.is_some()
    }

    /// A location from the start of `self` to the end of `other`. On one
    /// line the column range grows; when `other` ends on a later line, that
    /// end is recorded and the first line keeps its columns. Anything else
    /// (other files, earlier positions, missing lines) returns `self`.
    pub fn to(&self, other: &Location) -> Location {
        if self.filename != other.filename {
            return self.clone();
        }
        let (Some(a), Some(ca)) = (self.line, self.columns) else {
            return self.clone();
        };
        let (Some(b), Some(cb)) = (other.end_line(), other.end_column()) else {
            return self.clone();
        };
        if b == a && cb >= ca.start {
            Location {
                columns: Some(Columns::new(ca.start, ca.end.max(cb))),
                ..self.clone()
            }
        } else if b > a {
            let end = Position { line: b, column: cb };
            Location {
                end: Some(self.end.map_or(end, |e| e.max(end))),
                ..self.clone()
            }
        } else {
            self.clone()
        }
    }

    fn key(&self) -> (&str, Option<u32>, Option<u32>, Option<u32>, Option<Position>) {
        (
            &self.filename,
            self.line,
            self.col_start(),
            self.col_end(),
            self.end,
        )
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Location {}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.filename)?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
            if let Some(cols) = self.columns {
                // Columns are shown 1-based, like most editors expect.
                write!(f, ":{}", cols.start + 1)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_file_line_column() {
        let a = Location::span("a.m", 1, Columns::new(4, 6));
        let b = Location::span("a.m", 2, Columns::new(0, 0));
        let c = Location::span("a.m", 2, Columns::new(3, 3));
        let d = Location::line("b.m", 1);
        let mut locs = vec![d.clone(), c.clone(), a.clone(), b.clone()];
        locs.sort();
        assert_eq!(locs, vec![a, b, c, d]);
    }

    #[test]
    fn missing_line_sorts_first() {
        let whole = Location::file("x.m");
        let line = Location::line("x.m", 1);
        assert!(whole < line);
    }

    #[test]
    #[should_panic]
    fn reversed_columns_rejected() {
        Columns::new(5, 2);
    }

    #[test]
    fn display_uses_one_based_column() {
        let loc = Location::span("f.m", 3, Columns::new(0, 2));
        assert_eq!(loc.to_string(), "f.m:3:1");
        assert_eq!(Location::file("f.m").to_string(), "f.m");
    }

    #[test]
    fn to_merges_on_same_line() {
        let a = Location::span("f.m", 3, Columns::new(2, 3));
        let b = Location::span("f.m", 3, Columns::new(7, 9));
        let merged = a.to(&b);
        assert_eq!(merged.col_start(), Some(2));
        assert_eq!(merged.col_end(), Some(9));

        let earlier = Location::span("f.m", 2, Columns::new(0, 0));
        assert_eq!(a.to(&earlier), a);
        assert_eq!(a.to(&Location::span("g.m", 3, Columns::new(7, 9))), a);
    }

    #[test]
    fn to_records_end_on_later_line() {
        let a = Location::span("f.m", 3, Columns::new(2, 3));
        let b = Location::span("f.m", 5, Columns::new(4, 6));
        let merged = a.to(&b);
        assert!(merged.is_multiline());
        assert_eq!(merged.line_number(), Some(3));
        assert_eq!(merged.columns(), Some(Columns::new(2, 3)));
        assert_eq!(merged.end_line(), Some(5));
        assert_eq!(merged.end_column(), Some(6));
        assert_ne!(merged, a);
        assert_eq!(merged.to_string(), "f.m:3:3");

        // Chaining keeps the furthest end.
        let c = Location::span("f.m", 3, Columns::new(0, 0)).to(&merged);
        assert_eq!(c.end_line(), Some(5));
        assert_eq!(c.end_column(), Some(6));
    }

    #[test]
    fn single_line_locations_end_where_they_start() {
        let a = Location::span("f.m", 3, Columns::new(2, 3));
        assert!(!a.is_multiline());
        assert_eq!(a.end_line(), Some(3));
        assert_eq!(a.end_column(), Some(3));
    }

    #[test]
    fn line_map_lookups() {
        let src = "ab\r\nçd\n";
        let lm = LineMap::new(src);
        assert_eq!(lm.line_count(), 3);
        assert_eq!(lm.line_col(src, 0), (1, 0));
        assert_eq!(lm.line_col(src, 1), (1, 1));
        // 'd' follows a two-byte character
        assert_eq!(lm.line_col(src, 6), (2, 1));
        assert_eq!(lm.line_text(src, 1), Some("ab"));
        assert_eq!(lm.line_text(src, 2), Some("çd"));
        assert_eq!(lm.line_text(src, 3), Some(""));
        assert_eq!(lm.line_text(src, 4), None);
    }

    #[test]
    fn context_does_not_affect_equality() {
        let a = Location::line("f.m", 1).with_context(Arc::from("x = 1"));
        let b = Location::line("f.m", 1);
        assert_eq!(a, b);
        assert_eq!(a.context(), Some("x = 1"));
    }
}
