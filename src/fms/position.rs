//! Source positions attached to diagnostics.
//!
//! - [`FilePosition`] is a snapshot of where the decoder was: source name, line, column, macro
//!   nesting depth and byte index.
//! - [`Positioned`] is a generic wrapper that attaches a [`FilePosition`] to a value, mostly to
//!   warnings.
//! - [`PositionedExt`] provides the `into_positioned` shorthand for any value.

use std::fmt;

/// A snapshot of the decoder position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilePosition {
    /// Name of the source unit, usually the file path.
    pub source: String,
    /// The line position, starts with 1.
    pub line: usize,
    /// The column position, starts with 1. Tabs are expanded to the configured width.
    pub col: usize,
    /// How many macro expansions or includes enclose this position. The top-level document is 0.
    pub depth: usize,
    /// Byte index into the text being scanned. Only meaningful against the original source when
    /// `depth` is 0.
    pub index: usize,
}

impl FilePosition {
    /// Creates the position of the first character of `source`.
    #[must_use]
    pub fn start_of(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            line: 1,
            col: 1,
            depth: 0,
            index: 0,
        }
    }
}

impl fmt::Display for FilePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source, self.line, self.col)?;
        if self.depth > 0 {
            write!(f, " (nesting depth {})", self.depth)?;
        }
        Ok(())
    }
}

/// A generic wrapper that attaches a [`FilePosition`] to a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Positioned<T> {
    content: T,
    position: FilePosition,
}

impl<T> Positioned<T> {
    /// Instances a new `Positioned`.
    pub const fn new(content: T, position: FilePosition) -> Self {
        Self { content, position }
    }

    /// Returns the wrapped content.
    pub const fn content(&self) -> &T {
        &self.content
    }

    /// Leans the content out of the wrapper.
    pub fn into_content(self) -> T {
        self.content
    }

    /// Returns the attached position.
    pub const fn position(&self) -> &FilePosition {
        &self.position
    }

    /// Maps the content of the wrapper, keeping the position.
    pub fn map<U, F>(self, f: F) -> Positioned<U>
    where
        F: FnOnce(T) -> U,
    {
        Positioned::new(f(self.content), self.position)
    }
}

impl<T: fmt::Display> fmt::Display for Positioned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.content, self.position)
    }
}

impl<T: std::error::Error + 'static> std::error::Error for Positioned<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.content)
    }
}

/// Extension methods for wrapping any value into [`Positioned`].
pub trait PositionedExt {
    /// Wraps `self` with the given position.
    fn into_positioned(self, position: FilePosition) -> Positioned<Self>
    where
        Self: Sized,
    {
        Positioned::new(self, position)
    }
}

impl<T> PositionedExt for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_depth_only_when_nested() {
        let mut pos = FilePosition::start_of("song.fms");
        assert_eq!(pos.to_string(), "song.fms:1:1");
        pos.depth = 2;
        pos.line = 4;
        assert_eq!(pos.to_string(), "song.fms:4:1 (nesting depth 2)");
    }

    #[test]
    fn map_keeps_position() {
        let pos = FilePosition::start_of("a");
        let wrapped = 3.into_positioned(pos.clone()).map(|n| n * 2);
        assert_eq!(wrapped.content(), &6);
        assert_eq!(wrapped.position(), &pos);
    }
}
