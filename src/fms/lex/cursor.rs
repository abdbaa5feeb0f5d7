//! Position-tracking cursor over source text.

use crate::fms::position::FilePosition;

/// A saved cursor state that can be restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorCheckpoint {
    /// The line position, starts with 1.
    pub line: usize,
    /// The column position, starts with 1.
    pub col: usize,
    /// The byte index.
    pub index: usize,
}

/// A character cursor over one unit of source text: a document, an included file or a macro
/// expansion.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    /// The line position, starts with 1.
    line: usize,
    /// The column position, starts with 1. Tabs advance to the next tab stop.
    col: usize,
    /// The byte index.
    index: usize,
    /// Nesting depth of this unit.
    depth: usize,
    tab_width: usize,
    name: &'a str,
    source: &'a str,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor at the start of `source`, a unit named `name` at nesting `depth`.
    #[must_use]
    pub const fn new(source: &'a str, name: &'a str, depth: usize, tab_width: usize) -> Self {
        Self {
            line: 1,
            col: 1,
            index: 0,
            depth,
            tab_width,
            name,
            source,
        }
    }

    /// Creates a cursor for a macro expansion invoked at `at`. Positions inside the expansion are
    /// reported relative to the invocation, one level deeper.
    #[must_use]
    pub fn expansion(source: &'a str, at: &'a FilePosition, tab_width: usize) -> Self {
        Self {
            line: at.line,
            col: at.col,
            index: 0,
            depth: at.depth + 1,
            tab_width,
            name: at.source.as_str(),
            source,
        }
    }

    /// The nesting depth of this unit.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// The name of this unit.
    #[must_use]
    pub const fn name(&self) -> &'a str {
        self.name
    }

    /// Returns the current byte index in the source string.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The unconsumed text.
    #[must_use]
    pub fn rest(&self) -> &'a str {
        &self.source[self.index..]
    }

    /// Whether every character was consumed.
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.index >= self.source.len()
    }

    /// Returns the next character without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Returns the character `n` positions ahead without consuming anything.
    #[must_use]
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    /// Consumes one character.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.index += c.len_utf8();
        match c {
            '\n' => {
                self.line += 1;
                self.col = 1;
            }
            '\t' => self.col = (self.col - 1) / self.tab_width * self.tab_width + self.tab_width + 1,
            '\r' => {}
            _ => self.col += 1,
        }
        Some(c)
    }

    /// Consumes `c` if it is next.
    pub fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consumes characters while `pred` holds and returns them.
    pub fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.index;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.source[start..self.index]
    }

    /// Snapshots the current position.
    #[must_use]
    pub fn snapshot(&self) -> FilePosition {
        FilePosition {
            source: self.name.to_string(),
            line: self.line,
            col: self.col,
            depth: self.depth,
            index: self.index,
        }
    }

    /// Save the current cursor state as a checkpoint.
    #[must_use]
    pub const fn save_checkpoint(&self) -> CursorCheckpoint {
        CursorCheckpoint {
            line: self.line,
            col: self.col,
            index: self.index,
        }
    }

    /// Restore the cursor state from a checkpoint.
    pub const fn restore_checkpoint(&mut self, checkpoint: CursorCheckpoint) {
        self.line = checkpoint.line;
        self.col = checkpoint.col;
        self.index = checkpoint.index;
    }

    /// Skips past the next `;` or to the end of the line, whichever comes first.
    pub fn skip_to_recovery_point(&mut self) {
        while let Some(c) = self.bump() {
            if c == ';' || c == '\n' {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_and_columns() {
        let mut cursor = Cursor::new("ab\ncd", "t", 0, 8);
        cursor.bump();
        cursor.bump();
        assert_eq!((cursor.snapshot().line, cursor.snapshot().col), (1, 3));
        cursor.bump();
        assert_eq!((cursor.snapshot().line, cursor.snapshot().col), (2, 1));
        assert_eq!(cursor.rest(), "cd");
    }

    #[test]
    fn tabs_advance_to_stops() {
        let mut cursor = Cursor::new("a\tb\t\tc", "t", 0, 4);
        cursor.eat_while(|c| c != 'b');
        assert_eq!(cursor.snapshot().col, 5);
        cursor.eat_while(|c| c != 'c');
        assert_eq!(cursor.snapshot().col, 13);
    }

    #[test]
    fn checkpoint_round_trip() {
        let mut cursor = Cursor::new("hello world", "t", 0, 8);
        let checkpoint = cursor.save_checkpoint();
        cursor.eat_while(|c| c != ' ');
        assert_eq!(cursor.rest(), " world");
        cursor.restore_checkpoint(checkpoint);
        assert_eq!(cursor.rest(), "hello world");
    }

    #[test]
    fn recovery_stops_at_semicolon_or_newline() {
        let mut cursor = Cursor::new("bad stuff; next\nmore", "t", 0, 8);
        cursor.skip_to_recovery_point();
        assert_eq!(cursor.rest(), " next\nmore");
        cursor.skip_to_recovery_point();
        assert_eq!(cursor.rest(), "more");
    }

    #[test]
    fn expansion_starts_at_invocation() {
        let mut at = FilePosition::start_of("song.fms");
        at.line = 7;
        at.col = 3;
        let cursor = Cursor::expansion("pitch 60;", &at, 8);
        let pos = cursor.snapshot();
        assert_eq!((pos.line, pos.col, pos.depth), (7, 3, 1));
        assert_eq!(pos.source, "song.fms");
    }
}
