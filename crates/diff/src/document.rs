use std::borrow::Cow;

use ropey::Rope;

/// A line of a document, as the byte range of its content. The line
/// break, if any, sits at `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    /// Offset of the first byte of the line
    pub from: usize,

    /// Offset just past the line's content, before its line break
    pub to: usize,
}

/// Read-only, line-addressable access to a document. Only `\n` breaks
/// lines.
pub trait Document: Sync {
    /// Length of the document in bytes
    fn len(&self) -> usize;

    /// Check if the document is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The line containing byte offset `pos`. A position right after a
    /// line break belongs to the following line.
    fn line_at(&self, pos: usize) -> Line;

    /// The text between two byte offsets, clamped to the document
    fn slice_text(&self, from: usize, to: usize) -> Cow<'_, str>;

    /// Whether `pos` falls between two characters (or at either end)
    fn is_char_boundary(&self, pos: usize) -> bool;

    /// The whole document as a string
    fn text(&self) -> Cow<'_, str> {
        self.slice_text(0, self.len())
    }
}

impl Document for Rope {
    fn len(&self) -> usize {
        self.len_bytes()
    }

    fn is_char_boundary(&self, pos: usize) -> bool {
        match pos.cmp(&self.len_bytes()) {
            std::cmp::Ordering::Less => self.char_to_byte(self.byte_to_char(pos)) == pos,
            std::cmp::Ordering::Equal => true,
            std::cmp::Ordering::Greater => false,
        }
    }

    fn line_at(&self, pos: usize) -> Line {
        let pos = pos.min(self.len_bytes());
        let line = self.byte_to_line(pos);
        let from = self.line_to_byte(line);
        let to = if line + 1 < self.len_lines() {
            // Drop the "\n" that ends the line
            self.line_to_byte(line + 1) - 1
        } else {
            self.len_bytes()
        };
        Line { from, to }
    }

    fn slice_text(&self, from: usize, to: usize) -> Cow<'_, str> {
        let to = to.min(self.len_bytes());
        let from = from.min(to);
        let slice = self.byte_slice(from..to);
        match slice.as_str() {
            Some(text) => Cow::Borrowed(text),
            None => Cow::Owned(slice.to_string()),
        }
    }
}

impl Document for str {
    fn len(&self) -> usize {
        str::len(self)
    }

    fn is_char_boundary(&self, pos: usize) -> bool {
        str::is_char_boundary(self, pos)
    }

    fn line_at(&self, pos: usize) -> Line {
        let pos = pos.min(str::len(self));
        let bytes = self.as_bytes();
        let from = bytes[..pos]
            .iter()
            .rposition(|&byte| byte == b'\n')
            .map_or(0, |nl| nl + 1);
        let to = bytes[pos..]
            .iter()
            .position(|&byte| byte == b'\n')
            .map_or(bytes.len(), |nl| pos + nl);
        Line { from, to }
    }

    fn slice_text(&self, from: usize, to: usize) -> Cow<'_, str> {
        let to = to.min(str::len(self));
        let from = from.min(to);
        Cow::Borrowed(&self[from..to])
    }
}

impl Document for String {
    fn len(&self) -> usize {
        self.as_str().len()
    }

    fn is_char_boundary(&self, pos: usize) -> bool {
        self.as_str().is_char_boundary(pos)
    }

    fn line_at(&self, pos: usize) -> Line {
        self.as_str().line_at(pos)
    }

    fn slice_text(&self, from: usize, to: usize) -> Cow<'_, str> {
        self.as_str().slice_text(from, to)
    }
}

/// Move `pos` back to the nearest character boundary. Positions at or
/// past the end are left alone.
pub(crate) fn floor_boundary<D: Document + ?Sized>(doc: &D, pos: usize) -> usize {
    let mut pos = pos;
    while pos < doc.len() && !doc.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

/// Move `pos` forward to the nearest character boundary
pub(crate) fn ceil_boundary<D: Document + ?Sized>(doc: &D, pos: usize) -> usize {
    let mut pos = pos;
    while pos < doc.len() && !doc.is_char_boundary(pos) {
        pos += 1;
    }
    pos
}
