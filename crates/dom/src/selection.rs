//! Text selection inside an editable element.

/// Represents a text selection as a byte range.
///
/// The range is always normalized such that `start <= end`. Offsets are byte
/// offsets into the element's current value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectionRange {
    /// Start byte offset of the selection (inclusive).
    pub start: usize,
    /// End byte offset of the selection (exclusive).
    pub end: usize,
}

impl SelectionRange {
    /// Create a new, normalized selection range.
    #[inline]
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// A collapsed selection, i.e. a caret.
    #[inline]
    pub fn caret(at: usize) -> Self {
        Self { start: at, end: at }
    }

    /// Returns `true` if the selection is empty (zero-width).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns the length of the selection in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Clamp both ends into `value`, snapping down to char boundaries.
    pub fn clamp_to(&self, value: &str) -> Self {
        let clamp = |mut i: usize| {
            i = i.min(value.len());
            while !value.is_char_boundary(i) {
                i -= 1;
            }
            i
        };
        Self::new(clamp(self.start), clamp(self.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_range_normalizes() {
        let range = SelectionRange::new(10, 5);
        assert_eq!(range.start, 5);
        assert_eq!(range.end, 10);
        assert_eq!(range.len(), 5);
    }

    #[test]
    fn clamp_snaps_to_char_boundary() {
        let value = "a€b";
        // 2 is inside the 3-byte euro sign.
        let range = SelectionRange::new(2, 99).clamp_to(value);
        assert_eq!(range, SelectionRange::new(1, value.len()));
    }

    #[test]
    fn caret_is_empty() {
        assert!(SelectionRange::caret(3).is_empty());
    }
}
