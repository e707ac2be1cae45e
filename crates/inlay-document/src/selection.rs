//! Selection snapshots.
//!
//! Selection is a plain value passed into and returned from transforms,
//! never a live object threaded through mutation. Offsets count characters
//! within a single text run.

use crate::tree::NodeId;

/// A position inside a node: a character offset within a text run, or a
/// child index within an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub node: NodeId,
    pub offset: usize,
}

impl Point {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// An anchor/focus pair. Collapsed selections are carets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    /// A collapsed selection at a single point.
    pub fn caret(point: Point) -> Self {
        Self {
            anchor: point,
            focus: point,
        }
    }

    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// Collapse to the focus point.
    pub fn collapse_to_focus(&self) -> Self {
        Self::caret(self.focus)
    }

    /// Apply a remap function to both points.
    pub(crate) fn remap(&mut self, f: impl Fn(Point) -> Point) {
        self.anchor = f(self.anchor);
        self.focus = f(self.focus);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caret_is_collapsed() {
        let caret = Selection::caret(Point::new(NodeId::from_raw(1), 3));
        assert!(caret.is_collapsed());
    }

    #[test]
    fn test_range_is_not_collapsed() {
        let selection = Selection::new(
            Point::new(NodeId::from_raw(1), 0),
            Point::new(NodeId::from_raw(1), 2),
        );
        assert!(!selection.is_collapsed());
        assert!(selection.collapse_to_focus().is_collapsed());
    }
}
