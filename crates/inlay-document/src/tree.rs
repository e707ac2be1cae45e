//! Arena-backed document tree.
//!
//! Nodes live in a slab owned by [`Document`] and reference each other by
//! [`NodeId`], never by pointer. The tree under the root alternates between
//! plain text runs and expression spans; every span owns exactly an open
//! delimiter, a source, and a close delimiter, in that order. Mutation
//! primitives either preserve that shape or are used inside a transform
//! that restores it before returning.

use inlay_eval::EvalOutcome;

use crate::selection::{Point, Selection};

/// Index of a node in the document arena. Slots are never reused, so an id
/// stays unique for the lifetime of the document and can be used as a node
/// identity in notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_raw(raw: u32) -> Self {
        NodeId(raw)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Which side of an expression span a delimiter sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimiterSide {
    Open,
    Close,
}

impl DelimiterSide {
    /// The canonical two-character delimiter text.
    pub fn canonical(self) -> &'static str {
        match self {
            DelimiterSide::Open => "{{",
            DelimiterSide::Close => "}}",
        }
    }
}

#[derive(Debug)]
pub(crate) enum NodeKind {
    Root,
    Text(String),
    Span(EvalOutcome),
    Delimiter { side: DelimiterSide, highlighted: bool },
    Source,
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// The document: a tree of text runs and expression spans under one root.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Option<Node>>,
    root: NodeId,
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Document {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        doc.root = doc.alloc(NodeKind::Root);
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(Node {
            kind,
            parent: None,
            children: Vec::new(),
        }));
        id
    }

    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.index()]
            .as_ref()
            .expect("node id refers to a removed node")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.index()]
            .as_mut()
            .expect("node id refers to a removed node")
    }

    // ---- read operations ----

    /// Whether the id still refers to a live node.
    pub fn exists(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.index())
            .map(Option::is_some)
            .unwrap_or(false)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|&c| c == id)?;
        siblings.get(index + 1).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|&c| c == id)?;
        index.checked_sub(1).and_then(|i| siblings.get(i)).copied()
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Text(_))
    }

    pub fn is_span(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Span(_))
    }

    pub fn is_delimiter(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Delimiter { .. })
    }

    pub fn is_source(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Source)
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        id == self.root
    }

    /// The text of a text run; `None` for element nodes.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Character length of a text run.
    pub fn text_len(&self, id: NodeId) -> usize {
        self.text(id).map(|t| t.chars().count()).unwrap_or(0)
    }

    pub fn delimiter_side(&self, id: NodeId) -> Option<DelimiterSide> {
        match self.node(id).kind {
            NodeKind::Delimiter { side, .. } => Some(side),
            _ => None,
        }
    }

    pub fn is_highlighted(&self, id: NodeId) -> bool {
        matches!(
            self.node(id).kind,
            NodeKind::Delimiter { highlighted: true, .. }
        )
    }

    pub fn set_highlighted(&mut self, id: NodeId, highlighted: bool) {
        if let NodeKind::Delimiter {
            highlighted: flag, ..
        } = &mut self.node_mut(id).kind
        {
            *flag = highlighted;
        }
    }

    pub fn span_outcome(&self, id: NodeId) -> Option<&EvalOutcome> {
        match &self.node(id).kind {
            NodeKind::Span(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn set_span_outcome(&mut self, id: NodeId, outcome: EvalOutcome) {
        if let NodeKind::Span(slot) = &mut self.node_mut(id).kind {
            *slot = outcome;
        }
    }

    /// Flattened text content of a subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.node(id).kind {
            NodeKind::Text(text) => out.push_str(text),
            _ => {
                for &child in &self.node(id).children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// The nearest enclosing expression span, if any.
    pub fn enclosing_span(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.is_span(node) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// The span's source child.
    pub fn source_of_span(&self, span: NodeId) -> Option<NodeId> {
        self.children(span)
            .iter()
            .copied()
            .find(|&c| self.is_source(c))
    }

    /// The span's open and close delimiter children.
    pub fn delimiters_of_span(&self, span: NodeId) -> Vec<NodeId> {
        self.children(span)
            .iter()
            .copied()
            .filter(|&c| self.is_delimiter(c))
            .collect()
    }

    /// Raw expression source: the source child's flattened text, trimmed.
    pub fn span_source(&self, span: NodeId) -> String {
        self.source_of_span(span)
            .map(|source| self.text_content(source).trim().to_string())
            .unwrap_or_default()
    }

    /// Pre-order walk collecting spans, without descending into them.
    ///
    /// Source content is raw text, never nested spans, so this finds every
    /// span that needs evaluation exactly once.
    pub fn top_level_spans(&self) -> Vec<NodeId> {
        let mut spans = Vec::new();
        self.collect_spans(self.root, &mut spans);
        spans
    }

    fn collect_spans(&self, id: NodeId, spans: &mut Vec<NodeId>) {
        for &child in &self.node(id).children {
            if self.is_span(child) {
                spans.push(child);
            } else {
                self.collect_spans(child, spans);
            }
        }
    }

    /// All text runs in document order.
    pub fn text_runs(&self) -> Vec<NodeId> {
        self.text_runs_under(self.root)
    }

    /// Text runs in order within a subtree.
    pub(crate) fn text_runs_under(&self, id: NodeId) -> Vec<NodeId> {
        let mut runs = Vec::new();
        self.collect_text_runs(id, &mut runs);
        runs
    }

    fn collect_text_runs(&self, id: NodeId, runs: &mut Vec<NodeId>) {
        if self.is_text(id) {
            runs.push(id);
            return;
        }
        for &child in &self.node(id).children {
            self.collect_text_runs(child, runs);
        }
    }

    /// Whether the node or one of its ancestors is a source node.
    pub fn is_in_source(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.is_source(node) {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    // ---- construction ----

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text(text.into()))
    }

    pub fn create_span(&mut self) -> NodeId {
        self.alloc(NodeKind::Span(EvalOutcome::NotRun))
    }

    pub fn create_delimiter(&mut self, side: DelimiterSide) -> NodeId {
        self.alloc(NodeKind::Delimiter {
            side,
            highlighted: false,
        })
    }

    pub fn create_source(&mut self) -> NodeId {
        self.alloc(NodeKind::Source)
    }

    // ---- mutation primitives ----

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node(id).parent {
            let siblings = &mut self.node_mut(parent).children;
            siblings.retain(|&c| c != id);
            self.node_mut(id).parent = None;
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.node_mut(parent).children.push(child);
        self.node_mut(child).parent = Some(parent);
    }

    pub fn insert_sibling_before(&mut self, reference: NodeId, node: NodeId) {
        let parent = self
            .parent(reference)
            .expect("cannot insert a sibling of the root");
        self.detach(node);
        let index = self
            .children(parent)
            .iter()
            .position(|&c| c == reference)
            .expect("reference is a child of its parent");
        self.node_mut(parent).children.insert(index, node);
        self.node_mut(node).parent = Some(parent);
    }

    pub fn insert_sibling_after(&mut self, reference: NodeId, node: NodeId) {
        let parent = self
            .parent(reference)
            .expect("cannot insert a sibling of the root");
        self.detach(node);
        let index = self
            .children(parent)
            .iter()
            .position(|&c| c == reference)
            .expect("reference is a child of its parent");
        self.node_mut(parent).children.insert(index + 1, node);
        self.node_mut(node).parent = Some(parent);
    }

    /// Detach and free a subtree.
    pub fn remove(&mut self, id: NodeId) {
        self.detach(id);
        self.free(id);
    }

    fn free(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.node_mut(id).children);
        for child in children {
            self.free(child);
        }
        self.nodes[id.index()] = None;
    }

    /// Replace a node with a plain text run holding the given text.
    pub fn replace_with_text(&mut self, id: NodeId, text: impl Into<String>) -> NodeId {
        let run = self.create_text(text);
        self.insert_sibling_before(id, run);
        self.remove(id);
        run
    }

    /// Splice a text run: delete `del_count` characters at `start` and
    /// insert `insert` there. Offsets count characters.
    pub fn splice_text(&mut self, id: NodeId, start: usize, del_count: usize, insert: &str) {
        let NodeKind::Text(text) = &mut self.node_mut(id).kind else {
            panic!("splice_text requires a text run");
        };
        let byte_start = byte_offset(text, start);
        let byte_end = byte_offset(text, start + del_count);
        text.replace_range(byte_start..byte_end, insert);
    }

    /// Split a text run at the given character offsets.
    ///
    /// The original node keeps the first segment; new runs are inserted as
    /// following siblings. Offsets at the run boundaries produce no empty
    /// fragments. Selection points inside the run are remapped into the
    /// segment that contains them, preferring the end of an earlier segment
    /// at exact boundaries. Returns the segments in order.
    pub fn split_text_run(
        &mut self,
        id: NodeId,
        offsets: &[usize],
        selection: Option<&mut Selection>,
    ) -> Vec<NodeId> {
        let text = self.text(id).expect("split_text_run requires a text run");
        let total = text.chars().count();

        let mut cuts: Vec<usize> = offsets
            .iter()
            .copied()
            .filter(|&o| o > 0 && o < total)
            .collect();
        cuts.sort_unstable();
        cuts.dedup();

        if cuts.is_empty() {
            return vec![id];
        }

        let text = text.to_string();
        let mut boundaries = vec![0];
        boundaries.extend(&cuts);
        boundaries.push(total);

        let mut segments = Vec::with_capacity(boundaries.len() - 1);
        for window in boundaries.windows(2) {
            let (start, end) = (window[0], window[1]);
            let piece: String = text
                .chars()
                .skip(start)
                .take(end - start)
                .collect();
            segments.push(piece);
        }

        // First segment stays in the original node.
        if let NodeKind::Text(slot) = &mut self.node_mut(id).kind {
            *slot = segments[0].clone();
        }

        let mut nodes = vec![id];
        let mut last = id;
        for piece in segments.iter().skip(1) {
            let run = self.create_text(piece.clone());
            self.insert_sibling_after(last, run);
            nodes.push(run);
            last = run;
        }

        if let Some(selection) = selection {
            let starts = boundaries.clone();
            let mapped_nodes = nodes.clone();
            selection.remap(|point| {
                if point.node != id {
                    return point;
                }
                // Boundary offsets stay at the end of the earlier segment.
                for (i, node) in mapped_nodes.iter().enumerate() {
                    let seg_start = starts[i];
                    let seg_end = starts[i + 1];
                    if point.offset <= seg_end {
                        return Point::new(*node, point.offset - seg_start);
                    }
                }
                let last_index = mapped_nodes.len() - 1;
                Point::new(
                    mapped_nodes[last_index],
                    starts[last_index + 1] - starts[last_index],
                )
            });
        }

        nodes
    }

    /// Merge the second text run into the first, removing the second.
    ///
    /// Selection points in the second run shift by the first run's length.
    pub fn merge_text_pair(
        &mut self,
        first: NodeId,
        second: NodeId,
        selection: Option<&mut Selection>,
    ) -> NodeId {
        let first_len = self.text_len(first);
        let second_text = self
            .text(second)
            .expect("merge_text_pair requires text runs")
            .to_string();

        if let NodeKind::Text(slot) = &mut self.node_mut(first).kind {
            slot.push_str(&second_text);
        } else {
            panic!("merge_text_pair requires text runs");
        }

        if let Some(selection) = selection {
            selection.remap(|point| {
                if point.node == second {
                    Point::new(first, first_len + point.offset)
                } else {
                    point
                }
            });
        }

        self.remove(second);
        first
    }

    /// Merge every pair of adjacent text-run children of an element.
    pub fn merge_adjacent_text_runs(
        &mut self,
        parent: NodeId,
        mut selection: Option<&mut Selection>,
    ) {
        loop {
            let children = self.children(parent).to_vec();
            let pair = children.windows(2).find_map(|w| {
                (self.is_text(w[0]) && self.is_text(w[1])).then(|| (w[0], w[1]))
            });
            let Some((first, second)) = pair else { break };
            self.merge_text_pair(first, second, selection.as_deref_mut());
        }
    }

    // ---- invariants ----

    /// Verify the structural invariants. Panics on violation; a violation
    /// is a defect in a transform, never a recoverable state.
    pub fn assert_invariants(&self) {
        for &child in self.children(self.root) {
            assert!(
                self.is_text(child) || self.is_span(child),
                "root children must be text runs or spans"
            );
            if self.is_span(child) {
                self.assert_span_shape(child);
            }
        }
    }

    fn assert_span_shape(&self, span: NodeId) {
        let children = self.children(span);
        assert_eq!(children.len(), 3, "span must have exactly three children");
        assert_eq!(
            self.delimiter_side(children[0]),
            Some(DelimiterSide::Open),
            "first span child must be the open delimiter"
        );
        assert!(
            self.is_source(children[1]),
            "second span child must be the source"
        );
        assert_eq!(
            self.delimiter_side(children[2]),
            Some(DelimiterSide::Close),
            "third span child must be the close delimiter"
        );
        for &delimiter in &[children[0], children[2]] {
            let side = self.delimiter_side(delimiter).unwrap();
            let content = self.text_content(delimiter);
            assert!(
                content.contains(side.canonical()),
                "delimiter node lost its delimiter text: {:?}",
                content
            );
            for &run in self.children(delimiter) {
                assert!(self.is_text(run), "delimiter children must be text runs");
            }
        }
        for &run in self.children(children[1]) {
            assert!(self.is_text(run), "source children must be text runs");
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte offset of a character offset, clamped to the string end.
pub(crate) fn byte_offset(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::{Point, Selection};

    #[test]
    fn test_append_and_flatten() {
        let mut doc = Document::new();
        let a = doc.create_text("hello ");
        let b = doc.create_text("world");
        doc.append_child(doc.root(), a);
        doc.append_child(doc.root(), b);
        assert_eq!(doc.text_content(doc.root()), "hello world");
        assert_eq!(doc.next_sibling(a), Some(b));
        assert_eq!(doc.previous_sibling(b), Some(a));
    }

    #[test]
    fn test_split_text_run_middle() {
        let mut doc = Document::new();
        let run = doc.create_text("abcdef");
        doc.append_child(doc.root(), run);
        let parts = doc.split_text_run(run, &[2, 4], None);
        assert_eq!(parts.len(), 3);
        assert_eq!(doc.text(parts[0]), Some("ab"));
        assert_eq!(doc.text(parts[1]), Some("cd"));
        assert_eq!(doc.text(parts[2]), Some("ef"));
        assert_eq!(parts[0], run);
    }

    #[test]
    fn test_split_text_run_at_edges_produces_no_empty_fragments() {
        let mut doc = Document::new();
        let run = doc.create_text("abcd");
        doc.append_child(doc.root(), run);
        let parts = doc.split_text_run(run, &[0, 2, 4], None);
        assert_eq!(parts.len(), 2);
        assert_eq!(doc.text(parts[0]), Some("ab"));
        assert_eq!(doc.text(parts[1]), Some("cd"));
    }

    #[test]
    fn test_split_remaps_selection() {
        let mut doc = Document::new();
        let run = doc.create_text("abcdef");
        doc.append_child(doc.root(), run);
        let mut selection = Selection::caret(Point::new(run, 5));
        let parts = doc.split_text_run(run, &[3], Some(&mut selection));
        assert_eq!(selection.focus.node, parts[1]);
        assert_eq!(selection.focus.offset, 2);

        // A caret exactly on the boundary stays at the end of the first part.
        let mut boundary = Selection::caret(Point::new(parts[0], 3));
        let reparts = doc.split_text_run(parts[0], &[3], Some(&mut boundary));
        assert_eq!(reparts.len(), 1);
        assert_eq!(boundary.focus.offset, 3);
    }

    #[test]
    fn test_merge_text_pair_remaps_selection() {
        let mut doc = Document::new();
        let a = doc.create_text("ab");
        let b = doc.create_text("cd");
        doc.append_child(doc.root(), a);
        doc.append_child(doc.root(), b);
        let mut selection = Selection::caret(Point::new(b, 1));
        doc.merge_text_pair(a, b, Some(&mut selection));
        assert_eq!(doc.text(a), Some("abcd"));
        assert!(!doc.exists(b));
        assert_eq!(selection.focus, Point::new(a, 3));
    }

    #[test]
    fn test_replace_with_text_keeps_position() {
        let mut doc = Document::new();
        let a = doc.create_text("a");
        let span = doc.create_span();
        let b = doc.create_text("b");
        doc.append_child(doc.root(), a);
        doc.append_child(doc.root(), span);
        doc.append_child(doc.root(), b);

        let run = doc.replace_with_text(span, "{{x}");
        assert!(!doc.exists(span));
        assert_eq!(doc.children(doc.root()), &[a, run, b]);
        assert_eq!(doc.text_content(doc.root()), "a{{x}b");
    }

    #[test]
    fn test_splice_text_char_offsets() {
        let mut doc = Document::new();
        let run = doc.create_text("héllo");
        doc.append_child(doc.root(), run);
        doc.splice_text(run, 1, 1, "e");
        assert_eq!(doc.text(run), Some("hello"));
    }

    #[test]
    fn test_span_shape_invariant() {
        let mut doc = Document::new();
        let span = doc.create_span();
        doc.append_child(doc.root(), span);
        let open = doc.create_delimiter(DelimiterSide::Open);
        let source = doc.create_source();
        let close = doc.create_delimiter(DelimiterSide::Close);
        let open_run = doc.create_text("{{");
        let source_run = doc.create_text("x");
        let close_run = doc.create_text("}}");
        doc.append_child(open, open_run);
        doc.append_child(source, source_run);
        doc.append_child(close, close_run);
        doc.append_child(span, open);
        doc.append_child(span, source);
        doc.append_child(span, close);

        doc.assert_invariants();
        assert_eq!(doc.span_source(span), "x");
        assert_eq!(doc.text_content(span), "{{x}}");
        assert_eq!(doc.top_level_spans(), vec![span]);
        assert!(doc.is_in_source(source_run));
        assert!(!doc.is_in_source(open_run));
        assert_eq!(doc.enclosing_span(close_run), Some(span));
    }
}
