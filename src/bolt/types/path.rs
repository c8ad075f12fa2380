use super::node::Node;
use super::relationship::UnboundRelationship;

bolt_structure! {
    /// Alternating nodes and relationships, encoded by index.
    ///
    /// `indices` holds pairs: a 1-based relationship index (negative when
    /// traversed against its direction) followed by a node index.
    Path = 0x50 => {
        nodes: Vec<Node>,
        rels: Vec<UnboundRelationship>,
        indices: Vec<i64>,
    }
}

/// One hop of a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment<'a> {
    pub start: &'a Node,
    pub relationship: &'a UnboundRelationship,
    pub end: &'a Node,
    /// False when the relationship points from `end` to `start`.
    pub forward: bool,
}

impl Path {
    pub fn start(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn len(&self) -> usize {
        self.indices.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Resolves the index list into hops. Returns `None` if an index is out
    /// of range.
    pub fn segments(&self) -> Option<Vec<Segment<'_>>> {
        let mut current = self.nodes.first()?;
        let mut segments = Vec::with_capacity(self.len());
        for pair in self.indices.chunks_exact(2) {
            let rel_index = pair[0];
            let forward = rel_index > 0;
            let relationship = self
                .rels
                .get(usize::try_from(rel_index.unsigned_abs()).ok()?.checked_sub(1)?)?;
            let end = self.nodes.get(usize::try_from(pair[1]).ok()?)?;
            segments.push(Segment {
                start: current,
                relationship,
                end,
                forward,
            });
            current = end;
        }
        Some(segments)
    }
}
