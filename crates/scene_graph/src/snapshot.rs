use glam::Vec2;
use node::Node;
use serde::Serialize;

/// An owned, detached copy of a subtree.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub node: Node,
    pub children: Vec<Snapshot>,
}

impl Snapshot {
    /// Visits every node in paint order (parent before children, children
    /// in order), passing each node's offset from the snapshot root's origin.
    pub fn visit(&self, mut f: impl FnMut(&Node, Vec2)) {
        let mut stack = vec![(self, Vec2::ZERO)];
        while let Some((snapshot, offset)) = stack.pop() {
            f(&snapshot.node, offset);
            for child in snapshot.children.iter().rev() {
                stack.push((child, offset + child.node.position));
            }
        }
    }

    /// Total number of nodes in the snapshot.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(Snapshot::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}
