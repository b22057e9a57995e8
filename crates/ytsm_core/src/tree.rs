//! Folder/subscription tree: node ids, drag-and-drop rules and dialog routing.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::modal::ModalRoute;

/// Parent id the server uses for top-level nodes.
pub const ROOT_PARENT: &str = "#";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Folder,
    Subscription,
}

/// A tree node id such as `folder12` or `sub7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeNodeRef {
    pub kind: NodeKind,
    pub id: u64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unrecognised tree node id {0:?}")]
pub struct TreeIdError(pub String);

impl FromStr for TreeNodeRef {
    type Err = TreeIdError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (kind, digits) = if let Some(rest) = raw.strip_prefix("folder") {
            (NodeKind::Folder, rest)
        } else if let Some(rest) = raw.strip_prefix("sub") {
            (NodeKind::Subscription, rest)
        } else {
            return Err(TreeIdError(raw.to_string()));
        };
        let id = digits
            .parse()
            .map_err(|_| TreeIdError(raw.to_string()))?;
        Ok(Self { kind, id })
    }
}

impl fmt::Display for TreeNodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NodeKind::Folder => write!(f, "folder{}", self.id),
            NodeKind::Subscription => write!(f, "sub{}", self.id),
        }
    }
}

impl TreeNodeRef {
    pub fn folder(id: u64) -> Self {
        Self {
            kind: NodeKind::Folder,
            id,
        }
    }

    pub fn subscription(id: u64) -> Self {
        Self {
            kind: NodeKind::Subscription,
            id,
        }
    }

    pub fn edit_route(&self) -> ModalRoute {
        match self.kind {
            NodeKind::Folder => ModalRoute::UpdateFolder(self.id),
            NodeKind::Subscription => ModalRoute::UpdateSubscription(self.id),
        }
    }

    pub fn delete_route(&self) -> ModalRoute {
        match self.kind {
            NodeKind::Folder => ModalRoute::DeleteFolder(self.id),
            NodeKind::Subscription => ModalRoute::DeleteSubscription(self.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub node: TreeNodeRef,
    pub text: String,
    /// `None` for top-level nodes.
    pub parent: Option<TreeNodeRef>,
    pub icon: Option<String>,
    pub opened: bool,
}

/// Structural edits the tree widget asks permission for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeOperation {
    CreateNode,
    RenameNode,
    DeleteNode,
    MoveNode,
    CopyNode,
}

/// Subscriptions are leaves: nothing may be dragged onto one.
pub fn can_drop(operation: TreeOperation, target: NodeKind, from_drag: bool) -> bool {
    if !from_drag {
        return true;
    }
    !matches!(
        (operation, target),
        (TreeOperation::MoveNode | TreeOperation::CopyNode, NodeKind::Subscription)
    )
}

/// Depth-first outline of a flat node list; children keep server order.
///
/// Nodes whose parent is missing are shown at the top level. Cycles are cut.
pub fn outline(nodes: &[TreeNode]) -> Vec<(usize, &TreeNode)> {
    let known: HashSet<TreeNodeRef> = nodes.iter().map(|n| n.node).collect();
    let mut visited = HashSet::new();
    let mut out = Vec::with_capacity(nodes.len());

    for node in nodes {
        let top_level = node.parent.map_or(true, |parent| !known.contains(&parent));
        if top_level {
            visit(nodes, node, 0, &mut visited, &mut out);
        }
    }
    out
}

fn visit<'a>(
    nodes: &'a [TreeNode],
    node: &'a TreeNode,
    depth: usize,
    visited: &mut HashSet<TreeNodeRef>,
    out: &mut Vec<(usize, &'a TreeNode)>,
) {
    if !visited.insert(node.node) {
        return;
    }
    out.push((depth, node));
    for child in nodes.iter().filter(|c| c.parent == Some(node.node)) {
        visit(nodes, child, depth + 1, visited, out);
    }
}
