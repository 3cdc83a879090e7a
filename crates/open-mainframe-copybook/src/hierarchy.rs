//! Level-number hierarchy builder.
//!
//! Reduces the flat clause list into a forest stored in an arena. Nodes are
//! kept open on a stack; a clause at the same or a shallower level closes
//! every open node at least as deep, and closing a node appends its index to
//! its parent's child list (or to the root list). Condition names never open
//! a node: they are recorded on the field they follow.

use tracing::{debug, warn};

use crate::ast::ConditionName;
use crate::error::{CopybookError, Result};
use crate::lexer::{Clause, ClauseKind};

/// Index of a node in a [`Hierarchy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// An item in the hierarchy: the clause that declared it plus its links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// The declaring clause.
    pub clause: Clause,
    /// Enclosing item, `None` for a root.
    pub parent: Option<NodeId>,
    /// Subordinate items in source order.
    pub children: Vec<NodeId>,
    /// Condition names declared directly after this item.
    pub conditions: Vec<ConditionName>,
}

impl Node {
    /// Whether the item has storage of its own (cannot own children).
    pub fn is_elementary(&self) -> bool {
        self.clause.kind == ClauseKind::ElementaryField
    }
}

/// Arena-backed field forest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchy {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl Hierarchy {
    /// Root nodes in source order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Look up a node.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, clause: Clause) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            clause,
            parent: None,
            children: Vec::new(),
            conditions: Vec::new(),
        });
        id
    }

    /// Close `id`, attaching it to the open node below it or to the roots.
    fn close(&mut self, id: NodeId, parent: Option<NodeId>) {
        match parent {
            Some(parent) => {
                self.nodes[id.0].parent = Some(parent);
                self.nodes[parent.0].children.push(id);
            }
            None => {
                if let Some(target) = &self.nodes[id.0].clause.redefines {
                    debug!(root = %self.nodes[id.0].clause.name, target = %target, "record redefines");
                }
                self.roots.push(id);
            }
        }
    }
}

/// Build the field forest from tokenized clauses.
///
/// Fails only when no clause yields a data item.
pub fn build(clauses: &[Clause], source_name: &str) -> Result<Hierarchy> {
    let mut hierarchy = Hierarchy::default();
    let mut stack: Vec<NodeId> = Vec::new();

    for clause in clauses {
        match clause.kind {
            ClauseKind::ConditionName => {
                match stack.last() {
                    Some(&owner) => hierarchy.nodes[owner.0].conditions.push(ConditionName {
                        name: clause.name.clone(),
                        values: clause.values.clone(),
                    }),
                    None => debug!(line = clause.line, name = %clause.name, "condition name without an owner"),
                }
                continue;
            }
            ClauseKind::Renames => {
                debug!(line = clause.line, name = %clause.name, "RENAMES entry occupies no storage");
                continue;
            }
            ClauseKind::ElementaryField | ClauseKind::GroupField => {}
        }

        let depth = clause.depth();
        while let Some(&top) = stack.last() {
            let top_node = hierarchy.node(top);
            let closes = top_node.clause.depth() >= depth;
            if !closes && !top_node.is_elementary() {
                break;
            }
            if !closes {
                warn!(
                    line = clause.line,
                    name = %clause.name,
                    owner = %top_node.clause.name,
                    "elementary item cannot own subordinate items; nesting under its parent"
                );
            }
            stack.pop();
            hierarchy.close(top, stack.last().copied());
        }

        let id = hierarchy.push(clause.clone());
        stack.push(id);
    }

    while let Some(top) = stack.pop() {
        hierarchy.close(top, stack.last().copied());
    }

    if hierarchy.roots.is_empty() {
        return Err(CopybookError::NoDataItems {
            source_name: source_name.to_string(),
        });
    }
    Ok(hierarchy)
}
