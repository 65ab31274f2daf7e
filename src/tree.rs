//! The leftmost-derivation parse tree shared by the interactive driver and
//! by CYK witness reconstruction (`spec.md` §4.2).
//!
//! Implemented as a node arena with parent back-references, per the design
//! note in `spec.md` §9: "An arena of nodes with parent as an index is a
//! natural implementation." Parent pointers are used only for traversal and
//! detach-on-undo; they never own.

use crate::letter::Letter;

/// An index into a [`ParseTree`]'s node arena.
pub type NodeId = usize;

const ROOT_NAME: &str = "root";
const EPSILON_NAME: &str = "\u{3b5}"; // "ε"

#[derive(Clone, Debug)]
enum NodeKind {
    /// Carries a grammar letter.
    Letter(Letter),
    /// Carries only a display name (the root, or an "ε" terminator).
    Meta(String),
}

#[derive(Clone, Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An ordered, labeled, undoable derivation tree.
#[derive(Clone, Debug)]
pub struct ParseTree {
    nodes: Vec<Node>,
    root: NodeId,
    /// Each successful logged `branch_word` pushes its new children here;
    /// `undo` pops and detaches them. This is the sole undo history: the
    /// initial root expansion is never logged, so it can never be undone.
    undo_log: Vec<Vec<NodeId>>,
}

/// Returned by [`ParseTree::undo`] when there is nothing left to undo.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NothingToUndo;

impl ParseTree {
    /// Creates a tree rooted at a META "root" node, immediately expanded
    /// (without logging) to the given starting word.
    pub fn new(starting_word: &[Letter]) -> Self {
        let root_node = Node {
            kind: NodeKind::Meta(ROOT_NAME.to_string()),
            parent: None,
            children: Vec::new(),
        };
        let mut tree = ParseTree {
            nodes: vec![root_node],
            root: 0,
            undo_log: Vec::new(),
        };
        tree.branch_word(tree.root, starting_word, false);
        tree
    }

    /// The root node's id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The letter carried by a LETTER node, or `None` for META nodes.
    pub fn letter(&self, node: NodeId) -> Option<&Letter> {
        match &self.nodes[node].kind {
            NodeKind::Letter(letter) => Some(letter),
            NodeKind::Meta(_) => None,
        }
    }

    /// A node's children, in left-to-right order.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node].children
    }

    fn push_node(&mut self, kind: NodeKind, parent: NodeId) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Appends children to `node` for each letter of `word`; an empty word
    /// appends a single META "ε" child instead. When `log` is true, the new
    /// children are recorded on the undo stack. Returns the new children.
    pub fn branch_word(&mut self, node: NodeId, word: &[Letter], log: bool) -> Vec<NodeId> {
        let new_children = if word.is_empty() {
            vec![self.push_node(NodeKind::Meta(EPSILON_NAME.to_string()), node)]
        } else {
            word.iter()
                .map(|letter| self.push_node(NodeKind::Letter(letter.clone()), node))
                .collect()
        };
        if log {
            self.undo_log.push(new_children.clone());
        }
        new_children
    }

    /// Preorder list of LETTER leaves (nodes with no children). META leaves
    /// — in particular "ε" terminators — are excluded.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut result = Vec::new();
        self.collect_leaves(self.root, &mut result);
        result
    }

    fn collect_leaves(&self, node: NodeId, out: &mut Vec<NodeId>) {
        let children = &self.nodes[node].children;
        if children.is_empty() {
            if matches!(self.nodes[node].kind, NodeKind::Letter(_)) {
                out.push(node);
            }
            return;
        }
        for &child in children {
            self.collect_leaves(child, out);
        }
    }

    /// The subset of [`ParseTree::leaves`] whose letter is a variable.
    pub fn variable_leaves(&self) -> Vec<NodeId> {
        self.leaves()
            .into_iter()
            .filter(|&id| self.letter(id).is_some_and(Letter::is_variable))
            .collect()
    }

    /// Pops the last logged branch operation and detaches its nodes from
    /// their parent. Fails when the undo log is empty — in particular, the
    /// initial root expansion can never be undone.
    pub fn undo(&mut self) -> Result<(), NothingToUndo> {
        let detached = self.undo_log.pop().ok_or(NothingToUndo)?;
        for id in detached {
            if let Some(parent) = self.nodes[id].parent {
                self.nodes[parent].children.retain(|&child| child != id);
            }
        }
        Ok(())
    }

    /// The leftmost derivation as a sequence of node-lists: starting from
    /// the root's children, at each step the leftmost node with children is
    /// replaced in place by its children (flattening one level), until no
    /// node in the list has children. Yields n+1 snapshots for an n-step
    /// derivation.
    pub fn node_derivation(&self) -> Vec<Vec<NodeId>> {
        let mut steps = vec![self.nodes[self.root].children.clone()];
        loop {
            let current = steps.last().unwrap();
            let expand_at = current
                .iter()
                .position(|&id| !self.nodes[id].children.is_empty());
            match expand_at {
                None => break,
                Some(index) => {
                    let mut next = current.clone();
                    let expanded = self.nodes[current[index]].children.clone();
                    next.splice(index..=index, expanded);
                    steps.push(next);
                }
            }
        }
        steps
    }

    /// Projects [`ParseTree::node_derivation`], keeping only LETTER nodes
    /// and extracting their letters.
    pub fn letter_derivation(&self) -> Vec<Vec<Letter>> {
        self.node_derivation()
            .into_iter()
            .map(|nodes| {
                nodes
                    .into_iter()
                    .filter_map(|id| self.letter(id).cloned())
                    .collect()
            })
            .collect()
    }

    /// The leftmost derivation rendered as `word -> word -> ... -> word`.
    pub fn string_derivation(&self) -> String {
        self.letter_derivation()
            .iter()
            .map(|word| {
                word.iter()
                    .map(|l| l.name().to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Two-line rendering of the current leaves: their names on the first
    /// line, with variables numbered left-to-right starting at 0 on the
    /// second, used by the interactive driver's prompt.
    pub fn indexed_state(&self) -> String {
        let leaves = self.leaves();
        let mut names = Vec::with_capacity(leaves.len());
        let mut labels = Vec::with_capacity(leaves.len());
        let mut var_index = 0;
        for &id in &leaves {
            let letter = self.letter(id).expect("leaf must carry a letter");
            let label = if letter.is_variable() {
                let s = var_index.to_string();
                var_index += 1;
                s
            } else {
                String::new()
            };
            let width = letter.name().chars().count().max(label.chars().count());
            names.push(format!("{:>width$}", letter.name(), width = width));
            labels.push(format!("{:>width$}", label, width = width));
        }
        format!("{}\n{}", names.join(" "), labels.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letter(name: &str, is_variable: bool) -> Letter {
        Letter::new(name, is_variable)
    }

    #[test]
    fn initial_expansion_is_not_undoable() {
        let mut tree = ParseTree::new(&[letter("S", true)]);
        assert_eq!(tree.undo(), Err(NothingToUndo));
    }

    #[test]
    fn branch_word_with_empty_word_adds_epsilon_meta_node() {
        let mut tree = ParseTree::new(&[letter("S", true)]);
        let s_leaf = tree.variable_leaves()[0];
        tree.branch_word(s_leaf, &[], true);
        assert!(tree.leaves().is_empty());
    }

    #[test]
    fn undo_restores_leaves() {
        let mut tree = ParseTree::new(&[letter("S", true)]);
        let before = tree.indexed_state();
        let s_leaf = tree.variable_leaves()[0];
        tree.branch_word(s_leaf, &[letter("a", false), letter("S", true)], true);
        assert_ne!(tree.indexed_state(), before);
        tree.undo().unwrap();
        assert_eq!(tree.indexed_state(), before);
    }

    #[test]
    fn node_derivation_has_one_more_snapshot_than_steps() {
        let mut tree = ParseTree::new(&[letter("S", true)]);
        let s_leaf = tree.variable_leaves()[0];
        tree.branch_word(s_leaf, &[letter("a", false), letter("S", true)], true);
        let s_leaf2 = tree.variable_leaves()[0];
        tree.branch_word(s_leaf2, &[letter("b", false)], true);
        assert_eq!(tree.node_derivation().len(), 3);
        let ld = tree.letter_derivation();
        assert_eq!(ld[0], vec![letter("S", true)]);
        assert_eq!(ld[2], vec![letter("a", false), letter("b", false)]);
    }
}
