//! Build-time binary trie
//!
//! [`IpTrie`] is the mutable side of the index. It is filled row by row
//! during a load and then flattened into a [`CompactIndex`] by
//! [`IpTrie::build_index`]. Nodes live in an arena and refer to their
//! children by arena id, so the tree never holds pointers.

use crate::compact_index::{CompactIndex, CompactNode, NO_VALUE};

/// A node in the arena
#[derive(Debug, Clone, Default)]
struct Node {
    /// Child for bit 0
    left: Option<u32>,
    /// Child for bit 1
    right: Option<u32>,
    /// Slot in the value array, if a prefix ends here
    value: Option<u32>,
}

/// Mutable binary trie keyed by bit sequences
#[derive(Debug, Clone)]
pub struct IpTrie<V> {
    /// All nodes in the tree (arena), root at 0
    nodes: Vec<Node>,
    /// Values, addressed by the nodes' value slots
    values: Vec<V>,
}

impl<V> Default for IpTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> IpTrie<V> {
    /// Create an empty trie (root only)
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
            values: Vec::new(),
        }
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if nothing was inserted
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of nodes, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Insert a value under a key
    ///
    /// Missing nodes along the path are created. Inserting the same key
    /// twice overwrites the value in its existing slot.
    pub fn insert<I>(&mut self, key: I, value: V)
    where
        I: IntoIterator<Item = bool>,
    {
        let mut node_id = 0u32;

        for bit in key {
            let child = {
                let node = &self.nodes[node_id as usize];
                if bit {
                    node.right
                } else {
                    node.left
                }
            };

            node_id = match child {
                Some(child_id) => child_id,
                None => {
                    let new_id = self.allocate_node();
                    let node = &mut self.nodes[node_id as usize];
                    if bit {
                        node.right = Some(new_id);
                    } else {
                        node.left = Some(new_id);
                    }
                    new_id
                }
            };
        }

        match self.nodes[node_id as usize].value {
            Some(slot) => self.values[slot as usize] = value,
            None => {
                let slot = self.values.len() as u32;
                self.values.push(value);
                self.nodes[node_id as usize].value = Some(slot);
            }
        }
    }

    /// Longest-prefix lookup
    ///
    /// `key` should be a full-width address key. Every node on the path
    /// that carries a value replaces the current best match; the walk
    /// stops at the first missing child.
    pub fn lookup_prefix<I>(&self, key: I) -> Option<&V>
    where
        I: IntoIterator<Item = bool>,
    {
        let mut node = &self.nodes[0];
        let mut best = node.value;

        for bit in key {
            let child = if bit { node.right } else { node.left };
            match child {
                Some(child_id) => {
                    node = &self.nodes[child_id as usize];
                    if node.value.is_some() {
                        best = node.value;
                    }
                }
                None => break,
            }
        }

        best.map(|slot| &self.values[slot as usize])
    }

    /// Allocate a new node and return its ID
    fn allocate_node(&mut self) -> u32 {
        let id = self.nodes.len() as u32;
        self.nodes.push(Node::default());
        id
    }

    /// Flatten the trie into an immutable [`CompactIndex`]
    ///
    /// Nodes are numbered in pre-order starting with the root at 0, so
    /// 0 never appears as a child offset and can mean "no child". The
    /// value array is moved over unchanged.
    pub fn build_index(self) -> CompactIndex<V> {
        // Pass 1: assign offsets in pre-order
        let mut offsets = vec![0u32; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![0u32];

        while let Some(id) = stack.pop() {
            offsets[id as usize] = order.len() as u32;
            order.push(id);

            let node = &self.nodes[id as usize];
            // Right is pushed first so the left subtree is visited first
            if let Some(right) = node.right {
                stack.push(right);
            }
            if let Some(left) = node.left {
                stack.push(left);
            }
        }

        // Pass 2: write one record per visited node
        let compact = order
            .iter()
            .map(|&id| {
                let node = &self.nodes[id as usize];
                CompactNode {
                    value: node.value.map(|slot| slot as i32).unwrap_or(NO_VALUE),
                    left: node.left.map(|c| offsets[c as usize]).unwrap_or(0),
                    right: node.right.map(|c| offsets[c as usize]).unwrap_or(0),
                }
            })
            .collect();

        CompactIndex::from_parts(compact, self.values)
    }
}
