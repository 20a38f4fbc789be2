//! Compacted, pointer-free trie
//!
//! The compacted index is an array of fixed-size [`CompactNode`] records
//! plus the value array carried over from the [`IpTrie`](crate::ip_trie::IpTrie).
//! Children are addressed by offset into the node array. Offset 0 is the
//! root; since the root is never anyone's child, a child offset of 0
//! means "no child".
//!
//! ```text
//! offset  value  left  right
//!   0      -1     1     3      root
//!   1      -1     0     2
//!   2       0     0     0      prefix "01" -> values[0]
//!   3       1     0     0      prefix "1"  -> values[1]
//! ```

/// Value slot marker for nodes where no prefix ends
pub const NO_VALUE: i32 = -1;

/// One node record of the compacted index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactNode {
    /// Slot in the value array, or [`NO_VALUE`]
    pub value: i32,
    /// Offset of the bit-0 child, 0 if absent
    pub left: u32,
    /// Offset of the bit-1 child, 0 if absent
    pub right: u32,
}

impl CompactNode {
    #[inline]
    fn child(&self, bit: bool) -> u32 {
        if bit {
            self.right
        } else {
            self.left
        }
    }

    #[inline]
    fn slot(&self) -> Option<usize> {
        if self.value >= 0 {
            Some(self.value as usize)
        } else {
            None
        }
    }
}

/// Immutable longest-prefix index over flat arrays
#[derive(Debug, Clone)]
pub struct CompactIndex<V> {
    nodes: Box<[CompactNode]>,
    values: Box<[V]>,
}

impl<V> CompactIndex<V> {
    /// Assemble an index from its node and value arrays
    ///
    /// The node array must be non-empty, with the root at offset 0.
    pub(crate) fn from_parts(nodes: Vec<CompactNode>, values: Vec<V>) -> Self {
        debug_assert!(!nodes.is_empty(), "compact index needs a root node");
        Self {
            nodes: nodes.into_boxed_slice(),
            values: values.into_boxed_slice(),
        }
    }

    /// Number of node records
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Node record at `offset`
    pub fn node(&self, offset: u32) -> Option<&CompactNode> {
        self.nodes.get(offset as usize)
    }

    /// All stored values
    pub fn values(&self) -> &[V] {
        &self.values
    }

    /// Value in slot `slot`
    pub fn value(&self, slot: usize) -> Option<&V> {
        self.values.get(slot)
    }

    /// Walk `bits` from `start` and return the deepest value slot seen
    ///
    /// The start node itself counts. Returns `None` when no node on the
    /// path carries a value or `start` is out of range.
    pub fn find_value_index<I>(&self, bits: I, start: u32) -> Option<usize>
    where
        I: IntoIterator<Item = bool>,
    {
        let mut node = self.nodes.get(start as usize)?;
        let mut best = node.slot();

        for bit in bits {
            let child = node.child(bit);
            if child == 0 {
                break;
            }
            node = &self.nodes[child as usize];
            if let Some(slot) = node.slot() {
                best = Some(slot);
            }
        }

        best
    }

    /// Walk the whole of `bits` from `*offset` and move `*offset` to the node reached
    ///
    /// Returns `false` and leaves `*offset` alone if the path runs into
    /// a missing child before the bits are used up.
    pub fn find_offset<I>(&self, bits: I, offset: &mut u32) -> bool
    where
        I: IntoIterator<Item = bool>,
    {
        let Some(mut node) = self.nodes.get(*offset as usize) else {
            return false;
        };
        let mut current = *offset;

        for bit in bits {
            let child = node.child(bit);
            if child == 0 {
                return false;
            }
            current = child;
            node = &self.nodes[child as usize];
        }

        *offset = current;
        true
    }

    /// Longest-prefix lookup starting at `start`, resolved to the value
    #[inline]
    pub fn lookup_from<I>(&self, bits: I, start: u32) -> Option<&V>
    where
        I: IntoIterator<Item = bool>,
    {
        self.find_value_index(bits, start)
            .and_then(|slot| self.values.get(slot))
    }
}
