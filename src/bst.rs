//! A key-ordered binary search tree with single-parent ancestry.
//!
//! Unlike a [`DirectedAcyclicGraph`](crate::DirectedAcyclicGraph), every node
//! has exactly one path from the root, so the lowest common ancestor of two
//! keys is found by descending until the keys fall on different sides.
//!
//! Nodes are never removed.  Inserting an existing key replaces its value in
//! place and never restructures the tree.

use std::cmp::Ordering;
use std::fmt;

type Link<K, V> = Option<Box<Node<K, V>>>;

struct Node<K, V> {
    key: K,
    value: V,
    left: Link<K, V>,
    right: Link<K, V>,
}

impl<K, V> Node<K, V> {
    fn leaf(key: K, value: V) -> Self {
        Self {
            key,
            value,
            left: None,
            right: None,
        }
    }
}

pub struct BinarySearchTree<K, V> {
    root: Link<K, V>,
    len: usize,
}

impl<K, V> Drop for BinarySearchTree<K, V> {
    fn drop(&mut self) {
        // Unlink nodes one at a time; the default drop recurses once per level.
        let mut to_drop: Vec<Box<Node<K, V>>> = self.root.take().into_iter().collect();
        while let Some(mut node) = to_drop.pop() {
            to_drop.extend(node.left.take());
            to_drop.extend(node.right.take());
        }
    }
}

impl<K, V> Default for BinarySearchTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> BinarySearchTree<K, V> {
    pub fn new() -> Self {
        Self { root: None, len: 0 }
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of levels; 0 for an empty tree.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut level: Vec<&Node<K, V>> = self.root.as_deref().into_iter().collect();
        while !level.is_empty() {
            height += 1;
            level = level
                .into_iter()
                .flat_map(|node| node.left.as_deref().into_iter().chain(node.right.as_deref()))
                .collect();
        }
        height
    }
}

impl<K: Ord, V> BinarySearchTree<K, V> {
    /// Inserts `key` with `value`, replacing the value if `key` is already
    /// present.
    pub fn insert(&mut self, key: K, value: V) {
        let mut slot = &mut self.root;
        while let Some(node) = slot {
            slot = match key.cmp(&node.key) {
                Ordering::Less => &mut node.left,
                Ordering::Greater => &mut node.right,
                Ordering::Equal => {
                    node.value = value;
                    return;
                }
            };
        }
        *slot = Some(Box::new(Node::leaf(key, value)));
        self.len += 1;
    }

    fn find(&self, key: &K) -> Option<&Node<K, V>> {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            current = match key.cmp(&node.key) {
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
                Ordering::Equal => return Some(node),
            };
        }
        None
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.find(key).map(|node| &node.value)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let mut current = self.root.as_deref_mut();
        while let Some(node) = current {
            match key.cmp(&node.key) {
                Ordering::Less => current = node.left.as_deref_mut(),
                Ordering::Greater => current = node.right.as_deref_mut(),
                Ordering::Equal => return Some(&mut node.value),
            }
        }
        None
    }

    pub fn contains(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Keys visited on the way from the root down to `key`, both ends
    /// included.  `None` if `key` is not in the tree.
    pub fn ancestor_path(&self, key: &K) -> Option<Vec<&K>> {
        let mut path = Vec::new();
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            path.push(&node.key);
            current = match key.cmp(&node.key) {
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
                Ordering::Equal => return Some(path),
            };
        }
        None
    }

    /// The deepest key whose subtree holds both `key1` and `key2`.  A key is
    /// its own ancestor, so if one key sits above the other it is the answer.
    ///
    /// `None` if either key is not in the tree.
    pub fn lowest_common_ancestor(&self, key1: &K, key2: &K) -> Option<&K> {
        if !self.contains(key1) || !self.contains(key2) {
            return None;
        }

        let mut current = self.root.as_deref();
        while let Some(node) = current {
            current = match (key1.cmp(&node.key), key2.cmp(&node.key)) {
                (Ordering::Less, Ordering::Less) => node.left.as_deref(),
                (Ordering::Greater, Ordering::Greater) => node.right.as_deref(),
                _ => return Some(&node.key),
            };
        }
        // Both keys are present, so the descent always stops at a node.
        None
    }
}

/// Pending output of the tree renderer.
enum RenderStep<'a, K, V> {
    Subtree(&'a Link<K, V>, usize),
    Entry(&'a Node<K, V>, usize),
    Close,
}

/// Fully parenthesized: an empty subtree is `x`, a node is
/// `( <left> ) <key>:<value>[<depth>] ( <right> )` with the root at depth 0.
impl<K: fmt::Display, V: fmt::Display> fmt::Display for BinarySearchTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut steps = vec![RenderStep::Subtree(&self.root, 0)];
        while let Some(step) = steps.pop() {
            match step {
                RenderStep::Subtree(None, _) => write!(f, "x")?,
                RenderStep::Subtree(Some(node), depth) => {
                    write!(f, "( ")?;
                    // Pushed in reverse output order.
                    steps.push(RenderStep::Close);
                    steps.push(RenderStep::Subtree(&node.right, depth + 1));
                    steps.push(RenderStep::Entry(node, depth));
                    steps.push(RenderStep::Subtree(&node.left, depth + 1));
                }
                RenderStep::Entry(node, depth) => {
                    write!(f, " ) {}:{}[{}] ( ", node.key, node.value, depth)?
                }
                RenderStep::Close => write!(f, " )")?,
            }
        }
        Ok(())
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for BinarySearchTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // In-order, i.e. sorted by key.
        let mut entries = f.debug_map();
        let mut stack: Vec<&Node<K, V>> = Vec::new();
        let mut current = self.root.as_deref();
        while current.is_some() || !stack.is_empty() {
            while let Some(node) = current {
                stack.push(node);
                current = node.left.as_deref();
            }
            if let Some(node) = stack.pop() {
                entries.entry(&node.key, &node.value);
                current = node.right.as_deref();
            }
        }
        entries.finish()
    }
}
