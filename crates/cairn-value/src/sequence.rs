//! Persistent chunked sequence shared by `List`, `Map`, and `Set`.
//!
//! [`Sequence`] is a B-tree shaped rope: elements live in leaf chunks of at
//! most `leaf_capacity` items, leaves hang under branches of at most
//! `branch_capacity` children, and every leaf sits at the same depth.
//! Updates copy only the path from the root to the touched leaves; every
//! other subtree is shared with the original through `Arc`.
//!
//! # Invariants
//!
//! - All leaves are at the same depth.
//! - Only the root may be an empty leaf; branches never hold empty children.
//! - No node exceeds its capacity.
//! - A branch's cached `len` equals the sum of its children's lengths.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::config::CollectionConfig;
use crate::error::{ValueError, ValueResult};

enum Node<T> {
    Leaf(Arc<Vec<T>>),
    Branch(Arc<Branch<T>>),
}

struct Branch<T> {
    children: Vec<Node<T>>,
    len: usize,
}

impl<T> Clone for Node<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Leaf(items) => Self::Leaf(Arc::clone(items)),
            Self::Branch(branch) => Self::Branch(Arc::clone(branch)),
        }
    }
}

impl<T> Node<T> {
    fn empty() -> Self {
        Self::Leaf(Arc::new(Vec::new()))
    }

    fn branch(children: Vec<Node<T>>) -> Self {
        let len = children.iter().map(Node::len).sum();
        Self::Branch(Arc::new(Branch { children, len }))
    }

    fn len(&self) -> usize {
        match self {
            Self::Leaf(items) => items.len(),
            Self::Branch(branch) => branch.len,
        }
    }

    fn is_underfull(&self, config: &CollectionConfig) -> bool {
        match self {
            Self::Leaf(items) => items.len() < config.leaf_capacity / 2,
            Self::Branch(branch) => branch.children.len() < config.branch_capacity / 2,
        }
    }

    fn last(&self) -> Option<&T> {
        let mut node = self;
        loop {
            match node {
                Self::Leaf(items) => return items.last(),
                Self::Branch(branch) => node = branch.children.last()?,
            }
        }
    }
}

impl<T> Branch<T> {
    /// Child index holding `index`, and the offset of `index` inside it.
    fn locate(&self, index: usize) -> Option<(usize, usize)> {
        let mut remaining = index;
        for (i, child) in self.children.iter().enumerate() {
            let n = child.len();
            if remaining < n {
                return Some((i, remaining));
            }
            remaining -= n;
        }
        None
    }
}

/// Split `items` into the fewest pieces of at most `cap` entries, sized as
/// evenly as possible.
fn split_even<U>(items: Vec<U>, cap: usize) -> Vec<Vec<U>> {
    let len = items.len();
    if len <= cap {
        return vec![items];
    }
    let pieces = len.div_ceil(cap);
    let base = len / pieces;
    let extra = len % pieces;
    let mut iter = items.into_iter();
    (0..pieces)
        .map(|i| iter.by_ref().take(base + usize::from(i < extra)).collect())
        .collect()
}

fn leaves<T>(items: Vec<T>, config: &CollectionConfig) -> Vec<Node<T>> {
    split_even(items, config.leaf_capacity)
        .into_iter()
        .map(|chunk| Node::Leaf(Arc::new(chunk)))
        .collect()
}

fn branches<T>(children: Vec<Node<T>>, config: &CollectionConfig) -> Vec<Node<T>> {
    split_even(children, config.branch_capacity)
        .into_iter()
        .map(Node::branch)
        .collect()
}

/// Stack sibling nodes of equal height under new branches until one root
/// remains.
fn grow_root<T>(mut nodes: Vec<Node<T>>, config: &CollectionConfig) -> Node<T> {
    while nodes.len() > 1 {
        nodes = branches(nodes, config);
    }
    nodes.pop().unwrap_or_else(Node::empty)
}

fn collapse_root<T>(mut root: Node<T>) -> Node<T> {
    while let Some(only) = sole_child(&root) {
        root = only;
    }
    root
}

fn sole_child<T>(node: &Node<T>) -> Option<Node<T>> {
    match node {
        Node::Branch(branch) if branch.children.len() == 1 => Some(branch.children[0].clone()),
        _ => None,
    }
}

fn set_at<T: Clone>(node: &Node<T>, index: usize, item: T) -> Node<T> {
    match node {
        Node::Leaf(items) => {
            let mut items = (**items).clone();
            items[index] = item;
            Node::Leaf(Arc::new(items))
        }
        Node::Branch(branch) => {
            let (c, offset) = branch
                .locate(index)
                .unwrap_or((branch.children.len() - 1, 0));
            let mut children = branch.children.clone();
            children[c] = set_at(&branch.children[c], offset, item);
            Node::Branch(Arc::new(Branch {
                children,
                len: branch.len,
            }))
        }
    }
}

/// Insert `items` before `index`, returning one or more siblings that
/// replace `node` at its level.
fn insert_at<T: Clone>(
    node: &Node<T>,
    index: usize,
    items: Vec<T>,
    config: &CollectionConfig,
) -> Vec<Node<T>> {
    match node {
        Node::Leaf(existing) => {
            let mut merged = Vec::with_capacity(existing.len() + items.len());
            merged.extend_from_slice(&existing[..index]);
            merged.extend(items);
            merged.extend_from_slice(&existing[index..]);
            leaves(merged, config)
        }
        Node::Branch(branch) => {
            let last = branch.children.len() - 1;
            let (c, offset) = branch
                .locate(index)
                .unwrap_or((last, branch.children[last].len()));
            let pieces = insert_at(&branch.children[c], offset, items, config);
            let mut children = branch.children.clone();
            children.splice(c..=c, pieces);
            branches(children, config)
        }
    }
}

/// Remove `[start, end)` from `node`. Returns `None` when nothing is left.
fn remove_range<T: Clone>(
    node: &Node<T>,
    start: usize,
    end: usize,
    config: &CollectionConfig,
) -> Option<Node<T>> {
    match node {
        Node::Leaf(items) => {
            if start == 0 && end == items.len() {
                return None;
            }
            let mut kept = Vec::with_capacity(items.len() - (end - start));
            kept.extend_from_slice(&items[..start]);
            kept.extend_from_slice(&items[end..]);
            Some(Node::Leaf(Arc::new(kept)))
        }
        Node::Branch(branch) => {
            let mut kept = Vec::with_capacity(branch.children.len());
            let mut offset = 0;
            for child in &branch.children {
                let n = child.len();
                let (child_start, child_end) = (offset, offset + n);
                offset = child_end;
                if child_end <= start || child_start >= end {
                    kept.push(child.clone());
                    continue;
                }
                let local_start = start.saturating_sub(child_start);
                let local_end = end.min(child_end) - child_start;
                if local_start == 0 && local_end == n {
                    continue;
                }
                if let Some(rest) = remove_range(child, local_start, local_end, config) {
                    kept.push(rest);
                }
            }
            if kept.is_empty() {
                None
            } else {
                Some(Node::branch(merge_underfull(kept, config)))
            }
        }
    }
}

/// Fold underfull siblings into their left neighbour, re-splitting any
/// merge that overflows.
fn merge_underfull<T: Clone>(children: Vec<Node<T>>, config: &CollectionConfig) -> Vec<Node<T>> {
    let mut out: Vec<Node<T>> = Vec::with_capacity(children.len());
    for child in children {
        match out.pop() {
            Some(prev) if prev.is_underfull(config) || child.is_underfull(config) => {
                out.extend(merge_pair(prev, child, config));
            }
            Some(prev) => {
                out.push(prev);
                out.push(child);
            }
            None => out.push(child),
        }
    }
    out
}

fn merge_pair<T: Clone>(left: Node<T>, right: Node<T>, config: &CollectionConfig) -> Vec<Node<T>> {
    match (&left, &right) {
        (Node::Leaf(a), Node::Leaf(b)) => {
            let mut items = Vec::with_capacity(a.len() + b.len());
            items.extend_from_slice(a);
            items.extend_from_slice(b);
            leaves(items, config)
        }
        (Node::Branch(a), Node::Branch(b)) => {
            let mut children = Vec::with_capacity(a.children.len() + b.children.len());
            children.extend(a.children.iter().cloned());
            children.extend(b.children.iter().cloned());
            branches(children, config)
        }
        // siblings always share a height
        _ => vec![left, right],
    }
}

/// Immutable, structurally shared sequence.
pub(crate) struct Sequence<T> {
    root: Node<T>,
    config: CollectionConfig,
}

impl<T> Clone for Sequence<T> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            config: self.config,
        }
    }
}

impl<T: Clone> Sequence<T> {
    pub(crate) fn new(config: CollectionConfig) -> Self {
        Self {
            root: Node::empty(),
            config: config.clamped(),
        }
    }

    /// Bulk construction: chunk the items bottom-up in one pass.
    pub(crate) fn from_vec(items: Vec<T>, config: CollectionConfig) -> Self {
        if items.is_empty() {
            return Self::new(config);
        }
        let config = config.clamped();
        let root = grow_root(leaves(items, &config), &config);
        Self { root, config }
    }

    pub(crate) fn config(&self) -> CollectionConfig {
        self.config
    }

    pub(crate) fn len(&self) -> usize {
        self.root.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        let mut node = &self.root;
        let mut index = index;
        loop {
            match node {
                Node::Leaf(items) => return items.get(index),
                Node::Branch(branch) => {
                    let (c, offset) = branch.locate(index)?;
                    node = &branch.children[c];
                    index = offset;
                }
            }
        }
    }

    pub(crate) fn first(&self) -> Option<&T> {
        self.get(0)
    }

    pub(crate) fn last(&self) -> Option<&T> {
        self.root.last()
    }

    pub(crate) fn set(&self, index: usize, item: T) -> ValueResult<Self> {
        let len = self.len();
        if index >= len {
            return Err(ValueError::OutOfBounds { index, len });
        }
        Ok(Self {
            root: set_at(&self.root, index, item),
            config: self.config,
        })
    }

    pub(crate) fn insert(&self, index: usize, items: Vec<T>) -> ValueResult<Self> {
        let len = self.len();
        if index > len {
            return Err(ValueError::OutOfBounds { index, len });
        }
        if items.is_empty() {
            return Ok(self.clone());
        }
        let pieces = insert_at(&self.root, index, items, &self.config);
        Ok(Self {
            root: grow_root(pieces, &self.config),
            config: self.config,
        })
    }

    pub(crate) fn append(&self, items: Vec<T>) -> Self {
        if items.is_empty() {
            return self.clone();
        }
        let pieces = insert_at(&self.root, self.len(), items, &self.config);
        Self {
            root: grow_root(pieces, &self.config),
            config: self.config,
        }
    }

    pub(crate) fn remove(&self, start: usize, end: usize) -> ValueResult<Self> {
        let len = self.len();
        if start > end || end > len {
            return Err(ValueError::InvalidRange { start, end, len });
        }
        if start == end {
            return Ok(self.clone());
        }
        let root = remove_range(&self.root, start, end, &self.config)
            .map(collapse_root)
            .unwrap_or_else(Node::empty);
        Ok(Self {
            root,
            config: self.config,
        })
    }

    pub(crate) fn slice(&self, start: usize, end: usize) -> ValueResult<Self> {
        let len = self.len();
        if start > end || end > len {
            return Err(ValueError::InvalidRange { start, end, len });
        }
        self.remove(end, len)?.remove(0, start)
    }

    /// Binary search over a sequence sorted consistently with `f`.
    ///
    /// `f` reports how an element orders relative to the target, exactly as
    /// for [`slice::binary_search_by`].
    pub(crate) fn search_by<F>(&self, f: F) -> Result<usize, usize>
    where
        F: Fn(&T) -> Ordering,
    {
        let mut node = &self.root;
        let mut base = 0;
        loop {
            match node {
                Node::Leaf(items) => {
                    return items
                        .binary_search_by(|item| f(item))
                        .map(|i| base + i)
                        .map_err(|i| base + i);
                }
                Node::Branch(branch) => {
                    let pos = branch
                        .children
                        .partition_point(|child| child.last().map_or(true, |last| f(last) == Ordering::Less));
                    if pos == branch.children.len() {
                        return Err(base + branch.len);
                    }
                    base += branch.children[..pos].iter().map(Node::len).sum::<usize>();
                    node = &branch.children[pos];
                }
            }
        }
    }

    /// Replaces the element `f` matches, or inserts `item` where the search
    /// says it belongs.
    pub(crate) fn upsert_by<F>(&self, f: F, item: T) -> Self
    where
        F: Fn(&T) -> Ordering,
    {
        let root = match self.search_by(f) {
            Ok(index) => set_at(&self.root, index, item),
            Err(index) => grow_root(
                insert_at(&self.root, index, vec![item], &self.config),
                &self.config,
            ),
        };
        Self {
            root,
            config: self.config,
        }
    }

    /// Drops the element `f` matches. `None` when nothing matches.
    pub(crate) fn remove_by<F>(&self, f: F) -> Option<Self>
    where
        F: Fn(&T) -> Ordering,
    {
        let index = self.search_by(f).ok()?;
        let root = remove_range(&self.root, index, index + 1, &self.config)
            .map(collapse_root)
            .unwrap_or_else(Node::empty);
        Some(Self {
            root,
            config: self.config,
        })
    }

    pub(crate) fn iter(&self) -> Iter<'_, T> {
        Iter {
            stack: vec![(&self.root, 0)],
            remaining: self.len(),
        }
    }

    pub(crate) fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

impl<T: fmt::Debug + Clone> fmt::Debug for Sequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Depth-first, in-order iterator over a persistent sequence.
pub struct Iter<'a, T> {
    stack: Vec<(&'a Node<T>, usize)>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        loop {
            let top = self.stack.last_mut()?;
            let node: &'a Node<T> = top.0;
            let idx = top.1;
            top.1 += 1;
            match node {
                Node::Leaf(items) => match items.get(idx) {
                    Some(item) => {
                        self.remaining -= 1;
                        return Some(item);
                    }
                    None => {
                        self.stack.pop();
                    }
                },
                Node::Branch(branch) => match branch.children.get(idx) {
                    Some(child) => self.stack.push((child, 0)),
                    None => {
                        self.stack.pop();
                    }
                },
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
