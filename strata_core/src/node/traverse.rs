// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use core::slice;

use super::id::NodeId;
use super::store::SceneGraph;

/// An iterator over the direct children of a node, front-most first.
///
/// Created by [`SceneGraph::children`].
#[derive(Debug)]
pub struct Children<'a> {
    graph: &'a SceneGraph,
    inner: slice::Iter<'a, u32>,
}

impl<'a> Children<'a> {
    pub(crate) fn new(graph: &'a SceneGraph, slots: &'a [u32]) -> Self {
        Self {
            graph,
            inner: slots.iter(),
        }
    }
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let idx = *self.inner.next()?;
        Some(self.graph.handle(idx))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Children<'_> {
    fn next_back(&mut self) -> Option<NodeId> {
        let idx = *self.inner.next_back()?;
        Some(self.graph.handle(idx))
    }
}

impl ExactSizeIterator for Children<'_> {}

/// Depth-first pre-order walk over a subtree, front-most children first.
///
/// Created by [`SceneGraph::descendants`]. The starting node is yielded first.
#[derive(Debug)]
pub struct Descendants<'a> {
    graph: &'a SceneGraph,
    stack: alloc::vec::Vec<u32>,
}

impl<'a> Descendants<'a> {
    pub(crate) fn new(graph: &'a SceneGraph, start: u32) -> Self {
        let mut stack = alloc::vec::Vec::new();
        stack.push(start);
        Self { graph, stack }
    }
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let idx = self.stack.pop()?;
        // Push in reverse so the front-most child is visited next.
        self.stack
            .extend(self.graph.children[idx as usize].iter().rev().copied());
        Some(self.graph.handle(idx))
    }
}
