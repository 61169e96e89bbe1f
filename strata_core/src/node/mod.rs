// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene graph data model.
//!
//! A *node* is one element of the visual tree. Each node has:
//!
//! - An identity ([`NodeId`]), a generational handle that becomes stale when
//!   the node is destroyed.
//! - Topology: an optional parent and an ordered list of owned children.
//!   Index 0 is the front-most child; painting goes back to front.
//! - An enablement counter. Disabling nests: a node disabled twice needs two
//!   enables before it becomes active again.
//! - A `structure` flag. Structure nodes are part of the fixed skeleton and
//!   keep their relative order through [`set_children_list`](SceneGraph::set_children_list).
//! - A [`NodeKind`] carrying the per-kind data.
//!
//! # Coordinate spaces
//!
//! A node's bounding box lives in its parent's space; its children's boxes
//! live in its *content space*. The two are identical except for output
//! nodes (offset by the layout origin), views (offset by the view origin,
//! then mapped by the view transform) and surfaces (offset within the view).
//! Damage reported on a node is in its content space.
//!
//! # Notifications
//!
//! Structural changes walk up to the root and call every listener registered
//! with [`connect_update`](SceneGraph::connect_update) once, synchronously.
//! They also mark dirty channels (see [`dirty`](crate::dirty)) so a renderer
//! can drain the affected nodes once per frame.

mod id;
mod kind;
mod notify;
mod query;
mod store;
mod traverse;

pub use id::{INVALID, NodeId, SurfaceId};
pub use kind::NodeKind;
pub use query::InputNode;
pub use store::SceneGraph;
pub use traverse::{Children, Descendants};
