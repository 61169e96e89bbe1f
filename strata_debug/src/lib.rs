// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trace sinks and scene export for strata diagnostics.
//!
//! - [`pretty::PrettyPrintSink`]: human-readable, one line per event.
//! - [`summary::SummaryLog`]: keeps frame summaries for aggregation and
//!   JSON export.
//! - [`scene`]: JSON description of a scene graph.

pub mod pretty;
pub mod scene;
pub mod summary;
