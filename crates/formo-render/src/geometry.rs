//! Bounding-box resolution for document snapshots.
//!
//! The cascade engine never hand-computes candidate bounds: it serializes the current tree once
//! per cascade and asks a [`GeometryProvider`] for every node's box. Providers are modeled as
//! asynchronous request/response (a browser-backed measurer suspends; the built-in one does
//! not) with no implied concurrency between calls.

mod approx;

pub use approx::ApproxGeometry;

use crate::error::Result;
use formo_core::ElementBounds;
use std::collections::HashMap;

/// Bounds per node id, for one serialized snapshot.
pub type BoundsMap = HashMap<String, ElementBounds>;

/// Resolves precise axis-aligned bounding boxes for a serialized document snapshot.
///
/// Implementations must special-case the document root by reading its `width`/`height`
/// attributes rather than attempting visual measurement. A missing id in the returned map is
/// not an error; the cascade treats it as "this candidate is not a containment match".
pub trait GeometryProvider {
    fn resolve_bounds(
        &self,
        svg_snapshot: &str,
    ) -> impl Future<Output = Result<BoundsMap>> + Send;
}
