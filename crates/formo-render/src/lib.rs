#![forbid(unsafe_code)]

//! Reflow engine for SVG templates (headless).
//!
//! The pipeline renders a parsed template against JSON data: bindings resolve onto text, image
//! and color targets; width-constrained text re-wraps through pluggable glyph metrics; and the
//! resulting height change cascades through containing shapes, clip regions, filters and the
//! document root. Geometry resolution is the only suspension point, so the entry points are
//! async but runtime-agnostic (no specific executor required).

pub mod bindings;
pub mod cascade;
mod coords;
pub mod error;
pub mod geometry;
pub mod text;

pub use bindings::apply_bindings;
pub use cascade::{HeightChange, cascade_height_change};
pub use error::{Error, Result};
pub use geometry::{ApproxGeometry, BoundsMap, GeometryProvider};
pub use text::wrap::break_text_into_lines;
pub use text::{EmTableGlyphMetrics, FontSpec, GlyphMetrics};

use formo_core::{Binding, Component, DataSources, parse_document, serialize_document};

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Keep referenced filter widths pinned to the constrained text width while that mode is
    /// active.
    pub sync_filter_width: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            sync_filter_width: true,
        }
    }
}

/// Renders a template against its bindings, components and data sources.
///
/// The tree is built once per call, mutated in place by the binding and cascade steps, and
/// discarded after serialization; no state is shared across concurrent renders. Template errors
/// are returned; binding resolution misses are silently ignored.
pub async fn render_template<G: GeometryProvider>(
    markup: &str,
    bindings: &[Binding],
    components: &[Component],
    data: &DataSources,
    metrics: &dyn GlyphMetrics,
    geometry: &G,
    options: &RenderOptions,
) -> Result<String> {
    let mut tree = parse_document(markup)?;
    apply_bindings(
        &mut tree, bindings, components, data, metrics, geometry, options,
    )
    .await?;
    Ok(serialize_document(&tree))
}
