#![forbid(unsafe_code)]

//! `formo` renders SVG templates against arbitrary JSON data.
//!
//! A template is an SVG document whose elements carry stable ids; bindings link data-source
//! fields to text, image and color components attached to those elements. Width-constrained
//! text is re-wrapped with real glyph metrics, and the resulting height change cascades
//! through backgrounds, clip regions, filters and the canvas so the layout stays visually
//! consistent.
//!
//! The async entry points are runtime-agnostic: the only suspension point is the geometry
//! provider, and the built-in [`ApproxGeometry`] never actually suspends. `_sync` helpers are
//! provided for executor-free callers.
//!
//! ```no_run
//! use formo::{Binding, Component, DataSources, Renderer};
//!
//! # fn main() -> Result<(), formo::RenderError> {
//! let renderer = Renderer::new();
//! let svg = renderer.render_svg_sync(
//!     r#"<svg width="400" height="626">...</svg>"#,
//!     &[/* bindings */],
//!     &[/* components */],
//!     &DataSources::new(),
//! )?;
//! # Ok(())
//! # }
//! ```

pub use formo_core::*;

pub use formo_render::{
    ApproxGeometry, BoundsMap, EmTableGlyphMetrics, FontSpec, GeometryProvider, GlyphMetrics,
    HeightChange, RenderOptions, break_text_into_lines,
};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Parse(#[from] formo_core::Error),
    #[error(transparent)]
    Render(#[from] formo_render::Error),
}

pub type RenderResult<T> = std::result::Result<T, RenderError>;

/// Bundles glyph metrics, a geometry provider and render options behind one render call.
///
/// Template errors (no root element, tokenizer failure) surface as [`RenderError`]; no inline
/// error-graphic is ever substituted. Binding resolution misses leave the original content
/// untouched. Independent renders may run concurrently; each call builds and discards its own
/// tree.
pub struct Renderer<G = ApproxGeometry<EmTableGlyphMetrics>> {
    geometry: G,
    metrics: Box<dyn GlyphMetrics>,
    options: RenderOptions,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            geometry: ApproxGeometry::default(),
            metrics: Box::new(EmTableGlyphMetrics),
            options: RenderOptions::default(),
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: GeometryProvider> Renderer<G> {
    /// Swaps in an external geometry provider (e.g. a browser-backed measurer).
    pub fn with_geometry<H: GeometryProvider>(self, geometry: H) -> Renderer<H> {
        Renderer {
            geometry,
            metrics: self.metrics,
            options: self.options,
        }
    }

    pub fn with_metrics(mut self, metrics: impl GlyphMetrics + 'static) -> Self {
        self.metrics = Box::new(metrics);
        self
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub async fn render_svg(
        &self,
        markup: &str,
        bindings: &[Binding],
        components: &[Component],
        data: &DataSources,
    ) -> RenderResult<String> {
        let mut tree = parse_document(markup)?;
        formo_render::apply_bindings(
            &mut tree,
            bindings,
            components,
            data,
            self.metrics.as_ref(),
            &self.geometry,
            &self.options,
        )
        .await?;
        Ok(serialize_document(&tree))
    }

    /// Executor-free render helper.
    pub fn render_svg_sync(
        &self,
        markup: &str,
        bindings: &[Binding],
        components: &[Component],
        data: &DataSources,
    ) -> RenderResult<String> {
        futures::executor::block_on(self.render_svg(markup, bindings, components, data))
    }
}
